//! Keyword scoring of skills against a query context.
//!
//! score = trigger_weight     × distinct trigger phrases found in the query
//!       + auto_detect_weight × distinct auto-detect tokens found
//!       + category_weight    × (category equals a language/framework signal)
//!
//! Trigger phrases match as case-insensitive substrings of the query text.
//! Auto-detect tokens match as substrings of the query text or of an open
//! file path, or exactly against a detected language/framework. Open file
//! extensions contribute language signals.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use skillctx_types::config::ScoringWeights;
use skillctx_types::query::{ContextSignals, MatchCandidate, MatchReason, QueryContext};

use super::index::{CorpusIndex, normalize_phrase};

#[derive(Debug, Default)]
struct Hits {
    triggers: BTreeSet<String>,
    auto_detects: BTreeSet<String>,
    category: Option<String>,
}

/// Score every skill with at least one hit. Skills scoring zero are left out.
///
/// Output is ordered by skill id; ranking happens later.
pub fn match_skills(
    index: &CorpusIndex,
    query: &QueryContext,
    weights: &ScoringWeights,
) -> Vec<MatchCandidate> {
    let text = normalize_phrase(&query.text);
    let signals = collect_signals(&query.signals);
    let paths: Vec<String> = query
        .signals
        .open_file_paths
        .iter()
        .map(|p| p.trim().to_lowercase())
        .filter(|p| !p.is_empty())
        .collect();

    if text.is_empty() && signals.is_empty() && paths.is_empty() {
        return Vec::new();
    }

    let mut hits: BTreeMap<usize, Hits> = BTreeMap::new();

    if !text.is_empty() {
        for (phrase, positions) in index.trigger_index().substring_hits(&text) {
            for &pos in positions {
                hits.entry(pos).or_default().triggers.insert(phrase.to_owned());
            }
        }
        for (token, positions) in index.auto_detect_index().substring_hits(&text) {
            for &pos in positions {
                hits.entry(pos).or_default().auto_detects.insert(token.to_owned());
            }
        }
    }

    for path in &paths {
        for (token, positions) in index.auto_detect_index().substring_hits(path) {
            for &pos in positions {
                hits.entry(pos).or_default().auto_detects.insert(token.to_owned());
            }
        }
    }

    for signal in &signals {
        for &pos in index.auto_detect_index().exact(signal) {
            hits.entry(pos).or_default().auto_detects.insert(signal.clone());
        }
        for &pos in index.category_positions(signal) {
            hits.entry(pos)
                .or_default()
                .category
                .get_or_insert_with(|| signal.clone());
        }
    }

    let candidates: Vec<MatchCandidate> = hits
        .into_iter()
        .filter_map(|(pos, hit)| {
            let score = weights.trigger_weight * hit.triggers.len() as f64
                + weights.auto_detect_weight * hit.auto_detects.len() as f64
                + if hit.category.is_some() {
                    weights.category_weight
                } else {
                    0.0
                };
            if score <= 0.0 {
                return None;
            }

            let record = index.record(pos);
            let mut candidate = MatchCandidate::new(&record.id, score, record.priority);
            for phrase in hit.triggers {
                candidate.add_reason(MatchReason::Trigger { phrase });
            }
            for token in hit.auto_detects {
                candidate.add_reason(MatchReason::AutoDetect { token });
            }
            if let Some(signal) = hit.category {
                candidate.add_reason(MatchReason::Category { signal });
            }
            Some(candidate)
        })
        .collect();

    tracing::debug!(
        generation = index.generation(),
        signals = signals.len(),
        matched = candidates.len(),
        "Matched skills against query"
    );

    candidates
}

/// Normalized language and framework signals, including languages implied
/// by open file extensions.
fn collect_signals(signals: &ContextSignals) -> BTreeSet<String> {
    signals
        .detected_languages
        .iter()
        .chain(&signals.detected_frameworks)
        .map(|s| normalize_phrase(s))
        .chain(
            signals
                .open_file_paths
                .iter()
                .filter_map(|p| language_for_path(p))
                .map(str::to_owned),
        )
        .filter(|s| !s.is_empty())
        .collect()
}

/// Language implied by a file's extension or well-known name.
pub fn language_for_path(path: &str) -> Option<&'static str> {
    let path = Path::new(path);

    if let Some(name) = path.file_name().and_then(|n| n.to_str()) {
        match name.to_ascii_lowercase().as_str() {
            "dockerfile" => return Some("docker"),
            "cargo.toml" => return Some("rust"),
            "package.json" => return Some("javascript"),
            "pom.xml" | "build.gradle" => return Some("java"),
            "go.mod" => return Some("go"),
            _ => {}
        }
    }

    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    let language = match ext.as_str() {
        "rs" => "rust",
        "py" => "python",
        "ts" | "tsx" => "typescript",
        "js" | "jsx" | "mjs" | "cjs" => "javascript",
        "java" => "java",
        "kt" | "kts" => "kotlin",
        "go" => "go",
        "rb" => "ruby",
        "php" => "php",
        "cs" => "csharp",
        "swift" => "swift",
        "c" | "h" => "c",
        "cc" | "cpp" | "cxx" | "hpp" => "cpp",
        "scala" => "scala",
        "dart" => "dart",
        "vue" => "vue",
        "svelte" => "svelte",
        "sql" => "sql",
        "tf" => "terraform",
        _ => return None,
    };
    Some(language)
}
