//! In-memory corpus index.
//!
//! Built once per load or reload from raw records, then shared read-only.
//! Holds the id map, inverted phrase indexes for triggers and auto-detect
//! tokens, a category index, and the related-skill graph.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use aho_corasick::AhoCorasick;
use petgraph::algo::tarjan_scc;
use petgraph::graph::{DiGraph, NodeIndex};
use skillctx_types::error::LoadError;
use skillctx_types::skill::{EdgeKind, LoadWarning, RawSkillRecord, SkillRecord};

use super::manifest::{auto_detect_clause, first_heading, validate_metadata};
use super::tokens::TokenEstimator;

/// Lowercase, trim, and collapse internal whitespace.
///
/// Applied to trigger phrases and auto-detect tokens at load time and to
/// query text at match time so both sides compare in the same form.
pub fn normalize_phrase(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Inverted index from a normalized phrase to the positions of the skills
/// that declare it. Each distinct phrase is stored once, however many skills
/// share it.
///
/// Phrases are kept in lexical order and compiled into one Aho-Corasick
/// automaton, so a substring scan costs one pass over the haystack rather
/// than one `contains` per phrase.
#[derive(Debug, Default, Clone)]
pub struct PhraseIndex {
    phrases: Vec<String>,
    postings: Vec<Vec<usize>>,
    automaton: Option<AhoCorasick>,
}

impl PhraseIndex {
    fn build(postings: BTreeMap<String, Vec<usize>>) -> Result<Self, LoadError> {
        let (phrases, postings): (Vec<String>, Vec<Vec<usize>>) = postings.into_iter().unzip();
        let automaton = if phrases.is_empty() {
            None
        } else {
            Some(
                AhoCorasick::new(&phrases).map_err(|e| LoadError::PhraseIndex {
                    reason: e.to_string(),
                })?,
            )
        };
        Ok(Self {
            phrases,
            postings,
            automaton,
        })
    }

    /// Skills declaring exactly this (already normalized) phrase.
    pub fn exact(&self, phrase: &str) -> &[usize] {
        self.phrases
            .binary_search_by(|p| p.as_str().cmp(phrase))
            .map(|i| self.postings[i].as_slice())
            .unwrap_or(&[])
    }

    /// Every phrase occurring as a substring of `haystack`, with its postings,
    /// in lexical phrase order. Overlapping phrases all count: "oauth" and
    /// "auth" both hit "oauth2".
    pub fn substring_hits(&self, haystack: &str) -> Vec<(&str, &[usize])> {
        let Some(automaton) = &self.automaton else {
            return Vec::new();
        };
        let mut ids: Vec<usize> = automaton
            .find_overlapping_iter(haystack)
            .map(|m| m.pattern().as_usize())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.into_iter()
            .map(|i| (self.phrases[i].as_str(), self.postings[i].as_slice()))
            .collect()
    }

    /// Number of distinct phrases.
    pub fn len(&self) -> usize {
        self.phrases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.phrases.is_empty()
    }
}

fn add_posting(postings: &mut BTreeMap<String, Vec<usize>>, phrase: &str, position: usize) {
    let list = postings.entry(phrase.to_owned()).or_default();
    if list.last() != Some(&position) {
        list.push(position);
    }
}

/// Immutable snapshot of a skill corpus.
///
/// Records are stored sorted by id; a record's position doubles as its node
/// index in the related graph.
#[derive(Debug)]
pub struct CorpusIndex {
    generation: u64,
    records: Vec<Arc<SkillRecord>>,
    positions: HashMap<String, usize>,
    triggers: PhraseIndex,
    auto_detects: PhraseIndex,
    categories: HashMap<String, Vec<usize>>,
    graph: DiGraph<(), ()>,
    warnings: Vec<LoadWarning>,
}

impl CorpusIndex {
    /// An index with no skills.
    pub fn empty(generation: u64) -> Self {
        Self {
            generation,
            records: Vec::new(),
            positions: HashMap::new(),
            triggers: PhraseIndex::default(),
            auto_detects: PhraseIndex::default(),
            categories: HashMap::new(),
            graph: DiGraph::new(),
            warnings: Vec::new(),
        }
    }

    /// Validate raw records and build an index.
    ///
    /// Fails on malformed metadata or a duplicate id. Dangling `related` or
    /// `supersedes` references are pruned and reported as warnings, as are
    /// manual skills that are not user-invocable.
    pub fn load(
        raw: Vec<RawSkillRecord>,
        estimator: &dyn TokenEstimator,
        generation: u64,
    ) -> Result<Self, LoadError> {
        let mut origins: HashMap<String, String> = HashMap::with_capacity(raw.len());
        let mut records = Vec::with_capacity(raw.len());

        for entry in raw {
            validate_metadata(&entry.metadata).map_err(|e| LoadError::Malformed {
                origin: entry.origin.clone(),
                reason: format!("{e:#}"),
            })?;

            if let Some(first) = origins.get(&entry.metadata.name) {
                return Err(LoadError::DuplicateId {
                    id: entry.metadata.name.clone(),
                    first: first.clone(),
                    second: entry.origin.clone(),
                });
            }
            origins.insert(entry.metadata.name.clone(), entry.origin.clone());

            records.push(build_record(entry, estimator));
        }

        records.sort_by(|a, b| a.id.cmp(&b.id));

        let positions: HashMap<String, usize> = records
            .iter()
            .enumerate()
            .map(|(pos, r)| (r.id.clone(), pos))
            .collect();

        let mut warnings = Vec::new();
        for record in &mut records {
            prune_edges(record, &positions, &mut warnings);
            if !record.context_inject && !record.user_invocable {
                warnings.push(LoadWarning::UnreachableSkill {
                    skill: record.id.clone(),
                });
            }
        }
        for warning in &warnings {
            tracing::warn!(generation, %warning, "Corpus load warning");
        }

        let mut triggers = BTreeMap::new();
        let mut auto_detects = BTreeMap::new();
        let mut categories: HashMap<String, Vec<usize>> = HashMap::new();
        let mut graph = DiGraph::with_capacity(records.len(), records.len());

        for (pos, record) in records.iter().enumerate() {
            graph.add_node(());
            for phrase in &record.triggers {
                add_posting(&mut triggers, phrase, pos);
            }
            for token in &record.auto_detect {
                add_posting(&mut auto_detects, token, pos);
            }
            if let Some(category) = &record.category {
                categories.entry(category.clone()).or_default().push(pos);
            }
        }

        for (pos, record) in records.iter().enumerate() {
            for target in &record.related {
                graph.add_edge(NodeIndex::new(pos), NodeIndex::new(positions[target]), ());
            }
        }

        let triggers = PhraseIndex::build(triggers)?;
        let auto_detects = PhraseIndex::build(auto_detects)?;

        tracing::debug!(
            generation,
            skills = records.len(),
            triggers = triggers.len(),
            auto_detects = auto_detects.len(),
            edges = graph.edge_count(),
            warnings = warnings.len(),
            "Corpus index built"
        );

        Ok(Self {
            generation,
            records: records.into_iter().map(Arc::new).collect(),
            positions,
            triggers,
            auto_detects,
            categories,
            graph,
            warnings,
        })
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Arc<SkillRecord>> {
        self.position(id).map(|pos| &self.records[pos])
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.positions.get(id).copied()
    }

    /// Record at a position obtained from this index.
    pub fn record(&self, position: usize) -> &Arc<SkillRecord> {
        &self.records[position]
    }

    /// All records in id order.
    pub fn records(&self) -> impl Iterator<Item = &Arc<SkillRecord>> {
        self.records.iter()
    }

    /// Records in id order, narrowed to a category and/or a plugin.
    ///
    /// The category filter is normalized the same way stored categories are,
    /// so `Python` and `python` select the same skills. Plugin names compare
    /// as given.
    pub fn filter_records(
        &self,
        category: Option<&str>,
        plugin: Option<&str>,
    ) -> impl Iterator<Item = &Arc<SkillRecord>> {
        let category = category.map(normalize_phrase);
        self.records
            .iter()
            .filter(move |r| category.is_none() || r.category == category)
            .filter(move |r| plugin.is_none() || r.plugin.as_deref() == plugin)
    }

    /// Positions reachable over one related edge from `position`.
    pub fn related_positions(&self, position: usize) -> impl Iterator<Item = usize> + '_ {
        self.graph
            .neighbors(NodeIndex::new(position))
            .map(NodeIndex::index)
    }

    pub fn trigger_index(&self) -> &PhraseIndex {
        &self.triggers
    }

    pub fn auto_detect_index(&self) -> &PhraseIndex {
        &self.auto_detects
    }

    /// Skills whose normalized category equals `category`.
    pub fn category_positions(&self, category: &str) -> &[usize] {
        self.categories
            .get(category)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Warnings collected while this index was built.
    pub fn warnings(&self) -> &[LoadWarning] {
        &self.warnings
    }

    /// Groups of skills that reach each other over related edges, including
    /// self-references. Traversal tolerates these; they are reported for
    /// corpus authors.
    pub fn related_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles: Vec<Vec<String>> = tarjan_scc(&self.graph)
            .into_iter()
            .filter(|component| {
                component.len() > 1
                    || self
                        .graph
                        .contains_edge(component[0], component[0])
            })
            .map(|component| {
                let mut ids: Vec<String> = component
                    .into_iter()
                    .map(|node| self.records[node.index()].id.clone())
                    .collect();
                ids.sort();
                ids
            })
            .collect();
        cycles.sort();
        cycles
    }
}

fn build_record(raw: RawSkillRecord, estimator: &dyn TokenEstimator) -> SkillRecord {
    let RawSkillRecord {
        origin,
        plugin,
        metadata,
        body,
    } = raw;

    let title = metadata
        .title
        .as_deref()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .or_else(|| first_heading(&body))
        .unwrap_or(&metadata.name)
        .to_owned();

    let auto_detect = match metadata.auto_detects {
        Some(list) => normalize_all(list.into_items()),
        None => normalize_all(auto_detect_clause(&metadata.description)),
    };

    let token_cost = metadata
        .tokens
        .unwrap_or_else(|| estimator.estimate(&format!("{title}\n{body}")));

    SkillRecord {
        id: metadata.name,
        title,
        description: metadata.description.trim().to_owned(),
        triggers: normalize_all(metadata.triggers.into_items()),
        auto_detect,
        related: dedup(metadata.related.into_items()),
        supersedes: dedup(metadata.supersedes.into_items()),
        body,
        token_cost,
        category: metadata
            .category
            .map(|c| normalize_phrase(&c))
            .filter(|c| !c.is_empty()),
        priority: metadata.priority,
        context_inject: metadata.context == skillctx_types::skill::ContextMode::Inject,
        user_invocable: metadata.user_invocable,
        origin,
        plugin,
    }
}

fn normalize_all(items: Vec<String>) -> Vec<String> {
    dedup(
        items
            .iter()
            .map(|s| normalize_phrase(s))
            .filter(|s| !s.is_empty())
            .collect(),
    )
}

/// Remove repeats, keeping first occurrences in order.
fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(items.len());
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

fn prune_edges(
    record: &mut SkillRecord,
    positions: &HashMap<String, usize>,
    warnings: &mut Vec<LoadWarning>,
) {
    let id = record.id.clone();

    record.related.retain(|target| {
        let known = positions.contains_key(target);
        if !known {
            warnings.push(LoadWarning::DanglingReference {
                skill: id.clone(),
                target: target.clone(),
                edge: EdgeKind::Related,
            });
        }
        known
    });

    record.supersedes.retain(|target| {
        if *target == id {
            warnings.push(LoadWarning::SelfSupersession { skill: id.clone() });
            return false;
        }
        let known = positions.contains_key(target);
        if !known {
            warnings.push(LoadWarning::DanglingReference {
                skill: id.clone(),
                target: target.clone(),
                edge: EdgeKind::Supersedes,
            });
        }
        known
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skill::testing::{estimator, raw, scenario_corpus};
    use skillctx_types::skill::{ListField, SkillMetadata};

    #[test]
    fn scenario_corpus_prunes_dangling_devops_edge() {
        let index = CorpusIndex::load(scenario_corpus(), &estimator(), 1).unwrap();

        assert_eq!(index.len(), 2);
        assert_eq!(index.generation(), 1);

        let infra = index.get("security-infra").unwrap();
        assert_eq!(infra.related, vec!["security-auth"]);
        assert_eq!(infra.token_cost, 400);

        assert_eq!(
            index.warnings(),
            &[LoadWarning::DanglingReference {
                skill: "security-infra".into(),
                target: "devops".into(),
                edge: EdgeKind::Related,
            }]
        );

        let pos = index.position("security-infra").unwrap();
        let reached: Vec<&str> = index
            .related_positions(pos)
            .map(|p| index.record(p).id.as_str())
            .collect();
        assert_eq!(reached, vec!["security-auth"]);
    }

    #[test]
    fn duplicate_id_is_fatal() {
        let records = vec![
            raw("nestjs", &["nest"], &[], Some(10)),
            raw("nestjs", &["nestjs"], &[], Some(10)),
        ];
        let err = CorpusIndex::load(records, &estimator(), 0).unwrap_err();
        assert!(matches!(err, LoadError::DuplicateId { ref id, .. } if id == "nestjs"));
    }

    #[test]
    fn malformed_metadata_is_fatal() {
        let records = vec![raw("Bad Name", &[], &[], None)];
        let err = CorpusIndex::load(records, &estimator(), 0).unwrap_err();
        match err {
            LoadError::Malformed { origin, reason } => {
                assert_eq!(origin, "Bad Name/SKILL.md");
                assert!(reason.contains("lowercase"));
            }
            other => panic!("expected Malformed, got {other:?}"),
        }
    }

    #[test]
    fn triggers_are_normalized_and_indexed() {
        let mut record = raw("django", &["  Django   REST ", "drf", "DRF"], &[], Some(50));
        record.metadata.category = Some("Python".into());
        let index = CorpusIndex::load(vec![record], &estimator(), 0).unwrap();

        let django = index.get("django").unwrap();
        assert_eq!(django.triggers, vec!["django rest", "drf"]);
        assert_eq!(django.category.as_deref(), Some("python"));

        let pos = index.position("django").unwrap();
        assert_eq!(index.trigger_index().exact("drf"), &[pos]);
        assert_eq!(index.category_positions("python"), &[pos]);

        let hits: Vec<&str> = index
            .trigger_index()
            .substring_hits("build a django rest api with drf")
            .into_iter()
            .map(|(phrase, _)| phrase)
            .collect();
        assert_eq!(hits, vec!["django rest", "drf"]);
    }

    #[test]
    fn shared_phrase_is_stored_once() {
        let records = vec![
            raw("a", &["auth"], &[], Some(1)),
            raw("b", &["auth"], &[], Some(1)),
        ];
        let index = CorpusIndex::load(records, &estimator(), 0).unwrap();
        assert_eq!(index.trigger_index().len(), 1);
        assert_eq!(index.trigger_index().exact("auth"), &[0, 1]);
    }

    #[test]
    fn substring_hits_report_overlapping_phrases_once() {
        let records = vec![
            raw("oauth", &["oauth", "auth"], &[], Some(1)),
            raw("cors", &["cors"], &[], Some(1)),
            raw("csp", &["csp"], &[], Some(1)),
        ];
        let index = CorpusIndex::load(records, &estimator(), 0).unwrap();
        let triggers = index.trigger_index();

        // "auth" appears twice and inside "oauth"; each phrase is reported once
        let hits = triggers.substring_hits("set up oauth2 and auth callbacks");
        assert_eq!(
            hits,
            vec![
                ("auth", &[index.position("oauth").unwrap()][..]),
                ("oauth", &[index.position("oauth").unwrap()][..]),
            ]
        );
        assert!(triggers.substring_hits("nothing relevant").is_empty());
        assert!(triggers.substring_hits("").is_empty());
        assert!(CorpusIndex::empty(0)
            .trigger_index()
            .substring_hits("oauth")
            .is_empty());
    }

    #[test]
    fn substring_hits_scale_past_small_vocabularies() {
        let records: Vec<_> = (0..500)
            .map(|i| {
                let id = format!("skill-{i:03}");
                let phrase = format!("phrase{i:03}x");
                raw(&id, &[phrase.as_str()], &[], Some(1))
            })
            .collect();
        let index = CorpusIndex::load(records, &estimator(), 0).unwrap();
        assert_eq!(index.trigger_index().len(), 500);

        let hits: Vec<&str> = index
            .trigger_index()
            .substring_hits("wire phrase042x and phrase499x together")
            .into_iter()
            .map(|(phrase, _)| phrase)
            .collect();
        assert_eq!(hits, vec!["phrase042x", "phrase499x"]);
        assert_eq!(index.trigger_index().exact("phrase042x"), &[42]);
        assert!(index.trigger_index().exact("phrase042").is_empty());
    }

    #[test]
    fn filter_records_normalizes_category() {
        let mut django = raw("django", &[], &[], Some(1));
        django.metadata.category = Some("Python".into());
        django.plugin = Some("f5-stacks".into());
        let mut flask = raw("flask", &[], &[], Some(1));
        flask.metadata.category = Some("python".into());
        let rails = raw("rails", &[], &[], Some(1));
        let index = CorpusIndex::load(vec![django, flask, rails], &estimator(), 0).unwrap();

        let ids = |category: Option<&str>, plugin: Option<&str>| -> Vec<String> {
            index
                .filter_records(category, plugin)
                .map(|r| r.id.clone())
                .collect()
        };
        assert_eq!(ids(Some("Python"), None), vec!["django", "flask"]);
        assert_eq!(ids(Some("  PYTHON "), None), vec!["django", "flask"]);
        assert_eq!(ids(Some("PYTHON"), Some("f5-stacks")), vec!["django"]);
        assert_eq!(ids(None, None).len(), 3);
        assert!(ids(Some("ruby"), None).is_empty());
    }

    #[test]
    fn auto_detects_fall_back_to_description_clause() {
        let mut record = raw("nestjs", &[], &[], Some(10));
        record.metadata.description =
            "NestJS patterns. Auto-detects: @nestjs/core, nest-cli.json.".into();
        let mut explicit = raw("spring", &[], &[], Some(10));
        explicit.metadata.description = "Spring. Auto-detects: ignored.".into();
        explicit.metadata.auto_detects = Some(ListField::from(vec!["pom.xml"]));

        let index = CorpusIndex::load(vec![record, explicit], &estimator(), 0).unwrap();
        assert_eq!(
            index.get("nestjs").unwrap().auto_detect,
            vec!["@nestjs/core", "nest-cli.json"]
        );
        assert_eq!(index.get("spring").unwrap().auto_detect, vec!["pom.xml"]);
    }

    #[test]
    fn token_cost_estimated_when_not_declared() {
        let mut record = raw("tiny", &[], &[], None);
        record.metadata.title = Some("T".into());
        record.body = "abcdefg".into();
        let index = CorpusIndex::load(vec![record], &estimator(), 0).unwrap();
        // "T\nabcdefg" is 9 chars at 4 chars per token
        assert_eq!(index.get("tiny").unwrap().token_cost, 3);
    }

    #[test]
    fn title_falls_back_to_heading_then_id() {
        let mut with_heading = raw("with-heading", &[], &[], Some(1));
        with_heading.body = "# Heading Title\n\ntext".into();
        let bare = raw("bare", &[], &[], Some(1));

        let index = CorpusIndex::load(vec![with_heading, bare], &estimator(), 0).unwrap();
        assert_eq!(index.get("with-heading").unwrap().title, "Heading Title");
        assert_eq!(index.get("bare").unwrap().title, "bare");
    }

    #[test]
    fn self_supersession_and_dangling_supersedes_are_pruned() {
        let mut record = raw("security", &["security"], &[], Some(1));
        record.metadata.supersedes = ListField::from(vec!["security", "ghost"]);
        let index = CorpusIndex::load(vec![record], &estimator(), 0).unwrap();

        assert!(index.get("security").unwrap().supersedes.is_empty());
        assert_eq!(index.warnings().len(), 2);
        assert!(index
            .warnings()
            .contains(&LoadWarning::SelfSupersession {
                skill: "security".into()
            }));
    }

    #[test]
    fn related_cycles_reports_loops() {
        let records = vec![
            raw("a", &[], &["b"], Some(1)),
            raw("b", &[], &["a"], Some(1)),
            raw("c", &[], &["c"], Some(1)),
            raw("d", &[], &["a"], Some(1)),
        ];
        let index = CorpusIndex::load(records, &estimator(), 0).unwrap();
        assert_eq!(
            index.related_cycles(),
            vec![vec!["a".to_owned(), "b".to_owned()], vec!["c".to_owned()]]
        );
    }

    #[test]
    fn manual_context_clears_inject_flag() {
        let mut record = raw("deploy", &["deploy"], &[], Some(1));
        record.metadata = SkillMetadata {
            context: skillctx_types::skill::ContextMode::Manual,
            user_invocable: true,
            ..record.metadata
        };
        let index = CorpusIndex::load(vec![record], &estimator(), 0).unwrap();
        let deploy = index.get("deploy").unwrap();
        assert!(!deploy.context_inject);
        assert!(deploy.user_invocable);
    }

    #[test]
    fn manual_skill_without_invocation_is_reported() {
        let mut hidden = raw("hidden", &["hidden"], &[], Some(1));
        hidden.metadata.context = skillctx_types::skill::ContextMode::Manual;
        let mut invocable = raw("invocable", &[], &[], Some(1));
        invocable.metadata.context = skillctx_types::skill::ContextMode::Manual;
        invocable.metadata.user_invocable = true;
        let injected = raw("injected", &[], &[], Some(1));

        let index =
            CorpusIndex::load(vec![hidden, invocable, injected], &estimator(), 0).unwrap();
        assert_eq!(
            index.warnings(),
            &[LoadWarning::UnreachableSkill {
                skill: "hidden".into()
            }]
        );
        // still loaded and reachable by id
        assert!(index.get("hidden").is_some());
    }

    #[test]
    fn empty_index() {
        let index = CorpusIndex::empty(7);
        assert!(index.is_empty());
        assert_eq!(index.generation(), 7);
        assert!(index.get("anything").is_none());
    }
}
