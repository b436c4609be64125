//! Filesystem-backed skill corpus.
//!
//! Discovers every `SKILL.md` below a root directory and splits each into
//! frontmatter metadata and body. Other files in a skill directory (scripts,
//! examples, templates) are ignored. Two layouts are common:
//!
//! ```text
//! {root}/{skill-id}/SKILL.md
//! {root}/plugins/{plugin}/skills/{skill-id}/SKILL.md
//! ```
//!
//! In the second form the owning plugin name is recorded on the record.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use skillctx_core::skill::index::CorpusIndex;
use skillctx_core::skill::manifest::parse_skill_md;
use skillctx_core::skill::resolver::SkillResolver;
use skillctx_types::error::LoadError;
use skillctx_types::skill::RawSkillRecord;

const SKILL_FILE: &str = "SKILL.md";

#[derive(Debug, Clone)]
pub struct CorpusStore {
    root: PathBuf,
}

impl CorpusStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// All `SKILL.md` paths below the root, sorted. Hidden directories are
    /// skipped.
    pub fn discover(&self) -> Result<Vec<PathBuf>, LoadError> {
        if !self.root.is_dir() {
            return Err(LoadError::Io {
                path: self.root.display().to_string(),
                reason: "corpus directory does not exist".to_owned(),
            });
        }

        let mut found = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let entries = std::fs::read_dir(&dir).map_err(|e| io_error(&dir, &e))?;
            for entry in entries {
                let entry = entry.map_err(|e| io_error(&dir, &e))?;
                let path = entry.path();
                let file_type = entry.file_type().map_err(|e| io_error(&path, &e))?;
                let hidden = entry.file_name().to_string_lossy().starts_with('.');

                if file_type.is_dir() {
                    if !hidden {
                        pending.push(path);
                    }
                } else if entry.file_name() == SKILL_FILE {
                    found.push(path);
                }
            }
        }

        found.sort();
        Ok(found)
    }

    /// Read and split every skill in the corpus.
    ///
    /// Any unreadable or unparsable file fails the whole load so a reload
    /// never activates a partial corpus.
    pub fn load_raw_records(&self) -> Result<Vec<RawSkillRecord>, LoadError> {
        let paths = self.discover()?;
        let mut records = Vec::with_capacity(paths.len());
        for path in &paths {
            records.push(self.read_record(path)?);
        }

        tracing::debug!(
            root = %self.root.display(),
            count = records.len(),
            "Loaded raw skill records"
        );
        Ok(records)
    }

    /// Load the corpus from disk and swap it into `resolver`.
    ///
    /// Blocking; async callers go through `spawn_blocking`.
    pub fn reload_into(&self, resolver: &SkillResolver) -> Result<Arc<CorpusIndex>, LoadError> {
        let raw = self.load_raw_records()?;
        resolver.reload_corpus(raw)
    }

    /// Read one `SKILL.md`.
    pub fn read_record(&self, path: &Path) -> Result<RawSkillRecord, LoadError> {
        let origin = self.origin_of(path);
        let content = std::fs::read_to_string(path).map_err(|e| io_error(path, &e))?;
        let (metadata, body) = parse_skill_md(&content).map_err(|e| LoadError::Malformed {
            origin: origin.clone(),
            reason: format!("{e:#}"),
        })?;

        Ok(RawSkillRecord {
            plugin: plugin_of(path.strip_prefix(&self.root).unwrap_or(path)),
            origin,
            metadata,
            body,
        })
    }

    /// Path relative to the root, for messages.
    fn origin_of(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .display()
            .to_string()
    }
}

/// Plugin name from a `plugins/{plugin}/...` relative path.
fn plugin_of(relative: &Path) -> Option<String> {
    let mut components = relative.components().filter_map(|c| match c {
        Component::Normal(s) => s.to_str(),
        _ => None,
    });
    while let Some(component) = components.next() {
        if component == "plugins" {
            return components.next().map(str::to_owned);
        }
    }
    None
}

fn io_error(path: &Path, err: &std::io::Error) -> LoadError {
    LoadError::Io {
        path: path.display().to_string(),
        reason: err.to_string(),
    }
}
