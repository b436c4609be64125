//! Corpus change watcher using the `notify` crate.
//!
//! Provides:
//! - `start_corpus_watcher()` -- debounced watch of the corpus root that
//!   reloads the resolver whenever a skill file changes
//! - `WatcherHandle` -- RAII handle that keeps the watcher alive
//! - `is_relevant()` -- which change paths can affect the corpus

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

// Use notify types re-exported through notify-debouncer-mini so the watcher
// and debouncer agree on the notify version.
use notify_debouncer_mini::notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{DebounceEventResult, Debouncer, new_debouncer};
use skillctx_core::skill::resolver::SkillResolver;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::corpus_store::CorpusStore;

const DEFAULT_DEBOUNCE_MS: u64 = 500;

/// Errors that can occur while starting the watcher.
#[derive(Debug, thiserror::Error)]
pub enum CorpusWatchError {
    #[error("watcher creation failed: {0}")]
    WatcherCreation(String),

    #[error("failed to watch path '{path}': {reason}")]
    WatchPath { path: String, reason: String },
}

/// RAII handle that keeps the corpus watcher alive.
///
/// Dropping it stops the filesystem watch and the reload task.
pub struct WatcherHandle {
    _debouncer: Debouncer<RecommendedWatcher>,
    root: PathBuf,
    task: JoinHandle<()>,
}

impl WatcherHandle {
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.task.abort();
        tracing::debug!(root = %self.root.display(), "corpus watcher dropped");
    }
}

/// Whether a changed path can affect the corpus: a `SKILL.md` file, or an
/// extension-less path (usually a skill directory being added, renamed, or
/// removed). Paths inside hidden directories below `root` are ignored.
pub fn is_relevant(root: &Path, path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let relative = path.strip_prefix(root).unwrap_or(Path::new(name));
    let hidden = relative.components().any(|c| {
        matches!(c, Component::Normal(s) if s.to_string_lossy().starts_with('.'))
    });
    !hidden && (name == "SKILL.md" || path.extension().is_none())
}

/// Watch the store's root and reload `resolver` after each debounced batch
/// of relevant changes.
///
/// Must be called inside a tokio runtime. Reloads run on the blocking pool;
/// a failed reload is logged and the previous index stays active.
pub fn start_corpus_watcher(
    resolver: Arc<SkillResolver>,
    store: CorpusStore,
    debounce_ms: Option<u64>,
) -> Result<WatcherHandle, CorpusWatchError> {
    let debounce = Duration::from_millis(debounce_ms.unwrap_or(DEFAULT_DEBOUNCE_MS));
    let (tx, mut rx) = mpsc::channel::<Vec<PathBuf>>(16);
    let root = store.root().to_path_buf();
    let filter_root = root.clone();

    let mut debouncer = new_debouncer(debounce, move |result: DebounceEventResult| {
        match result {
            Ok(events) => {
                let changed: Vec<PathBuf> = events
                    .into_iter()
                    .map(|e| e.path)
                    .filter(|p| is_relevant(&filter_root, p))
                    .collect();
                if changed.is_empty() {
                    return;
                }
                tracing::debug!(count = changed.len(), "corpus change detected");
                // A full channel already has a reload queued; that reload
                // will read the latest files anyway.
                let _ = tx.try_send(changed);
            }
            Err(err) => {
                tracing::warn!(error = %err, "corpus watcher error");
            }
        }
    })
    .map_err(|e| CorpusWatchError::WatcherCreation(e.to_string()))?;

    debouncer
        .watcher()
        .watch(&root, RecursiveMode::Recursive)
        .map_err(|e| CorpusWatchError::WatchPath {
            path: root.display().to_string(),
            reason: e.to_string(),
        })?;

    let task = tokio::spawn(async move {
        while let Some(changed) = rx.recv().await {
            // Coalesce batches that piled up while the last reload ran.
            let mut paths = changed.len();
            while let Ok(more) = rx.try_recv() {
                paths += more.len();
            }

            let resolver = Arc::clone(&resolver);
            let store = store.clone();
            let outcome =
                tokio::task::spawn_blocking(move || store.reload_into(&resolver)).await;

            match outcome {
                Ok(Ok(index)) => tracing::info!(
                    generation = index.generation(),
                    skills = index.len(),
                    paths,
                    "corpus reloaded after change"
                ),
                Ok(Err(e)) => tracing::warn!(
                    error = %e,
                    "corpus reload after change failed, keeping previous index"
                ),
                Err(e) => tracing::error!(error = %e, "corpus reload task panicked"),
            }
        }
    });

    tracing::info!(root = %root.display(), "corpus watcher started");

    Ok(WatcherHandle {
        _debouncer: debouncer,
        root,
        task,
    })
}
