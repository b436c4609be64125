//! Application state shared by the CLI commands and the REST API.
//!
//! Wires the data directory, `config.toml`, the on-disk corpus, and the
//! resolver together. The resolver is behind an `Arc` so HTTP handlers and
//! the corpus watcher share one active index.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use skillctx_core::skill::index::CorpusIndex;
use skillctx_core::skill::resolver::SkillResolver;
use skillctx_infra::config::{load_global_config, resolve_corpus_dir};
use skillctx_infra::filesystem::resolve_data_dir;
use skillctx_infra::skill::corpus_store::CorpusStore;

#[derive(Clone)]
pub struct AppState {
    pub resolver: Arc<SkillResolver>,
    pub store: CorpusStore,
    pub data_dir: PathBuf,
}

impl AppState {
    /// Load configuration and the corpus.
    ///
    /// A corpus directory that does not exist yet leaves the resolver with
    /// an empty index (generation 0). Any other load failure is fatal.
    pub async fn init(corpus_override: Option<&Path>) -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        let config = load_global_config(&data_dir).await;
        let corpus_dir = resolve_corpus_dir(&config, &data_dir, corpus_override);

        let resolver = SkillResolver::new(config).context("invalid configuration")?;
        let state = Self::from_parts(Arc::new(resolver), CorpusStore::new(corpus_dir), data_dir);

        if !state.store.root().is_dir() {
            tracing::warn!(
                corpus = %state.store.root().display(),
                "Corpus directory not found, starting with an empty corpus"
            );
            return Ok(state);
        }

        state.reload().await?;
        Ok(state)
    }

    pub fn from_parts(resolver: Arc<SkillResolver>, store: CorpusStore, data_dir: PathBuf) -> Self {
        Self {
            resolver,
            store,
            data_dir,
        }
    }

    /// Re-read the corpus from disk and activate it.
    pub async fn reload(&self) -> anyhow::Result<Arc<CorpusIndex>> {
        let resolver = Arc::clone(&self.resolver);
        let store = self.store.clone();
        let index = tokio::task::spawn_blocking(move || store.reload_into(&resolver))
            .await
            .context("corpus reload task failed")?
            .with_context(|| {
                format!("failed to load skill corpus from {}", self.store.root().display())
            })?;

        tracing::info!(
            generation = index.generation(),
            skills = index.len(),
            warnings = index.warnings().len(),
            corpus = %self.store.root().display(),
            "Corpus loaded"
        );
        Ok(index)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use skillctx_types::config::GlobalConfig;

    pub(crate) const INFRA_SKILL: &str = "---\nname: security-infra\ntitle: Infrastructure Security\ndescription: Headers and transport hardening\ntriggers: [csp, cors, hsts]\nrelated: [security-auth, devops]\ntokens: 400\n---\n\n# Infrastructure Security\n\nSet CSP and CORS headers.\n";
    pub(crate) const AUTH_SKILL: &str = "---\nname: security-auth\ntitle: Authentication\ndescription: Tokens and sessions\ntriggers: [oauth, jwt]\ntokens: 300\n---\n\n# Authentication\n\nValidate JWT signatures.\n";
    pub(crate) const DEPLOY_SKILL: &str = "---\nname: deploy\ndescription: Ship the current branch to staging\ncontext: manual\nuser-invocable: true\ntriggers: [deploy]\ntokens: 50\n---\n\nRun the pipeline.\n";

    pub(crate) fn write_skill(root: &Path, id: &str, content: &str) {
        let dir = root.join(id);
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("SKILL.md"), content).unwrap();
    }

    /// State over a temp corpus holding the security pair and a manual
    /// deploy skill, already loaded.
    pub(crate) async fn loaded_state(root: &Path) -> AppState {
        write_skill(root, "security-infra", INFRA_SKILL);
        write_skill(root, "security-auth", AUTH_SKILL);
        write_skill(root, "deploy", DEPLOY_SKILL);

        let resolver = Arc::new(SkillResolver::new(GlobalConfig::default()).unwrap());
        let state = AppState::from_parts(
            resolver,
            CorpusStore::new(root.to_path_buf()),
            root.to_path_buf(),
        );
        state.reload().await.unwrap();
        state
    }
}

#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use skillctx_types::config::GlobalConfig;

    #[tokio::test]
    async fn reload_activates_disk_corpus() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        assert_eq!(state.resolver.generation(), 1);
        let index = state.resolver.snapshot();
        assert_eq!(index.len(), 3);
        // devops is not in the corpus
        assert_eq!(index.warnings().len(), 1);
    }

    #[tokio::test]
    async fn failed_reload_keeps_previous_generation() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        write_skill(tmp.path(), "copy", AUTH_SKILL);
        let err = state.reload().await.unwrap_err();
        assert!(format!("{err:#}").contains("duplicate skill id"));
        assert_eq!(state.resolver.generation(), 1);
        assert!(state.resolver.get_skill_by_id("security-auth").is_ok());
    }

    #[tokio::test]
    async fn reload_of_missing_corpus_is_an_error() {
        let resolver = Arc::new(SkillResolver::new(GlobalConfig::default()).unwrap());
        let state = AppState::from_parts(
            resolver,
            CorpusStore::new(PathBuf::from("/nonexistent/skillctx/corpus")),
            PathBuf::from("/nonexistent"),
        );
        assert!(state.reload().await.is_err());
        assert_eq!(state.resolver.generation(), 0);
    }
}
