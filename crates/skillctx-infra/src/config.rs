//! Global configuration loader for skillctx.
//!
//! Reads `config.toml` from the data directory (`~/.skillctx/` in production)
//! and deserializes it into [`GlobalConfig`]. Falls back to defaults when the
//! file is missing, malformed, or holds out-of-range values.

use std::path::{Path, PathBuf};

use skillctx_types::config::GlobalConfig;
use skillctx_types::query::Budget;

use crate::filesystem::{config_path, default_corpus_dir};

/// Load global configuration from `{data_dir}/config.toml`.
///
/// - If the file does not exist, returns [`GlobalConfig::default()`].
/// - If the file exists but fails to parse or validate, logs a warning and
///   returns the default.
/// - Otherwise returns the parsed config.
pub async fn load_global_config(data_dir: &Path) -> GlobalConfig {
    let config_path = config_path(data_dir);

    let content = match tokio::fs::read_to_string(&config_path).await {
        Ok(content) => content,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No config.toml found at {}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
        Err(err) => {
            tracing::warn!("Failed to read {}: {err}, using defaults", config_path.display());
            return GlobalConfig::default();
        }
    };

    let config = match toml::from_str::<GlobalConfig>(&content) {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(
                "Failed to parse {}: {err}, using defaults",
                config_path.display()
            );
            return GlobalConfig::default();
        }
    };

    if let Err(err) = config.validate() {
        tracing::warn!("Invalid {}: {err}, using defaults", config_path.display());
        return GlobalConfig::default();
    }

    config
}

/// Resolve the corpus root.
///
/// Priority:
/// 1. Explicit override (the CLI's `--corpus`)
/// 2. `corpus_dir` from `config.toml`, relative paths taken from `data_dir`
/// 3. `{data_dir}/skills`
pub fn resolve_corpus_dir(
    global_config: &GlobalConfig,
    data_dir: &Path,
    cli_override: Option<&Path>,
) -> PathBuf {
    if let Some(dir) = cli_override {
        return dir.to_path_buf();
    }
    match &global_config.corpus_dir {
        Some(dir) if dir.is_absolute() => dir.clone(),
        Some(dir) => data_dir.join(dir),
        None => default_corpus_dir(data_dir),
    }
}

/// Resolve the per-request budget: the request's own value, else the
/// configured default.
pub fn resolve_budget(global_config: &GlobalConfig, requested: Option<u32>) -> Budget {
    Budget::tokens(requested.unwrap_or(global_config.default_budget_tokens))
}
