//! Data directory layout for skillctx.
//!
//! ```text
//! {data_dir}/
//!   config.toml
//!   skills/        default corpus root
//! ```

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "SKILLCTX_DATA_DIR";

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `SKILLCTX_DATA_DIR` environment variable
/// 2. `~/.skillctx`
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".skillctx");
    }

    // Last resort: current directory
    PathBuf::from(".skillctx")
}

pub fn config_path(data_dir: &Path) -> PathBuf {
    data_dir.join("config.toml")
}

/// Corpus root used when neither the CLI nor `config.toml` names one.
pub fn default_corpus_dir(data_dir: &Path) -> PathBuf {
    data_dir.join("skills")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layout_paths() {
        let data_dir = PathBuf::from("/home/user/.skillctx");
        assert_eq!(
            config_path(&data_dir),
            PathBuf::from("/home/user/.skillctx/config.toml")
        );
        assert_eq!(
            default_corpus_dir(&data_dir),
            PathBuf::from("/home/user/.skillctx/skills")
        );
    }

    #[test]
    fn test_resolve_data_dir_from_env() {
        // SAFETY: This test is single-threaded and restores the env var immediately.
        unsafe {
            std::env::set_var(DATA_DIR_ENV, "/tmp/test-skillctx");
        }
        let dir = resolve_data_dir();
        assert_eq!(dir, PathBuf::from("/tmp/test-skillctx"));
        unsafe {
            std::env::remove_var(DATA_DIR_ENV);
        }
    }
}
