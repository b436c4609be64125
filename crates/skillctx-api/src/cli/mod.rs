//! CLI command definitions for the `skillctx` binary.
//!
//! Uses clap derive macros for argument parsing. Global flags control the
//! output format and log verbosity; `--corpus` points at a skill directory
//! other than the configured one.

pub mod resolve;
pub mod skill;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Resolve agent skills into budgeted context injections.
#[derive(Parser)]
#[command(name = "skillctx", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Skill corpus directory (overrides `corpus_dir` in config.toml).
    #[arg(long, global = true, env = "SKILLCTX_CORPUS")]
    pub corpus: Option<PathBuf>,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true)]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolve a query into the skills that would be injected.
    Resolve(resolve::ResolveArgs),

    /// Show a skill's metadata and body.
    Show {
        /// Skill id.
        id: String,
    },

    /// List skills in the corpus.
    #[command(alias = "ls")]
    List {
        /// Only skills in this category.
        #[arg(long)]
        category: Option<String>,

        /// Only skills owned by this plugin.
        #[arg(long)]
        plugin: Option<String>,
    },

    /// Validate the corpus and report load warnings and related-skill cycles.
    Check {
        /// Fail when any warning is reported.
        #[arg(long)]
        strict: bool,
    },

    /// Print the catalog of user-invocable skills as prompt text.
    Catalog,

    /// Start the REST API server.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Reload the corpus when skill files change.
        #[arg(long)]
        watch: bool,
    },

    /// Generate shell completions.
    Completions {
        /// Shell to generate completions for.
        shell: Shell,
    },
}
