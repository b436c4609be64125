//! skillctx CLI and REST API entry point.
//!
//! Binary name: `skillctx`
//!
//! Parses CLI arguments, loads configuration and the skill corpus, then
//! dispatches to the appropriate command handler or starts the REST API
//! server.

mod cli;
mod http;
mod state;

use clap::Parser;
use clap_complete::generate;

use cli::{Cli, Commands};
use skillctx_infra::skill::watcher::start_corpus_watcher;
use skillctx_observe::tracing_setup::{init_tracing, shutdown_tracing};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Set up tracing based on verbosity
    let filter = match cli.verbose {
        0 if cli.quiet => "error",
        0 => "warn",
        1 => "info,skillctx=debug",
        _ => "trace",
    };
    init_tracing(filter, cli.otel)
        .map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "skillctx", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init(cli.corpus.as_deref()).await?;

    match cli.command {
        Commands::Resolve(args) => {
            cli::resolve::resolve(&state, &args, cli.json, cli.quiet)?;
        }

        Commands::Show { id } => {
            cli::skill::show(&state, &id, cli.json)?;
        }

        Commands::List { category, plugin } => {
            cli::skill::list(&state, category.as_deref(), plugin.as_deref(), cli.json)?;
        }

        Commands::Check { strict } => {
            cli::skill::check(&state, strict, cli.json)?;
        }

        Commands::Catalog => {
            cli::skill::catalog(&state, cli.json)?;
        }

        Commands::Serve { port, host, watch } => {
            // Keep the handle alive for the lifetime of the server.
            let _watcher = if watch {
                Some(start_corpus_watcher(
                    state.resolver.clone(),
                    state.store.clone(),
                    None,
                )?)
            } else {
                None
            };

            let addr = format!("{host}:{port}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;

            if !cli.quiet {
                println!(
                    "  {} skillctx API listening on {}",
                    console::style("*").green().bold(),
                    console::style(format!("http://{addr}/api/v1")).cyan()
                );
                println!(
                    "  {} skills, generation {}{}",
                    state.resolver.snapshot().len(),
                    state.resolver.generation(),
                    if watch { ", watching for changes" } else { "" }
                );
                println!("  {}", console::style("Press Ctrl+C to stop").dim());
            }

            let router = http::router::build_router(state);

            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown_signal())
                .await?;

            if !cli.quiet {
                println!("\n  Server stopped.");
            }
        }

        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}

/// Wait for Ctrl+C or SIGTERM.
///
/// A signal handler that cannot be installed is logged and that source is
/// ignored; the other one still stops the server.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
