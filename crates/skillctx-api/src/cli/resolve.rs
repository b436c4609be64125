//! `skillctx resolve` - run a query through the resolver and show the bundle.

use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use skillctx_core::skill::prompt_injector::assemble;
use skillctx_infra::config::resolve_budget;
use skillctx_types::bundle::{ExclusionReason, InjectionBundle};
use skillctx_types::query::{ContextSignals, QueryContext};

use crate::state::AppState;

#[derive(Debug, Args)]
pub struct ResolveArgs {
    /// Query text (multiple words are joined with spaces).
    #[arg(required = true, num_args = 1..)]
    pub query: Vec<String>,

    /// Detected language signal (repeatable).
    #[arg(long)]
    pub lang: Vec<String>,

    /// Detected framework signal (repeatable).
    #[arg(long)]
    pub framework: Vec<String>,

    /// Open file path (repeatable).
    #[arg(long)]
    pub file: Vec<String>,

    /// Token budget (defaults to `default_budget_tokens`).
    #[arg(long)]
    pub budget: Option<u32>,

    /// Print the injectable prompt text instead of a summary.
    #[arg(long)]
    pub render: bool,
}

impl ResolveArgs {
    pub fn to_query(&self) -> QueryContext {
        QueryContext::new(self.query.join(" ")).with_signals(ContextSignals {
            detected_languages: self.lang.clone(),
            detected_frameworks: self.framework.clone(),
            open_file_paths: self.file.clone(),
        })
    }
}

pub fn resolve(state: &AppState, args: &ResolveArgs, json: bool, quiet: bool) -> Result<()> {
    let budget = resolve_budget(state.resolver.config(), args.budget);
    let bundle = state.resolver.resolve(&args.to_query(), budget);

    if json {
        println!("{}", serde_json::to_string_pretty(&bundle)?);
        return Ok(());
    }

    if args.render {
        println!("{}", assemble(&bundle));
        return Ok(());
    }

    if quiet {
        for id in bundle.ids() {
            println!("{id}");
        }
        return Ok(());
    }

    print_bundle(&bundle);
    Ok(())
}

fn print_bundle(bundle: &InjectionBundle) {
    println!();

    if let Some(diagnostic) = &bundle.diagnostic {
        println!("  {} {}", style("!").red().bold(), diagnostic);
        println!();
        return;
    }

    if bundle.skills.is_empty() {
        println!("  No skills selected.");
    } else {
        let mut table = Table::new();
        table
            .load_preset(presets::UTF8_FULL_CONDENSED)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(vec![
                Cell::new("#"),
                Cell::new("Skill").fg(Color::Cyan),
                Cell::new("Title"),
                Cell::new("Score"),
                Cell::new("Tokens"),
            ]);

        for (rank, skill) in bundle.skills.iter().enumerate() {
            table.add_row(vec![
                Cell::new(rank + 1),
                Cell::new(&skill.id),
                Cell::new(&skill.title),
                Cell::new(format!("{:.2}", skill.score)),
                Cell::new(skill.token_cost),
            ]);
        }
        println!("{table}");
    }

    for excluded in &bundle.excluded {
        let marker = match excluded.reason {
            ExclusionReason::Budget => style("-").yellow(),
            ExclusionReason::ManualOnly => style("-").dim(),
            ExclusionReason::Superseded { .. } => style("-").magenta(),
        };
        println!(
            "  {} {} ({})",
            marker,
            style(&excluded.id).cyan(),
            excluded.reason
        );
    }

    println!();
    let usage = token_usage(bundle);
    if bundle.truncated {
        println!(
            "  {} {} (truncated), generation {}",
            style("*").yellow().bold(),
            usage,
            bundle.generation
        );
    } else {
        println!(
            "  {} {}, generation {}",
            style("*").green().bold(),
            usage,
            bundle.generation
        );
    }
    println!();
}

fn token_usage(bundle: &InjectionBundle) -> String {
    format!("{}/{} tokens", bundle.total_tokens, bundle.budget)
}
