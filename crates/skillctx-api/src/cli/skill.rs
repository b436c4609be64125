//! Corpus inspection commands: `show`, `list`, `check`, and `catalog`.

use anyhow::{Result, bail};
use comfy_table::{Cell, Color, ContentArrangement, Table, presets};
use console::style;

use skillctx_core::skill::index::CorpusIndex;
use skillctx_core::skill::prompt_injector::assemble_catalog;
use skillctx_types::skill::SkillRecord;

use crate::state::AppState;

// ---------------------------------------------------------------------------
// Show
// ---------------------------------------------------------------------------

pub fn show(state: &AppState, id: &str, json: bool) -> Result<()> {
    let record = state.resolver.get_skill_by_id(id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(record.as_ref())?);
        return Ok(());
    }

    println!();
    println!(
        "  {} {}",
        style("Skill:").bold(),
        style(&record.id).cyan().bold()
    );
    println!("  {} {}", style("Title:").bold(), record.title);
    println!("  {} {}", style("Description:").bold(), record.description);
    if let Some(category) = &record.category {
        println!("  {} {}", style("Category:").bold(), category);
    }
    if let Some(plugin) = &record.plugin {
        println!("  {} {}", style("Plugin:").bold(), plugin);
    }
    println!(
        "  {} {} ({})",
        style("Context:").bold(),
        if record.context_inject { "inject" } else { "manual" },
        if record.user_invocable {
            "user-invocable"
        } else {
            "not user-invocable"
        }
    );
    println!("  {} {}", style("Priority:").bold(), record.priority);
    println!("  {} ~{}", style("Tokens:").bold(), record.token_cost);
    println!("  {} {}", style("Origin:").bold(), style(&record.origin).dim());

    print_list("Triggers", &record.triggers);
    print_list("Auto-detects", &record.auto_detect);
    print_list("Related", &record.related);
    print_list("Supersedes", &record.supersedes);

    println!();
    println!("{}", record.body.trim_end());
    println!();
    Ok(())
}

fn print_list(label: &str, items: &[String]) {
    if !items.is_empty() {
        println!("  {} {}", style(format!("{label}:")).bold(), items.join(", "));
    }
}

// ---------------------------------------------------------------------------
// List
// ---------------------------------------------------------------------------

/// Records matching the optional category and plugin filters, in id order.
pub fn filter_records<'a>(
    index: &'a CorpusIndex,
    category: Option<&str>,
    plugin: Option<&str>,
) -> Vec<&'a SkillRecord> {
    index
        .filter_records(category, plugin)
        .map(|r| r.as_ref())
        .collect()
}

pub fn list(
    state: &AppState,
    category: Option<&str>,
    plugin: Option<&str>,
    json: bool,
) -> Result<()> {
    let index = state.resolver.snapshot();
    let records = filter_records(&index, category, plugin);

    if json {
        let out: Vec<_> = records
            .iter()
            .map(|r| {
                serde_json::json!({
                    "id": r.id,
                    "title": r.title,
                    "category": r.category,
                    "plugin": r.plugin,
                    "priority": r.priority,
                    "tokens": r.token_cost,
                    "context": if r.context_inject { "inject" } else { "manual" },
                    "user_invocable": r.user_invocable,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    if records.is_empty() {
        println!();
        if index.is_empty() {
            println!(
                "  No skills found in {}",
                style(state.store.root().display()).yellow()
            );
        } else {
            println!("  No skills match the filter.");
        }
        println!();
        return Ok(());
    }

    let mut table = Table::new();
    table
        .load_preset(presets::UTF8_FULL_CONDENSED)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec![
            Cell::new("Id").fg(Color::Cyan),
            Cell::new("Category"),
            Cell::new("Plugin"),
            Cell::new("Tokens"),
            Cell::new("Context"),
            Cell::new("Description"),
        ]);

    for r in &records {
        let (context, context_color) = if r.context_inject {
            ("inject", Color::Green)
        } else {
            ("manual", Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&r.id),
            Cell::new(r.category.as_deref().unwrap_or("-")),
            Cell::new(r.plugin.as_deref().unwrap_or("-")),
            Cell::new(r.token_cost),
            Cell::new(context).fg(context_color),
            Cell::new(&r.description),
        ]);
    }

    println!();
    println!("{table}");
    println!(
        "  {} skills, generation {}",
        records.len(),
        index.generation()
    );
    println!();
    Ok(())
}

// ---------------------------------------------------------------------------
// Check
// ---------------------------------------------------------------------------

pub fn check(state: &AppState, strict: bool, json: bool) -> Result<()> {
    if !state.store.root().is_dir() {
        bail!(
            "corpus directory {} does not exist",
            state.store.root().display()
        );
    }

    let index = state.resolver.snapshot();
    let warnings: Vec<String> = index.warnings().iter().map(ToString::to_string).collect();
    let cycles = index.related_cycles();

    if json {
        let out = serde_json::json!({
            "corpus": state.store.root(),
            "data_dir": state.data_dir,
            "generation": index.generation(),
            "skills": index.len(),
            "warnings": warnings,
            "related_cycles": cycles,
        });
        println!("{}", serde_json::to_string_pretty(&out)?);
    } else {
        println!();
        println!(
            "  {} {} skills loaded from {}",
            style("*").green().bold(),
            index.len(),
            style(state.store.root().display()).cyan()
        );
        for warning in &warnings {
            println!("  {} {}", style("!").yellow(), warning);
        }
        // Cycles are legal; expansion is bounded. Shown for authors.
        for cycle in &cycles {
            println!(
                "  {} related cycle: {}",
                style("~").dim(),
                cycle.join(" -> ")
            );
        }
        println!();
    }

    if strict && !warnings.is_empty() {
        bail!("{} corpus warning(s)", warnings.len());
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub fn catalog(state: &AppState, json: bool) -> Result<()> {
    let index = state.resolver.snapshot();

    if json {
        let out: Vec<_> = index
            .records()
            .filter(|r| r.user_invocable)
            .map(|r| serde_json::json!({ "id": r.id, "description": r.description }))
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    let xml = assemble_catalog(&index);
    if xml.is_empty() {
        println!();
        println!("  No user-invocable skills.");
        println!();
    } else {
        println!("{xml}");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::{loaded_state, write_skill};

    #[tokio::test]
    async fn filter_by_category_and_plugin() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(
            tmp.path(),
            "plugins/f5-stacks/skills/django",
            "---\nname: django\ndescription: Django\ncategory: python\n---\nBody\n",
        );
        let state = loaded_state(tmp.path()).await;
        let index = state.resolver.snapshot();

        assert_eq!(filter_records(&index, None, None).len(), 4);

        let python = filter_records(&index, Some("python"), None);
        assert_eq!(python.len(), 1);
        assert_eq!(python[0].id, "django");

        let plugin = filter_records(&index, None, Some("f5-stacks"));
        assert_eq!(plugin.len(), 1);
        assert!(filter_records(&index, Some("python"), Some("other")).is_empty());
    }

    #[tokio::test]
    async fn category_filter_ignores_case() {
        let tmp = tempfile::tempdir().unwrap();
        write_skill(
            tmp.path(),
            "django",
            "---\nname: django\ndescription: Django\ncategory: Python\n---\nBody\n",
        );
        let state = loaded_state(tmp.path()).await;
        let index = state.resolver.snapshot();

        for filter in ["Python", "PYTHON", "python"] {
            let found = filter_records(&index, Some(filter), None);
            assert_eq!(found.len(), 1, "filter {filter}");
            assert_eq!(found[0].id, "django");
        }
    }

    #[tokio::test]
    async fn show_unknown_skill_fails() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        let err = show(&state, "nextjs", false).unwrap_err();
        assert!(err.to_string().contains("nextjs"));
        assert!(show(&state, "deploy", false).is_ok());
    }

    #[tokio::test]
    async fn strict_check_fails_on_dangling_edge() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        // security-infra names devops, which is not in the corpus
        assert!(check(&state, false, false).is_ok());
        assert!(check(&state, true, true).is_err());
    }

    #[tokio::test]
    async fn strict_check_fails_on_unreachable_manual_skill() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;
        write_skill(
            tmp.path(),
            "devops",
            "---\nname: devops\ndescription: CI and deploys\n---\nBody\n",
        );
        state.reload().await.unwrap();
        assert!(check(&state, true, true).is_ok());

        write_skill(
            tmp.path(),
            "rollback",
            "---\nname: rollback\ndescription: Revert a release\ncontext: manual\n---\nBody\n",
        );
        let index = state.reload().await.unwrap();
        assert_eq!(index.warnings().len(), 1);
        assert!(index.warnings()[0].to_string().contains("rollback"));
        assert!(check(&state, true, true).is_err());
    }

    #[tokio::test]
    async fn list_and_catalog_render() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        assert!(list(&state, None, None, false).is_ok());
        assert!(list(&state, Some("missing"), None, true).is_ok());
        assert!(catalog(&state, false).is_ok());
        assert!(catalog(&state, true).is_ok());
    }
}
