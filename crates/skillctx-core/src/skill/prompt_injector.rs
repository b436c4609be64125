//! Rendering of resolved skills for the host agent's context window.
//!
//! Two levels, both delimited with XML tags so skill content stays clearly
//! separated from the surrounding prompt. The catalog lists what can be
//! invoked directly (id + description only). The active block carries the
//! full bodies picked by the resolver, followed by a manifest line for
//! observability.

use skillctx_types::bundle::InjectionBundle;

use super::index::CorpusIndex;

// ---------------------------------------------------------------------------
// Catalog: user-invocable skills
// ---------------------------------------------------------------------------

/// `<available_skills>` listing of every user-invocable skill, in id order.
///
/// ```xml
/// <available_skills>
///   <skill id="deploy">Ship the current branch to staging</skill>
/// </available_skills>
/// ```
///
/// Returns an empty string when nothing is invocable.
pub fn assemble_catalog(index: &CorpusIndex) -> String {
    let mut invocable = index.records().filter(|r| r.user_invocable).peekable();
    if invocable.peek().is_none() {
        return String::new();
    }

    let mut xml = String::from("<available_skills>\n");
    for record in invocable {
        xml.push_str(&format!(
            "  <skill id=\"{}\">{}</skill>\n",
            escape_attr(&record.id),
            escape_text(&record.description)
        ));
    }
    xml.push_str("</available_skills>");
    xml
}

// ---------------------------------------------------------------------------
// Active skills: full bodies plus manifest
// ---------------------------------------------------------------------------

/// Render a bundle as injectable text.
///
/// Bodies appear in rank order, each inside
/// `<skill id=".." title="..">`. Bodies keep their markdown as written, but
/// closing tags that would end the `<skill>` or `<active_skills>` element
/// early are neutralized (see [`guard_body`]). A self-closing
/// `<skill_manifest/>` always follows, even for an empty bundle.
pub fn assemble(bundle: &InjectionBundle) -> String {
    let mut out = String::new();

    if !bundle.skills.is_empty() {
        out.push_str("<active_skills>\n");
        for skill in &bundle.skills {
            out.push_str(&format!(
                "<skill id=\"{}\" title=\"{}\">\n{}\n</skill>\n",
                escape_attr(&skill.id),
                escape_attr(&skill.title),
                guard_body(skill.body.trim())
            ));
        }
        out.push_str("</active_skills>\n");
    }

    out.push_str(&manifest_line(bundle));
    out
}

fn manifest_line(bundle: &InjectionBundle) -> String {
    let included = bundle.ids().join(",");
    let excluded = bundle
        .excluded
        .iter()
        .map(|e| format!("{}:{}", e.id, e.reason))
        .collect::<Vec<_>>()
        .join(",");

    let mut line = format!(
        "<skill_manifest included=\"{}\" excluded=\"{}\" tokens=\"{}\" budget=\"{}\" truncated=\"{}\" generation=\"{}\"",
        escape_attr(&included),
        escape_attr(&excluded),
        bundle.total_tokens,
        bundle.budget,
        bundle.truncated,
        bundle.generation,
    );
    if let Some(diagnostic) = &bundle.diagnostic {
        line.push_str(&format!(" diagnostic=\"{}\"", escape_attr(diagnostic)));
    }
    line.push_str("/>");
    line
}

/// Element names a body must not close.
const GUARDED_CLOSERS: [&str; 2] = ["skill", "active_skills"];

/// Rewrite `</skill...` and `</active_skills...` (ASCII case-insensitive) to
/// `<\/skill...` so a body cannot terminate its envelope. Everything else,
/// other HTML included, passes through.
fn guard_body(body: &str) -> String {
    let mut out = String::with_capacity(body.len());
    let mut rest = body;
    while let Some(at) = rest.find("</") {
        out.push_str(&rest[..at]);
        let name = &rest[at + 2..];
        let guarded = GUARDED_CLOSERS.iter().any(|closer| {
            name.get(..closer.len())
                .is_some_and(|prefix| prefix.eq_ignore_ascii_case(closer))
        });
        out.push_str(if guarded { "<\\/" } else { "</" });
        rest = name;
    }
    out.push_str(rest);
    out
}

fn escape_text(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

fn escape_attr(value: &str) -> String {
    escape_text(value).replace('"', "&quot;")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
