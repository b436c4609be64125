//! SKILL.md frontmatter parsing and validation.
//!
//! A skill document is YAML frontmatter delimited by `---` followed by a
//! markdown body. Frontmatter keys vary between corpora; see
//! [`SkillMetadata`] for the accepted shapes and their defaults.

use anyhow::{Context, bail};
use skillctx_types::skill::SkillMetadata;

/// Extract YAML frontmatter and markdown body from a SKILL.md file.
///
/// Content must start with `---`, and a closing `\n---` separates the YAML
/// from the body. A leading UTF-8 BOM and CRLF line endings are tolerated.
///
/// Returns `(yaml_str, body_str)` where body has leading blank lines trimmed.
pub fn extract_frontmatter(content: &str) -> anyhow::Result<(&str, &str)> {
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);

    if !content.starts_with("---") {
        bail!("SKILL.md must start with YAML frontmatter delimiter '---'");
    }

    let after_open = &content[3..];
    let after_open = after_open
        .strip_prefix("\r\n")
        .or_else(|| after_open.strip_prefix('\n'))
        .unwrap_or(after_open);

    let closing_pos = after_open
        .find("\n---")
        .context("SKILL.md missing closing frontmatter delimiter '---'")?;

    let yaml_str = after_open[..closing_pos].trim_end_matches('\r');
    let remainder = &after_open[closing_pos + 4..];

    // Drop the rest of the delimiter line, then leading blank lines
    let body_str = match remainder.find('\n') {
        Some(pos) => &remainder[pos + 1..],
        None => "",
    };
    let body_str = body_str.trim_start_matches(['\n', '\r']);

    Ok((yaml_str, body_str))
}

/// Parse a SKILL.md file into its frontmatter metadata and markdown body.
pub fn parse_skill_md(content: &str) -> anyhow::Result<(SkillMetadata, String)> {
    let (yaml_str, body_str) = extract_frontmatter(content)?;

    let metadata: SkillMetadata =
        serde_yaml_ng::from_str(yaml_str).context("Failed to parse SKILL.md YAML frontmatter")?;

    Ok((metadata, body_str.to_owned()))
}

/// Validate parsed metadata.
///
/// Checks:
/// - `name` is non-empty and matches slug pattern (lowercase alphanumeric + hyphens)
/// - `description` is non-empty
/// - `tokens`, when declared, is non-zero
pub fn validate_metadata(metadata: &SkillMetadata) -> anyhow::Result<()> {
    if metadata.name.is_empty() {
        bail!("Skill name must not be empty");
    }

    let is_valid_slug = metadata
        .name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');

    if !is_valid_slug {
        bail!(
            "Skill name '{}' must contain only lowercase letters, digits, and hyphens",
            metadata.name
        );
    }

    if metadata.name.starts_with('-') || metadata.name.ends_with('-') {
        bail!(
            "Skill name '{}' must not start or end with a hyphen",
            metadata.name
        );
    }

    if metadata.description.trim().is_empty() {
        bail!("Skill description must not be empty");
    }

    if metadata.tokens == Some(0) {
        bail!("Skill '{}' declares a token cost of zero", metadata.name);
    }

    if metadata.triggers.is_empty()
        && metadata.auto_detects.as_ref().is_none_or(|a| a.is_empty())
        && metadata.category.is_none()
    {
        tracing::debug!(
            skill = %metadata.name,
            "Skill has no triggers, auto-detects, or category; it is only reachable through related edges or direct lookup"
        );
    }

    Ok(())
}

/// Pull the token list out of an "Auto-detects: a, b, c." clause in a
/// description. The clause ends at a newline or at a period followed by
/// whitespace, so dotted tokens like `nest-cli.json` survive.
pub fn auto_detect_clause(description: &str) -> Vec<String> {
    const MARKER: &str = "auto-detects:";

    let lower = description.to_ascii_lowercase();
    let Some(start) = lower.find(MARKER) else {
        return Vec::new();
    };
    let rest = &description[start + MARKER.len()..];

    let mut end = rest.len();
    let bytes = rest.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'\n' {
            end = i;
            break;
        }
        if *b == b'.' && bytes.get(i + 1).is_none_or(|next| next.is_ascii_whitespace()) {
            end = i;
            break;
        }
    }

    rest[..end]
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
        .collect()
}

/// First `# ` heading of a markdown body, if any.
pub fn first_heading(body: &str) -> Option<&str> {
    body.lines()
        .map(str::trim)
        .find_map(|line| line.strip_prefix("# "))
        .map(str::trim)
        .filter(|h| !h.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillctx_types::skill::{ContextMode, ListField};

    const FULL_SKILL_MD: &str = r#"---
name: security-infra
title: Infrastructure Security
description: >-
  Harden HTTP edges. Use when configuring headers or TLS.
  Auto-detects: helmet, nginx.conf.
category: security
triggers: [csp, cors, hsts]
related:
  - security-auth
  - devops
supersedes: security
context: inject
user-invocable: true
priority: 2
tokens: 400
---

# Infrastructure Security

Set a strict Content-Security-Policy.
"#;

    const MINIMAL_SKILL_MD: &str = r#"---
name: hello-world
description: A simple greeting skill
---

Say hello to the user.
"#;

    #[test]
    fn parse_full_skill_md() {
        let (meta, body) = parse_skill_md(FULL_SKILL_MD).unwrap();

        assert_eq!(meta.name, "security-infra");
        assert_eq!(meta.title.as_deref(), Some("Infrastructure Security"));
        assert_eq!(meta.category.as_deref(), Some("security"));
        assert_eq!(meta.triggers.clone().into_items(), vec!["csp", "cors", "hsts"]);
        assert_eq!(
            meta.related.clone().into_items(),
            vec!["security-auth", "devops"]
        );
        assert_eq!(meta.supersedes, ListField::Inline("security".into()));
        assert_eq!(meta.context, ContextMode::Inject);
        assert!(meta.user_invocable);
        assert_eq!(meta.priority, 2);
        assert_eq!(meta.tokens, Some(400));
        assert!(meta.auto_detects.is_none());

        assert!(body.starts_with("# Infrastructure Security"));
        assert!(body.contains("Content-Security-Policy"));

        validate_metadata(&meta).unwrap();
    }

    #[test]
    fn parse_minimal_skill_md() {
        let (meta, body) = parse_skill_md(MINIMAL_SKILL_MD).unwrap();

        assert_eq!(meta.name, "hello-world");
        assert!(meta.triggers.is_empty());
        assert!(meta.category.is_none());
        assert_eq!(body.trim(), "Say hello to the user.");

        validate_metadata(&meta).unwrap();
    }

    #[test]
    fn parse_crlf_skill_md() {
        let content = "---\r\nname: crlf\r\ndescription: Windows file\r\n---\r\n\r\nBody\r\n";
        let (meta, body) = parse_skill_md(content).unwrap();
        assert_eq!(meta.name, "crlf");
        assert_eq!(body.trim(), "Body");
    }

    #[test]
    fn reject_missing_frontmatter() {
        let result = parse_skill_md("# No Frontmatter\n\nJust a markdown file.");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("must start with YAML frontmatter")
        );
    }

    #[test]
    fn reject_missing_closing_delimiter() {
        let result = parse_skill_md("---\nname: broken\ndescription: no closing\n");
        assert!(
            result
                .unwrap_err()
                .to_string()
                .contains("missing closing frontmatter")
        );
    }

    #[test]
    fn reject_missing_description_key() {
        let result = parse_skill_md("---\nname: no-desc\n---\nbody\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_invalid_name_uppercase() {
        let meta = SkillMetadata::new("MySkill", "Has uppercase");
        let err = validate_metadata(&meta).unwrap_err();
        assert!(err.to_string().contains("lowercase letters, digits, and hyphens"));
    }

    #[test]
    fn validate_hyphen_edges() {
        let meta = SkillMetadata::new("-edgy", "Leading hyphen");
        assert!(validate_metadata(&meta).is_err());
    }

    #[test]
    fn validate_empty_description() {
        let meta = SkillMetadata::new("good-name", "  ");
        let err = validate_metadata(&meta).unwrap_err();
        assert!(err.to_string().contains("description must not be empty"));
    }

    #[test]
    fn validate_zero_tokens() {
        let mut meta = SkillMetadata::new("good-name", "desc");
        meta.tokens = Some(0);
        assert!(validate_metadata(&meta).is_err());
    }

    #[test]
    fn auto_detect_clause_keeps_dotted_tokens() {
        let tokens = auto_detect_clause(
            "NestJS patterns. Use when building APIs. Auto-detects: @nestjs/core, nest-cli.json. Other text.",
        );
        assert_eq!(tokens, vec!["@nestjs/core", "nest-cli.json"]);
    }

    #[test]
    fn auto_detect_clause_absent() {
        assert!(auto_detect_clause("Use when writing Django views.").is_empty());
    }

    #[test]
    fn first_heading_found() {
        assert_eq!(first_heading("\n# Title here\n\ntext"), Some("Title here"));
        assert_eq!(first_heading("## Sub only"), None);
    }
}
