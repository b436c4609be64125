//! Skill corpus domain types.
//!
//! `SkillMetadata` is the parsed SKILL.md frontmatter as authored, with all
//! the shape variations the corpus allows. `SkillRecord` is the normalized,
//! validated form held by the corpus index and shared read-only afterwards.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Frontmatter types
// ---------------------------------------------------------------------------

/// How a skill may reach the agent's context.
///
/// - `Inject`: eligible for automatic selection by the resolver.
/// - `Manual`: only reachable through direct lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextMode {
    #[default]
    Inject,
    Manual,
}

impl fmt::Display for ContextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Inject => write!(f, "inject"),
            Self::Manual => write!(f, "manual"),
        }
    }
}

/// A frontmatter list field.
///
/// Skill authors write lists either as YAML sequences or as a single
/// comma-separated string (`triggers: csp, cors, hsts`). Both forms
/// deserialize here and flatten through [`ListField::into_items`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ListField {
    Many(Vec<String>),
    Inline(String),
}

impl Default for ListField {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl ListField {
    /// Flatten into trimmed, non-empty items in authored order.
    pub fn into_items(self) -> Vec<String> {
        let raw = match self {
            Self::Many(items) => items,
            Self::Inline(joined) => joined.split(',').map(str::to_owned).collect(),
        };
        raw.into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            Self::Many(items) => items.iter().all(|s| s.trim().is_empty()),
            Self::Inline(joined) => joined.split(',').all(|s| s.trim().is_empty()),
        }
    }
}

impl From<Vec<&str>> for ListField {
    fn from(items: Vec<&str>) -> Self {
        Self::Many(items.into_iter().map(str::to_owned).collect())
    }
}

/// Parsed SKILL.md YAML frontmatter.
///
/// Every optional key has an explicit default: a missing `related` is an
/// empty list, a missing `context` means `inject`, a missing `priority` is 0.
/// `auto-detects` stays `None` when absent so the index can fall back to the
/// description's "Auto-detects:" clause.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillMetadata {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub triggers: ListField,
    #[serde(
        default,
        rename = "auto-detects",
        alias = "auto-detect",
        alias = "auto_detects"
    )]
    pub auto_detects: Option<ListField>,
    #[serde(default)]
    pub related: ListField,
    #[serde(default)]
    pub supersedes: ListField,
    #[serde(default)]
    pub context: ContextMode,
    #[serde(default, rename = "user-invocable", alias = "user_invocable")]
    pub user_invocable: bool,
    #[serde(default)]
    pub priority: i32,
    /// Authored token cost; overrides the estimator when present.
    #[serde(default)]
    pub tokens: Option<u32>,
    #[serde(default)]
    pub license: Option<String>,
}

impl SkillMetadata {
    /// Minimal metadata with every optional key at its default.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            title: None,
            category: None,
            triggers: ListField::default(),
            auto_detects: None,
            related: ListField::default(),
            supersedes: ListField::default(),
            context: ContextMode::default(),
            user_invocable: false,
            priority: 0,
            tokens: None,
            license: None,
        }
    }
}

/// One unparsed-but-split corpus entry, as handed to the index loader.
#[derive(Debug, Clone, PartialEq)]
pub struct RawSkillRecord {
    /// Where the record came from (file path or a caller-chosen label).
    pub origin: String,
    /// Owning plugin, when the corpus uses a `plugins/<name>/skills/` layout.
    pub plugin: Option<String>,
    pub metadata: SkillMetadata,
    /// Markdown body below the frontmatter.
    pub body: String,
}

// ---------------------------------------------------------------------------
// Indexed records
// ---------------------------------------------------------------------------

/// A validated, normalized skill held by the corpus index.
///
/// Trigger phrases and auto-detect tokens are lowercased with whitespace
/// collapsed. `related` and `supersedes` only reference ids that exist in
/// the same corpus.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SkillRecord {
    pub id: String,
    pub title: String,
    pub description: String,
    pub triggers: Vec<String>,
    pub auto_detect: Vec<String>,
    pub related: Vec<String>,
    pub supersedes: Vec<String>,
    pub body: String,
    pub token_cost: u32,
    pub category: Option<String>,
    pub priority: i32,
    pub context_inject: bool,
    pub user_invocable: bool,
    pub origin: String,
    pub plugin: Option<String>,
}

/// The kind of authored edge a load warning refers to.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    Related,
    Supersedes,
}

impl fmt::Display for EdgeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Related => write!(f, "related"),
            Self::Supersedes => write!(f, "supersedes"),
        }
    }
}

/// Non-fatal problem found while building an index. Offending edges are
/// pruned and the load continues.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LoadWarning {
    DanglingReference {
        skill: String,
        target: String,
        edge: EdgeKind,
    },
    SelfSupersession {
        skill: String,
    },
    /// `context: manual` without `user-invocable`: resolution never injects
    /// the skill and the catalog never lists it.
    UnreachableSkill {
        skill: String,
    },
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DanglingReference {
                skill,
                target,
                edge,
            } => write!(
                f,
                "skill '{skill}' has {edge} reference to unknown skill '{target}'"
            ),
            Self::SelfSupersession { skill } => {
                write!(f, "skill '{skill}' lists itself in supersedes")
            }
            Self::UnreachableSkill { skill } => write!(
                f,
                "skill '{skill}' is context: manual and not user-invocable; only direct lookup reaches it"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_field_accepts_sequence_and_inline_forms() {
        let yaml = "a: [csp, cors]\nb: 'oauth, jwt ,, '\n";
        #[derive(Deserialize)]
        struct Both {
            a: ListField,
            b: ListField,
        }
        let both: Both = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(both.a.into_items(), vec!["csp", "cors"]);
        assert_eq!(both.b.into_items(), vec!["oauth", "jwt"]);
    }

    #[test]
    fn metadata_defaults_when_keys_missing() {
        let meta: SkillMetadata =
            serde_yaml_ng::from_str("name: nestjs\ndescription: NestJS patterns\n").unwrap();
        assert_eq!(meta.context, ContextMode::Inject);
        assert!(!meta.user_invocable);
        assert!(meta.related.is_empty());
        assert!(meta.auto_detects.is_none());
        assert_eq!(meta.priority, 0);
    }

    #[test]
    fn metadata_reads_hyphenated_keys() {
        let yaml = "\
name: security-infra
description: Infra hardening
auto-detects: [helmet]
user-invocable: true
context: manual
";
        let meta: SkillMetadata = serde_yaml_ng::from_str(yaml).unwrap();
        assert_eq!(
            meta.auto_detects.map(ListField::into_items),
            Some(vec!["helmet".to_owned()])
        );
        assert!(meta.user_invocable);
        assert_eq!(meta.context, ContextMode::Manual);
    }

    #[test]
    fn dangling_warning_display_names_both_ends() {
        let w = LoadWarning::DanglingReference {
            skill: "security-infra".into(),
            target: "devops".into(),
            edge: EdgeKind::Related,
        };
        assert_eq!(
            w.to_string(),
            "skill 'security-infra' has related reference to unknown skill 'devops'"
        );
    }

    #[test]
    fn unreachable_warning_serializes_with_tag() {
        let w = LoadWarning::UnreachableSkill {
            skill: "deploy".into(),
        };
        assert!(w.to_string().starts_with("skill 'deploy' is context: manual"));
        let json = serde_json::to_value(&w).unwrap();
        assert_eq!(json["type"], "unreachable_skill");
        assert_eq!(json["skill"], "deploy");
    }
}
