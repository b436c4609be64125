//! The injection bundle handed to the host agent.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::query::Budget;

/// A skill body selected for injection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectedSkill {
    pub id: String,
    pub title: String,
    pub body: String,
    pub token_cost: u32,
    pub score: f64,
}

/// Why a candidate did not make it into the bundle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// Did not fit in the remaining budget.
    Budget,
    /// `context: manual`; only reachable through direct lookup.
    ManualOnly,
    /// Dropped in favour of a skill that supersedes it.
    Superseded { by: String },
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Budget => write!(f, "budget"),
            Self::ManualOnly => write!(f, "manual_only"),
            Self::Superseded { by } => write!(f, "superseded_by={by}"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExcludedSkill {
    pub id: String,
    #[serde(flatten)]
    pub reason: ExclusionReason,
}

/// Ordered selection of skill bodies for one request.
///
/// `total_tokens <= budget` always holds. `truncated` is set only when a
/// candidate was dropped for budget reasons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InjectionBundle {
    pub skills: Vec<InjectedSkill>,
    pub total_tokens: u32,
    pub budget: u32,
    pub excluded: Vec<ExcludedSkill>,
    pub truncated: bool,
    /// Generation of the corpus index the bundle was resolved against.
    pub generation: u64,
    /// Set when the query could not be resolved and the bundle was degraded
    /// to empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diagnostic: Option<String>,
}

impl InjectionBundle {
    pub fn empty(budget: Budget, generation: u64) -> Self {
        Self {
            skills: Vec::new(),
            total_tokens: 0,
            budget: budget.get(),
            excluded: Vec::new(),
            truncated: false,
            generation,
            diagnostic: None,
        }
    }

    /// Empty bundle carrying the reason the query failed.
    pub fn degraded(budget: Budget, generation: u64, diagnostic: impl Into<String>) -> Self {
        Self {
            diagnostic: Some(diagnostic.into()),
            ..Self::empty(budget, generation)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.skills.is_empty()
    }

    pub fn ids(&self) -> Vec<&str> {
        self.skills.iter().map(|s| s.id.as_str()).collect()
    }

    pub fn excluded_ids(&self) -> Vec<&str> {
        self.excluded.iter().map(|s| s.id.as_str()).collect()
    }
}
