//! Per-request types: the query context, scored candidates, and the budget.
//!
//! Everything here is created and discarded within one resolve call.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Auxiliary signals about the agent's working context.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextSignals {
    #[serde(default)]
    pub detected_languages: Vec<String>,
    #[serde(default)]
    pub detected_frameworks: Vec<String>,
    #[serde(default)]
    pub open_file_paths: Vec<String>,
}

impl ContextSignals {
    pub fn is_empty(&self) -> bool {
        self.detected_languages.is_empty()
            && self.detected_frameworks.is_empty()
            && self.open_file_paths.is_empty()
    }
}

/// Query text plus context signals for a single resolve request.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryContext {
    pub text: String,
    #[serde(default)]
    pub signals: ContextSignals,
}

impl QueryContext {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            signals: ContextSignals::default(),
        }
    }

    pub fn with_signals(mut self, signals: ContextSignals) -> Self {
        self.signals = signals;
        self
    }

    /// True when there is nothing to match against.
    pub fn is_empty(&self) -> bool {
        self.text.trim().is_empty() && self.signals.is_empty()
    }
}

/// Why a skill became a candidate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchReason {
    Trigger { phrase: String },
    AutoDetect { token: String },
    Category { signal: String },
    Related { from: String, hops: u32 },
    Absorbed { skill: String },
}

impl fmt::Display for MatchReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Trigger { phrase } => write!(f, "trigger({phrase})"),
            Self::AutoDetect { token } => write!(f, "auto_detect({token})"),
            Self::Category { signal } => write!(f, "category({signal})"),
            Self::Related { from, hops } => write!(f, "related({from}, {hops})"),
            Self::Absorbed { skill } => write!(f, "absorbed({skill})"),
        }
    }
}

/// A scored skill candidate.
///
/// `priority` is copied from the record so candidates order themselves
/// without consulting the index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchCandidate {
    pub skill_id: String,
    pub score: f64,
    pub priority: i32,
    pub reasons: Vec<MatchReason>,
}

impl MatchCandidate {
    pub fn new(skill_id: impl Into<String>, score: f64, priority: i32) -> Self {
        Self {
            skill_id: skill_id.into(),
            score,
            priority,
            reasons: Vec::new(),
        }
    }

    pub fn with_reason(mut self, reason: MatchReason) -> Self {
        self.add_reason(reason);
        self
    }

    /// Add a reason unless an equal one is already recorded.
    pub fn add_reason(&mut self, reason: MatchReason) {
        if !self.reasons.contains(&reason) {
            self.reasons.push(reason);
        }
    }

    /// Fold another candidate for the same skill into this one: max score,
    /// union of reasons.
    pub fn merge(&mut self, other: MatchCandidate) {
        debug_assert_eq!(self.skill_id, other.skill_id);
        if other.score > self.score {
            self.score = other.score;
        }
        self.priority = self.priority.max(other.priority);
        for reason in other.reasons {
            self.add_reason(reason);
        }
    }

    /// Rank order: score descending, then priority descending, then id
    /// ascending.
    pub fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .score
            .total_cmp(&self.score)
            .then_with(|| other.priority.cmp(&self.priority))
            .then_with(|| self.skill_id.cmp(&other.skill_id))
    }
}

/// Maximum content size, in tokens, accepted for one injection.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct Budget(u32);

impl Budget {
    pub const fn tokens(tokens: u32) -> Self {
        Self(tokens)
    }

    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for Budget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.0)
    }
}
