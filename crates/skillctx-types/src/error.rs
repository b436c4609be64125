use thiserror::Error;

/// Errors that abort building a corpus index.
///
/// A failed reload leaves the previously active index in place.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoadError {
    #[error("duplicate skill id '{id}' (defined in {first} and {second})")]
    DuplicateId {
        id: String,
        first: String,
        second: String,
    },

    #[error("malformed skill metadata in {origin}: {reason}")]
    Malformed { origin: String, reason: String },

    #[error("failed to read corpus at {path}: {reason}")]
    Io { path: String, reason: String },

    #[error("failed to build phrase index: {reason}")]
    PhraseIndex { reason: String },
}

/// Direct lookup of an id the active corpus does not contain.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("skill '{0}' not found")]
pub struct SkillNotFound(pub String);

/// Per-query failures. The resolver turns these into a degraded, empty
/// bundle instead of propagating them.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    #[error("query text is {len} characters, limit is {max}")]
    QueryTooLong { len: usize, max: usize },
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("expansion decay must be within [0, 1], got {0}")]
    DecayOutOfRange(f64),

    #[error("scoring weight '{name}' must be finite and non-negative, got {value}")]
    InvalidWeight { name: &'static str, value: f64 },

    #[error("estimator chars_per_token must be positive, got {0}")]
    InvalidCharsPerToken(f64),
}
