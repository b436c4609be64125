//! Shared domain types for skillctx.
//!
//! Skill records and their frontmatter, per-request query and candidate
//! types, the injection bundle, configuration, and error enums.
//!
//! Zero infrastructure dependencies -- only serde and thiserror.

pub mod bundle;
pub mod config;
pub mod error;
pub mod query;
pub mod skill;
