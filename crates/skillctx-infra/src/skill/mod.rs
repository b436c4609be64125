//! Skill corpus infrastructure: on-disk discovery and change watching.

pub mod corpus_store;
pub mod watcher;
