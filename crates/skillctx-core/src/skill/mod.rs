//! Skill resolution pipeline.
//!
//! SKILL.md frontmatter parsing, the corpus index, and the per-query stages
//! that turn a query context into an injection bundle:
//! matcher → expander → ranker → packer → prompt injector. The domain types
//! live in `skillctx-types`; [`resolver::SkillResolver`] ties the stages
//! together behind an atomically swappable index.

pub mod expander;
pub mod index;
pub mod manifest;
pub mod matcher;
pub mod packer;
pub mod prompt_injector;
pub mod ranker;
pub mod resolver;
pub mod tokens;

#[cfg(test)]
pub(crate) mod testing;
