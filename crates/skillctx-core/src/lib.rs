//! Business logic for skillctx.
//!
//! Pure, in-memory skill resolution. Depends only on `skillctx-types` --
//! corpus discovery, config files, and watching live in `skillctx-infra`.

pub mod skill;
