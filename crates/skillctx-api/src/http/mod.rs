//! HTTP/REST API layer for skillctx.
//!
//! Axum-based REST API at `/api/v1/` exposing resolution, direct lookup,
//! and corpus reload, with an envelope response format and CORS support.

pub mod error;
pub mod handlers;
pub mod response;
pub mod router;
