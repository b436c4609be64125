//! Observability setup for skillctx: structured logging and optional
//! OpenTelemetry span export.

pub mod tracing_setup;
