//! Skill resolution endpoint.
//!
//! POST /api/v1/resolve - Resolve a query into an injection bundle.

use std::time::Instant;

use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use skillctx_core::skill::prompt_injector::assemble;
use skillctx_infra::config::resolve_budget;
use skillctx_types::bundle::InjectionBundle;
use skillctx_types::query::{ContextSignals, QueryContext};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ResolveRequest {
    pub query: String,
    #[serde(default)]
    pub signals: ContextSignals,
    /// Falls back to `default_budget_tokens` from `config.toml`.
    #[serde(default)]
    pub budget_tokens: Option<u32>,
    /// Also return the bundle rendered as prompt text.
    #[serde(default)]
    pub render: bool,
}

#[derive(Debug, Serialize)]
pub struct ResolveResponse {
    #[serde(flatten)]
    pub bundle: InjectionBundle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rendered: Option<String>,
}

/// POST /api/v1/resolve
///
/// Never fails for a well-formed body: a query the pipeline cannot handle
/// comes back as an empty bundle with a `diagnostic`.
pub async fn resolve(
    State(state): State<AppState>,
    Json(request): Json<ResolveRequest>,
) -> Result<Json<ApiResponse<ResolveResponse>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let budget = resolve_budget(state.resolver.config(), request.budget_tokens);
    let query = QueryContext::new(request.query).with_signals(request.signals);
    let bundle = state.resolver.resolve(&query, budget);

    tracing::info!(
        request_id = %request_id,
        generation = bundle.generation,
        included = bundle.skills.len(),
        tokens = bundle.total_tokens,
        truncated = bundle.truncated,
        "Resolve request served"
    );

    let rendered = request.render.then(|| assemble(&bundle));
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(
        ResolveResponse { bundle, rendered },
        request_id,
        elapsed,
    )))
}
