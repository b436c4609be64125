//! Skill corpus HTTP handlers.
//!
//! Listing and direct lookup read the active index; reload re-reads the
//! corpus directory and swaps the new index in.

use std::sync::Arc;
use std::time::Instant;

use axum::Json;
use axum::extract::{Path, Query, State};
use serde::{Deserialize, Serialize};

use skillctx_types::skill::SkillRecord;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Request / Response DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct ListSkillsQuery {
    pub category: Option<String>,
    pub plugin: Option<String>,
}

/// Skill summary without the body.
#[derive(Debug, Serialize)]
pub struct SkillListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub category: Option<String>,
    pub plugin: Option<String>,
    pub priority: i32,
    pub token_cost: u32,
    pub context_inject: bool,
    pub user_invocable: bool,
}

impl From<&SkillRecord> for SkillListItem {
    fn from(record: &SkillRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            plugin: record.plugin.clone(),
            priority: record.priority,
            token_cost: record.token_cost,
            context_inject: record.context_inject,
            user_invocable: record.user_invocable,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SkillList {
    pub generation: u64,
    pub skills: Vec<SkillListItem>,
}

#[derive(Debug, Serialize)]
pub struct ReloadSummary {
    pub generation: u64,
    pub skills: usize,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

/// GET /api/v1/skills - List skills in the active corpus, in id order.
pub async fn list_skills(
    State(state): State<AppState>,
    Query(filter): Query<ListSkillsQuery>,
) -> Result<Json<ApiResponse<SkillList>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let index = state.resolver.snapshot();
    let skills = index
        .filter_records(filter.category.as_deref(), filter.plugin.as_deref())
        .map(|r| SkillListItem::from(r.as_ref()))
        .collect();

    let data = SkillList {
        generation: index.generation(),
        skills,
    };
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(data, request_id, elapsed).with_link("self", "/api/v1/skills"),
    ))
}

/// GET /api/v1/skills/{id} - Full record, body included.
///
/// Works for `context: manual` skills too; only resolution skips them.
pub async fn get_skill(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<SkillRecord>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let record: Arc<SkillRecord> = state.resolver.get_skill_by_id(&id)?;
    let self_link = format!("/api/v1/skills/{id}");

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(
        ApiResponse::success(SkillRecord::clone(&record), request_id, elapsed)
            .with_link("self", &self_link)
            .with_link("collection", "/api/v1/skills"),
    ))
}

/// POST /api/v1/reload - Re-read the corpus directory.
///
/// A failed load is reported and the previous index keeps serving.
pub async fn reload(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<ReloadSummary>>, AppError> {
    let start = Instant::now();
    let request_id = uuid::Uuid::now_v7().to_string();

    let resolver = Arc::clone(&state.resolver);
    let store = state.store.clone();
    let index = tokio::task::spawn_blocking(move || store.reload_into(&resolver))
        .await
        .map_err(|e| AppError::Internal(format!("reload task failed: {e}")))??;

    let warnings: Vec<String> = index.warnings().iter().map(ToString::to_string).collect();
    tracing::info!(
        request_id = %request_id,
        generation = index.generation(),
        skills = index.len(),
        warnings = warnings.len(),
        "Corpus reloaded via API"
    );

    let data = ReloadSummary {
        generation: index.generation(),
        skills: index.len(),
        warnings,
    };
    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(data, request_id, elapsed)))
}
