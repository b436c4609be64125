//! GET /api/v1/health - Liveness plus the active corpus generation.

use axum::Json;
use axum::extract::State;
use serde_json::json;

use crate::state::AppState;

pub async fn health_check(State(state): State<AppState>) -> Json<serde_json::Value> {
    let index = state.resolver.snapshot();
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "generation": index.generation(),
        "skills": index.len(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::testing::loaded_state;

    #[tokio::test]
    async fn reports_generation_and_size() {
        let tmp = tempfile::tempdir().unwrap();
        let state = loaded_state(tmp.path()).await;

        let Json(body) = health_check(State(state)).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["generation"], 1);
        assert_eq!(body["skills"], 3);
    }
}
