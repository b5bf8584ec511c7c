use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/health: liveness plus catalog and session counts.
pub async fn health(State(app): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "questions": app.store.catalog().len(),
        "sessions": app.store.len(),
        "guidance": app.guide.name(),
    }))
}
