use axum::extract::State;
use axum::Json;

use crate::state::AppState;

/// GET /api/catalog: sections in order, each with its questions and
/// rubrics, plus the readiness bands for this catalog.
pub async fn get_catalog(State(app): State<AppState>) -> Json<serde_json::Value> {
    let catalog = app.store.catalog();
    let sections: Vec<serde_json::Value> = catalog
        .sections()
        .iter()
        .map(|s| {
            serde_json::json!({
                "id": s.id,
                "name": s.name,
                "description": s.description,
                "questions": catalog.section_questions(s),
            })
        })
        .collect();

    Json(serde_json::json!({
        "sections": sections,
        "total_questions": catalog.len(),
        "min_total": catalog.min_total(),
        "max_total": catalog.max_total(),
        "bands": app.store.bands().bands(),
    }))
}
