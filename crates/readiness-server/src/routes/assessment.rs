use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use readiness_core::score::ReadinessResult;
use readiness_core::session::NextQuestion;
use readiness_core::types::{validate_score, BusinessProfile};
use serde::Deserialize;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct BusinessInfoBody {
    pub name: String,
    pub industry: String,
    pub size: String,
    pub location: String,
}

#[derive(Debug, Deserialize)]
pub struct StartBody {
    #[serde(default)]
    pub business_info: BusinessInfoBody,
}

/// POST /api/assessment/start: create a session for a business profile.
pub async fn start_assessment(
    State(app): State<AppState>,
    payload: Result<Json<StartBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let info = body.business_info;
    let profile = BusinessProfile::new(info.name, info.industry, info.size, info.location);

    let store = app.store.clone();
    let session = blocking(move || store.start(profile)).await?;

    Ok(Json(serde_json::json!({
        "assessment_id": session.id(),
        "business_info": session.profile(),
        "total_questions": app.store.catalog().len(),
        "started_at": session.started_at(),
    })))
}

/// GET /api/assessment/:id/next: the question at the cursor, or the
/// completion signal.
pub async fn next_question(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let next = blocking(move || store.next_question(&id)).await?;

    let body = match next {
        NextQuestion::Question(view) => {
            let mut value = serde_json::to_value(view)?;
            value["completed"] = serde_json::Value::Bool(false);
            value
        }
        NextQuestion::Complete { total_questions } => serde_json::json!({
            "completed": true,
            "total_questions": total_questions,
        }),
    };
    Ok(Json(body))
}

#[derive(Debug, Deserialize)]
pub struct AnswerBody {
    pub question_id: String,
    /// Kept loose so a fractional or string score is a 400 with a clear
    /// message rather than a body rejection.
    pub score: serde_json::Value,
    #[serde(default)]
    pub section_id: Option<String>,
}

/// POST /api/assessment/:id/answer: record the score for the current
/// question.
pub async fn submit_answer(
    State(app): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<AnswerBody>, JsonRejection>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    let score = body
        .score
        .as_i64()
        .ok_or_else(|| AppError::bad_request(format!("score must be an integer, got {}", body.score)))?;
    validate_score(score)?;

    if let (Some(section_id), Some(question)) = (
        body.section_id.as_deref(),
        app.store.catalog().question(&body.question_id),
    ) {
        if question.section_id != section_id {
            return Err(AppError::bad_request(format!(
                "question '{}' belongs to section '{}', not '{section_id}'",
                question.id, question.section_id
            )));
        }
    }

    let store = app.store.clone();
    let question_id = body.question_id;
    let outcome = blocking(move || store.submit_answer(&id, &question_id, score)).await?;

    let mut value = serde_json::to_value(&outcome)?;
    value["total_questions"] = serde_json::json!(app.store.catalog().len());
    Ok(Json(value))
}

/// GET /api/assessment/:id/status: progress snapshot.
pub async fn get_status(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let status = blocking(move || store.status(&id)).await?;
    Ok(Json(serde_json::to_value(status)?))
}

/// GET /api/assessment/:id/results: score summary; readiness is included
/// once the session is complete.
pub async fn get_results(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let (summary, session) = blocking(move || {
        let summary = store.summary(&id)?;
        let session = store.get(&id)?;
        Ok((summary, session))
    })
    .await?;

    let mut value = serde_json::to_value(summary)?;
    value["business_info"] = serde_json::to_value(session.profile())?;
    Ok(Json(value))
}

/// GET /api/assessment/:id/readiness: readiness level; 409 until the
/// session is complete.
pub async fn get_readiness(
    State(app): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ReadinessResult>, AppError> {
    let store = app.store.clone();
    let result = blocking(move || {
        let level = store.readiness_level(&id)?;
        // Complete sessions never change, so the total matches the level.
        let total = store.get(&id)?.total_score();
        Ok(ReadinessResult::new(level, total, store.bands()))
    })
    .await?;
    Ok(Json(result))
}

/// GET /api/assessments: every known session, oldest first.
pub async fn list_assessments(
    State(app): State<AppState>,
) -> Result<Json<serde_json::Value>, AppError> {
    let store = app.store.clone();
    let sessions = blocking(move || Ok(store.list())).await?;
    let total = app.store.catalog().len();

    let list: Vec<serde_json::Value> = sessions
        .iter()
        .map(|s| {
            serde_json::json!({
                "assessment_id": s.id(),
                "business_name": s.profile().name,
                "industry": s.profile().industry,
                "cursor": s.cursor(),
                "total_questions": total,
                "complete": s.is_complete(),
                "started_at": s.started_at(),
                "updated_at": s.updated_at(),
            })
        })
        .collect();
    Ok(Json(serde_json::json!(list)))
}
