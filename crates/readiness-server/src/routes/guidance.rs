use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::Json;
use readiness_guide::{BusinessContext, Guidance, GuidanceRequest};
use serde::Deserialize;

use super::blocking;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct GuidanceBody {
    pub question_id: String,
    #[serde(default)]
    pub user_message: Option<String>,
}

/// POST /api/assessment/:id/guidance: explain a catalog question in the
/// context of this session's business.
pub async fn get_guidance(
    State(app): State<AppState>,
    Path(id): Path<String>,
    payload: Result<Json<GuidanceBody>, JsonRejection>,
) -> Result<Json<Guidance>, AppError> {
    let Json(body) = payload.map_err(|e| AppError::bad_request(e.body_text()))?;
    if body.question_id.trim().is_empty() {
        return Err(AppError::bad_request("question_id is required"));
    }

    let store = app.store.clone();
    let session = blocking(move || store.get(&id)).await?;

    let question = app
        .store
        .catalog()
        .question(&body.question_id)
        .ok_or_else(|| AppError::bad_request(format!("unknown question '{}'", body.question_id)))?;

    let profile = session.profile();
    let request = GuidanceRequest {
        question_id: question.id.clone(),
        prompt: question.prompt.clone(),
        description: question.description.clone(),
        section_name: question.section_name.clone(),
        rubric: question.rubric.clone(),
        user_message: body.user_message,
        business: Some(BusinessContext {
            name: profile.name.clone(),
            industry: profile.industry.clone(),
            size: profile.size.clone(),
            location: profile.location.clone(),
        }),
    };

    let guidance = app.guide.explain(&request).await?;
    Ok(Json(guidance))
}
