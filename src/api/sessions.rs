use axum::{
    extract::{Path, State},
    routing::{get, post, put},
    Json, Router,
};
use time::OffsetDateTime;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::format_offset;
use crate::db::models::User;
use crate::db::types::SectionId;
use crate::schemas::session::{
    AnswerSaved, AnswerUpdate, SessionFinished, SessionStateResponse, VisibilityResponse,
    VisibilityUpdate,
};
use crate::services::session::focus::VisibilityEvent;
use crate::services::session::InitOutcome;
use crate::services::session_finalize::{finalize_session, FinishReason};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/:session_id", get(get_session))
        .route("/:session_id/answers/:section", put(update_answer))
        .route("/:session_id/visibility", post(report_visibility))
        .route("/:session_id/finish", post(finish_session))
}

async fn get_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionStateResponse>, ApiError> {
    require_session_owner(&state, &session_id, &user).await?;

    let outcome = state
        .sessions()
        .initialize(&session_id, OffsetDateTime::now_utc())
        .await
        .map_err(ApiError::from_session)?;

    match outcome {
        InitOutcome::Ready(data) => {
            Ok(Json(SessionStateResponse::from_session(&session_id, *data)))
        }
        InitOutcome::Missing { .. } => Err(ApiError::NotFound(
            "No test session found. Please start from the Mock page.".to_string(),
        )),
    }
}

/// Autosave endpoint; the editors push serialized content here on their
/// fixed cadence. Redis caps the effective write rate per section.
async fn update_answer(
    Path((session_id, section)): Path<(String, String)>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<AnswerUpdate>,
) -> Result<Json<AnswerSaved>, ApiError> {
    require_session_owner(&state, &session_id, &user).await?;

    let Some(section) = SectionId::parse(&section) else {
        return Err(ApiError::BadRequest(format!("Unknown section: {section}")));
    };

    let configured_interval = state.settings().exam().auto_save_interval_seconds.max(1);
    let rate_key = format!("autosave:{session_id}:{}", section.as_str());
    let allowed = state
        .redis()
        .rate_limit(&rate_key, 1, configured_interval)
        .await
        .unwrap_or(true);
    if !allowed {
        return Err(ApiError::TooManyRequests("Auto-save rate limit exceeded"));
    }

    state
        .sessions()
        .update_answer(&session_id, section, &payload.content)
        .await
        .map_err(ApiError::from_session)?;

    Ok(Json(AnswerSaved {
        success: true,
        section: section.as_str().to_string(),
        saved_at: format_offset(OffsetDateTime::now_utc()),
    }))
}

async fn report_visibility(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<VisibilityUpdate>,
) -> Result<Json<VisibilityResponse>, ApiError> {
    require_session_owner(&state, &session_id, &user).await?;

    let event =
        if payload.hidden { VisibilityEvent::Hidden } else { VisibilityEvent::Visible };

    let status = state
        .sessions()
        .visibility(&session_id, event, OffsetDateTime::now_utc())
        .await
        .map_err(ApiError::from_session)?;

    if status.redirect.is_some() {
        metrics::counter!("exam_tab_violations_total").increment(1);
    }

    Ok(Json(VisibilityResponse::from_status(
        status,
        state.settings().exam().violation_return_seconds,
    )))
}

async fn finish_session(
    Path(session_id): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<SessionFinished>, ApiError> {
    require_session_owner(&state, &session_id, &user).await?;

    let summary = finalize_session(&state, &session_id, FinishReason::Manual)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to finish session"))?;

    let Some(summary) = summary else {
        // Another finisher (timeout or a duplicate click) already won.
        return Err(ApiError::NotFound(
            "No test session found. Please start from the Mock page.".to_string(),
        ));
    };

    Ok(Json(SessionFinished {
        ok: true,
        result_id: summary.result_id,
        test_title: summary.test_title,
        duration_seconds: summary.duration_seconds,
        redirect: summary.redirect.as_path(),
    }))
}

async fn require_session_owner(
    state: &AppState,
    session_id: &str,
    user: &User,
) -> Result<(), ApiError> {
    let owner = state
        .sessions()
        .owner(session_id)
        .await
        .map_err(ApiError::from_session)?;

    match owner {
        None => Err(ApiError::NotFound(
            "No test session found. Please start from the Mock page.".to_string(),
        )),
        Some(owner) if owner == user.id => Ok(()),
        Some(_) => Err(ApiError::Forbidden("Access denied")),
    }
}
