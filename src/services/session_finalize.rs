use time::OffsetDateTime;
use uuid::Uuid;

use crate::core::state::AppState;
use crate::core::time::to_primitive_utc;
use crate::repositories;
use crate::services::session::RedirectTarget;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FinishReason {
    Manual,
    Timeout,
}

impl FinishReason {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Timeout => "timeout",
        }
    }
}

#[derive(Debug)]
pub(crate) struct FinishSummary {
    pub(crate) result_id: String,
    pub(crate) test_title: String,
    pub(crate) duration_seconds: i64,
    pub(crate) redirect: RedirectTarget,
}

/// Shared finisher for the manual endpoint and the timeout path: flush the
/// session out of the transient store, append the durable result record,
/// stop the ticker. Returns `None` when another finisher already won.
pub(crate) async fn finalize_session(
    state: &AppState,
    session_id: &str,
    reason: FinishReason,
) -> anyhow::Result<Option<FinishSummary>> {
    let now = OffsetDateTime::now_utc();
    let finished = state.sessions().finish(session_id, now).await?;
    state.sessions().detach_ticker(session_id).await;

    let Some(finished) = finished else {
        return Ok(None);
    };

    let result_id = Uuid::new_v4().to_string();
    repositories::results::create(
        state.db(),
        repositories::results::CreateTestResult {
            id: &result_id,
            user_id: &finished.user_id,
            test_id: &finished.test_id,
            test_title: &finished.test_title,
            test_key: &finished.test_key,
            started_at: to_primitive_utc(finished.started_at),
            ended_at: to_primitive_utc(finished.ended_at),
            duration_seconds: finished.duration_seconds,
            initial_html: &finished.initial_html,
            final_html: &finished.final_html,
            completed_at: to_primitive_utc(now),
        },
    )
    .await?;

    metrics::counter!(
        "exam_sessions_finished_total",
        "reason" => reason.as_str()
    )
    .increment(1);

    Ok(Some(FinishSummary {
        result_id,
        test_title: finished.test_title,
        duration_seconds: finished.duration_seconds,
        redirect: RedirectTarget::Landing,
    }))
}
