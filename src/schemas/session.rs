use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::time::format_offset;
use crate::db::models::TestContent;
use crate::services::session::{FocusStatus, SessionData};

#[derive(Debug, Serialize)]
pub(crate) struct SessionStateResponse {
    pub(crate) session_id: String,
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) test_key: String,
    pub(crate) content: TestContent,
    pub(crate) started_at: String,
    pub(crate) answers: BTreeMap<String, String>,
    pub(crate) time_remaining: u64,
    pub(crate) blurred: bool,
    pub(crate) violations: u32,
}

impl SessionStateResponse {
    pub(crate) fn from_session(session_id: &str, data: SessionData) -> Self {
        Self {
            session_id: session_id.to_string(),
            test_id: data.test.id,
            test_title: data.test.title,
            test_key: data.test_key,
            content: data.test.content,
            started_at: format_offset(data.started_at),
            answers: data.answers,
            time_remaining: data.time_remaining,
            blurred: data.focus.blurred,
            violations: data.focus.violations,
        }
    }
}

/// Autosave body: the serialized editor content, stored verbatim.
#[derive(Debug, Deserialize)]
pub(crate) struct AnswerUpdate {
    pub(crate) content: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AnswerSaved {
    pub(crate) success: bool,
    pub(crate) section: String,
    pub(crate) saved_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct VisibilityUpdate {
    pub(crate) hidden: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct VisibilityResponse {
    pub(crate) blurred: bool,
    pub(crate) violations: u32,
    /// Path the client must navigate to when the violation fired.
    pub(crate) redirect: Option<&'static str>,
    /// How long the violation page holds the student before sending them
    /// back to the session.
    pub(crate) return_after_seconds: Option<u64>,
}

impl VisibilityResponse {
    pub(crate) fn from_status(status: FocusStatus, return_after_seconds: u64) -> Self {
        let redirect = status.redirect.map(|target| target.as_path());
        Self {
            blurred: status.blurred,
            violations: status.violations,
            return_after_seconds: redirect.is_some().then_some(return_after_seconds),
            redirect,
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct SessionFinished {
    pub(crate) ok: bool,
    pub(crate) result_id: String,
    pub(crate) test_title: String,
    pub(crate) duration_seconds: i64,
    pub(crate) redirect: &'static str,
}
