use std::collections::BTreeMap;

use serde::Serialize;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::TestResult;

#[derive(Debug, Serialize)]
pub(crate) struct TestResultResponse {
    pub(crate) id: String,
    pub(crate) test_id: String,
    pub(crate) test_title: String,
    pub(crate) test_key: String,
    pub(crate) started_at: String,
    pub(crate) ended_at: String,
    pub(crate) duration_seconds: i64,
    pub(crate) initial_html: BTreeMap<String, String>,
    pub(crate) final_html: BTreeMap<String, String>,
    pub(crate) completed_at: String,
}

impl TestResultResponse {
    pub(crate) fn from_db(result: TestResult) -> Self {
        Self {
            id: result.id,
            test_id: result.test_id,
            test_title: result.test_title,
            test_key: result.test_key,
            started_at: format_primitive(result.started_at),
            ended_at: format_primitive(result.ended_at),
            duration_seconds: result.duration_seconds,
            initial_html: result.initial_html.0,
            final_html: result.final_html.0,
            completed_at: format_primitive(result.completed_at),
        }
    }
}
