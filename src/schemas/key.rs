use serde::{Deserialize, Serialize};

use crate::db::models::TestContent;

#[derive(Debug, Deserialize)]
pub(crate) struct AccessKeyCreate {
    #[serde(alias = "userId")]
    pub(crate) user_id: String,
    #[serde(alias = "testId")]
    pub(crate) test_id: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct AccessKeyCreated {
    pub(crate) ok: bool,
    pub(crate) key: String,
}

/// Payload of a successful key redemption: the exam content with media
/// already rewritten to servable URLs, plus the session the redemption
/// opened.
#[derive(Debug, Serialize)]
pub(crate) struct AccessTestResponse {
    pub(crate) ok: bool,
    pub(crate) test: RedeemedTest,
    pub(crate) session_id: String,
    pub(crate) time_remaining: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct RedeemedTest {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: TestContent,
}
