use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::{MockTest, TestContent};

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct MockTestCreate {
    #[validate(length(min = 1, message = "title must not be empty"))]
    pub(crate) title: String,
    pub(crate) content: TestContent,
}

#[derive(Debug, Serialize)]
pub(crate) struct MockTestResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) content: TestContent,
    pub(crate) created_by: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl MockTestResponse {
    pub(crate) fn from_db(test: MockTest) -> Self {
        Self {
            id: test.id,
            title: test.title,
            content: test.content.0,
            created_by: test.created_by,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct MockTestSummaryResponse {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl MockTestSummaryResponse {
    pub(crate) fn from_db(test: MockTest) -> Self {
        Self {
            id: test.id,
            title: test.title,
            created_at: format_primitive(test.created_at),
            updated_at: format_primitive(test.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadFileResponse {
    pub(crate) id: String,
    pub(crate) original_name: String,
    pub(crate) content_type: String,
    pub(crate) size_bytes: i64,
}
