use serde::Serialize;

use crate::schemas::user::UserResponse;

#[derive(Debug, Serialize)]
pub(crate) struct TokenResponse {
    pub(crate) ok: bool,
    pub(crate) token: String,
    pub(crate) token_type: String,
    pub(crate) user: UserResponse,
}
