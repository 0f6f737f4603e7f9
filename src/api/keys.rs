use std::collections::HashMap;
use std::time::Duration;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::db::models::TestContent;
use crate::repositories;
use crate::schemas::key::{AccessKeyCreate, AccessKeyCreated, AccessTestResponse, RedeemedTest};
use crate::services::access_keys::{generate_access_key, hash_access_key};
use crate::services::content::resolve_file_urls;
use crate::services::session::SessionTest;
use crate::tasks::ticker::spawn_session_ticker;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/", post(create_key))
}

pub(crate) fn access_router() -> Router<AppState> {
    Router::new().route("/:key", get(redeem_key))
}

/// Mints a single-use key binding one student to one test. The plaintext
/// is returned here and never stored.
async fn create_key(
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
    Json(payload): Json<AccessKeyCreate>,
) -> Result<(StatusCode, Json<AccessKeyCreated>), ApiError> {
    let user = repositories::users::find_by_id(state.db(), &payload.user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch user"))?;
    if user.is_none() {
        return Err(ApiError::BadRequest("User not found".to_string()));
    }

    let test = repositories::mock_tests::exists_by_id(state.db(), &payload.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?;
    if test.is_none() {
        return Err(ApiError::BadRequest("Test not found".to_string()));
    }

    let key = generate_access_key();
    let key_hash = hash_access_key(&key);

    repositories::access_keys::create(
        state.db(),
        repositories::access_keys::CreateAccessKey {
            id: &Uuid::new_v4().to_string(),
            key_hash: &key_hash,
            user_id: &payload.user_id,
            test_id: &payload.test_id,
            created_by: &admin.id,
            created_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create access key"))?;

    tracing::info!(
        admin_id = %admin.id,
        user_id = %payload.user_id,
        test_id = %payload.test_id,
        action = "key_create",
        "Admin minted access key"
    );

    Ok((StatusCode::CREATED, Json(AccessKeyCreated { ok: true, key })))
}

/// Redeems a key and opens the exam session. The repository call is a
/// single find-and-delete statement, so of two simultaneous redemptions of
/// the same key exactly one succeeds.
async fn redeem_key(
    Path(key): Path<String>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AccessTestResponse>, ApiError> {
    // Don't burn the key while the student already has a live session.
    let existing = state
        .sessions()
        .active_session_for(&user.id)
        .await
        .map_err(ApiError::from_session)?;
    if existing.is_some() {
        return Err(ApiError::Conflict(
            "An exam session is already active for this user".to_string(),
        ));
    }

    let key_hash = hash_access_key(&key);
    let access = repositories::access_keys::redeem_by_hash(state.db(), &key_hash)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to redeem access key"))?;

    let Some(access) = access else {
        return Err(ApiError::NotFound("Invalid key".to_string()));
    };

    if access.user_id != user.id {
        tracing::warn!(
            user_id = %user.id,
            key_user_id = %access.user_id,
            "Access key redeemed by a different user"
        );
        return Err(ApiError::Forbidden("This key was issued to another user"));
    }

    let test = repositories::mock_tests::find_by_id(state.db(), &access.test_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch test"))?;

    let Some(test) = test else {
        return Err(ApiError::NotFound("Test not found".to_string()));
    };

    let urls = build_file_urls(&state, &test.content.0).await?;
    let resolved = resolve_file_urls(&test.content.0, &urls);

    let session_test =
        SessionTest { id: test.id.clone(), title: test.title.clone(), content: resolved };

    let started = state
        .sessions()
        .start(
            &user.id,
            &session_test,
            &crate::services::access_keys::normalize_key(&key),
            OffsetDateTime::now_utc(),
        )
        .await
        .map_err(ApiError::from_session)?;

    spawn_session_ticker(state.clone(), started.session_id.clone()).await;

    metrics::counter!("exam_keys_redeemed_total").increment(1);
    metrics::counter!("exam_sessions_started_total").increment(1);

    Ok(Json(AccessTestResponse {
        ok: true,
        test: RedeemedTest {
            id: session_test.id,
            title: session_test.title,
            content: session_test.content,
        },
        session_id: started.session_id,
        time_remaining: started.time_remaining,
    }))
}

async fn build_file_urls(
    state: &AppState,
    content: &TestContent,
) -> Result<HashMap<String, String>, ApiError> {
    let ids = content.file_ids();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let files = repositories::uploads::find_many_by_ids(state.db(), &ids)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch referenced files"))?;

    let expires =
        Duration::from_secs(state.settings().exam().presigned_url_expire_minutes * 60);

    let mut urls = HashMap::with_capacity(files.len());
    for file in files {
        let url = match state.storage() {
            Some(storage) => storage
                .presign_get(&file.object_key, expires)
                .await
                .map_err(|e| ApiError::internal(e, "Failed to presign file URL"))?,
            // Without object storage the files are expected behind a static
            // /uploads mount, same layout the original server used.
            None => {
                let name = file.object_key.rsplit('/').next().unwrap_or(&file.object_key);
                format!("/uploads/{name}")
            }
        };
        urls.insert(file.id, url);
    }

    Ok(urls)
}
