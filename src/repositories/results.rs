use std::collections::BTreeMap;

use sqlx::PgPool;

use crate::db::models::TestResult;

pub(crate) const COLUMNS: &str = "\
    id, user_id, test_id, test_title, test_key, started_at, ended_at, \
    duration_seconds, initial_html, final_html, completed_at";

pub(crate) struct CreateTestResult<'a> {
    pub(crate) id: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) test_title: &'a str,
    pub(crate) test_key: &'a str,
    pub(crate) started_at: time::PrimitiveDateTime,
    pub(crate) ended_at: time::PrimitiveDateTime,
    pub(crate) duration_seconds: i64,
    pub(crate) initial_html: &'a BTreeMap<String, String>,
    pub(crate) final_html: &'a BTreeMap<String, String>,
    pub(crate) completed_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateTestResult<'_>,
) -> Result<TestResult, sqlx::Error> {
    let initial =
        serde_json::to_value(params.initial_html).unwrap_or_else(|_| serde_json::json!({}));
    let final_html =
        serde_json::to_value(params.final_html).unwrap_or_else(|_| serde_json::json!({}));

    sqlx::query_as::<_, TestResult>(&format!(
        "INSERT INTO test_results (
            id, user_id, test_id, test_title, test_key, started_at, ended_at,
            duration_seconds, initial_html, final_html, completed_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9,$10,$11)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.user_id)
    .bind(params.test_id)
    .bind(params.test_title)
    .bind(params.test_key)
    .bind(params.started_at)
    .bind(params.ended_at)
    .bind(params.duration_seconds)
    .bind(initial)
    .bind(final_html)
    .bind(params.completed_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn list_by_user(
    pool: &PgPool,
    user_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<TestResult>, sqlx::Error> {
    sqlx::query_as::<_, TestResult>(&format!(
        "SELECT {COLUMNS} FROM test_results
         WHERE user_id = $1
         ORDER BY completed_at DESC
         OFFSET $2 LIMIT $3"
    ))
    .bind(user_id)
    .bind(skip.max(0))
    .bind(limit.clamp(1, 1000))
    .fetch_all(pool)
    .await
}

/// Results are append-only except for explicit deletion by their owner.
pub(crate) async fn delete_owned(
    pool: &PgPool,
    id: &str,
    user_id: &str,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM test_results WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
