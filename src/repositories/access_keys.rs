use sqlx::PgPool;

use crate::db::models::AccessKey;

pub(crate) const COLUMNS: &str = "id, key_hash, user_id, test_id, created_by, created_at";

pub(crate) struct CreateAccessKey<'a> {
    pub(crate) id: &'a str,
    pub(crate) key_hash: &'a str,
    pub(crate) user_id: &'a str,
    pub(crate) test_id: &'a str,
    pub(crate) created_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateAccessKey<'_>,
) -> Result<AccessKey, sqlx::Error> {
    sqlx::query_as::<_, AccessKey>(&format!(
        "INSERT INTO access_keys (id, key_hash, user_id, test_id, created_by, created_at)
         VALUES ($1,$2,$3,$4,$5,$6)
         RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.key_hash)
    .bind(params.user_id)
    .bind(params.test_id)
    .bind(params.created_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

/// Single-statement find-and-delete: the single-use guarantee. Of any
/// number of concurrent redeemers exactly one gets the row back; the rest
/// see `None`.
pub(crate) async fn redeem_by_hash(
    pool: &PgPool,
    key_hash: &str,
) -> Result<Option<AccessKey>, sqlx::Error> {
    sqlx::query_as::<_, AccessKey>(&format!(
        "DELETE FROM access_keys WHERE key_hash = $1 RETURNING {COLUMNS}",
    ))
    .bind(key_hash)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn count_by_test(pool: &PgPool, test_id: &str) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM access_keys WHERE test_id = $1")
        .bind(test_id)
        .fetch_one(pool)
        .await
}
