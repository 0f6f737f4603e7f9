use sqlx::PgPool;

use crate::db::models::UploadFile;

pub(crate) const COLUMNS: &str = "\
    id, object_key, original_name, content_type, size_bytes, sha256, \
    uploaded_by, created_at";

pub(crate) struct CreateUploadFile<'a> {
    pub(crate) id: &'a str,
    pub(crate) object_key: &'a str,
    pub(crate) original_name: &'a str,
    pub(crate) content_type: &'a str,
    pub(crate) size_bytes: i64,
    pub(crate) sha256: &'a str,
    pub(crate) uploaded_by: &'a str,
    pub(crate) created_at: time::PrimitiveDateTime,
}

pub(crate) async fn create(
    pool: &PgPool,
    params: CreateUploadFile<'_>,
) -> Result<UploadFile, sqlx::Error> {
    sqlx::query_as::<_, UploadFile>(&format!(
        "INSERT INTO upload_files (
            id, object_key, original_name, content_type, size_bytes,
            sha256, uploaded_by, created_at
        ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
        RETURNING {COLUMNS}",
    ))
    .bind(params.id)
    .bind(params.object_key)
    .bind(params.original_name)
    .bind(params.content_type)
    .bind(params.size_bytes)
    .bind(params.sha256)
    .bind(params.uploaded_by)
    .bind(params.created_at)
    .fetch_one(pool)
    .await
}

pub(crate) async fn find_many_by_ids(
    pool: &PgPool,
    ids: &[String],
) -> Result<Vec<UploadFile>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, UploadFile>(&format!(
        "SELECT {COLUMNS} FROM upload_files WHERE id = ANY($1)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn delete_many_by_ids(pool: &PgPool, ids: &[String]) -> Result<u64, sqlx::Error> {
    if ids.is_empty() {
        return Ok(0);
    }

    let result = sqlx::query("DELETE FROM upload_files WHERE id = ANY($1)")
        .bind(ids)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
