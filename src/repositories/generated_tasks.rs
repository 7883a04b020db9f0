use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::GeneratedTask;

const COLUMNS: &str = "id, user_id, prompt, generated_text, created_at";

pub(crate) struct CreateGeneratedTask<'a> {
    pub(crate) user_id: i64,
    pub(crate) prompt: &'a str,
    pub(crate) generated_text: &'a str,
    pub(crate) created_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateGeneratedTask<'_>,
) -> Result<GeneratedTask, sqlx::Error> {
    sqlx::query_as::<_, GeneratedTask>(&format!(
        "INSERT INTO generated_tasks (user_id, prompt, generated_text, created_at)
         VALUES ($1,$2,$3,$4)
         RETURNING {COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(params.prompt)
    .bind(params.generated_text)
    .bind(params.created_at)
    .fetch_one(executor)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<Option<GeneratedTask>, sqlx::Error> {
    sqlx::query_as::<_, GeneratedTask>(&format!(
        "SELECT {COLUMNS} FROM generated_tasks WHERE id = $1 AND user_id = $2"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

/// Returns whether a row was removed. Answers go with it via `ON DELETE CASCADE`.
pub(crate) async fn delete_for_user(
    pool: &PgPool,
    id: i64,
    user_id: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generated_tasks WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

/// Deletes the listed generations owned by `user_id`; ids of other users are skipped.
pub(crate) async fn delete_many_for_user(
    pool: &PgPool,
    ids: &[i64],
    user_id: i64,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM generated_tasks WHERE id = ANY($1) AND user_id = $2")
        .bind(ids)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected())
}
