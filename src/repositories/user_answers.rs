use sqlx::PgPool;
use time::PrimitiveDateTime;

use crate::db::models::UserAnswer;

const COLUMNS: &str = "\
    id, user_id, generated_task_id, task_index, task_content, user_answer, correct_answer, \
    is_correct, answered_at";

pub(crate) struct CreateUserAnswer<'a> {
    pub(crate) user_id: i64,
    pub(crate) generated_task_id: i64,
    pub(crate) task_index: i32,
    pub(crate) task_content: &'a str,
    pub(crate) user_answer: &'a str,
    pub(crate) correct_answer: &'a str,
    pub(crate) is_correct: bool,
    pub(crate) answered_at: PrimitiveDateTime,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateUserAnswer<'_>,
) -> Result<UserAnswer, sqlx::Error> {
    sqlx::query_as::<_, UserAnswer>(&format!(
        "INSERT INTO user_answers (
            user_id, generated_task_id, task_index, task_content, user_answer, correct_answer,
            is_correct, answered_at
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8)
         RETURNING {COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(params.generated_task_id)
    .bind(params.task_index)
    .bind(params.task_content)
    .bind(params.user_answer)
    .bind(params.correct_answer)
    .bind(params.is_correct)
    .bind(params.answered_at)
    .fetch_one(executor)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct AnswerCounts {
    pub(crate) total: i64,
    pub(crate) correct: i64,
}

pub(crate) async fn counts_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<AnswerCounts, sqlx::Error> {
    sqlx::query_as::<_, AnswerCounts>(
        "SELECT COUNT(*) AS total,
                COUNT(*) FILTER (WHERE is_correct) AS correct
         FROM user_answers
         WHERE user_id = $1",
    )
    .bind(user_id)
    .fetch_one(pool)
    .await
}
