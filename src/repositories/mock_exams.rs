use std::collections::BTreeMap;

use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};
use time::PrimitiveDateTime;

use crate::db::models::MockExam;
use crate::db::types::MockExamStatus;
use crate::schemas::generation::GeneratedTaskItem;

pub(crate) const COLUMNS: &str = "\
    id, user_id, exam_type, level, task_count, time_limit_minutes, started_at, finished_at, \
    time_elapsed_seconds, status, tasks_data, user_answers, score, max_score, percentage";

pub(crate) struct CreateMockExam<'a> {
    pub(crate) user_id: i64,
    pub(crate) exam_type: &'a str,
    pub(crate) level: &'a str,
    pub(crate) time_limit_minutes: i32,
    pub(crate) started_at: PrimitiveDateTime,
    pub(crate) tasks: &'a [GeneratedTaskItem],
    pub(crate) max_score: i32,
}

pub(crate) async fn create(
    executor: impl sqlx::PgExecutor<'_>,
    params: CreateMockExam<'_>,
) -> Result<MockExam, sqlx::Error> {
    sqlx::query_as::<_, MockExam>(&format!(
        "INSERT INTO mock_exams (
            user_id, exam_type, level, task_count, time_limit_minutes, started_at, status,
            tasks_data, max_score
         ) VALUES ($1,$2,$3,$4,$5,$6,$7,$8,$9)
         RETURNING {COLUMNS}"
    ))
    .bind(params.user_id)
    .bind(params.exam_type)
    .bind(params.level)
    .bind(params.tasks.len() as i32)
    .bind(params.time_limit_minutes)
    .bind(params.started_at)
    .bind(MockExamStatus::InProgress)
    .bind(Json(params.tasks))
    .bind(params.max_score)
    .fetch_one(executor)
    .await
}

/// Row-locks the exam for the rest of the transaction. Exams of other users are invisible.
pub(crate) async fn lock_for_user(
    tx: &mut Transaction<'_, Postgres>,
    id: i64,
    user_id: i64,
) -> Result<Option<MockExam>, sqlx::Error> {
    sqlx::query_as::<_, MockExam>(&format!(
        "SELECT {COLUMNS} FROM mock_exams WHERE id = $1 AND user_id = $2 FOR UPDATE"
    ))
    .bind(id)
    .bind(user_id)
    .fetch_optional(&mut **tx)
    .await
}

pub(crate) struct CompleteMockExam<'a> {
    pub(crate) id: i64,
    pub(crate) finished_at: PrimitiveDateTime,
    pub(crate) time_elapsed_seconds: i32,
    pub(crate) user_answers: &'a BTreeMap<u32, String>,
    pub(crate) score: i32,
    pub(crate) percentage: f64,
}

pub(crate) async fn complete(
    executor: impl sqlx::PgExecutor<'_>,
    params: CompleteMockExam<'_>,
) -> Result<MockExam, sqlx::Error> {
    sqlx::query_as::<_, MockExam>(&format!(
        "UPDATE mock_exams
         SET status = $2,
             finished_at = $3,
             time_elapsed_seconds = $4,
             user_answers = $5,
             score = $6,
             percentage = $7
         WHERE id = $1
         RETURNING {COLUMNS}"
    ))
    .bind(params.id)
    .bind(MockExamStatus::Completed)
    .bind(params.finished_at)
    .bind(params.time_elapsed_seconds)
    .bind(Json(params.user_answers))
    .bind(params.score)
    .bind(params.percentage)
    .fetch_one(executor)
    .await
}

#[derive(Debug, Clone)]
pub(crate) struct NewMockExamAnswer {
    pub(crate) task_index: i32,
    pub(crate) task_content: String,
    pub(crate) user_answer: Option<String>,
    pub(crate) correct_answer: String,
    pub(crate) is_correct: bool,
    pub(crate) points_earned: i32,
    pub(crate) max_points: i32,
}

pub(crate) async fn insert_answers(
    tx: &mut Transaction<'_, Postgres>,
    mock_exam_id: i64,
    answers: &[NewMockExamAnswer],
) -> Result<(), sqlx::Error> {
    if answers.is_empty() {
        return Ok(());
    }

    let mut builder = QueryBuilder::<Postgres>::new(
        "INSERT INTO mock_exam_answers (
            mock_exam_id, task_index, task_content, user_answer, correct_answer, is_correct,
            points_earned, max_points
         ) ",
    );
    builder.push_values(answers, |mut row, answer| {
        row.push_bind(mock_exam_id)
            .push_bind(answer.task_index)
            .push_bind(&answer.task_content)
            .push_bind(&answer.user_answer)
            .push_bind(&answer.correct_answer)
            .push_bind(answer.is_correct)
            .push_bind(answer.points_earned)
            .push_bind(answer.max_points);
    });

    builder.build().execute(&mut **tx).await?;
    Ok(())
}

pub(crate) async fn list_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<MockExam>, sqlx::Error> {
    sqlx::query_as::<_, MockExam>(&format!(
        "SELECT {COLUMNS}
         FROM mock_exams
         WHERE user_id = $1
         ORDER BY started_at DESC, id DESC"
    ))
    .bind(user_id)
    .fetch_all(pool)
    .await
}

/// Flips in-progress exams whose time limit plus `grace_minutes` has passed to `abandoned`.
pub(crate) async fn mark_overdue_abandoned(
    pool: &PgPool,
    now: PrimitiveDateTime,
    grace_minutes: i32,
) -> Result<Vec<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        "UPDATE mock_exams
         SET status = $3
         WHERE status = $2
           AND started_at + make_interval(mins => time_limit_minutes + $4) < $1
         RETURNING id",
    )
    .bind(now)
    .bind(MockExamStatus::InProgress)
    .bind(MockExamStatus::Abandoned)
    .bind(grace_minutes)
    .fetch_all(pool)
    .await
}
