use sqlx::{PgPool, Postgres, QueryBuilder};

use crate::db::models::ExamTask;

pub(crate) const COLUMNS: &str =
    "id, content, task_number, exam_sheet_name, year, level, subject, page, created_at";

const MAX_SEARCH_LIMIT: i64 = 100;

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct SearchParams<'a> {
    pub(crate) level: Option<&'a str>,
    pub(crate) subject: Option<&'a str>,
    pub(crate) limit: i64,
}

/// Most recent tasks first: `year DESC NULLS LAST, page ASC, id ASC`.
pub(crate) async fn search(
    pool: &PgPool,
    params: SearchParams<'_>,
) -> Result<Vec<ExamTask>, sqlx::Error> {
    let mut builder =
        QueryBuilder::<Postgres>::new(format!("SELECT {COLUMNS} FROM exam_tasks WHERE TRUE"));

    if let Some(level) = params.level {
        builder.push(" AND level = ");
        builder.push_bind(level);
    }
    if let Some(subject) = params.subject {
        builder.push(" AND subject = ");
        builder.push_bind(subject);
    }

    builder.push(" ORDER BY year DESC NULLS LAST, page ASC, id ASC LIMIT ");
    builder.push_bind(params.limit.clamp(0, MAX_SEARCH_LIMIT));

    builder.build_query_as::<ExamTask>().fetch_all(pool).await
}

/// Ids of every task eligible for a mock exam. An empty `subjects` slice means any subject.
pub(crate) async fn list_ids_for_exam_pool(
    pool: &PgPool,
    level: &str,
    subjects: &[String],
) -> Result<Vec<i64>, sqlx::Error> {
    let mut builder = QueryBuilder::<Postgres>::new("SELECT id FROM exam_tasks WHERE level = ");
    builder.push_bind(level);

    if !subjects.is_empty() {
        builder.push(" AND subject = ANY(");
        builder.push_bind(subjects);
        builder.push(")");
    }

    builder.push(" ORDER BY id");
    builder.build_query_scalar::<i64>().fetch_all(pool).await
}

/// Loads tasks preserving the order of `ids`.
pub(crate) async fn list_by_ids(pool: &PgPool, ids: &[i64]) -> Result<Vec<ExamTask>, sqlx::Error> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    sqlx::query_as::<_, ExamTask>(&format!(
        "SELECT {COLUMNS}
         FROM exam_tasks
         WHERE id = ANY($1)
         ORDER BY array_position($1::bigint[], id)"
    ))
    .bind(ids)
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_all(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM exam_tasks").fetch_one(pool).await
}

pub(crate) async fn list_years(pool: &PgPool) -> Result<Vec<i32>, sqlx::Error> {
    sqlx::query_scalar::<_, i32>(
        "SELECT DISTINCT year FROM exam_tasks WHERE year IS NOT NULL ORDER BY year DESC",
    )
    .fetch_all(pool)
    .await
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct GroupCountRow {
    pub(crate) key: String,
    pub(crate) count: i64,
}

pub(crate) async fn count_by_level(pool: &PgPool) -> Result<Vec<GroupCountRow>, sqlx::Error> {
    sqlx::query_as::<_, GroupCountRow>(
        "SELECT level AS key, COUNT(*) AS count
         FROM exam_tasks
         GROUP BY level
         ORDER BY level",
    )
    .fetch_all(pool)
    .await
}

pub(crate) async fn count_by_subject(pool: &PgPool) -> Result<Vec<GroupCountRow>, sqlx::Error> {
    sqlx::query_as::<_, GroupCountRow>(
        "SELECT subject AS key, COUNT(*) AS count
         FROM exam_tasks
         WHERE subject IS NOT NULL
         GROUP BY subject
         ORDER BY count DESC, subject",
    )
    .fetch_all(pool)
    .await
}
