use std::fmt::Write;

use sqlx::PgPool;

use crate::db::models::ExamTask;
use crate::repositories::exam_tasks::{self, SearchParams};

pub(crate) const CONTEXT_HEADER: &str = "=== EXAMPLE TASKS FROM PAST EXAMS ===";
/// Year printed for tasks whose sheet has no year, so every entry carries `Year: dddd`.
pub(crate) const PLACEHOLDER_YEAR: i32 = 2024;

/// Returns reference tasks for a generation prompt.
///
/// `query` is accepted for callers that log it but does not influence ranking. `subject` is
/// a soft filter: when nothing matches it, the search is repeated on `level` alone.
pub(crate) async fn search(
    pool: &PgPool,
    query: &str,
    limit: u32,
    level: Option<&str>,
    subject: Option<&str>,
) -> Result<Vec<ExamTask>, sqlx::Error> {
    if limit == 0 {
        return Ok(Vec::new());
    }

    let level = non_blank(level);
    let subject = non_blank(subject);
    let params = SearchParams { level, subject, limit: i64::from(limit) };

    let tasks = exam_tasks::search(pool, params).await?;
    if !tasks.is_empty() || subject.is_none() {
        tracing::debug!(query, found = tasks.len(), "Retrieved reference tasks");
        return Ok(tasks);
    }

    let tasks = exam_tasks::search(pool, SearchParams { subject: None, ..params }).await?;
    tracing::debug!(query, found = tasks.len(), "Retrieved reference tasks without subject");
    Ok(tasks)
}

pub(crate) fn build_context(tasks: &[ExamTask]) -> String {
    let mut context = String::with_capacity(CONTEXT_HEADER.len() + 2 + tasks.len() * 512);
    context.push_str(CONTEXT_HEADER);
    context.push_str("\n\n");

    for task in tasks {
        let _ = writeln!(
            context,
            "[Source: {}, Task {}, Year: {}, Level: {}]",
            task.exam_sheet_name,
            task.task_number,
            task.year.unwrap_or(PLACEHOLDER_YEAR),
            task.level
        );
        context.push_str(&task.content);
        context.push_str("\n\n");
    }

    context
}

pub(crate) fn content_preview(content: &str, max_chars: usize) -> String {
    match content.char_indices().nth(max_chars) {
        Some((offset, _)) => format!("{}...", &content[..offset]),
        None => content.to_string(),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}
