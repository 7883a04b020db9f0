use axum::extract::{Query, State};
use axum::{routing::get, Json, Router};

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::repositories::exam_tasks;
use crate::schemas::rag::{
    ContextPreviewQuery, ContextPreviewResponse, ContextTaskPreview, CorpusStatisticsResponse,
    LevelCount, SubjectCount,
};
use crate::services::{retrieval, task_generation};

const PREVIEW_TASK_LIMIT: u32 = 5;
const PREVIEW_CHARS: usize = 150;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/statistics", get(statistics)).route("/context", get(context_preview))
}

async fn statistics(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<CorpusStatisticsResponse>, ApiError> {
    let db = state.db();
    let total_tasks = exam_tasks::count_all(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to count exam tasks"))?;
    let years = exam_tasks::list_years(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to list exam years"))?;
    let levels = exam_tasks::count_by_level(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to group exam tasks by level"))?;
    let subjects = exam_tasks::count_by_subject(db)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to group exam tasks by subject"))?;

    Ok(Json(CorpusStatisticsResponse {
        total_tasks,
        years,
        levels: levels
            .into_iter()
            .map(|row| LevelCount { level: row.key, count: row.count })
            .collect(),
        subjects: subjects
            .into_iter()
            .map(|row| SubjectCount { subject: row.key, count: row.count })
            .collect(),
    }))
}

async fn context_preview(
    CurrentUser(_user): CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<ContextPreviewQuery>,
) -> Result<Json<ContextPreviewResponse>, ApiError> {
    let search_text =
        task_generation::retrieval_query(query.subject.as_deref(), query.topic.as_deref());
    let tasks = retrieval::search(
        state.db(),
        &search_text,
        PREVIEW_TASK_LIMIT,
        query.level.as_deref(),
        query.subject.as_deref(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to retrieve exam tasks"))?;

    let context = retrieval::build_context(&tasks);
    let previews = tasks
        .into_iter()
        .map(|task| ContextTaskPreview {
            content_preview: retrieval::content_preview(&task.content, PREVIEW_CHARS),
            id: task.id,
            task_number: task.task_number,
            exam_sheet_name: task.exam_sheet_name,
            year: task.year,
            level: task.level,
            subject: task.subject,
        })
        .collect::<Vec<_>>();

    Ok(Json(ContextPreviewResponse { tasks_found: previews.len(), context, tasks: previews }))
}
