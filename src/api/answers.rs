use axum::extract::State;
use axum::{routing::get, routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::generated_tasks::{fetch_owned, parse_envelope};
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories;
use crate::repositories::user_answers::CreateUserAnswer;
use crate::schemas::answer::{AnswerStatsResponse, SubmitAnswerRequest, SubmitAnswerResponse};
use crate::services::grading;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/submit", post(submit_answer)).route("/my-stats", get(my_stats))
}

async fn submit_answer(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<Json<SubmitAnswerResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    let user_answer = payload.user_answer.trim();
    if user_answer.is_empty() {
        return Err(ApiError::BadRequest("userAnswer must not be blank".to_string()));
    }

    let record = fetch_owned(&state, payload.generated_task_id, user.id).await?;
    let envelope = parse_envelope(&record)
        .ok_or_else(|| ApiError::BadRequest("Stored tasks are unreadable".to_string()))?;
    let task = usize::try_from(payload.task_index)
        .ok()
        .and_then(|index| envelope.tasks.get(index))
        .ok_or_else(|| {
            ApiError::BadRequest(format!("Task index {} is out of range", payload.task_index))
        })?;

    let is_correct = grading::grade(user_answer, &task.correct_answer);

    repositories::user_answers::create(
        state.db(),
        CreateUserAnswer {
            user_id: user.id,
            generated_task_id: record.id,
            task_index: payload.task_index,
            task_content: &task.content,
            user_answer,
            correct_answer: &task.correct_answer,
            is_correct,
            answered_at: primitive_now_utc(),
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to store answer"))?;

    tracing::info!(
        user_id = user.id,
        generated_task_id = record.id,
        task_index = payload.task_index,
        is_correct,
        "Answer graded"
    );

    Ok(Json(SubmitAnswerResponse {
        success: true,
        is_correct,
        correct_answer: task.correct_answer.clone(),
        solution: task.solution.clone(),
        user_answer: user_answer.to_string(),
    }))
}

async fn my_stats(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<AnswerStatsResponse>, ApiError> {
    let counts = repositories::user_answers::counts_for_user(state.db(), user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load answer statistics"))?;

    Ok(Json(AnswerStatsResponse {
        total_answers: counts.total,
        correct_answers: counts.correct,
        wrong_answers: counts.total - counts.correct,
        accuracy: accuracy(counts.correct, counts.total),
    }))
}

fn accuracy(correct: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (correct as f64 * 10_000.0 / total as f64).round() / 100.0
}
