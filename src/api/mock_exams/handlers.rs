use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::mock_exam::{
    MockExamReport, MockExamStartResponse, MockExamSummary, StartMockExamRequest,
    SubmitMockExamRequest,
};
use crate::services::mock_exam;

pub(super) async fn start_exam(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<StartMockExamRequest>,
) -> Result<(StatusCode, Json<MockExamStartResponse>), ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let exam = mock_exam::start(&state, user.id, &payload).await?;

    Ok((StatusCode::CREATED, Json(mock_exam::start_response(&exam))))
}

pub(super) async fn submit_exam(
    Path(exam_id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<SubmitMockExamRequest>,
) -> Result<Json<MockExamReport>, ApiError> {
    let report = mock_exam::submit(&state, user.id, exam_id, &payload.answers).await?;
    Ok(Json(report))
}

pub(super) async fn list_my_exams(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<MockExamSummary>>, ApiError> {
    Ok(Json(mock_exam::list_exams(state.db(), user.id).await?))
}
