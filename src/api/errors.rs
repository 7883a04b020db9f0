use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::gemini::GenerationError;
use crate::services::mock_exam::MockExamError;
use crate::services::task_generation::GenerationFailure;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_response: Option<String>,
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    UnprocessableEntity(String),
    /// 422 carrying the model output that could not be turned into tasks.
    NoTasksGenerated { detail: String, raw_response: String },
    TooManyRequests(&'static str),
    BadGateway(String),
    Internal(String),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::UnprocessableEntity(_) | ApiError::NoTasksGenerated { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::TooManyRequests(_) => StatusCode::TOO_MANY_REQUESTS,
            ApiError::BadGateway(_) => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let (detail, raw_response) = match self {
            ApiError::Unauthorized(message)
            | ApiError::Forbidden(message)
            | ApiError::TooManyRequests(message) => {
                (message.to_string(), None)
            }
            ApiError::NoTasksGenerated { detail, raw_response } => (detail, Some(raw_response)),
            ApiError::BadGateway(message) => {
                tracing::error!(error = %message, "Upstream failure");
                (message, None)
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                (message, None)
            }
            ApiError::BadRequest(message)
            | ApiError::NotFound(message)
            | ApiError::Conflict(message)
            | ApiError::UnprocessableEntity(message) => (message, None),
        };

        let mut response =
            (status, Json(ErrorResponse { status: status.as_u16(), detail, raw_response }))
                .into_response();
        if status == StatusCode::UNAUTHORIZED {
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

impl From<GenerationFailure> for ApiError {
    fn from(err: GenerationFailure) -> Self {
        match err {
            GenerationFailure::Llm(GenerationError::Upstream { status, body }) => {
                ApiError::BadGateway(format!("LLM service returned {status}: {body}"))
            }
            GenerationFailure::Llm(other) => {
                tracing::error!(error = %other, "LLM call failed");
                ApiError::BadGateway("LLM service is unavailable".to_string())
            }
            GenerationFailure::NoTasksGenerated { raw_output } => ApiError::NoTasksGenerated {
                detail: "The model did not return any valid tasks".to_string(),
                raw_response: raw_output,
            },
            GenerationFailure::Retrieval(err) => {
                ApiError::internal(err, "Failed to load reference tasks")
            }
        }
    }
}

impl From<MockExamError> for ApiError {
    fn from(err: MockExamError) -> Self {
        match err {
            MockExamError::ExamNotFound => ApiError::NotFound("Mock exam not found".to_string()),
            MockExamError::ExamAlreadyCompleted(status) => {
                ApiError::Conflict(format!("Mock exam is already {status}"))
            }
            MockExamError::InsufficientTaskPool { level } => ApiError::UnprocessableEntity(
                format!("No exam tasks available for level {level}"),
            ),
            MockExamError::Database(err) => ApiError::internal(err, "Mock exam storage failed"),
        }
    }
}
