use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{routing::delete, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::core::time::format_primitive;
use crate::db::models::GeneratedTask;
use crate::repositories;
use crate::schemas::generation::{
    BulkDeleteRequest, BulkDeleteResponse, GeneratedTaskEnvelope, GeneratedTaskResponse,
};

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/bulk", delete(delete_generated_tasks))
        .route("/:id", get(get_generated_task).delete(delete_generated_task))
}

/// Loads a generation owned by `user_id`; other users' records are reported as missing.
pub(crate) async fn fetch_owned(
    state: &AppState,
    id: i64,
    user_id: i64,
) -> Result<GeneratedTask, ApiError> {
    repositories::generated_tasks::find_for_user(state.db(), id, user_id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch generated tasks"))?
        .ok_or_else(|| ApiError::NotFound("Generated task not found".to_string()))
}

pub(crate) fn parse_envelope(record: &GeneratedTask) -> Option<GeneratedTaskEnvelope> {
    match serde_json::from_str::<GeneratedTaskEnvelope>(&record.generated_text) {
        Ok(envelope) => Some(envelope),
        Err(err) => {
            tracing::warn!(generated_task_id = record.id, error = %err, "Stored tasks are unreadable");
            None
        }
    }
}

async fn get_generated_task(
    Path(id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<GeneratedTaskResponse>, ApiError> {
    let record = fetch_owned(&state, id, user.id).await?;
    let envelope = parse_envelope(&record)
        .ok_or_else(|| ApiError::Internal("Stored tasks are unreadable".to_string()))?;

    Ok(Json(GeneratedTaskResponse {
        id: record.id,
        prompt: record.prompt,
        tasks: envelope.tasks,
        created_at: format_primitive(record.created_at),
    }))
}

async fn delete_generated_task(
    Path(id): Path<i64>,
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = repositories::generated_tasks::delete_for_user(state.db(), id, user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete generated tasks"))?;

    if !deleted {
        return Err(ApiError::NotFound("Generated task not found".to_string()));
    }

    tracing::info!(user_id = user.id, generated_task_id = id, "Generated tasks deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_generated_tasks(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<BulkDeleteRequest>,
) -> Result<Json<BulkDeleteResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let deleted =
        repositories::generated_tasks::delete_many_for_user(state.db(), &payload.ids, user.id)
            .await
            .map_err(|e| ApiError::internal(e, "Failed to delete generated tasks"))?;

    if deleted == 0 {
        return Err(ApiError::NotFound("No generated tasks found".to_string()));
    }

    tracing::info!(user_id = user.id, deleted, "Generated tasks deleted in bulk");
    Ok(Json(BulkDeleteResponse {
        success: true,
        message: format!("Deleted {deleted} tasks"),
        deleted_count: deleted,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::core::time::primitive_now_utc;
    use crate::repositories::generated_tasks::{self, CreateGeneratedTask};
    use crate::test_support;

    async fn store(ctx: &test_support::TestContext, user_id: i64) -> i64 {
        generated_tasks::create(
            ctx.state.db(),
            CreateGeneratedTask {
                user_id,
                prompt: "optyka - podstawowy",
                generated_text: r#"{"tasks":[]}"#,
                created_at: primitive_now_utc(),
            },
        )
        .await
        .expect("generated task")
        .id
    }

    #[tokio::test]
    async fn bulk_delete_only_touches_own_generations() {
        let ctx = test_support::setup_test_context().await;
        let owner = test_support::insert_user(ctx.state.db(), "owner").await;
        let other = test_support::insert_user(ctx.state.db(), "other").await;
        let mine = [store(&ctx, owner.id).await, store(&ctx, owner.id).await];
        let theirs = store(&ctx, other.id).await;
        let token = test_support::bearer_token(owner.id, ctx.state.settings());

        let bulk = |ids: serde_json::Value| {
            test_support::json_request(
                Method::DELETE,
                "/api/v1/generated-tasks/bulk",
                Some(&token),
                Some(json!({ "ids": ids })),
            )
        };

        let response =
            ctx.app.clone().oneshot(bulk(json!([mine[0], mine[1], theirs]))).await.expect("bulk");
        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["deletedCount"], 2);
        assert_eq!(body["message"], "Deleted 2 tasks");

        let remaining: Vec<i64> = sqlx::query_scalar("SELECT id FROM generated_tasks")
            .fetch_all(ctx.state.db())
            .await
            .expect("remaining");
        assert_eq!(remaining, vec![theirs]);

        let response = ctx.app.clone().oneshot(bulk(json!([theirs]))).await.expect("bulk");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = ctx.app.clone().oneshot(bulk(json!([]))).await.expect("bulk");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
