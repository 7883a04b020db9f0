use axum::extract::State;
use axum::{routing::post, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::CurrentUser;
use crate::core::state::AppState;
use crate::schemas::generation::{GenerationRequest, GenerationResponse};
use crate::services::task_generation;

pub(crate) fn router() -> Router<AppState> {
    Router::new().route("/generate", post(generate_tasks))
}

async fn generate_tasks(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<GenerationRequest>,
) -> Result<Json<GenerationResponse>, ApiError> {
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let limits = state.settings().generation();
    let rate_key = format!("rl:generate:{}", user.id);
    let allowed = state
        .redis()
        .rate_limit(&rate_key, limits.rate_limit, limits.rate_window_seconds)
        .await
        .unwrap_or_else(|err| {
            tracing::warn!(error = %err, rate_limit_key = %rate_key, "Rate limit check failed");
            true
        });
    if !allowed {
        return Err(ApiError::TooManyRequests("Generation rate limit exceeded"));
    }

    let outcome = task_generation::generate(&state, user.id, &payload).await?;
    let message = outcome
        .generated_task_id
        .is_none()
        .then(|| "Tasks were generated but could not be saved".to_string());

    Ok(Json(GenerationResponse {
        success: true,
        tasks: outcome.tasks,
        message,
        generated_task_id: outcome.generated_task_id,
    }))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use tower::ServiceExt;

    use crate::test_support::{self, FakeGenerator};

    fn closed_task(n: usize) -> serde_json::Value {
        json!({
            "content": format!("Zadanie {n}: oblicz predkosc"),
            "answers": ["A) 10 m/s", "B) 20 m/s", "C) 30 m/s", "D) 40 m/s"],
            "correctAnswer": "B",
            "solution": "v = s / t",
            "source": "Matura 2022 CKE"
        })
    }

    fn fenced_reply(count: usize) -> String {
        let tasks: Vec<_> = (1..=count).map(closed_task).collect();
        format!("```json\n{}\n```", json!({ "tasks": tasks }))
    }

    #[tokio::test]
    async fn failed_save_still_returns_tasks() {
        let ctx =
            test_support::setup_test_context_with_generator(FakeGenerator::replying(fenced_reply(2)))
                .await;
        let user = test_support::insert_user(ctx.state.db(), "student").await;
        let token = test_support::bearer_token(user.id, ctx.state.settings());
        sqlx::query(
            "ALTER TABLE generated_tasks \
             ADD CONSTRAINT generated_tasks_reject_inserts CHECK (FALSE) NOT VALID",
        )
        .execute(ctx.state.db())
        .await
        .expect("block inserts");

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                Some(&token),
                Some(json!({ "difficultyLevel": "podstawowy", "taskCount": 2 })),
            ))
            .await
            .expect("generate");

        sqlx::query("ALTER TABLE generated_tasks DROP CONSTRAINT generated_tasks_reject_inserts")
            .execute(ctx.state.db())
            .await
            .expect("unblock inserts");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["tasks"].as_array().map(Vec::len), Some(2));
        assert_eq!(body["generatedTaskId"], serde_json::Value::Null);
        assert_eq!(body["message"], "Tasks were generated but could not be saved");

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM generated_tasks")
            .fetch_one(ctx.state.db())
            .await
            .expect("count");
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn generation_is_capped_and_persisted() {
        let ctx =
            test_support::setup_test_context_with_generator(FakeGenerator::replying(fenced_reply(5)))
                .await;
        let user = test_support::insert_user(ctx.state.db(), "student").await;
        test_support::insert_exam_task(
            ctx.state.db(),
            "podstawowy",
            Some("kinematyka"),
            Some(2022),
            "Pociag jedzie ze stala predkoscia.",
        )
        .await;
        let token = test_support::bearer_token(user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                Some(&token),
                Some(json!({
                    "taskTopic": "ruch jednostajny",
                    "difficultyLevel": "podstawowy",
                    "physicsSubject": "kinematyka",
                    "taskCount": 10
                })),
            ))
            .await
            .expect("generate");

        assert_eq!(response.status(), StatusCode::OK);
        let body = test_support::read_json(response).await;
        assert_eq!(body["success"], true);
        assert_eq!(body["tasks"].as_array().map(Vec::len), Some(3));
        assert_eq!(body["tasks"][0]["correctAnswer"], "B");
        assert_eq!(body["tasks"][0]["pointsAvailable"], 1);
        assert_eq!(ctx.generator.calls(), 1);

        let generated_id = body["generatedTaskId"].as_i64().expect("generated id");
        let stored = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::GET,
                &format!("/api/v1/generated-tasks/{generated_id}"),
                Some(&token),
                None,
            ))
            .await
            .expect("fetch generated");
        assert_eq!(stored.status(), StatusCode::OK);
        let stored = test_support::read_json(stored).await;
        assert_eq!(stored["prompt"], "ruch jednostajny - podstawowy - kinematyka");
        assert_eq!(stored["tasks"].as_array().map(Vec::len), Some(3));
    }

    #[tokio::test]
    async fn unusable_model_output_returns_raw_response() {
        let ctx = test_support::setup_test_context_with_generator(FakeGenerator::replying(
            "Niestety nie moge wygenerowac zadan.",
        ))
        .await;
        let user = test_support::insert_user(ctx.state.db(), "student").await;
        let token = test_support::bearer_token(user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                Some(&token),
                Some(json!({ "difficultyLevel": "rozszerzony" })),
            ))
            .await
            .expect("generate");

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let body = test_support::read_json(response).await;
        assert_eq!(body["raw_response"], "Niestety nie moge wygenerowac zadan.");

        let stored: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM generated_tasks")
            .fetch_one(ctx.state.db())
            .await
            .expect("count");
        assert_eq!(stored, 0);
    }

    #[tokio::test]
    async fn upstream_error_maps_to_bad_gateway() {
        let ctx = test_support::setup_test_context_with_generator(FakeGenerator::failing(
            503,
            "model overloaded",
        ))
        .await;
        let user = test_support::insert_user(ctx.state.db(), "student").await;
        let token = test_support::bearer_token(user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                Some(&token),
                Some(json!({ "difficultyLevel": "podstawowy" })),
            ))
            .await
            .expect("generate");

        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
        let body = test_support::read_json(response).await;
        assert!(body["detail"].as_str().unwrap_or_default().contains("503"));
    }

    #[tokio::test]
    async fn invalid_request_never_reaches_the_model() {
        let ctx = test_support::setup_test_context().await;
        let user = test_support::insert_user(ctx.state.db(), "student").await;
        let token = test_support::bearer_token(user.id, ctx.state.settings());

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                Some(&token),
                Some(json!({ "difficultyLevel": "podstawowy", "taskCount": 11 })),
            ))
            .await
            .expect("generate");
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ctx
            .app
            .clone()
            .oneshot(test_support::json_request(
                Method::POST,
                "/api/v1/tasks/generate",
                None,
                Some(json!({ "difficultyLevel": "podstawowy" })),
            ))
            .await
            .expect("generate");
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ctx.generator.calls(), 0);
    }
}
