use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

use crate::core::time::{add_minutes, primitive_now_utc};
use crate::repositories;
use crate::test_support::{self, TestContext};

async fn seed_pool(ctx: &TestContext, level: &str, count: usize) {
    for n in 0..count {
        let subject = if n % 2 == 0 { "kinematyka" } else { "optyka" };
        test_support::insert_exam_task(
            ctx.state.db(),
            level,
            Some(subject),
            Some(2020 + n as i32),
            &format!("Zadanie maturalne {n}"),
        )
        .await;
    }
}

async fn start(ctx: &TestContext, token: &str, body: serde_json::Value) -> serde_json::Value {
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/mock-exams/start",
            Some(token),
            Some(body),
        ))
        .await
        .expect("start exam");

    let status = response.status();
    let body = test_support::read_json(response).await;
    assert_eq!(status, StatusCode::CREATED, "response: {body}");
    body
}

#[tokio::test]
async fn full_exam_flow_scores_and_locks_submission() {
    let ctx = test_support::setup_test_context().await;
    seed_pool(&ctx, "podstawowy", 5).await;
    let user = test_support::insert_user(ctx.state.db(), "student").await;
    let token = test_support::bearer_token(user.id, ctx.state.settings());

    let started = start(
        &ctx,
        &token,
        json!({ "level": "podstawowy", "taskCount": 5, "timeLimitMinutes": 60 }),
    )
    .await;
    assert_eq!(started["taskCount"], 5);
    assert_eq!(started["tasks"].as_array().map(Vec::len), Some(5));
    assert_eq!(started["tasks"][0]["index"], 0);
    assert_eq!(started["tasks"][0]["answers"][0], "A) Odpowiedz A");
    assert!(started["tasks"][0].get("correctAnswer").is_none());
    assert!(started["expiresAt"].as_str().unwrap_or_default().ends_with('Z'));
    let exam_id = started["examId"].as_i64().expect("exam id");

    let exam = sqlx::query_as::<_, (String, i32)>(
        "SELECT status::text, max_score FROM mock_exams WHERE id = $1",
    )
    .bind(exam_id)
    .fetch_one(ctx.state.db())
    .await
    .expect("exam row");
    assert_eq!(exam, ("in_progress".to_string(), 5));

    let submit_uri = format!("/api/v1/mock-exams/{exam_id}/submit");
    let answers = json!({ "answers": { "0": "A", "1": "a", "2": "B" } });
    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &submit_uri,
            Some(&token),
            Some(answers.clone()),
        ))
        .await
        .expect("submit exam");
    assert_eq!(response.status(), StatusCode::OK);
    let report = test_support::read_json(response).await;
    assert_eq!(report["score"], 2);
    assert_eq!(report["maxScore"], 5);
    assert_eq!(report["percentage"], 40.0);
    assert_eq!(report["taskResults"].as_array().map(Vec::len), Some(5));
    assert_eq!(report["taskResults"][2]["isCorrect"], false);
    assert_eq!(report["taskResults"][3]["userAnswer"], serde_json::Value::Null);
    assert!(report["timeElapsedSeconds"].as_i64().unwrap_or(-1) >= 0);
    let by_topic = report["topicPerformance"]["byTopic"].as_object().expect("topics");
    assert_eq!(by_topic.len(), 2);

    let stored_answers: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM mock_exam_answers WHERE mock_exam_id = $1")
            .bind(exam_id)
            .fetch_one(ctx.state.db())
            .await
            .expect("answer rows");
    assert_eq!(stored_answers, 5);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(Method::POST, &submit_uri, Some(&token), Some(answers)))
        .await
        .expect("second submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/mock-exams/mine",
            Some(&token),
            None,
        ))
        .await
        .expect("list exams");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(1));
    assert_eq!(listed[0]["status"], "completed");
    assert_eq!(listed[0]["score"], 2);
}

#[tokio::test]
async fn start_takes_what_the_pool_has() {
    let ctx = test_support::setup_test_context().await;
    seed_pool(&ctx, "rozszerzony", 3).await;
    seed_pool(&ctx, "podstawowy", 2).await;
    let user = test_support::insert_user(ctx.state.db(), "student").await;
    let token = test_support::bearer_token(user.id, ctx.state.settings());

    let started = start(&ctx, &token, json!({ "level": "rozszerzony", "taskCount": 40 })).await;
    assert_eq!(started["taskCount"], 3);
    assert_eq!(started["timeLimitMinutes"], 150);

    let started = start(
        &ctx,
        &token,
        json!({ "level": "rozszerzony", "taskCount": 10, "topics": ["optyka"] }),
    )
    .await;
    assert_eq!(started["taskCount"], 1);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/mock-exams/start",
            Some(&token),
            Some(json!({ "level": "nieznany" })),
        ))
        .await
        .expect("start exam");
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            "/api/v1/mock-exams/start",
            Some(&token),
            Some(json!({ "level": "podstawowy", "timeLimitMinutes": 10 })),
        ))
        .await
        .expect("start exam");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn other_users_cannot_submit() {
    let ctx = test_support::setup_test_context().await;
    seed_pool(&ctx, "podstawowy", 2).await;
    let owner = test_support::insert_user(ctx.state.db(), "owner").await;
    let intruder = test_support::insert_user(ctx.state.db(), "intruder").await;
    let owner_token = test_support::bearer_token(owner.id, ctx.state.settings());
    let intruder_token = test_support::bearer_token(intruder.id, ctx.state.settings());

    let started = start(&ctx, &owner_token, json!({ "level": "podstawowy" })).await;
    let exam_id = started["examId"].as_i64().expect("exam id");

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/mock-exams/{exam_id}/submit"),
            Some(&intruder_token),
            Some(json!({ "answers": {} })),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::GET,
            "/api/v1/mock-exams/mine",
            Some(&intruder_token),
            None,
        ))
        .await
        .expect("list");
    let listed = test_support::read_json(response).await;
    assert_eq!(listed.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn overdue_exams_are_abandoned_and_reject_submission() {
    let ctx = test_support::setup_test_context().await;
    seed_pool(&ctx, "podstawowy", 2).await;
    let user = test_support::insert_user(ctx.state.db(), "student").await;
    let token = test_support::bearer_token(user.id, ctx.state.settings());

    let started = start(
        &ctx,
        &token,
        json!({ "level": "podstawowy", "timeLimitMinutes": 30 }),
    )
    .await;
    let exam_id = started["examId"].as_i64().expect("exam id");

    let swept =
        repositories::mock_exams::mark_overdue_abandoned(ctx.state.db(), primitive_now_utc(), 0)
            .await
            .expect("sweep");
    assert!(swept.is_empty());

    let later = add_minutes(primitive_now_utc(), 31);
    let swept = repositories::mock_exams::mark_overdue_abandoned(ctx.state.db(), later, 0)
        .await
        .expect("sweep");
    assert_eq!(swept, vec![exam_id]);

    let response = ctx
        .app
        .clone()
        .oneshot(test_support::json_request(
            Method::POST,
            &format!("/api/v1/mock-exams/{exam_id}/submit"),
            Some(&token),
            Some(json!({ "answers": { "0": "A" } })),
        ))
        .await
        .expect("submit");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    let body = test_support::read_json(response).await;
    assert_eq!(body["detail"], "Mock exam is already abandoned");
}
