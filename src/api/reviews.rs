use std::collections::BTreeMap;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{routing::delete, routing::get, Json, Router};
use validator::Validate;

use crate::api::errors::ApiError;
use crate::api::guards::{CurrentAdmin, CurrentUser};
use crate::core::state::AppState;
use crate::core::time::{format_primitive, primitive_now_utc};
use crate::db::models::Review;
use crate::repositories::reviews::{self, ListReviews};
use crate::schemas::review::{
    ReviewListQuery, ReviewListResponse, ReviewRequest, ReviewResponse, ReviewStatsResponse,
};

const RATINGS: std::ops::RangeInclusive<i32> = 1..=5;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_reviews).post(create_review))
        .route("/my", get(get_my_review).put(update_my_review).delete(delete_my_review))
        .route("/stats", get(review_stats))
        .route("/:id", delete(delete_review))
}

fn to_response(review: Review) -> ReviewResponse {
    ReviewResponse {
        id: review.id,
        user_id: review.user_id,
        username: review.username,
        rating: review.rating,
        comment: review.comment,
        created_at: format_primitive(review.created_at),
        updated_at: review.updated_at.map(format_primitive),
    }
}

fn validated(payload: ReviewRequest) -> Result<ReviewRequest, ApiError> {
    let payload = ReviewRequest { comment: payload.comment.trim().to_string(), ..payload };
    payload.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(payload)
}

async fn create_review(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReviewRequest>,
) -> Result<(StatusCode, Json<ReviewResponse>), ApiError> {
    let payload = validated(payload)?;

    let review = reviews::create(
        state.db(),
        user.id,
        payload.rating,
        &payload.comment,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to create review"))?
    .ok_or_else(|| ApiError::Conflict("You have already submitted a review".to_string()))?;

    tracing::info!(
        user_id = user.id,
        review_id = review.id,
        rating = review.rating,
        "Review added"
    );
    Ok((StatusCode::CREATED, Json(to_response(review))))
}

async fn get_my_review(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let review = reviews::find_for_user(state.db(), user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to fetch review"))?
        .ok_or_else(|| ApiError::NotFound("You haven't submitted a review yet".to_string()))?;

    Ok(Json(to_response(review)))
}

async fn update_my_review(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
    Json(payload): Json<ReviewRequest>,
) -> Result<Json<ReviewResponse>, ApiError> {
    let payload = validated(payload)?;

    let review = reviews::update_for_user(
        state.db(),
        user.id,
        payload.rating,
        &payload.comment,
        primitive_now_utc(),
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to update review"))?
    .ok_or_else(|| ApiError::NotFound("Review not found".to_string()))?;

    tracing::info!(user_id = user.id, rating = review.rating, "Review updated");
    Ok(Json(to_response(review)))
}

async fn delete_my_review(
    CurrentUser(user): CurrentUser,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = reviews::delete_for_user(state.db(), user.id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete review"))?;
    if !deleted {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    tracing::info!(user_id = user.id, "Review deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn list_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewListQuery>,
) -> Result<Json<ReviewListResponse>, ApiError> {
    query.validate().map_err(|e| ApiError::BadRequest(e.to_string()))?;

    let (page, total_count) = reviews::list_approved(
        state.db(),
        ListReviews {
            min_rating: query.min_rating,
            order: query.sort_by.into(),
            offset: (query.page - 1).saturating_mul(query.page_size),
            limit: query.page_size,
        },
    )
    .await
    .map_err(|e| ApiError::internal(e, "Failed to list reviews"))?;

    Ok(Json(ReviewListResponse {
        reviews: page.into_iter().map(to_response).collect(),
        total_count,
        page: query.page,
        page_size: query.page_size,
        total_pages: (total_count + query.page_size - 1) / query.page_size,
    }))
}

async fn review_stats(
    State(state): State<AppState>,
) -> Result<Json<ReviewStatsResponse>, ApiError> {
    let counts = reviews::rating_counts(state.db())
        .await
        .map_err(|e| ApiError::internal(e, "Failed to load review statistics"))?;

    let mut distribution: BTreeMap<i32, i64> = RATINGS.map(|rating| (rating, 0)).collect();
    for row in counts {
        distribution.insert(row.rating, row.count);
    }
    let total_reviews: i64 = distribution.values().sum();
    let stars: i64 = distribution.iter().map(|(rating, count)| i64::from(*rating) * count).sum();

    Ok(Json(ReviewStatsResponse {
        average_rating: average_rating(stars, total_reviews),
        total_reviews,
        rating_distribution: distribution,
    }))
}

async fn delete_review(
    Path(id): Path<i64>,
    CurrentAdmin(admin): CurrentAdmin,
    State(state): State<AppState>,
) -> Result<StatusCode, ApiError> {
    let deleted = reviews::delete_by_id(state.db(), id)
        .await
        .map_err(|e| ApiError::internal(e, "Failed to delete review"))?;
    if !deleted {
        return Err(ApiError::NotFound("Review not found".to_string()));
    }

    tracing::info!(admin_id = admin.id, review_id = id, "Review removed by admin");
    Ok(StatusCode::NO_CONTENT)
}

fn average_rating(stars: i64, total: i64) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (stars as f64 * 100.0 / total as f64).round() / 100.0
}
