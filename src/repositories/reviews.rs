use sqlx::{PgPool, Postgres, QueryBuilder};
use time::PrimitiveDateTime;

use crate::db::models::Review;

const COLUMNS: &str =
    "r.id, r.user_id, u.username, r.rating, r.comment, r.created_at, r.updated_at";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ReviewOrder {
    Recent,
    Highest,
    Lowest,
}

impl ReviewOrder {
    fn order_by(self) -> &'static str {
        match self {
            ReviewOrder::Recent => " ORDER BY r.created_at DESC, r.id DESC",
            ReviewOrder::Highest => " ORDER BY r.rating DESC, r.created_at DESC, r.id DESC",
            ReviewOrder::Lowest => " ORDER BY r.rating ASC, r.created_at DESC, r.id DESC",
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub(crate) struct ListReviews {
    pub(crate) min_rating: Option<i32>,
    pub(crate) order: ReviewOrder,
    pub(crate) offset: i64,
    pub(crate) limit: i64,
}

#[derive(Debug, sqlx::FromRow)]
pub(crate) struct RatingCount {
    pub(crate) rating: i32,
    pub(crate) count: i64,
}

/// Returns `None` when the user already has a review.
pub(crate) async fn create(
    pool: &PgPool,
    user_id: i64,
    rating: i32,
    comment: &str,
    created_at: PrimitiveDateTime,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        "WITH r AS (
             INSERT INTO reviews (user_id, rating, comment, created_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id) DO NOTHING
             RETURNING *
         )
         SELECT {COLUMNS} FROM r JOIN users u ON u.id = r.user_id"
    ))
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .bind(created_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn find_for_user(
    pool: &PgPool,
    user_id: i64,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        "SELECT {COLUMNS} FROM reviews r JOIN users u ON u.id = r.user_id WHERE r.user_id = $1"
    ))
    .bind(user_id)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn update_for_user(
    pool: &PgPool,
    user_id: i64,
    rating: i32,
    comment: &str,
    updated_at: PrimitiveDateTime,
) -> Result<Option<Review>, sqlx::Error> {
    sqlx::query_as::<_, Review>(&format!(
        "WITH r AS (
             UPDATE reviews SET rating = $2, comment = $3, updated_at = $4
             WHERE user_id = $1
             RETURNING *
         )
         SELECT {COLUMNS} FROM r JOIN users u ON u.id = r.user_id"
    ))
    .bind(user_id)
    .bind(rating)
    .bind(comment)
    .bind(updated_at)
    .fetch_optional(pool)
    .await
}

pub(crate) async fn delete_for_user(pool: &PgPool, user_id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE user_id = $1")
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_by_id(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1").bind(id).execute(pool).await?;

    Ok(result.rows_affected() > 0)
}

fn push_filters(builder: &mut QueryBuilder<'_, Postgres>, min_rating: Option<i32>) {
    builder.push(" WHERE r.is_approved");
    if let Some(min_rating) = min_rating {
        builder.push(" AND r.rating >= ");
        builder.push_bind(min_rating);
    }
}

/// One page of approved reviews plus the total matching count.
pub(crate) async fn list_approved(
    pool: &PgPool,
    params: ListReviews,
) -> Result<(Vec<Review>, i64), sqlx::Error> {
    let mut count = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM reviews r");
    push_filters(&mut count, params.min_rating);
    let total = count.build_query_scalar::<i64>().fetch_one(pool).await?;

    let mut builder = QueryBuilder::<Postgres>::new(format!(
        "SELECT {COLUMNS} FROM reviews r JOIN users u ON u.id = r.user_id"
    ));
    push_filters(&mut builder, params.min_rating);
    builder.push(params.order.order_by());
    builder.push(" LIMIT ");
    builder.push_bind(params.limit);
    builder.push(" OFFSET ");
    builder.push_bind(params.offset);

    let reviews = builder.build_query_as::<Review>().fetch_all(pool).await?;
    Ok((reviews, total))
}

pub(crate) async fn rating_counts(pool: &PgPool) -> Result<Vec<RatingCount>, sqlx::Error> {
    sqlx::query_as::<_, RatingCount>(
        "SELECT rating, COUNT(*) AS count
         FROM reviews
         WHERE is_approved
         GROUP BY rating
         ORDER BY rating DESC",
    )
    .fetch_all(pool)
    .await
}
