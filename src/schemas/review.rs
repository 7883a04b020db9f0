use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::repositories::reviews::ReviewOrder;

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct ReviewRequest {
    #[validate(range(min = 1, max = 5, message = "Rating must be between 1 and 5"))]
    pub(crate) rating: i32,
    #[validate(length(min = 10, max = 500, message = "Comment must contain 10..500 characters"))]
    pub(crate) comment: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewResponse {
    pub(crate) id: i64,
    pub(crate) user_id: i64,
    pub(crate) username: String,
    pub(crate) rating: i32,
    pub(crate) comment: String,
    pub(crate) created_at: String,
    pub(crate) updated_at: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum ReviewSort {
    #[default]
    Recent,
    Highest,
    Lowest,
}

impl From<ReviewSort> for ReviewOrder {
    fn from(sort: ReviewSort) -> Self {
        match sort {
            ReviewSort::Recent => ReviewOrder::Recent,
            ReviewSort::Highest => ReviewOrder::Highest,
            ReviewSort::Lowest => ReviewOrder::Lowest,
        }
    }
}

const fn default_page() -> i64 {
    1
}

const fn default_page_size() -> i64 {
    10
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewListQuery {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub(crate) page: i64,
    #[serde(default = "default_page_size")]
    #[validate(range(min = 1, max = 100, message = "pageSize must be in range 1..100"))]
    pub(crate) page_size: i64,
    #[serde(default)]
    #[validate(range(min = 1, max = 5, message = "minRating must be between 1 and 5"))]
    pub(crate) min_rating: Option<i32>,
    #[serde(default)]
    pub(crate) sort_by: ReviewSort,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewListResponse {
    pub(crate) reviews: Vec<ReviewResponse>,
    pub(crate) total_count: i64,
    pub(crate) page: i64,
    pub(crate) page_size: i64,
    pub(crate) total_pages: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReviewStatsResponse {
    pub(crate) average_rating: f64,
    pub(crate) total_reviews: i64,
    /// Count per star rating; every rating 1..=5 is present.
    pub(crate) rating_distribution: BTreeMap<i32, i64>,
}
