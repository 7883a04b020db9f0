mod handlers;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/start", post(handlers::start_exam))
        .route("/:exam_id/submit", post(handlers::submit_exam))
        .route("/mine", get(handlers::list_my_exams))
}

#[cfg(test)]
mod tests;
