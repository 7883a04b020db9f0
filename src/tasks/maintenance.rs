use anyhow::{Context, Result};

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc as now_primitive;
use crate::repositories;

/// Marks in-progress mock exams as abandoned once their time limit plus the configured
/// grace period has passed.
pub(crate) async fn abandon_overdue_mock_exams(state: &AppState) -> Result<usize> {
    let grace_minutes = i32::try_from(state.settings().mock_exam().abandon_grace_minutes)
        .context("MOCK_EXAM_ABANDON_GRACE_MINUTES is out of range")?;

    let abandoned =
        repositories::mock_exams::mark_overdue_abandoned(state.db(), now_primitive(), grace_minutes)
            .await
            .context("Failed to abandon overdue mock exams")?;

    if !abandoned.is_empty() {
        tracing::info!(
            abandoned = abandoned.len(),
            exam_ids = ?abandoned,
            grace_minutes,
            "Abandoned overdue mock exams"
        );
    }
    metrics::counter!("mock_exams_abandoned_total").increment(abandoned.len() as u64);

    Ok(abandoned.len())
}
