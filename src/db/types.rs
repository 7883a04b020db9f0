use serde::{Deserialize, Serialize};
use sqlx::Type;

/// Lifecycle of a mock exam. `Abandoned` is only ever set by the worker sweep.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "mockexamstatus", rename_all = "snake_case")]
pub(crate) enum MockExamStatus {
    InProgress,
    Completed,
    Abandoned,
}

impl MockExamStatus {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::Abandoned => "abandoned",
        }
    }
}
