use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) const DEFAULT_POINTS: i32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum TaskType {
    #[default]
    Closed,
    Open,
}

const fn default_task_count() -> i64 {
    1
}

/// Body of `POST /tasks/generate`. Accepts both `taskTopic`/`physicsSubject` and the
/// short `topic`/`subject` names.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationRequest {
    #[serde(default, alias = "topic")]
    pub(crate) task_topic: Option<String>,
    #[serde(default)]
    #[validate(length(min = 1, max = 50, message = "difficultyLevel is required"))]
    pub(crate) difficulty_level: String,
    #[serde(default, alias = "subject")]
    pub(crate) physics_subject: Option<String>,
    #[serde(default = "default_task_count")]
    #[validate(range(min = 1, max = 10, message = "taskCount must be in range 1..10"))]
    pub(crate) task_count: i64,
    #[serde(default)]
    pub(crate) task_type: TaskType,
}

/// One generated or assembled exam question as stored and returned to clients.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeneratedTaskItem {
    pub(crate) content: String,
    pub(crate) answers: Option<Vec<String>>,
    pub(crate) correct_answer: String,
    pub(crate) solution: String,
    pub(crate) source: String,
    pub(crate) points_available: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) topic: Option<String>,
}

/// Shape of `generated_tasks.generated_text`.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub(crate) struct GeneratedTaskEnvelope {
    pub(crate) tasks: Vec<GeneratedTaskItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GenerationResponse {
    pub(crate) success: bool,
    pub(crate) tasks: Vec<GeneratedTaskItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) message: Option<String>,
    pub(crate) generated_task_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GeneratedTaskResponse {
    pub(crate) id: i64,
    pub(crate) prompt: String,
    pub(crate) tasks: Vec<GeneratedTaskItem>,
    pub(crate) created_at: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct BulkDeleteRequest {
    #[validate(length(min = 1, max = 100, message = "ids must contain 1..100 entries"))]
    pub(crate) ids: Vec<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct BulkDeleteResponse {
    pub(crate) success: bool,
    pub(crate) message: String,
    pub(crate) deleted_count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_accepts_short_field_names() {
        let request: GenerationRequest = serde_json::from_value(serde_json::json!({
            "topic": "rzut ukosny",
            "subject": "kinematyka",
            "difficultyLevel": "podstawowy",
            "taskType": "open"
        }))
        .expect("request");

        assert_eq!(request.task_topic.as_deref(), Some("rzut ukosny"));
        assert_eq!(request.physics_subject.as_deref(), Some("kinematyka"));
        assert_eq!(request.task_count, 1);
        assert_eq!(request.task_type, TaskType::Open);
        assert!(request.validate().is_ok());
    }

    #[test]
    fn request_validation_rejects_count_and_missing_level() {
        let request: GenerationRequest =
            serde_json::from_value(serde_json::json!({ "taskCount": 11 })).expect("request");
        let message = request.validate().expect_err("invalid").to_string();

        assert!(message.contains("taskCount must be in range 1..10"));
        assert!(message.contains("difficultyLevel is required"));
    }

    #[test]
    fn item_omits_topic_when_absent() {
        let item = GeneratedTaskItem {
            content: "Oblicz".to_string(),
            answers: None,
            correct_answer: "12 m/s".to_string(),
            solution: String::new(),
            source: "Matura 2023 CKE".to_string(),
            points_available: 2,
            topic: None,
        };
        let value = serde_json::to_value(&item).expect("serialize");

        assert!(value.get("topic").is_none());
        assert_eq!(value["answers"], serde_json::Value::Null);
        assert_eq!(value["pointsAvailable"], 2);
    }
}
