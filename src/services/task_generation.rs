use serde_json::Value;
use thiserror::Error;

use crate::core::state::AppState;
use crate::core::time::primitive_now_utc;
use crate::repositories::generated_tasks::{self, CreateGeneratedTask};
use crate::schemas::generation::{
    GeneratedTaskEnvelope, GeneratedTaskItem, GenerationRequest, DEFAULT_POINTS,
};
use crate::services::gemini::GenerationError;
use crate::services::{grading, json_repair, prompts, retrieval};

const REFERENCE_TASK_LIMIT: u32 = 5;
const OPTION_LABELS: [char; 4] = ['A', 'B', 'C', 'D'];
const MAX_POINTS_PER_TASK: i64 = 10;

#[derive(Debug, Error)]
pub(crate) enum GenerationFailure {
    #[error(transparent)]
    Llm(#[from] GenerationError),
    #[error("the model produced no usable tasks")]
    NoTasksGenerated { raw_output: String },
    #[error("failed to load reference tasks")]
    Retrieval(#[source] sqlx::Error),
}

#[derive(Debug)]
pub(crate) struct GenerationOutcome {
    pub(crate) tasks: Vec<GeneratedTaskItem>,
    /// `None` when the generation record could not be stored.
    pub(crate) generated_task_id: Option<i64>,
}

/// Retrieval, prompt, LLM call, repair, validation and best-effort persistence.
pub(crate) async fn generate(
    state: &AppState,
    user_id: i64,
    request: &GenerationRequest,
) -> Result<GenerationOutcome, GenerationFailure> {
    let subject = request.physics_subject.as_deref();
    let query = retrieval_query(subject, request.task_topic.as_deref());

    let references = retrieval::search(
        state.db(),
        &query,
        REFERENCE_TASK_LIMIT,
        Some(request.difficulty_level.as_str()),
        subject,
    )
    .await
    .map_err(GenerationFailure::Retrieval)?;

    let context = retrieval::build_context(&references);
    let prompt = prompts::build(request, &context);

    let raw_output = match state.generator().generate(&prompt).await {
        Ok(raw) => raw,
        Err(err) => {
            metrics::counter!("task_generation_total", "outcome" => "upstream_error").increment(1);
            return Err(err.into());
        }
    };

    let limit = prompts::effective_task_count(request.task_count) as usize;
    let tasks = extract_tasks(&json_repair::repair(&raw_output), limit);

    if tasks.is_empty() {
        metrics::counter!("task_generation_total", "outcome" => "empty").increment(1);
        tracing::warn!(
            user_id,
            raw_chars = raw_output.len(),
            "Model output contained no usable tasks"
        );
        return Err(GenerationFailure::NoTasksGenerated { raw_output });
    }

    let generated_task_id = persist(state, user_id, request, &tasks).await;

    metrics::counter!("task_generation_total", "outcome" => "success").increment(1);
    tracing::info!(
        user_id,
        task_count = tasks.len(),
        references = references.len(),
        generated_task_id,
        "Generated tasks"
    );

    Ok(GenerationOutcome { tasks, generated_task_id })
}

async fn persist(
    state: &AppState,
    user_id: i64,
    request: &GenerationRequest,
    tasks: &[GeneratedTaskItem],
) -> Option<i64> {
    let envelope = GeneratedTaskEnvelope { tasks: tasks.to_vec() };
    let generated_text = match serde_json::to_string(&envelope) {
        Ok(text) => text,
        Err(err) => {
            tracing::warn!(user_id, error = %err, "Failed to serialize generated tasks");
            return None;
        }
    };

    let label = prompt_label(request);
    let created = generated_tasks::create(
        state.db(),
        CreateGeneratedTask {
            user_id,
            prompt: &label,
            generated_text: &generated_text,
            created_at: primitive_now_utc(),
        },
    )
    .await;

    match created {
        Ok(record) => Some(record.id),
        Err(err) => {
            tracing::warn!(user_id, error = %err, "Failed to store generated tasks");
            None
        }
    }
}

pub(crate) fn retrieval_query(subject: Option<&str>, topic: Option<&str>) -> String {
    format!("{} {}", subject.unwrap_or_default(), topic.unwrap_or_default()).trim().to_string()
}

/// Human-readable label stored with the generation, `"{topic} - {level} - {subject}"`.
pub(crate) fn prompt_label(request: &GenerationRequest) -> String {
    format!(
        "{} - {} - {}",
        request.task_topic.as_deref().map(str::trim).unwrap_or_default(),
        request.difficulty_level.trim(),
        request.physics_subject.as_deref().map(str::trim).unwrap_or_default()
    )
}

/// Parses repaired model output and keeps at most `limit` valid tasks.
pub(crate) fn extract_tasks(repaired: &str, limit: usize) -> Vec<GeneratedTaskItem> {
    let Ok(value) = serde_json::from_str::<Value>(repaired) else {
        return Vec::new();
    };
    let Some(items) = value.get("tasks").and_then(Value::as_array) else {
        return Vec::new();
    };

    items.iter().filter_map(normalize_item).take(limit).collect()
}

fn normalize_item(item: &Value) -> Option<GeneratedTaskItem> {
    let content = text_field(item, "content").filter(|content| !content.is_empty())?;
    let raw_correct = text_field(item, "correctAnswer").unwrap_or_default();

    let (answers, correct_answer) = match item.get("answers") {
        None | Some(Value::Null) => {
            if raw_correct.is_empty() {
                return None;
            }
            (None, raw_correct)
        }
        Some(Value::Array(options)) => {
            let options = options
                .iter()
                .map(|option| option.as_str().map(|text| text.trim().to_string()))
                .collect::<Option<Vec<_>>>()?;
            if options.len() != OPTION_LABELS.len() {
                return None;
            }
            (Some(options), option_label(&raw_correct)?)
        }
        Some(_) => return None,
    };

    let points_available = item
        .get("pointsAvailable")
        .and_then(Value::as_i64)
        .filter(|points| (1..=MAX_POINTS_PER_TASK).contains(points))
        .map(|points| points as i32)
        .unwrap_or(DEFAULT_POINTS);

    Some(GeneratedTaskItem {
        content,
        answers,
        correct_answer,
        solution: text_field(item, "solution").unwrap_or_default(),
        source: text_field(item, "source").unwrap_or_default(),
        points_available,
        topic: None,
    })
}

/// Accepts `"b"`, `" B) "` or `"B."` as option B.
fn option_label(answer: &str) -> Option<String> {
    let normalized = grading::normalize(answer);
    let mut chars = normalized.chars();
    let label = chars.next().filter(|label| OPTION_LABELS.contains(label))?;

    match chars.as_str() {
        "" | ")" | "." => Some(label.to_string()),
        _ => None,
    }
}

fn text_field(item: &Value, key: &str) -> Option<String> {
    match item.get(key)? {
        Value::String(text) => Some(text.trim().to_string()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
