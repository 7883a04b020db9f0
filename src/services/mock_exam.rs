//! Timed mock exams: assemble a random question set, score a single submission, report.
//!
//! Exam sheets are imported without an answer key, so every assembled item carries the
//! same placeholder options with `A` marked correct.

use std::collections::BTreeMap;

use rand::seq::SliceRandom;
use sqlx::PgPool;
use thiserror::Error;

use crate::core::state::AppState;
use crate::core::time::{add_minutes, elapsed_seconds, format_primitive, primitive_now_utc};
use crate::db::models::{ExamTask, MockExam};
use crate::db::types::MockExamStatus;
use crate::repositories::exam_tasks;
use crate::repositories::mock_exams::{self, CompleteMockExam, CreateMockExam, NewMockExamAnswer};
use crate::schemas::generation::{GeneratedTaskItem, DEFAULT_POINTS};
use crate::schemas::mock_exam::{
    MockExamQuestion, MockExamReport, MockExamStartResponse, MockExamSummary,
    StartMockExamRequest, TaskResult, TopicPerformance,
};
use crate::services::grading;

pub(crate) const EXAM_TYPE: &str = "matura";
pub(crate) const PLACEHOLDER_CORRECT_ANSWER: &str = "A";
pub(crate) const PLACEHOLDER_SOLUTION: &str = "Rozwiazanie dostepne w arkuszu maturalnym.";
pub(crate) const UNCATEGORIZED_TOPIC: &str = "inne";

#[derive(Debug, Error)]
pub(crate) enum MockExamError {
    #[error("mock exam not found")]
    ExamNotFound,
    #[error("mock exam is already {0}")]
    ExamAlreadyCompleted(&'static str),
    #[error("no exam tasks available for level {level}")]
    InsufficientTaskPool { level: String },
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub(crate) fn placeholder_options() -> Vec<String> {
    ["A", "B", "C", "D"].iter().map(|label| format!("{label}) Odpowiedz {label}")).collect()
}

pub(crate) fn build_exam_items(tasks: &[ExamTask]) -> Vec<GeneratedTaskItem> {
    tasks
        .iter()
        .map(|task| GeneratedTaskItem {
            content: task.content.clone(),
            answers: Some(placeholder_options()),
            correct_answer: PLACEHOLDER_CORRECT_ANSWER.to_string(),
            solution: PLACEHOLDER_SOLUTION.to_string(),
            source: match task.year {
                Some(year) => format!("{} ({year})", task.exam_sheet_name),
                None => task.exam_sheet_name.clone(),
            },
            points_available: DEFAULT_POINTS,
            topic: task.subject.clone(),
        })
        .collect()
}

pub(crate) async fn start(
    state: &AppState,
    user_id: i64,
    request: &StartMockExamRequest,
) -> Result<MockExam, MockExamError> {
    let level = request.level.trim();
    let topics: Vec<String> = request
        .topics
        .iter()
        .flatten()
        .map(|topic| topic.trim().to_string())
        .filter(|topic| !topic.is_empty())
        .collect();

    let mut pool_ids = exam_tasks::list_ids_for_exam_pool(state.db(), level, &topics).await?;
    if pool_ids.is_empty() {
        return Err(MockExamError::InsufficientTaskPool { level: level.to_string() });
    }

    pool_ids.shuffle(&mut rand::thread_rng());
    pool_ids.truncate(request.task_count.max(1) as usize);

    let selected = exam_tasks::list_by_ids(state.db(), &pool_ids).await?;
    let items = build_exam_items(&selected);
    let max_score = items.iter().map(|item| item.points_available).sum();

    let exam = mock_exams::create(
        state.db(),
        CreateMockExam {
            user_id,
            exam_type: EXAM_TYPE,
            level,
            time_limit_minutes: request.time_limit_minutes,
            started_at: primitive_now_utc(),
            tasks: &items,
            max_score,
        },
    )
    .await?;

    metrics::counter!("mock_exams_started_total").increment(1);
    tracing::info!(
        user_id,
        exam_id = exam.id,
        level,
        requested = request.task_count,
        task_count = exam.task_count,
        "Mock exam started"
    );

    Ok(exam)
}

/// Question list without correct answers or solutions.
pub(crate) fn start_response(exam: &MockExam) -> MockExamStartResponse {
    MockExamStartResponse {
        exam_id: exam.id,
        level: exam.level.clone(),
        task_count: exam.task_count,
        time_limit_minutes: exam.time_limit_minutes,
        started_at: format_primitive(exam.started_at),
        expires_at: format_primitive(add_minutes(
            exam.started_at,
            i64::from(exam.time_limit_minutes),
        )),
        tasks: exam
            .tasks_data
            .0
            .iter()
            .enumerate()
            .map(|(index, item)| MockExamQuestion {
                index,
                content: item.content.clone(),
                answers: item.answers.clone(),
            })
            .collect(),
    }
}

#[derive(Debug)]
pub(crate) struct ScoredExam {
    pub(crate) rows: Vec<NewMockExamAnswer>,
    pub(crate) results: Vec<TaskResult>,
    pub(crate) score: i32,
    /// Trimmed, non-empty answers for existing task indices.
    pub(crate) answers: BTreeMap<u32, String>,
}

pub(crate) fn score_answers(
    items: &[GeneratedTaskItem],
    submitted: &BTreeMap<u32, String>,
) -> ScoredExam {
    let mut rows = Vec::with_capacity(items.len());
    let mut results = Vec::with_capacity(items.len());
    let mut answers = BTreeMap::new();
    let mut score = 0;

    for (index, item) in items.iter().enumerate() {
        let user_answer = submitted
            .get(&(index as u32))
            .map(|answer| answer.trim().to_string())
            .filter(|answer| !answer.is_empty());
        let is_correct = user_answer
            .as_deref()
            .is_some_and(|answer| grading::grade(answer, &item.correct_answer));
        let points_earned = if is_correct { item.points_available } else { 0 };
        score += points_earned;

        if let Some(answer) = &user_answer {
            answers.insert(index as u32, answer.clone());
        }

        rows.push(NewMockExamAnswer {
            task_index: index as i32,
            task_content: item.content.clone(),
            user_answer: user_answer.clone(),
            correct_answer: item.correct_answer.clone(),
            is_correct,
            points_earned,
            max_points: item.points_available,
        });
        results.push(TaskResult {
            index,
            content: item.content.clone(),
            answers: item.answers.clone(),
            user_answer,
            correct_answer: item.correct_answer.clone(),
            is_correct,
            solution: item.solution.clone(),
            points_earned,
            max_points: item.points_available,
        });
    }

    ScoredExam { rows, results, score, answers }
}

/// `100 * score / max_score`, stored unrounded.
pub(crate) fn percentage(score: i32, max_score: i32) -> f64 {
    if max_score <= 0 {
        return 0.0;
    }
    100.0 * f64::from(score) / f64::from(max_score)
}

/// Share of points earned per topic; items without a topic are grouped under `inne`.
pub(crate) fn topic_performance(
    items: &[GeneratedTaskItem],
    results: &[TaskResult],
) -> TopicPerformance {
    let mut totals: BTreeMap<String, (i32, i32)> = BTreeMap::new();

    for (item, result) in items.iter().zip(results) {
        let topic = item
            .topic
            .as_deref()
            .map(str::trim)
            .filter(|topic| !topic.is_empty())
            .unwrap_or(UNCATEGORIZED_TOPIC);
        let entry = totals.entry(topic.to_string()).or_default();
        entry.0 += result.points_earned;
        entry.1 += result.max_points;
    }

    TopicPerformance {
        by_topic: totals
            .into_iter()
            .map(|(topic, (earned, max))| (topic, round2(percentage(earned, max))))
            .collect(),
    }
}

pub(crate) async fn submit(
    state: &AppState,
    user_id: i64,
    exam_id: i64,
    submitted: &BTreeMap<u32, String>,
) -> Result<MockExamReport, MockExamError> {
    let mut tx = state.db().begin().await?;

    let exam = mock_exams::lock_for_user(&mut tx, exam_id, user_id)
        .await?
        .ok_or(MockExamError::ExamNotFound)?;
    if exam.status != MockExamStatus::InProgress {
        return Err(MockExamError::ExamAlreadyCompleted(exam.status.as_str()));
    }

    let items = &exam.tasks_data.0;
    let scored = score_answers(items, submitted);
    let finished_at = primitive_now_utc();
    let elapsed = elapsed_seconds(exam.started_at, finished_at).min(i64::from(i32::MAX)) as i32;
    let percentage = percentage(scored.score, exam.max_score);

    mock_exams::insert_answers(&mut tx, exam.id, &scored.rows).await?;
    let completed = mock_exams::complete(
        &mut *tx,
        CompleteMockExam {
            id: exam.id,
            finished_at,
            time_elapsed_seconds: elapsed,
            user_answers: &scored.answers,
            score: scored.score,
            percentage,
        },
    )
    .await?;
    tx.commit().await?;

    metrics::counter!("mock_exams_submitted_total").increment(1);
    tracing::info!(
        user_id,
        exam_id,
        score = scored.score,
        max_score = completed.max_score,
        elapsed_seconds = elapsed,
        "Mock exam submitted"
    );

    let topic_performance = topic_performance(items, &scored.results);
    Ok(MockExamReport {
        id: completed.id,
        level: completed.level,
        task_count: completed.task_count,
        started_at: format_primitive(completed.started_at),
        finished_at: format_primitive(finished_at),
        time_elapsed_seconds: elapsed,
        score: scored.score,
        max_score: completed.max_score,
        percentage,
        task_results: scored.results,
        topic_performance,
    })
}

pub(crate) async fn list_exams(
    pool: &PgPool,
    user_id: i64,
) -> Result<Vec<MockExamSummary>, MockExamError> {
    let exams = mock_exams::list_for_user(pool, user_id).await?;

    Ok(exams
        .into_iter()
        .map(|exam| MockExamSummary {
            id: exam.id,
            level: exam.level,
            task_count: exam.task_count,
            time_limit_minutes: exam.time_limit_minutes,
            started_at: format_primitive(exam.started_at),
            finished_at: exam.finished_at.map(format_primitive),
            time_elapsed_seconds: exam.time_elapsed_seconds,
            status: exam.status,
            score: exam.score,
            percentage: exam.percentage,
        })
        .collect())
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
