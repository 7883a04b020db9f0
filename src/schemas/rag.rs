use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize)]
pub(crate) struct LevelCount {
    pub(crate) level: String,
    pub(crate) count: i64,
}

#[derive(Debug, Serialize)]
pub(crate) struct SubjectCount {
    pub(crate) subject: String,
    pub(crate) count: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CorpusStatisticsResponse {
    pub(crate) total_tasks: i64,
    pub(crate) years: Vec<i32>,
    pub(crate) levels: Vec<LevelCount>,
    pub(crate) subjects: Vec<SubjectCount>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ContextPreviewQuery {
    #[serde(default)]
    pub(crate) topic: Option<String>,
    #[serde(default)]
    pub(crate) level: Option<String>,
    #[serde(default)]
    pub(crate) subject: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContextTaskPreview {
    pub(crate) id: i64,
    pub(crate) task_number: String,
    pub(crate) exam_sheet_name: String,
    pub(crate) year: Option<i32>,
    pub(crate) level: String,
    pub(crate) subject: Option<String>,
    pub(crate) content_preview: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ContextPreviewResponse {
    pub(crate) tasks_found: usize,
    pub(crate) context: String,
    pub(crate) tasks: Vec<ContextTaskPreview>,
}
