pub(crate) mod gemini;
pub(crate) mod grading;
pub(crate) mod json_repair;
pub(crate) mod mock_exam;
pub(crate) mod prompts;
pub(crate) mod retrieval;
pub(crate) mod task_generation;
