pub(crate) mod answers;
pub(crate) mod errors;
pub(crate) mod generated_tasks;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod mock_exams;
pub(crate) mod rag;
pub(crate) mod reviews;
pub(crate) mod router;
pub(crate) mod tasks;
