pub(crate) mod exam_tasks;
pub(crate) mod generated_tasks;
pub(crate) mod mock_exams;
pub(crate) mod reviews;
pub(crate) mod user_answers;
pub(crate) mod users;
