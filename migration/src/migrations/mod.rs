pub mod m202606150001_create_users;
pub mod m202606150002_create_classrooms;
pub mod m202606150003_create_exams;
pub mod m202606150004_create_questions;
pub mod m202606150005_create_question_responses;
pub mod m202606150006_create_exam_results;
pub mod m202606150007_create_materials;
pub mod m202606150008_create_answer_scripts;
