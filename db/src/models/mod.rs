pub mod answer_script;
pub mod classroom;
pub mod exam;
pub mod exam_result;
pub mod material;
pub mod question;
pub mod question_response;
pub mod user;

pub use answer_script::Entity as AnswerScript;
pub use classroom::Entity as Classroom;
pub use exam::Entity as Exam;
pub use exam_result::Entity as ExamResult;
pub use material::Entity as Material;
pub use question::Entity as Question;
pub use question_response::Entity as QuestionResponse;
pub use user::Entity as User;
