pub mod question;
pub mod quiz;

pub use question::{ConditionalDisplay, QuestionOption, QuestionSpec, QuestionType, ValidationRule};
pub use quiz::{CatalogError, QuizSpec};
