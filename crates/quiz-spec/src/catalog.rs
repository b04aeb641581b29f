use crate::spec::{CatalogError, QuizSpec};

const FITNESS_QUIZ_JSON: &str = include_str!("../catalog/fitness_quiz.json");

/// Number of questions in the built-in fitness quiz.
pub const FITNESS_QUIZ_LEN: usize = 30;

/// The built-in 30-question fitness quiz.
pub fn fitness_quiz() -> Result<QuizSpec, CatalogError> {
    QuizSpec::from_json_str(FITNESS_QUIZ_JSON)
}

/// Raw JSON of the built-in quiz, for hosts that forward it unchanged.
pub fn fitness_quiz_json() -> &'static str {
    FITNESS_QUIZ_JSON
}
