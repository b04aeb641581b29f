use crate::answers::AnswerSet;
use crate::spec::{question::QuestionSpec, quiz::QuizSpec};

pub type VisibilityMap = std::collections::BTreeMap<String, bool>;

/// Whether a question is eligible for display given the current answers.
///
/// A question without a conditional rule is always shown. Otherwise the
/// referenced answer must exist and match one of the accepted values.
pub fn should_show(question: &QuestionSpec, answers: &AnswerSet) -> bool {
    let Some(rule) = &question.conditional_display else {
        return true;
    };
    answers
        .get(&rule.question_id)
        .is_some_and(|answer| answer.matches_any(&rule.values))
}

/// Ordered subsequence of the questions currently eligible for display.
pub fn visible_questions<'a>(spec: &'a QuizSpec, answers: &AnswerSet) -> Vec<&'a QuestionSpec> {
    spec.questions
        .iter()
        .filter(|question| should_show(question, answers))
        .collect()
}

pub fn resolve_visibility(spec: &QuizSpec, answers: &AnswerSet) -> VisibilityMap {
    spec.questions
        .iter()
        .map(|question| (question.id.clone(), should_show(question, answers)))
        .collect()
}
