use regex::Regex;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::{AnswerSet, AnswerValue};
use crate::health::{Severity, healthy_weight_range};
use crate::profile::UserProfile;
use crate::spec::{question::QuestionSpec, question::QuestionType, quiz::QuizSpec};
use crate::units::{UnitSystem, format_weight};
use crate::visibility::should_show;

pub const MIN_WEIGHT_KG: f64 = 30.0;
pub const MAX_WEIGHT_KG: f64 = 300.0;
pub const MIN_HEIGHT_CM: f64 = 100.0;
pub const MAX_HEIGHT_CM: f64 = 250.0;
pub const MIN_AGE: f64 = 13.0;
pub const MAX_AGE: f64 = 100.0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationError {
    pub question_id: String,
    pub message: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
    pub missing_required: Vec<String>,
    pub unknown_fields: Vec<String>,
}

/// Non-blocking hint shown next to an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InlineAdvisory {
    pub severity: Severity,
    pub message: String,
}

/// Gate for the "next" action on the active question.
///
/// A filled value must also pass [`check_value`], which covers answers loaded
/// from a saved snapshot rather than entered through [`crate::QuizEngine::answer`].
pub fn is_answer_valid(question: &QuestionSpec, value: Option<&AnswerValue>) -> bool {
    match value {
        Some(value) if value.is_filled() => check_value(question, value).is_none(),
        _ => !question.required,
    }
}

pub fn check_weight(weight_kg: f64) -> Result<(), &'static str> {
    if weight_kg < MIN_WEIGHT_KG {
        return Err("Weight seems too low. Please check your input.");
    }
    if weight_kg > MAX_WEIGHT_KG {
        return Err("Weight seems unusually high. Please verify.");
    }
    Ok(())
}

pub fn check_height(height_cm: f64) -> Result<(), &'static str> {
    if height_cm < MIN_HEIGHT_CM {
        return Err("Height seems too low. Please check your input.");
    }
    if height_cm > MAX_HEIGHT_CM {
        return Err("Height seems unusually high. Please verify.");
    }
    Ok(())
}

pub fn check_age(age: f64) -> Result<(), &'static str> {
    if age < MIN_AGE {
        return Err("You must be at least 13 years old to use this program.");
    }
    if age > MAX_AGE {
        return Err("Please enter a valid age.");
    }
    Ok(())
}

/// Inline check of a single entered value. `None` means the value is acceptable.
pub fn check_value(question: &QuestionSpec, value: &AnswerValue) -> Option<ValidationError> {
    if !matches_type(question.kind, value) {
        return Some(base_error(question, "Please enter a valid value", "type_mismatch"));
    }

    match question.kind {
        QuestionType::Weight => {
            if let Some(weight) = value.as_number()
                && let Err(message) = check_weight(weight)
            {
                return Some(base_error(question, message, "weight_range"));
            }
        }
        QuestionType::Height => {
            if let Some(height) = value.as_number()
                && let Err(message) = check_height(height)
            {
                return Some(base_error(question, message, "height_range"));
            }
        }
        QuestionType::SingleChoice | QuestionType::ImageChoice => {
            if let Some(text) = value.as_text()
                && question.option(text).is_none()
            {
                return Some(base_error(question, "Please pick one of the options", "invalid_option"));
            }
        }
        QuestionType::MultipleChoice => {
            if let Some(values) = value.as_list()
                && values.iter().any(|text| question.option(text).is_none())
            {
                return Some(base_error(question, "Please pick from the listed options", "invalid_option"));
            }
        }
        QuestionType::Slider => {
            if let Some(number) = value.as_number()
                && (question.min.is_some_and(|min| number < min)
                    || question.max.is_some_and(|max| number > max))
            {
                return Some(base_error(question, "Value is outside the slider range", "slider_range"));
            }
        }
        QuestionType::Number => {
            if let Some(number) = value.as_number()
                && number.fract() != 0.0
            {
                return Some(base_error(question, "Please enter a whole number", "not_whole_number"));
            }
        }
        QuestionType::Email => {}
    }

    if let Some(rule) = &question.validation {
        let message = rule
            .message
            .clone()
            .unwrap_or_else(|| "Please enter a valid value".to_string());

        if let Some(number) = value.as_number()
            && (rule.min.is_some_and(|min| number < min) || rule.max.is_some_and(|max| number > max))
        {
            return Some(ValidationError {
                question_id: question.id.clone(),
                message,
                code: "out_of_range".into(),
            });
        }

        if let Some(pattern) = &rule.pattern
            && let Some(text) = value.as_text()
            && let Ok(regex) = Regex::new(pattern)
            && !regex.is_match(text)
        {
            return Some(ValidationError {
                question_id: question.id.clone(),
                message,
                code: "pattern_mismatch".into(),
            });
        }
    }

    None
}

/// Hints for a goal weight relative to the healthy range and current weight.
pub fn goal_weight_advisories(
    goal_kg: f64,
    profile: &UserProfile,
    unit: UnitSystem,
) -> Vec<InlineAdvisory> {
    let mut advisories = Vec::new();

    if let Some(height_cm) = profile.height_cm {
        let healthy = healthy_weight_range(height_cm);
        if goal_kg < f64::from(healthy.min) {
            advisories.push(InlineAdvisory {
                severity: Severity::Error,
                message: format!(
                    "Goal weight is below healthy range. Minimum recommended: {}",
                    format_weight(f64::from(healthy.min), unit)
                ),
            });
            return advisories;
        }
    }

    if let Some(current) = profile.weight_kg
        && goal_kg > current
    {
        advisories.push(InlineAdvisory {
            severity: Severity::Info,
            message: "Your goal weight is higher than your current weight. Is muscle building your goal?"
                .to_string(),
        });
    }

    advisories
}

/// Checks a complete answer set against the visible questions of `spec`.
pub fn validate(spec: &QuizSpec, answers: &AnswerSet) -> ValidationResult {
    let mut errors = Vec::new();
    let mut missing_required = Vec::new();

    for question in spec
        .questions
        .iter()
        .filter(|question| should_show(question, answers))
    {
        match answers.get(&question.id) {
            Some(value) if value.is_filled() => {
                if let Some(error) = check_value(question, value) {
                    errors.push(error);
                }
            }
            _ => {
                if question.required {
                    missing_required.push(question.id.clone());
                }
            }
        }
    }

    let unknown_fields: Vec<String> = answers
        .iter()
        .map(|(key, _)| key)
        .filter(|key| spec.question(key).is_none())
        .cloned()
        .collect();

    ValidationResult {
        valid: errors.is_empty() && missing_required.is_empty() && unknown_fields.is_empty(),
        errors,
        missing_required,
        unknown_fields,
    }
}

fn matches_type(kind: QuestionType, value: &AnswerValue) -> bool {
    match kind {
        QuestionType::MultipleChoice => matches!(value, AnswerValue::List(_)),
        QuestionType::SingleChoice | QuestionType::ImageChoice | QuestionType::Email => {
            matches!(value, AnswerValue::Text(_))
        }
        QuestionType::Number | QuestionType::Height | QuestionType::Weight | QuestionType::Slider => {
            matches!(value, AnswerValue::Number(_))
        }
    }
}

fn base_error(question: &QuestionSpec, message: &str, code: &str) -> ValidationError {
    ValidationError {
        question_id: question.id.clone(),
        message: message.into(),
        code: code.into(),
    }
}
