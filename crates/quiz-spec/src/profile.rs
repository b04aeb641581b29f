use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::answers::AnswerValue;
use crate::health::MetricsInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

/// Profile fields fed by the quiz, each wired to exactly one question id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileField {
    Gender,
    Age,
    Height,
    CurrentWeight,
    GoalWeight,
    Email,
    ActivityLevel,
    FitnessGoal,
}

impl ProfileField {
    pub const ALL: [ProfileField; 8] = [
        ProfileField::Gender,
        ProfileField::Age,
        ProfileField::Height,
        ProfileField::CurrentWeight,
        ProfileField::GoalWeight,
        ProfileField::Email,
        ProfileField::ActivityLevel,
        ProfileField::FitnessGoal,
    ];

    pub fn question_id(&self) -> &'static str {
        match self {
            ProfileField::Gender => "gender",
            ProfileField::Age => "age",
            ProfileField::Height => "height",
            ProfileField::CurrentWeight => "current-weight",
            ProfileField::GoalWeight => "goal-weight",
            ProfileField::Email => "email",
            ProfileField::ActivityLevel => "activity-level",
            ProfileField::FitnessGoal => "fitness-goal",
        }
    }

    pub fn for_question(question_id: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|field| field.question_id() == question_id)
    }

    /// Fields whose change can alter the health metrics.
    pub fn affects_metrics(&self) -> bool {
        matches!(
            self,
            ProfileField::Age
                | ProfileField::Height
                | ProfileField::CurrentWeight
                | ProfileField::GoalWeight
                | ProfileField::Gender
        )
    }
}

/// Partial user profile, filled in as the matching questions are answered.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct UserProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height_cm: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fitness_goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl UserProfile {
    /// Copies an answer into the profile when the question id is wired to a field.
    ///
    /// Values of the wrong shape for the field leave it untouched.
    pub fn project(&mut self, question_id: &str, value: &AnswerValue) -> Option<ProfileField> {
        let field = ProfileField::for_question(question_id)?;
        match field {
            ProfileField::Gender => {
                if let Some(gender) = value.as_text().and_then(Gender::parse) {
                    self.gender = Some(gender);
                }
            }
            ProfileField::Age => {
                if let Some(age) = value.as_number().filter(|age| age.is_finite() && *age >= 0.0) {
                    self.age = Some(age as u32);
                }
            }
            ProfileField::Height => self.height_cm = finite(value).or(self.height_cm),
            ProfileField::CurrentWeight => self.weight_kg = finite(value).or(self.weight_kg),
            ProfileField::GoalWeight => {
                self.goal_weight_kg = finite(value).or(self.goal_weight_kg)
            }
            ProfileField::Email => self.email = text(value).or(self.email.take()),
            ProfileField::ActivityLevel => {
                self.activity_level = text(value).or(self.activity_level.take())
            }
            ProfileField::FitnessGoal => {
                self.fitness_goal = text(value).or(self.fitness_goal.take())
            }
        }
        Some(field)
    }

    /// Calculator inputs, available once both height and current weight are known.
    pub fn metrics_input(&self) -> Option<MetricsInput> {
        let height_cm = self.height_cm.filter(|height| *height > 0.0)?;
        let weight_kg = self.weight_kg.filter(|weight| *weight > 0.0)?;
        Some(MetricsInput {
            height_cm,
            weight_kg,
            goal_weight_kg: self.goal_weight_kg,
            age: self.age,
            gender: self.gender,
        })
    }
}

fn finite(value: &AnswerValue) -> Option<f64> {
    value.as_number().filter(|number| number.is_finite())
}

fn text(value: &AnswerValue) -> Option<String> {
    value.as_text().map(str::to_string)
}
