use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A single answer value: a number, a text, or a list of selected values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum AnswerValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl AnswerValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AnswerValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            AnswerValue::List(values) => Some(values),
            _ => None,
        }
    }

    /// Whether the value counts as filled in for a required question.
    pub fn is_filled(&self) -> bool {
        match self {
            AnswerValue::List(values) => !values.is_empty(),
            AnswerValue::Text(value) => !value.trim().is_empty(),
            AnswerValue::Number(value) => !value.is_nan(),
        }
    }

    /// Lists match when any element is accepted; scalars match on their string form.
    pub fn matches_any(&self, accepted: &[String]) -> bool {
        match self {
            AnswerValue::List(values) => values.iter().any(|value| accepted.contains(value)),
            scalar => {
                let text = scalar.display_string();
                accepted.iter().any(|candidate| *candidate == text)
            }
        }
    }

    pub fn display_string(&self) -> String {
        match self {
            AnswerValue::Number(value) => value.to_string(),
            AnswerValue::Text(value) => value.clone(),
            AnswerValue::List(values) => values.join(", "),
        }
    }
}

impl From<f64> for AnswerValue {
    fn from(value: f64) -> Self {
        AnswerValue::Number(value)
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        AnswerValue::Text(value.to_string())
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        AnswerValue::Text(value)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(values: Vec<String>) -> Self {
        AnswerValue::List(values)
    }
}

impl From<&[&str]> for AnswerValue {
    fn from(values: &[&str]) -> Self {
        AnswerValue::List(values.iter().map(|value| value.to_string()).collect())
    }
}

/// Answers keyed by question id. Later writes replace earlier ones.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct AnswerSet {
    values: BTreeMap<String, AnswerValue>,
}

impl AnswerSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    pub fn insert(&mut self, question_id: impl Into<String>, value: AnswerValue) {
        self.values.insert(question_id.into(), value);
    }

    pub fn contains(&self, question_id: &str) -> bool {
        self.values.contains_key(question_id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &AnswerValue)> {
        self.values.iter()
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerSet {
    fn from_iter<T: IntoIterator<Item = (String, AnswerValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}
