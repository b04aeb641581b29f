use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::spec::question::QuestionSpec;

/// Problems detected in a quiz definition.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to parse quiz definition: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("duplicate question id '{0}'")]
    DuplicateId(String),
    #[error("question '{question}' depends on '{depends_on}', which is not an earlier question")]
    BadCondition {
        question: String,
        depends_on: String,
    },
    #[error("quiz '{0}' has no questions")]
    Empty(String),
}

/// Top-level quiz definition: an ordered, immutable question list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub questions: Vec<QuestionSpec>,
}

impl QuizSpec {
    /// Parses and checks a quiz definition.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let spec: QuizSpec = serde_json::from_str(json)?;
        spec.check()?;
        Ok(spec)
    }

    /// Ids must be unique and conditions may only point backwards.
    pub fn check(&self) -> Result<(), CatalogError> {
        if self.questions.is_empty() {
            return Err(CatalogError::Empty(self.id.clone()));
        }
        let mut seen = BTreeSet::new();
        for question in &self.questions {
            if let Some(rule) = &question.conditional_display
                && !seen.contains(rule.question_id.as_str())
            {
                return Err(CatalogError::BadCondition {
                    question: question.id.clone(),
                    depends_on: rule.question_id.clone(),
                });
            }
            if !seen.insert(question.id.as_str()) {
                return Err(CatalogError::DuplicateId(question.id.clone()));
            }
        }
        Ok(())
    }

    pub fn question(&self, id: &str) -> Option<&QuestionSpec> {
        self.questions.iter().find(|question| question.id == id)
    }
}
