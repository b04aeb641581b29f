use std::time::Duration;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::units::UnitSystem;

pub const DEFAULT_STORAGE_KEY: &str = "fitness-quiz-storage";

/// Runtime knobs shared by the host boundary and the CLI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct QuizConfig {
    /// Key under which the persisted snapshot is stored.
    pub storage_key: String,
    pub default_unit_system: UnitSystem,
    /// Delay after the success state before the quiz is cleared.
    pub success_reset_secs: u64,
    /// Simulated latency between the last answer and the checkout step.
    pub completion_delay_ms: u64,
    /// Simulated payment processing latency.
    pub checkout_delay_ms: u64,
}

impl Default for QuizConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            default_unit_system: UnitSystem::Imperial,
            success_reset_secs: 30,
            completion_delay_ms: 1000,
            checkout_delay_ms: 2000,
        }
    }
}

impl QuizConfig {
    /// Blank input yields the defaults.
    pub fn from_json_str(json: &str) -> Result<Self, serde_json::Error> {
        if json.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(json)
    }

    pub fn success_reset_after(&self) -> Duration {
        Duration::from_secs(self.success_reset_secs)
    }

    pub fn completion_delay(&self) -> Duration {
        Duration::from_millis(self.completion_delay_ms)
    }

    pub fn checkout_delay(&self) -> Duration {
        Duration::from_millis(self.checkout_delay_ms)
    }
}
