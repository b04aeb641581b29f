//! Health metrics derived from height, weight, and goal weight.
//!
//! Everything here is a pure function of its inputs. Nonsensical inputs
//! (zero height, negative weight) are rejected upstream by the range checks
//! in [`crate::validate`]; the calculator only annotates, it never fails.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::profile::Gender;

/// Safe weekly loss used for the headline timeline, in kg.
pub const SAFE_WEEKLY_LOSS_KG: f64 = 0.75;

/// Fixed program length used by the pace advisory.
///
/// Independent of `estimated_weeks`; the two can disagree.
pub const PACE_HORIZON_WEEKS: f64 = 12.0;

const HEALTHY_BMI_MIN: f64 = 18.5;
const HEALTHY_BMI_MAX: f64 = 24.9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
}

impl BmiCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "underweight",
            BmiCategory::Normal => "normal",
            BmiCategory::Overweight => "overweight",
            BmiCategory::Obese => "obese",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthWarning {
    #[serde(rename = "type")]
    pub severity: Severity,
    pub title: String,
    pub message: String,
}

impl HealthWarning {
    fn new(severity: Severity, title: &str, message: impl Into<String>) -> Self {
        Self {
            severity,
            title: title.to_string(),
            message: message.into(),
        }
    }
}

/// Weight bounds (kg) at which BMI stays within 18.5..=24.9.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct HealthyWeightRange {
    pub min: u32,
    pub max: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct HealthMetrics {
    pub bmi: f64,
    pub bmi_category: BmiCategory,
    pub healthy_weight_min: u32,
    pub healthy_weight_max: u32,
    pub weight_to_lose: f64,
    pub weekly_weight_loss: f64,
    pub estimated_weeks: u32,
    pub is_goal_realistic: bool,
    pub warnings: Vec<HealthWarning>,
}

impl HealthMetrics {
    pub fn healthy_range(&self) -> HealthyWeightRange {
        HealthyWeightRange {
            min: self.healthy_weight_min,
            max: self.healthy_weight_max,
        }
    }

    pub fn has_errors(&self) -> bool {
        self.warnings
            .iter()
            .any(|warning| warning.severity == Severity::Error)
    }

    pub fn warning(&self, title: &str) -> Option<&HealthWarning> {
        self.warnings.iter().find(|warning| warning.title == title)
    }
}

/// Inputs to [`calculate_health_metrics`]. Height in cm, weights in kg.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct MetricsInput {
    pub height_cm: f64,
    pub weight_kg: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_weight_kg: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
}

pub fn calculate_bmi(height_cm: f64, weight_kg: f64) -> f64 {
    let height_m = height_cm / 100.0;
    weight_kg / (height_m * height_m)
}

pub fn bmi_category(bmi: f64) -> BmiCategory {
    if bmi < 18.5 {
        BmiCategory::Underweight
    } else if bmi < 25.0 {
        BmiCategory::Normal
    } else if bmi < 30.0 {
        BmiCategory::Overweight
    } else {
        BmiCategory::Obese
    }
}

pub fn healthy_weight_range(height_cm: f64) -> HealthyWeightRange {
    let height_m = height_cm / 100.0;
    let squared = height_m * height_m;
    HealthyWeightRange {
        min: round_half_up(HEALTHY_BMI_MIN * squared).max(0.0) as u32,
        max: round_half_up(HEALTHY_BMI_MAX * squared).max(0.0) as u32,
    }
}

pub fn calculate_health_metrics(input: &MetricsInput) -> HealthMetrics {
    let MetricsInput {
        height_cm,
        weight_kg,
        ..
    } = *input;
    // Zero goal or age means "not given".
    let goal_weight_kg = input.goal_weight_kg.filter(|goal| *goal > 0.0);
    let age = input.age.filter(|age| *age > 0);

    let bmi = calculate_bmi(height_cm, weight_kg);
    let category = bmi_category(bmi);
    let healthy = healthy_weight_range(height_cm);
    let mut warnings = Vec::new();

    let target_weight = goal_weight_kg.unwrap_or(f64::from(healthy.max));
    let weight_to_lose = weight_kg - target_weight;
    let estimated_weeks = (weight_to_lose.abs() / SAFE_WEEKLY_LOSS_KG).ceil() as u32;

    let mut is_goal_realistic = true;

    if bmi < 16.0 {
        warnings.push(HealthWarning::new(
            Severity::Error,
            "Severely Underweight",
            "Your current BMI indicates you may be severely underweight. We strongly recommend consulting a healthcare professional before starting any fitness program.",
        ));
        is_goal_realistic = false;
    } else if bmi < 18.5 {
        warnings.push(HealthWarning::new(
            Severity::Warning,
            "Underweight Notice",
            "Your BMI suggests you may be underweight. Focus on building muscle and maintaining a healthy calorie intake.",
        ));
    }

    if bmi > 40.0 {
        warnings.push(HealthWarning::new(
            Severity::Warning,
            "Health Consideration",
            "Based on your BMI, we recommend consulting with a healthcare provider to create a safe weight loss plan tailored to your needs.",
        ));
    }

    if let Some(goal) = goal_weight_kg {
        let goal_bmi = calculate_bmi(height_cm, goal);

        if goal_bmi < 17.0 {
            warnings.push(HealthWarning::new(
                Severity::Error,
                "Goal Weight Too Low",
                format!(
                    "A goal weight of {}kg would put your BMI at {}, which is dangerously low. The minimum healthy weight for your height is {}kg.",
                    goal,
                    fixed1(goal_bmi),
                    healthy.min
                ),
            ));
            is_goal_realistic = false;
        } else if goal_bmi < 18.5 {
            warnings.push(HealthWarning::new(
                Severity::Warning,
                "Low Goal Weight Alert",
                format!(
                    "Your goal weight would result in a BMI of {}, which is below the healthy range. Consider a goal weight of at least {}kg.",
                    fixed1(goal_bmi),
                    healthy.min
                ),
            ));
        }

        let percentage_loss = (weight_kg - goal) / weight_kg * 100.0;
        if percentage_loss > 20.0 {
            warnings.push(HealthWarning::new(
                Severity::Info,
                "Ambitious Goal",
                "Losing more than 20% of body weight requires sustained commitment. Consider setting intermediate milestones.",
            ));
        }

        let required_weekly_loss = weight_to_lose.abs() / PACE_HORIZON_WEEKS;
        if required_weekly_loss > 1.0 {
            warnings.push(HealthWarning::new(
                Severity::Warning,
                "Pace Advisory",
                format!(
                    "Reaching your goal in 12 weeks would require losing {}kg/week. Safe weight loss is 0.5-1kg per week. We recommend {} weeks for sustainable results.",
                    fixed1(required_weekly_loss),
                    estimated_weeks
                ),
            ));
        }
    }

    if let Some(age) = age {
        if age < 18 {
            warnings.push(HealthWarning::new(
                Severity::Info,
                "Youth Fitness",
                "For individuals under 18, we recommend focusing on overall fitness rather than weight loss. Parental guidance is advised.",
            ));
        } else if age > 65 {
            warnings.push(HealthWarning::new(
                Severity::Info,
                "Senior Wellness",
                "For individuals over 65, we emphasize strength training and mobility alongside any weight management goals.",
            ));
        }
    }

    HealthMetrics {
        bmi: round1(bmi),
        bmi_category: category,
        healthy_weight_min: healthy.min,
        healthy_weight_max: healthy.max,
        weight_to_lose: round1(weight_to_lose),
        weekly_weight_loss: SAFE_WEEKLY_LOSS_KG,
        estimated_weeks,
        is_goal_realistic,
        warnings,
    }
}

/// Rounds .5 towards positive infinity.
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

pub(crate) fn round1(value: f64) -> f64 {
    round_half_up(value * 10.0) / 10.0
}

fn fixed1(value: f64) -> String {
    format!("{:.1}", round1(value))
}
