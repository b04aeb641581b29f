//! Unit conversion at the input/display boundary.
//!
//! Heights and weights are always stored in centimetres and kilograms; the
//! [`UnitSystem`] only controls how they are entered and shown.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::health::round1;

const KG_PER_LB: f64 = 0.453592;
const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum UnitSystem {
    #[default]
    Imperial,
    Metric,
}

impl UnitSystem {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "imperial",
            UnitSystem::Metric => "metric",
        }
    }

    pub fn weight_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "lbs",
            UnitSystem::Metric => "kg",
        }
    }

    pub fn height_label(&self) -> &'static str {
        match self {
            UnitSystem::Imperial => "ft/in",
            UnitSystem::Metric => "cm",
        }
    }
}

impl std::str::FromStr for UnitSystem {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "imperial" => Ok(UnitSystem::Imperial),
            "metric" => Ok(UnitSystem::Metric),
            other => Err(format!("unknown unit system '{}'", other)),
        }
    }
}

/// Height split into whole feet and inches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeetInches {
    pub feet: u32,
    pub inches: u32,
}

pub fn lbs_to_kg(lbs: f64) -> f64 {
    lbs * KG_PER_LB
}

pub fn kg_to_lbs(kg: f64) -> f64 {
    kg / KG_PER_LB
}

pub fn feet_inches_to_cm(feet: f64, inches: f64) -> f64 {
    (feet * 12.0 + inches) * CM_PER_INCH
}

/// Total inches are rounded before splitting, so `inches` is always 0..=11.
pub fn cm_to_feet_inches(cm: f64) -> FeetInches {
    let total_inches = (cm / CM_PER_INCH).round().max(0.0) as u32;
    FeetInches {
        feet: total_inches / 12,
        inches: total_inches % 12,
    }
}

/// Converts a weight entered in `unit` to kilograms.
pub fn weight_to_kg(value: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Imperial => lbs_to_kg(value),
        UnitSystem::Metric => value,
    }
}

/// Imperial heights arrive as feet plus inches; metric heights use `primary` as centimetres.
pub fn height_to_cm(primary: f64, inches: f64, unit: UnitSystem) -> f64 {
    match unit {
        UnitSystem::Imperial => feet_inches_to_cm(primary, inches),
        UnitSystem::Metric => primary,
    }
}

pub fn format_weight(kg: f64, unit: UnitSystem) -> String {
    match unit {
        UnitSystem::Imperial => format!("{} lbs", kg_to_lbs(kg).round()),
        UnitSystem::Metric => format!("{} kg", round1(kg)),
    }
}

pub fn format_height(cm: f64, unit: UnitSystem) -> String {
    match unit {
        UnitSystem::Imperial => {
            let FeetInches { feet, inches } = cm_to_feet_inches(cm);
            format!("{}'{}\"", feet, inches)
        }
        UnitSystem::Metric => format!("{} cm", round1(cm)),
    }
}
