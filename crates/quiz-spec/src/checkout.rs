//! Subscription plans and the payment collaborator seam.
//!
//! Session creation is a black box behind [`PaymentGateway`]. The bundled
//! [`DemoGateway`] only validates the request and points at the success step.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::engine::QuizEngine;
use crate::health::HealthMetrics;
use crate::profile::UserProfile;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Plan {
    Monthly,
    #[default]
    Quarterly,
    Annual,
}

impl Plan {
    pub const ALL: [Plan; 3] = [Plan::Monthly, Plan::Quarterly, Plan::Annual];

    pub fn id(&self) -> &'static str {
        match self {
            Plan::Monthly => "monthly",
            Plan::Quarterly => "quarterly",
            Plan::Annual => "annual",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Plan::Monthly => "Monthly",
            Plan::Quarterly => "3 Months",
            Plan::Annual => "12 Months",
        }
    }

    /// Price per month, in dollars.
    pub fn monthly_price(&self) -> f64 {
        match self {
            Plan::Monthly => 29.99,
            Plan::Quarterly => 19.99,
            Plan::Annual => 12.49,
        }
    }

    /// Amount billed up front for multi-month plans.
    pub fn total_price(&self) -> Option<f64> {
        match self {
            Plan::Monthly => None,
            Plan::Quarterly => Some(59.97),
            Plan::Annual => Some(149.88),
        }
    }

    pub fn savings(&self) -> Option<&'static str> {
        match self {
            Plan::Monthly => None,
            Plan::Quarterly => Some("33%"),
            Plan::Annual => Some("58%"),
        }
    }

    pub fn is_popular(&self) -> bool {
        matches!(self, Plan::Quarterly)
    }

    pub fn features(&self) -> &'static [&'static str] {
        match self {
            Plan::Monthly => &[
                "Personalized workout plan",
                "Custom meal planning",
                "Progress tracking",
                "Exercise library",
            ],
            Plan::Quarterly => &[
                "Everything in Monthly",
                "1-on-1 coaching call",
                "Recipe database access",
                "Community support",
                "Weekly check-ins",
            ],
            Plan::Annual => &[
                "Everything in Quarterly",
                "Monthly coaching calls",
                "Priority support",
                "Exclusive content",
                "Lifetime updates",
                "Bonus workout packs",
            ],
        }
    }

    pub fn price_id(&self) -> &'static str {
        match self {
            Plan::Monthly => "price_monthly_example",
            Plan::Quarterly => "price_quarterly_example",
            Plan::Annual => "price_annual_example",
        }
    }
}

impl std::str::FromStr for Plan {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Plan::ALL
            .into_iter()
            .find(|plan| plan.id() == raw.trim().to_ascii_lowercase())
            .ok_or_else(|| format!("unknown plan '{}'", raw))
    }
}

/// Profile and metrics forwarded to the payment collaborator for personalisation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuizData {
    pub user_profile: UserProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub health_metrics: Option<HealthMetrics>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan: Option<Plan>,
    #[serde(default)]
    pub email: Option<String>,
    pub quiz_data: QuizData,
}

impl CheckoutRequest {
    pub fn from_engine(engine: &QuizEngine, plan: Plan) -> Self {
        Self {
            plan: Some(plan),
            email: engine.profile().email.clone(),
            quiz_data: QuizData {
                user_profile: engine.profile().clone(),
                health_metrics: engine.metrics().cloned(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CheckoutSession {
    pub session_url: String,
    pub message: String,
    pub plan: Plan,
    pub email: String,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Missing required fields")]
    MissingFields,
    #[error("Failed to create checkout session: {0}")]
    Gateway(String),
}

/// Creates payment sessions; implementations redirect or report an error.
pub trait PaymentGateway {
    fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, CheckoutError>;
}

/// Gateway used until a real payment provider is wired in.
#[derive(Debug, Clone, Default)]
pub struct DemoGateway;

impl PaymentGateway for DemoGateway {
    fn create_session(&self, request: &CheckoutRequest) -> Result<CheckoutSession, CheckoutError> {
        let plan = request.plan;
        let email = request
            .email
            .as_deref()
            .map(str::trim)
            .filter(|email| !email.is_empty());
        let (Some(plan), Some(email)) = (plan, email) else {
            warn!("checkout request missing plan or email");
            return Err(CheckoutError::MissingFields);
        };
        info!(plan = plan.id(), price_id = plan.price_id(), "demo checkout session created");
        Ok(CheckoutSession {
            session_url: "/success".to_string(),
            message: "Demo mode - Stripe integration ready".to_string(),
            plan,
            email: email.to_string(),
        })
    }
}

/// Outcome of the checkout page's prerequisite check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutAccess {
    Allowed,
    /// The quiz was not finished and no email is known; send the user back to the start.
    RedirectToStart,
}

pub fn checkout_access(engine: &QuizEngine) -> CheckoutAccess {
    if engine.is_completed() || engine.profile().email.is_some() {
        CheckoutAccess::Allowed
    } else {
        CheckoutAccess::RedirectToStart
    }
}
