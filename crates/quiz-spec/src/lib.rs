#![allow(missing_docs)]

pub mod answers;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod engine;
pub mod health;
pub mod profile;
pub mod render;
pub mod session;
pub mod spec;
pub mod store;
pub mod units;
pub mod validate;
pub mod visibility;

pub use answers::{AnswerSet, AnswerValue};
pub use catalog::{FITNESS_QUIZ_LEN, fitness_quiz};
pub use checkout::{
    CheckoutAccess, CheckoutError, CheckoutRequest, CheckoutSession, DemoGateway, PaymentGateway,
    Plan, QuizData, checkout_access,
};
pub use config::QuizConfig;
pub use engine::{AnswerOutcome, Direction, QuizEngine, QuizState, Transition};
pub use health::{
    BmiCategory, HealthMetrics, HealthWarning, HealthyWeightRange, MetricsInput, Severity,
    bmi_category, calculate_bmi, calculate_health_metrics, healthy_weight_range,
};
pub use profile::{Gender, ProfileField, UserProfile};
pub use render::{
    InputWidget, RenderPayload, RenderQuestion, RenderStatus, build_render_payload,
    render_json_ui, render_summary, render_text,
};
pub use session::QuizSession;
pub use spec::{CatalogError, QuestionSpec, QuestionType, QuizSpec};
pub use store::{
    JsonFileStore, MemoryStore, PersistedState, StateStore, StoreError, persisted_state_schema,
};
pub use units::UnitSystem;
pub use validate::{ValidationError, ValidationResult, validate};
pub use visibility::{VisibilityMap, resolve_visibility, should_show, visible_questions};
