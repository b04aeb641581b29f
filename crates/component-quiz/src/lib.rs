use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use thiserror::Error;
use tracing::debug;

use quiz_spec::{
    AnswerSet, AnswerValue, CatalogError, CheckoutAccess, CheckoutError, CheckoutRequest,
    DemoGateway, PaymentGateway, PersistedState, Plan, QuizConfig, QuizEngine, QuizSpec,
    RenderPayload, UnitSystem, build_render_payload, checkout_access, fitness_quiz,
    render_json_ui as quiz_render_json_ui, render_text as quiz_render_text, validate,
};

#[derive(Debug, Error)]
enum ComponentError {
    #[error("failed to parse config/{0}")]
    ConfigParse(#[source] serde_json::Error),
    #[error("failed to parse state/{0}")]
    StateParse(#[source] serde_json::Error),
    #[error("failed to parse value/{0}")]
    ValueParse(#[source] serde_json::Error),
    #[error("invalid quiz definition: {0}")]
    Catalog(#[from] CatalogError),
    #[error("quiz '{0}' is not available")]
    QuizUnavailable(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("json encode error: {0}")]
    JsonEncode(#[source] serde_json::Error),
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Host configuration. An absent `quiz_spec_json` selects the built-in fitness quiz.
#[derive(Debug, Deserialize, Serialize, Default)]
struct ComponentConfig {
    #[serde(default)]
    quiz_spec_json: Option<String>,
    #[serde(flatten)]
    quiz: QuizConfig,
}

fn parse_config(config_json: &str) -> Result<ComponentConfig, ComponentError> {
    if config_json.trim().is_empty() {
        return Ok(ComponentConfig::default());
    }
    serde_json::from_str(config_json).map_err(ComponentError::ConfigParse)
}

fn load_quiz_spec(config: &ComponentConfig) -> Result<QuizSpec, ComponentError> {
    match config.quiz_spec_json.as_deref() {
        Some(json) => Ok(QuizSpec::from_json_str(json)?),
        None => Ok(fitness_quiz()?),
    }
}

fn ensure_quiz(quiz_id: &str, config: &ComponentConfig) -> Result<QuizSpec, ComponentError> {
    let spec = load_quiz_spec(config)?;
    if spec.id != quiz_id {
        Err(ComponentError::QuizUnavailable(quiz_id.to_string()))
    } else {
        Ok(spec)
    }
}

/// Rebuilds the engine from the host-held snapshot. Blank state starts a new quiz.
fn load_engine(
    quiz_id: &str,
    config_json: &str,
    state_json: &str,
) -> Result<QuizEngine, ComponentError> {
    let config = parse_config(config_json)?;
    let spec = ensure_quiz(quiz_id, &config)?;
    if state_json.trim().is_empty() {
        return Ok(QuizEngine::with_unit_system(
            spec,
            config.quiz.default_unit_system,
        ));
    }
    let snapshot: PersistedState =
        serde_json::from_str(state_json).map_err(ComponentError::StateParse)?;
    Ok(QuizEngine::restore(spec, snapshot))
}

fn encode<T: Serialize>(value: &T) -> Result<Value, ComponentError> {
    serde_json::to_value(value).map_err(ComponentError::JsonEncode)
}

/// Snapshot plus the next frame; every mutating call answers with this.
fn frame(engine: &QuizEngine) -> Result<Value, ComponentError> {
    Ok(json!({
        "state": encode(&engine.snapshot())?,
        "view": quiz_render_json_ui(&build_render_payload(engine)),
    }))
}

fn with_field(mut base: Value, key: &str, value: Value) -> Value {
    if let Some(map) = base.as_object_mut() {
        map.insert(key.to_string(), value);
    }
    base
}

fn respond(result: Result<Value, ComponentError>) -> String {
    match result {
        Ok(value) => serde_json::to_string(&value).unwrap_or_else(|error| {
            json!({"error": format!("json encode: {}", error)}).to_string()
        }),
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

fn respond_string(result: Result<String, ComponentError>) -> String {
    match result {
        Ok(value) => value,
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

pub fn describe(quiz_id: &str, config_json: &str) -> String {
    respond(
        parse_config(config_json)
            .and_then(|config| ensure_quiz(quiz_id, &config))
            .and_then(|spec| encode(&spec)),
    )
}

pub fn view(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond(load_engine(quiz_id, config_json, state_json).and_then(|engine| frame(&engine)))
}

pub fn submit_answer(
    quiz_id: &str,
    config_json: &str,
    state_json: &str,
    question_id: &str,
    value_json: &str,
) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|mut engine| {
            let value: AnswerValue =
                serde_json::from_str(value_json).map_err(ComponentError::ValueParse)?;
            let outcome = engine.answer(question_id, value);
            debug!(question_id, recorded = outcome.recorded, "answer submitted");
            Ok(with_field(frame(&engine)?, "outcome", encode(&outcome)?))
        }),
    )
}

pub fn advance(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|mut engine| {
            let transition = engine.advance();
            Ok(with_field(frame(&engine)?, "transition", encode(&transition)?))
        }),
    )
}

pub fn retreat(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|mut engine| {
            let transition = engine.retreat();
            Ok(with_field(frame(&engine)?, "transition", encode(&transition)?))
        }),
    )
}

pub fn set_unit_system(quiz_id: &str, config_json: &str, state_json: &str, unit: &str) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|mut engine| {
            let unit: UnitSystem = unit.parse().map_err(ComponentError::InvalidArgument)?;
            engine.set_unit_system(unit);
            frame(&engine)
        }),
    )
}

pub fn metrics(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|engine| {
            Ok(json!({
                "user_profile": encode(engine.profile())?,
                "health_metrics": encode(&engine.metrics())?,
            }))
        }),
    )
}

pub fn validate_answers(quiz_id: &str, config_json: &str, answers_json: &str) -> String {
    respond(
        parse_config(config_json)
            .and_then(|config| ensure_quiz(quiz_id, &config))
            .and_then(|spec| {
                let answers: AnswerSet =
                    serde_json::from_str(answers_json).map_err(ComponentError::ValueParse)?;
                encode(&validate(&spec, &answers))
            }),
    )
}

fn render_payload(
    quiz_id: &str,
    config_json: &str,
    state_json: &str,
) -> Result<RenderPayload, ComponentError> {
    let engine = load_engine(quiz_id, config_json, state_json)?;
    Ok(build_render_payload(&engine))
}

pub fn render_text(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond_string(
        render_payload(quiz_id, config_json, state_json).map(|payload| quiz_render_text(&payload)),
    )
}

pub fn render_json_ui(quiz_id: &str, config_json: &str, state_json: &str) -> String {
    respond(
        render_payload(quiz_id, config_json, state_json)
            .map(|payload| quiz_render_json_ui(&payload)),
    )
}

/// Creates a demo checkout session for the chosen plan.
///
/// Without an email on file the host is told to send the user back to the
/// first question instead of receiving an error.
pub fn checkout(quiz_id: &str, config_json: &str, state_json: &str, plan: &str) -> String {
    respond(
        load_engine(quiz_id, config_json, state_json).and_then(|engine| {
            if checkout_access(&engine) == CheckoutAccess::RedirectToStart {
                return Ok(json!({ "access": encode(&CheckoutAccess::RedirectToStart)? }));
            }
            let plan: Plan = if plan.trim().is_empty() {
                Plan::default()
            } else {
                plan.parse().map_err(ComponentError::InvalidArgument)?
            };
            let request = CheckoutRequest::from_engine(&engine, plan);
            let session = DemoGateway.create_session(&request)?;
            Ok(json!({
                "access": encode(&CheckoutAccess::Allowed)?,
                "session": encode(&session)?,
            }))
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const QUIZ: &str = "fitness-quiz";

    fn parse(raw: &str) -> Value {
        serde_json::from_str(raw).expect("json")
    }

    #[test]
    fn describe_returns_spec_json() {
        let spec = parse(&describe(QUIZ, ""));
        assert_eq!(spec["id"], QUIZ);
        assert_eq!(spec["questions"].as_array().map(Vec::len), Some(30));
    }

    #[test]
    fn unknown_quiz_is_an_error() {
        let response = parse(&describe("other-quiz", ""));
        assert_eq!(response["error"], "quiz 'other-quiz' is not available");
    }

    #[test]
    fn view_starts_a_fresh_quiz() {
        let response = parse(&view(QUIZ, "", ""));
        assert_eq!(response["state"]["current_step"], 0);
        assert_eq!(response["state"]["unit_system"], "imperial");
        assert_eq!(response["view"]["progress"]["total"], 29);
        assert_eq!(response["view"]["question"]["id"], "fitness-goal");
    }

    #[test]
    fn config_selects_default_units() {
        let config = json!({ "default_unit_system": "metric" }).to_string();
        let response = parse(&view(QUIZ, &config, ""));
        assert_eq!(response["state"]["unit_system"], "metric");
    }

    #[test]
    fn submit_then_advance_threads_state() {
        let submitted = parse(&submit_answer(QUIZ, "", "", "fitness-goal", r#""lose-weight""#));
        assert_eq!(submitted["outcome"]["recorded"], true);
        assert_eq!(submitted["view"]["valid"], true);
        assert_eq!(
            submitted["state"]["user_profile"]["fitness_goal"],
            "lose-weight"
        );

        let state = submitted["state"].to_string();
        let advanced = parse(&advance(QUIZ, "", &state));
        assert_eq!(advanced["transition"]["transition"], "moved");
        assert_eq!(advanced["transition"]["step"], 1);
        assert_eq!(advanced["state"]["current_step"], 1);
        assert_eq!(advanced["view"]["question"]["id"], "target-body");
    }

    #[test]
    fn advance_without_answer_is_blocked() {
        let response = parse(&advance(QUIZ, "", ""));
        assert_eq!(response["transition"]["transition"], "blocked");
        assert_eq!(response["state"]["current_step"], 0);
    }

    #[test]
    fn retreat_on_first_step_raises_exit_intent() {
        let response = parse(&retreat(QUIZ, "", ""));
        assert_eq!(response["transition"]["transition"], "exit_intent");
        assert_eq!(response["view"]["show_exit_intent"], true);
    }

    #[test]
    fn metrics_follow_height_and_weight() {
        let state = json!({
            "answers": { "height": 178.0, "current-weight": 90.0, "goal-weight": 75.0 },
            "user_profile": { "height_cm": 178.0, "weight_kg": 90.0, "goal_weight_kg": 75.0 },
            "unit_system": "metric",
            "current_step": 9
        })
        .to_string();
        let response = parse(&metrics(QUIZ, "", &state));
        assert_eq!(response["health_metrics"]["bmi"], 28.4);
        assert_eq!(response["health_metrics"]["bmi_category"], "overweight");
        assert_eq!(response["health_metrics"]["estimated_weeks"], 20);

        let empty = parse(&metrics(QUIZ, "", ""));
        assert!(empty["health_metrics"].is_null());
    }

    #[test]
    fn unit_switch_rejects_unknown_systems() {
        let response = parse(&set_unit_system(QUIZ, "", "", "metric"));
        assert_eq!(response["state"]["unit_system"], "metric");

        let response = parse(&set_unit_system(QUIZ, "", "", "cubits"));
        assert_eq!(response["error"], "unknown unit system 'cubits'");
    }

    #[test]
    fn validate_answers_reports_missing_questions() {
        let answers = json!({ "fitness-goal": "lose-weight", "shoe-size": 42 });
        let result = parse(&validate_answers(QUIZ, "", &answers.to_string()));
        assert_eq!(result["valid"], false);
        assert_eq!(result["unknown_fields"][0], "shoe-size");
        assert_eq!(result["missing_required"][0], "target-body");
    }

    #[test]
    fn malformed_state_is_reported() {
        let response = parse(&view(QUIZ, "", "{ nope"));
        assert!(
            response["error"]
                .as_str()
                .is_some_and(|message| message.starts_with("failed to parse state/"))
        );
    }

    #[test]
    fn render_text_outputs_question() {
        let output = render_text(QUIZ, "", "");
        assert!(output.starts_with("Question 1 of 29"));
    }

    #[test]
    fn render_json_ui_outputs_json_payload() {
        let payload = parse(&render_json_ui(QUIZ, "", ""));
        assert_eq!(payload["quiz_id"], QUIZ);
        assert_eq!(payload["progress"]["percent"], 3);
    }

    #[test]
    fn custom_quiz_definition_is_used() {
        let spec = json!({
            "id": "mini",
            "title": "Mini",
            "version": "1.0",
            "questions": [
                { "id": "email", "type": "email", "title": "Email", "required": true }
            ]
        });
        let config = json!({ "quiz_spec_json": spec.to_string() }).to_string();
        let response = parse(&view("mini", &config, ""));
        assert_eq!(response["view"]["progress"]["total"], 1);
        assert_eq!(response["view"]["question"]["input"]["widget"], "email");
    }

    #[test]
    fn malformed_email_is_not_submitted() {
        let state = json!({ "current_step": 28 }).to_string();
        let submitted = parse(&submit_answer(QUIZ, "", &state, "email", r#""not-an-email""#));
        assert_eq!(submitted["outcome"]["recorded"], false);
        assert_eq!(submitted["outcome"]["advisory"]["code"], "pattern_mismatch");
        assert_eq!(submitted["view"]["valid"], false);
        assert!(submitted["state"]["user_profile"].get("email").is_none());

        let state = submitted["state"].to_string();
        let advanced = parse(&advance(QUIZ, "", &state));
        assert_eq!(advanced["transition"]["transition"], "blocked");
        let redirect = parse(&checkout(QUIZ, "", &state, "annual"));
        assert_eq!(redirect["access"], "redirect_to_start");
    }

    #[test]
    fn checkout_requires_email() {
        let redirect = parse(&checkout(QUIZ, "", "", "annual"));
        assert_eq!(redirect["access"], "redirect_to_start");
        assert!(redirect.get("session").is_none());

        let state = json!({
            "answers": { "email": "runner@example.com" },
            "user_profile": { "email": "runner@example.com" }
        })
        .to_string();
        let response = parse(&checkout(QUIZ, "", &state, "annual"));
        assert_eq!(response["access"], "allowed");
        assert_eq!(response["session"]["session_url"], "/success");
        assert_eq!(response["session"]["plan"], "annual");

        let default_plan = parse(&checkout(QUIZ, "", &state, ""));
        assert_eq!(default_plan["session"]["plan"], "quarterly");

        let bad = parse(&checkout(QUIZ, "", &state, "weekly"));
        assert_eq!(bad["error"], "unknown plan 'weekly'");
    }
}
