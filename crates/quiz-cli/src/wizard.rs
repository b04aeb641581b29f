use quiz_spec::{
    AnswerValue, CheckoutSession, HealthMetrics, InputWidget, Plan, RenderPayload,
    RenderQuestion, Severity, UnitSystem, ValidationError, render_text,
    spec::QuestionOption,
    units::{height_to_cm, weight_to_kg},
    validate::InlineAdvisory,
};
use serde_json::Value;

/// Controls which bits of state the quiz prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Question prompts only.
    Clean,
    /// Also status lines, answer snapshots and parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Prints the quiz frames and feedback for the terminal front end.
pub struct QuizPresenter {
    verbosity: Verbosity,
    header_printed: bool,
}

impl QuizPresenter {
    pub fn new(verbosity: Verbosity) -> Self {
        Self {
            verbosity,
            header_printed: false,
        }
    }

    pub fn show_header(&mut self, payload: &RenderPayload, resumed: bool) {
        if self.header_printed {
            return;
        }
        println!("{}", payload.quiz_title);
        println!("Type 'back' to go back, 'units metric|imperial' to switch units, 'exit' to leave.");
        if resumed {
            println!("Welcome back! Resuming at question {}.", payload.step + 1);
        }
        self.header_printed = true;
    }

    pub fn show_question(&self, payload: &RenderPayload) {
        println!();
        println!("{}", render_text(payload));
        if self.verbosity.is_verbose() {
            let direction = payload
                .direction
                .map(|direction| format!("{:?}", direction).to_lowercase())
                .unwrap_or_else(|| "none".into());
            println!(
                "Status: {} (step {}/{}, valid: {}, units: {}, last move: {})",
                payload.status.as_str(),
                payload.step + 1,
                payload.total,
                payload.valid,
                payload.unit_system.as_str(),
                direction
            );
            if let Some(question) = &payload.question {
                println!("Expected: {}", expected_input(question));
            }
        }
    }

    pub fn show_json(&self, frame: &Value) {
        match serde_json::to_string_pretty(frame) {
            Ok(pretty) => println!("{}", pretty),
            Err(err) => eprintln!("Failed to serialize frame: {}", err),
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_advisory(&self, advisory: &ValidationError) {
        println!("Note: {}", advisory.message);
    }

    pub fn show_inline(&self, advisories: &[InlineAdvisory]) {
        for advisory in advisories {
            println!("[{}] {}", advisory.severity.as_str(), advisory.message);
        }
    }

    pub fn show_blocked(&self) {
        println!("Please answer this question to continue.");
    }

    /// Short BMI line once height and weight are known.
    pub fn show_metrics_preview(&self, metrics: &HealthMetrics) {
        println!(
            "Your BMI: {} ({})",
            metrics.bmi,
            metrics.bmi_category.as_str()
        );
        if let Some(error) = metrics
            .warnings
            .iter()
            .find(|warning| warning.severity == Severity::Error)
        {
            println!("[error] {}: {}", error.title, error.message);
        }
    }

    pub fn show_answers(&self, answers_json: &str) {
        if self.verbosity.is_verbose() {
            println!("Answers: {}", answers_json);
        }
    }

    pub fn show_analyzing(&self) {
        println!();
        println!("Analyzing your answers...");
    }

    pub fn show_plans(&self) {
        println!();
        println!("Choose your plan:");
        for (index, plan) in Plan::ALL.iter().enumerate() {
            let mut line = format!(
                "  {}) {} - ${:.2}/month",
                index + 1,
                plan.name(),
                plan.monthly_price()
            );
            if let Some(total) = plan.total_price() {
                line.push_str(&format!(" (${:.2} total)", total));
            }
            if let Some(savings) = plan.savings() {
                line.push_str(&format!(", save {}", savings));
            }
            if plan.is_popular() {
                line.push_str(" [most popular]");
            }
            println!("{}", line);
            if self.verbosity.is_verbose() {
                for feature in plan.features() {
                    println!("       - {}", feature);
                }
            }
        }
    }

    pub fn show_processing(&self) {
        println!("Processing payment...");
    }

    pub fn show_checkout(&self, session: &CheckoutSession) {
        println!();
        println!("Welcome aboard! Your {} plan is active.", session.plan.name());
        println!("{}", session.message);
        println!("A confirmation was sent to {}.", session.email);
    }

    pub fn show_redirect(&self) {
        println!("Please complete the quiz before choosing a plan.");
    }
}

/// Describes what the active widget accepts.
fn expected_input(question: &RenderQuestion) -> String {
    match &question.widget {
        InputWidget::Choice {
            multiple: true,
            options,
        } => format!(
            "one or more of 1-{} separated by commas",
            options.len()
        ),
        InputWidget::Choice { options, .. } | InputWidget::ImageChoice { options } => {
            format!("a number from 1 to {} or an option value", options.len())
        }
        InputWidget::Number { min, max } => match (min, max) {
            (Some(min), Some(max)) => format!("a number from {} to {}", min, max),
            _ => "a number".into(),
        },
        InputWidget::Height {
            unit: UnitSystem::Imperial,
        } => "feet and inches, e.g. 5'10".into(),
        InputWidget::Height { .. } => "centimetres".into(),
        InputWidget::Weight { unit } => format!("weight in {}", unit.weight_label()),
        InputWidget::Email => "an email address".into(),
        InputWidget::Slider { min, max, .. } => format!("a number from {} to {}", min, max),
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Turns a typed line into an answer for the active question.
///
/// Heights and weights come back in centimetres and kilograms.
pub fn parse_answer(question: &RenderQuestion, raw: &str) -> Result<AnswerValue, AnswerParseError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(AnswerParseError::new(
            "This question requires an answer.",
            None,
        ));
    }

    match &question.widget {
        InputWidget::Choice {
            multiple: true,
            options,
        } => {
            let values = raw
                .split(',')
                .map(str::trim)
                .filter(|part| !part.is_empty())
                .map(|part| pick_option(options, part))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(AnswerValue::List(values))
        }
        InputWidget::Choice { options, .. } | InputWidget::ImageChoice { options } => {
            pick_option(options, raw).map(AnswerValue::Text)
        }
        InputWidget::Number { .. } | InputWidget::Slider { .. } => {
            parse_number(raw).map(AnswerValue::Number)
        }
        InputWidget::Height { unit } => parse_height(raw, *unit).map(AnswerValue::Number),
        InputWidget::Weight { unit } => parse_weight(raw, *unit).map(AnswerValue::Number),
        InputWidget::Email => Ok(AnswerValue::Text(raw.to_string())),
    }
}

fn pick_option(options: &[QuestionOption], raw: &str) -> Result<String, AnswerParseError> {
    if let Ok(index) = raw.parse::<usize>()
        && (1..=options.len()).contains(&index)
    {
        return Ok(options[index - 1].value.clone());
    }
    options
        .iter()
        .find(|option| option.value.eq_ignore_ascii_case(raw) || option.label.eq_ignore_ascii_case(raw))
        .map(|option| option.value.clone())
        .ok_or_else(|| {
            let allowed = options
                .iter()
                .map(|option| option.value.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            AnswerParseError::new(
                format!("Choose 1-{} or one of: {}.", options.len(), allowed),
                Some(format!("allowed values: {}", allowed)),
            )
        })
}

pub fn parse_number(raw: &str) -> Result<f64, AnswerParseError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| {
            AnswerParseError::new(
                "Please enter a number.",
                Some("expected number".to_string()),
            )
        })
}

/// Heights in centimetres, or feet and inches such as `5'10`, `5'10"` or `5 10`.
pub fn parse_height(raw: &str, unit: UnitSystem) -> Result<f64, AnswerParseError> {
    match unit {
        UnitSystem::Metric => parse_number(raw),
        UnitSystem::Imperial => {
            let cleaned = raw.trim().trim_end_matches('"');
            let mut parts = cleaned
                .split(|c: char| c == '\'' || c.is_whitespace())
                .filter(|part| !part.is_empty());
            let feet = parts.next().map(parse_number).transpose()?;
            let inches = parts.next().map(parse_number).transpose()?.unwrap_or(0.0);
            match (feet, parts.next()) {
                (Some(feet), None) if (0.0..12.0).contains(&inches) => {
                    Ok(height_to_cm(feet, inches, unit))
                }
                _ => Err(AnswerParseError::new(
                    "Please enter feet and inches, e.g. 5'10.",
                    Some("expected <feet>'<inches>".to_string()),
                )),
            }
        }
    }
}

/// Weight in the chosen unit, converted to kilograms.
pub fn parse_weight(raw: &str, unit: UnitSystem) -> Result<f64, AnswerParseError> {
    parse_number(raw).map(|value| weight_to_kg(value, unit))
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_spec::units::feet_inches_to_cm;

    #[test]
    fn imperial_heights_accept_common_spellings() {
        let expected = feet_inches_to_cm(5.0, 10.0);
        for raw in ["5'10", "5'10\"", "5 10", " 5' 10 "] {
            let cm = parse_height(raw, UnitSystem::Imperial).expect(raw);
            assert!((cm - expected).abs() < 1e-9, "{}", raw);
        }
        assert!(parse_height("6", UnitSystem::Imperial).is_ok());
        assert!(parse_height("5'14", UnitSystem::Imperial).is_err());
        assert!(parse_height("tall", UnitSystem::Imperial).is_err());
    }

    #[test]
    fn metric_height_is_plain_centimetres() {
        assert_eq!(parse_height("178", UnitSystem::Metric).ok(), Some(178.0));
    }

    #[test]
    fn pounds_are_converted_to_kilograms() {
        let kg = parse_weight("200", UnitSystem::Imperial).expect("weight");
        assert!((kg - 90.7184).abs() < 1e-9);
        assert!(parse_weight("heavy", UnitSystem::Metric).is_err());
        assert!(parse_weight("inf", UnitSystem::Metric).is_err());
    }
}
