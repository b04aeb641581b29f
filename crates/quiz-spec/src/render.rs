use handlebars::{Handlebars, RenderError};
use serde_json::{Map, Value, json};

use crate::{
    answers::AnswerValue,
    engine::{Direction, QuizEngine},
    health::HealthMetrics,
    spec::question::{QuestionOption, QuestionSpec, QuestionType},
    units::{UnitSystem, format_height, format_weight},
};

/// Status labels returned by the renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderStatus {
    /// A question is waiting for an answer.
    InProgress,
    /// The last question was answered.
    Complete,
    /// No question is visible.
    Empty,
}

impl RenderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RenderStatus::InProgress => "in_progress",
            RenderStatus::Complete => "complete",
            RenderStatus::Empty => "empty",
        }
    }
}

/// Input widget the display layer should use for a question.
#[derive(Debug, Clone, PartialEq)]
pub enum InputWidget {
    Choice {
        multiple: bool,
        options: Vec<QuestionOption>,
    },
    ImageChoice {
        options: Vec<QuestionOption>,
    },
    Number {
        min: Option<f64>,
        max: Option<f64>,
    },
    Height {
        unit: UnitSystem,
    },
    Weight {
        unit: UnitSystem,
    },
    Email,
    Slider {
        min: f64,
        max: f64,
        step: f64,
    },
}

impl InputWidget {
    pub fn for_question(question: &QuestionSpec, unit: UnitSystem) -> Self {
        match question.kind {
            QuestionType::SingleChoice => InputWidget::Choice {
                multiple: false,
                options: question.options.clone(),
            },
            QuestionType::MultipleChoice => InputWidget::Choice {
                multiple: true,
                options: question.options.clone(),
            },
            QuestionType::ImageChoice => InputWidget::ImageChoice {
                options: question.options.clone(),
            },
            QuestionType::Number => {
                let rule = question.validation.as_ref();
                InputWidget::Number {
                    min: question.min.or(rule.and_then(|rule| rule.min)),
                    max: question.max.or(rule.and_then(|rule| rule.max)),
                }
            }
            QuestionType::Height => InputWidget::Height { unit },
            QuestionType::Weight => InputWidget::Weight { unit },
            QuestionType::Email => InputWidget::Email,
            QuestionType::Slider => InputWidget::Slider {
                min: question.min.unwrap_or(1.0),
                max: question.max.unwrap_or(10.0),
                step: question.step.unwrap_or(1.0),
            },
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InputWidget::Choice { multiple: false, .. } => "choice",
            InputWidget::Choice { multiple: true, .. } => "multi_choice",
            InputWidget::ImageChoice { .. } => "image_choice",
            InputWidget::Number { .. } => "number",
            InputWidget::Height { .. } => "height",
            InputWidget::Weight { .. } => "weight",
            InputWidget::Email => "email",
            InputWidget::Slider { .. } => "slider",
        }
    }

    fn to_json(&self) -> Value {
        let mut map = Map::new();
        map.insert("widget".into(), Value::String(self.label().into()));
        match self {
            InputWidget::Choice { options, .. } | InputWidget::ImageChoice { options } => {
                map.insert("options".into(), options_json(options));
            }
            InputWidget::Number { min, max } => {
                map.insert("min".into(), json!(min));
                map.insert("max".into(), json!(max));
            }
            InputWidget::Height { unit } => {
                map.insert("unit".into(), Value::String(unit.height_label().into()));
            }
            InputWidget::Weight { unit } => {
                map.insert("unit".into(), Value::String(unit.weight_label().into()));
            }
            InputWidget::Email => {}
            InputWidget::Slider { min, max, step } => {
                map.insert("min".into(), json!(min));
                map.insert("max".into(), json!(max));
                map.insert("step".into(), json!(step));
            }
        }
        Value::Object(map)
    }
}

/// The active question as seen by the display layer.
#[derive(Debug, Clone)]
pub struct RenderQuestion {
    pub id: String,
    pub title: String,
    pub subtitle: Option<String>,
    pub placeholder: Option<String>,
    pub kind: QuestionType,
    pub required: bool,
    pub widget: InputWidget,
    pub current_value: Option<AnswerValue>,
    pub display_value: Option<String>,
}

/// Everything the display layer needs for one frame.
#[derive(Debug, Clone)]
pub struct RenderPayload {
    pub quiz_id: String,
    pub quiz_title: String,
    pub status: RenderStatus,
    pub step: usize,
    pub total: usize,
    pub progress_percent: u32,
    pub valid: bool,
    pub unit_system: UnitSystem,
    pub direction: Option<Direction>,
    pub show_exit_intent: bool,
    pub question: Option<RenderQuestion>,
    pub metrics: Option<HealthMetrics>,
}

pub fn build_render_payload(engine: &QuizEngine) -> RenderPayload {
    let unit = engine.unit_system();
    let total = engine.total_steps();
    let step = engine.current_step();
    let question = engine.current_question().map(|question| {
        let current_value = engine.answers().get(&question.id).cloned();
        RenderQuestion {
            id: question.id.clone(),
            title: question.title.clone(),
            subtitle: question.subtitle.clone(),
            placeholder: question.placeholder.clone(),
            kind: question.kind,
            required: question.required,
            widget: InputWidget::for_question(question, unit),
            display_value: current_value
                .as_ref()
                .map(|value| display_value(question, value, unit)),
            current_value,
        }
    });

    let status = if question.is_none() {
        RenderStatus::Empty
    } else if engine.is_completed() {
        RenderStatus::Complete
    } else {
        RenderStatus::InProgress
    };

    let progress_percent = if total == 0 {
        0
    } else {
        ((step + 1) as f64 / total as f64 * 100.0).round() as u32
    };

    RenderPayload {
        quiz_id: engine.spec().id.clone(),
        quiz_title: engine.spec().title.clone(),
        status,
        step,
        total,
        progress_percent,
        valid: engine.is_current_valid(),
        unit_system: unit,
        direction: engine.state().direction(),
        show_exit_intent: engine.show_exit_intent(),
        question,
        metrics: engine.metrics().cloned(),
    }
}

/// Render the payload as a structured JSON-friendly value.
pub fn render_json_ui(payload: &RenderPayload) -> Value {
    let question = payload.question.as_ref().map(|question| {
        let mut map = Map::new();
        map.insert("id".into(), Value::String(question.id.clone()));
        map.insert("title".into(), Value::String(question.title.clone()));
        map.insert(
            "subtitle".into(),
            question
                .subtitle
                .clone()
                .map(Value::String)
                .unwrap_or(Value::Null),
        );
        if let Some(placeholder) = &question.placeholder {
            map.insert("placeholder".into(), Value::String(placeholder.clone()));
        }
        map.insert("type".into(), Value::String(question.kind.as_str().into()));
        map.insert("required".into(), Value::Bool(question.required));
        map.insert("input".into(), question.widget.to_json());
        if let Some(value) = &question.current_value {
            map.insert("current_value".into(), json!(value));
        }
        if let Some(display) = &question.display_value {
            map.insert("display_value".into(), Value::String(display.clone()));
        }
        Value::Object(map)
    });

    json!({
        "quiz_id": payload.quiz_id,
        "quiz_title": payload.quiz_title,
        "status": payload.status.as_str(),
        "progress": {
            "step": payload.step,
            "total": payload.total,
            "percent": payload.progress_percent,
        },
        "valid": payload.valid,
        "unit_system": payload.unit_system,
        "direction": payload.direction,
        "show_exit_intent": payload.show_exit_intent,
        "question": question,
        "health_metrics": payload.metrics,
    })
}

/// Render the payload as terminal-friendly text.
pub fn render_text(payload: &RenderPayload) -> String {
    let mut lines = Vec::new();
    let Some(question) = &payload.question else {
        lines.push(format!("{}: no questions to show.", payload.quiz_title));
        return lines.join("\n");
    };

    lines.push(format!(
        "Question {} of {} ({}% complete)",
        payload.step + 1,
        payload.total,
        payload.progress_percent
    ));
    let mut title = question.title.clone();
    if question.required {
        title.push_str(" *");
    }
    lines.push(title);
    if let Some(subtitle) = &question.subtitle {
        lines.push(subtitle.clone());
    }

    match &question.widget {
        InputWidget::Choice { options, .. } | InputWidget::ImageChoice { options } => {
            for (index, option) in options.iter().enumerate() {
                let mut entry = format!("  {}) {}", index + 1, option.label);
                if let Some(description) = &option.description {
                    entry.push_str(&format!(" - {}", description));
                }
                lines.push(entry);
            }
        }
        InputWidget::Slider { min, max, .. } => {
            lines.push(format!("  Enter a value from {} to {}", min, max));
        }
        InputWidget::Height { unit: UnitSystem::Imperial } => {
            lines.push("  Enter feet and inches, e.g. 5'10".to_string());
        }
        InputWidget::Height { unit: UnitSystem::Metric } => {
            lines.push("  Enter centimetres, e.g. 178".to_string());
        }
        InputWidget::Weight { unit } => {
            lines.push(format!("  Enter weight in {}", unit.weight_label()));
        }
        InputWidget::Number { .. } | InputWidget::Email => {}
    }

    if let Some(value) = &question.display_value {
        lines.push(format!("Current answer: {}", value));
    }

    if let Some(metrics) = &payload.metrics {
        for warning in &metrics.warnings {
            lines.push(format!(
                "[{}] {}: {}",
                warning.severity.as_str(),
                warning.title,
                warning.message
            ));
        }
    }

    lines.join("\n")
}

const SUMMARY_TEMPLATE: &str = "\
Your personalized plan is ready
{{#if goal_weight}}Journey: {{current_weight}} -> {{goal_weight}}
{{/if}}BMI: {{bmi}} ({{category}})
Healthy weight range: {{healthy_min}} - {{healthy_max}}
Estimated timeline: {{weeks}} weeks at {{weekly}} per week
{{#each warnings}}[{{this.type}}] {{this.title}}: {{this.message}}
{{/each}}";

/// Personalised results summary shown before checkout.
///
/// Returns `Ok(None)` while metrics are not available yet.
pub fn render_summary(engine: &QuizEngine) -> Result<Option<String>, RenderError> {
    let Some(metrics) = engine.metrics() else {
        return Ok(None);
    };
    let unit = engine.unit_system();
    let profile = engine.profile();

    let data = json!({
        "current_weight": profile.weight_kg.map(|kg| format_weight(kg, unit)),
        "goal_weight": profile.goal_weight_kg.map(|kg| format_weight(kg, unit)),
        "bmi": metrics.bmi,
        "category": metrics.bmi_category.as_str(),
        "healthy_min": format_weight(f64::from(metrics.healthy_weight_min), unit),
        "healthy_max": format_weight(f64::from(metrics.healthy_weight_max), unit),
        "weeks": metrics.estimated_weeks,
        "weekly": format!("{} kg", metrics.weekly_weight_loss),
        "warnings": metrics.warnings,
    });

    let mut handlebars = Handlebars::new();
    handlebars.register_escape_fn(handlebars::no_escape);
    handlebars.render_template(SUMMARY_TEMPLATE, &data).map(Some)
}

fn display_value(question: &QuestionSpec, value: &AnswerValue, unit: UnitSystem) -> String {
    match (question.kind, value) {
        (QuestionType::Height, AnswerValue::Number(cm)) => format_height(*cm, unit),
        (QuestionType::Weight, AnswerValue::Number(kg)) => format_weight(*kg, unit),
        (kind, AnswerValue::Text(text)) if kind.is_choice() => question
            .option(text)
            .map(|option| option.label.clone())
            .unwrap_or_else(|| text.clone()),
        (QuestionType::MultipleChoice, AnswerValue::List(values)) => values
            .iter()
            .map(|value| {
                question
                    .option(value)
                    .map(|option| option.label.clone())
                    .unwrap_or_else(|| value.clone())
            })
            .collect::<Vec<_>>()
            .join(", "),
        (_, other) => other.display_string(),
    }
}

fn options_json(options: &[QuestionOption]) -> Value {
    Value::Array(
        options
            .iter()
            .map(|option| serde_json::to_value(option).unwrap_or(Value::Null))
            .collect(),
    )
}
