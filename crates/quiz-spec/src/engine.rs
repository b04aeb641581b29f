//! Quiz progression: visible steps, answer recording, and navigation.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::answers::{AnswerSet, AnswerValue};
use crate::health::{HealthMetrics, calculate_health_metrics};
use crate::profile::UserProfile;
use crate::spec::{question::QuestionSpec, quiz::QuizSpec};
use crate::store::PersistedState;
use crate::units::UnitSystem;
use crate::validate::{ValidationError, check_value, is_answer_valid};
use crate::visibility::visible_questions;

/// Animation hint for the last step change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Forward,
    Backward,
}

/// Result of a navigation request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "transition", rename_all = "snake_case")]
pub enum Transition {
    Moved { step: usize, direction: Direction },
    /// The last visible question was answered; the host moves on to checkout.
    Completed,
    /// The active question does not validate yet.
    Blocked,
    /// Back was pressed on the first question.
    ExitIntent,
}

/// What happened when an answer was written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerOutcome {
    pub question_id: String,
    pub recorded: bool,
    pub metrics_updated: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub advisory: Option<ValidationError>,
}

/// Full quiz state. Only [`QuizEngine`] mutates it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
pub struct QuizState {
    current_step: usize,
    answers: AnswerSet,
    user_profile: UserProfile,
    health_metrics: Option<HealthMetrics>,
    unit_system: UnitSystem,
    is_completed: bool,
    show_exit_intent: bool,
    direction: Option<Direction>,
}

impl QuizState {
    pub fn answers(&self) -> &AnswerSet {
        &self.answers
    }

    pub fn user_profile(&self) -> &UserProfile {
        &self.user_profile
    }

    pub fn health_metrics(&self) -> Option<&HealthMetrics> {
        self.health_metrics.as_ref()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.unit_system
    }

    pub fn is_completed(&self) -> bool {
        self.is_completed
    }

    pub fn show_exit_intent(&self) -> bool {
        self.show_exit_intent
    }

    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }
}

/// Owner of the quiz state.
///
/// The visible question list is recomputed from the static questions and the
/// current answers on every query, so a stored step index may run past the
/// end after an earlier answer hides later questions. Reads clamp it.
#[derive(Debug, Clone)]
pub struct QuizEngine {
    spec: QuizSpec,
    state: QuizState,
}

impl QuizEngine {
    pub fn new(spec: QuizSpec) -> Self {
        Self::with_unit_system(spec, UnitSystem::default())
    }

    pub fn with_unit_system(spec: QuizSpec, unit_system: UnitSystem) -> Self {
        Self {
            spec,
            state: QuizState {
                unit_system,
                ..QuizState::default()
            },
        }
    }

    /// Rebuilds an engine from a persisted snapshot; metrics are recomputed from the profile.
    pub fn restore(spec: QuizSpec, snapshot: PersistedState) -> Self {
        let mut engine = Self {
            spec,
            state: QuizState {
                current_step: snapshot.current_step,
                answers: snapshot.answers,
                user_profile: snapshot.user_profile,
                unit_system: snapshot.unit_system,
                ..QuizState::default()
            },
        };
        engine.recalculate_metrics();
        engine.state.current_step = engine.current_step();
        debug!(
            step = engine.state.current_step,
            answers = engine.state.answers.len(),
            "restored quiz state"
        );
        engine
    }

    pub fn spec(&self) -> &QuizSpec {
        &self.spec
    }

    pub fn state(&self) -> &QuizState {
        &self.state
    }

    pub fn visible_questions(&self) -> Vec<&QuestionSpec> {
        visible_questions(&self.spec, &self.state.answers)
    }

    pub fn total_steps(&self) -> usize {
        self.visible_questions().len()
    }

    /// Step index into the visible list, clamped to its bounds.
    pub fn current_step(&self) -> usize {
        self.clamp_step(self.state.current_step)
    }

    pub fn current_question(&self) -> Option<&QuestionSpec> {
        self.visible_questions().get(self.current_step()).copied()
    }

    pub fn current_answer(&self) -> Option<&AnswerValue> {
        let question = self.current_question()?;
        self.state.answers.get(&question.id)
    }

    pub fn is_current_valid(&self) -> bool {
        self.current_question()
            .is_some_and(|question| is_answer_valid(question, self.state.answers.get(&question.id)))
    }

    pub fn is_last_step(&self) -> bool {
        self.current_step() + 1 >= self.total_steps()
    }

    /// Records an answer and projects it into the profile.
    ///
    /// Unknown question ids are ignored. A value that fails its inline check is
    /// not stored; any earlier answer stays in place and the outcome carries the
    /// advisory. Answers to questions that later become hidden are kept as they are.
    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> AnswerOutcome {
        let Some(question) = self.spec.question(question_id) else {
            warn!(question_id, "ignoring answer for unknown question");
            return AnswerOutcome {
                question_id: question_id.to_string(),
                recorded: false,
                metrics_updated: false,
                advisory: None,
            };
        };
        if let Some(advisory) = check_value(question, &value) {
            debug!(question_id, code = %advisory.code, "answer rejected");
            return AnswerOutcome {
                question_id: question_id.to_string(),
                recorded: false,
                metrics_updated: false,
                advisory: Some(advisory),
            };
        }

        let field = self.state.user_profile.project(question_id, &value);
        self.state.answers.insert(question_id, value);

        let metrics_updated = match field {
            Some(field) if field.affects_metrics() => self.recalculate_metrics(),
            _ => false,
        };
        debug!(
            question_id,
            profile_field = ?field,
            metrics_updated,
            "answer recorded"
        );

        AnswerOutcome {
            question_id: question_id.to_string(),
            recorded: true,
            metrics_updated,
            advisory: None,
        }
    }

    /// Records an answer for the active question.
    pub fn answer_current(&mut self, value: AnswerValue) -> Option<AnswerOutcome> {
        let question_id = self.current_question()?.id.clone();
        Some(self.answer(&question_id, value))
    }

    pub fn advance(&mut self) -> Transition {
        if !self.is_current_valid() {
            return Transition::Blocked;
        }
        let step = self.current_step();
        if step + 1 < self.total_steps() {
            self.state.current_step = step + 1;
            self.state.direction = Some(Direction::Forward);
            debug!(step = step + 1, "advanced");
            Transition::Moved {
                step: step + 1,
                direction: Direction::Forward,
            }
        } else {
            self.state.current_step = step;
            self.state.is_completed = true;
            info!(answers = self.state.answers.len(), "quiz completed");
            Transition::Completed
        }
    }

    pub fn retreat(&mut self) -> Transition {
        let step = self.current_step();
        if step > 0 {
            self.state.current_step = step - 1;
            self.state.direction = Some(Direction::Backward);
            debug!(step = step - 1, "went back");
            Transition::Moved {
                step: step - 1,
                direction: Direction::Backward,
            }
        } else {
            self.state.show_exit_intent = true;
            debug!("back pressed on first question, raising exit intent");
            Transition::ExitIntent
        }
    }

    pub fn set_step(&mut self, step: usize) {
        self.state.current_step = self.clamp_step(step);
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.state.unit_system = unit_system;
    }

    /// Pointer left the top of the viewport. Only counts past the third question.
    pub fn pointer_left_viewport(&mut self) -> bool {
        if self.current_step() > 2 {
            self.state.show_exit_intent = true;
        }
        self.state.show_exit_intent
    }

    /// Whether leaving the page should ask for confirmation.
    pub fn should_confirm_unload(&self) -> bool {
        self.current_step() > 0
    }

    pub fn dismiss_exit_intent(&mut self) {
        self.state.show_exit_intent = false;
    }

    /// Clears progress, answers, profile, and metrics. The unit preference survives.
    pub fn reset(&mut self) {
        self.state = QuizState {
            unit_system: self.state.unit_system,
            ..QuizState::default()
        };
        info!("quiz reset");
    }

    /// Recomputes metrics when height and weight are known. Returns whether metrics were set.
    pub fn recalculate_metrics(&mut self) -> bool {
        match self.state.user_profile.metrics_input() {
            Some(input) => {
                self.state.health_metrics = Some(calculate_health_metrics(&input));
                true
            }
            None => false,
        }
    }

    pub fn snapshot(&self) -> PersistedState {
        PersistedState {
            answers: self.state.answers.clone(),
            user_profile: self.state.user_profile.clone(),
            unit_system: self.state.unit_system,
            current_step: self.current_step(),
        }
    }

    pub fn answers(&self) -> &AnswerSet {
        &self.state.answers
    }

    pub fn profile(&self) -> &UserProfile {
        &self.state.user_profile
    }

    pub fn metrics(&self) -> Option<&HealthMetrics> {
        self.state.health_metrics.as_ref()
    }

    pub fn unit_system(&self) -> UnitSystem {
        self.state.unit_system
    }

    pub fn is_completed(&self) -> bool {
        self.state.is_completed
    }

    pub fn show_exit_intent(&self) -> bool {
        self.state.show_exit_intent
    }

    fn clamp_step(&self, step: usize) -> usize {
        step.min(self.total_steps().saturating_sub(1))
    }
}

