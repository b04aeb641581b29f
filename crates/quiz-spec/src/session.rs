use std::time::Instant;

use tracing::{info, warn};

use crate::answers::AnswerValue;
use crate::config::QuizConfig;
use crate::engine::{AnswerOutcome, QuizEngine, Transition};
use crate::spec::quiz::QuizSpec;
use crate::store::{StateStore, StoreError};
use crate::units::UnitSystem;

/// A quiz engine paired with the store that persists it.
///
/// Every mutation writes the snapshot back. Save failures are logged and do
/// not interrupt the quiz; [`QuizSession::flush`] surfaces them when needed.
pub struct QuizSession<S: StateStore> {
    engine: QuizEngine,
    store: S,
    config: QuizConfig,
    succeeded_at: Option<Instant>,
}

impl<S: StateStore> QuizSession<S> {
    /// Resumes from the store when it holds a snapshot, otherwise starts fresh.
    pub fn open(spec: QuizSpec, store: S, config: QuizConfig) -> Self {
        let engine = match store.load() {
            Ok(Some(snapshot)) => QuizEngine::restore(spec, snapshot),
            Ok(None) => QuizEngine::with_unit_system(spec, config.default_unit_system),
            Err(err) => {
                warn!(error = %err, "discarding unreadable quiz state");
                QuizEngine::with_unit_system(spec, config.default_unit_system)
            }
        };
        Self {
            engine,
            store,
            config,
            succeeded_at: None,
        }
    }

    pub fn engine(&self) -> &QuizEngine {
        &self.engine
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn config(&self) -> &QuizConfig {
        &self.config
    }

    pub fn answer(&mut self, question_id: &str, value: AnswerValue) -> AnswerOutcome {
        let outcome = self.engine.answer(question_id, value);
        self.persist();
        outcome
    }

    pub fn answer_current(&mut self, value: AnswerValue) -> Option<AnswerOutcome> {
        let outcome = self.engine.answer_current(value);
        self.persist();
        outcome
    }

    pub fn advance(&mut self) -> Transition {
        let transition = self.engine.advance();
        self.persist();
        transition
    }

    pub fn retreat(&mut self) -> Transition {
        let transition = self.engine.retreat();
        self.persist();
        transition
    }

    pub fn set_step(&mut self, step: usize) {
        self.engine.set_step(step);
        self.persist();
    }

    pub fn set_unit_system(&mut self, unit_system: UnitSystem) {
        self.engine.set_unit_system(unit_system);
        self.persist();
    }

    pub fn pointer_left_viewport(&mut self) -> bool {
        self.engine.pointer_left_viewport()
    }

    pub fn dismiss_exit_intent(&mut self) {
        self.engine.dismiss_exit_intent();
    }

    pub fn reset(&mut self) {
        self.engine.reset();
        self.succeeded_at = None;
        self.persist();
    }

    /// Records that checkout succeeded; the quiz is cleared once the reset delay passes.
    pub fn mark_success(&mut self, now: Instant) {
        info!(
            reset_after_secs = self.config.success_reset_secs,
            "checkout succeeded"
        );
        self.succeeded_at = Some(now);
    }

    /// Applies the delayed post-success reset. Returns true when it fired.
    pub fn tick(&mut self, now: Instant) -> bool {
        let Some(succeeded_at) = self.succeeded_at else {
            return false;
        };
        if now.saturating_duration_since(succeeded_at) < self.config.success_reset_after() {
            return false;
        }
        self.reset();
        true
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.store.save(&self.engine.snapshot())
    }

    /// Drops the persisted snapshot and resets the engine.
    pub fn forget(&mut self) -> Result<(), StoreError> {
        self.engine.reset();
        self.succeeded_at = None;
        self.store.clear()
    }

    pub fn into_parts(self) -> (QuizEngine, S) {
        (self.engine, self.store)
    }

    fn persist(&mut self) {
        if let Err(err) = self.store.save(&self.engine.snapshot()) {
            warn!(error = %err, "failed to persist quiz state");
        }
    }
}
