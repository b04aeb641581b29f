use std::fs;
use std::time::{Duration, Instant};

use quiz_spec::{
    CheckoutAccess, CheckoutError, CheckoutRequest, DemoGateway, JsonFileStore, MemoryStore,
    PaymentGateway, PersistedState, Plan, QuizConfig, QuizData, QuizEngine, QuizSession,
    StateStore, UnitSystem, UserProfile, checkout_access, fitness_quiz, persisted_state_schema,
};
use tempfile::tempdir;

fn session<S: StateStore>(store: S) -> QuizSession<S> {
    QuizSession::open(fitness_quiz().expect("quiz"), store, QuizConfig::default())
}

#[test]
fn every_mutation_is_persisted() {
    let mut session = session(MemoryStore::new());
    session.answer("fitness-goal", "lose-weight".into());
    session.advance();
    session.set_unit_system(UnitSystem::Metric);

    let saved = session.store().current().expect("saved state");
    assert_eq!(saved.current_step, 1);
    assert_eq!(saved.unit_system, UnitSystem::Metric);
    assert_eq!(saved.user_profile.fitness_goal.as_deref(), Some("lose-weight"));
    assert_eq!(session.store().save_count(), 3);
}

#[test]
fn reopening_restores_progress_and_metrics() {
    let mut first = session(MemoryStore::new());
    first.answer("height", 178.0.into());
    first.answer("current-weight", 90.0.into());
    first.set_step(4);
    let (_, store) = first.into_parts();

    let second = session(store);
    assert_eq!(second.engine().current_step(), 4);
    assert_eq!(second.engine().metrics().map(|m| m.bmi), Some(28.4));
}

#[test]
fn fresh_session_uses_configured_units() {
    let config = QuizConfig {
        default_unit_system: UnitSystem::Metric,
        ..QuizConfig::default()
    };
    let session = QuizSession::open(fitness_quiz().expect("quiz"), MemoryStore::new(), config);
    assert_eq!(session.engine().unit_system(), UnitSystem::Metric);
}

#[test]
fn file_store_round_trips() {
    let dir = tempdir().expect("tempdir");
    let mut store = JsonFileStore::new(dir.path(), "fitness-quiz-storage");
    assert!(store.load().expect("load").is_none());
    assert_eq!(store.path(), dir.path().join("fitness-quiz-storage.json"));

    let mut engine = QuizEngine::new(fitness_quiz().expect("quiz"));
    engine.answer("gender", "female".into());
    engine.answer("obstacles", vec!["time".to_string()].into());
    store.save(&engine.snapshot()).expect("save");

    let loaded = store.load().expect("load").expect("state");
    assert_eq!(loaded, engine.snapshot());

    store.clear().expect("clear");
    assert!(store.load().expect("load").is_none());
    store.clear().expect("clearing twice is fine");
}

#[test]
fn corrupt_file_starts_a_fresh_quiz() {
    let dir = tempdir().expect("tempdir");
    fs::write(dir.path().join("quiz.json"), "{ broken").expect("write");

    let store = JsonFileStore::new(dir.path(), "quiz");
    assert!(store.load().is_err());

    let session = session(store);
    assert_eq!(session.engine().current_step(), 0);
    assert!(session.engine().answers().is_empty());
}

#[test]
fn snapshot_fields_default_when_missing() {
    let state: PersistedState = serde_json::from_str("{}").expect("state");
    assert_eq!(state, PersistedState::default());
    assert_eq!(state.unit_system, UnitSystem::Imperial);

    let schema = persisted_state_schema();
    assert!(schema["properties"]["current_step"].is_object());
}

#[test]
fn success_resets_after_delay() {
    let mut session = session(MemoryStore::new());
    session.answer("fitness-goal", "lose-weight".into());
    session.advance();

    let start = Instant::now();
    assert!(!session.tick(start));
    session.mark_success(start);
    assert!(!session.tick(start + Duration::from_secs(29)));
    assert_eq!(session.engine().current_step(), 1);

    assert!(session.tick(start + Duration::from_secs(30)));
    assert_eq!(session.engine().current_step(), 0);
    assert!(session.engine().answers().is_empty());
    assert_eq!(session.store().current().map(|s| s.current_step), Some(0));
    assert!(!session.tick(start + Duration::from_secs(60)));
}

#[test]
fn forget_clears_the_store() {
    let mut session = session(MemoryStore::new());
    session.answer("fitness-goal", "lose-weight".into());
    session.forget().expect("forget");
    assert!(session.store().current().is_none());
    assert!(session.engine().answers().is_empty());
}

#[test]
fn config_defaults_and_overrides() {
    let defaults = QuizConfig::from_json_str("  ").expect("defaults");
    assert_eq!(defaults, QuizConfig::default());
    assert_eq!(defaults.storage_key, "fitness-quiz-storage");
    assert_eq!(defaults.success_reset_after(), Duration::from_secs(30));
    assert_eq!(defaults.completion_delay(), Duration::from_millis(1000));

    let custom = QuizConfig::from_json_str(r#"{ "checkout_delay_ms": 5, "default_unit_system": "metric" }"#)
        .expect("config");
    assert_eq!(custom.checkout_delay(), Duration::from_millis(5));
    assert_eq!(custom.default_unit_system, UnitSystem::Metric);
    assert_eq!(custom.success_reset_secs, 30);
}

#[test]
fn plans_parse_and_describe_themselves() {
    assert_eq!("Annual".parse::<Plan>(), Ok(Plan::Annual));
    assert!("weekly".parse::<Plan>().is_err());
    assert_eq!(Plan::default(), Plan::Quarterly);
    assert!(Plan::Quarterly.is_popular());
    assert_eq!(Plan::Monthly.total_price(), None);
    assert_eq!(Plan::Annual.savings(), Some("58%"));
    assert_eq!(Plan::Annual.features().len(), 6);
}

#[test]
fn demo_gateway_requires_plan_and_email() {
    let gateway = DemoGateway;
    let mut request = CheckoutRequest {
        plan: Some(Plan::Monthly),
        email: Some("  ".into()),
        quiz_data: QuizData {
            user_profile: UserProfile::default(),
            health_metrics: None,
        },
    };
    assert!(matches!(
        gateway.create_session(&request),
        Err(CheckoutError::MissingFields)
    ));

    request.email = Some("runner@example.com".into());
    let session = gateway.create_session(&request).expect("session");
    assert_eq!(session.session_url, "/success");
    assert_eq!(session.message, "Demo mode - Stripe integration ready");
    assert_eq!(session.plan, Plan::Monthly);

    request.plan = None;
    assert!(gateway.create_session(&request).is_err());
}

#[test]
fn checkout_needs_completion_or_email() {
    let mut engine = QuizEngine::new(fitness_quiz().expect("quiz"));
    assert_eq!(checkout_access(&engine), CheckoutAccess::RedirectToStart);

    engine.answer("email", "runner@example.com".into());
    assert_eq!(checkout_access(&engine), CheckoutAccess::Allowed);

    let request = CheckoutRequest::from_engine(&engine, Plan::Annual);
    assert_eq!(request.email.as_deref(), Some("runner@example.com"));
    assert_eq!(request.plan, Some(Plan::Annual));
    assert!(request.quiz_data.health_metrics.is_none());
}
