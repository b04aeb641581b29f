use quiz_spec::{
    AnswerSet, AnswerValue, CatalogError, QuizSpec, Severity, UnitSystem, UserProfile,
    fitness_quiz, resolve_visibility, validate,
    validate::{check_age, check_height, check_value, check_weight, goal_weight_advisories},
};

fn spec_json(questions: &str) -> String {
    format!(
        r#"{{ "id": "sample", "title": "Sample", "version": "1.0", "questions": [{}] }}"#,
        questions
    )
}

#[test]
fn rejects_forward_conditions() {
    let json = spec_json(
        r#"
        { "id": "first", "type": "email", "title": "First",
          "conditional_display": { "question_id": "second", "values": ["yes"] } },
        { "id": "second", "type": "single-choice", "title": "Second",
          "options": [{ "id": "yes", "label": "Yes", "value": "yes" }] }
        "#,
    );
    match QuizSpec::from_json_str(&json) {
        Err(CatalogError::BadCondition {
            question,
            depends_on,
        }) => {
            assert_eq!(question, "first");
            assert_eq!(depends_on, "second");
        }
        other => panic!("expected bad condition, got {:?}", other),
    }
}

#[test]
fn rejects_duplicate_ids_and_empty_quizzes() {
    let json = spec_json(
        r#"
        { "id": "twice", "type": "email", "title": "One" },
        { "id": "twice", "type": "email", "title": "Two" }
        "#,
    );
    assert!(matches!(
        QuizSpec::from_json_str(&json),
        Err(CatalogError::DuplicateId(id)) if id == "twice"
    ));
    assert!(matches!(
        QuizSpec::from_json_str(&spec_json("")),
        Err(CatalogError::Empty(_))
    ));
    assert!(matches!(
        QuizSpec::from_json_str("{ not json"),
        Err(CatalogError::Parse(_))
    ));
}

#[test]
fn numeric_alias_parses_as_number() {
    let spec = QuizSpec::from_json_str(&spec_json(
        r#"{ "id": "years", "type": "numeric", "title": "Years" }"#,
    ))
    .expect("spec");
    assert!(spec.questions[0].kind.is_numeric());
}

#[test]
fn empty_answers_list_every_visible_required_question() {
    let spec = fitness_quiz().expect("quiz");
    let result = validate(&spec, &AnswerSet::new());
    assert!(!result.valid);
    assert_eq!(result.missing_required.len(), 29);
    assert!(!result.missing_required.contains(&"obstacles".to_string()));
    assert!(result.errors.is_empty());

    let visibility = resolve_visibility(&spec, &AnswerSet::new());
    assert_eq!(visibility.get("obstacles"), Some(&false));
    assert_eq!(visibility.get("email"), Some(&true));
}

#[test]
fn reports_pattern_and_unknown_fields() {
    let spec = fitness_quiz().expect("quiz");
    let mut answers = AnswerSet::new();
    answers.insert("email", "not-an-email".into());
    answers.insert("gender", "robot".into());
    answers.insert("stress-level", 14.0.into());
    answers.insert("mystery", 1.0.into());

    let result = validate(&spec, &answers);
    assert!(!result.valid);
    assert_eq!(result.unknown_fields, vec!["mystery".to_string()]);

    let codes: Vec<(&str, &str)> = result
        .errors
        .iter()
        .map(|error| (error.question_id.as_str(), error.code.as_str()))
        .collect();
    assert!(codes.contains(&("email", "pattern_mismatch")));
    assert!(codes.contains(&("gender", "invalid_option")));
    assert!(codes.contains(&("stress-level", "slider_range")));

    let email = result
        .errors
        .iter()
        .find(|error| error.question_id == "email")
        .expect("email error");
    assert_eq!(email.message, "Please enter a valid email address");
}

#[test]
fn wrong_answer_shape_is_a_type_mismatch() {
    let spec = fitness_quiz().expect("quiz");
    let motivation = spec.question("motivation").expect("motivation");
    let error = check_value(motivation, &AnswerValue::from("health")).expect("error");
    assert_eq!(error.code, "type_mismatch");

    let height = spec.question("height").expect("height");
    let error = check_value(height, &AnswerValue::from(90.0)).expect("error");
    assert_eq!(error.code, "height_range");
    assert!(check_value(height, &AnswerValue::from(178.0)).is_none());
}

#[test]
fn number_answers_must_be_whole() {
    let spec = fitness_quiz().expect("quiz");
    let age = spec.question("age").expect("age");
    let error = check_value(age, &AnswerValue::from(65.5)).expect("error");
    assert_eq!(error.code, "not_whole_number");
    assert_eq!(error.message, "Please enter a whole number");
    assert!(check_value(age, &AnswerValue::from(66.0)).is_none());
}

#[test]
fn measurement_bounds_use_inline_messages() {
    assert_eq!(
        check_weight(20.0),
        Err("Weight seems too low. Please check your input.")
    );
    assert_eq!(
        check_weight(320.0),
        Err("Weight seems unusually high. Please verify.")
    );
    assert!(check_weight(30.0).is_ok());
    assert!(check_height(250.0).is_ok());
    assert_eq!(
        check_height(251.0),
        Err("Height seems unusually high. Please verify.")
    );
    assert_eq!(
        check_age(12.0),
        Err("You must be at least 13 years old to use this program.")
    );
    assert_eq!(check_age(101.0), Err("Please enter a valid age."));
    assert!(check_age(13.0).is_ok());
}

#[test]
fn goal_below_healthy_range_is_an_error() {
    let profile = UserProfile {
        height_cm: Some(178.0),
        weight_kg: Some(90.0),
        ..UserProfile::default()
    };

    let low = goal_weight_advisories(50.0, &profile, UnitSystem::Imperial);
    assert_eq!(low.len(), 1);
    assert_eq!(low[0].severity, Severity::Error);
    assert_eq!(
        low[0].message,
        "Goal weight is below healthy range. Minimum recommended: 130 lbs"
    );

    let metric = goal_weight_advisories(50.0, &profile, UnitSystem::Metric);
    assert!(metric[0].message.ends_with("59 kg"));

    let gain = goal_weight_advisories(95.0, &profile, UnitSystem::Metric);
    assert_eq!(gain.len(), 1);
    assert_eq!(gain[0].severity, Severity::Info);
    assert!(gain[0].message.contains("muscle building"));

    assert!(goal_weight_advisories(75.0, &profile, UnitSystem::Metric).is_empty());
}
