use quiz_spec::{
    InputWidget, QuizEngine, RenderStatus, UnitSystem, build_render_payload, fitness_quiz,
    render_json_ui, render_summary, render_text,
};

fn engine() -> QuizEngine {
    QuizEngine::new(fitness_quiz().expect("built-in quiz"))
}

#[test]
fn first_frame_shows_the_goal_question() {
    let engine = engine();
    let payload = build_render_payload(&engine);

    assert_eq!(payload.status, RenderStatus::InProgress);
    assert_eq!(payload.step, 0);
    assert_eq!(payload.total, 29);
    assert_eq!(payload.progress_percent, 3);
    assert!(!payload.valid);
    assert!(payload.direction.is_none());
    assert!(payload.metrics.is_none());

    let question = payload.question.as_ref().expect("question");
    assert_eq!(question.id, "fitness-goal");
    assert!(matches!(question.widget, InputWidget::ImageChoice { ref options } if options.len() == 4));
}

#[test]
fn text_lists_numbered_options() {
    let text = render_text(&build_render_payload(&engine()));
    assert!(text.starts_with("Question 1 of 29 (3% complete)"));
    assert!(text.contains("What is your primary fitness goal? *"));
    assert!(text.contains("  1) Lose Weight - Shed extra pounds and feel lighter"));
    assert!(text.contains("  4) Improve Health"));
}

#[test]
fn json_ui_carries_progress_and_widget() {
    let mut engine = engine();
    engine.answer("fitness-goal", "build-muscle".into());
    let ui = render_json_ui(&build_render_payload(&engine));

    assert_eq!(ui["quiz_id"], "fitness-quiz");
    assert_eq!(ui["status"], "in_progress");
    assert_eq!(ui["progress"]["total"], 29);
    assert_eq!(ui["valid"], true);
    assert_eq!(ui["unit_system"], "imperial");
    assert_eq!(ui["question"]["type"], "image-choice");
    assert_eq!(ui["question"]["input"]["widget"], "image_choice");
    assert_eq!(ui["question"]["current_value"], "build-muscle");
    assert_eq!(ui["question"]["display_value"], "Build Muscle");
    assert!(ui["health_metrics"].is_null());
}

#[test]
fn height_question_shows_unit_specific_display() {
    let mut engine = engine();
    engine.set_step(6);
    engine.answer("height", 178.0.into());

    let ui = render_json_ui(&build_render_payload(&engine));
    assert_eq!(ui["question"]["id"], "height");
    assert_eq!(ui["question"]["input"]["widget"], "height");
    assert_eq!(ui["question"]["input"]["unit"], "ft/in");
    assert_eq!(ui["question"]["display_value"], "5'10\"");

    engine.set_unit_system(UnitSystem::Metric);
    let payload = build_render_payload(&engine);
    let ui = render_json_ui(&payload);
    assert_eq!(ui["question"]["input"]["unit"], "cm");
    assert_eq!(ui["question"]["display_value"], "178 cm");
    assert!(render_text(&payload).contains("Enter centimetres"));
}

#[test]
fn metric_weights_show_one_decimal() {
    let mut engine = engine();
    engine.set_step(7);
    engine.answer("current-weight", quiz_spec::units::lbs_to_kg(180.0).into());
    assert_eq!(
        render_json_ui(&build_render_payload(&engine))["question"]["display_value"],
        "180 lbs"
    );

    engine.set_unit_system(UnitSystem::Metric);
    let ui = render_json_ui(&build_render_payload(&engine));
    assert_eq!(ui["question"]["id"], "current-weight");
    assert_eq!(ui["question"]["display_value"], "81.6 kg");
}

#[test]
fn slider_and_multi_choice_widgets() {
    let mut engine = engine();
    engine.set_step(2);
    let payload = build_render_payload(&engine);
    assert_eq!(
        payload.question.as_ref().map(|q| q.widget.label()),
        Some("multi_choice")
    );

    // stress-level sits at index 23 while obstacles is hidden.
    engine.set_step(23);
    let ui = render_json_ui(&build_render_payload(&engine));
    assert_eq!(ui["question"]["id"], "stress-level");
    assert_eq!(ui["question"]["input"]["widget"], "slider");
    assert_eq!(ui["question"]["input"]["min"], 1.0);
    assert_eq!(ui["question"]["input"]["max"], 10.0);
}

#[test]
fn completed_quiz_reports_complete_status() {
    let mut engine = engine();
    engine.set_step(28);
    engine.answer("email", "runner@example.com".into());
    engine.advance();
    let payload = build_render_payload(&engine);
    assert_eq!(payload.status, RenderStatus::Complete);
    assert_eq!(payload.progress_percent, 100);
}

#[test]
fn warnings_are_listed_in_text() {
    let mut engine = engine();
    engine.answer("height", 178.0.into());
    engine.answer("current-weight", 90.0.into());
    engine.answer("goal-weight", 75.0.into());
    let text = render_text(&build_render_payload(&engine));
    assert!(text.contains("[warning] Pace Advisory:"));
}

#[test]
fn summary_waits_for_metrics() {
    let mut engine = engine();
    assert_eq!(render_summary(&engine).expect("render"), None);

    engine.answer("height", 178.0.into());
    engine.answer("current-weight", 90.0.into());
    engine.answer("goal-weight", 75.0.into());

    let summary = render_summary(&engine).expect("render").expect("summary");
    assert!(summary.starts_with("Your personalized plan is ready"));
    assert!(summary.contains("Journey: 198 lbs -> 165 lbs"));
    assert!(summary.contains("BMI: 28.4 (overweight)"));
    assert!(summary.contains("Healthy weight range: 130 lbs - 174 lbs"));
    assert!(summary.contains("Estimated timeline: 20 weeks at 0.75 kg per week"));
    assert!(summary.contains("[warning] Pace Advisory:"));
}

#[test]
fn summary_without_goal_skips_journey() {
    let mut engine = engine();
    engine.set_unit_system(UnitSystem::Metric);
    engine.answer("height", 170.0.into());
    engine.answer("current-weight", 70.0.into());
    let summary = render_summary(&engine).expect("render").expect("summary");
    assert!(!summary.contains("Journey"));
    assert!(summary.contains("Healthy weight range: 53 kg - 72 kg"));
}
