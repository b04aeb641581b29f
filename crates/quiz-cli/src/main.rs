mod wizard;

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::thread;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use component_quiz::{describe, validate_answers};
use quiz_spec::{
    CheckoutAccess, CheckoutRequest, DemoGateway, Gender, HealthMetrics, JsonFileStore,
    MetricsInput, PaymentGateway, Plan, QuizConfig, QuizSession, StateStore, Transition,
    UnitSystem, build_render_payload, calculate_health_metrics, checkout_access, fitness_quiz,
    render_json_ui, render_summary,
    units::{format_weight, weight_to_kg},
    validate::{check_height, check_weight, goal_weight_advisories},
};
use serde_json::{Value, json};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use wizard::{QuizPresenter, Verbosity, parse_answer, parse_height};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

const QUIZ_ID: &str = "fitness-quiz";
const CONFIG_ENV: &str = "FITNESS_QUIZ_CONFIG";
const STATE_DIR_ENV: &str = "FITNESS_QUIZ_STATE_DIR";

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Personalized fitness plan quiz",
    long_about = "Runs the fitness quiz in a terminal, computes health metrics, and validates answer sets"
)]
struct Cli {
    /// Path to a JSON config file (defaults to FITNESS_QUIZ_CONFIG, then built-in defaults).
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,
    /// Directory holding saved quiz progress (defaults to FITNESS_QUIZ_STATE_DIR or the current directory).
    #[arg(long, value_name = "DIR", global = true)]
    state_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum RenderMode {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Take the quiz interactively; progress is saved after every answer.
    Run {
        /// Show status lines and parse expectations.
        #[arg(long)]
        verbose: bool,
        /// Render output mode for each question.
        #[arg(long, value_enum, default_value_t = RenderMode::Text)]
        format: RenderMode,
        /// Unit system to use for this run.
        #[arg(long, value_name = "UNITS")]
        units: Option<UnitSystem>,
    },
    /// Compute BMI, healthy range, and timeline for a set of measurements.
    Metrics {
        /// Height in centimetres, or feet and inches (5'10) with imperial units.
        #[arg(long)]
        height: String,
        /// Current weight in kg or lbs.
        #[arg(long)]
        weight: f64,
        /// Goal weight in kg or lbs.
        #[arg(long)]
        goal: Option<f64>,
        #[arg(long)]
        age: Option<u32>,
        /// male, female, or other.
        #[arg(long)]
        gender: Option<String>,
        /// Unit system of the inputs and output (defaults to the configured system).
        #[arg(long, value_name = "UNITS")]
        units: Option<UnitSystem>,
        /// Print the metrics as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Validate a JSON answer set against the quiz.
    Validate {
        /// Path to the answers JSON file.
        #[arg(long, value_name = "ANSWERS")]
        answers: PathBuf,
        /// Optional quiz definition to validate against instead of the built-in quiz.
        #[arg(long, value_name = "QUIZ")]
        quiz: Option<PathBuf>,
    },
    /// List the quiz questions.
    Questions {
        /// Print the full quiz definition as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Forget saved quiz progress.
    Reset,
}

fn main() -> CliResult<()> {
    init_logging();
    let cli = Cli::parse();
    let config = load_config(cli.config)?;
    match cli.command {
        Command::Run {
            verbose,
            format,
            units,
        } => run_quiz(config, resolve_state_dir(cli.state_dir)?, verbose, format, units),
        Command::Metrics {
            height,
            weight,
            goal,
            age,
            gender,
            units,
            json,
        } => run_metrics(
            MetricsArgs {
                height,
                weight,
                goal,
                age,
                gender,
                units: units.unwrap_or(config.default_unit_system),
            },
            json,
        ),
        Command::Validate { answers, quiz } => run_validate(answers, quiz),
        Command::Questions { json } => run_questions(json),
        Command::Reset => run_reset(&config, resolve_state_dir(cli.state_dir)?),
    }
}

/// Logs go to stderr so they never mix with quiz output. `RUST_LOG` overrides the default.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(path: Option<PathBuf>) -> CliResult<QuizConfig> {
    let path = path.or_else(|| env::var_os(CONFIG_ENV).map(PathBuf::from));
    match path {
        Some(path) => {
            let contents = fs::read_to_string(&path)
                .map_err(|err| format!("failed to read config {}: {}", path.display(), err))?;
            let config = QuizConfig::from_json_str(&contents)?;
            debug!(path = %path.display(), "loaded config");
            Ok(config)
        }
        None => Ok(QuizConfig::default()),
    }
}

fn resolve_state_dir(dir: Option<PathBuf>) -> CliResult<PathBuf> {
    match dir.or_else(|| env::var_os(STATE_DIR_ENV).map(PathBuf::from)) {
        Some(dir) => Ok(dir),
        None => Ok(env::current_dir()?),
    }
}

fn run_quiz(
    config: QuizConfig,
    state_dir: PathBuf,
    verbose: bool,
    format: RenderMode,
    units: Option<UnitSystem>,
) -> CliResult<()> {
    let store = JsonFileStore::new(state_dir, config.storage_key.clone());
    let resumed = store.load().ok().flatten().is_some();
    let mut session = QuizSession::open(fitness_quiz()?, store, config);
    if let Some(units) = units {
        session.set_unit_system(units);
    }
    let mut presenter = QuizPresenter::new(Verbosity::from_verbose(verbose));
    info!(resumed, "starting quiz");

    loop {
        let payload = build_render_payload(session.engine());
        presenter.show_header(&payload, resumed);
        let Some(question) = payload.question.clone() else {
            println!("No questions to show.");
            return Ok(());
        };
        match format {
            RenderMode::Text => presenter.show_question(&payload),
            RenderMode::Json => presenter.show_json(&render_json_ui(&payload)),
        }

        let Some(line) = read_line("> ")? else {
            println!("Progress saved. Run again to resume.");
            return Ok(());
        };
        let command = line.trim();

        if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
            println!("Progress saved. Run again to resume.");
            return Ok(());
        }
        if command.eq_ignore_ascii_case("back") {
            if session.retreat() == Transition::ExitIntent {
                if confirm("Leave the quiz? Your progress is saved.")? {
                    return Ok(());
                }
                session.dismiss_exit_intent();
            }
            continue;
        }
        if let Some(units) = command.strip_prefix("units ") {
            match units.parse::<UnitSystem>() {
                Ok(units) => session.set_unit_system(units),
                Err(err) => eprintln!("{}", err),
            }
            continue;
        }

        let value = match parse_answer(&question, command) {
            Ok(value) => value,
            Err(err) => {
                presenter.show_parse_error(&err);
                continue;
            }
        };
        let goal_kg = value.as_number();
        let Some(outcome) = session.answer_current(value) else {
            continue;
        };
        if let Some(advisory) = &outcome.advisory {
            presenter.show_advisory(advisory);
        }
        if !outcome.recorded {
            continue;
        }
        if question.id == "goal-weight"
            && let Some(goal_kg) = goal_kg
        {
            let engine = session.engine();
            presenter.show_inline(&goal_weight_advisories(
                goal_kg,
                engine.profile(),
                engine.unit_system(),
            ));
        }
        if outcome.metrics_updated
            && let Some(metrics) = session.engine().metrics()
        {
            presenter.show_metrics_preview(metrics);
        }
        presenter.show_answers(&session.engine().answers().to_json_pretty()?);

        match session.advance() {
            Transition::Completed => break,
            Transition::Blocked => presenter.show_blocked(),
            Transition::Moved { .. } | Transition::ExitIntent => {}
        }
    }

    presenter.show_analyzing();
    thread::sleep(session.config().completion_delay());
    if let Some(summary) = render_summary(session.engine())? {
        println!("{}", summary);
    }

    if checkout_access(session.engine()) == CheckoutAccess::RedirectToStart {
        presenter.show_redirect();
        session.set_step(0);
        return Ok(());
    }

    presenter.show_plans();
    let plan = prompt_plan()?;
    presenter.show_processing();
    thread::sleep(session.config().checkout_delay());
    let request = CheckoutRequest::from_engine(session.engine(), plan);
    let checkout = DemoGateway.create_session(&request)?;
    presenter.show_checkout(&checkout);

    session.mark_success(Instant::now());
    let _ = read_line("Press Enter to finish. ")?;
    // Leaving the success screen clears the quiz even before the reset delay.
    if !session.tick(Instant::now()) {
        session.forget()?;
    }
    Ok(())
}

fn prompt_plan() -> CliResult<Plan> {
    loop {
        let Some(line) = read_line(&format!("Plan [{}]: ", Plan::default().id()))? else {
            return Ok(Plan::default());
        };
        let choice = line.trim();
        if choice.is_empty() {
            return Ok(Plan::default());
        }
        if let Ok(index) = choice.parse::<usize>()
            && (1..=Plan::ALL.len()).contains(&index)
        {
            return Ok(Plan::ALL[index - 1]);
        }
        match choice.parse::<Plan>() {
            Ok(plan) => return Ok(plan),
            Err(err) => eprintln!("{}", err),
        }
    }
}

/// Reads one line from stdin. `None` means stdin is closed.
fn read_line(prompt: &str) -> CliResult<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;
    let mut line = String::new();
    if io::stdin().read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

fn confirm(prompt: &str) -> CliResult<bool> {
    let answer = read_line(&format!("{} [y/N]: ", prompt))?;
    Ok(answer.is_some_and(|answer| matches!(answer.to_lowercase().as_str(), "y" | "yes")))
}

struct MetricsArgs {
    height: String,
    weight: f64,
    goal: Option<f64>,
    age: Option<u32>,
    gender: Option<String>,
    units: UnitSystem,
}

fn run_metrics(args: MetricsArgs, as_json: bool) -> CliResult<()> {
    let units = args.units;
    let height_cm = parse_height(&args.height, units).map_err(|err| err.user_message)?;
    let weight_kg = weight_to_kg(args.weight, units);
    check_height(height_cm)?;
    check_weight(weight_kg)?;
    let gender = match args.gender.as_deref() {
        Some(raw) => Some(Gender::parse(raw).ok_or_else(|| format!("unknown gender '{}'", raw))?),
        None => None,
    };

    let metrics = calculate_health_metrics(&MetricsInput {
        height_cm,
        weight_kg,
        goal_weight_kg: args.goal.map(|goal| weight_to_kg(goal, units)),
        age: args.age,
        gender,
    });

    if as_json {
        println!("{}", serde_json::to_string_pretty(&metrics)?);
    } else {
        print_metrics(&metrics, units);
    }
    Ok(())
}

fn print_metrics(metrics: &HealthMetrics, units: UnitSystem) {
    println!("BMI: {} ({})", metrics.bmi, metrics.bmi_category.as_str());
    println!(
        "Healthy weight range: {} - {}",
        format_weight(f64::from(metrics.healthy_weight_min), units),
        format_weight(f64::from(metrics.healthy_weight_max), units)
    );
    println!("Weight to lose: {} kg", metrics.weight_to_lose);
    println!(
        "Estimated timeline: {} weeks at {} kg per week",
        metrics.estimated_weeks, metrics.weekly_weight_loss
    );
    println!(
        "Goal realistic: {}",
        if metrics.is_goal_realistic { "yes" } else { "no" }
    );
    for warning in &metrics.warnings {
        println!(
            "[{}] {}: {}",
            warning.severity.as_str(),
            warning.title,
            warning.message
        );
    }
}

fn run_validate(answers_path: PathBuf, quiz_path: Option<PathBuf>) -> CliResult<()> {
    let answers_json = fs::read_to_string(answers_path)?;
    let (quiz_id, config_json) = match quiz_path {
        Some(path) => {
            let quiz_json = fs::read_to_string(path)?;
            let quiz: Value = serde_json::from_str(&quiz_json)?;
            let quiz_id = quiz
                .get("id")
                .and_then(Value::as_str)
                .ok_or("quiz definition is missing an id")?
                .to_string();
            (quiz_id, json!({ "quiz_spec_json": quiz_json }).to_string())
        }
        None => (QUIZ_ID.to_string(), String::new()),
    };

    let result = parse_component_result(&validate_answers(&quiz_id, &config_json, &answers_json))?;
    let valid = result["valid"].as_bool().unwrap_or(false);
    println!(
        "Validation result: {}",
        if valid { "valid" } else { "invalid" }
    );
    describe_validation(&result);

    if valid {
        Ok(())
    } else {
        Err("validation failed".into())
    }
}

fn describe_validation(result: &Value) {
    let strings = |key: &str| -> Vec<String> {
        result[key]
            .as_array()
            .map(|values| {
                values
                    .iter()
                    .filter_map(Value::as_str)
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default()
    };

    if let Some(errors) = result["errors"].as_array()
        && !errors.is_empty()
    {
        println!("Errors:");
        for error in errors {
            println!(
                "  {} - {}",
                error["question_id"].as_str().unwrap_or("<unknown>"),
                error["message"].as_str().unwrap_or("")
            );
        }
    }
    let missing = strings("missing_required");
    if !missing.is_empty() {
        println!("Missing required answers: {}", missing.join(", "));
    }
    let unknown = strings("unknown_fields");
    if !unknown.is_empty() {
        println!("Unknown answer fields: {}", unknown.join(", "));
    }
}

fn run_questions(as_json: bool) -> CliResult<()> {
    let quiz = parse_component_result(&describe(QUIZ_ID, ""))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&quiz)?);
        return Ok(());
    }

    println!(
        "{} (v{})",
        quiz["title"].as_str().unwrap_or(QUIZ_ID),
        quiz["version"].as_str().unwrap_or("0.0.0")
    );
    let questions = quiz["questions"].as_array().cloned().unwrap_or_default();
    for (index, question) in questions.iter().enumerate() {
        let mut line = format!(
            "{:>2}. {} ({}) {}",
            index + 1,
            question["id"].as_str().unwrap_or("?"),
            question["type"].as_str().unwrap_or("?"),
            question["title"].as_str().unwrap_or("")
        );
        if let Some(rule) = question.get("conditional_display").filter(|rule| rule.is_object()) {
            let values = rule["values"]
                .as_array()
                .map(|values| {
                    values
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join("/")
                })
                .unwrap_or_default();
            line.push_str(&format!(
                " [shown when {} is {}]",
                rule["question_id"].as_str().unwrap_or("?"),
                values
            ));
        }
        println!("{}", line);
    }
    Ok(())
}

fn run_reset(config: &QuizConfig, state_dir: PathBuf) -> CliResult<()> {
    let mut store = JsonFileStore::new(state_dir, config.storage_key.clone());
    store.clear()?;
    println!("Cleared saved quiz progress at {}", store.path().display());
    Ok(())
}

fn parse_component_result(response: &str) -> CliResult<Value> {
    let value: Value = serde_json::from_str(response)?;
    if let Some(error) = value.get("error").and_then(Value::as_str) {
        Err(error.into())
    } else {
        Ok(value)
    }
}
