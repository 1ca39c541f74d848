use assert_cmd::Command;
use predicates::prelude::*;
use std::fs::write;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing_subscriber::prelude::*; // needed for .with()
use tracing_subscriber::{layer::Context, Layer, Registry};

// Nothing listens on port 1, so login fails fast with a connection error.
const UNREACHABLE_HOST: &str = "127.0.0.1:1";

#[test]
fn missing_required_arguments_is_a_usage_error() {
    let mut cmd = Command::cargo_bin("ecs-report").expect("Binary exists");
    cmd.env_remove("ECS_PASSWORD")
        .arg("-H")
        .arg("ecs.local")
        .assert()
        .failure()
        .stderr(predicate::str::contains("--username"));
}

#[test]
fn unreachable_host_exits_one_with_timestamped_message_and_log() {
    let dir = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("ecs-report").expect("Binary exists");

    cmd.current_dir(dir.path())
        .env_remove("ECS_PASSWORD")
        .args(["-H", UNREACHABLE_HOST, "-u", "admin", "-p", "secret", "-f", "report.xlsx"]);

    cmd.assert()
        .code(1)
        .stdout(
            predicate::str::contains("Not able to get token")
                .and(predicate::str::is_match(r"^\d{2}-[A-Z][a-z]{2}-\d{4} \(\d{2}:\d{2}:\d{2}\): ").unwrap()),
        );

    assert!(
        !dir.path().join("report.xlsx").exists(),
        "No workbook is written when login fails"
    );
    let log = std::fs::read_to_string(dir.path().join("ecs-report.log")).expect("log file written");
    assert!(log.contains("INFO"));
    assert!(log.contains("ERROR"));
    assert!(!log.contains("secret"), "password must never be logged");
}

#[test]
fn invalid_tuning_file_exits_one() {
    let dir = tempdir().unwrap();
    let tuning = dir.path().join("tuning.yaml");
    write(&tuning, "max_buckets: 0\n").unwrap();

    let mut cmd = Command::cargo_bin("ecs-report").expect("Binary exists");
    cmd.current_dir(dir.path())
        .args(["-H", UNREACHABLE_HOST, "-u", "admin", "-p", "secret", "-f", "report.xlsx", "-b"])
        .arg("-c")
        .arg(&tuning);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("must be at least 1"));

    let log = std::fs::read_to_string(dir.path().join("ecs-report.log"))
        .expect("config errors are logged to the default log file");
    assert!(log.contains("ERROR"));
    assert!(log.contains("must be at least 1"));
}

#[test]
fn unopenable_log_file_falls_back_to_default_log() {
    let dir = tempdir().unwrap();
    let tuning = dir.path().join("tuning.yaml");
    write(&tuning, "log_file: no-such-dir/ecs.log\n").unwrap();

    let mut cmd = Command::cargo_bin("ecs-report").expect("Binary exists");
    cmd.current_dir(dir.path())
        .env_remove("ECS_PASSWORD")
        .args(["-H", UNREACHABLE_HOST, "-u", "admin", "-p", "secret", "-f", "report.xlsx"])
        .arg("-c")
        .arg(&tuning);

    cmd.assert()
        .code(1)
        .stdout(predicate::str::contains("Failed to open log file"));

    let log = std::fs::read_to_string(dir.path().join("ecs-report.log"))
        .expect("fallback log file written");
    assert!(log.contains("Failed to open log file"));
}

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn run_emits_trace_initialised_and_returns_auth_error() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use clap::Parser;
    use ecs_report::cli::{run, Cli};
    use ecs_report::load_config::load_config;
    use ecs_report_core::error::ReportError;

    let dir = tempdir().unwrap();
    let file = dir.path().join("report.xlsx");
    let cli = Cli::try_parse_from([
        "ecs-report",
        "-H",
        UNREACHABLE_HOST,
        "-u",
        "admin",
        "-p",
        "secret",
        "-f",
        file.to_str().unwrap(),
    ])
    .unwrap();
    let config = load_config(&cli).unwrap();

    let err = run(&config).await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ReportError>(),
        Some(ReportError::Auth(_))
    ));

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
}
