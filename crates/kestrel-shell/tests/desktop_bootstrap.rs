//! End-to-end bootstrap tests over in-memory collaborators.

mod support;

use std::cell::RefCell;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};

use kestrel_shell::bridge::{DAEMON_STATUS_ROUTE, ShellMessage, ShellResponse};
use kestrel_shell::process::{ShutdownError, ShutdownSignal};
use kestreld::testing::RecordingBackend;
use kestreld::{BackendStep, Notification};
use rstest::{fixture, rstest};
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;

use support::{Launch, LaunchOutcome, UnavailableRuntime};

#[rstest]
fn missing_storage_writes_one_diagnostic() {
    let outcome = Launch::new().without_storage().run();

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(
        outcome.stderr,
        "kestrel-desktop: storage: no storage directory found for Kestrel Labs/Kestrel\n"
    );
    assert!(outcome.backend.calls().is_empty());
    assert_eq!(outcome.homepage, None);
}

#[rstest]
#[case::default(None, "index.html")]
#[case::override_long(Some("custom.html"), "custom.html")]
fn opens_the_configured_homepage(#[case] homepage: Option<&str>, #[case] expected: &str) {
    let mut launch = Launch::new();
    if let Some(page) = homepage {
        launch.arg("--homepage").arg(page);
    }

    let outcome = launch.run();

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stderr.is_empty());
    assert_eq!(outcome.homepage.as_deref(), Some(expected));
}

#[rstest]
fn shell_messages_see_a_running_daemon() {
    let outcome = Launch::new()
        .send(ShellMessage::named(DAEMON_STATUS_ROUTE))
        .run();

    assert_eq!(
        outcome.responses,
        vec![ShellResponse::Ok(json!({
            "state": "running",
            "ready": true,
            "log_file": null,
        }))]
    );
}

#[rstest]
fn daemon_failure_rolls_back_and_reports() {
    let mut launch = Launch::new();
    launch.backend().fail_on(BackendStep::Rpc, "address in use");

    let outcome = launch.run();

    assert_eq!(outcome.exit, ExitCode::FAILURE);
    assert_eq!(
        outcome.stderr,
        "kestrel-desktop: daemon: daemon initialisation failed at rpc: \
         daemon step rpc failed: address in use\n"
    );
    assert_eq!(
        outcome.backend.stopped(),
        vec![BackendStep::Network, BackendStep::Database]
    );
}

#[rstest]
fn init_only_launch_stops_the_daemon_without_a_window() {
    let outcome = Launch::new().arg("--init-only").run();

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stderr.is_empty());
    assert_eq!(outcome.homepage, None);
    assert_eq!(
        outcome.backend.started(),
        vec![BackendStep::Database, BackendStep::Network, BackendStep::Rpc]
    );
    assert_eq!(
        outcome.backend.stopped(),
        vec![BackendStep::Rpc, BackendStep::Network, BackendStep::Database]
    );
}

#[rstest]
fn gui_failure_serves_until_shutdown_then_stops_cleanly() {
    let outcome = Launch::new().run_with(UnavailableRuntime::default());

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert!(outcome.stderr.is_empty());
    assert_eq!(outcome.homepage, None);
    assert_eq!(
        outcome.backend.stopped(),
        vec![BackendStep::Rpc, BackendStep::Network, BackendStep::Database]
    );
}

/// Records whether daemon notifications still queue once shutdown is awaited.
struct BusStateAtShutdown {
    backend: RecordingBackend,
    accepted: Arc<Mutex<Option<bool>>>,
}

impl ShutdownSignal for BusStateAtShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        let accepted = self
            .backend
            .network_events()
            .map(|events| events.notify(Notification::new("Peer", "late message")).is_ok());
        *self.accepted.lock().unwrap_or_else(PoisonError::into_inner) = accepted;
        Ok(())
    }
}

#[rstest]
fn gui_failure_closes_the_notification_bus() {
    let mut launch = Launch::new();
    let accepted = Arc::new(Mutex::new(None));
    let signal = BusStateAtShutdown {
        backend: launch.backend().clone(),
        accepted: Arc::clone(&accepted),
    };
    launch.shutdown(Arc::new(signal));

    let outcome = launch.run_with(UnavailableRuntime::default());

    assert_eq!(outcome.exit, ExitCode::SUCCESS);
    assert_eq!(
        *accepted.lock().unwrap_or_else(PoisonError::into_inner),
        Some(false)
    );
}

struct World {
    launch: Launch,
    outcome: Option<LaunchOutcome>,
}

impl World {
    fn outcome(&self) -> &LaunchOutcome {
        self.outcome
            .as_ref()
            .expect("the desktop has not launched")
    }
}

#[fixture]
fn world() -> RefCell<World> {
    RefCell::new(World {
        launch: Launch::new(),
        outcome: None,
    })
}

#[given("a host without a storage directory")]
fn given_no_storage(world: &RefCell<World>) {
    world.borrow_mut().launch.without_storage();
}

#[given("a host with a storage directory")]
fn given_storage(world: &RefCell<World>) {
    assert!(world.borrow().outcome.is_none());
}

#[given("the launch argument \"{flag}\" \"{value}\"")]
fn given_argument(world: &RefCell<World>, flag: String, value: String) {
    world.borrow_mut().launch.arg(flag).arg(value);
}

#[given("the launch flag \"{flag}\"")]
fn given_flag(world: &RefCell<World>, flag: String) {
    world.borrow_mut().launch.arg(flag);
}

#[given("a backend that fails at {step}")]
fn given_backend_failure(world: &RefCell<World>, step: String) {
    let step: BackendStep = step.parse().expect("known daemon step");
    world.borrow().launch.backend().fail_on(step, "intentional test failure");
}

#[when("the desktop launches")]
fn when_launches(world: &RefCell<World>) {
    let mut world = world.borrow_mut();
    let outcome = world.launch.run();
    world.outcome = Some(outcome);
}

#[when("the desktop launches on a host without a display")]
fn when_launches_without_display(world: &RefCell<World>) {
    let mut world = world.borrow_mut();
    let outcome = world.launch.run_with(UnavailableRuntime::default());
    world.outcome = Some(outcome);
}

#[then("the launch fails")]
fn then_fails(world: &RefCell<World>) {
    assert_eq!(world.borrow().outcome().exit, ExitCode::FAILURE);
}

#[then("the launch succeeds")]
fn then_succeeds(world: &RefCell<World>) {
    let world = world.borrow();
    let outcome = world.outcome();
    assert_eq!(
        outcome.exit,
        ExitCode::SUCCESS,
        "stderr was {:?}",
        outcome.stderr
    );
}

#[then("stderr holds one line mentioning \"{text}\"")]
fn then_single_diagnostic(world: &RefCell<World>, text: String) {
    let world = world.borrow();
    let stderr = &world.outcome().stderr;
    let lines: Vec<&str> = stderr.lines().collect();
    assert!(
        matches!(lines.as_slice(), [line] if line.contains(text.as_str())),
        "expected one line mentioning {text:?}, got {stderr:?}"
    );
}

#[then("no daemon step was started")]
fn then_nothing_started(world: &RefCell<World>) {
    assert!(world.borrow().outcome().backend.started().is_empty());
}

#[then("the window opens \"{page}\"")]
fn then_window_opens(world: &RefCell<World>, page: String) {
    assert_eq!(
        world.borrow().outcome().homepage.as_deref(),
        Some(page.as_str())
    );
}

#[then("no window was opened")]
fn then_no_window(world: &RefCell<World>) {
    assert_eq!(world.borrow().outcome().homepage, None);
}

#[then("the steps stopped were \"{steps}\"")]
fn then_steps_stopped(world: &RefCell<World>, steps: String) {
    let expected: Vec<BackendStep> = steps
        .split(',')
        .map(|step| step.parse().expect("known daemon step"))
        .collect();
    assert_eq!(world.borrow().outcome().backend.stopped(), expected);
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 0)]
fn missing_storage_aborts(world: RefCell<World>) {
    let _ = world;
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 1)]
fn default_homepage_opens(world: RefCell<World>) {
    let _ = world;
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 2)]
fn homepage_override_opens(world: RefCell<World>) {
    let _ = world;
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 3)]
fn daemon_failure_aborts(world: RefCell<World>) {
    let _ = world;
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 4)]
fn init_only_launch(world: RefCell<World>) {
    let _ = world;
}

#[scenario(path = "tests/features/desktop_bootstrap.feature", index = 5)]
fn headless_host_keeps_serving(world: RefCell<World>) {
    let _ = world;
}
