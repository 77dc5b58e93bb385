//! Behavioural tests for launch override precedence.

use std::cell::RefCell;
use std::ffi::OsString;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use once_cell::sync::Lazy;
use ortho_config::OrthoConfig;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

use kestrel_config::{AppConfig, Environment, LaunchOverrides, Platform, assemble};

static ENV_MUTEX: Lazy<Mutex<()>> = Lazy::new(|| Mutex::new(()));

const HOMEPAGE_VAR: &str = "KESTREL_HOMEPAGE";

struct Harness {
    cli_args: RefCell<Vec<OsString>>,
    previous: Option<OsString>,
    assembled: RefCell<Option<AppConfig>>,
    error: RefCell<Option<String>>,
    _guard: MutexGuard<'static, ()>,
}

impl Harness {
    fn new() -> Self {
        let guard = ENV_MUTEX
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let previous = std::env::var_os(HOMEPAGE_VAR);
        // Scenarios start from a clean slate; `Drop` restores the caller's value.
        unsafe { std::env::remove_var(HOMEPAGE_VAR) };
        Self {
            cli_args: RefCell::new(vec![OsString::from("kestrel-desktop")]),
            previous,
            assembled: RefCell::new(None),
            error: RefCell::new(None),
            _guard: guard,
        }
    }

    fn push_cli_arg(&self, arg: impl Into<OsString>) {
        self.cli_args.borrow_mut().push(arg.into());
    }

    fn load(&self) {
        if self.assembled.borrow().is_some() || self.error.borrow().is_some() {
            return;
        }

        let args = self.cli_args.borrow().clone();
        match LaunchOverrides::load_from_iter(args) {
            Ok(overrides) => {
                let env = Environment::new(Some(PathBuf::from("/home/kes")), Platform::Linux);
                *self.assembled.borrow_mut() = Some(assemble(&overrides, &env));
            }
            Err(error) => {
                *self.error.borrow_mut() = Some(error.to_string());
            }
        }
    }
}

impl Drop for Harness {
    fn drop(&mut self) {
        match self.previous.take() {
            Some(value) => unsafe { std::env::set_var(HOMEPAGE_VAR, value) },
            None => unsafe { std::env::remove_var(HOMEPAGE_VAR) },
        }
    }
}

#[fixture]
fn harness() -> Harness {
    Harness::new()
}

#[given("the environment sets the homepage to \"{homepage}\"")]
fn given_environment_homepage(harness: &Harness, homepage: String) {
    let _ = harness;
    unsafe { std::env::set_var(HOMEPAGE_VAR, homepage) };
}

#[when("the command line sets the homepage to \"{homepage}\"")]
fn when_cli_homepage(harness: &Harness, homepage: String) {
    harness.push_cli_arg("--homepage");
    harness.push_cli_arg(homepage);
}

#[when("the command line requests an init-only launch")]
fn when_cli_init_only(harness: &Harness) {
    harness.push_cli_arg("--init-only");
}

#[when("the overrides load without arguments")]
fn when_load_without_arguments(harness: &Harness) {
    harness.load();
}

#[then("the assembled homepage is \"{homepage}\"")]
fn then_assembled_homepage(harness: &Harness, homepage: String) {
    harness.load();

    if let Some(error) = harness.error.borrow().as_ref() {
        panic!("overrides failed to load: {error}");
    }

    let assembled = harness.assembled.borrow();
    let Some(config) = assembled.as_ref() else {
        panic!("configuration was not assembled");
    };
    assert_eq!(config.window().homepage, homepage);
}

#[then("the daemon is configured to stop after initialisation")]
fn then_init_only(harness: &Harness) {
    harness.load();

    let assembled = harness.assembled.borrow();
    let Some(config) = assembled.as_ref() else {
        panic!("configuration was not assembled");
    };
    assert!(config.daemon().init_only);
}

#[then("the daemon is configured to keep serving")]
fn then_keeps_serving(harness: &Harness) {
    harness.load();

    let assembled = harness.assembled.borrow();
    let Some(config) = assembled.as_ref() else {
        panic!("configuration was not assembled");
    };
    assert!(!config.daemon().init_only);
}

#[scenario(path = "tests/features/launch_overrides.feature", index = 0)]
fn defaults_apply(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/launch_overrides.feature", index = 1)]
fn environment_overrides_default(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/launch_overrides.feature", index = 2)]
fn command_line_beats_environment(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[scenario(path = "tests/features/launch_overrides.feature", index = 3)]
fn init_only_flag_applies(#[from(harness)] harness: Harness) {
    let _ = harness;
}

#[test]
fn program_name_alone_loads_defaults() {
    let _guard = ENV_MUTEX
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    let previous = std::env::var_os(HOMEPAGE_VAR);
    unsafe { std::env::remove_var(HOMEPAGE_VAR) };

    let loaded = LaunchOverrides::load_from_iter([OsString::from("kestrel-desktop")]);

    if let Some(value) = previous {
        unsafe { std::env::set_var(HOMEPAGE_VAR, value) };
    }
    let overrides = loaded.expect("an empty launch should load the defaults");
    assert_eq!(overrides, LaunchOverrides::default());
}
