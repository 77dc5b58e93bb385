//! Doubles and a launch harness for desktop bootstrap tests.

use std::ffi::OsString;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kestrel_config::{Environment, LogOptions, Platform};
use kestrel_shell::bridge::{LoggingNotificationSurface, ShellMessage, ShellResponse};
use kestrel_shell::process::{ShutdownError, ShutdownSignal};
use kestrel_shell::runtime::{BridgeRuntimeError, HeadlessRuntime, ShellLaunch, ShellRuntime};
use kestrel_shell::{BootstrapPlan, LogInstaller, run_desktop_with};
use kestreld::telemetry::{LogHandle, TelemetryError};
use kestreld::testing::RecordingBackend;
use kestreld::{DirectoryQuery, StorageLocator, StructuredHealthReporter};
use tempfile::TempDir;

static ENV_LOCK: Mutex<()> = Mutex::new(());

const OVERRIDE_VARS: [&str; 2] = ["KESTREL_HOMEPAGE", "KESTREL_INIT_ONLY"];

/// Query that never yields a directory.
pub struct NoDirectories;

impl DirectoryQuery for NoDirectories {
    fn candidates(&self, _vendor: &str, _app: &str) -> Vec<PathBuf> {
        Vec::new()
    }
}

/// Query rooted in a temporary directory.
pub struct TempDirectories {
    root: PathBuf,
}

impl DirectoryQuery for TempDirectories {
    fn candidates(&self, vendor: &str, app: &str) -> Vec<PathBuf> {
        vec![self.root.join(vendor).join(app)]
    }
}

/// Installer returning a ring that no subscriber feeds.
pub struct DetachedLogs;

impl LogInstaller for DetachedLogs {
    fn install(&self, options: &LogOptions) -> Result<LogHandle, TelemetryError> {
        Ok(LogHandle::detached(options.ring_capacity))
    }
}

/// Signal that has already fired.
pub struct ImmediateShutdown;

impl ShutdownSignal for ImmediateShutdown {
    fn wait(&self) -> Result<(), ShutdownError> {
        Ok(())
    }
}

/// Runtime for a host without a GUI.
///
/// It keeps the launch it was handed, ready hook included, for as long as the
/// bootstrap keeps the runtime.
#[derive(Default)]
pub struct UnavailableRuntime {
    retained: Option<ShellLaunch>,
}

impl ShellRuntime for UnavailableRuntime {
    fn run(&mut self, launch: ShellLaunch) -> Result<(), BridgeRuntimeError> {
        self.retained = Some(launch);
        Err(BridgeRuntimeError::Unavailable {
            message: "no display".to_owned(),
        })
    }
}

/// What a bootstrap run left behind.
pub struct LaunchOutcome {
    pub exit: ExitCode,
    pub stderr: String,
    pub homepage: Option<String>,
    pub responses: Vec<ShellResponse>,
    pub backend: RecordingBackend,
}

/// Builder for one bootstrap run over test doubles.
pub struct Launch {
    args: Vec<OsString>,
    storage_available: bool,
    backend: RecordingBackend,
    script: Vec<ShellMessage>,
    shutdown: Arc<dyn ShutdownSignal>,
    home: TempDir,
    _env: MutexGuard<'static, ()>,
}

impl Launch {
    pub fn new() -> Self {
        let env = ENV_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
        // Runs hold the lock, so no other test observes the removal.
        for var in OVERRIDE_VARS {
            unsafe { std::env::remove_var(var) };
        }
        Self {
            args: vec![OsString::from("kestrel-desktop")],
            storage_available: true,
            backend: RecordingBackend::default(),
            script: Vec::new(),
            shutdown: Arc::new(ImmediateShutdown),
            home: TempDir::new().expect("temporary home"),
            _env: env,
        }
    }

    pub fn arg(&mut self, arg: impl Into<OsString>) -> &mut Self {
        self.args.push(arg.into());
        self
    }

    pub fn without_storage(&mut self) -> &mut Self {
        self.storage_available = false;
        self
    }

    pub fn send(&mut self, message: ShellMessage) -> &mut Self {
        self.script.push(message);
        self
    }

    pub fn shutdown(&mut self, signal: Arc<dyn ShutdownSignal>) -> &mut Self {
        self.shutdown = signal;
        self
    }

    pub fn backend(&self) -> &RecordingBackend {
        &self.backend
    }

    /// Runs over a headless runtime that records the window it opens.
    pub fn run(&mut self) -> LaunchOutcome {
        let runtime = HeadlessRuntime::new().with_script(std::mem::take(&mut self.script));
        let record = runtime.record();
        let mut outcome = self.run_with(runtime);
        outcome.homepage = record.homepage();
        outcome.responses = record.session().responses;
        outcome
    }

    /// Runs over `runtime`; the outcome records no window.
    pub fn run_with<R: ShellRuntime>(&mut self, runtime: R) -> LaunchOutcome {
        let environment = Environment::new(Some(self.home.path().to_path_buf()), Platform::Linux);
        let mut stderr = Vec::new();

        let exit = if self.storage_available {
            let query = TempDirectories {
                root: self.home.path().join("data"),
            };
            run_desktop_with(self.plan(StorageLocator::new(query), runtime, environment), &mut stderr)
        } else {
            run_desktop_with(
                self.plan(StorageLocator::new(NoDirectories), runtime, environment),
                &mut stderr,
            )
        };

        LaunchOutcome {
            exit,
            stderr: String::from_utf8(stderr).expect("stderr is UTF-8"),
            homepage: None,
            responses: Vec::new(),
            backend: self.backend.clone(),
        }
    }

    fn plan<Q: DirectoryQuery, R: ShellRuntime>(
        &self,
        storage: StorageLocator<Q>,
        runtime: R,
        environment: Environment,
    ) -> BootstrapPlan<Q, RecordingBackend, R> {
        BootstrapPlan {
            args: self.args.clone(),
            environment,
            storage,
            logs: Box::new(DetachedLogs),
            backend: self.backend.clone(),
            runtime,
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: Arc::clone(&self.shutdown),
            surface: Arc::new(LoggingNotificationSurface),
            router: None,
        }
    }
}
