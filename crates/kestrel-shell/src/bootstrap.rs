//! Desktop bootstrap sequencing.
//!
//! [`run_desktop`] brings the process up in a fixed order: storage root,
//! launch overrides and configuration, diagnostics, daemon, then the GUI
//! shell. Every failure before the shell starts is fatal and produces exactly
//! one diagnostic line on stderr naming the failing component. A GUI failure
//! is logged and the process keeps the daemon serving until a termination
//! signal arrives.

use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;
use std::sync::{Arc, Mutex, PoisonError};
use std::thread;

use kestrel_config::{
    ConfigAssemblyError, Environment, LaunchOverrides, LogOptions, StorageIdentity, assemble,
};
use kestreld::telemetry::{self, LogHandle, TelemetryError};
use kestreld::{
    Backend, Daemon, DaemonError, DirectoryQuery, EventSubscription, HealthReporter, LocalBackend,
    PlatformDirectoryQuery, StartupContext, StorageError, StorageLocator,
    StructuredHealthReporter,
};
use ortho_config::{OrthoConfig, OrthoError};
use thiserror::Error;

use crate::bridge::{
    ForwarderHandle, GuiDispatcher, LoggingNotificationSurface, MessageRouter, NotificationDriver,
    NotificationSurface, ShellBridge,
};
use crate::process::{ShutdownError, ShutdownSignal, SystemShutdownSignal};
use crate::runtime::{HeadlessRuntime, ReadyHook, ShellLaunch, ShellRuntime};

const BOOTSTRAP_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::bootstrap");

/// Errors that abort the bootstrap.
#[derive(Debug, Error)]
pub enum BootstrapError {
    /// The storage root could not be resolved.
    #[error(transparent)]
    Storage {
        /// Locator error.
        #[from]
        source: StorageError,
    },
    /// Launch overrides failed to load.
    #[error("failed to load launch overrides: {source}")]
    Overrides {
        /// Loader error.
        #[source]
        source: Arc<OrthoError>,
    },
    /// The assembled configuration is invalid.
    #[error(transparent)]
    Config {
        /// Validation error.
        #[from]
        source: ConfigAssemblyError,
    },
    /// The log subsystem could not start.
    #[error(transparent)]
    Logging {
        /// Telemetry error.
        #[from]
        source: TelemetryError,
    },
    /// The daemon failed a lifecycle operation.
    #[error(transparent)]
    Daemon {
        /// Lifecycle error.
        #[from]
        source: DaemonError,
    },
    /// Waiting for a termination signal failed.
    #[error(transparent)]
    Signal {
        /// Listener error.
        #[from]
        source: ShutdownError,
    },
}

impl BootstrapError {
    /// Component named in the stderr diagnostic.
    #[must_use]
    pub const fn component(&self) -> &'static str {
        match self {
            Self::Storage { .. } => "storage",
            Self::Overrides { .. } | Self::Config { .. } => "config",
            Self::Logging { .. } => "logging",
            Self::Daemon { .. } => "daemon",
            Self::Signal { .. } => "signals",
        }
    }

    /// Single-line diagnostic written to stderr.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        let message = self.to_string();
        let flattened: Vec<&str> = message
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .collect();
        format!("kestrel-desktop: {}: {}", self.component(), flattened.join(" "))
    }
}

/// Installs the log subsystem.
pub trait LogInstaller {
    /// Configures diagnostics and returns the handle.
    ///
    /// # Errors
    ///
    /// Returns a [`TelemetryError`] when the subsystem cannot start.
    fn install(&self, options: &LogOptions) -> Result<LogHandle, TelemetryError>;
}

/// Installer setting the process-wide default subscriber.
#[derive(Debug, Default, Clone, Copy)]
pub struct GlobalLogInstaller;

impl LogInstaller for GlobalLogInstaller {
    fn install(&self, options: &LogOptions) -> Result<LogHandle, TelemetryError> {
        telemetry::initialise(options)
    }
}

/// Collaborators injected into the bootstrap.
pub struct BootstrapPlan<Q, B, R> {
    /// Command-line arguments, program name first.
    pub args: Vec<OsString>,
    /// Captured host environment.
    pub environment: Environment,
    /// Storage root resolver.
    pub storage: StorageLocator<Q>,
    /// Log subsystem installer.
    pub logs: Box<dyn LogInstaller>,
    /// Daemon backend.
    pub backend: B,
    /// GUI runtime.
    pub runtime: R,
    /// Lifecycle observer.
    pub reporter: Arc<dyn HealthReporter>,
    /// Termination signal source.
    pub shutdown: Arc<dyn ShutdownSignal>,
    /// Notification presenter.
    pub surface: Arc<dyn NotificationSurface>,
    /// Fallback router for shell messages.
    pub router: Option<Arc<dyn MessageRouter>>,
}

impl BootstrapPlan<PlatformDirectoryQuery, LocalBackend, HeadlessRuntime> {
    /// Production collaborators.
    #[must_use]
    pub fn production(args: Vec<OsString>) -> Self {
        Self {
            args,
            environment: Environment::capture(),
            storage: StorageLocator::platform(),
            logs: Box::new(GlobalLogInstaller),
            backend: LocalBackend::keyring(),
            runtime: HeadlessRuntime::new(),
            reporter: Arc::new(StructuredHealthReporter::new()),
            shutdown: Arc::new(SystemShutdownSignal::new()),
            surface: Arc::new(LoggingNotificationSurface),
            router: None,
        }
    }
}

/// Runs the desktop process with the production collaborators.
pub fn run_desktop<I>(args: I, stderr: &mut dyn Write) -> ExitCode
where
    I: IntoIterator<Item = OsString>,
{
    run_desktop_with(BootstrapPlan::production(args.into_iter().collect()), stderr)
}

/// Runs the desktop process with injected collaborators.
pub fn run_desktop_with<Q, B, R>(plan: BootstrapPlan<Q, B, R>, stderr: &mut dyn Write) -> ExitCode
where
    Q: DirectoryQuery,
    B: Backend,
    R: ShellRuntime,
{
    match launch(plan) {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            tracing::error!(
                target: BOOTSTRAP_TARGET,
                component = error.component(),
                error = %error,
                "desktop bootstrap failed"
            );
            if let Err(write_error) = writeln!(stderr, "{}", error.diagnostic()) {
                tracing::warn!(target: BOOTSTRAP_TARGET, error = %write_error, "stderr unavailable");
            }
            ExitCode::FAILURE
        }
    }
}

fn launch<Q, B, R>(plan: BootstrapPlan<Q, B, R>) -> Result<(), BootstrapError>
where
    Q: DirectoryQuery,
    B: Backend,
    R: ShellRuntime,
{
    let BootstrapPlan {
        args,
        environment,
        storage,
        logs,
        backend,
        mut runtime,
        reporter,
        shutdown,
        surface,
        router,
    } = plan;

    let identity = StorageIdentity::default();
    let storage_root = storage.resolve(&identity.vendor, &identity.app)?;

    let overrides = LaunchOverrides::load_from_iter(args)
        .map_err(|source| BootstrapError::Overrides { source })?;
    let config = assemble(&overrides, &environment);
    config.validate()?;

    let log = logs.install(config.log())?;
    tracing::info!(
        target: BOOTSTRAP_TARGET,
        storage = %storage_root.display(),
        homepage = %config.window().homepage,
        platform = %environment.platform(),
        "kestrel desktop starting"
    );

    let mut daemon = Daemon::new(backend, reporter, log.clone());
    daemon.set_storage_path(&storage_root)?;
    let ctx = StartupContext::new();
    daemon.initialize(&ctx, config.daemon())?;

    if config.daemon().init_only {
        tracing::info!(target: BOOTSTRAP_TARGET, "init-only run, shutting down");
        daemon.shutdown(&ctx)?;
        return Ok(());
    }
    daemon.serve()?;

    let bridge = Arc::new(ShellBridge::new(daemon.status(), log).with_router(router));
    let forwarder = Arc::new(Mutex::new(None));
    let subscription = Arc::new(Mutex::new(daemon.take_subscription()));
    let on_ready = ready_hook(
        NotificationDriver::new(surface),
        Arc::clone(&subscription),
        Arc::clone(&forwarder),
        Arc::clone(&shutdown),
    );
    let launch = ShellLaunch {
        window: config.window().clone(),
        bridge,
        on_ready,
    };

    match runtime.run(launch) {
        Ok(()) => tracing::info!(target: BOOTSTRAP_TARGET, "shell exited"),
        Err(error) => {
            tracing::error!(
                target: BOOTSTRAP_TARGET,
                error = %error,
                "shell failed to start, serving until a termination signal arrives"
            );
            release_subscription(&subscription);
            shutdown.wait()?;
        }
    }

    daemon.shutdown(&ctx)?;
    drop(daemon);
    let handle = forwarder
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .take();
    if let Some(handle) = handle {
        match handle.join() {
            Ok(forwarded) => {
                tracing::debug!(target: BOOTSTRAP_TARGET, forwarded, "notification forwarder done");
            }
            Err(error) => {
                tracing::warn!(target: BOOTSTRAP_TARGET, %error, "notification forwarder failed");
            }
        }
    }
    tracing::info!(target: BOOTSTRAP_TARGET, "shutdown sequence completed");
    Ok(())
}

type SharedSubscription = Arc<Mutex<Option<EventSubscription>>>;

fn take_subscription(slot: &SharedSubscription) -> Option<EventSubscription> {
    slot.lock().unwrap_or_else(PoisonError::into_inner).take()
}

/// Closes the event bus when no shell will ever drain it.
///
/// The runtime may keep the unused ready hook alive, so the subscription is
/// dropped here rather than with the hook. Publishers then see
/// [`kestreld::events::EventBusClosed`] instead of queueing events forever.
fn release_subscription(slot: &SharedSubscription) {
    if let Some(subscription) = take_subscription(slot) {
        drop(subscription);
        tracing::debug!(target: BOOTSTRAP_TARGET, "notification bus closed");
    }
}

fn ready_hook(
    driver: NotificationDriver,
    subscription: SharedSubscription,
    forwarder: Arc<Mutex<Option<ForwarderHandle>>>,
    shutdown: Arc<dyn ShutdownSignal>,
) -> ReadyHook {
    Box::new(move |dispatcher: Arc<dyn GuiDispatcher>| {
        if let Some(subscription) = take_subscription(&subscription) {
            match driver.install(subscription, Arc::clone(&dispatcher)) {
                Ok(handle) => {
                    *forwarder.lock().unwrap_or_else(PoisonError::into_inner) = Some(handle);
                }
                Err(error) => {
                    tracing::warn!(target: BOOTSTRAP_TARGET, %error, "notifications disabled");
                }
            }
        }
        watch_for_quit(shutdown, dispatcher);
    })
}

fn watch_for_quit(shutdown: Arc<dyn ShutdownSignal>, dispatcher: Arc<dyn GuiDispatcher>) {
    let spawned = thread::Builder::new()
        .name("kestrel-signals".to_owned())
        .spawn(move || match shutdown.wait() {
            Ok(()) => {
                if dispatcher.request_quit().is_err() {
                    tracing::debug!(target: BOOTSTRAP_TARGET, "shell already closed");
                }
            }
            Err(error) => {
                tracing::warn!(target: BOOTSTRAP_TARGET, %error, "signal listener failed");
            }
        });
    if let Err(error) = spawned {
        tracing::warn!(target: BOOTSTRAP_TARGET, %error, "failed to spawn signal listener");
    }
}
