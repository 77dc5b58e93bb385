//! Single-threaded runtime without a window system.
//!
//! Runs the dispatch loop on the caller's thread, answers a scripted list of
//! shell messages after the ready hook, and records what happened so callers
//! can inspect the session afterwards.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use kestrel_config::{Platform, WindowSpec};

use crate::bridge::{BridgeError, GuiDispatcher, GuiTask, ShellMessage, ShellResponse};

use super::{BridgeRuntimeError, ShellLaunch, ShellRuntime};

const RUNTIME_TARGET: &str = concat!(env!("CARGO_PKG_NAME"), "::runtime");

enum Command {
    Run(GuiTask),
    Quit,
}

struct HeadlessDispatcher {
    sender: Sender<Command>,
}

impl GuiDispatcher for HeadlessDispatcher {
    fn dispatch(&self, task: GuiTask) -> Result<(), BridgeError> {
        self.sender
            .send(Command::Run(task))
            .map_err(|_| BridgeError::DispatcherClosed)
    }

    fn request_quit(&self) -> Result<(), BridgeError> {
        self.sender
            .send(Command::Quit)
            .map_err(|_| BridgeError::DispatcherClosed)
    }
}

/// Observations from a headless session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HeadlessSession {
    /// Window that was opened.
    pub window: Option<WindowSpec>,
    /// Whether the ready hook ran.
    pub ready: bool,
    /// Replies to the scripted messages, in order.
    pub responses: Vec<ShellResponse>,
    /// Number of dispatched tasks executed.
    pub tasks_run: usize,
    /// Whether the loop exited because quit was requested.
    pub quit_requested: bool,
}

/// Shared view of a [`HeadlessRuntime`]'s session.
#[derive(Debug, Clone, Default)]
pub struct HeadlessRecord {
    session: Arc<Mutex<HeadlessSession>>,
}

impl HeadlessRecord {
    /// Copies the session observed so far.
    #[must_use]
    pub fn session(&self) -> HeadlessSession {
        self.lock().clone()
    }

    /// Homepage of the opened window.
    #[must_use]
    pub fn homepage(&self) -> Option<String> {
        self.lock()
            .window
            .as_ref()
            .map(|window| window.homepage.clone())
    }

    fn lock(&self) -> MutexGuard<'_, HeadlessSession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runtime running the dispatch loop on the caller's thread.
#[derive(Debug, Default)]
pub struct HeadlessRuntime {
    script: Vec<ShellMessage>,
    record: HeadlessRecord,
}

impl HeadlessRuntime {
    /// Builds a runtime with no scripted input.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues messages delivered to the bridge right after the ready hook.
    #[must_use]
    pub fn with_script(mut self, script: Vec<ShellMessage>) -> Self {
        self.script = script;
        self
    }

    /// Handle for inspecting the session.
    #[must_use]
    pub fn record(&self) -> HeadlessRecord {
        self.record.clone()
    }

    fn drain(&self, receiver: &Receiver<Command>) {
        while let Ok(command) = receiver.recv() {
            match command {
                Command::Run(task) => {
                    task();
                    self.record.lock().tasks_run += 1;
                }
                Command::Quit => {
                    self.record.lock().quit_requested = true;
                    tracing::debug!(target: RUNTIME_TARGET, "quit requested");
                    return;
                }
            }
        }
        tracing::debug!(target: RUNTIME_TARGET, "all dispatchers dropped");
    }
}

impl ShellRuntime for HeadlessRuntime {
    fn run(&mut self, launch: ShellLaunch) -> Result<(), BridgeRuntimeError> {
        let ShellLaunch {
            window,
            bridge,
            on_ready,
        } = launch;
        if window.homepage.trim().is_empty() {
            return Err(BridgeRuntimeError::InvalidWindow {
                reason: "homepage is empty".to_owned(),
            });
        }

        tracing::info!(
            target: RUNTIME_TARGET,
            homepage = %window.homepage,
            width = window.geometry.width,
            height = window.geometry.height,
            icon = %window.icon_for(Platform::current()),
            "window opened"
        );
        self.record.lock().window = Some(window);

        let (sender, receiver) = mpsc::channel();
        on_ready(Arc::new(HeadlessDispatcher { sender }));
        self.record.lock().ready = true;

        for message in std::mem::take(&mut self.script) {
            let response = bridge.handle_message(&message);
            self.record.lock().responses.push(response);
        }

        self.drain(&receiver);
        Ok(())
    }
}
