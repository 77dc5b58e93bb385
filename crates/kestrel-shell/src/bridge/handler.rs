//! Inbound message handling.
//!
//! Every message is answered without blocking. Until the daemon reports it is
//! initialised the handler answers [`ShellResponse::NotReady`]; afterwards the
//! built-in routes run first and anything else goes to the optional
//! [`MessageRouter`].

use std::sync::Arc;

use kestreld::{DaemonStatus, LogHandle};
use serde_json::{Value, json};

use super::message::{ShellMessage, ShellResponse};
use super::BRIDGE_TARGET;

/// Route reporting the daemon state.
pub const DAEMON_STATUS_ROUTE: &str = "daemon.status";
/// Route returning the newest retained log lines.
pub const LOGS_TAIL_ROUTE: &str = "logs.tail";

/// Adapter forwarding messages to the daemon's API.
pub trait MessageRouter: Send + Sync {
    /// Answers `message`, or returns `None` for names it does not know.
    fn route(&self, message: &ShellMessage) -> Option<ShellResponse>;
}

/// Message handler bound to the shell window.
#[derive(Clone)]
pub struct ShellBridge {
    status: DaemonStatus,
    log: LogHandle,
    router: Option<Arc<dyn MessageRouter>>,
}

impl ShellBridge {
    /// Builds a handler over the daemon status watch and the log subsystem.
    #[must_use]
    pub fn new(status: DaemonStatus, log: LogHandle) -> Self {
        Self {
            status,
            log,
            router: None,
        }
    }

    /// Installs the fallback router.
    #[must_use]
    pub fn with_router(mut self, router: Option<Arc<dyn MessageRouter>>) -> Self {
        self.router = router;
        self
    }

    /// Answers one inbound message.
    #[must_use]
    pub fn handle_message(&self, message: &ShellMessage) -> ShellResponse {
        if !self.status.is_ready() {
            tracing::debug!(
                target: BRIDGE_TARGET,
                name = %message.name,
                state = %self.status.state(),
                "message received before daemon is ready"
            );
            return ShellResponse::NotReady;
        }

        match message.name.as_str() {
            DAEMON_STATUS_ROUTE => self.daemon_status(),
            LOGS_TAIL_ROUTE => self.logs_tail(&message.payload),
            _ => self
                .router
                .as_ref()
                .and_then(|router| router.route(message))
                .unwrap_or_else(|| {
                    tracing::warn!(target: BRIDGE_TARGET, name = %message.name, "unknown message");
                    ShellResponse::error(format!("unknown message '{}'", message.name))
                }),
        }
    }

    /// Parses a raw envelope, answers it and serialises the reply.
    ///
    /// Malformed input yields an error envelope rather than a failure.
    #[must_use]
    pub fn handle_raw(&self, raw: &str) -> String {
        let response = match ShellMessage::parse(raw) {
            Ok(message) => self.handle_message(&message),
            Err(error) => ShellResponse::error(error.to_string()),
        };
        response.to_json().unwrap_or_else(|error| {
            tracing::error!(target: BRIDGE_TARGET, %error, "failed to encode response");
            r#"{"status":"error","payload":"response encoding failed"}"#.to_owned()
        })
    }

    fn daemon_status(&self) -> ShellResponse {
        let state = self.status.state();
        ShellResponse::Ok(json!({
            "state": state.to_string(),
            "ready": state.is_ready(),
            "log_file": self.log.file_path().map(|path| path.display().to_string()),
        }))
    }

    fn logs_tail(&self, payload: &Value) -> ShellResponse {
        let ring = self.log.ring();
        let lines = match payload.get("limit") {
            None | Some(Value::Null) => ring.snapshot(),
            Some(limit) => match limit.as_u64().and_then(|limit| usize::try_from(limit).ok()) {
                Some(limit) => ring.tail(limit),
                None => return ShellResponse::error("limit must be a non-negative integer"),
            },
        };
        ShellResponse::Ok(json!({ "lines": lines }))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use kestrel_config::DaemonConfig;
    use kestreld::testing::RecordingBackend;
    use kestreld::{Daemon, StartupContext, StructuredHealthReporter};
    use rstest::{fixture, rstest};

    use super::*;

    struct StubRouter;

    impl MessageRouter for StubRouter {
        fn route(&self, message: &ShellMessage) -> Option<ShellResponse> {
            (message.name == "wallet.balance").then(|| ShellResponse::Ok(json!({ "sats": 21 })))
        }
    }

    fn daemon(log: &LogHandle) -> Daemon<RecordingBackend> {
        Daemon::new(
            RecordingBackend::default(),
            Arc::new(StructuredHealthReporter::new()),
            log.clone(),
        )
    }

    #[fixture]
    fn ready() -> (Daemon<RecordingBackend>, ShellBridge) {
        let log = LogHandle::detached(1024);
        log.ring().push("first");
        log.ring().push("second");
        log.ring().push("third");
        let mut daemon = daemon(&log);
        daemon
            .set_storage_path(PathBuf::from("/var/lib/kestrel"))
            .expect("storage path");
        daemon
            .initialize(&StartupContext::new(), &DaemonConfig::default())
            .expect("initialise");
        let bridge = ShellBridge::new(daemon.status(), log);
        (daemon, bridge)
    }

    #[test]
    fn answers_not_ready_before_initialisation() {
        let log = LogHandle::detached(1024);
        let daemon = daemon(&log);
        let bridge = ShellBridge::new(daemon.status(), log);

        let response = bridge.handle_message(&ShellMessage::named(DAEMON_STATUS_ROUTE));

        assert_eq!(response, ShellResponse::NotReady);
    }

    #[rstest]
    fn reports_daemon_status(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (_daemon, bridge) = ready;

        let response = bridge.handle_message(&ShellMessage::named(DAEMON_STATUS_ROUTE));

        assert_eq!(
            response,
            ShellResponse::Ok(json!({
                "state": "initialized",
                "ready": true,
                "log_file": null,
            }))
        );
    }

    #[rstest]
    fn becomes_ready_without_rebuilding(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (mut daemon, bridge) = ready;
        daemon.serve().expect("serve");

        let response = bridge.handle_message(&ShellMessage::named(DAEMON_STATUS_ROUTE));

        let ShellResponse::Ok(payload) = response else {
            panic!("expected ok response, got {response:?}");
        };
        assert_eq!(payload["state"], "running");
    }

    #[rstest]
    #[case::everything(Value::Null, vec!["first", "second", "third"])]
    #[case::limited(json!({ "limit": 2 }), vec!["second", "third"])]
    #[case::zero(json!({ "limit": 0 }), Vec::new())]
    fn tails_the_log_ring(
        ready: (Daemon<RecordingBackend>, ShellBridge),
        #[case] payload: Value,
        #[case] expected: Vec<&str>,
    ) {
        let (_daemon, bridge) = ready;

        let response = bridge.handle_message(&ShellMessage::new(LOGS_TAIL_ROUTE, payload));

        assert_eq!(response, ShellResponse::Ok(json!({ "lines": expected })));
    }

    #[rstest]
    #[case::negative(json!({ "limit": -1 }))]
    #[case::text(json!({ "limit": "ten" }))]
    fn rejects_invalid_tail_limit(
        ready: (Daemon<RecordingBackend>, ShellBridge),
        #[case] payload: Value,
    ) {
        let (_daemon, bridge) = ready;

        let response = bridge.handle_message(&ShellMessage::new(LOGS_TAIL_ROUTE, payload));

        assert_eq!(
            response,
            ShellResponse::error("limit must be a non-negative integer")
        );
    }

    #[rstest]
    fn unknown_messages_are_reported(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (_daemon, bridge) = ready;

        let response = bridge.handle_message(&ShellMessage::named("wallet.balance"));

        assert_eq!(
            response,
            ShellResponse::error("unknown message 'wallet.balance'")
        );
    }

    #[rstest]
    fn router_answers_unknown_names(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (_daemon, bridge) = ready;
        let bridge = bridge.with_router(Some(Arc::new(StubRouter)));

        let routed = bridge.handle_message(&ShellMessage::named("wallet.balance"));
        let unrouted = bridge.handle_message(&ShellMessage::named("wallet.send"));

        assert_eq!(routed, ShellResponse::Ok(json!({ "sats": 21 })));
        assert!(!unrouted.is_ok());
    }

    #[rstest]
    fn malformed_raw_input_yields_error_envelope(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (_daemon, bridge) = ready;

        let reply: Value = serde_json::from_str(&bridge.handle_raw("{not json"))
            .expect("reply is JSON");

        assert_eq!(reply["status"], "error");
    }

    #[rstest]
    fn raw_round_trip_answers_status(ready: (Daemon<RecordingBackend>, ShellBridge)) {
        let (_daemon, bridge) = ready;

        let reply: Value = serde_json::from_str(&bridge.handle_raw(r#"{"name":"daemon.status"}"#))
            .expect("reply is JSON");

        assert_eq!(reply["status"], "ok");
        assert_eq!(reply["payload"]["ready"], true);
    }
}
