//! Bounded in-memory log store.

use std::collections::VecDeque;
use std::fmt::{self, Write as _};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

use super::filter::namespace_of;

/// Fixed-capacity store of formatted log lines.
///
/// The byte total of retained lines never exceeds the capacity. Pushing a
/// line evicts the oldest lines until the new one fits; a line longer than
/// the whole capacity is truncated to it.
#[derive(Debug, Clone)]
pub struct LogRing {
    state: Arc<Mutex<RingState>>,
}

#[derive(Debug)]
struct RingState {
    lines: VecDeque<String>,
    bytes: usize,
    capacity: usize,
}

impl LogRing {
    /// Creates an empty ring holding at most `capacity` bytes.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RingState {
                lines: VecDeque::new(),
                bytes: 0,
                capacity,
            })),
        }
    }

    /// Appends a line, evicting the oldest lines as needed.
    pub fn push(&self, line: impl Into<String>) {
        let mut line = line.into();
        let mut state = self.lock();
        if state.capacity == 0 {
            return;
        }
        if line.len() > state.capacity {
            let mut end = state.capacity;
            while !line.is_char_boundary(end) {
                end -= 1;
            }
            line.truncate(end);
        }

        while state.bytes + line.len() > state.capacity {
            let Some(evicted) = state.lines.pop_front() else {
                break;
            };
            state.bytes -= evicted.len();
        }
        state.bytes += line.len();
        state.lines.push_back(line);
    }

    /// Copies every retained line, oldest first.
    #[must_use]
    pub fn snapshot(&self) -> Vec<String> {
        self.lock().lines.iter().cloned().collect()
    }

    /// Copies the newest `limit` lines, oldest first.
    #[must_use]
    pub fn tail(&self, limit: usize) -> Vec<String> {
        let state = self.lock();
        let skip = state.lines.len().saturating_sub(limit);
        state.lines.iter().skip(skip).cloned().collect()
    }

    /// Number of retained lines.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().lines.len()
    }

    /// Returns `true` when nothing is retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().lines.is_empty()
    }

    /// Bytes currently retained.
    #[must_use]
    pub fn bytes(&self) -> usize {
        self.lock().bytes
    }

    /// Configured capacity in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.lock().capacity
    }

    fn lock(&self) -> MutexGuard<'_, RingState> {
        // A writer panicking mid-push leaves the counters consistent, so keep
        // logging rather than poisoning every later event.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Layer formatting events into a [`LogRing`].
#[derive(Debug, Clone)]
pub(crate) struct RingLayer {
    ring: LogRing,
}

impl RingLayer {
    pub(crate) const fn new(ring: LogRing) -> Self {
        Self { ring }
    }
}

impl<S> Layer<S> for RingLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);

        let timestamp = OffsetDateTime::now_utc()
            .format(&Rfc3339)
            .unwrap_or_default();
        let mut line = format!(
            "{timestamp} {level} {namespace}: {message}",
            level = metadata.level(),
            namespace = namespace_of(metadata.target()),
            message = visitor.message,
        );
        line.push_str(&visitor.fields);
        self.ring.push(line);
    }
}

#[derive(Default)]
struct LineVisitor {
    message: String,
    fields: String,
}

impl Visit for LineVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message.push_str(value);
        } else {
            let _ = write!(self.fields, " {}={value}", field.name());
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn fmt::Debug) {
        if field.name() == "message" {
            let _ = write!(self.message, "{value:?}");
        } else {
            let _ = write!(self.fields, " {}={value:?}", field.name());
        }
    }
}
