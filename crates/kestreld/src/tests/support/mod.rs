//! Test harness utilities for the daemon lifecycle suites.

mod reporter;
mod world;

pub use crate::testing::RecordingBackend;
pub use reporter::{HealthEvent, RecordingHealthReporter};
pub use world::{TestWorld, world};
