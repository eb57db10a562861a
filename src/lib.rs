//! penlight - pen light eye examinations
//!
//! A user aims a pen light at a creature. After a skill check and a timed,
//! interruptible examination, a diagnostic snapshot of the subject's eyes is
//! delivered to the user's interface.
//!
//! # Architecture
//!
//! - **exam**: validation, skill gate, sessions, diagnosis, delivery
//! - **sim**: in-memory world and scenario driver
//! - **telemetry**: event counters for a run
//! - **cli**: arguments and configuration

pub mod cli;
pub mod errors;
pub mod exam;
pub mod sim;
pub mod telemetry;
pub mod types;

// Re-export commonly used types
pub use errors::{ExamError, Result};
pub use exam::{ExamOrchestrator, InteractOutcome, CompletionOutcome};
pub use types::{Capability, EntityId, Instrument};
