//! Examination session state machine
//!
//! A session is created per accepted request and lives only while pending:
//! - Safety: Completed and Cancelled are terminal, no event leaves them
//! - At-most-once: a terminal session rejects every further event
//! - Determinism: unique next state per (state, event)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use uuid::Uuid;

use crate::errors::{ExamError, Result};
use crate::types::{EntityId, Instrument};

/// Session identifier
pub type SessionId = Uuid;

/// Session lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionStatus {
    /// Timer running, interruptible
    Pending,

    /// Timer elapsed without interruption (terminal)
    Completed,

    /// Interrupted before the timer elapsed (terminal)
    Cancelled,
}

/// What broke a pending session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Interruption {
    /// User changed position
    Moved,
    /// User changed what they are holding
    HandChanged,
    /// User can no longer manipulate the instrument
    GripLost,
    /// Cancelled by request
    Explicit,
}

impl fmt::Display for Interruption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Interruption::Moved => "moved",
            Interruption::HandChanged => "hand changed",
            Interruption::GripLost => "grip lost",
            Interruption::Explicit => "cancelled",
        };
        f.write_str(name)
    }
}

/// Events that drive a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    /// Exam duration has passed
    Elapsed,

    /// Something broke the session
    Interrupted(Interruption),
}

impl SessionStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Cancelled)
    }

    /// Attempt a state transition
    ///
    /// Valid transitions:
    /// 1. Pending → Completed (on: Elapsed)
    /// 2. Pending → Cancelled (on: Interrupted)
    pub fn transition(&self, event: SessionEvent) -> Result<SessionStatus> {
        use SessionStatus::*;

        match (self, event) {
            (Pending, SessionEvent::Elapsed) => Ok(Completed),
            (Pending, SessionEvent::Interrupted(_)) => Ok(Cancelled),
            (from, event) => Err(ExamError::InvalidTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
                reason: "session already finished".to_string(),
            }),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            SessionStatus::Pending => "Pending",
            SessionStatus::Completed => "Completed",
            SessionStatus::Cancelled => "Cancelled",
        }
    }
}

/// Request handed to the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionDescriptor {
    pub user: EntityId,
    pub subject: EntityId,
    pub instrument: EntityId,
    pub duration: Duration,
    pub break_on_move: bool,
    pub break_on_hand_change: bool,
    pub block_duplicate: bool,
    pub need_hand: bool,
}

impl SessionDescriptor {
    /// Descriptor for an eye exam: every interruption flag set
    pub fn exam(user: EntityId, subject: EntityId, instrument: &Instrument) -> Self {
        Self {
            user,
            subject,
            instrument: instrument.id,
            duration: instrument.exam_duration,
            break_on_move: true,
            break_on_hand_change: true,
            block_duplicate: true,
            need_hand: true,
        }
    }

    /// Duplicate-block key
    pub fn triple(&self) -> (EntityId, EntityId, EntityId) {
        (self.user, self.instrument, self.subject)
    }
}

/// Receipt for a started session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionHandle {
    pub id: SessionId,
}

/// One in-flight examination
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSession {
    pub id: SessionId,
    pub descriptor: SessionDescriptor,
    /// Scheduler clock at start
    pub started_at: Duration,
    status: SessionStatus,
}

impl ExamSession {
    pub fn new(descriptor: SessionDescriptor, started_at: Duration) -> Self {
        Self {
            id: Uuid::new_v4(),
            descriptor,
            started_at,
            status: SessionStatus::Pending,
        }
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn user(&self) -> EntityId {
        self.descriptor.user
    }

    pub fn subject(&self) -> EntityId {
        self.descriptor.subject
    }

    pub fn instrument(&self) -> EntityId {
        self.descriptor.instrument
    }

    /// Scheduler time at which the session completes
    pub fn due_at(&self) -> Duration {
        self.started_at + self.descriptor.duration
    }

    /// Whether `interruption` breaks this session under its descriptor flags
    pub fn breaks_on(&self, interruption: Interruption) -> bool {
        match interruption {
            Interruption::Moved => self.descriptor.break_on_move,
            Interruption::HandChanged => self.descriptor.break_on_hand_change,
            Interruption::GripLost => self.descriptor.need_hand,
            Interruption::Explicit => true,
        }
    }

    /// Apply an event, moving the session along its state machine
    pub fn apply(&mut self, event: SessionEvent) -> Result<SessionStatus> {
        self.status = self.status.transition(event)?;
        Ok(self.status)
    }
}

/// Terminal notification for one session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub session: ExamSession,
    /// Set when something else already consumed the completion
    pub handled: bool,
    pub interruption: Option<Interruption>,
}

impl SessionOutcome {
    pub fn status(&self) -> SessionStatus {
        self.session.status()
    }

    pub fn is_cancelled(&self) -> bool {
        self.status() == SessionStatus::Cancelled
    }
}
