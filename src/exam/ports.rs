//! Collaborator interfaces consumed by the examination core
//!
//! Every trait takes `&self`; implementors that need to mutate (UI hosts,
//! feedback sinks, schedulers) keep their state behind a lock. This lets the
//! orchestrator hold plain `Arc<dyn Trait>` handles while the surrounding
//! simulation keeps its own clone of the same world.

use serde::Serialize;

use crate::errors::Result;
use crate::exam::diagnosis::DiagnosticSnapshot;
use crate::exam::session::{SessionDescriptor, SessionHandle};
use crate::exam::skill::{SkillKind, SkillRoll};
use crate::types::{Capability, EntityId, MessageKey, UiKey};

/// Inbound interaction: `user` aimed `instrument` at `target`.
///
/// `can_reach` and `handled` are decided by the interaction system before
/// the event reaches the examination core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InteractEvent {
    pub instrument: EntityId,
    pub user: EntityId,
    pub target: Option<EntityId>,
    pub can_reach: bool,
    pub handled: bool,
}

impl InteractEvent {
    /// Fresh, reachable, unhandled interaction
    pub fn new(instrument: EntityId, user: EntityId, target: EntityId) -> Self {
        Self {
            instrument,
            user,
            target: Some(target),
            can_reach: true,
            handled: false,
        }
    }
}

/// Power/charge accounting for the instrument
pub trait PowerSource: Send + Sync {
    fn has_draw_charge(&self, instrument: EntityId, user: EntityId) -> bool;
}

/// Probability engine behind skill checks
pub trait SkillChecker: Send + Sync {
    fn try_skill_check(&self, user: EntityId, skill: SkillKind) -> SkillRoll;
}

/// Interruption-aware timed scheduler
///
/// Implementations must deliver exactly one terminal outcome per session
/// they accept, and must refuse a descriptor whose duplicate-block triple is
/// already pending.
pub trait ExamScheduler: Send + Sync {
    fn try_start(&self, descriptor: SessionDescriptor) -> Result<SessionHandle>;
}

/// Read-only condition queries against an entity
pub trait ConditionProbe: Send + Sync {
    fn has(&self, entity: EntityId, capability: Capability) -> bool;

    /// Eye damage magnitude; `None` when the entity cannot be blinded at all
    fn eye_damage(&self, entity: EntityId) -> Option<u32>;
}

/// Payload pushed over an instrument's interface channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiMessage {
    Diagnostic(DiagnosticSnapshot),
}

/// Client interface transport
pub trait UiHost: Send + Sync {
    /// Whether `instrument` hosts the interface at all
    fn has_ui(&self, instrument: EntityId, key: UiKey) -> bool;

    fn is_open(&self, instrument: EntityId, key: UiKey, user: EntityId) -> bool;

    fn open_ui(&self, instrument: EntityId, key: UiKey, user: EntityId);

    fn send_message(&self, instrument: EntityId, key: UiKey, message: UiMessage);
}

/// Localized popups
pub trait FeedbackSink: Send + Sync {
    /// Show `key` to `user`, anchored at `source`
    fn show_message(&self, source: EntityId, user: EntityId, key: MessageKey);
}

/// Whether a user can still manipulate a held instrument
pub trait HandProbe: Send + Sync {
    fn can_manipulate(&self, user: EntityId, instrument: EntityId) -> bool;
}
