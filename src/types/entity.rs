//! Entity identity and capability sets
//!
//! The surrounding simulation owns all entities. The examination core only
//! ever sees an [`EntityId`] plus whatever capability queries the condition
//! probe answers for it.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Opaque handle to a simulation entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u64);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u64> for EntityId {
    fn from(raw: u64) -> Self {
        EntityId(raw)
    }
}

bitflags! {
    /// Behavioural traits an entity may carry.
    ///
    /// | Capability | Meaning |
    /// |------------|---------|
    /// | [`MOB_STATE`](Self::MOB_STATE) | living creature with vital state |
    /// | [`EYES`](Self::EYES) | has eyes that can be examined |
    /// | [`DAMAGEABLE`](Self::DAMAGEABLE) | can take damage / wounds |
    /// | [`PERMANENT_BLINDNESS`](Self::PERMANENT_BLINDNESS) | permanently blind |
    /// | [`DRUNK`](Self::DRUNK) | intoxicated |
    /// | [`SEEING_RAINBOWS`](Self::SEEING_RAINBOWS) | hallucinating |
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct Capability: u16 {
        const MOB_STATE           = 0b0000_0001;
        const EYES                = 0b0000_0010;
        const DAMAGEABLE          = 0b0000_0100;
        const PERMANENT_BLINDNESS = 0b0000_1000;
        const DRUNK               = 0b0001_0000;
        const SEEING_RAINBOWS     = 0b0010_0000;
    }
}

impl Capability {
    /// Baseline for an ordinary living, examinable creature.
    pub const CREATURE: Self = Self::MOB_STATE.union(Self::EYES).union(Self::DAMAGEABLE);

    /// Parse a single capability from its lowercase scenario spelling.
    ///
    /// Distinct from the generated `from_name`, which takes the constant
    /// names (`MOB_STATE`) and knows nothing of `creature`.
    pub fn from_scenario_name(name: &str) -> Option<Self> {
        match name {
            "mob_state" => Some(Self::MOB_STATE),
            "eyes" => Some(Self::EYES),
            "damageable" => Some(Self::DAMAGEABLE),
            "permanent_blindness" => Some(Self::PERMANENT_BLINDNESS),
            "drunk" => Some(Self::DRUNK),
            "seeing_rainbows" => Some(Self::SEEING_RAINBOWS),
            "creature" => Some(Self::CREATURE),
            _ => None,
        }
    }
}

/// The diagnostic device as seen by the examination core.
///
/// `charge_per_use` is opaque to the core; only the power collaborator
/// interprets it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instrument {
    pub id: EntityId,
    pub light_enabled: bool,
    pub exam_duration: Duration,
    pub charge_per_use: u32,
}

impl Instrument {
    pub fn new(id: EntityId, exam_duration: Duration) -> Self {
        Self {
            id,
            light_enabled: true,
            exam_duration,
            charge_per_use: 1,
        }
    }
}
