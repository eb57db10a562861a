//! Scenario scripts
//!
//! A scenario declares entities and instruments, then a timeline of actions
//! keyed by simulation time in milliseconds:
//!
//! ```toml
//! name = "drunk patient"
//!
//! [[entity]]
//! id = 1
//! name = "doctor"
//! capabilities = ["creature"]
//! skill = 4
//! holding = 10
//!
//! [[instrument]]
//! id = 10
//! duration_ms = 2000
//!
//! [[step]]
//! at_ms = 0
//! action = "interact"
//! user = 1
//! instrument = 10
//! target = 2
//! roll = "success"
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::cli::config::Config;
use crate::errors::{ExamError, Result};
use crate::exam::skill::SkillRoll;
use crate::sim::world::{EntityRecord, SimWorld};
use crate::types::{Capability, EntityId, Instrument};

/// Full scenario file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub name: String,

    #[serde(default, rename = "entity")]
    pub entities: Vec<EntitySpec>,

    #[serde(default, rename = "instrument")]
    pub instruments: Vec<InstrumentSpec>,

    #[serde(default, rename = "step")]
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntitySpec {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub capabilities: Vec<String>,
    #[serde(default)]
    pub skill: i32,
    pub eye_damage: Option<u32>,
    pub holding: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstrumentSpec {
    pub id: u64,
    /// Falls back to the configured default
    pub duration_ms: Option<u64>,
    #[serde(default = "default_true")]
    pub light: bool,
    #[serde(default = "default_battery")]
    pub battery: u32,
    #[serde(default = "default_true")]
    pub ui: bool,
}

fn default_true() -> bool {
    true
}

fn default_battery() -> u32 {
    10
}

/// Timed action
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    pub at_ms: u64,
    #[serde(flatten)]
    pub action: Action,
}

impl Step {
    pub fn at(&self) -> Duration {
        Duration::from_millis(self.at_ms)
    }
}

/// Forced skill check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ForcedRoll {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl ForcedRoll {
    pub fn to_roll(self) -> SkillRoll {
        match self {
            ForcedRoll::CriticalFailure => SkillRoll::new(false, false, true),
            ForcedRoll::Failure => SkillRoll::new(false, false, false),
            ForcedRoll::Success => SkillRoll::new(true, false, false),
            ForcedRoll::CriticalSuccess => SkillRoll::new(true, true, false),
        }
    }
}

/// Things that can happen in a scenario
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    Interact {
        user: u64,
        instrument: u64,
        target: Option<u64>,
        #[serde(default = "default_true")]
        can_reach: bool,
        roll: Option<ForcedRoll>,
    },
    Move {
        user: u64,
    },
    SwapHands {
        user: u64,
        /// New item in hand; empty hand when absent
        holding: Option<u64>,
    },
    Restrain {
        user: u64,
        restrained: bool,
    },
    ToggleLight {
        instrument: u64,
        on: bool,
    },
    SetBattery {
        instrument: u64,
        battery: u32,
    },
    SetCondition {
        entity: u64,
        capability: String,
        present: bool,
    },
    SetEyeDamage {
        entity: u64,
        magnitude: u32,
    },
}

impl Scenario {
    /// Load and validate a scenario file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse and validate scenario TOML
    pub fn parse(contents: &str) -> Result<Self> {
        let scenario: Scenario = toml::from_str(contents)
            .map_err(|e| ExamError::ScenarioError(format!("Failed to parse scenario: {}", e)))?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Check ids, references, capability names and step order
    pub fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for id in self
            .entities
            .iter()
            .map(|e| e.id)
            .chain(self.instruments.iter().map(|i| i.id))
        {
            if !ids.insert(id) {
                return Err(ExamError::ScenarioError(format!("Duplicate id: {}", id)));
            }
        }
        let entities: HashSet<u64> = self.entities.iter().map(|e| e.id).collect();
        let instruments: HashSet<u64> = self.instruments.iter().map(|i| i.id).collect();

        let need_entity = |id: u64| -> Result<()> {
            if entities.contains(&id) {
                Ok(())
            } else {
                Err(ExamError::ScenarioError(format!("Unknown entity: {}", id)))
            }
        };
        let need_instrument = |id: u64| -> Result<()> {
            if instruments.contains(&id) {
                Ok(())
            } else {
                Err(ExamError::ScenarioError(format!("Unknown instrument: {}", id)))
            }
        };

        for entity in &self.entities {
            for name in &entity.capabilities {
                parse_capability(name)?;
            }
            if let Some(held) = entity.holding {
                need_instrument(held)?;
            }
        }

        let mut last = 0;
        for step in &self.steps {
            if step.at_ms < last {
                return Err(ExamError::ScenarioError(format!(
                    "Steps out of order at {}ms",
                    step.at_ms
                )));
            }
            last = step.at_ms;

            match &step.action {
                Action::Interact {
                    user, instrument, ..
                } => {
                    need_entity(*user)?;
                    need_instrument(*instrument)?;
                }
                Action::Move { user } | Action::Restrain { user, .. } => need_entity(*user)?,
                Action::SwapHands { user, holding } => {
                    need_entity(*user)?;
                    if let Some(held) = holding {
                        need_instrument(*held)?;
                    }
                }
                Action::ToggleLight { instrument, .. } | Action::SetBattery { instrument, .. } => {
                    need_instrument(*instrument)?
                }
                Action::SetCondition {
                    entity, capability, ..
                } => {
                    need_entity(*entity)?;
                    parse_capability(capability)?;
                }
                Action::SetEyeDamage { entity, .. } => need_entity(*entity)?,
            }
        }

        Ok(())
    }

    /// Time of the last scripted step
    pub fn end(&self) -> Duration {
        self.steps.last().map(Step::at).unwrap_or_default()
    }

    /// Populate a fresh world from the declarations
    pub fn build_world(&self, config: &Config) -> Result<SimWorld> {
        let world = SimWorld::new();

        for spec in &self.instruments {
            let duration = spec
                .duration_ms
                .map(Duration::from_millis)
                .unwrap_or_else(|| config.default_exam_duration());
            let mut instrument = Instrument::new(EntityId(spec.id), duration);
            instrument.light_enabled = spec.light;
            world.add_instrument(instrument, spec.battery, spec.ui);
        }

        for spec in &self.entities {
            let mut capabilities = Capability::empty();
            for name in &spec.capabilities {
                capabilities |= parse_capability(name)?;
            }
            let mut record = EntityRecord::new(spec.name.clone(), capabilities);
            record.skill_level = spec.skill;
            if spec.eye_damage.is_some() {
                record.eye_damage = spec.eye_damage;
            }
            record.holding = spec.holding.map(EntityId);
            world.add_entity(EntityId(spec.id), record);
        }

        Ok(world)
    }
}

pub(crate) fn parse_capability(name: &str) -> Result<Capability> {
    Capability::from_scenario_name(name)
        .ok_or_else(|| ExamError::ScenarioError(format!("Unknown capability: {}", name)))
}
