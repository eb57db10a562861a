//! Dice-based skill checks
//!
//! d20 + skill level against a difficulty class. A natural 20 always passes
//! critically and a natural 1 always fails critically. Scenario steps can
//! queue forced rolls that are consumed before any dice are thrown.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::sync::Mutex;

use crate::exam::ports::SkillChecker;
use crate::exam::skill::{SkillKind, SkillRoll};
use crate::sim::world::SimWorld;
use crate::types::EntityId;

/// Default difficulty class for a first aid check
pub const DEFAULT_DC: i32 = 10;

/// Seedable d20 skill checker
pub struct DiceSkillChecker {
    world: SimWorld,
    rng: Mutex<StdRng>,
    forced: Mutex<VecDeque<SkillRoll>>,
    dc: i32,
}

impl DiceSkillChecker {
    pub fn new(world: SimWorld, seed: u64) -> Self {
        Self {
            world,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            forced: Mutex::new(VecDeque::new()),
            dc: DEFAULT_DC,
        }
    }

    pub fn with_dc(mut self, dc: i32) -> Self {
        self.dc = dc;
        self
    }

    /// Queue a roll to be returned by the next check
    pub fn force(&self, roll: SkillRoll) {
        self.forced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push_back(roll);
    }

    /// Interpret a natural d20 result for a given skill level
    pub fn judge(&self, natural: i32, level: i32) -> SkillRoll {
        match natural {
            20 => SkillRoll::new(true, true, false),
            1 => SkillRoll::new(false, false, true),
            n => SkillRoll::new(n + level >= self.dc, false, false),
        }
    }
}

impl SkillChecker for DiceSkillChecker {
    fn try_skill_check(&self, user: EntityId, _skill: SkillKind) -> SkillRoll {
        let forced = self
            .forced
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .pop_front();
        if let Some(roll) = forced {
            return roll;
        }

        let natural = self
            .rng
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .gen_range(1..=20);
        self.judge(natural, self.world.skill_level(user))
    }
}
