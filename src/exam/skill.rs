//! Skill gate: one external roll, four outcome tiers
//!
//! Mapping from the raw roll:
//!
//! | passed | crit_success | crit_failure | tier |
//! |--------|--------------|--------------|------|
//! | false  | -            | true         | CriticalFailure |
//! | false  | -            | false        | Failure |
//! | true   | true         | -            | CriticalSuccess |
//! | true   | false        | -            | Success |

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::exam::ports::{FeedbackSink, SkillChecker};
use crate::types::{EntityId, MessageKey};

/// Skill consulted by a check
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkillKind {
    FirstAid,
}

impl fmt::Display for SkillKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillKind::FirstAid => f.write_str("first_aid"),
        }
    }
}

/// Raw answer from the probability collaborator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SkillRoll {
    pub passed: bool,
    pub crit_success: bool,
    pub crit_failure: bool,
}

impl SkillRoll {
    pub fn new(passed: bool, crit_success: bool, crit_failure: bool) -> Self {
        Self {
            passed,
            crit_success,
            crit_failure,
        }
    }
}

/// Classified skill check result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkillOutcome {
    CriticalFailure,
    Failure,
    Success,
    CriticalSuccess,
}

impl SkillOutcome {
    /// Classify a raw roll. Crit flags only count on the matching side.
    pub fn classify(roll: SkillRoll) -> Self {
        match (roll.passed, roll.crit_success, roll.crit_failure) {
            (false, _, true) => SkillOutcome::CriticalFailure,
            (false, _, false) => SkillOutcome::Failure,
            (true, true, _) => SkillOutcome::CriticalSuccess,
            (true, false, _) => SkillOutcome::Success,
        }
    }

    /// Whether the examination goes on to the timed session
    pub fn proceeds(&self) -> bool {
        matches!(self, SkillOutcome::Success | SkillOutcome::CriticalSuccess)
    }

    pub fn message_key(&self) -> MessageKey {
        match self {
            SkillOutcome::CriticalFailure => MessageKey::SkillCriticalFailure,
            SkillOutcome::Failure => MessageKey::SkillFailure,
            SkillOutcome::Success => MessageKey::SkillSuccess,
            SkillOutcome::CriticalSuccess => MessageKey::SkillCriticalSuccess,
        }
    }
}

impl fmt::Display for SkillOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SkillOutcome::CriticalFailure => "critical failure",
            SkillOutcome::Failure => "failure",
            SkillOutcome::Success => "success",
            SkillOutcome::CriticalSuccess => "critical success",
        };
        f.write_str(name)
    }
}

/// Rolls a skill check and reports the tier to the user
pub struct SkillGate<'a> {
    checker: &'a dyn SkillChecker,
    feedback: &'a dyn FeedbackSink,
    skill: SkillKind,
}

impl<'a> SkillGate<'a> {
    pub fn new(checker: &'a dyn SkillChecker, feedback: &'a dyn FeedbackSink, skill: SkillKind) -> Self {
        Self {
            checker,
            feedback,
            skill,
        }
    }

    /// Roll once and show exactly one popup for the resulting tier
    pub fn attempt(&self, instrument: EntityId, user: EntityId) -> SkillOutcome {
        let roll = self.checker.try_skill_check(user, self.skill);
        let outcome = SkillOutcome::classify(roll);
        self.feedback.show_message(instrument, user, outcome.message_key());
        outcome
    }
}
