//! Eye examination diagnosis
//!
//! Each flag is an independent read-only probe. Eye damage is reported only
//! for the partial band `0 < magnitude < threshold`; at the threshold the
//! eyes are permanently blind and that shows up through the separate
//! permanent-blindness condition instead.

use serde::Serialize;

use crate::exam::ports::ConditionProbe;
use crate::types::{Capability, EntityId};

/// Eye damage magnitude at which blindness becomes permanent
pub const PERMANENT_BLINDNESS_THRESHOLD: u32 = 6;

/// Immutable result of one completed examination.
///
/// Serialize-only so `is_healthy` is never read back independently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DiagnosticSnapshot {
    pub subject: EntityId,
    pub is_blind: bool,
    pub is_intoxicated: bool,
    pub has_eye_damage: bool,
    pub is_hallucinating: bool,
    is_healthy: bool,
}

impl DiagnosticSnapshot {
    /// Build a snapshot; `is_healthy` is always derived from the other flags
    pub fn new(
        subject: EntityId,
        is_blind: bool,
        is_intoxicated: bool,
        has_eye_damage: bool,
        is_hallucinating: bool,
    ) -> Self {
        Self {
            subject,
            is_blind,
            is_intoxicated,
            has_eye_damage,
            is_hallucinating,
            is_healthy: !(is_blind || is_intoxicated || has_eye_damage || is_hallucinating),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.is_healthy
    }

    /// Short human summary, e.g. `intoxicated, eye damage`
    pub fn summary(&self) -> String {
        if self.is_healthy {
            return "healthy".to_string();
        }
        let mut findings = Vec::new();
        if self.is_blind {
            findings.push("blind");
        }
        if self.is_intoxicated {
            findings.push("intoxicated");
        }
        if self.has_eye_damage {
            findings.push("eye damage");
        }
        if self.is_hallucinating {
            findings.push("hallucinating");
        }
        findings.join(", ")
    }
}

/// Reads condition flags off a subject
pub struct DiagnosticEvaluator<'a> {
    probe: &'a dyn ConditionProbe,
    blindness_threshold: u32,
}

impl<'a> DiagnosticEvaluator<'a> {
    pub fn new(probe: &'a dyn ConditionProbe) -> Self {
        Self::with_threshold(probe, PERMANENT_BLINDNESS_THRESHOLD)
    }

    pub fn with_threshold(probe: &'a dyn ConditionProbe, blindness_threshold: u32) -> Self {
        Self {
            probe,
            blindness_threshold,
        }
    }

    /// `None` unless the subject has both eyes and a damageable body
    pub fn evaluate(&self, subject: EntityId) -> Option<DiagnosticSnapshot> {
        if !self.probe.has(subject, Capability::EYES)
            || !self.probe.has(subject, Capability::DAMAGEABLE)
        {
            return None;
        }

        let blind = self.probe.has(subject, Capability::PERMANENT_BLINDNESS);
        let drunk = self.probe.has(subject, Capability::DRUNK);
        let eye_damage = self
            .probe
            .eye_damage(subject)
            .map(|magnitude| magnitude > 0 && magnitude < self.blindness_threshold)
            .unwrap_or(false);
        let seeing_rainbows = self.probe.has(subject, Capability::SEEING_RAINBOWS);

        Some(DiagnosticSnapshot::new(
            subject,
            blind,
            drunk,
            eye_damage,
            seeing_rainbows,
        ))
    }
}
