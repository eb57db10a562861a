//! Property-based tests for diagnosis and gating rules.

use std::time::Duration;

use penlight::exam::{
    DiagnosticEvaluator, DiagnosticSnapshot, InteractEvent, PreconditionValidator, Rejection,
    SkillOutcome, SkillRoll, PERMANENT_BLINDNESS_THRESHOLD,
};
use penlight::sim::{EntityRecord, SimWorld};
use penlight::types::{Capability, EntityId, Instrument};
use proptest::prelude::*;

const SUBJECT: EntityId = EntityId(2);

fn subject_world(caps: Capability, eye_damage: Option<u32>) -> SimWorld {
    let world = SimWorld::new();
    let mut record = EntityRecord::new("subject", caps);
    record.eye_damage = eye_damage;
    world.add_entity(SUBJECT, record);
    world
}

proptest! {
    /// Healthy exactly when no finding is present.
    #[test]
    fn healthy_is_derived(
        blind in any::<bool>(),
        drunk in any::<bool>(),
        damaged in any::<bool>(),
        rainbows in any::<bool>(),
    ) {
        let snapshot = DiagnosticSnapshot::new(SUBJECT, blind, drunk, damaged, rainbows);
        prop_assert_eq!(snapshot.is_healthy(), !(blind || drunk || damaged || rainbows));
        prop_assert_eq!(snapshot.summary() == "healthy", snapshot.is_healthy());
    }

    /// Eye damage is reported only strictly between zero and the threshold.
    #[test]
    fn eye_damage_band(magnitude in 0u32..20) {
        let world = subject_world(Capability::CREATURE, Some(magnitude));
        let snapshot = DiagnosticEvaluator::new(&world).evaluate(SUBJECT);

        prop_assert!(snapshot.is_some());
        let expected = magnitude > 0 && magnitude < PERMANENT_BLINDNESS_THRESHOLD;
        prop_assert_eq!(snapshot.map(|s| s.has_eye_damage), Some(expected));
    }

    /// Flags read straight off the subject's capabilities.
    #[test]
    fn flags_follow_capabilities(bits in 0u16..64) {
        let caps = Capability::from_bits_truncate(bits);
        let world = subject_world(caps, None);
        let snapshot = DiagnosticEvaluator::new(&world).evaluate(SUBJECT);

        if caps.contains(Capability::EYES | Capability::DAMAGEABLE) {
            let snapshot = snapshot.unwrap();
            prop_assert_eq!(snapshot.is_blind, caps.contains(Capability::PERMANENT_BLINDNESS));
            prop_assert_eq!(snapshot.is_intoxicated, caps.contains(Capability::DRUNK));
            prop_assert_eq!(snapshot.is_hallucinating, caps.contains(Capability::SEEING_RAINBOWS));
            prop_assert!(!snapshot.has_eye_damage);
        } else {
            prop_assert!(snapshot.is_none());
        }
    }

    /// Only passing rolls proceed, whatever the crit flags say.
    #[test]
    fn gate_follows_passed(
        passed in any::<bool>(),
        crit_success in any::<bool>(),
        crit_failure in any::<bool>(),
    ) {
        let outcome = SkillOutcome::classify(SkillRoll::new(passed, crit_success, crit_failure));
        prop_assert_eq!(outcome.proceeds(), passed);
    }

    /// Aiming at yourself never gets past validation.
    #[test]
    fn self_exam_never_validates(id in 1u64..1000, battery in 1u32..5) {
        let user = EntityId(id);
        let pen = Instrument::new(EntityId(id + 1000), Duration::from_secs(1));
        let world = SimWorld::new();
        world.add_entity(user, EntityRecord::new("user", Capability::CREATURE));
        world.add_instrument(pen.clone(), battery, true);

        let validator = PreconditionValidator::new(&world, &world);
        let result = validator.validate(&pen, &InteractEvent::new(pen.id, user, user));
        prop_assert_eq!(result, Err(Rejection::SelfExam));
    }
}
