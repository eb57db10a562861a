//! Precondition checks run before any skill roll
//!
//! Checks run in a fixed order and stop at the first failure. Only the
//! light-off and self-examination rejections produce feedback; every other
//! rejection leaves the interaction for other handlers.

use std::fmt;

use crate::exam::ports::{ConditionProbe, InteractEvent, PowerSource};
use crate::types::{Capability, EntityId, Instrument, MessageKey};

/// Why an examination request was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Rejection {
    /// Another handler already consumed the interaction
    AlreadyHandled,
    /// Event was addressed to a different instrument
    WrongInstrument,
    /// Interaction carried no target entity
    NoTarget,
    /// Target outside interaction range
    OutOfReach,
    /// Target is not a creature with vital state
    NotAMob,
    /// Instrument cannot draw its charge right now
    NoCharge,
    /// Instrument light is switched off
    LightOff,
    /// User aimed the instrument at themselves
    SelfExam,
}

impl Rejection {
    /// Popup to show for this rejection, if any
    pub fn feedback(&self) -> Option<MessageKey> {
        match self {
            Rejection::LightOff => Some(MessageKey::PenlightOff),
            Rejection::SelfExam => Some(MessageKey::CannotExamineSelf),
            _ => None,
        }
    }

    /// Whether the interaction counts as consumed.
    ///
    /// Feedback rejections consume the interaction so unrelated handlers do
    /// not also fire on the same click.
    pub fn consumes_interaction(&self) -> bool {
        self.feedback().is_some()
    }
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Rejection::AlreadyHandled => "already handled",
            Rejection::WrongInstrument => "wrong instrument",
            Rejection::NoTarget => "no target",
            Rejection::OutOfReach => "out of reach",
            Rejection::NotAMob => "target has no mob state",
            Rejection::NoCharge => "insufficient charge",
            Rejection::LightOff => "light off",
            Rejection::SelfExam => "self examination",
        };
        f.write_str(name)
    }
}

/// Stateless predicate layer over the power and condition collaborators
pub struct PreconditionValidator<'a> {
    power: &'a dyn PowerSource,
    probe: &'a dyn ConditionProbe,
}

impl<'a> PreconditionValidator<'a> {
    pub fn new(power: &'a dyn PowerSource, probe: &'a dyn ConditionProbe) -> Self {
        Self { power, probe }
    }

    /// Validate an interaction, returning the subject on success
    pub fn validate(
        &self,
        instrument: &Instrument,
        event: &InteractEvent,
    ) -> std::result::Result<EntityId, Rejection> {
        if event.handled {
            return Err(Rejection::AlreadyHandled);
        }
        if event.instrument != instrument.id {
            return Err(Rejection::WrongInstrument);
        }
        let subject = event.target.ok_or(Rejection::NoTarget)?;
        if !event.can_reach {
            return Err(Rejection::OutOfReach);
        }

        if !self.probe.has(subject, Capability::MOB_STATE) {
            return Err(Rejection::NotAMob);
        }
        if !self.power.has_draw_charge(instrument.id, event.user) {
            return Err(Rejection::NoCharge);
        }

        if !instrument.light_enabled {
            return Err(Rejection::LightOff);
        }
        if event.user == subject {
            return Err(Rejection::SelfExam);
        }

        Ok(subject)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::time::Duration;

    struct FixedPower(bool);

    impl PowerSource for FixedPower {
        fn has_draw_charge(&self, _instrument: EntityId, _user: EntityId) -> bool {
            self.0
        }
    }

    struct Caps(HashMap<EntityId, Capability>);

    impl ConditionProbe for Caps {
        fn has(&self, entity: EntityId, capability: Capability) -> bool {
            self.0
                .get(&entity)
                .map(|c| c.contains(capability))
                .unwrap_or(false)
        }

        fn eye_damage(&self, _entity: EntityId) -> Option<u32> {
            None
        }
    }

    const PEN: EntityId = EntityId(1);
    const DOC: EntityId = EntityId(2);
    const PATIENT: EntityId = EntityId(3);

    fn world() -> Caps {
        let mut caps = HashMap::new();
        caps.insert(DOC, Capability::CREATURE);
        caps.insert(PATIENT, Capability::CREATURE);
        Caps(caps)
    }

    fn pen() -> Instrument {
        Instrument::new(PEN, Duration::from_secs(3))
    }

    #[test]
    fn test_accepts_valid_request() {
        let power = FixedPower(true);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);
        let event = InteractEvent::new(PEN, DOC, PATIENT);
        assert_eq!(validator.validate(&pen(), &event), Ok(PATIENT));
    }

    #[test]
    fn test_prefilters_short_circuit() {
        let power = FixedPower(true);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);

        let mut event = InteractEvent::new(PEN, DOC, PATIENT);
        event.handled = true;
        assert_eq!(validator.validate(&pen(), &event), Err(Rejection::AlreadyHandled));

        let mut event = InteractEvent::new(PEN, DOC, PATIENT);
        event.target = None;
        assert_eq!(validator.validate(&pen(), &event), Err(Rejection::NoTarget));

        let mut event = InteractEvent::new(PEN, DOC, PATIENT);
        event.can_reach = false;
        assert_eq!(validator.validate(&pen(), &event), Err(Rejection::OutOfReach));
    }

    #[test]
    fn test_non_mob_rejected_silently() {
        let power = FixedPower(true);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);
        let event = InteractEvent::new(PEN, DOC, EntityId(99));

        let rejection = validator.validate(&pen(), &event).unwrap_err();
        assert_eq!(rejection, Rejection::NotAMob);
        assert!(rejection.feedback().is_none());
        assert!(!rejection.consumes_interaction());
    }

    #[test]
    fn test_no_charge_checked_before_light() {
        let power = FixedPower(false);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);
        let mut instrument = pen();
        instrument.light_enabled = false;

        let event = InteractEvent::new(PEN, DOC, PATIENT);
        assert_eq!(validator.validate(&instrument, &event), Err(Rejection::NoCharge));
    }

    #[test]
    fn test_light_off_has_feedback() {
        let power = FixedPower(true);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);
        let mut instrument = pen();
        instrument.light_enabled = false;

        // Light check precedes the self check.
        let event = InteractEvent::new(PEN, DOC, DOC);
        let rejection = validator.validate(&instrument, &event).unwrap_err();
        assert_eq!(rejection, Rejection::LightOff);
        assert_eq!(rejection.feedback(), Some(MessageKey::PenlightOff));
        assert!(rejection.consumes_interaction());
    }

    #[test]
    fn test_self_exam_rejected() {
        let power = FixedPower(true);
        let caps = world();
        let validator = PreconditionValidator::new(&power, &caps);
        let event = InteractEvent::new(PEN, DOC, DOC);

        let rejection = validator.validate(&pen(), &event).unwrap_err();
        assert_eq!(rejection, Rejection::SelfExam);
        assert_eq!(rejection.feedback(), Some(MessageKey::CannotExamineSelf));
    }
}
