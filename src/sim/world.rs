//! In-memory simulation world
//!
//! A small entity store standing in for the host simulation. It answers
//! every world-facing collaborator the examination core needs and records
//! popups and interface traffic so runs can be inspected afterwards.

use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::errors::{ExamError, Result};
use crate::exam::ports::{ConditionProbe, FeedbackSink, HandProbe, PowerSource, UiHost, UiMessage};
use crate::types::{Capability, EntityId, Instrument, MessageKey, UiKey};

/// A creature or object in the world
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRecord {
    pub name: String,
    pub capabilities: Capability,
    /// `None` for entities without blindable eyes
    pub eye_damage: Option<u32>,
    /// Bonus added to skill rolls
    pub skill_level: i32,
    /// Instrument currently in hand
    pub holding: Option<EntityId>,
    /// Restrained users cannot manipulate what they hold
    pub restrained: bool,
}

impl EntityRecord {
    pub fn new(name: impl Into<String>, capabilities: Capability) -> Self {
        let eye_damage = capabilities.contains(Capability::EYES).then_some(0);
        Self {
            name: name.into(),
            capabilities,
            eye_damage,
            skill_level: 0,
            holding: None,
            restrained: false,
        }
    }
}

/// An instrument plus the state the power and UI collaborators care about
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentRecord {
    pub instrument: Instrument,
    pub battery: u32,
    pub hosts_ui: bool,
}

impl UiDelivery {
    /// One-line JSON form of the delivery
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Popup shown to a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Popup {
    pub source: EntityId,
    pub user: EntityId,
    pub key: MessageKey,
}

/// Message pushed over an interface channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UiDelivery {
    pub instrument: EntityId,
    pub key: UiKey,
    pub message: UiMessage,
}

#[derive(Debug, Default)]
struct WorldState {
    entities: HashMap<EntityId, EntityRecord>,
    instruments: HashMap<EntityId, InstrumentRecord>,
    open_ui: HashSet<(EntityId, UiKey, EntityId)>,
    ui_opens: usize,
    popups: Vec<Popup>,
    deliveries: Vec<UiDelivery>,
}

impl WorldState {
    fn entity_mut(&mut self, id: EntityId) -> Result<&mut EntityRecord> {
        self.entities.get_mut(&id).ok_or(ExamError::UnknownEntity(id))
    }

    fn instrument_mut(&mut self, id: EntityId) -> Result<&mut InstrumentRecord> {
        self.instruments
            .get_mut(&id)
            .ok_or(ExamError::UnknownEntity(id))
    }
}

/// Shared handle to the world; clones see the same state
#[derive(Debug, Clone, Default)]
pub struct SimWorld {
    inner: Arc<Mutex<WorldState>>,
}

impl SimWorld {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, WorldState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add_entity(&self, id: EntityId, record: EntityRecord) {
        self.state().entities.insert(id, record);
    }

    pub fn add_instrument(&self, instrument: Instrument, battery: u32, hosts_ui: bool) {
        let id = instrument.id;
        self.state().instruments.insert(
            id,
            InstrumentRecord {
                instrument,
                battery,
                hosts_ui,
            },
        );
    }

    pub fn entity(&self, id: EntityId) -> Option<EntityRecord> {
        self.state().entities.get(&id).cloned()
    }

    /// Snapshot of an instrument's current settings
    pub fn instrument(&self, id: EntityId) -> Option<Instrument> {
        self.state()
            .instruments
            .get(&id)
            .map(|record| record.instrument.clone())
    }

    pub fn name_of(&self, id: EntityId) -> String {
        self.state()
            .entities
            .get(&id)
            .map(|e| e.name.clone())
            .unwrap_or_else(|| id.to_string())
    }

    pub fn skill_level(&self, id: EntityId) -> i32 {
        self.state()
            .entities
            .get(&id)
            .map(|e| e.skill_level)
            .unwrap_or(0)
    }

    /// Put `instrument` in `user`'s hand (or empty it)
    pub fn set_holding(&self, user: EntityId, instrument: Option<EntityId>) -> Result<()> {
        self.state().entity_mut(user)?.holding = instrument;
        Ok(())
    }

    pub fn set_restrained(&self, user: EntityId, restrained: bool) -> Result<()> {
        self.state().entity_mut(user)?.restrained = restrained;
        Ok(())
    }

    pub fn set_light(&self, instrument: EntityId, on: bool) -> Result<()> {
        self.state().instrument_mut(instrument)?.instrument.light_enabled = on;
        Ok(())
    }

    pub fn set_battery(&self, instrument: EntityId, battery: u32) -> Result<()> {
        self.state().instrument_mut(instrument)?.battery = battery;
        Ok(())
    }

    pub fn set_condition(&self, entity: EntityId, capability: Capability, present: bool) -> Result<()> {
        let mut state = self.state();
        let record = state.entity_mut(entity)?;
        record.capabilities.set(capability, present);
        Ok(())
    }

    pub fn set_eye_damage(&self, entity: EntityId, magnitude: u32) -> Result<()> {
        self.state().entity_mut(entity)?.eye_damage = Some(magnitude);
        Ok(())
    }

    /// Popups shown so far
    pub fn popups(&self) -> Vec<Popup> {
        self.state().popups.clone()
    }

    /// Interface messages delivered so far
    pub fn deliveries(&self) -> Vec<UiDelivery> {
        self.state().deliveries.clone()
    }

    /// How many times an interface was opened
    pub fn ui_opens(&self) -> usize {
        self.state().ui_opens
    }
}

impl PowerSource for SimWorld {
    fn has_draw_charge(&self, instrument: EntityId, _user: EntityId) -> bool {
        self.state()
            .instruments
            .get(&instrument)
            .map(|record| record.battery >= record.instrument.charge_per_use)
            .unwrap_or(false)
    }
}

impl ConditionProbe for SimWorld {
    fn has(&self, entity: EntityId, capability: Capability) -> bool {
        self.state()
            .entities
            .get(&entity)
            .map(|e| e.capabilities.contains(capability))
            .unwrap_or(false)
    }

    fn eye_damage(&self, entity: EntityId) -> Option<u32> {
        self.state()
            .entities
            .get(&entity)
            .and_then(|e| e.eye_damage)
    }
}

impl UiHost for SimWorld {
    fn has_ui(&self, instrument: EntityId, _key: UiKey) -> bool {
        self.state()
            .instruments
            .get(&instrument)
            .map(|record| record.hosts_ui)
            .unwrap_or(false)
    }

    fn is_open(&self, instrument: EntityId, key: UiKey, user: EntityId) -> bool {
        self.state().open_ui.contains(&(instrument, key, user))
    }

    fn open_ui(&self, instrument: EntityId, key: UiKey, user: EntityId) {
        let mut state = self.state();
        if state.open_ui.insert((instrument, key, user)) {
            state.ui_opens += 1;
        }
    }

    fn send_message(&self, instrument: EntityId, key: UiKey, message: UiMessage) {
        self.state().deliveries.push(UiDelivery {
            instrument,
            key,
            message,
        });
    }
}

impl FeedbackSink for SimWorld {
    fn show_message(&self, source: EntityId, user: EntityId, key: MessageKey) {
        self.state().popups.push(Popup { source, user, key });
    }
}

impl HandProbe for SimWorld {
    fn can_manipulate(&self, user: EntityId, instrument: EntityId) -> bool {
        self.state()
            .entities
            .get(&user)
            .map(|e| e.holding == Some(instrument) && !e.restrained)
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    const PEN: EntityId = EntityId(10);
    const DOC: EntityId = EntityId(1);

    fn world() -> SimWorld {
        let world = SimWorld::new();
        world.add_entity(DOC, EntityRecord::new("doctor", Capability::CREATURE));
        world.add_instrument(Instrument::new(PEN, Duration::from_secs(3)), 2, true);
        world
    }

    #[test]
    fn test_power_follows_battery() {
        let world = world();
        assert!(world.has_draw_charge(PEN, DOC));
        world.set_battery(PEN, 0).unwrap();
        assert!(!world.has_draw_charge(PEN, DOC));
        assert!(!world.has_draw_charge(EntityId(99), DOC));
    }

    #[test]
    fn test_hand_probe() {
        let world = world();
        assert!(!world.can_manipulate(DOC, PEN));
        world.set_holding(DOC, Some(PEN)).unwrap();
        assert!(world.can_manipulate(DOC, PEN));
        world.set_restrained(DOC, true).unwrap();
        assert!(!world.can_manipulate(DOC, PEN));
    }

    #[test]
    fn test_conditions_toggle() {
        let world = world();
        assert!(!world.has(DOC, Capability::DRUNK));
        world.set_condition(DOC, Capability::DRUNK, true).unwrap();
        assert!(world.has(DOC, Capability::DRUNK));
        assert_eq!(world.eye_damage(DOC), Some(0));
        world.set_eye_damage(DOC, 3).unwrap();
        assert_eq!(world.eye_damage(DOC), Some(3));
    }

    #[test]
    fn test_unknown_entity_errors() {
        let world = world();
        assert!(matches!(
            world.set_light(EntityId(42), false),
            Err(ExamError::UnknownEntity(EntityId(42)))
        ));
    }

    #[test]
    fn test_delivery_json_line() {
        let world = world();
        let snapshot = crate::exam::DiagnosticSnapshot::new(EntityId(2), false, true, false, false);
        world.send_message(PEN, UiKey::PenLight, UiMessage::Diagnostic(snapshot));

        let line = world.deliveries()[0].to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&line).unwrap();
        assert_eq!(value["instrument"], 10);
        assert_eq!(value["message"]["type"], "diagnostic");
        assert_eq!(value["message"]["is_intoxicated"], true);
        assert_eq!(value["message"]["is_healthy"], false);
        assert!(!line.contains('\n'));
    }

    #[test]
    fn test_open_ui_counts_once() {
        let world = world();
        world.open_ui(PEN, UiKey::PenLight, DOC);
        world.open_ui(PEN, UiKey::PenLight, DOC);
        assert_eq!(world.ui_opens(), 1);
        assert!(world.is_open(PEN, UiKey::PenLight, DOC));
    }
}
