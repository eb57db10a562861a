//! Scenario simulation
//!
//! Stands in for the host game world: an entity store implementing every
//! collaborator trait, a seedable dice skill checker, TOML scenario scripts
//! and a tick driver.

pub mod driver;
pub mod scenario;
pub mod skill;
pub mod world;

pub use driver::{Driver, RunReport, TimelineEntry};
pub use scenario::{Action, Scenario, Step};
pub use skill::DiceSkillChecker;
pub use world::{EntityRecord, Popup, SimWorld, UiDelivery};
