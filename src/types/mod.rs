//! Type definitions module
//!
//! Entity identity, capability sets and the message keys exchanged with the
//! feedback and interface collaborators.

pub mod entity;
pub mod messages;

// Re-export commonly used types
pub use entity::{Capability, EntityId, Instrument};
pub use messages::{MessageKey, UiKey};
