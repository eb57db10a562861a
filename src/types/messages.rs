//! Message keys for user-visible feedback and interface channels
//!
//! Keys are localization identifiers; rendering them into text belongs to
//! the feedback collaborator.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Localized popup shown to the examining user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKey {
    /// Instrument light is switched off
    PenlightOff,

    /// User aimed the instrument at themselves
    CannotExamineSelf,

    SkillCriticalFailure,
    SkillFailure,
    SkillSuccess,
    SkillCriticalSuccess,
}

impl MessageKey {
    /// Localization identifier
    pub fn loc_id(&self) -> &'static str {
        match self {
            MessageKey::PenlightOff => "penlight-off",
            MessageKey::CannotExamineSelf => "penlight-cannot-examine-self",
            MessageKey::SkillCriticalFailure => "healing-skill-critical-failure",
            MessageKey::SkillFailure => "healing-skill-failure",
            MessageKey::SkillSuccess => "healing-skill-success",
            MessageKey::SkillCriticalSuccess => "healing-skill-critical-success",
        }
    }

    /// Fallback English text, used when no localization table is loaded
    pub fn default_text(&self) -> &'static str {
        match self {
            MessageKey::PenlightOff => "The pen light is off.",
            MessageKey::CannotExamineSelf => "You can't examine your own eyes.",
            MessageKey::SkillCriticalFailure => "You completely botch the examination!",
            MessageKey::SkillFailure => "You fumble the examination.",
            MessageKey::SkillSuccess => "You begin the examination.",
            MessageKey::SkillCriticalSuccess => "You begin a flawless examination.",
        }
    }
}

impl fmt::Display for MessageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.loc_id())
    }
}

/// Interface channel hosted by an instrument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UiKey {
    PenLight,
}

impl fmt::Display for UiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiKey::PenLight => f.write_str("penlight"),
        }
    }
}
