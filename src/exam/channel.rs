//! Delivery of diagnostic snapshots to the user's interface

use tracing::debug;

use crate::exam::diagnosis::DiagnosticSnapshot;
use crate::exam::ports::{UiHost, UiMessage};
use crate::types::{EntityId, UiKey};

/// Pushes results over the instrument's pen light interface
pub struct ResultChannel<'a> {
    ui: &'a dyn UiHost,
    key: UiKey,
}

impl<'a> ResultChannel<'a> {
    pub fn new(ui: &'a dyn UiHost) -> Self {
        Self {
            ui,
            key: UiKey::PenLight,
        }
    }

    /// Open the interface for `user` unless it is already open.
    ///
    /// Returns false when the instrument hosts no such interface.
    pub fn open(&self, instrument: EntityId, user: EntityId) -> bool {
        if !self.ui.has_ui(instrument, self.key) {
            return false;
        }
        if !self.ui.is_open(instrument, self.key, user) {
            self.ui.open_ui(instrument, self.key, user);
        }
        true
    }

    /// Send one snapshot; returns whether a message went out
    pub fn send(&self, instrument: EntityId, user: EntityId, snapshot: DiagnosticSnapshot) -> bool {
        if !self.open(instrument, user) {
            debug!(%instrument, "instrument hosts no diagnostic interface");
            return false;
        }
        self.ui
            .send_message(instrument, self.key, UiMessage::Diagnostic(snapshot));
        true
    }
}
