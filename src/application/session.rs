//! Per-barber session state.
//!
//! Everything the staff screen tracks lives here and is passed explicitly to
//! the render orchestrator: the PIN gate, the current selfie, the chosen
//! style, the kiosk layout flag, the install prompt and the render phase.

use serde::Serialize;

use super::access::AccessGate;
use super::install::InstallPrompt;
use crate::domain::render_jobs::JobId;
use crate::domain::selfie::Selfie;
use crate::domain::styles::{Style, StyleCatalog};

/// Where the current submission is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum RenderPhase {
    Idle,
    Submitting,
    Polling { job_id: JobId },
    Delivering,
    Failed { message: String },
}

impl RenderPhase {
    /// A render is underway and the send/clear actions are disabled.
    pub fn is_busy(&self) -> bool {
        matches!(
            self,
            RenderPhase::Submitting | RenderPhase::Polling { .. } | RenderPhase::Delivering
        )
    }
}

/// Grid shape of the staff screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub panels: u8,
    pub style_columns: u8,
    pub action_columns: u8,
}

impl Layout {
    pub const STANDARD: Layout = Layout {
        panels: 2,
        style_columns: 2,
        action_columns: 3,
    };

    /// Single column, larger targets for a counter tablet.
    pub const KIOSK: Layout = Layout {
        panels: 1,
        style_columns: 1,
        action_columns: 1,
    };
}

#[derive(Debug)]
pub struct Session {
    access: AccessGate,
    selfie: Option<Selfie>,
    style_id: String,
    kiosk: bool,
    install: InstallPrompt,
    phase: RenderPhase,
}

impl Session {
    pub fn new(access: AccessGate, catalog: &StyleCatalog) -> Self {
        Self {
            access,
            selfie: None,
            style_id: catalog.first().id.to_string(),
            kiosk: false,
            install: InstallPrompt::new(),
            phase: RenderPhase::Idle,
        }
    }

    pub fn access(&self) -> &AccessGate {
        &self.access
    }

    pub fn access_mut(&mut self) -> &mut AccessGate {
        &mut self.access
    }

    pub fn unlock(&mut self, candidate: &str) -> bool {
        self.access.unlock(candidate)
    }

    pub fn lock(&mut self) {
        self.access.lock();
    }

    pub fn is_unlocked(&self) -> bool {
        self.access.is_unlocked()
    }

    pub fn selfie(&self) -> Option<&Selfie> {
        self.selfie.as_ref()
    }

    pub fn set_selfie(&mut self, selfie: Selfie) {
        self.selfie = Some(selfie);
    }

    /// Drop the selfie. Refused while a render is running.
    pub fn clear_selfie(&mut self) -> bool {
        if !self.can_clear() {
            return false;
        }
        self.selfie = None;
        true
    }

    /// Select a style; returns the style that is now active, which is the first
    /// catalog entry when `id` is unknown.
    pub fn select_style(&mut self, catalog: &StyleCatalog, id: &str) -> &'static Style {
        let style = catalog.find(id);
        self.style_id = style.id.to_string();
        style
    }

    pub fn selected_style(&self, catalog: &StyleCatalog) -> &'static Style {
        catalog.find(&self.style_id)
    }

    pub fn is_kiosk(&self) -> bool {
        self.kiosk
    }

    pub fn toggle_kiosk(&mut self) -> bool {
        self.kiosk = !self.kiosk;
        self.kiosk
    }

    pub fn layout(&self) -> Layout {
        if self.kiosk {
            Layout::KIOSK
        } else {
            Layout::STANDARD
        }
    }

    pub fn install(&mut self) -> &mut InstallPrompt {
        &mut self.install
    }

    pub fn phase(&self) -> &RenderPhase {
        &self.phase
    }

    /// Message of the last failed submission, if it has not been dismissed.
    pub fn render_error(&self) -> Option<&str> {
        match &self.phase {
            RenderPhase::Failed { message } => Some(message),
            _ => None,
        }
    }

    pub fn dismiss_error(&mut self) {
        if matches!(self.phase, RenderPhase::Failed { .. }) {
            self.phase = RenderPhase::Idle;
        }
    }

    pub fn can_send(&self) -> bool {
        self.selfie.is_some() && !self.phase.is_busy()
    }

    pub fn can_clear(&self) -> bool {
        !self.phase.is_busy()
    }

    pub(crate) fn begin_submission(&mut self) {
        self.phase = RenderPhase::Submitting;
    }

    pub(crate) fn mark_polling(&mut self, job_id: JobId) {
        self.phase = RenderPhase::Polling { job_id };
    }

    pub(crate) fn mark_delivering(&mut self) {
        self.phase = RenderPhase::Delivering;
    }

    /// Successful delivery: the selfie is discarded and the session is idle.
    pub(crate) fn finish_delivery(&mut self) {
        self.selfie = None;
        self.phase = RenderPhase::Idle;
    }

    /// Failed submission: the selfie is kept so the barber can retry.
    pub(crate) fn fail(&mut self, message: String) {
        self.phase = RenderPhase::Failed { message };
    }
}
