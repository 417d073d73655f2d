//! Auto-hiding controls overlay for touch-first setups.

use std::time::{Duration, Instant};

/// Tracks whether the controls overlay is shown and when it should hide.
#[derive(Debug, Clone)]
pub struct ControlsVisibility {
    visible: bool,
    hide_at: Option<Instant>,
    timeout: Duration,
}

impl ControlsVisibility {
    pub fn new(timeout: Duration) -> Self {
        Self {
            visible: false,
            hide_at: None,
            timeout,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.hide_at
    }

    /// Show the controls and restart the hide countdown.
    pub fn show(&mut self, now: Instant) {
        self.visible = true;
        self.hide_at = Some(now + self.timeout);
    }

    pub fn hide(&mut self) {
        self.visible = false;
        self.hide_at = None;
    }

    /// A tap on the page itself toggles the overlay.
    pub fn tap_page(&mut self, now: Instant) {
        if self.visible {
            self.hide();
        } else {
            self.show(now);
        }
    }

    /// Hide once the deadline has passed. Returns true if visibility changed.
    pub fn tick(&mut self, now: Instant) -> bool {
        match self.hide_at {
            Some(deadline) if now >= deadline => {
                self.hide();
                true
            }
            _ => false,
        }
    }
}
