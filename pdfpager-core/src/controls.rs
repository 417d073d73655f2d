use crate::state::{zoom_label, ViewerState, ZoomLimits};

const BUSY_OPACITY: f32 = 0.5;

/// Enablement and labels for every control, derived from [`ViewerState`].
#[derive(Debug, Clone, PartialEq)]
pub struct ControlsState {
    pub previous: bool,
    pub next: bool,
    pub zoom_in: bool,
    pub zoom_out: bool,
    pub page_input: bool,
    pub current_page: u32,
    pub page_count: u32,
    pub zoom_label: String,
    pub surface_opacity: f32,
}

impl ControlsState {
    pub fn reflect(state: &ViewerState, limits: &ZoomLimits) -> Self {
        if !state.is_loaded() {
            return Self::disabled();
        }
        let idle = !state.is_rendering;
        Self {
            previous: idle && !state.at_first_page(),
            next: idle && !state.at_last_page(),
            zoom_in: idle && !limits.at_max(state.scale),
            zoom_out: idle && !limits.at_min(state.scale),
            page_input: idle,
            current_page: state.current_page,
            page_count: state.total_pages,
            zoom_label: zoom_label(state.scale),
            surface_opacity: if idle { 1.0 } else { BUSY_OPACITY },
        }
    }

    /// Everything off. Used before the document loads and after it fails to.
    pub fn disabled() -> Self {
        Self {
            previous: false,
            next: false,
            zoom_in: false,
            zoom_out: false,
            page_input: false,
            current_page: 0,
            page_count: 0,
            zoom_label: String::new(),
            surface_opacity: 1.0,
        }
    }

    pub fn any_enabled(&self) -> bool {
        self.previous || self.next || self.zoom_in || self.zoom_out || self.page_input
    }
}
