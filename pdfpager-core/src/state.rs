/// Snapshot of what the viewer is showing and whether it is busy.
///
/// Pages are 1-based. `total_pages` is 0 until a document is loaded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewerState {
    pub current_page: u32,
    pub total_pages: u32,
    pub scale: f32,
    pub is_rendering: bool,
    pub pending_page: Option<u32>,
}

impl ViewerState {
    pub fn new(initial_scale: f32) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            scale: initial_scale,
            is_rendering: false,
            pending_page: None,
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.total_pages > 0
    }

    pub fn at_first_page(&self) -> bool {
        self.current_page <= 1
    }

    pub fn at_last_page(&self) -> bool {
        self.current_page >= self.total_pages
    }
}

/// Zoom bounds and the step used by zoom in / zoom out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoomLimits {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min: 0.4,
            max: 4.0,
            step: 0.2,
        }
    }
}

impl ZoomLimits {
    pub fn clamp(&self, scale: f32) -> f32 {
        scale.clamp(self.min, self.max)
    }

    pub fn at_min(&self, scale: f32) -> bool {
        scale <= self.min
    }

    pub fn at_max(&self, scale: f32) -> bool {
        scale >= self.max
    }
}

/// Clamp a requested page number into `[1, total_pages]`.
///
/// Returns `None` when there are no pages to land on.
pub fn clamp_page(requested: i64, total_pages: u32) -> Option<u32> {
    if total_pages == 0 {
        return None;
    }
    Some(requested.clamp(1, i64::from(total_pages)) as u32)
}

/// Zoom percentage as shown to the user, e.g. `150%`.
pub fn zoom_label(scale: f32) -> String {
    format!("{}%", (scale * 100.0).round() as i64)
}
