//! Synchronous page/zoom state machine.
//!
//! [`Navigator`] decides *what* to render and keeps the viewer state
//! consistent; it never renders anything itself. Callers run the returned
//! [`RenderRequest`] and report back through [`Navigator::finish`], which may
//! hand out the next request from the queue.

use crate::config::ViewerConfig;
use crate::error::RenderError;
use crate::input::Command;
use crate::queue::{Deferral, QueuePolicy, RenderQueue, RenderRequest};
use crate::state::{clamp_page, ViewerState, ZoomLimits};
use tracing::{debug, warn};

/// Outcome of a navigation or zoom request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Dispatch {
    /// The caller must run this render now.
    Start(RenderRequest),
    /// A render is in flight; this page will be rendered after it.
    Queued(u32),
    /// A render is in flight and the request was dropped.
    Rejected,
    /// Nothing to do, the view already shows what was asked for.
    Unchanged,
    /// Not a navigation request, or no document is loaded.
    Ignored,
}

impl Dispatch {
    pub fn request(&self) -> Option<RenderRequest> {
        match self {
            Dispatch::Start(request) => Some(*request),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Navigator {
    current_page: u32,
    total_pages: u32,
    scale: f32,
    limits: ZoomLimits,
    queue: RenderQueue,
    notice: Option<String>,
}

impl Navigator {
    pub fn new(config: &ViewerConfig) -> Self {
        Self::with_limits(config.initial_scale, config.zoom_limits(), config.queue_policy)
    }

    pub fn with_limits(initial_scale: f32, limits: ZoomLimits, policy: QueuePolicy) -> Self {
        Self {
            current_page: 1,
            total_pages: 0,
            scale: limits.clamp(initial_scale),
            limits,
            queue: RenderQueue::new(policy),
            notice: None,
        }
    }

    pub fn state(&self) -> ViewerState {
        ViewerState {
            current_page: self.current_page,
            total_pages: self.total_pages,
            scale: self.scale,
            is_rendering: self.queue.is_busy(),
            pending_page: self.queue.pending(),
        }
    }

    pub fn limits(&self) -> ZoomLimits {
        self.limits
    }

    pub fn is_busy(&self) -> bool {
        self.queue.is_busy()
    }

    /// User-facing message left by the last failed render.
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Record the page count of a freshly opened document and request page 1.
    pub fn load(&mut self, total_pages: u32) -> Dispatch {
        self.total_pages = total_pages;
        self.current_page = 1;
        if total_pages == 0 {
            warn!("Document has no pages");
            return Dispatch::Unchanged;
        }
        self.request(1, true)
    }

    pub fn go_to_page(&mut self, requested: i64) -> Dispatch {
        match clamp_page(requested, self.total_pages) {
            Some(page) => {
                if i64::from(page) != requested {
                    debug!("Clamped page request {} to {}", requested, page);
                }
                self.request(page, false)
            }
            None => Dispatch::Ignored,
        }
    }

    /// Render `page` even if it is already on screen.
    pub fn render_page(&mut self, page: u32) -> Dispatch {
        match clamp_page(i64::from(page), self.total_pages) {
            Some(page) => self.request(page, true),
            None => Dispatch::Ignored,
        }
    }

    pub fn next_page(&mut self) -> Dispatch {
        if self.total_pages == 0 {
            return Dispatch::Ignored;
        }
        let base = self.target_page();
        if base >= self.total_pages {
            return Dispatch::Unchanged;
        }
        self.request(base + 1, false)
    }

    pub fn previous_page(&mut self) -> Dispatch {
        if self.total_pages == 0 {
            return Dispatch::Ignored;
        }
        let base = self.target_page();
        if base <= 1 {
            return Dispatch::Unchanged;
        }
        self.request(base - 1, false)
    }

    pub fn change_zoom(&mut self, delta: f32) -> Dispatch {
        if self.total_pages == 0 {
            return Dispatch::Ignored;
        }
        if !delta.is_finite() {
            warn!("Ignoring zoom by {}", delta);
            return Dispatch::Ignored;
        }
        let scale = self.limits.clamp(self.scale + delta);
        if scale == self.scale {
            return Dispatch::Unchanged;
        }
        if self.queue.is_busy() && self.queue.policy() == QueuePolicy::Reject {
            debug!("Zoom to {} rejected while rendering", scale);
            return Dispatch::Rejected;
        }
        self.scale = scale;
        let page = self.target_page();
        self.request(page, true)
    }

    pub fn zoom_in(&mut self) -> Dispatch {
        self.change_zoom(self.limits.step)
    }

    pub fn zoom_out(&mut self) -> Dispatch {
        self.change_zoom(-self.limits.step)
    }

    pub fn apply(&mut self, command: &Command) -> Dispatch {
        match command {
            Command::PreviousPage => self.previous_page(),
            Command::NextPage => self.next_page(),
            Command::GoToPage(page) => self.go_to_page(*page),
            Command::ZoomIn => self.zoom_in(),
            Command::ZoomOut => self.zoom_out(),
            Command::ToggleFullscreen => Dispatch::Ignored,
        }
    }

    /// Close out the in-flight render and return the next one to run, if any.
    pub fn finish(&mut self, outcome: &Result<(), RenderError>) -> Option<RenderRequest> {
        let (finished, pending) = self.queue.complete();
        match (finished, outcome) {
            (Some(request), Ok(())) => {
                self.current_page = request.page;
                self.notice = None;
            }
            (Some(request), Err(err)) => {
                warn!("Render of page {} failed: {}", request.page, err);
                self.notice = Some(format!("Page {} could not be displayed.", request.page));
            }
            (None, _) => warn!("Render finished with nothing in flight"),
        }

        let page = pending?;
        let request = RenderRequest {
            page,
            scale: self.scale,
        };
        debug!("Draining pending render of page {}", page);
        self.queue.start(request);
        Some(request)
    }

    /// The page the user will end up on once the queue drains.
    fn target_page(&self) -> u32 {
        self.queue
            .pending()
            .or_else(|| self.queue.in_flight().map(|request| request.page))
            .unwrap_or(self.current_page)
    }

    fn request(&mut self, page: u32, force: bool) -> Dispatch {
        if self.queue.is_busy() {
            return match self.queue.defer(page) {
                Deferral::Queued { replaced } => {
                    if let Some(replaced) = replaced {
                        debug!("Pending page {} superseded by {}", replaced, page);
                    }
                    Dispatch::Queued(page)
                }
                Deferral::Rejected => {
                    debug!("Request for page {} rejected while rendering", page);
                    Dispatch::Rejected
                }
            };
        }
        if !force && page == self.current_page {
            return Dispatch::Unchanged;
        }
        let request = RenderRequest {
            page,
            scale: self.scale,
        };
        self.queue.start(request);
        Dispatch::Start(request)
    }
}
