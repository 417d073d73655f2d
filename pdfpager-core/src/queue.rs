//! Depth-1 render queue.
//!
//! One request may be in flight. While it runs, at most one follow-up page is
//! remembered; a newer follow-up replaces the older one. Nothing is ever
//! cancelled: the in-flight render always finishes first.

use serde::{Deserialize, Serialize};

/// What happens to a request that arrives while a render is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueuePolicy {
    /// Remember it as the pending request, replacing any older one.
    #[default]
    Queue,
    /// Drop it silently.
    Reject,
}

/// A render the controller has committed to run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderRequest {
    pub page: u32,
    pub scale: f32,
}

/// Result of offering a page to a busy queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Deferral {
    Queued { replaced: Option<u32> },
    Rejected,
}

#[derive(Debug, Clone)]
pub struct RenderQueue {
    policy: QueuePolicy,
    in_flight: Option<RenderRequest>,
    pending: Option<u32>,
}

impl RenderQueue {
    pub fn new(policy: QueuePolicy) -> Self {
        Self {
            policy,
            in_flight: None,
            pending: None,
        }
    }

    pub fn policy(&self) -> QueuePolicy {
        self.policy
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn in_flight(&self) -> Option<RenderRequest> {
        self.in_flight
    }

    pub fn pending(&self) -> Option<u32> {
        self.pending
    }

    /// Mark `request` as running. The caller checks `is_busy` first.
    pub fn start(&mut self, request: RenderRequest) {
        debug_assert!(self.in_flight.is_none(), "render already in flight");
        self.in_flight = Some(request);
    }

    /// Offer `page` while a render is running.
    pub fn defer(&mut self, page: u32) -> Deferral {
        match self.policy {
            QueuePolicy::Queue => Deferral::Queued {
                replaced: self.pending.replace(page),
            },
            QueuePolicy::Reject => Deferral::Rejected,
        }
    }

    /// Finish the in-flight render and hand back the pending page, if any.
    pub fn complete(&mut self) -> (Option<RenderRequest>, Option<u32>) {
        (self.in_flight.take(), self.pending.take())
    }
}
