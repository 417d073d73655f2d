//! A viewer that either opened its document or failed to.

use crate::controller::PageDriver;
use crate::controls::ControlsState;
use crate::error::{LoadError, RenderError};
use crate::input::Command;
use crate::navigator::Dispatch;
use std::sync::Arc;
use tracing::debug;

/// Either a live page driver or the load failure that prevented one.
///
/// A failed session swallows every command; its controls stay disabled.
pub enum ViewerSession<P: PageDriver> {
    Ready(Arc<P>),
    Failed(LoadError),
}

impl<P: PageDriver> Clone for ViewerSession<P> {
    fn clone(&self) -> Self {
        match self {
            ViewerSession::Ready(driver) => ViewerSession::Ready(Arc::clone(driver)),
            ViewerSession::Failed(err) => ViewerSession::Failed(err.clone()),
        }
    }
}

impl<P: PageDriver> ViewerSession<P> {
    pub fn from_load(result: Result<P, LoadError>) -> Self {
        match result {
            Ok(driver) => ViewerSession::Ready(Arc::new(driver)),
            Err(err) => ViewerSession::Failed(err),
        }
    }

    pub fn driver(&self) -> Option<&Arc<P>> {
        match self {
            ViewerSession::Ready(driver) => Some(driver),
            ViewerSession::Failed(_) => None,
        }
    }

    pub fn controls(&self) -> ControlsState {
        match self {
            ViewerSession::Ready(driver) => driver.controls(),
            ViewerSession::Failed(_) => ControlsState::disabled(),
        }
    }

    /// Static message to show in place of the page.
    pub fn failure_message(&self) -> Option<String> {
        match self {
            ViewerSession::Ready(_) => None,
            ViewerSession::Failed(err) => Some(format!("Error: the PDF could not be loaded ({err})")),
        }
    }

    pub fn is_busy(&self) -> bool {
        self.driver().is_some_and(|driver| driver.is_busy())
    }

    pub fn request(&self, command: &Command) -> Dispatch {
        match self {
            ViewerSession::Ready(driver) => driver.request(command),
            ViewerSession::Failed(_) => {
                debug!("Ignoring {:?}: document failed to load", command);
                Dispatch::Ignored
            }
        }
    }

    pub async fn run(&self, command: &Command) -> Result<(), RenderError> {
        let dispatch = self.request(command);
        match self {
            ViewerSession::Ready(driver) => driver.drive(dispatch).await,
            ViewerSession::Failed(_) => Ok(()),
        }
    }
}
