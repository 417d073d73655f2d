//! Page navigation and render scheduling for a single-document PDF viewer.
//!
//! Parsing and rasterization are delegated to a [`DocumentRenderer`]. This
//! crate owns the viewer state, clamps navigation and zoom, and makes sure
//! at most one render touches a surface at a time: requests that arrive
//! mid-render either replace the single pending slot or are dropped,
//! according to [`QueuePolicy`].

pub mod config;
pub mod controller;
pub mod controls;
pub mod error;
pub mod input;
pub mod navigator;
pub mod queue;
pub mod renderer;
pub mod session;
pub mod state;
pub mod transition;
pub mod visibility;

pub use config::ViewerConfig;
pub use controller::{PageDriver, RenderController};
pub use controls::ControlsState;
pub use error::{ConfigError, LoadError, RenderError};
pub use input::{command_for_key, command_for_page_input, Command, InputContext, Key};
pub use navigator::{Dispatch, Navigator};
pub use queue::{QueuePolicy, RenderRequest};
pub use renderer::{
    ContainerSize, DocumentHandle, DocumentRenderer, PageHandle, PageSize, Surface, Viewport,
};
pub use session::ViewerSession;
pub use state::{ViewerState, ZoomLimits};
pub use transition::{PageFlipper, SlideFrame, TimedSlide, TransitionAnimator, TransitionPhase};
pub use visibility::ControlsVisibility;
