//! Two-surface page flipping with an animated slide between pages.
//!
//! The target page is drawn off screen into the inactive surface, the
//! animator plays the slide, and only then do the surfaces swap roles.
//! Requests that arrive while a flip is underway are rejected.

use crate::config::ViewerConfig;
use crate::controller::PageDriver;
use crate::controls::ControlsState;
use crate::error::RenderError;
use crate::input::Command;
use crate::navigator::{Dispatch, Navigator};
use crate::queue::QueuePolicy;
use crate::renderer::{paint, ContainerSize, DocumentHandle, Surface};
use crate::state::ViewerState;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionPhase {
    Idle,
    Rendering,
    Animating,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlideDirection {
    Forward,
    Backward,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slide {
    pub direction: SlideDirection,
    pub from_page: u32,
    pub to_page: u32,
}

/// Plays the visual transition. The returned future resolves when the
/// transition has finished on screen.
pub trait TransitionAnimator: Send + Sync + 'static {
    fn play(&self, slide: Slide) -> impl Future<Output = ()> + Send;
}

/// Position of both surfaces at one point of a slide.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlideFrame {
    pub direction: SlideDirection,
    /// Linear progress in `[0, 1]`.
    pub progress: f32,
}

impl SlideFrame {
    pub fn settled() -> Self {
        Self {
            direction: SlideDirection::Forward,
            progress: 1.0,
        }
    }

    fn eased(&self) -> f32 {
        let t = self.progress.clamp(0.0, 1.0);
        if t < 0.5 {
            4.0 * t * t * t
        } else {
            1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
        }
    }

    fn sign(&self) -> f32 {
        match self.direction {
            SlideDirection::Forward => 1.0,
            SlideDirection::Backward => -1.0,
        }
    }

    /// Horizontal offset of the outgoing page, as a fraction of the view width.
    pub fn outgoing_offset(&self) -> f32 {
        -self.sign() * self.eased()
    }

    /// Horizontal offset of the incoming page, as a fraction of the view width.
    pub fn incoming_offset(&self) -> f32 {
        self.sign() * (1.0 - self.eased())
    }
}

/// Animator that advances a [`SlideFrame`] on a fixed frame interval and
/// publishes each frame for the front end to draw.
pub struct TimedSlide {
    duration: Duration,
    frame_interval: Duration,
    frames: watch::Sender<SlideFrame>,
}

impl TimedSlide {
    pub fn new(duration: Duration) -> Self {
        let (frames, _) = watch::channel(SlideFrame::settled());
        Self {
            duration,
            frame_interval: Duration::from_millis(16),
            frames,
        }
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        Self::new(config.slide_duration())
    }

    pub fn subscribe(&self) -> watch::Receiver<SlideFrame> {
        self.frames.subscribe()
    }

    pub fn current(&self) -> SlideFrame {
        *self.frames.borrow()
    }
}

impl TransitionAnimator for TimedSlide {
    fn play(&self, slide: Slide) -> impl Future<Output = ()> + Send {
        async move {
            let start = tokio::time::Instant::now();
            let mut ticker = tokio::time::interval(self.frame_interval);
            loop {
                ticker.tick().await;
                let progress = if self.duration.is_zero() {
                    1.0
                } else {
                    (start.elapsed().as_secs_f32() / self.duration.as_secs_f32()).min(1.0)
                };
                self.frames.send_replace(SlideFrame {
                    direction: slide.direction,
                    progress,
                });
                if progress >= 1.0 {
                    break;
                }
            }
        }
    }
}

struct SurfacePair {
    surfaces: [Surface; 2],
    active: usize,
}

impl SurfacePair {
    fn active(&self) -> &Surface {
        &self.surfaces[self.active]
    }

    fn inactive(&self) -> &Surface {
        &self.surfaces[1 - self.active]
    }

    fn inactive_mut(&mut self) -> &mut Surface {
        &mut self.surfaces[1 - self.active]
    }

    fn swap(&mut self) {
        self.active = 1 - self.active;
    }
}

/// Page navigator variant that slides between an active and an inactive
/// surface.
pub struct PageFlipper<D: DocumentHandle, A: TransitionAnimator> {
    document: D,
    animator: A,
    navigator: Mutex<Navigator>,
    phase: Mutex<TransitionPhase>,
    surfaces: tokio::sync::Mutex<SurfacePair>,
    container: Mutex<Option<ContainerSize>>,
    margin: f32,
    controls: watch::Sender<ControlsState>,
}

impl<D: DocumentHandle, A: TransitionAnimator> PageFlipper<D, A> {
    /// Flips never queue, whatever the configured policy says.
    pub fn new(document: D, animator: A, config: &ViewerConfig) -> Self {
        let navigator = Navigator::with_limits(
            config.initial_scale,
            config.zoom_limits(),
            QueuePolicy::Reject,
        );
        let (controls, _) = watch::channel(ControlsState::disabled());
        Self {
            document,
            animator,
            navigator: Mutex::new(navigator),
            phase: Mutex::new(TransitionPhase::Idle),
            surfaces: tokio::sync::Mutex::new(SurfacePair {
                surfaces: [Surface::default(), Surface::default()],
                active: 0,
            }),
            container: Mutex::new(None),
            margin: config.container_margin,
            controls,
        }
    }

    pub fn animator(&self) -> &A {
        &self.animator
    }

    pub fn phase(&self) -> TransitionPhase {
        *self.phase_guard()
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlsState> {
        self.controls.subscribe()
    }

    /// Render the first page into the active surface without a slide.
    pub async fn start(&self) -> Result<(), RenderError> {
        let dispatch = self.navigator().load(self.document.page_count());
        if dispatch.request().is_some() {
            self.set_phase(TransitionPhase::Rendering);
        }
        self.publish();
        self.flip(dispatch).await
    }

    /// The page being slid in, once it has been drawn.
    pub async fn incoming_frame(&self) -> Option<Surface> {
        if self.phase() != TransitionPhase::Animating {
            return None;
        }
        Some(self.surfaces.lock().await.inactive().clone())
    }

    async fn flip(&self, dispatch: Dispatch) -> Result<(), RenderError> {
        let Dispatch::Start(request) = dispatch else {
            return Ok(());
        };
        let from_page = self.navigator().state().current_page;
        let container = self.container();

        let painted = {
            let mut pair = self.surfaces.lock().await;
            paint(
                &self.document,
                request,
                container,
                self.margin,
                pair.inactive_mut(),
            )
            .await
        };
        if let Err(err) = painted {
            let outcome = Err(err);
            self.finish(&outcome);
            return outcome;
        }

        if request.page != from_page {
            let direction = if request.page > from_page {
                SlideDirection::Forward
            } else {
                SlideDirection::Backward
            };
            self.set_phase(TransitionPhase::Animating);
            self.publish();
            debug!("Sliding {:?} from page {} to {}", direction, from_page, request.page);
            self.animator
                .play(Slide {
                    direction,
                    from_page,
                    to_page: request.page,
                })
                .await;
        }

        self.surfaces.lock().await.swap();
        self.finish(&Ok(()));
        Ok(())
    }

    fn finish(&self, outcome: &Result<(), RenderError>) {
        settle_flip(&mut self.navigator(), outcome);
        self.set_phase(TransitionPhase::Idle);
        self.publish();
    }

    fn navigator(&self) -> MutexGuard<'_, Navigator> {
        self.navigator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn phase_guard(&self) -> MutexGuard<'_, TransitionPhase> {
        self.phase.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: TransitionPhase) {
        *self.phase_guard() = phase;
    }

    fn container(&self) -> Option<ContainerSize> {
        *self.container.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        self.controls.send_replace(PageDriver::controls(self));
    }
}

/// Close out a flip. Anything the queue hands back was never drawn, so it
/// is failed rather than shown.
fn settle_flip(navigator: &mut Navigator, outcome: &Result<(), RenderError>) {
    if let Some(request) = navigator.finish(outcome) {
        warn!("Flip queue handed out page {}; dropping it", request.page);
        navigator.finish(&Err(RenderError::PageUnavailable {
            page: request.page,
            message: "page flips do not queue".into(),
        }));
    }
}

impl<D: DocumentHandle, A: TransitionAnimator> PageDriver for PageFlipper<D, A> {
    fn state(&self) -> ViewerState {
        self.navigator().state()
    }

    fn controls(&self) -> ControlsState {
        let navigator = self.navigator();
        ControlsState::reflect(&navigator.state(), &navigator.limits())
    }

    fn notice(&self) -> Option<String> {
        self.navigator().notice().map(str::to_owned)
    }

    fn is_busy(&self) -> bool {
        self.phase() != TransitionPhase::Idle
    }

    fn set_container(&self, size: Option<ContainerSize>) {
        *self.container.lock().unwrap_or_else(PoisonError::into_inner) = size;
    }

    fn request(&self, command: &Command) -> Dispatch {
        if self.phase() != TransitionPhase::Idle {
            debug!("{:?} rejected during {:?}", command, self.phase());
            return Dispatch::Rejected;
        }
        let dispatch = self.navigator().apply(command);
        if dispatch.request().is_some() {
            self.set_phase(TransitionPhase::Rendering);
        }
        self.publish();
        dispatch
    }

    fn drive(&self, dispatch: Dispatch) -> impl Future<Output = Result<(), RenderError>> + Send {
        self.flip(dispatch)
    }

    fn frame(&self) -> impl Future<Output = Surface> + Send {
        async move { self.surfaces.lock().await.active().clone() }
    }
}
