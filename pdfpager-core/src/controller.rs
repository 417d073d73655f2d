//! Async render controller for a single drawable surface.

use crate::config::ViewerConfig;
use crate::controls::ControlsState;
use crate::error::{LoadError, RenderError};
use crate::input::Command;
use crate::navigator::{Dispatch, Navigator};
use crate::queue::RenderRequest;
use crate::renderer::{paint, ContainerSize, DocumentHandle, DocumentRenderer, Surface, Viewport};
use crate::state::ViewerState;
use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Renders slower than this are logged. Nothing times out: a render that
/// never finishes keeps the viewer busy for good.
const SLOW_RENDER: Duration = Duration::from_secs(5);

/// Common surface of the plain controller and the sliding page flipper, so
/// front ends can drive either one.
pub trait PageDriver: Send + Sync {
    fn state(&self) -> ViewerState;

    fn controls(&self) -> ControlsState;

    fn notice(&self) -> Option<String>;

    /// True while a render (or page transition) is running.
    fn is_busy(&self) -> bool;

    fn set_container(&self, size: Option<ContainerSize>);

    /// Apply `command` to the viewer state right away. A returned
    /// [`Dispatch::Start`] must be handed to [`PageDriver::drive`].
    fn request(&self, command: &Command) -> Dispatch;

    /// Run a started render, then whatever the queue hands out after it.
    fn drive(&self, dispatch: Dispatch) -> impl Future<Output = Result<(), RenderError>> + Send;

    /// Copy of the surface currently on screen.
    fn frame(&self) -> impl Future<Output = Surface> + Send;
}

/// Owns the viewer state and the one surface pages are drawn into.
///
/// All methods take `&self`; concurrent callers are serialized through the
/// depth-1 queue, so two renders never touch the surface at once.
pub struct RenderController<D: DocumentHandle> {
    document: D,
    navigator: Mutex<Navigator>,
    surface: tokio::sync::Mutex<Surface>,
    container: Mutex<Option<ContainerSize>>,
    margin: f32,
    controls: watch::Sender<ControlsState>,
}

impl<D: DocumentHandle> RenderController<D> {
    /// Open `config.document` through `renderer`.
    pub async fn open<R>(renderer: &R, config: &ViewerConfig) -> Result<Self, LoadError>
    where
        R: DocumentRenderer<Document = D>,
    {
        let document = match renderer.open_document(&config.document).await {
            Ok(document) => document,
            Err(err) => {
                error!("Failed to open {}: {}", config.document.display(), err);
                return Err(err);
            }
        };
        info!(
            "Opened {} ({} pages)",
            config.document.display(),
            document.page_count()
        );
        Ok(Self::new(document, config))
    }

    /// Wrap an already opened document. Nothing is rendered until
    /// [`RenderController::start`].
    pub fn new(document: D, config: &ViewerConfig) -> Self {
        let navigator = Navigator::new(config);
        let (controls, _) = watch::channel(ControlsState::disabled());
        Self {
            document,
            navigator: Mutex::new(navigator),
            surface: tokio::sync::Mutex::new(Surface::default()),
            container: Mutex::new(None),
            margin: config.container_margin,
            controls,
        }
    }

    /// Populate the state from the document and render the first page.
    pub async fn start(&self) -> Result<(), RenderError> {
        let dispatch = self.navigator().load(self.document.page_count());
        self.publish();
        self.drive_queue(dispatch).await
    }

    pub fn document(&self) -> &D {
        &self.document
    }

    pub fn subscribe(&self) -> watch::Receiver<ControlsState> {
        self.controls.subscribe()
    }

    pub async fn go_to_page(&self, page: i64) -> Result<(), RenderError> {
        self.run(&Command::GoToPage(page)).await
    }

    pub async fn next_page(&self) -> Result<(), RenderError> {
        self.run(&Command::NextPage).await
    }

    pub async fn previous_page(&self) -> Result<(), RenderError> {
        self.run(&Command::PreviousPage).await
    }

    pub async fn change_zoom(&self, delta: f32) -> Result<(), RenderError> {
        let dispatch = self.navigator().change_zoom(delta);
        self.publish();
        self.drive_queue(dispatch).await
    }

    pub async fn zoom_in(&self) -> Result<(), RenderError> {
        self.run(&Command::ZoomIn).await
    }

    pub async fn zoom_out(&self) -> Result<(), RenderError> {
        self.run(&Command::ZoomOut).await
    }

    /// Render `page` at the current scale, even if it is already shown.
    pub async fn render(&self, page: u32) -> Result<(), RenderError> {
        if !self.navigator().state().is_loaded() {
            return Err(RenderError::NoDocument);
        }
        let dispatch = self.navigator().render_page(page);
        self.publish();
        self.drive_queue(dispatch).await
    }

    async fn run(&self, command: &Command) -> Result<(), RenderError> {
        let dispatch = PageDriver::request(self, command);
        self.drive_queue(dispatch).await
    }

    async fn drive_queue(&self, dispatch: Dispatch) -> Result<(), RenderError> {
        let Dispatch::Start(first) = dispatch else {
            return Ok(());
        };

        let mut next = Some(first);
        let mut last = Ok(());
        while let Some(request) = next {
            let outcome = self.render_request(request).await.map(|_| ());
            next = self.navigator().finish(&outcome);
            self.publish();
            last = outcome;
        }
        last
    }

    async fn render_request(&self, request: RenderRequest) -> Result<Viewport, RenderError> {
        let container = self.container();
        let started = Instant::now();
        let mut surface = self.surface.lock().await;
        let result = paint(&self.document, request, container, self.margin, &mut surface).await;

        let elapsed = started.elapsed();
        if elapsed > SLOW_RENDER {
            warn!("Render of page {} took {:?}", request.page, elapsed);
        } else {
            debug!("Render of page {} took {:?}", request.page, elapsed);
        }
        result
    }

    fn navigator(&self) -> MutexGuard<'_, Navigator> {
        self.navigator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn container(&self) -> Option<ContainerSize> {
        *self.container.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn publish(&self) {
        self.controls.send_replace(PageDriver::controls(self));
    }
}

impl<D: DocumentHandle> PageDriver for RenderController<D> {
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
        self.navigator().is_busy()
    }

    fn set_container(&self, size: Option<ContainerSize>) {
        *self.container.lock().unwrap_or_else(PoisonError::into_inner) = size;
    }

    fn request(&self, command: &Command) -> Dispatch {
        let dispatch = self.navigator().apply(command);
        debug!("{:?} -> {:?}", command, dispatch);
        self.publish();
        dispatch
    }

    fn drive(&self, dispatch: Dispatch) -> impl Future<Output = Result<(), RenderError>> + Send {
        self.drive_queue(dispatch)
    }

    fn frame(&self) -> impl Future<Output = Surface> + Send {
        async move { self.surface.lock().await.clone() }
    }
}
