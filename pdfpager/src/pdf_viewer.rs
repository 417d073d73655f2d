use crate::renderer::{PdfiumDocument, PdfiumRenderer};
use iced::widget::image::Handle;
use pdfpager_core::{
    ContainerSize, ControlsState, Command, Dispatch, DocumentHandle, DocumentRenderer, LoadError,
    PageDriver, PageFlipper, RenderController, RenderError, SlideFrame, Surface, TimedSlide,
    TransitionPhase, ViewerConfig, ViewerState,
};
use std::future::Future;

/// A loaded PDF, shown either on a single surface or with slide transitions.
pub enum PdfViewer {
    Paged(RenderController<PdfiumDocument>),
    Sliding(PageFlipper<PdfiumDocument, TimedSlide>),
}

impl std::fmt::Debug for PdfViewer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (mode, pages) = match self {
            PdfViewer::Paged(controller) => ("paged", controller.document().page_count()),
            PdfViewer::Sliding(flipper) => ("sliding", flipper.state().total_pages),
        };
        f.debug_struct("PdfViewer")
            .field("mode", &mode)
            .field("page_count", &pages)
            .finish()
    }
}

impl PdfViewer {
    /// Open the configured document.
    pub async fn open(config: ViewerConfig) -> Result<Self, LoadError> {
        let renderer = PdfiumRenderer;
        if config.slide_transition {
            let document = renderer.open_document(&config.document).await?;
            let animator = TimedSlide::from_config(&config);
            Ok(PdfViewer::Sliding(PageFlipper::new(document, animator, &config)))
        } else {
            let controller = RenderController::open(&renderer, &config).await?;
            Ok(PdfViewer::Paged(controller))
        }
    }

    /// Render the first page.
    pub async fn start(&self) -> Result<(), RenderError> {
        match self {
            PdfViewer::Paged(controller) => controller.start().await,
            PdfViewer::Sliding(flipper) => flipper.start().await,
        }
    }

    /// Slide position while a page transition is playing.
    pub fn slide_frame(&self) -> Option<SlideFrame> {
        match self {
            PdfViewer::Sliding(flipper) if flipper.phase() == TransitionPhase::Animating => {
                Some(flipper.animator().current())
            }
            _ => None,
        }
    }

    pub fn is_sliding(&self) -> bool {
        matches!(self, PdfViewer::Sliding(_))
    }

    pub async fn incoming_frame(&self) -> Option<Handle> {
        match self {
            PdfViewer::Sliding(flipper) => flipper.incoming_frame().await.map(|s| to_handle(&s)),
            PdfViewer::Paged(_) => None,
        }
    }
}

impl PageDriver for PdfViewer {
    fn state(&self) -> ViewerState {
        match self {
            PdfViewer::Paged(controller) => controller.state(),
            PdfViewer::Sliding(flipper) => flipper.state(),
        }
    }

    fn controls(&self) -> ControlsState {
        match self {
            PdfViewer::Paged(controller) => controller.controls(),
            PdfViewer::Sliding(flipper) => flipper.controls(),
        }
    }

    fn notice(&self) -> Option<String> {
        match self {
            PdfViewer::Paged(controller) => controller.notice(),
            PdfViewer::Sliding(flipper) => flipper.notice(),
        }
    }

    fn is_busy(&self) -> bool {
        match self {
            PdfViewer::Paged(controller) => controller.is_busy(),
            PdfViewer::Sliding(flipper) => flipper.is_busy(),
        }
    }

    fn set_container(&self, size: Option<ContainerSize>) {
        match self {
            PdfViewer::Paged(controller) => controller.set_container(size),
            PdfViewer::Sliding(flipper) => flipper.set_container(size),
        }
    }

    fn request(&self, command: &Command) -> Dispatch {
        match self {
            PdfViewer::Paged(controller) => controller.request(command),
            PdfViewer::Sliding(flipper) => flipper.request(command),
        }
    }

    fn drive(&self, dispatch: Dispatch) -> impl Future<Output = Result<(), RenderError>> + Send {
        async move {
            match self {
                PdfViewer::Paged(controller) => controller.drive(dispatch).await,
                PdfViewer::Sliding(flipper) => flipper.drive(dispatch).await,
            }
        }
    }

    fn frame(&self) -> impl Future<Output = Surface> + Send {
        async move {
            match self {
                PdfViewer::Paged(controller) => controller.frame().await,
                PdfViewer::Sliding(flipper) => flipper.frame().await,
            }
        }
    }
}

pub fn to_handle(surface: &Surface) -> Handle {
    Handle::from_rgba(surface.width(), surface.height(), surface.to_rgba())
}
