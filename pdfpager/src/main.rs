use clap::Parser;
use iced::widget::{
    button, column, container, horizontal_space, image as img, mouse_area, row, stack, text,
    text_input, Space,
};
use iced::{keyboard, time, window, Color, Element, Length, Size, Subscription, Task, Theme};
use pdfpager_core::{
    command_for_key, command_for_page_input, Command, ContainerSize, ControlsVisibility,
    InputContext, Key as ViewerKey, LoadError, PageDriver, RenderError, SlideFrame, ViewerConfig,
    ViewerSession,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

mod pdf_viewer;
mod renderer;

use pdf_viewer::{to_handle, PdfViewer};

/// Height reserved for the toolbar when fitting pages to the window.
const TOOLBAR_HEIGHT: f32 = 56.0;

#[derive(Debug, Parser)]
#[command(name = "pdfpager", about = "Page through a single PDF document")]
struct Args {
    /// PDF to open
    document: Option<PathBuf>,

    /// JSON viewer configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Initial zoom factor
    #[arg(long)]
    scale: Option<f32>,

    /// Slide between pages
    #[arg(long)]
    slide: bool,

    /// Hide the toolbar until the page is tapped
    #[arg(long)]
    auto_hide: bool,
}

impl Args {
    fn resolve_config(&self) -> anyhow::Result<ViewerConfig> {
        let mut config = match &self.config {
            Some(path) => ViewerConfig::load(path)?,
            None => ViewerConfig::default(),
        };
        if let Some(document) = &self.document {
            config.document = document.clone();
        }
        if let Some(scale) = self.scale {
            config.initial_scale = scale;
        }
        config.slide_transition |= self.slide;
        config.auto_hide_controls |= self.auto_hide;
        config.validate()?;
        Ok(config)
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter("pdfpager=debug,pdfpager_core=debug,info")
        .init();

    let config = Args::parse().resolve_config()?;
    tracing::info!("Opening {}", config.document.display());

    iced::application("PDF Pager", Pager::update, Pager::view)
        .theme(|_| Theme::Dark)
        .subscription(Pager::subscription)
        .run_with(move || Pager::new(config))
        .map_err(|e| anyhow::anyhow!("viewer window failed: {e}"))
}

#[derive(Debug, Clone)]
enum Message {
    Opened(Result<Arc<PdfViewer>, LoadError>),
    Command(Command),
    KeyPressed(ViewerKey),
    PageInputChanged(String),
    PageInputSubmitted,
    Rendered(Result<(), RenderError>, img::Handle),
    IncomingReady(Option<img::Handle>),
    Resized(Size),
    Tick(Instant),
    CanvasTapped,
    ControlsTapped,
}

struct Pager {
    config: ViewerConfig,
    /// `None` until the document has been opened (or failed to).
    session: Option<ViewerSession<PdfViewer>>,
    page_input: String,
    editing_page: bool,
    frame: Option<img::Handle>,
    incoming: Option<img::Handle>,
    incoming_requested: bool,
    fullscreen: bool,
    visibility: ControlsVisibility,
    window_size: Option<Size>,
}

impl Pager {
    fn new(config: ViewerConfig) -> (Self, Task<Message>) {
        let visibility = ControlsVisibility::new(config.controls_timeout());
        let open = config.clone();
        (
            Self {
                config,
                session: None,
                page_input: String::new(),
                editing_page: false,
                frame: None,
                incoming: None,
                incoming_requested: false,
                fullscreen: false,
                visibility,
                window_size: None,
            },
            Task::perform(
                async move { PdfViewer::open(open).await.map(Arc::new) },
                Message::Opened,
            ),
        )
    }

    fn viewer(&self) -> Option<&Arc<PdfViewer>> {
        self.session.as_ref().and_then(ViewerSession::driver)
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Opened(result) => {
                let session = match result {
                    Ok(viewer) => ViewerSession::Ready(viewer),
                    Err(err) => ViewerSession::Failed(err),
                };
                self.session = Some(session);
                let Some(viewer) = self.viewer().cloned() else {
                    return Task::none();
                };
                self.apply_container();
                Task::perform(
                    async move {
                        let result = viewer.start().await;
                        let frame = viewer.frame().await;
                        (result, to_handle(&frame))
                    },
                    |(result, frame)| Message::Rendered(result, frame),
                )
            }
            Message::Command(command) => self.handle(command),
            Message::KeyPressed(key) => {
                let context = InputContext {
                    text_input_focused: self.editing_page,
                    busy: self.session.as_ref().is_some_and(ViewerSession::is_busy),
                };
                match command_for_key(key, context) {
                    Some(command) => self.handle(command),
                    None => Task::none(),
                }
            }
            Message::PageInputChanged(value) => {
                self.editing_page = true;
                self.page_input = value;
                Task::none()
            }
            Message::PageInputSubmitted => {
                self.editing_page = false;
                match command_for_page_input(&self.page_input) {
                    Some(command) => self.handle(command),
                    None => {
                        self.sync_page_input();
                        Task::none()
                    }
                }
            }
            Message::Rendered(result, frame) => {
                if let Err(err) = result {
                    tracing::warn!("{}", err);
                }
                self.frame = Some(frame);
                self.incoming = None;
                self.incoming_requested = false;
                self.sync_page_input();
                Task::none()
            }
            Message::IncomingReady(frame) => {
                self.incoming = frame;
                Task::none()
            }
            Message::Resized(size) => {
                self.window_size = Some(size);
                self.apply_container();
                Task::none()
            }
            Message::Tick(now) => {
                self.visibility.tick(now);
                match self.viewer().cloned() {
                    Some(viewer) if viewer.slide_frame().is_some() && !self.incoming_requested => {
                        self.incoming_requested = true;
                        Task::perform(
                            async move { viewer.incoming_frame().await },
                            Message::IncomingReady,
                        )
                    }
                    _ => Task::none(),
                }
            }
            Message::CanvasTapped => {
                self.stop_editing();
                if self.config.auto_hide_controls {
                    self.visibility.tap_page(Instant::now());
                }
                Task::none()
            }
            Message::ControlsTapped => {
                self.stop_editing();
                if self.config.auto_hide_controls {
                    self.visibility.show(Instant::now());
                }
                Task::none()
            }
        }
    }

    fn handle(&mut self, command: Command) -> Task<Message> {
        self.editing_page = false;
        let Some(session) = &self.session else {
            return Task::none();
        };
        let Some(viewer) = session.driver().cloned() else {
            // The document never loaded; nothing is wired up.
            return Task::none();
        };
        if command == Command::ToggleFullscreen {
            return self.toggle_fullscreen();
        }

        let dispatch = viewer.request(&command);
        self.sync_page_input();
        if dispatch.request().is_none() {
            return Task::none();
        }
        Task::perform(
            async move {
                let result = viewer.drive(dispatch).await;
                let frame = viewer.frame().await;
                (result, to_handle(&frame))
            },
            |(result, frame)| Message::Rendered(result, frame),
        )
    }

    fn toggle_fullscreen(&mut self) -> Task<Message> {
        self.fullscreen = !self.fullscreen;
        let mode = if self.fullscreen {
            window::Mode::Fullscreen
        } else {
            window::Mode::Windowed
        };
        window::get_latest().and_then(move |id| window::change_mode(id, mode))
    }

    /// Leave the page field without submitting it.
    fn stop_editing(&mut self) {
        if self.editing_page {
            self.editing_page = false;
            self.sync_page_input();
        }
    }

    fn sync_page_input(&mut self) {
        if self.editing_page {
            return;
        }
        if let Some(viewer) = self.viewer() {
            self.page_input = viewer.state().current_page.to_string();
        }
    }

    fn apply_container(&self) {
        let (Some(viewer), Some(size)) = (self.viewer(), self.window_size) else {
            return;
        };
        viewer.set_container(Some(ContainerSize {
            width: size.width,
            height: (size.height - TOOLBAR_HEIGHT).max(0.0),
        }));
    }

    fn subscription(&self) -> Subscription<Message> {
        let keys = keyboard::on_key_press(|key, _modifiers| {
            let key = match key {
                keyboard::Key::Named(keyboard::key::Named::ArrowLeft) => ViewerKey::ArrowLeft,
                keyboard::Key::Named(keyboard::key::Named::ArrowRight) => ViewerKey::ArrowRight,
                keyboard::Key::Character(c) => match c.chars().next() {
                    Some(c) => ViewerKey::Character(c),
                    None => return None,
                },
                _ => return None,
            };
            Some(Message::KeyPressed(key))
        });
        let resizes = window::resize_events().map(|(_id, size)| Message::Resized(size));

        let sliding = self
            .viewer()
            .is_some_and(|viewer| viewer.is_sliding() && viewer.is_busy());
        let ticks = if sliding || self.visibility.deadline().is_some() {
            time::every(Duration::from_millis(16)).map(Message::Tick)
        } else {
            Subscription::none()
        };

        Subscription::batch([keys, resizes, ticks])
    }

    fn view(&self) -> Element<Message> {
        let Some(session) = &self.session else {
            return centered(text("Loading document...").size(16));
        };
        let Some(viewer) = session.driver() else {
            let message = session.failure_message().unwrap_or_default();
            return centered(text(message).size(16).color(Color::from_rgb(0.9, 0.2, 0.2)));
        };
        let controls = viewer.controls();

        let mut page_input = text_input("Page", &self.page_input).width(Length::Fixed(60.0));
        if controls.page_input {
            page_input = page_input
                .on_input(Message::PageInputChanged)
                .on_submit(Message::PageInputSubmitted);
        }

        let toolbar = row![
            button("◀").on_press_maybe(
                controls
                    .previous
                    .then_some(Message::Command(Command::PreviousPage))
            ),
            page_input,
            text(format!("/ {}", controls.page_count)),
            button("▶").on_press_maybe(
                controls
                    .next
                    .then_some(Message::Command(Command::NextPage))
            ),
            horizontal_space(),
            button("−").on_press_maybe(
                controls
                    .zoom_out
                    .then_some(Message::Command(Command::ZoomOut))
            ),
            text(controls.zoom_label.clone()),
            button("+").on_press_maybe(
                controls
                    .zoom_in
                    .then_some(Message::Command(Command::ZoomIn))
            ),
            horizontal_space(),
            button("⛶").on_press(Message::Command(Command::ToggleFullscreen)),
        ]
        .spacing(10)
        .padding(10);

        let width = self.window_size.map_or(800.0, |size| size.width);
        let page: Element<Message> = match (&self.frame, &self.incoming, viewer.slide_frame()) {
            (Some(outgoing), Some(incoming), Some(slide)) => {
                sliding_pages(outgoing, incoming, slide, width)
            }
            (Some(frame), _, _) => mouse_area(img(frame.clone()).opacity(controls.surface_opacity))
                .on_press(Message::CanvasTapped)
                .into(),
            (None, _, _) => text("Rendering page...").into(),
        };
        let canvas = mouse_area(
            container(page)
                .width(Length::Fill)
                .height(Length::Fill)
                .center_x(Length::Fill)
                .center_y(Length::Fill)
                .clip(true),
        )
        .on_press(Message::ControlsTapped);

        let mut content = column![];
        if !self.config.auto_hide_controls || self.visibility.is_visible() {
            content = content.push(mouse_area(toolbar).on_press(Message::ControlsTapped));
        }
        content = content.push(canvas);
        if let Some(notice) = viewer.notice() {
            content = content.push(
                container(text(notice).color(Color::from_rgb(0.9, 0.6, 0.2)))
                    .padding(10),
            );
        }
        content.into()
    }
}

/// Both pages of a running slide, each shifted by its signed offset.
fn sliding_pages<'a>(
    outgoing: &img::Handle,
    incoming: &img::Handle,
    slide: SlideFrame,
    width: f32,
) -> Element<'a, Message> {
    let layer = |handle: &img::Handle, offset: f32| {
        let (left, right) = shift_spacing(offset * width);
        container(row![
            Space::with_width(Length::Fixed(left)),
            img(handle.clone()),
            Space::with_width(Length::Fixed(right)),
        ])
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
    };
    stack![
        layer(outgoing, slide.outgoing_offset()),
        layer(incoming, slide.incoming_offset()),
    ]
    .width(Length::Fill)
    .height(Length::Fill)
    .into()
}

/// Spacing on either side of a centered page that moves it `shift` pixels
/// to the right (left when negative).
fn shift_spacing(shift: f32) -> (f32, f32) {
    if shift >= 0.0 {
        (2.0 * shift, 0.0)
    } else {
        (0.0, -2.0 * shift)
    }
}

fn centered<'a>(content: impl Into<Element<'a, Message>>) -> Element<'a, Message> {
    container(content)
        .width(Length::Fill)
        .height(Length::Fill)
        .center_x(Length::Fill)
        .center_y(Length::Fill)
        .into()
}
