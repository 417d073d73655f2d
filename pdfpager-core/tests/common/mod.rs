//! Scripted in-memory renderer used by the integration tests.
#![allow(dead_code)]

use pdfpager_core::{
    DocumentHandle, DocumentRenderer, LoadError, PageHandle, PageSize, RenderError, Surface,
    Viewport, ViewerConfig,
};
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

pub const LETTER: PageSize = PageSize {
    width: 612.0,
    height: 792.0,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Started(u32),
    Finished(u32),
}

struct Script {
    pages: u32,
    gate: Option<Arc<Semaphore>>,
    failing: Mutex<HashSet<u32>>,
    events: Mutex<Vec<Event>>,
    active: AtomicUsize,
    max_active: AtomicUsize,
}

/// Document whose rasterization can be held at a gate and made to fail.
///
/// Each rendered page fills the surface with red = page number, so tests can
/// tell which page a surface holds.
#[derive(Clone)]
pub struct ScriptedDocument {
    script: Arc<Script>,
}

impl ScriptedDocument {
    pub fn new(pages: u32) -> Self {
        Self::build(pages, None)
    }

    /// Every rasterization waits for one permit from the returned semaphore.
    pub fn gated(pages: u32) -> (Self, Arc<Semaphore>) {
        let gate = Arc::new(Semaphore::new(0));
        (Self::build(pages, Some(Arc::clone(&gate))), gate)
    }

    fn build(pages: u32, gate: Option<Arc<Semaphore>>) -> Self {
        Self {
            script: Arc::new(Script {
                pages,
                gate,
                failing: Mutex::new(HashSet::new()),
                events: Mutex::new(Vec::new()),
                active: AtomicUsize::new(0),
                max_active: AtomicUsize::new(0),
            }),
        }
    }

    pub fn fail_page(&self, page: u32) {
        self.script.failing.lock().unwrap().insert(page);
    }

    pub fn heal_page(&self, page: u32) {
        self.script.failing.lock().unwrap().remove(&page);
    }

    pub fn events(&self) -> Vec<Event> {
        self.script.events.lock().unwrap().clone()
    }

    pub fn started(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Started(page) => Some(page),
                Event::Finished(_) => None,
            })
            .collect()
    }

    pub fn rendered(&self) -> Vec<u32> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                Event::Finished(page) => Some(page),
                Event::Started(_) => None,
            })
            .collect()
    }

    pub fn max_concurrent(&self) -> usize {
        self.script.max_active.load(Ordering::SeqCst)
    }
}

impl DocumentHandle for ScriptedDocument {
    type Page = ScriptedPage;

    fn page_count(&self) -> u32 {
        self.script.pages
    }

    fn get_page(&self, number: u32) -> impl Future<Output = Result<ScriptedPage, RenderError>> + Send {
        let script = Arc::clone(&self.script);
        async move {
            if number == 0 || number > script.pages {
                return Err(RenderError::PageUnavailable {
                    page: number,
                    message: "out of range".into(),
                });
            }
            Ok(ScriptedPage { number, script })
        }
    }
}

pub struct ScriptedPage {
    number: u32,
    script: Arc<Script>,
}

impl PageHandle for ScriptedPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn size(&self) -> PageSize {
        LETTER
    }

    fn rasterize(
        &self,
        _viewport: &Viewport,
        surface: &mut Surface,
    ) -> impl Future<Output = Result<(), RenderError>> + Send {
        let script = Arc::clone(&self.script);
        let page = self.number;
        async move {
            script.events.lock().unwrap().push(Event::Started(page));
            let active = script.active.fetch_add(1, Ordering::SeqCst) + 1;
            script.max_active.fetch_max(active, Ordering::SeqCst);

            if let Some(gate) = &script.gate {
                gate.acquire().await.expect("gate closed").forget();
            }
            script.active.fetch_sub(1, Ordering::SeqCst);

            if script.failing.lock().unwrap().contains(&page) {
                return Err(RenderError::Rasterize {
                    page,
                    message: "scripted failure".into(),
                });
            }
            for pixel in surface.image_mut().pixels_mut() {
                pixel.0 = [page as u8, 0, 0, 255];
            }
            script.events.lock().unwrap().push(Event::Finished(page));
            Ok(())
        }
    }
}

/// Opens scripted documents registered under a path.
#[derive(Default)]
pub struct ScriptedRenderer {
    documents: HashMap<PathBuf, ScriptedDocument>,
}

impl ScriptedRenderer {
    pub fn with_document(mut self, path: &str, document: ScriptedDocument) -> Self {
        self.documents.insert(PathBuf::from(path), document);
        self
    }
}

impl DocumentRenderer for ScriptedRenderer {
    type Document = ScriptedDocument;

    fn open_document(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<ScriptedDocument, LoadError>> + Send {
        let result = self
            .documents
            .get(path)
            .cloned()
            .ok_or_else(|| LoadError::NotFound(path.to_path_buf()));
        async move { result }
    }
}

pub fn config_for(path: &str) -> ViewerConfig {
    ViewerConfig {
        document: PathBuf::from(path),
        ..ViewerConfig::default()
    }
}

/// Red channel of the top-left pixel: the page number the surface holds.
pub fn page_drawn(surface: &Surface) -> u8 {
    surface.image().get_pixel(0, 0).0[0]
}
