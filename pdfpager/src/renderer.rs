use anyhow::{Context, Result};
use pdfium_render::prelude::*;
use pdfpager_core::{
    DocumentHandle, DocumentRenderer, LoadError, PageHandle, PageSize, RenderError, Surface,
    Viewport,
};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::mpsc;
use std::thread;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// Requests served by the PDFium worker thread.
enum Job {
    PageSize {
        index: u16,
        reply: oneshot::Sender<Result<PageSize, String>>,
    },
    Render {
        index: u16,
        width: u32,
        height: u32,
        reply: oneshot::Sender<Result<image::RgbaImage, String>>,
    },
}

/// PDF renderer using pdfium-render.
///
/// PDFium bindings and documents stay on one dedicated thread; the handles
/// handed out here only talk to that thread over a channel.
#[derive(Debug, Default)]
pub struct PdfiumRenderer;

impl DocumentRenderer for PdfiumRenderer {
    type Document = PdfiumDocument;

    fn open_document(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<PdfiumDocument, LoadError>> + Send {
        let path = path.to_path_buf();
        async move {
            if !path.exists() {
                return Err(LoadError::NotFound(path));
            }

            let (opened_tx, opened_rx) = oneshot::channel();
            let (jobs, job_rx) = mpsc::channel();
            let worker_path = path.clone();
            thread::Builder::new()
                .name("pdfium".into())
                .spawn(move || run_worker(worker_path, job_rx, opened_tx))
                .map_err(|e| LoadError::Backend(format!("failed to start PDFium worker: {e}")))?;

            let page_count = opened_rx
                .await
                .map_err(|_| LoadError::Backend("PDFium worker exited during load".into()))??;
            info!("PDFium opened {} with {} pages", path.display(), page_count);
            Ok(PdfiumDocument { jobs, page_count })
        }
    }
}

fn bind_pdfium() -> Result<Pdfium> {
    let bindings = Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./"))
        .or_else(|_| Pdfium::bind_to_system_library())
        .context("Failed to bind to PDFium library. Please install PDFium or download the library from https://github.com/bblanchon/pdfium-binaries")?;
    Ok(Pdfium::new(bindings))
}

fn run_worker(
    path: PathBuf,
    jobs: mpsc::Receiver<Job>,
    opened: oneshot::Sender<Result<u32, LoadError>>,
) {
    let pdfium = match bind_pdfium() {
        Ok(pdfium) => pdfium,
        Err(e) => {
            let _ = opened.send(Err(LoadError::Backend(format!("{e:#}"))));
            return;
        }
    };
    let document = match pdfium.load_pdf_from_file(&path, None) {
        Ok(document) => document,
        Err(e) => {
            let _ = opened.send(Err(LoadError::Parse {
                path,
                message: e.to_string(),
            }));
            return;
        }
    };
    let _ = opened.send(Ok(document.pages().len() as u32));

    for job in jobs {
        match job {
            Job::PageSize { index, reply } => {
                let size = document
                    .pages()
                    .get(index)
                    .map(|page| PageSize {
                        width: page.width().value,
                        height: page.height().value,
                    })
                    .map_err(|e| e.to_string());
                let _ = reply.send(size);
            }
            Job::Render {
                index,
                width,
                height,
                reply,
            } => {
                let _ = reply.send(render_page(&document, index, width, height));
            }
        }
    }
    debug!("PDFium worker for {} shutting down", path.display());
}

fn render_page(
    document: &PdfDocument<'_>,
    index: u16,
    width: u32,
    height: u32,
) -> Result<image::RgbaImage, String> {
    let page = document.pages().get(index).map_err(|e| e.to_string())?;

    let render_config = PdfRenderConfig::new()
        .set_target_width(width as i32)
        .set_maximum_height(height as i32);

    let bitmap = page
        .render_with_config(&render_config)
        .map_err(|e| e.to_string())?;

    image::RgbaImage::from_raw(
        bitmap.width() as u32,
        bitmap.height() as u32,
        bitmap.as_rgba_bytes(),
    )
    .ok_or_else(|| "bitmap size does not match its pixel buffer".to_string())
}

fn page_index(page: u32) -> Result<u16, RenderError> {
    page.checked_sub(1)
        .and_then(|index| u16::try_from(index).ok())
        .ok_or_else(|| RenderError::PageUnavailable {
            page,
            message: "page number out of range".into(),
        })
}

/// Handle to a document held by the PDFium worker.
#[derive(Debug)]
pub struct PdfiumDocument {
    jobs: mpsc::Sender<Job>,
    page_count: u32,
}

impl DocumentHandle for PdfiumDocument {
    type Page = PdfiumPage;

    fn page_count(&self) -> u32 {
        self.page_count
    }

    fn get_page(&self, number: u32) -> impl Future<Output = Result<PdfiumPage, RenderError>> + Send {
        let jobs = self.jobs.clone();
        async move {
            let index = page_index(number)?;
            let unavailable = |message: String| RenderError::PageUnavailable {
                page: number,
                message,
            };

            let (reply, response) = oneshot::channel();
            jobs.send(Job::PageSize { index, reply })
                .map_err(|_| unavailable("PDFium worker has stopped".into()))?;
            let size = response
                .await
                .map_err(|_| unavailable("PDFium worker dropped the request".into()))?
                .map_err(unavailable)?;

            Ok(PdfiumPage {
                number,
                index,
                size,
                jobs,
            })
        }
    }
}

pub struct PdfiumPage {
    number: u32,
    index: u16,
    size: PageSize,
    jobs: mpsc::Sender<Job>,
}

impl PageHandle for PdfiumPage {
    fn number(&self) -> u32 {
        self.number
    }

    fn size(&self) -> PageSize {
        self.size
    }

    fn rasterize(
        &self,
        viewport: &Viewport,
        surface: &mut Surface,
    ) -> impl Future<Output = Result<(), RenderError>> + Send {
        let jobs = self.jobs.clone();
        let (page, index) = (self.number, self.index);
        let (width, height) = (viewport.width, viewport.height);
        async move {
            let failed = |message: String| RenderError::Rasterize { page, message };

            let (reply, response) = oneshot::channel();
            jobs.send(Job::Render {
                index,
                width,
                height,
                reply,
            })
            .map_err(|_| failed("PDFium worker has stopped".into()))?;
            let bitmap = response
                .await
                .map_err(|_| failed("PDFium worker dropped the request".into()))?
                .map_err(failed)?;

            if bitmap.dimensions() == (surface.width(), surface.height()) {
                surface.blit(&bitmap);
            } else {
                debug!(
                    "PDFium returned {:?} for a {}x{} viewport",
                    bitmap.dimensions(),
                    width,
                    height
                );
                *surface.image_mut() = bitmap;
            }
            Ok(())
        }
    }
}
