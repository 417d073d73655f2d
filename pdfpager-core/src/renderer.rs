//! Seams to the external document renderer and the drawable surface.
//!
//! Parsing and rasterization belong to the backend behind these traits; this
//! crate only decides which page to draw, at what size, and into which
//! surface.

use crate::error::{LoadError, RenderError};
use crate::queue::RenderRequest;
use image::{Rgba, RgbaImage};
use std::future::Future;
use std::path::Path;
use tracing::debug;

/// Opens documents.
pub trait DocumentRenderer {
    type Document: DocumentHandle;

    fn open_document(
        &self,
        path: &Path,
    ) -> impl Future<Output = Result<Self::Document, LoadError>> + Send;
}

/// A loaded, paginated document.
pub trait DocumentHandle: Send + Sync + 'static {
    type Page: PageHandle;

    fn page_count(&self) -> u32;

    /// Fetch a page by 1-based number.
    fn get_page(&self, number: u32) -> impl Future<Output = Result<Self::Page, RenderError>> + Send;
}

/// One page of a [`DocumentHandle`].
pub trait PageHandle: Send + Sync {
    fn number(&self) -> u32;

    /// Native size in document units (points for PDF).
    fn size(&self) -> PageSize;

    /// Pixel plan for drawing this page at `scale`.
    fn viewport(&self, scale: f32) -> Viewport {
        Viewport::for_page(self.size(), scale)
    }

    /// Draw into `surface`, which has already been resized to `viewport`.
    fn rasterize(
        &self,
        viewport: &Viewport,
        surface: &mut Surface,
    ) -> impl Future<Output = Result<(), RenderError>> + Send;
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

/// Pixel dimensions a page is rasterized at.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
    pub scale: f32,
}

impl Viewport {
    pub fn for_page(size: PageSize, scale: f32) -> Self {
        Self {
            width: ((size.width * scale).floor() as u32).max(1),
            height: ((size.height * scale).floor() as u32).max(1),
            scale,
        }
    }
}

/// Size of the area the page is displayed in, minus nothing.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContainerSize {
    pub width: f32,
    pub height: f32,
}

/// Shrink `scale` so a page of `size` fits inside `container` less `margin`.
///
/// Width is fitted first; if the fitted page is still too tall the height
/// bound wins. A container too small to hold anything leaves the scale alone.
pub fn fit_scale(size: PageSize, scale: f32, container: Option<ContainerSize>, margin: f32) -> f32 {
    let Some(container) = container else {
        return scale;
    };
    let max_width = container.width - margin;
    let max_height = container.height - margin;
    if max_width <= 0.0 || max_height <= 0.0 || size.width <= 0.0 || size.height <= 0.0 {
        return scale;
    }

    let mut effective = scale;
    if size.width * effective > max_width {
        effective = max_width / size.width;
    }
    if size.height * effective > max_height {
        effective = effective.min(max_height / size.height);
    }
    effective
}

/// RGBA raster target for one page.
#[derive(Debug, Clone)]
pub struct Surface {
    image: RgbaImage,
}

impl Default for Surface {
    fn default() -> Self {
        Self::new(1, 1)
    }
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    /// Resize to the viewport, discarding the previous contents.
    pub fn resize(&mut self, viewport: &Viewport) {
        self.image = RgbaImage::from_pixel(
            viewport.width.max(1),
            viewport.height.max(1),
            Rgba([255, 255, 255, 255]),
        );
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbaImage {
        &mut self.image
    }

    /// Replace the contents with a finished bitmap of the same size.
    pub fn blit(&mut self, bitmap: &RgbaImage) {
        image::imageops::replace(&mut self.image, bitmap, 0, 0);
    }

    pub fn to_rgba(&self) -> Vec<u8> {
        self.image.as_raw().clone()
    }
}

/// Fetch, size and draw one page into `surface`.
pub async fn paint<D: DocumentHandle>(
    document: &D,
    request: RenderRequest,
    container: Option<ContainerSize>,
    margin: f32,
    surface: &mut Surface,
) -> Result<Viewport, RenderError> {
    if request.page == 0 || request.page > document.page_count() {
        return Err(RenderError::PageUnavailable {
            page: request.page,
            message: format!("document has {} pages", document.page_count()),
        });
    }
    let page = document.get_page(request.page).await?;
    let scale = fit_scale(page.size(), request.scale, container, margin);
    let viewport = page.viewport(scale);
    debug!(
        "Rendering page {} at {:.2} ({}x{})",
        request.page, scale, viewport.width, viewport.height
    );

    surface.resize(&viewport);
    page.rasterize(&viewport, surface).await?;
    Ok(viewport)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LETTER: PageSize = PageSize {
        width: 612.0,
        height: 792.0,
    };

    #[test]
    fn viewport_scales_page() {
        let viewport = Viewport::for_page(LETTER, 1.5);
        assert_eq!((viewport.width, viewport.height), (918, 1188));
    }

    #[test]
    fn fit_without_container_keeps_scale() {
        assert_eq!(fit_scale(LETTER, 2.0, None, 40.0), 2.0);
    }

    #[test]
    fn fit_shrinks_to_width() {
        let container = ContainerSize {
            width: 652.0,
            height: 5000.0,
        };
        assert_eq!(fit_scale(LETTER, 2.0, Some(container), 40.0), 1.0);
    }

    #[test]
    fn fit_height_wins_when_still_too_tall() {
        let container = ContainerSize {
            width: 2000.0,
            height: 436.0,
        };
        assert_eq!(fit_scale(LETTER, 1.5, Some(container), 40.0), 0.5);
    }

    #[test]
    fn fit_keeps_small_pages() {
        let container = ContainerSize {
            width: 2000.0,
            height: 2000.0,
        };
        assert_eq!(fit_scale(LETTER, 1.0, Some(container), 40.0), 1.0);
    }

    #[test]
    fn surface_resizes_to_viewport() {
        let mut surface = Surface::default();
        surface.resize(&Viewport {
            width: 30,
            height: 20,
            scale: 1.0,
        });
        assert_eq!((surface.width(), surface.height()), (30, 20));
        assert_eq!(surface.to_rgba().len(), 30 * 20 * 4);
    }
}
