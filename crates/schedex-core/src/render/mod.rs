pub mod pdftoppm;

use image::DynamicImage;
use std::path::Path;

use crate::error::SchedexError;

/// Extensions decoded directly as page images.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "bmp", "tiff", "tif"];

/// Trait for PDF rasterization backends.
pub trait PdfRenderer: Send + Sync {
    /// Render every page of the document, in page order.
    fn render_pages(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, SchedexError>;

    /// Name of this rendering backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Decode an image file and reject zero-area rasters.
pub fn load_image(path: &Path) -> Result<DynamicImage, SchedexError> {
    let image = image::open(path).map_err(|e| SchedexError::ImageDecode {
        path: path.to_path_buf(),
        reason: e.to_string(),
    })?;
    ensure_non_empty(&image)?;
    Ok(image)
}

/// Detection needs a page with area; callers check before invoking it.
pub fn ensure_non_empty(image: &DynamicImage) -> Result<(), SchedexError> {
    if image.width() == 0 || image.height() == 0 {
        return Err(SchedexError::EmptyImage {
            width: image.width(),
            height: image.height(),
        });
    }
    Ok(())
}

pub fn is_image_path(path: &Path) -> bool {
    has_extension(path, IMAGE_EXTENSIONS)
}

pub fn is_pdf_path(path: &Path) -> bool {
    has_extension(path, &["pdf"])
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
