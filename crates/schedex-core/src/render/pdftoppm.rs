use image::DynamicImage;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::debug;

use crate::error::SchedexError;
use crate::render::{load_image, PdfRenderer};

const OUTPUT_PREFIX: &str = "page";

/// PDF rendering backend using pdftoppm (from poppler-utils).
pub struct PdftoppmRenderer;

impl PdftoppmRenderer {
    pub fn new() -> Self {
        PdftoppmRenderer
    }
}

impl Default for PdftoppmRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl PdfRenderer for PdftoppmRenderer {
    fn render_pages(&self, pdf_bytes: &[u8], dpi: u32) -> Result<Vec<DynamicImage>, SchedexError> {
        let workdir = tempfile::tempdir().map_err(|e| SchedexError::Render(e.to_string()))?;
        let pdf_path = workdir.path().join("input.pdf");
        let mut pdf = std::fs::File::create(&pdf_path)
            .map_err(|e| SchedexError::Render(e.to_string()))?;
        pdf.write_all(pdf_bytes)
            .map_err(|e| SchedexError::Render(e.to_string()))?;
        drop(pdf);

        let output = Command::new("pdftoppm")
            .arg("-r")
            .arg(dpi.to_string())
            .arg("-png")
            .arg(&pdf_path)
            .arg(workdir.path().join(OUTPUT_PREFIX))
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    SchedexError::PdftoppmNotFound
                } else {
                    SchedexError::Render(format!("pdftoppm failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(SchedexError::PdftoppmFailed { code, stderr });
        }

        let page_files = rendered_page_files(workdir.path())?;
        debug!(pages = page_files.len(), dpi, "rendered PDF");

        page_files.iter().map(|path| load_image(path)).collect()
    }

    fn backend_name(&self) -> &str {
        "pdftoppm"
    }
}

/// Page images written by pdftoppm, in page order.
///
/// pdftoppm names pages `<prefix>-<N>.png`, zero-padding N to the width of
/// the page count, so numeric ordering is taken from the suffix.
fn rendered_page_files(dir: &Path) -> Result<Vec<PathBuf>, SchedexError> {
    let mut pages: Vec<(u32, PathBuf)> = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if let Some(number) = page_number(&path) {
            pages.push((number, path));
        }
    }
    pages.sort_by_key(|(number, _)| *number);
    Ok(pages.into_iter().map(|(_, path)| path).collect())
}

fn page_number(path: &Path) -> Option<u32> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let digits = stem.strip_prefix(OUTPUT_PREFIX)?.strip_prefix('-')?;
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_numbers_from_file_names() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number(Path::new("/tmp/x/other-3.png")), None);
    }

    #[test]
    fn rendered_files_sort_numerically() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["page-10.png", "page-02.png", "page-01.png", "input.pdf"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        let files = rendered_page_files(dir.path()).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, ["page-01.png", "page-02.png", "page-10.png"]);
    }
}
