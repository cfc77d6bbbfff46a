pub mod contour;
pub mod layout;
pub mod locate;

pub use contour::{detect_regions, DetectorConfig};

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Axis-aligned rectangle in page pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge.
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if the rectangle is non-empty and lies inside a `width` x `height` page.
    pub fn fits_within(&self, width: u32, height: u32) -> bool {
        !self.is_empty() && self.right() <= width && self.bottom() <= height
    }

    /// Build a rectangle from corner coordinates, clamped to the page.
    ///
    /// Returns `None` when nothing of the box remains on the page.
    pub fn from_corners_clamped(
        x1: u32,
        y1: u32,
        x2: u32,
        y2: u32,
        width: u32,
        height: u32,
    ) -> Option<Rect> {
        let left = x1.min(width);
        let top = y1.min(height);
        let right = x2.min(width);
        let bottom = y2.min(height);
        if right <= left || bottom <= top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// A cropped sub-image hypothesized to contain one panel schedule.
#[derive(Debug, Clone)]
pub struct CandidateRegion {
    /// Sequential or locator-provided name. Not the real panel identifier.
    pub name: String,
    /// Rectangle as located, before padding.
    pub bounds: Rect,
    /// Rectangle actually cropped.
    pub padded: Rect,
    pub image: DynamicImage,
}

impl CandidateRegion {
    /// Region covering a whole page, for pipelines that skip detection.
    pub fn whole_page(name: impl Into<String>, image: &DynamicImage) -> Self {
        let rect = Rect::new(0, 0, image.width(), image.height());
        CandidateRegion {
            name: name.into(),
            bounds: rect,
            padded: rect,
            image: image.clone(),
        }
    }

    fn from_crop(name: String, page: &DynamicImage, rect: Rect) -> Self {
        CandidateRegion {
            name,
            bounds: rect,
            padded: rect,
            image: page.crop_imm(rect.x, rect.y, rect.width, rect.height),
        }
    }
}

/// Debug file name for a contour-detected crop: `page_03_opencv_panel_01.png`.
pub fn contour_crop_name(page_index: usize, sequence: usize) -> String {
    format!("page_{page_index:02}_opencv_panel_{sequence:02}.png")
}

/// Debug file name for a model-located crop: `page_03_panel_01_PC-LP-01.png`.
pub fn located_crop_name(page_index: usize, sequence: usize, panel_name: &str) -> String {
    format!(
        "page_{page_index:02}_panel_{sequence:02}_{}.png",
        safe_file_stem(panel_name)
    )
}

/// Make a panel name usable as a file name component.
pub fn safe_file_stem(name: &str) -> String {
    name.replace(['/', ':'], "-").replace(' ', "_")
}

/// Write contour-detected crops for human verification.
///
/// Names follow [`contour_crop_name`]; `page_index` only affects the names.
pub fn save_contour_crops(
    regions: &[CandidateRegion],
    page_index: usize,
    dir: &Path,
) -> Vec<PathBuf> {
    save_crops(regions, dir, |seq, _| contour_crop_name(page_index, seq))
}

/// Write each region's image into `dir` under the name chosen by `file_name`
/// (called with the 1-based sequence number).
///
/// A failed write is logged and skipped; it never changes the region list.
/// Returns the paths that were written.
pub fn save_crops<F>(regions: &[CandidateRegion], dir: &Path, file_name: F) -> Vec<PathBuf>
where
    F: Fn(usize, &CandidateRegion) -> String,
{
    let mut written = Vec::new();
    for (i, region) in regions.iter().enumerate() {
        let path = dir.join(file_name(i + 1, region));
        match region.image.save(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "saved crop");
                written.push(path);
            }
            Err(e) => warn!(path = %path.display(), error = %e, "could not save crop"),
        }
    }
    written
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;

    #[test]
    fn crop_names_are_zero_padded() {
        assert_eq!(contour_crop_name(3, 1), "page_03_opencv_panel_01.png");
        assert_eq!(contour_crop_name(12, 10), "page_12_opencv_panel_10.png");
        assert_eq!(
            located_crop_name(1, 2, "PC-LP 01/02:A"),
            "page_01_panel_02_PC-LP_01-02-A.png"
        );
    }

    #[test]
    fn clamped_corners() {
        assert_eq!(
            Rect::from_corners_clamped(10, 20, 2000, 50, 100, 100),
            Some(Rect::new(10, 20, 90, 30))
        );
        assert_eq!(Rect::from_corners_clamped(50, 50, 50, 80, 100, 100), None);
        assert_eq!(Rect::from_corners_clamped(150, 0, 200, 10, 100, 100), None);
    }

    #[test]
    fn save_crops_writes_files_and_tolerates_missing_dir() {
        let page = DynamicImage::ImageRgb8(RgbImage::new(40, 30));
        let regions = vec![CandidateRegion::whole_page("Panel_01", &page)];

        let dir = tempfile::tempdir().unwrap();
        let written = save_contour_crops(&regions, 2, dir.path());
        assert_eq!(written, vec![dir.path().join("page_02_opencv_panel_01.png")]);
        assert!(written[0].exists());

        let missing = dir.path().join("does-not-exist");
        assert!(save_contour_crops(&regions, 2, &missing).is_empty());
    }
}
