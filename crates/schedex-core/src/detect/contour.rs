use image::{imageops, DynamicImage, GrayImage, Luma};
use imageproc::contours::{find_contours, BorderType, Contour};
use imageproc::contrast::{threshold, ThresholdType};
use imageproc::distance_transform::Norm;
use imageproc::map::map_colors;
use imageproc::morphology::dilate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{CandidateRegion, Rect};
use crate::error::SchedexError;

/// Pixels at or below this intensity count as drawing ink.
///
/// Intensity is BT.601 luma (0.299 R + 0.587 G + 0.114 B), so coloured
/// linework near the threshold falls on the same side as in OpenCV's
/// `BGR2GRAY`.
pub const BINARY_THRESHOLD: u8 = 127;

/// Vertical extent of one reading-order row.
///
/// Tied to the render resolution: rectangles whose tops straddle a multiple
/// of this value land in different rows even when they are visually aligned.
pub const ROW_BUCKET_HEIGHT: u32 = 100;

/// Two passes of a 3x3 square kernel.
const DILATION_RADIUS: u8 = 2;

const LOGGED_LARGE_CONTOURS: usize = 3;
const LARGE_CONTOUR_FRACTION: f64 = 0.05;

/// Size window and padding for contour-based panel detection.
///
/// Percentages are relative to the page dimension on the same axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectorConfig {
    pub min_width_percent: f64,
    pub min_height_percent: f64,
    /// Upper bound keeping the page border itself from being reported.
    pub max_width_percent: f64,
    pub max_height_percent: f64,
    /// Margin added on every side of an accepted rectangle, in pixels.
    pub padding: u32,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        DetectorConfig {
            min_width_percent: 10.0,
            min_height_percent: 10.0,
            max_width_percent: 95.0,
            max_height_percent: 95.0,
            padding: 20,
        }
    }
}

impl DetectorConfig {
    /// Reject windows that can never accept a rectangle.
    ///
    /// [`detect_regions`] does not call this; an invalid window there simply
    /// produces no regions.
    pub fn validate(&self) -> Result<(), SchedexError> {
        let percents = [
            ("min_width_percent", self.min_width_percent),
            ("min_height_percent", self.min_height_percent),
            ("max_width_percent", self.max_width_percent),
            ("max_height_percent", self.max_height_percent),
        ];
        for (name, value) in percents {
            if !value.is_finite() || !(0.0..=100.0).contains(&value) {
                return Err(SchedexError::ConfigInvalid(format!(
                    "{name} must be between 0 and 100, got {value}"
                )));
            }
        }
        if self.min_width_percent >= self.max_width_percent {
            return Err(SchedexError::ConfigInvalid(format!(
                "min_width_percent ({}) must be below max_width_percent ({})",
                self.min_width_percent, self.max_width_percent
            )));
        }
        if self.min_height_percent >= self.max_height_percent {
            return Err(SchedexError::ConfigInvalid(format!(
                "min_height_percent ({}) must be below max_height_percent ({})",
                self.min_height_percent, self.max_height_percent
            )));
        }
        Ok(())
    }

    fn size_window(&self, width: u32, height: u32) -> SizeWindow {
        let (w, h) = (f64::from(width), f64::from(height));
        SizeWindow {
            min_width: w * self.min_width_percent / 100.0,
            max_width: w * self.max_width_percent / 100.0,
            min_height: h * self.min_height_percent / 100.0,
            max_height: h * self.max_height_percent / 100.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SizeWindow {
    min_width: f64,
    max_width: f64,
    min_height: f64,
    max_height: f64,
}

impl SizeWindow {
    /// Strict on both ends.
    fn accepts(&self, rect: &Rect) -> bool {
        let (w, h) = (f64::from(rect.width), f64::from(rect.height));
        w > self.min_width && w < self.max_width && h > self.min_height && h < self.max_height
    }
}

/// Locate rectangular panel-schedule borders on a page.
///
/// The page is thresholded, dilated to close gaps in scanned border lines,
/// and the bounding boxes of its outermost contours are filtered by the size
/// window in `config`. Accepted boxes are padded, clamped to the page, and
/// cropped. Results come back in reading order (row bucket, then x) and are
/// named `Panel_01`, `Panel_02`, ... in that order. Regions may overlap.
pub fn detect_regions(image: &DynamicImage, config: &DetectorConfig) -> Vec<CandidateRegion> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let mask = threshold(
        &luma_bt601(image),
        BINARY_THRESHOLD,
        ThresholdType::BinaryInverted,
    );
    let dilated = dilate(&mask, Norm::LInf, DILATION_RADIUS);

    let mut boxes = external_bounding_rects(&dilated);
    sort_reading_order(&mut boxes);

    let window = config.size_window(width, height);
    debug!(contours = boxes.len(), width, height, "filtering contours for panels");
    debug!(
        "accepting width {:.0}-{:.0}px, height {:.0}-{:.0}px",
        window.min_width, window.max_width, window.min_height, window.max_height
    );

    let mut regions = Vec::new();
    for rect in boxes {
        if should_log_contour(regions.len(), &rect, width, height) {
            debug!(
                "contour {}x{} ({:.1}% x {:.1}%)",
                rect.width,
                rect.height,
                f64::from(rect.width) / f64::from(width) * 100.0,
                f64::from(rect.height) / f64::from(height) * 100.0
            );
        }

        if !window.accepts(&rect) {
            continue;
        }

        let padded = pad_rect(rect, config.padding, width, height);
        let name = format!("Panel_{:02}", regions.len() + 1);
        debug!(%name, w = rect.width, h = rect.height, "accepted region");
        regions.push(CandidateRegion {
            name,
            bounds: rect,
            padded,
            image: image.crop_imm(padded.x, padded.y, padded.width, padded.height),
        });
    }

    regions
}

/// Sort key placing rectangles row by row, left to right within a row.
pub fn reading_order_key(rect: &Rect) -> (u32, u32) {
    (rect.y / ROW_BUCKET_HEIGHT, rect.x)
}

/// Stable sort into reading order; ties keep contour discovery order.
pub fn sort_reading_order(rects: &mut [Rect]) {
    rects.sort_by_key(reading_order_key);
}

/// Grow `rect` by `padding` on every side without leaving the page.
pub fn pad_rect(rect: Rect, padding: u32, width: u32, height: u32) -> Rect {
    let x = rect.x.saturating_sub(padding);
    let y = rect.y.saturating_sub(padding);
    let grow = padding.saturating_mul(2);
    Rect {
        x,
        y,
        width: rect.width.saturating_add(grow).min(width - x),
        height: rect.height.saturating_add(grow).min(height - y),
    }
}

/// Grayscale with BT.601 weights, rounded to nearest.
fn luma_bt601(image: &DynamicImage) -> GrayImage {
    map_colors(&image.to_rgb8(), |p| {
        let [r, g, b] = p.0.map(u32::from);
        Luma([((299 * r + 587 * g + 114 * b + 500) / 1000) as u8])
    })
}

/// Bounding boxes of outer borders that are not nested in any other shape.
///
/// The mask is framed with one pixel of background first: `find_contours`
/// reports a shape touching the image edge as a hole, not an outer border.
fn external_bounding_rects(mask: &GrayImage) -> Vec<Rect> {
    let mut framed = GrayImage::new(mask.width() + 2, mask.height() + 2);
    imageops::replace(&mut framed, mask, 1, 1);

    find_contours::<u32>(&framed)
        .iter()
        .filter(|c| matches!(c.border_type, BorderType::Outer) && c.parent.is_none())
        .filter_map(bounding_rect)
        .map(|r| Rect::new(r.x - 1, r.y - 1, r.width, r.height))
        .collect()
}

/// Inclusive pixel extent of a contour, as a rectangle.
fn bounding_rect(contour: &Contour<u32>) -> Option<Rect> {
    let first = contour.points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &contour.points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::new(min_x, min_y, max_x - min_x + 1, max_y - min_y + 1))
}

/// Large contours are logged until the first few panels have been accepted.
fn should_log_contour(accepted: usize, rect: &Rect, width: u32, height: u32) -> bool {
    accepted < LOGGED_LARGE_CONTOURS && is_large(rect, width, height)
}

fn is_large(rect: &Rect, width: u32, height: u32) -> bool {
    f64::from(rect.width) > f64::from(width) * LARGE_CONTOUR_FRACTION
        || f64::from(rect.height) > f64::from(height) * LARGE_CONTOUR_FRACTION
}
