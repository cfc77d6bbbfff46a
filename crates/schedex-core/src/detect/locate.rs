//! Model-guided panel location.
//!
//! The whole sheet goes to the vision model, which answers with percentage
//! bounding boxes and the panel names it read. Slower and costlier than the
//! contour detector, but it copes with schedules that have no closed border.

use image::DynamicImage;
use serde::Deserialize;
use tracing::{info, warn};

use super::{CandidateRegion, Rect};
use crate::error::SchedexError;
use crate::extraction::{prompts, VisionModel};
use crate::parsing::prepare_reply;

/// Bounding box as percentages (0-100) of the page size.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct PercentBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Default for PercentBox {
    fn default() -> Self {
        PercentBox {
            x1: 0.0,
            y1: 0.0,
            x2: 100.0,
            y2: 100.0,
        }
    }
}

impl PercentBox {
    /// Pixel rectangle on a `width` x `height` page, clamped to the page.
    pub fn to_rect(&self, width: u32, height: u32) -> Option<Rect> {
        let px = |percent: f64, extent: u32| (percent * f64::from(extent) / 100.0) as u32;
        Rect::from_corners_clamped(
            px(self.x1, width),
            px(self.y1, height),
            px(self.x2, width),
            px(self.y2, height),
            width,
            height,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LocatedPanel {
    pub panel_name: String,
    pub bbox: PercentBox,
}

#[derive(Debug, Deserialize)]
struct LocatorReply {
    panels: Option<Vec<RawLocation>>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    panel_name: Option<String>,
    #[serde(default)]
    bbox: PercentBox,
}

/// Decode the locator reply. Unnamed panels become `unknown_<index>`.
pub fn parse_locations(reply: &str) -> Result<Vec<LocatedPanel>, SchedexError> {
    let text = prepare_reply(reply);
    if text.is_empty() {
        return Err(SchedexError::ModelReply("empty response".into()));
    }
    let parsed: LocatorReply =
        serde_json::from_str(&text).map_err(|e| SchedexError::ModelReply(e.to_string()))?;
    let panels = parsed
        .panels
        .ok_or_else(|| SchedexError::ModelReply("reply has no \"panels\" array".into()))?;

    Ok(panels
        .into_iter()
        .enumerate()
        .map(|(idx, raw)| LocatedPanel {
            panel_name: raw
                .panel_name
                .filter(|n| !n.trim().is_empty())
                .unwrap_or_else(|| format!("unknown_{idx}")),
            bbox: raw.bbox,
        })
        .collect())
}

/// Crop located panels out of the page, in reply order.
///
/// Boxes that fall off the page are dropped with a warning.
pub fn crop_located(image: &DynamicImage, located: &[LocatedPanel]) -> Vec<CandidateRegion> {
    let (width, height) = (image.width(), image.height());
    located
        .iter()
        .filter_map(|panel| match panel.bbox.to_rect(width, height) {
            Some(rect) => Some(CandidateRegion::from_crop(
                panel.panel_name.clone(),
                image,
                rect,
            )),
            None => {
                warn!(
                    panel = %panel.panel_name,
                    bbox = ?panel.bbox,
                    "located box has no area on the page"
                );
                None
            }
        })
        .collect()
}

/// Ask the model where the panels are and crop them.
pub fn locate_panels(
    image: &DynamicImage,
    model: &dyn VisionModel,
) -> Result<Vec<CandidateRegion>, SchedexError> {
    let reply = model.generate(prompts::PANEL_LOCATION, image)?;
    let located = parse_locations(&reply)?;
    if !located.is_empty() {
        info!(count = located.len(), "model located panel(s)");
    }
    Ok(crop_located(image, &located))
}
