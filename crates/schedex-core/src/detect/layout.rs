//! Fixed-layout cropping, for drawing sets whose sheets all share one layout.
//!
//! Boxes are given as fractions of the page and applied blindly; no image
//! analysis is involved.

use image::DynamicImage;
use serde::{Deserialize, Serialize};
use std::path::Path;

use super::{CandidateRegion, Rect};
use crate::error::SchedexError;

/// A named box as fractions of page width/height, each in `[0, 1]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutBox {
    pub name: String,
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FixedLayout {
    pub boxes: Vec<LayoutBox>,
}

impl FixedLayout {
    /// Load a layout from a JSON file.
    pub fn load(path: &Path) -> Result<FixedLayout, SchedexError> {
        let content = std::fs::read_to_string(path).map_err(|e| SchedexError::LayoutLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        let layout: FixedLayout =
            serde_json::from_str(&content).map_err(|e| SchedexError::LayoutLoad {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        layout.validate().map_err(|e| SchedexError::LayoutLoad {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        Ok(layout)
    }

    pub fn validate(&self) -> Result<(), SchedexError> {
        if self.boxes.is_empty() {
            return Err(SchedexError::ConfigInvalid(
                "layout must define at least one box".into(),
            ));
        }
        for b in &self.boxes {
            if b.name.trim().is_empty() {
                return Err(SchedexError::ConfigInvalid(
                    "layout box name must not be empty".into(),
                ));
            }
            let coords = [b.left, b.top, b.right, b.bottom];
            if coords.iter().any(|c| !c.is_finite() || !(0.0..=1.0).contains(c)) {
                return Err(SchedexError::ConfigInvalid(format!(
                    "layout box '{}' has coordinates outside 0..1",
                    b.name
                )));
            }
            if b.left >= b.right || b.top >= b.bottom {
                return Err(SchedexError::ConfigInvalid(format!(
                    "layout box '{}' has no area",
                    b.name
                )));
            }
        }
        Ok(())
    }

    /// Crop every box out of `image`, in layout order.
    ///
    /// Boxes that collapse to nothing at this page size are skipped.
    pub fn crop(&self, image: &DynamicImage) -> Vec<CandidateRegion> {
        let (width, height) = (image.width(), image.height());
        self.boxes
            .iter()
            .filter_map(|b| {
                let rect = b.to_rect(width, height)?;
                Some(CandidateRegion::from_crop(b.name.clone(), image, rect))
            })
            .collect()
    }
}

impl LayoutBox {
    fn to_rect(&self, width: u32, height: u32) -> Option<Rect> {
        let scale = |fraction: f64, extent: u32| (fraction * f64::from(extent)) as u32;
        Rect::from_corners_clamped(
            scale(self.left, width),
            scale(self.top, height),
            scale(self.right, width),
            scale(self.bottom, height),
            width,
            height,
        )
    }
}
