pub mod config;
pub mod detect;
pub mod error;
pub mod extraction;
pub mod model;
pub mod output;
pub mod parsing;
pub mod pipeline;
pub mod render;

use image::DynamicImage;
use tracing::debug;

use error::SchedexError;
use extraction::{prompts, VisionModel};
use model::ExtractionOutcome;

/// Main API entry point: read the panel schedules in one image.
///
/// Transport failures are errors. A reply that cannot be understood is not:
/// it comes back as [`ExtractionOutcome::ParseFailure`] so callers can move
/// on to the next image.
pub fn extract_panels(
    image: &DynamicImage,
    model: &dyn VisionModel,
) -> Result<ExtractionOutcome, SchedexError> {
    debug!(
        backend = model.backend_name(),
        width = image.width(),
        height = image.height(),
        "requesting panel extraction"
    );
    let reply = model.generate(prompts::PANEL_EXTRACTION, image)?;
    Ok(parsing::parse_extraction_reply(&reply))
}
