pub mod gemini;
pub mod prompts;

use image::DynamicImage;

use crate::error::SchedexError;

/// Trait for hosted vision-language backends.
pub trait VisionModel: Send + Sync {
    /// Send one image with an instruction and return the model's raw reply text.
    ///
    /// An empty string is a valid reply (e.g., a blocked prompt); callers
    /// decide what it means.
    fn generate(&self, instruction: &str, image: &DynamicImage) -> Result<String, SchedexError>;

    /// Name of this backend (for diagnostics).
    fn backend_name(&self) -> &str;
}
