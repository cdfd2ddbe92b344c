pub mod extract;
pub mod image_client;

use crate::{
    error::Result,
    models::{GenerationResult, ImageGenerationRequest},
};
use async_trait::async_trait;

pub use extract::{extract_first_image, ExtractedImage};
pub use image_client::GeminiImageClient;

#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Identifier of the backend model, echoed back to callers.
    fn model(&self) -> &str;

    async fn generate(&self, request: ImageGenerationRequest) -> Result<GenerationResult>;
}
