pub mod assets;
pub mod config;
pub mod error;
pub mod gemini;
pub mod logger;
pub mod models;
pub mod pipeline;
pub mod prompt;
pub mod reference;
pub mod server;

#[cfg(test)]
mod test_support;

pub use assets::{AssetFetcher, HttpAssetFetcher};
pub use config::{AppConfig, AssetConfig, GeminiConfig};
pub use error::{DesignError, Result};
pub use gemini::{GeminiImageClient, ImageGenerator};
pub use models::{DesignPayload, DesignRequest, GenerationResult, ResolvedAsset};
pub use pipeline::{DesignPipeline, Stage};
pub use reference::ReferenceLocator;
