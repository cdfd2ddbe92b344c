use crate::{
    assets::AssetFetcher,
    error::Result,
    gemini::ImageGenerator,
    logger, prompt,
    models::{DesignPayload, GenerationResult, ImageGenerationRequest, ReferenceImage},
    reference::ReferenceLocator,
};
use std::fmt;
use std::sync::Arc;

/// Steps of a single design request, in execution order. Any step can end
/// in `Failed`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    Resolving,
    Fetching,
    Composing,
    Generating,
    Responding,
    Failed,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Validating => "validating",
            Stage::Resolving => "resolving",
            Stage::Fetching => "fetching",
            Stage::Composing => "composing",
            Stage::Generating => "generating",
            Stage::Responding => "responding",
            Stage::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs validate → resolve → fetch → compose → generate for one request.
/// Stages run strictly in sequence; the first failure ends the request.
#[derive(Clone)]
pub struct DesignPipeline {
    locator: ReferenceLocator,
    fetcher: Arc<dyn AssetFetcher>,
    generator: Arc<dyn ImageGenerator>,
}

impl DesignPipeline {
    pub fn new(
        locator: ReferenceLocator,
        fetcher: Arc<dyn AssetFetcher>,
        generator: Arc<dyn ImageGenerator>,
    ) -> Self {
        Self {
            locator,
            fetcher,
            generator,
        }
    }

    pub fn model(&self) -> &str {
        self.generator.model()
    }

    pub async fn run(&self, request_id: &str, payload: &DesignPayload) -> Result<GenerationResult> {
        let mut tracker = StageTracker::new(request_id);

        let request = tracker.enter(Stage::Validating, || payload.validate())?;

        let url = tracker.enter(Stage::Resolving, || {
            self.locator.resolve(&request.image_reference)
        })?;

        tracker.advance(Stage::Fetching);
        let asset = {
            let _timer = logger::timer("fetch reference image");
            tracker.record(self.fetcher.fetch(&url).await)?
        };
        log::info!(
            "[req:{}] Reference image ready: {} bytes of {} from {}",
            request_id,
            asset.bytes.len(),
            asset.mime_type,
            asset.source_url
        );

        let composite = tracker.enter(Stage::Composing, || Ok(prompt::compose(&request)))?;
        log::debug!(
            "[req:{}] Composite prompt ({} chars)",
            request_id,
            composite.text.len()
        );

        tracker.advance(Stage::Generating);
        let result = tracker.record(
            self.generator
                .generate(ImageGenerationRequest {
                    prompt: composite,
                    reference: Some(ReferenceImage {
                        bytes: asset.bytes,
                        mime_type: asset.mime_type,
                    }),
                })
                .await,
        )?;

        tracker.advance(Stage::Responding);
        Ok(result)
    }
}

struct StageTracker<'a> {
    request_id: &'a str,
    stage: Stage,
}

impl<'a> StageTracker<'a> {
    fn new(request_id: &'a str) -> Self {
        log::debug!("[req:{}] -> {}", request_id, Stage::Validating);
        Self {
            request_id,
            stage: Stage::Validating,
        }
    }

    fn advance(&mut self, stage: Stage) {
        if stage != self.stage && self.stage != Stage::Failed {
            log::debug!("[req:{}] {} -> {}", self.request_id, self.stage, stage);
            self.stage = stage;
        }
    }

    fn enter<T>(&mut self, stage: Stage, step: impl FnOnce() -> Result<T>) -> Result<T> {
        self.advance(stage);
        self.record(step())
    }

    fn record<T>(&mut self, outcome: Result<T>) -> Result<T> {
        if let Err(e) = &outcome {
            if e.is_client_error() {
                log::warn!("[req:{}] failed while {}: {}", self.request_id, self.stage, e);
            } else {
                log::error!("[req:{}] failed while {}: {}", self.request_id, self.stage, e);
            }
            self.advance(Stage::Failed);
        }
        outcome
    }
}
