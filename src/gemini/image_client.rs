use crate::{
    config::GeminiConfig,
    error::{DesignError, Result},
    gemini::{extract_first_image, ImageGenerator},
    logger,
    models::{
        ApiErrorResponse, Content, GenerateContentRequest, GenerateContentResponse,
        GenerationConfig, GenerationResult, ImageGenerationRequest, InlineData, RequestPart,
    },
};
use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::Client;
use std::time::Duration;

const API_KEY_HEADER: &str = "x-goog-api-key";

/// Client for Gemini's `generateContent` endpoint with image output.
#[derive(Clone)]
pub struct GeminiImageClient {
    client: Client,
    api_key: String,
    model: String,
    endpoint: String,
    timeout: Duration,
}

impl GeminiImageClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        // Image generation routinely takes minutes; the default client
        // timeout is not appropriate here.
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| DesignError::Config(format!("Gemini HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            endpoint: format!(
                "{}/v1beta/models/{}:generateContent",
                config.base_url.trim_end_matches('/'),
                config.model
            ),
            timeout: config.timeout,
        })
    }

    /// Upper bound for one generation call, covering connect through body.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn build_payload(request: ImageGenerationRequest) -> GenerateContentRequest {
        let mut parts = Vec::with_capacity(2);
        // Image before text, as recommended for single-image prompts.
        if let Some(reference) = request.reference {
            parts.push(RequestPart::InlineData(InlineData {
                mime_type: reference.mime_type,
                data: STANDARD.encode(&reference.bytes),
            }));
        }
        parts.push(RequestPart::Text(request.prompt.text));

        GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts,
            }],
            generation_config: GenerationConfig {
                response_modalities: vec!["IMAGE", "TEXT"],
            },
        }
    }

    fn backend_error(&self, error: reqwest::Error) -> DesignError {
        log::error!("Gemini request error details: {:?}", error);
        if error.is_timeout() {
            DesignError::GenerationBackendError(format!(
                "request timed out after {}s",
                self.timeout.as_secs()
            ))
        } else {
            DesignError::GenerationBackendError(error.to_string())
        }
    }
}

#[async_trait]
impl ImageGenerator for GeminiImageClient {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ImageGenerationRequest) -> Result<GenerationResult> {
        let has_reference = request.reference.is_some();
        let payload = Self::build_payload(request);

        log::info!(
            "Generating image with model: {} (reference image: {})",
            self.model,
            if has_reference { "yes" } else { "no" }
        );
        let timer = logger::timer("gemini generateContent");

        let response = self
            .client
            .post(&self.endpoint)
            .header(API_KEY_HEADER, &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| self.backend_error(e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| self.backend_error(e))?;
        drop(timer);

        if !status.is_success() {
            log::error!("Gemini answered {}: {}", status, body);
            let message = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(envelope) => format!(
                    "{} {}: {}",
                    status.as_u16(),
                    envelope.error.status.unwrap_or_default(),
                    envelope.error.message
                ),
                Err(_) => format!("HTTP {}", status),
            };
            return Err(DesignError::GenerationBackendError(message));
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| DesignError::MalformedGenerationResponse(e.to_string()))?;
        let image = extract_first_image(parsed)?;

        log::info!(
            "Model returned {} image ({} base64 chars)",
            image.mime_type,
            image.data.len()
        );

        Ok(GenerationResult {
            image_base64: image.data,
            mime_type: image.mime_type,
            model: self.model.clone(),
        })
    }
}
