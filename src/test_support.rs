//! Shared fixtures for unit tests.

use crate::{
    assets::AssetFetcher,
    error::{DesignError, Result},
    gemini::ImageGenerator,
    models::{GenerationResult, ImageGenerationRequest, ResolvedAsset},
};
use actix_web::{dev::ServerHandle, web, App, HttpServer};
use async_trait::async_trait;
use std::sync::Mutex;

/// Starts an actix-web server on a random local port and returns its base URL.
/// Must be called from inside an actix runtime (`#[actix_web::test]`).
pub fn spawn_server(routes: fn(&mut web::ServiceConfig)) -> (String, ServerHandle) {
    let server = HttpServer::new(move || App::new().configure(routes))
        .workers(1)
        .disable_signals()
        .bind(("127.0.0.1", 0))
        .expect("bind test server");
    let addr = server.addrs()[0];
    let server = server.run();
    let handle = server.handle();
    actix_web::rt::spawn(server);
    (format!("http://{}", addr), handle)
}

pub struct StubFetcher {
    outcome: std::result::Result<String, u16>,
    urls: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub const BYTES: &'static [u8] = &[0xff, 0xd8, 0xff, 0xe0];

    pub fn ok(mime_type: &str) -> Self {
        Self {
            outcome: Ok(mime_type.to_string()),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(status: u16) -> Self {
        Self {
            outcome: Err(status),
            urls: Mutex::new(Vec::new()),
        }
    }

    pub fn urls(&self) -> Vec<String> {
        self.urls.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.urls.lock().unwrap().len()
    }
}

#[async_trait]
impl AssetFetcher for StubFetcher {
    async fn fetch(&self, url: &str) -> Result<ResolvedAsset> {
        self.urls.lock().unwrap().push(url.to_string());
        match &self.outcome {
            Ok(mime_type) => Ok(ResolvedAsset {
                bytes: Self::BYTES.to_vec(),
                mime_type: mime_type.clone(),
                source_url: url.to_string(),
            }),
            Err(status) => Err(DesignError::AssetFetchFailed {
                status: Some(*status),
                reason: "stubbed failure".into(),
            }),
        }
    }
}

pub struct StubGenerator {
    model: String,
    refusal: Option<String>,
    requests: Mutex<Vec<ImageGenerationRequest>>,
}

impl StubGenerator {
    pub const IMAGE: &'static str = "iVBORw0KGgoAAAANSUhEUg==";

    pub fn ok(model: &str) -> Self {
        Self {
            model: model.to_string(),
            refusal: None,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn refusing(model: &str, text: &str) -> Self {
        Self {
            refusal: Some(text.to_string()),
            ..Self::ok(model)
        }
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> Option<ImageGenerationRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl ImageGenerator for StubGenerator {
    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: ImageGenerationRequest) -> Result<GenerationResult> {
        self.requests.lock().unwrap().push(request);
        match &self.refusal {
            Some(text) => Err(DesignError::NoImageReturned {
                text_snippet: Some(text.clone()),
            }),
            None => Ok(GenerationResult {
                image_base64: Self::IMAGE.to_string(),
                mime_type: "image/png".to_string(),
                model: self.model.clone(),
            }),
        }
    }
}
