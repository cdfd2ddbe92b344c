use crate::{
    config::AssetConfig,
    error::{DesignError, Result},
    models::ResolvedAsset,
};
use async_trait::async_trait;
use reqwest::header::{HeaderValue, CONTENT_TYPE, REFERER, USER_AGENT};
use reqwest::Client;

/// Used when the asset host does not declare a content type.
pub const DEFAULT_MIME_TYPE: &str = "image/jpeg";

// Upstream error pages are logged, never returned; keep only a prefix.
const DIAGNOSTIC_BODY_CHARS: usize = 300;

#[async_trait]
pub trait AssetFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<ResolvedAsset>;
}

/// Single-attempt GET against the asset host.
#[derive(Clone)]
pub struct HttpAssetFetcher {
    client: Client,
    user_agent: Option<String>,
    referer: Option<String>,
}

impl HttpAssetFetcher {
    pub fn new(config: &AssetConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DesignError::Config(format!("asset HTTP client: {}", e)))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
            referer: config.referer.clone(),
        })
    }
}

#[async_trait]
impl AssetFetcher for HttpAssetFetcher {
    async fn fetch(&self, url: &str) -> Result<ResolvedAsset> {
        let mut request = self.client.get(url);
        if let Some(user_agent) = &self.user_agent {
            request = request.header(USER_AGENT, user_agent);
        }
        if let Some(referer) = &self.referer {
            request = request.header(REFERER, referer);
        }

        log::debug!("Fetching reference image: {}", url);

        let response = request.send().await.map_err(|e| {
            log::error!("Reference image request failed for {}: {:?}", url, e);
            transport_failure(&e)
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::debug!(
                "Asset host answered {} for {}: {}",
                status,
                url,
                body.chars().take(DIAGNOSTIC_BODY_CHARS).collect::<String>()
            );
            return Err(DesignError::AssetFetchFailed {
                status: Some(status.as_u16()),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let mime_type = declared_mime(response.headers().get(CONTENT_TYPE));
        let bytes = response.bytes().await.map_err(|e| transport_failure(&e))?;

        log::info!(
            "Fetched reference image ({} bytes, {}) from {}",
            bytes.len(),
            mime_type,
            url
        );

        Ok(ResolvedAsset {
            bytes: bytes.to_vec(),
            mime_type,
            source_url: url.to_string(),
        })
    }
}

fn transport_failure(error: &reqwest::Error) -> DesignError {
    let reason = if error.is_timeout() {
        "request timed out".to_string()
    } else {
        error.to_string()
    };
    DesignError::AssetFetchFailed {
        status: None,
        reason,
    }
}

/// Media type from a `Content-Type` header with parameters stripped.
pub fn declared_mime(header: Option<&HeaderValue>) -> String {
    header
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(';').next())
        .map(|value| value.trim().to_ascii_lowercase())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::spawn_server;
    use actix_web::{web, HttpRequest, HttpResponse};
    use std::time::Duration;

    const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a];

    fn routes(cfg: &mut web::ServiceConfig) {
        cfg.route(
            "/media/slab.png",
            web::get().to(|| async {
                HttpResponse::Ok()
                    .content_type("image/png; charset=binary")
                    .body(PNG_BYTES)
            }),
        )
        .route(
            "/media/broken.jpg",
            web::get().to(|| async {
                HttpResponse::InternalServerError()
                    .content_type("text/html")
                    .body("<html>upstream stack trace secret</html>")
            }),
        )
        .route(
            "/media/protected.jpg",
            web::get().to(|req: HttpRequest| async move {
                let headers = req.headers();
                let allowed = headers.get("user-agent").map(|v| v.as_bytes())
                    == Some(b"SlabBot/1.0".as_slice())
                    && headers.get("referer").map(|v| v.as_bytes())
                        == Some(b"https://builder.example.com/".as_slice());
                if allowed {
                    HttpResponse::Ok().content_type("image/jpeg").body(PNG_BYTES)
                } else {
                    HttpResponse::Forbidden().finish()
                }
            }),
        );
    }

    #[actix_web::test]
    async fn fetches_bytes_and_content_type() {
        let (base, handle) = spawn_server(routes);
        let fetcher = HttpAssetFetcher::new(&AssetConfig::new()).unwrap();

        let url = format!("{}/media/slab.png", base);
        let asset = fetcher.fetch(&url).await.unwrap();
        assert_eq!(asset.bytes, PNG_BYTES);
        assert_eq!(asset.mime_type, "image/png");
        assert_eq!(asset.source_url, url);

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn non_success_status_is_classified_without_body() {
        let (base, handle) = spawn_server(routes);
        let fetcher = HttpAssetFetcher::new(&AssetConfig::new()).unwrap();

        let err = fetcher
            .fetch(&format!("{}/media/broken.jpg", base))
            .await
            .unwrap_err();
        match &err {
            DesignError::AssetFetchFailed { status, .. } => assert_eq!(*status, Some(500)),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!err.to_string().contains("secret"));

        let err = fetcher
            .fetch(&format!("{}/media/missing.jpg", base))
            .await
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Failed to fetch reference image: HTTP 404 Not Found"
        );

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn hotlink_headers_are_sent_when_configured() {
        let (base, handle) = spawn_server(routes);
        let url = format!("{}/media/protected.jpg", base);

        let plain = HttpAssetFetcher::new(&AssetConfig::new()).unwrap();
        assert!(matches!(
            plain.fetch(&url).await,
            Err(DesignError::AssetFetchFailed {
                status: Some(403),
                ..
            })
        ));

        let config = AssetConfig::new().with_hotlink_headers(
            Some("SlabBot/1.0".into()),
            Some("https://builder.example.com/".into()),
        );
        let spoofed = HttpAssetFetcher::new(&config).unwrap();
        let asset = spoofed.fetch(&url).await.unwrap();
        assert_eq!(asset.mime_type, "image/jpeg");

        handle.stop(false).await;
    }

    #[actix_web::test]
    async fn unreachable_host_is_a_fetch_failure() {
        let config = AssetConfig::new().with_timeout(Duration::from_secs(2));
        let fetcher = HttpAssetFetcher::new(&config).unwrap();
        // Port 1 is reserved and closed on test machines.
        let err = fetcher
            .fetch("http://127.0.0.1:1/media/x.jpg")
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            DesignError::AssetFetchFailed { status: None, .. }
        ));
    }

    #[test]
    fn missing_content_type_defaults_to_image() {
        assert_eq!(declared_mime(None), DEFAULT_MIME_TYPE);
        assert_eq!(
            declared_mime(Some(&HeaderValue::from_static("  "))),
            DEFAULT_MIME_TYPE
        );
        assert_eq!(
            declared_mime(Some(&HeaderValue::from_static("Image/WebP"))),
            "image/webp"
        );
    }
}
