use crate::error::{DesignError, Result};
use std::env;
use std::time::Duration;

pub const DEFAULT_PORT: u16 = 8080;
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_GEMINI_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MEDIA_BASE: &str = "https://static.wixstatic.com";

pub const MIN_GENERATION_TIMEOUT_SECS: u64 = 120;
pub const MAX_GENERATION_TIMEOUT_SECS: u64 = 300;
const DEFAULT_GENERATION_TIMEOUT_SECS: u64 = 180;
const DEFAULT_ASSET_TIMEOUT_SECS: u64 = 30;

// Headroom between the generation bound and the transport's idle timeout.
const KEEP_ALIVE_MARGIN_SECS: u64 = 30;

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct AssetConfig {
    pub media_base_url: String,
    pub raw_hint: bool,
    pub timeout: Duration,
    pub user_agent: Option<String>,
    pub referer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_allow_origin: String,
}

#[derive(Debug, Clone)]
pub struct LogSettings {
    pub level: String,
    pub json: bool,
    pub file: Option<String>,
}

/// Process-wide configuration, built once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub gemini: GeminiConfig,
    pub assets: AssetConfig,
    pub server: ServerConfig,
    pub log: LogSettings,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        GeminiConfig {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_GENERATION_TIMEOUT_SECS),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Clamped to the supported generation window.
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout = Duration::from_secs(
            secs.clamp(MIN_GENERATION_TIMEOUT_SECS, MAX_GENERATION_TIMEOUT_SECS),
        );
        self
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        AssetConfig {
            media_base_url: DEFAULT_MEDIA_BASE.to_string(),
            raw_hint: true,
            timeout: Duration::from_secs(DEFAULT_ASSET_TIMEOUT_SECS),
            user_agent: None,
            referer: None,
        }
    }
}

impl AssetConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_media_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.media_base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_raw_hint(mut self, enabled: bool) -> Self {
        self.raw_hint = enabled;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_hotlink_headers(
        mut self,
        user_agent: Option<String>,
        referer: Option<String>,
    ) -> Self {
        self.user_agent = user_agent;
        self.referer = referer;
        self
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            host: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            cors_allow_origin: "*".to_string(),
        }
    }
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: "info".to_string(),
            json: false,
            file: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Fails when the
    /// generation credential is missing or a numeric value does not parse.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let api_key = get("GEMINI_API_KEY")
            .or_else(|| get("GOOGLE_API_KEY"))
            .ok_or_else(|| {
                DesignError::Config("GEMINI_API_KEY (or GOOGLE_API_KEY) must be set".into())
            })?;

        let mut gemini = GeminiConfig::new(api_key);
        if let Some(model) = get("GEMINI_MODEL") {
            gemini = gemini.with_model(model);
        }
        if let Some(base) = get("GEMINI_API_BASE") {
            gemini = gemini.with_base_url(base);
        }
        if let Some(secs) = parse_var::<u64>(&get, "GENERATION_TIMEOUT_SECS")? {
            gemini = gemini.with_timeout_secs(secs);
        }

        let mut assets = AssetConfig::new()
            .with_hotlink_headers(get("ASSET_USER_AGENT"), get("ASSET_REFERER"));
        if let Some(base) = get("MEDIA_BASE_URL") {
            assets = assets.with_media_base_url(base);
        }
        if let Some(raw) = get("MEDIA_RAW_HINT") {
            assets = assets.with_raw_hint(parse_flag("MEDIA_RAW_HINT", &raw)?);
        }
        if let Some(secs) = parse_var::<u64>(&get, "ASSET_TIMEOUT_SECS")? {
            assets = assets.with_timeout(Duration::from_secs(secs.max(1)));
        }

        let mut server = ServerConfig::default();
        if let Some(host) = get("HOST") {
            server.host = host;
        }
        if let Some(port) = parse_var::<u16>(&get, "PORT")? {
            server.port = port;
        }
        if let Some(origin) = get("CORS_ALLOW_ORIGIN") {
            server.cors_allow_origin = origin;
        }

        let log = LogSettings {
            level: get("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            json: get("LOG_FORMAT").map_or(false, |format| format.eq_ignore_ascii_case("json")),
            file: get("LOG_FILE"),
        };

        Ok(AppConfig {
            gemini,
            assets,
            server,
            log,
        })
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.server.host.clone(), self.server.port)
    }

    /// Idle timeout for the HTTP transport. Never shorter than the generation
    /// bound, otherwise slow but healthy generations would be cut off.
    pub fn keep_alive(&self) -> Duration {
        self.gemini.timeout + Duration::from_secs(KEEP_ALIVE_MARGIN_SECS)
    }
}

fn parse_var<T: std::str::FromStr>(
    get: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Result<Option<T>> {
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map(Some)
            .map_err(|_| DesignError::Config(format!("{} has an invalid value: {}", key, raw))),
        None => Ok(None),
    }
}

fn parse_flag(key: &str, raw: &str) -> Result<bool> {
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(DesignError::Config(format!(
            "{} has an invalid value: {}",
            key, raw
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_credential_is_fatal() {
        let err = AppConfig::from_lookup(lookup(&[("PORT", "9000")])).unwrap_err();
        assert!(matches!(err, DesignError::Config(_)));

        let err = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "   ")])).unwrap_err();
        assert!(matches!(err, DesignError::Config(_)));
    }

    #[test]
    fn defaults_apply_when_only_key_is_set() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert_eq!(config.gemini.api_key, "k");
        assert_eq!(config.gemini.model, DEFAULT_MODEL);
        assert_eq!(config.gemini.timeout, Duration::from_secs(180));
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.assets.media_base_url, DEFAULT_MEDIA_BASE);
        assert!(config.assets.raw_hint);
        assert_eq!(config.assets.timeout, Duration::from_secs(30));
        assert!(!config.log.json);
    }

    #[test]
    fn google_api_key_is_accepted_as_fallback() {
        let config = AppConfig::from_lookup(lookup(&[("GOOGLE_API_KEY", "g")])).unwrap();
        assert_eq!(config.gemini.api_key, "g");
    }

    #[test]
    fn generation_timeout_is_clamped() {
        let low = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GENERATION_TIMEOUT_SECS", "10"),
        ]))
        .unwrap();
        assert_eq!(low.gemini.timeout, Duration::from_secs(120));

        let high = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GENERATION_TIMEOUT_SECS", "900"),
        ]))
        .unwrap();
        assert_eq!(high.gemini.timeout, Duration::from_secs(300));
    }

    #[test]
    fn keep_alive_outlasts_generation() {
        let config = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k")])).unwrap();
        assert!(config.keep_alive() > config.gemini.timeout);
    }

    #[test]
    fn invalid_numbers_are_rejected() {
        let err = AppConfig::from_lookup(lookup(&[("GEMINI_API_KEY", "k"), ("PORT", "http")]))
            .unwrap_err();
        assert!(err.to_string().contains("PORT"));

        let err = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("MEDIA_RAW_HINT", "maybe"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("MEDIA_RAW_HINT"));
    }

    #[test]
    fn overrides_are_read() {
        let config = AppConfig::from_lookup(lookup(&[
            ("GEMINI_API_KEY", "k"),
            ("GEMINI_MODEL", "gemini-custom"),
            ("GEMINI_API_BASE", "http://localhost:9999/"),
            ("PORT", "3001"),
            ("MEDIA_BASE_URL", "https://media.example.com/"),
            ("MEDIA_RAW_HINT", "false"),
            ("ASSET_USER_AGENT", "Mozilla/5.0"),
            ("ASSET_REFERER", "https://www.example.com/"),
            ("LOG_FORMAT", "JSON"),
        ]))
        .unwrap();
        assert_eq!(config.gemini.model, "gemini-custom");
        assert_eq!(config.gemini.base_url, "http://localhost:9999");
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.assets.media_base_url, "https://media.example.com");
        assert!(!config.assets.raw_hint);
        assert_eq!(config.assets.user_agent.as_deref(), Some("Mozilla/5.0"));
        assert_eq!(
            config.assets.referer.as_deref(),
            Some("https://www.example.com/")
        );
        assert!(config.log.json);
    }
}
