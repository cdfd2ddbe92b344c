use thiserror::Error;

#[derive(Debug, Error)]
pub enum DesignError {
    #[error("{0}")]
    InvalidInput(String),

    #[error("Invalid image reference: {0}")]
    InvalidReference(String),

    #[error("Failed to fetch reference image: {}", describe_fetch_failure(.status, .reason))]
    AssetFetchFailed { status: Option<u16>, reason: String },

    #[error("Image generation failed: {0}")]
    GenerationBackendError(String),

    #[error("Malformed generation response: {0}")]
    MalformedGenerationResponse(String),

    #[error("{}", describe_missing_image(.text_snippet))]
    NoImageReturned { text_snippet: Option<String> },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl DesignError {
    /// Caller-fixable errors; everything else is a server-side failure.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            DesignError::InvalidInput(_) | DesignError::InvalidReference(_)
        )
    }

    /// Kinds a retry policy may retry. Input errors never qualify.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            DesignError::AssetFetchFailed { .. } | DesignError::GenerationBackendError(_)
        )
    }
}

fn describe_fetch_failure(status: &Option<u16>, reason: &str) -> String {
    match status {
        Some(code) => format!("HTTP {} {}", code, reason),
        None => reason.to_string(),
    }
}

fn describe_missing_image(text_snippet: &Option<String>) -> String {
    match text_snippet {
        Some(text) => format!("No image returned by model. Model said: {}", text),
        None => "No image returned by model.".to_string(),
    }
}

pub type Result<T> = std::result::Result<T, DesignError>;
