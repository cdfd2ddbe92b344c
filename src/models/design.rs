use crate::error::{DesignError, Result};
use serde::{Deserialize, Serialize};

pub const EMPTY_PROMPT: &str = "Prompt cannot be empty.";
pub const MISSING_IMAGE_REFERENCE: &str = "Slab image URL is required.";

/// Body of `POST /api/design` as sent by the page builder.
///
/// Every field is optional on the wire so that a missing field surfaces as a
/// validation error with a readable message instead of a JSON decode error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slab_image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slab_label: Option<String>,
}

/// A validated design request. Prompt and image reference are non-blank.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignRequest {
    pub prompt: String,
    pub image_reference: String,
    pub label: Option<String>,
}

impl DesignPayload {
    pub fn validate(&self) -> Result<DesignRequest> {
        let prompt = self
            .prompt
            .as_deref()
            .filter(|prompt| !prompt.trim().is_empty())
            .ok_or_else(|| DesignError::InvalidInput(EMPTY_PROMPT.to_string()))?;

        let image_reference = self
            .slab_image_url
            .as_deref()
            .map(str::trim)
            .filter(|reference| !reference.is_empty())
            .ok_or_else(|| DesignError::InvalidInput(MISSING_IMAGE_REFERENCE.to_string()))?;

        let label = self
            .slab_label
            .as_deref()
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(String::from);

        Ok(DesignRequest {
            prompt: prompt.to_string(),
            image_reference: image_reference.to_string(),
            label,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DesignResponse {
    pub ok: bool,
    pub image_base64: String,
    pub mime_type: String,
    pub model: String,
    pub received: DesignPayload,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub ok: bool,
    pub error: String,
}

impl ErrorBody {
    pub fn new(error: impl Into<String>) -> Self {
        ErrorBody {
            ok: false,
            error: error.into(),
        }
    }
}
