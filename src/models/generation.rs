use serde::{Deserialize, Serialize};

/// Final instruction text sent to the image model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompositePrompt {
    pub text: String,
}

/// Input to an [`ImageGenerator`](crate::gemini::ImageGenerator) call.
#[derive(Debug, Clone)]
pub struct ImageGenerationRequest {
    pub prompt: CompositePrompt,
    pub reference: Option<ReferenceImage>,
}

#[derive(Debug, Clone)]
pub struct ReferenceImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct GenerationResult {
    pub image_base64: String, // Base64 encoded, as returned by the model
    pub mime_type: String,
    pub model: String,
}

/// One unit of a candidate's content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    Text { content: String },
    Binary { data: String, mime_type: String },
}

// Wire format of the Gemini `generateContent` endpoint.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    pub generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
pub struct Content {
    pub role: &'static str,
    pub parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RequestPart {
    Text(String),
    InlineData(InlineData),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InlineData {
    #[serde(alias = "mime_type")]
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    pub response_modalities: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    pub candidates: Option<Vec<Candidate>>,
    pub prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub content: Option<CandidateContent>,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ResponsePart {
    InlineData {
        #[serde(rename = "inlineData", alias = "inline_data")]
        inline_data: InlineData,
    },
    Text {
        text: String,
    },
    Other(serde_json::Value),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptFeedback {
    pub block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    pub error: ApiError,
}

#[derive(Debug, Deserialize)]
pub struct ApiError {
    #[serde(default)]
    pub code: u16,
    #[serde(default)]
    pub message: String,
    pub status: Option<String>,
}

impl ResponsePart {
    pub fn into_part(self) -> Option<Part> {
        match self {
            ResponsePart::InlineData { inline_data } => Some(Part::Binary {
                data: inline_data.data,
                mime_type: inline_data.mime_type,
            }),
            ResponsePart::Text { text } => Some(Part::Text { content: text }),
            ResponsePart::Other(_) => None,
        }
    }
}
