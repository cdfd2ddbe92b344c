use crate::{
    error::{DesignError, Result},
    models::{GenerateContentResponse, Part},
};

/// Model text quoted in `NoImageReturned` is cut to this many characters.
pub const TEXT_SNIPPET_CHARS: usize = 100;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedImage {
    pub data: String,
    pub mime_type: String,
}

/// Picks the first inline image out of a `generateContent` response.
///
/// The first candidate is searched first; later candidates are only consulted
/// when it carries no image. Text parts never win over an image, they are
/// only quoted in the error when no image exists at all.
pub fn extract_first_image(response: GenerateContentResponse) -> Result<ExtractedImage> {
    let candidates = response.candidates.unwrap_or_default();

    if candidates.is_empty() {
        if let Some(reason) = response
            .prompt_feedback
            .and_then(|feedback| feedback.block_reason)
        {
            return Err(DesignError::NoImageReturned {
                text_snippet: Some(format!("prompt blocked ({})", reason)),
            });
        }
        return Err(DesignError::MalformedGenerationResponse(
            "response contained no candidates".into(),
        ));
    }

    let first_finish_reason = candidates[0].finish_reason.clone();
    let parts: Vec<Vec<Part>> = candidates
        .into_iter()
        .map(|candidate| {
            candidate
                .content
                .map(|content| {
                    content
                        .parts
                        .into_iter()
                        .filter_map(|part| part.into_part())
                        .collect()
                })
                .unwrap_or_default()
        })
        .collect();

    if let Some(image) = first_binary(&parts) {
        return Ok(image);
    }

    let abnormal_finish = first_finish_reason
        .filter(|reason| reason != "STOP")
        .map(|reason| format!("finish reason {}", reason));

    if parts.iter().all(Vec::is_empty) && abnormal_finish.is_none() {
        return Err(DesignError::MalformedGenerationResponse(
            "candidates carried no content parts".into(),
        ));
    }

    let text_snippet = first_text(&parts).map(snippet).or(abnormal_finish);

    Err(DesignError::NoImageReturned { text_snippet })
}

fn first_binary(candidates: &[Vec<Part>]) -> Option<ExtractedImage> {
    candidates.iter().flatten().find_map(|part| match part {
        Part::Binary { data, mime_type } if !data.is_empty() => Some(ExtractedImage {
            data: data.clone(),
            mime_type: mime_type.clone(),
        }),
        _ => None,
    })
}

fn first_text(candidates: &[Vec<Part>]) -> Option<&str> {
    candidates.iter().flatten().find_map(|part| match part {
        Part::Text { content } if !content.trim().is_empty() => Some(content.trim()),
        _ => None,
    })
}

fn snippet(text: &str) -> String {
    text.chars().take(TEXT_SNIPPET_CHARS).collect()
}
