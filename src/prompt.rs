use crate::models::{CompositePrompt, DesignRequest};

const STYLE_DIRECTIVE: &str = "Create a photorealistic interior design rendering in high resolution (at least 2048px on the long edge). \
Use soft, natural daylight with realistic shadows and reflections. \
Frame the scene as a professional architectural photograph at eye level with a wide-angle lens and straight verticals. \
Do not include any text, captions, logos, labels or watermarks in the image.";

const USER_REQUEST_MARKER: &str = "USER REQUEST:";

/// Builds the instruction text for a design request: style directive,
/// material-fidelity directive, then the caller's prompt verbatim.
pub fn compose(request: &DesignRequest) -> CompositePrompt {
    let text = [
        STYLE_DIRECTIVE.to_string(),
        material_directive(request.label.as_deref()),
        format!("{}\n{}", USER_REQUEST_MARKER, request.prompt),
    ]
    .join("\n\n");

    CompositePrompt { text }
}

fn material_directive(label: Option<&str>) -> String {
    let subject = match label {
        Some(label) => format!("the slab material \"{}\"", label),
        None => "the slab material".to_string(),
    };

    format!(
        "MATERIAL FIDELITY: The attached reference image shows {}. \
Treat it as the authoritative source for the pattern, veining, color and finish of every surface made from this material. \
Reproduce that texture faithfully at a realistic scale; do not invent a new texture, recolor it or substitute a different stone.",
        subject
    )
}
