/// Reference image bytes fetched for a single request.
#[derive(Debug, Clone)]
pub struct ResolvedAsset {
    pub bytes: Vec<u8>,
    pub mime_type: String,
    pub source_url: String,
}
