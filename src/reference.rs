use crate::config::AssetConfig;
use crate::error::{DesignError, Result};
use reqwest::Url;

const VERSION_PREFIX: &str = "v1/";
const RAW_HINT: &str = "raw=1";

/// Turns CMS media references (`wix:image://v1/<mediaId>/<name>#<meta>`) into
/// URLs on the static media host. Plain `http(s)` URLs pass through untouched.
#[derive(Debug, Clone)]
pub struct ReferenceLocator {
    media_base_url: String,
    raw_hint: bool,
}

impl ReferenceLocator {
    pub fn new(media_base_url: impl Into<String>, raw_hint: bool) -> Self {
        Self {
            media_base_url: media_base_url.into().trim_end_matches('/').to_string(),
            raw_hint,
        }
    }

    pub fn from_config(config: &AssetConfig) -> Self {
        Self::new(config.media_base_url.clone(), config.raw_hint)
    }

    pub fn resolve(&self, reference: &str) -> Result<String> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(DesignError::InvalidReference(
                "image reference is empty".into(),
            ));
        }

        if is_web_url(reference) {
            check_web_url(reference)?;
            return Ok(reference.to_string());
        }

        let media_id = media_id(reference)?;
        let mut url = format!("{}/media/{}", self.media_base_url, media_id);
        if self.raw_hint {
            url.push('?');
            url.push_str(RAW_HINT);
        }
        Ok(url)
    }
}

fn is_web_url(reference: &str) -> bool {
    ["http://", "https://"].iter().any(|scheme| {
        reference
            .get(..scheme.len())
            .is_some_and(|prefix| prefix.eq_ignore_ascii_case(scheme))
    })
}

/// The string itself is what gets fetched; parsing only rejects URLs the
/// fetcher could never reach.
fn check_web_url(reference: &str) -> Result<()> {
    let url = Url::parse(reference)
        .map_err(|e| DesignError::InvalidReference(format!("{}: {}", e, reference)))?;
    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(()),
        _ => Err(DesignError::InvalidReference(format!(
            "URL has no host: {}",
            reference
        ))),
    }
}

/// Extracts the segment right after `v1/`, up to the next `/`, `#` or `?`.
fn media_id(reference: &str) -> Result<&str> {
    let invalid = || DesignError::InvalidReference(format!("unrecognized reference: {}", reference));

    let (scheme, rest) = reference.split_once("://").ok_or_else(invalid)?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '+' | '-' | '.'))
    {
        return Err(invalid());
    }

    let rest = rest.strip_prefix(VERSION_PREFIX).ok_or_else(invalid)?;
    let end = rest.find(['/', '#', '?']).unwrap_or(rest.len());
    let media_id = &rest[..end];

    if media_id.is_empty()
        || !media_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '~' | '-'))
    {
        return Err(invalid());
    }

    Ok(media_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locator() -> ReferenceLocator {
        ReferenceLocator::new("https://static.wixstatic.com", true)
    }

    #[test]
    fn web_urls_pass_through_unchanged() {
        for url in [
            "https://already.https/url.jpg",
            "http://example.com/a/b.png?x=1#frag",
            "HTTPS://Example.com/Upper.JPG",
        ] {
            assert_eq!(locator().resolve(url).unwrap(), url);
        }
    }

    #[test]
    fn media_reference_keeps_only_the_identifier() {
        let url = locator()
            .resolve("wix:image://v1/ABC123~mv2.jpg/name.jpg#originWidth=1600&originHeight=900")
            .unwrap();
        assert_eq!(
            url,
            "https://static.wixstatic.com/media/ABC123~mv2.jpg?raw=1"
        );
        assert!(!url.contains("name.jpg"));
        assert!(!url.contains("originWidth"));
    }

    #[test]
    fn metadata_directly_after_identifier_is_dropped() {
        let url = locator()
            .resolve("wix:image://v1/11062b_abc~mv2.png#originWidth=10")
            .unwrap();
        assert_eq!(url, "https://static.wixstatic.com/media/11062b_abc~mv2.png?raw=1");
    }

    #[test]
    fn raw_hint_can_be_disabled() {
        let locator = ReferenceLocator::new("https://media.example.com/", false);
        assert_eq!(
            locator.resolve("wix:image://v1/XYZ~mv2.webp/x.webp").unwrap(),
            "https://media.example.com/media/XYZ~mv2.webp"
        );
    }

    #[test]
    fn malformed_references_are_rejected() {
        for reference in [
            "",
            "   ",
            "not a url",
            "wix:image://v2/ABC/name.jpg",
            "wix:image://v1/",
            "wix:image://v1/#originWidth=3",
            "wix:image://v1/AB C/name.jpg",
            "://v1/ABC",
            "ftp//v1/ABC",
            "https://",
            "http://",
            "http://exa mple.com/x.jpg",
            "https://[oops/x.jpg",
        ] {
            let err = locator().resolve(reference).unwrap_err();
            assert!(
                matches!(err, DesignError::InvalidReference(_)),
                "{:?} should be rejected",
                reference
            );
        }
    }
}
