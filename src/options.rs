//! Inliner configuration.

use url::Url;

use crate::error::Result;

/// Media types whose stylesheets are applied by default.
pub const DEFAULT_MEDIA_TYPES: &[&str] = &["all", "handheld", "screen"];

/// Options for an [`Inliner`](crate::Inliner).
///
/// ```
/// use inkpot::InlineOptions;
///
/// let options = InlineOptions::new()
///     .with_base_url(inkpot::parse_base_url("example.com").unwrap())
///     .with_body_only(false);
/// assert_eq!(options.base_url.unwrap().as_str(), "http://example.com/");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineOptions {
    /// Base URL of the document. Relative `url()` references in embedded
    /// stylesheets are resolved against it.
    pub base_url: Option<Url>,
    /// Only write `style` attributes inside `<body>`.
    pub body_only: bool,
    /// Lower-cased media types accepted on `<style>` and `<link>` elements.
    pub media_types: Vec<String>,
}

impl Default for InlineOptions {
    fn default() -> Self {
        Self {
            base_url: None,
            body_only: true,
            media_types: DEFAULT_MEDIA_TYPES.iter().map(|m| m.to_string()).collect(),
        }
    }
}

impl InlineOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_body_only(mut self, body_only: bool) -> Self {
        self.body_only = body_only;
        self
    }

    pub fn with_media_types<I, S>(mut self, media_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.media_types = media_types
            .into_iter()
            .map(|m| m.as_ref().trim().to_ascii_lowercase())
            .collect();
        self
    }

    /// Check a `media` attribute value against the accepted media types.
    /// A missing or blank attribute always passes.
    pub fn accepts_media(&self, media: Option<&str>) -> bool {
        let Some(media) = media.filter(|m| !m.trim().is_empty()) else {
            return true;
        };

        media.split(',').any(|entry| {
            let entry = entry.trim();
            self.media_types.iter().any(|m| entry.eq_ignore_ascii_case(m))
        })
    }
}

/// Parse a document base URL.
///
/// A bare host such as `example.com` or `example.com/mail/` is accepted and
/// assumed to be `http://`.
pub fn parse_base_url(input: &str) -> Result<Url> {
    let input = input.trim();
    match Url::parse(input) {
        Ok(url) => Ok(url),
        Err(url::ParseError::RelativeUrlWithoutBase) => Ok(Url::parse(&format!("http://{input}"))?),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = InlineOptions::default();
        assert!(options.base_url.is_none());
        assert!(options.body_only);
        assert_eq!(options.media_types, ["all", "handheld", "screen"]);
    }

    #[test]
    fn test_accepts_media() {
        let options = InlineOptions::default();
        assert!(options.accepts_media(None));
        assert!(options.accepts_media(Some("screen")));
        assert!(options.accepts_media(Some("print, Screen")));
        assert!(options.accepts_media(Some("ALL")));
        assert!(!options.accepts_media(Some("print")));
        assert!(!options.accepts_media(Some("screen and (max-width: 600px)")));
    }

    #[test]
    fn test_blank_media_means_all() {
        let options = InlineOptions::new().with_media_types(["print"]);
        assert!(options.accepts_media(Some("")));
        assert!(options.accepts_media(Some("  ")));
    }

    #[test]
    fn test_custom_media_types() {
        let options = InlineOptions::new().with_media_types(["Print"]);
        assert!(options.accepts_media(Some("print")));
        assert!(!options.accepts_media(Some("screen")));
    }

    #[test]
    fn test_parse_base_url() {
        assert_eq!(parse_base_url("http://example.com/a/").unwrap().as_str(), "http://example.com/a/");
        assert_eq!(parse_base_url("example.com").unwrap().as_str(), "http://example.com/");
        assert_eq!(
            parse_base_url(" example.com/mail/ ").unwrap().as_str(),
            "http://example.com/mail/"
        );
        assert!(parse_base_url("http://[bad").is_err());
    }
}
