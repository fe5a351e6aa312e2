//! Stylesheet acquisition.
//!
//! The inliner itself never does I/O. Stylesheets reach it as
//! [`StylesheetSource`]s, either collected from `<style>` elements or
//! fetched for `<link rel="stylesheet">` elements through a
//! [`StylesheetResolver`].

use std::fs;
use std::path::{Path, PathBuf};

use url::Url;

use crate::css::url::is_absolute_reference;
use crate::dom::{ArenaNodeId, Document};
use crate::error::{Error, Result};
use crate::options::InlineOptions;
use crate::util::{decode_text, extract_css_charset};

/// Stylesheet text with the context needed to apply it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StylesheetSource {
    pub text: String,
    /// Relative `url()` references are resolved against this.
    pub base_url: Option<Url>,
    /// The `media` attribute of the element the sheet came from.
    pub media: Option<String>,
}

impl StylesheetSource {
    /// Stylesheet text with no base URL or media restriction.
    pub fn embedded(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            base_url: None,
            media: None,
        }
    }

    pub fn with_base_url(mut self, base_url: Url) -> Self {
        self.base_url = Some(base_url);
        self
    }

    pub fn with_media(mut self, media: impl Into<String>) -> Self {
        self.media = Some(media.into());
        self
    }
}

/// A stylesheet fetched by a [`StylesheetResolver`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedStylesheet {
    pub text: String,
    /// The stylesheet's own URL, if known.
    pub base_url: Option<Url>,
}

/// Fetches the stylesheet behind a `<link href>`.
pub trait StylesheetResolver {
    /// Resolve `href` (with any query string and fragment already removed)
    /// for a document whose base URL is `base_url`.
    fn resolve(&self, href: &str, base_url: Option<&Url>) -> Result<ResolvedStylesheet>;
}

impl<F> StylesheetResolver for F
where
    F: Fn(&str, Option<&Url>) -> Result<ResolvedStylesheet>,
{
    fn resolve(&self, href: &str, base_url: Option<&Url>) -> Result<ResolvedStylesheet> {
        self(href, base_url)
    }
}

/// Resolver that finds nothing; linked stylesheets are left in the document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoResolver;

impl StylesheetResolver for NoResolver {
    fn resolve(&self, href: &str, _base_url: Option<&Url>) -> Result<ResolvedStylesheet> {
        Err(Error::NotFound(href.to_string()))
    }
}

/// Resolves linked stylesheets from a local directory.
///
/// `href="/css/mail.css"` and `href="http://example.com/css/mail.css"` (with
/// a base URL of `http://example.com/`) both map to `<root>/css/mail.css`.
/// Other remote URLs are not fetched.
#[derive(Debug, Clone)]
pub struct FileResolver {
    root: PathBuf,
}

impl FileResolver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn local_path<'a>(&self, href: &'a str, base_url: Option<&Url>) -> Option<&'a str> {
        let local = base_url
            .and_then(|base| strip_base(href, base))
            .unwrap_or(href);

        if local.starts_with("//") || (is_absolute_reference(local) && !local.starts_with('/')) {
            return None;
        }
        Some(local)
    }

    /// The file `local` names under the root. `None` if it would leave the
    /// root.
    fn file_path(&self, local: &str) -> Option<PathBuf> {
        let mut segments: Vec<&str> = Vec::new();
        for segment in local.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop()?;
                }
                s if s.contains(':') => return None,
                s => segments.push(s),
            }
        }
        Some(segments.iter().fold(self.root.clone(), |path, s| path.join(s)))
    }
}

/// The part of `href` after the base URL, when `href` starts with the base
/// at a path boundary.
fn strip_base<'a>(href: &'a str, base: &Url) -> Option<&'a str> {
    let rest = href.strip_prefix(base.as_str().trim_end_matches('/'))?;
    (rest.is_empty() || rest.starts_with('/')).then_some(rest)
}

impl StylesheetResolver for FileResolver {
    fn resolve(&self, href: &str, base_url: Option<&Url>) -> Result<ResolvedStylesheet> {
        let local = self
            .local_path(href, base_url)
            .ok_or_else(|| Error::NotFound(href.to_string()))?;

        let path = self
            .file_path(local)
            .ok_or_else(|| Error::NotFound(href.to_string()))?;
        if !path.is_file() {
            return Err(Error::NotFound(href.to_string()));
        }

        let bytes = fs::read(&path)?;
        let text = decode_text(&bytes, extract_css_charset(&bytes)).into_owned();
        log::debug!("loaded {} ({} bytes)", path.display(), bytes.len());

        Ok(ResolvedStylesheet {
            text,
            base_url: base_url.and_then(|base| base.join(local).ok()),
        })
    }
}

/// Strip `?query` and `#fragment` from an href.
fn strip_query(href: &str) -> &str {
    let end = href.find(['?', '#']).unwrap_or(href.len());
    &href[..end]
}

fn is_stylesheet_link(document: &Document, id: ArenaNodeId) -> bool {
    document.dom().get_attr(id, "rel").is_some_and(|rel| {
        let mut tokens = rel.split_ascii_whitespace();
        tokens.clone().any(|t| t.eq_ignore_ascii_case("stylesheet"))
            && !tokens.any(|t| t.eq_ignore_ascii_case("alternate"))
    })
}

fn is_css_type(document: &Document, id: ArenaNodeId) -> bool {
    document
        .dom()
        .get_attr(id, "type")
        .is_none_or(|ty| ty.trim().is_empty() || ty.trim().eq_ignore_ascii_case("text/css"))
}

enum Candidate {
    Style(ArenaNodeId),
    Link(ArenaNodeId, String),
}

/// Collect the stylesheets a document references, in document order.
///
/// `<style>` blocks and resolved `<link rel="stylesheet">` elements whose
/// media is accepted by `options` are removed from the document. Links that
/// fail to resolve are kept and logged.
pub fn collect_stylesheets<R>(
    document: &mut Document,
    resolver: &R,
    options: &InlineOptions,
) -> Vec<StylesheetSource>
where
    R: StylesheetResolver + ?Sized,
{
    let doc: &Document = document;
    let candidates: Vec<Candidate> = doc
        .elements()
        .filter(|&id| is_css_type(doc, id))
        .filter(|&id| options.accepts_media(doc.dom().get_attr(id, "media")))
        .filter_map(|id| match &**doc.dom().element_name(id)? {
            "style" => Some(Candidate::Style(id)),
            "link" if is_stylesheet_link(doc, id) => {
                let href = doc.dom().get_attr(id, "href")?.trim();
                (!href.is_empty()).then(|| Candidate::Link(id, href.to_string()))
            }
            _ => None,
        })
        .collect();

    let mut sources = Vec::new();
    for candidate in candidates {
        match candidate {
            Candidate::Style(id) => {
                let dom = document.dom();
                sources.push(StylesheetSource {
                    text: dom.child_text(id),
                    base_url: options.base_url.clone(),
                    media: dom.get_attr(id, "media").map(str::to_string),
                });
                document.remove(id);
            }
            Candidate::Link(id, href) => {
                match resolver.resolve(strip_query(&href), options.base_url.as_ref()) {
                    Ok(resolved) => {
                        sources.push(StylesheetSource {
                            text: resolved.text,
                            base_url: resolved.base_url.or_else(|| options.base_url.clone()),
                            media: document.dom().get_attr(id, "media").map(str::to_string),
                        });
                        document.remove(id);
                    }
                    Err(e) => log::warn!("keeping <link href=\"{href}\">: {e}"),
                }
            }
        }
    }

    log::debug!("collected {} stylesheets", sources.len());
    sources
}

#[cfg(test)]
mod tests {
    use super::*;

    fn static_resolver(href: &str, _base: Option<&Url>) -> Result<ResolvedStylesheet> {
        match href {
            "a.css" => Ok(ResolvedStylesheet {
                text: "div { color: red; }".into(),
                base_url: None,
            }),
            _ => Err(Error::NotFound(href.into())),
        }
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("a.css?v=3"), "a.css");
        assert_eq!(strip_query("a.css#x"), "a.css");
        assert_eq!(strip_query("a.css"), "a.css");
    }

    #[test]
    fn test_collect_style_blocks() {
        let mut doc = Document::parse(
            "<head><style>p { color: red }</style><style media=\"print\">p { color: black }</style></head>\
             <body><style type=\"text/template\">x</style><p>x</p></body>",
        );
        let sources = collect_stylesheets(&mut doc, &NoResolver, &InlineOptions::default());

        assert_eq!(sources, [StylesheetSource::embedded("p { color: red }")]);
        let html = doc.to_html();
        assert!(!html.contains("color: red"));
        assert!(html.contains("<style media=\"print\">"));
        assert!(html.contains("text/template"));
    }

    #[test]
    fn test_collect_links() {
        let mut doc = Document::parse(
            "<link rel=\"stylesheet\" href=\"a.css?v=2\" media=\"screen\">\
             <link rel=\"stylesheet\" href=\"missing.css\">\
             <link rel=\"icon\" href=\"a.css\"><div>hi</div>",
        );
        let sources = collect_stylesheets(&mut doc, &static_resolver, &InlineOptions::default());

        assert_eq!(sources.len(), 1);
        assert_eq!(sources[0].text, "div { color: red; }");
        assert_eq!(sources[0].media.as_deref(), Some("screen"));

        let html = doc.to_html();
        assert!(!html.contains("a.css?v=2"));
        assert!(html.contains("missing.css"));
        assert!(html.contains("rel=\"icon\""));
    }

    #[test]
    fn test_embedded_sources_get_document_base() {
        let base = Url::parse("http://example.com/").unwrap();
        let mut doc = Document::parse("<style>p{}</style>");
        let options = InlineOptions::new().with_base_url(base.clone());
        let sources = collect_stylesheets(&mut doc, &NoResolver, &options);
        assert_eq!(sources[0].base_url, Some(base));
    }

    #[test]
    fn test_file_resolver_local_path() {
        let resolver = FileResolver::new("/srv/public");
        let base = Url::parse("http://example.com/").unwrap();

        assert_eq!(resolver.local_path("css/a.css", None), Some("css/a.css"));
        assert_eq!(
            resolver.local_path("http://example.com/css/a.css", Some(&base)),
            Some("/css/a.css")
        );
        assert_eq!(resolver.local_path("http://cdn.example.org/a.css", Some(&base)), None);
        assert_eq!(resolver.local_path("//cdn.example.org/a.css", None), None);
        assert_eq!(
            resolver.local_path("http://example.com.evil.css", Some(&base)),
            None
        );
    }

    #[test]
    fn test_file_resolver_stays_under_root() {
        let resolver = FileResolver::new("/srv/public");

        assert_eq!(
            resolver.file_path("/css/./a.css"),
            Some(PathBuf::from("/srv/public/css/a.css"))
        );
        assert_eq!(
            resolver.file_path("css/../a.css"),
            Some(PathBuf::from("/srv/public/a.css"))
        );
        assert_eq!(resolver.file_path("../secret.css"), None);
        assert_eq!(resolver.file_path("/css/../../secret.css"), None);
        assert_eq!(resolver.file_path("css\\..\\..\\secret.css"), None);
    }
}
