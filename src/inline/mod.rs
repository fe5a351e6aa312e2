//! The inliner.
//!
//! Each rule of the applied stylesheets is classified once (see
//! [`placement::classify`]):
//!
//! - rules inside a media query other than `all` are copied into a
//!   `<style>` element in `<head>`, grouped by query;
//! - rules whose selector cannot be expressed inline (`a:hover`,
//!   `p::first-line`, at-rules) are copied into the same `<style>` element;
//! - everything else is matched against the document, resolved through the
//!   cascade and written as `style` attributes. Vendor-prefixed
//!   declarations of those rules stay in the head.

pub mod cascade;
pub mod head;
pub mod placement;

use selectors::parser::Selector;
use url::Url;

use crate::css::{Declaration, Rule, Stylesheet};
use crate::dom::{ArenaNodeId, Document, InkSelectors};
use crate::options::InlineOptions;
use crate::source::{NoResolver, StylesheetResolver, StylesheetSource, collect_stylesheets};
use crate::util::{decode_text, extract_meta_charset};

use cascade::{Cascade, DeclarationBlock};
use head::{HeadStylesheet, render_declarations, render_rule};
use placement::{Placement, compile_for_inlining};

/// Inlines CSS into HTML documents.
///
/// Holds only its options, so one inliner can be shared across threads.
///
/// ```
/// use inkpot::Inliner;
///
/// let html = "<style>p { color: red }</style><p>Hello</p>";
/// let out = Inliner::default().inline(html);
/// assert!(out.contains(r#"<p style="color: red">Hello</p>"#));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Inliner {
    options: InlineOptions,
}

impl Inliner {
    pub fn new(options: InlineOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &InlineOptions {
        &self.options
    }

    /// Inline the document's own `<style>` blocks. Linked stylesheets are
    /// left in place.
    pub fn inline(&self, html: &str) -> String {
        self.inline_with_resolver(html, &NoResolver)
    }

    /// Inline `<style>` blocks and the `<link rel="stylesheet">` elements
    /// `resolver` can fetch.
    pub fn inline_with_resolver<R>(&self, html: &str, resolver: &R) -> String
    where
        R: StylesheetResolver + ?Sized,
    {
        let mut document = Document::parse(html);
        let sources = collect_stylesheets(&mut document, resolver, &self.options);
        self.apply(&mut document, &sources);
        document.to_html()
    }

    /// Like [`inline_with_resolver`](Self::inline_with_resolver), for raw
    /// bytes of unknown encoding. A `<meta charset>` is used as a hint when
    /// the bytes are not UTF-8.
    pub fn inline_bytes<R>(&self, html: &[u8], resolver: &R) -> String
    where
        R: StylesheetResolver + ?Sized,
    {
        let text = decode_text(html, extract_meta_charset(html));
        self.inline_with_resolver(&text, resolver)
    }

    /// Apply the given stylesheets to markup without looking at its
    /// `<style>` or `<link>` elements.
    pub fn inline_sources(&self, html: &str, sources: &[StylesheetSource]) -> String {
        let mut document = Document::parse(html);
        self.apply(&mut document, sources);
        document.to_html()
    }

    /// Apply stylesheets to a parsed document in place.
    ///
    /// Sources are applied in order; a later source wins specificity ties.
    /// Sources whose media is not accepted by the options are skipped.
    pub fn apply(&self, document: &mut Document, sources: &[StylesheetSource]) {
        let mut stylesheet = Stylesheet::default();
        for source in sources {
            if !self.options.accepts_media(source.media.as_deref()) {
                log::debug!("skipping stylesheet for media {:?}", source.media);
                continue;
            }
            let base_url = source.base_url.as_ref().or(self.options.base_url.as_ref());
            stylesheet.append(&source.text, base_url);
        }

        if stylesheet.is_empty() {
            return;
        }

        let candidates = if self.options.body_only {
            document.body_elements()
        } else {
            document.elements().collect()
        };

        let mut cascade = Cascade::new();
        let mut head = HeadStylesheet::new();
        for rule in stylesheet.rules() {
            match compile_for_inlining(rule) {
                Ok(selectors) => {
                    inline_rule(document, rule, &selectors, &candidates, &mut cascade, &mut head)
                }
                Err(Placement::HeadMedia) => head.push_media_rule(&rule.media, render_rule(rule)),
                Err(_) => head.push_rule(render_rule(rule)),
            }
        }

        let resolved = cascade.resolve();
        log::debug!(
            "applied {} rules: {} elements styled, {} head entries",
            stylesheet.len(),
            resolved.len(),
            head.len()
        );

        for (element, block) in resolved {
            write_style_attribute(document, element, &block);
        }
        head.write_to(document);
    }
}

fn inline_rule<'a>(
    document: &Document,
    rule: &'a Rule,
    selectors: &[Selector<InkSelectors>],
    candidates: &[ArenaNodeId],
    cascade: &mut Cascade<'a>,
    head: &mut HeadStylesheet,
) {
    let (vendor, plain): (Vec<_>, Vec<_>) = rule
        .declarations()
        .iter()
        .enumerate()
        .partition(|(_, declaration)| declaration.is_vendor_prefixed());

    if !vendor.is_empty() {
        let vendor: Vec<Declaration> = vendor.into_iter().map(|(_, d)| d.clone()).collect();
        head.push_rule(render_declarations(&rule.selector, &vendor));
    }

    if plain.is_empty() {
        return;
    }

    for element in document.query(selectors, candidates) {
        cascade.add(element, rule, plain.iter().copied());
    }
}

/// Append resolved declarations to an element's `style` attribute.
fn write_style_attribute(document: &mut Document, element: ArenaNodeId, block: &DeclarationBlock) {
    let inline = block.to_inline_style();
    let dom = document.dom_mut();

    let style = match dom.get_attr(element, "style") {
        Some(existing) => {
            let existing = existing.trim().trim_end_matches(';').trim_end();
            if existing.is_empty() {
                inline
            } else {
                format!("{existing}; {inline}")
            }
        }
        None => inline,
    };
    dom.set_attr(element, "style", style);
}

/// Inline `html`'s `<style>` blocks with default options.
pub fn inline_css(html: &str) -> String {
    Inliner::default().inline(html)
}

/// Inline `html`'s `<style>` blocks, resolving relative `url()` references
/// against `base_url`.
pub fn inline_css_with_base(html: &str, base_url: Url) -> String {
    Inliner::new(InlineOptions::new().with_base_url(base_url)).inline(html)
}
