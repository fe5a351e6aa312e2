//! The `<style>` element written into `<head>`.

use std::borrow::Cow;
use std::collections::HashMap;

use crate::css::{Declaration, Rule, RuleBody};
use crate::dom::{ArenaDom, ArenaNodeId, Document};

use super::cascade::DeclarationBlock;

#[derive(Debug, Clone, PartialEq, Eq)]
enum HeadEntry {
    Rule(String),
    Media { query: String, rules: Vec<String> },
}

/// Rules that could not be inlined, in the order they were first seen.
///
/// Rules sharing a media query are grouped into one `@media` block placed
/// where that query first appeared.
#[derive(Debug, Clone, Default)]
pub struct HeadStylesheet {
    entries: Vec<HeadEntry>,
    media_groups: HashMap<String, usize>,
}

impl HeadStylesheet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule rendered with [`render_rule`] or [`render_declarations`].
    pub fn push_rule(&mut self, css: String) {
        self.entries.push(HeadEntry::Rule(css));
    }

    /// Add a rule to the `@media` block for `query`.
    pub fn push_media_rule(&mut self, query: &str, css: String) {
        if let Some(&index) = self.media_groups.get(query)
            && let Some(HeadEntry::Media { rules, .. }) = self.entries.get_mut(index)
        {
            rules.push(css);
            return;
        }

        self.media_groups.insert(query.to_string(), self.entries.len());
        self.entries.push(HeadEntry::Media {
            query: query.to_string(),
            rules: vec![css],
        });
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn to_css(&self) -> String {
        self.entries
            .iter()
            .map(|entry| match entry {
                HeadEntry::Rule(css) => css.clone(),
                HeadEntry::Media { query, rules } => {
                    format!("@media {} {{ {} }}", query, rules.join(" "))
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Write the stylesheet into the document's head. Does nothing when
    /// empty.
    pub fn write_to(&self, document: &mut Document) {
        if self.is_empty() {
            return;
        }

        let css = self.to_css();
        let css = escape_style_text(&css);
        let head = document.ensure_head();
        let dom = document.dom_mut();

        match find_reusable_style(dom, head) {
            Some(style) => {
                let separator = if dom.child_text(style).is_empty() { "" } else { "\n" };
                dom.append_text(style, &format!("{separator}{css}"));
            }
            None => {
                let style = dom.create_html_element("style");
                dom.set_attr(style, "type", "text/css".to_string());
                dom.append_text(style, &css);
                dom.prepend(head, style);
            }
        }
        log::debug!("wrote {} head stylesheet entries", self.len());
    }
}

/// Keep stylesheet text from closing its `<style>` element early.
///
/// `</` only occurs inside CSS strings, URLs and comments, where `<\/` is
/// an equivalent escape.
fn escape_style_text(css: &str) -> Cow<'_, str> {
    if css.contains("</") {
        Cow::Owned(css.replace("</", "<\\/"))
    } else {
        Cow::Borrowed(css)
    }
}

/// A `<style type="text/css">` child of `head` without a `media` attribute.
fn find_reusable_style(dom: &ArenaDom, head: ArenaNodeId) -> Option<ArenaNodeId> {
    dom.children(head).find(|&child| {
        dom.element_name(child).is_some_and(|name| &**name == "style")
            && dom.get_attr(child, "media").is_none()
            && dom
                .get_attr(child, "type")
                .is_some_and(|ty| ty.trim().eq_ignore_ascii_case("text/css"))
    })
}

/// Render a whole rule as stylesheet text.
pub fn render_rule(rule: &Rule) -> String {
    match &rule.body {
        RuleBody::Declarations(declarations) => render_declarations(&rule.selector, declarations),
        RuleBody::Raw(raw) if raw.is_empty() => format!("{} {{ }}", rule.selector),
        RuleBody::Raw(raw) => format!("{} {{ {} }}", rule.selector, raw),
        RuleBody::Statement => format!("{};", rule.selector),
    }
}

/// Render `selector { declarations }`, de-duplicating the declarations.
pub fn render_declarations(selector: &str, declarations: &[Declaration]) -> String {
    format!("{} {{ {} }}", selector, DeclarationBlock::for_rule(declarations).to_css())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;

    #[test]
    fn test_render_rules() {
        let sheet = Stylesheet::parse(
            "a:hover { color: red !important; color: blue }\n\
             @import url(x.css);\n\
             @keyframes k { from { top: 0 } }",
        );
        let rendered: Vec<_> = sheet.rules().iter().map(render_rule).collect();
        assert_eq!(
            rendered,
            [
                "a:hover { color: red !important }",
                "@import url(x.css);",
                "@keyframes k { from { top: 0 } }",
            ]
        );
    }

    #[test]
    fn test_media_grouping() {
        let mut head = HeadStylesheet::new();
        head.push_media_rule("print", "a { x: y }".into());
        head.push_rule("p:hover { color: red }".into());
        head.push_media_rule("screen", "c { x: y }".into());
        head.push_media_rule("print", "b { z: w }".into());

        assert_eq!(
            head.to_css(),
            "@media print { a { x: y } b { z: w } }\n\
             p:hover { color: red }\n\
             @media screen { c { x: y } }"
        );
    }

    #[test]
    fn test_write_creates_style_first_in_head() {
        let mut doc = Document::parse("<html><head><title>t</title></head><body></body></html>");
        let mut head = HeadStylesheet::new();
        head.push_rule("p:hover { color: red }".into());
        head.write_to(&mut doc);

        assert_eq!(
            doc.to_html(),
            "<html><head><style type=\"text/css\">p:hover { color: red }</style><title>t</title></head><body></body></html>"
        );
    }

    #[test]
    fn test_write_reuses_existing_style() {
        let mut doc = Document::parse(
            "<head><style type=\"text/css\">a { b: c }</style></head><body></body>",
        );
        let mut head = HeadStylesheet::new();
        head.push_rule("p:hover { color: red }".into());
        head.write_to(&mut doc);

        let html = doc.to_html();
        assert!(html.contains("<style type=\"text/css\">a { b: c }\np:hover { color: red }</style>"));
        assert_eq!(html.matches("<style").count(), 1);
    }

    #[test]
    fn test_write_escapes_closing_tags() {
        let mut doc = Document::parse("<p>x</p>");
        let mut head = HeadStylesheet::new();
        head.push_rule(r#"a:hover { background: url("x</style><img src=x>") }"#.into());
        head.write_to(&mut doc);

        let html = doc.to_html();
        assert!(html.contains(r#"url("x<\/style><img src=x>")"#), "{html}");

        let reparsed = Document::parse(&html);
        assert!(reparsed.select("img").unwrap().is_empty());
        assert_eq!(reparsed.select("style").unwrap().len(), 1);
    }

    #[test]
    fn test_write_nothing_when_empty() {
        let mut doc = Document::parse("<p>x</p>");
        HeadStylesheet::new().write_to(&mut doc);
        assert!(!doc.to_html().contains("<style"));
    }
}
