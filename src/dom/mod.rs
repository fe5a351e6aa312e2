//! HTML document access for the inliner.
//!
//! Wraps an html5ever-parsed [`ArenaDom`] with the handful of operations the
//! inliner needs: selector queries in document order, get-or-create of the
//! `<head>` element, node removal and serialization.

mod arena;
mod element_ref;
mod serialize;
mod tree_sink;

pub use arena::{ArenaDom, ArenaNode, ArenaNodeData, ArenaNodeId, Attribute};
pub use element_ref::{ElementRef, InkSelectors};

use html5ever::driver::ParseOpts;
use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use selectors::context::{MatchingContext, SelectorCaches};
use selectors::parser::Selector;

use crate::css::selector::{SelectorSyntaxError, compile_selector};
use serialize::SerializableNode;
use tree_sink::ArenaSink;

/// A parsed HTML document owned by a single inlining call.
pub struct Document {
    dom: ArenaDom,
}

impl Document {
    /// Parse HTML markup into a document. Never fails: html5ever recovers from
    /// malformed input the way browsers do.
    pub fn parse(html: &str) -> Self {
        let sink = ArenaSink::new();
        let result = parse_document(sink, ParseOpts::default())
            .from_utf8()
            .one(html.as_bytes());
        Self {
            dom: result.into_dom(),
        }
    }

    /// The underlying arena.
    pub fn dom(&self) -> &ArenaDom {
        &self.dom
    }

    /// Mutable access to the underlying arena.
    pub fn dom_mut(&mut self) -> &mut ArenaDom {
        &mut self.dom
    }

    /// The `<head>` element, if present.
    pub fn head(&self) -> Option<ArenaNodeId> {
        let root = self.dom.root_element()?;
        self.dom.child_by_tag(root, "head")
    }

    /// The `<body>` element, if present.
    pub fn body(&self) -> Option<ArenaNodeId> {
        let root = self.dom.root_element()?;
        self.dom.child_by_tag(root, "body")
    }

    /// Get the `<head>` element, creating it as the first child of the root
    /// element (and the root itself) when missing.
    pub fn ensure_head(&mut self) -> ArenaNodeId {
        if let Some(head) = self.head() {
            return head;
        }

        let root = match self.dom.root_element() {
            Some(root) => root,
            None => {
                let html = self.dom.create_html_element("html");
                let document = self.dom.document();
                self.dom.append(document, html);
                html
            }
        };

        let head = self.dom.create_html_element("head");
        self.dom.prepend(root, head);
        head
    }

    /// All elements in document order.
    pub fn elements(&self) -> impl Iterator<Item = ArenaNodeId> + '_ {
        self.dom
            .descendants(self.dom.document())
            .filter(|&id| self.dom.is_element(id))
    }

    /// Elements within `<body>` (the body included), in document order.
    /// Falls back to every element when the document has no body.
    pub fn body_elements(&self) -> Vec<ArenaNodeId> {
        match self.body() {
            Some(body) => self
                .dom
                .descendants(body)
                .filter(|&id| self.dom.is_element(id))
                .collect(),
            None => self.elements().collect(),
        }
    }

    /// Elements among `candidates` matching any of `selectors`, in the order
    /// of `candidates`.
    pub fn query(
        &self,
        selectors: &[Selector<InkSelectors>],
        candidates: &[ArenaNodeId],
    ) -> Vec<ArenaNodeId> {
        let mut caches = SelectorCaches::default();
        let mut context = MatchingContext::new(
            selectors::matching::MatchingMode::Normal,
            None,
            &mut caches,
            selectors::context::QuirksMode::NoQuirks,
            selectors::matching::NeedsSelectorFlags::No,
            selectors::matching::MatchingForInvalidation::No,
        );

        candidates
            .iter()
            .copied()
            .filter(|&id| {
                let elem = ElementRef::new(&self.dom, id);
                selectors.iter().any(|selector| {
                    selectors::matching::matches_selector(selector, 0, None, &elem, &mut context)
                })
            })
            .collect()
    }

    /// Elements matching a selector string, in document order.
    pub fn select(&self, selector: &str) -> Result<Vec<ArenaNodeId>, SelectorSyntaxError> {
        let compiled = compile_selector(selector)?;
        let candidates: Vec<_> = self.elements().collect();
        Ok(self.query(&compiled, &candidates))
    }

    /// Remove a node (and its subtree) from the document.
    pub fn remove(&mut self, id: ArenaNodeId) {
        self.dom.detach(id);
    }

    /// Serialize the document back to HTML.
    pub fn to_html(&self) -> String {
        let node = SerializableNode {
            dom: &self.dom,
            id: self.dom.document(),
        };

        let mut bytes = Vec::new();
        if let Err(e) = serialize(&mut bytes, &node, SerializeOpts::default()) {
            log::warn!("HTML serialization stopped early: {e}");
        }

        String::from_utf8(bytes)
            .unwrap_or_else(|e| String::from_utf8_lossy(e.as_bytes()).into_owned())
    }
}
