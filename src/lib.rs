//! # inkpot
//!
//! Inline CSS stylesheets into HTML for email delivery.
//!
//! Mail clients ignore or mangle `<style>` blocks and linked stylesheets, so
//! styles have to travel on each element's `style` attribute. inkpot parses a
//! document, applies its stylesheets with the CSS cascade and writes the
//! result back as `style` attributes. Whatever cannot be expressed inline
//! (media queries, `:hover`, `::before`, at-rules, vendor-prefixed
//! declarations) is kept in a single `<style>` element in `<head>`.
//!
//! ## Quick Start
//!
//! ```
//! let html = r#"<html><head><style>
//!     p { color: red }
//!     a:hover { color: blue }
//! </style></head><body><p>Hello</p></body></html>"#;
//!
//! let out = inkpot::inline_css(html);
//! assert!(out.contains(r#"<p style="color: red">Hello</p>"#));
//! assert!(out.contains(r#"<style type="text/css">a:hover { color: blue }</style>"#));
//! ```
//!
//! ## Linked Stylesheets
//!
//! `<link rel="stylesheet">` elements are fetched through a
//! [`StylesheetResolver`]. [`FileResolver`] serves them from a local
//! directory:
//!
//! ```no_run
//! use inkpot::{FileResolver, InlineOptions, Inliner, parse_base_url};
//!
//! let options = InlineOptions::new().with_base_url(parse_base_url("example.com")?);
//! let inliner = Inliner::new(options);
//! let html = std::fs::read_to_string("mail.html")?;
//! let out = inliner.inline_with_resolver(&html, &FileResolver::new("public"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod css;
pub mod dom;
pub mod error;
pub mod inline;
pub mod options;
pub mod source;
pub(crate) mod util;

pub use css::{Declaration, Rule, Specificity, Stylesheet};
pub use dom::Document;
pub use error::{Error, Result};
pub use inline::placement::{Placement, classify};
pub use inline::{Inliner, inline_css, inline_css_with_base};
pub use options::{InlineOptions, parse_base_url};
pub use source::{
    FileResolver, NoResolver, ResolvedStylesheet, StylesheetResolver, StylesheetSource,
    collect_stylesheets,
};
pub use url::Url;
