//! CSS parsing for the inliner.
//!
//! Stylesheets are parsed with `cssparser` into flat [`Rule`]s that keep the
//! original selector and value text, so rules can be written back into the
//! document verbatim. Selectors are only compiled (with the `selectors`
//! crate) when a rule is matched against elements.

mod media;
pub mod selector;
pub mod specificity;
mod stylesheet;
pub mod url;

pub use selector::{SelectorSyntaxError, compile_selector, is_unsupported_selector};
pub use specificity::Specificity;
pub use stylesheet::{Declaration, MEDIA_ALL, Rule, RuleBody, Stylesheet};
