//! Selector compilation and the "can this be inlined" test.

use cssparser::{Parser, ParserInput};
use selectors::parser::{ParseRelative, Selector, SelectorList};

use crate::dom::InkSelectors;

/// Pseudo-classes and pseudo-elements that depend on user interaction,
/// link history or generated content. A `style` attribute cannot express
/// any of them.
pub const UNSUPPORTED_PSEUDOS: &[&str] = &[
    "active", "checked", "disabled", "enabled", "focus", "hover", "lang", "link", "target",
    "visited", "before", "after", "not",
];

const VENDOR_PREFIXES: &[&str] = &["-moz-", "-webkit-", "-ms-", "-o-"];

/// A selector the matcher could not parse.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid selector `{selector}`")]
pub struct SelectorSyntaxError {
    pub selector: String,
}

/// Compile a selector string (possibly a comma-separated group) for
/// matching against documents.
pub fn compile_selector(selector: &str) -> Result<Vec<Selector<InkSelectors>>, SelectorSyntaxError> {
    let mut input = ParserInput::new(selector);
    let mut parser = Parser::new(&mut input);

    let list = SelectorList::parse(&InkSelectors, &mut parser, ParseRelative::No)
        .map_err(|_| SelectorSyntaxError {
            selector: selector.to_string(),
        })?;

    Ok(list.slice().to_vec())
}

/// Returns true if the selector can never be expressed as an inline style:
/// at-rules, pseudo-elements, interactive or generated-content
/// pseudo-classes and vendor-prefixed selectors.
pub fn is_unsupported_selector(selector: &str) -> bool {
    let selector = selector.trim();
    if selector.starts_with('@') || selector.contains("::") {
        return true;
    }

    let lower = selector.to_ascii_lowercase();
    if VENDOR_PREFIXES.iter().any(|prefix| lower.contains(prefix)) {
        return true;
    }

    lower.split(':').skip(1).any(|rest| {
        let ident_len = rest
            .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        UNSUPPORTED_PSEUDOS.contains(&&rest[..ident_len])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_group() {
        let compiled = compile_selector("p, .a > b").unwrap();
        assert_eq!(compiled.len(), 2);
    }

    #[test]
    fn test_compile_errors() {
        let err = compile_selector("p[").unwrap_err();
        assert_eq!(err.selector, "p[");
        assert!(compile_selector("a:hover").is_err());
        assert!(compile_selector("").is_err());
    }

    #[test]
    fn test_unsupported_pseudos() {
        for selector in [
            "a:hover",
            "a:LINK",
            "input:focus",
            "p:before",
            "li:not(.x)",
            "p:lang(fr)",
            "a:visited span",
        ] {
            assert!(is_unsupported_selector(selector), "{selector}");
        }
    }

    #[test]
    fn test_unsupported_other() {
        assert!(is_unsupported_selector("@font-face"));
        assert!(is_unsupported_selector("p::first-line"));
        assert!(is_unsupported_selector("input::-moz-focus-inner"));
        assert!(is_unsupported_selector("a:-webkit-any-link"));
    }

    #[test]
    fn test_supported() {
        for selector in [
            "p",
            ".a",
            "#main td",
            "ul > li + li",
            "li:first-child",
            "tr:nth-child(2n+1)",
            "a[href^=\"http://\"]",
            "input:notice",
        ] {
            assert!(!is_unsupported_selector(selector), "{selector}");
        }
    }
}
