//! Selector specificity.

use cssparser::{Parser, ParserInput, Token};
use selectors::parser::Selector;

use super::selector::compile_selector;
use crate::dom::InkSelectors;

/// CSS specificity as an `(ids, classes, elements)` triple.
///
/// Ordering is lexicographic: any number of classes loses to a single id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Specificity {
    pub ids: u16,
    pub classes: u16,
    pub elements: u16,
}

impl Specificity {
    pub const fn new(ids: u16, classes: u16, elements: u16) -> Self {
        Self {
            ids,
            classes,
            elements,
        }
    }

    pub fn from_selector(selector: &Selector<InkSelectors>) -> Self {
        let spec = selector.specificity();
        // selectors crate packs specificity as (id << 20) | (class << 10) | elements
        Self {
            ids: ((spec >> 20) & 0x3FF) as u16,
            classes: ((spec >> 10) & 0x3FF) as u16,
            elements: (spec & 0x3FF) as u16,
        }
    }

    /// Specificity of a single (non-grouped) selector string.
    ///
    /// Selectors the matcher understands get their specificity from the
    /// compiled form. Anything else (`a:hover`, `p::first-line`, vendor
    /// pseudo-classes) is counted token by token, which is enough to keep
    /// head rules in a stable order.
    pub fn of(selector: &str) -> Self {
        if let Ok(compiled) = compile_selector(selector)
            && let Some(first) = compiled.first()
        {
            return Self::from_selector(first);
        }

        let mut input = ParserInput::new(selector);
        let mut parser = Parser::new(&mut input);
        let mut spec = Self::default();
        count_tokens(&mut parser, &mut spec);
        spec
    }
}

impl Ord for Specificity {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.ids
            .cmp(&other.ids)
            .then(self.classes.cmp(&other.classes))
            .then(self.elements.cmp(&other.elements))
    }
}

impl PartialOrd for Specificity {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

/// Pseudo-elements that may be written with a single colon.
const LEGACY_PSEUDO_ELEMENTS: &[&str] = &["before", "after", "first-line", "first-letter"];

fn count_tokens(input: &mut Parser<'_, '_>, spec: &mut Specificity) {
    let mut colons = 0u8;
    let mut after_dot = false;

    loop {
        let token = match input.next_including_whitespace() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::Colon => {
                colons += 1;
                continue;
            }
            Token::Delim('.') => {
                after_dot = true;
                continue;
            }
            Token::Ident(name) => {
                let pseudo_element = colons >= 2
                    || (colons == 1
                        && LEGACY_PSEUDO_ELEMENTS
                            .iter()
                            .any(|p| name.eq_ignore_ascii_case(p)));
                if after_dot || colons == 1 && !pseudo_element {
                    spec.classes = spec.classes.saturating_add(1);
                } else {
                    spec.elements = spec.elements.saturating_add(1);
                }
            }
            Token::Function(name) => {
                let name = name.to_ascii_lowercase();
                if colons == 1 && matches!(name.as_str(), "not" | "is" | "matches" | "has") {
                    // Takes the specificity of its argument
                    let _ = input.parse_nested_block(|nested| {
                        count_tokens(nested, spec);
                        Ok::<(), cssparser::ParseError<'_, ()>>(())
                    });
                } else if colons >= 2 {
                    spec.elements = spec.elements.saturating_add(1);
                } else if colons == 1 && name != "where" {
                    spec.classes = spec.classes.saturating_add(1);
                }
            }
            Token::IDHash(_) | Token::Hash(_) => {
                spec.ids = spec.ids.saturating_add(1);
            }
            Token::SquareBracketBlock => {
                spec.classes = spec.classes.saturating_add(1);
            }
            _ => {}
        }

        colons = 0;
        after_dot = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering() {
        assert!(Specificity::new(1, 0, 0) > Specificity::new(0, 10, 10));
        assert!(Specificity::new(0, 1, 0) > Specificity::new(0, 0, 10));
        assert!(Specificity::new(0, 1, 1) > Specificity::new(0, 1, 0));
    }

    #[test]
    fn test_compiled_selectors() {
        assert_eq!(Specificity::of("p"), Specificity::new(0, 0, 1));
        assert_eq!(Specificity::of(".a"), Specificity::new(0, 1, 0));
        assert_eq!(Specificity::of("#x"), Specificity::new(1, 0, 0));
        assert_eq!(Specificity::of("div p.note"), Specificity::new(0, 1, 2));
        assert_eq!(Specificity::of("a[href]"), Specificity::new(0, 1, 1));
        assert_eq!(Specificity::of("*"), Specificity::new(0, 0, 0));
    }

    #[test]
    fn test_unmatchable_selectors() {
        assert_eq!(Specificity::of("a:hover"), Specificity::new(0, 1, 1));
        assert_eq!(Specificity::of("p::first-line"), Specificity::new(0, 0, 2));
        assert_eq!(Specificity::of("p:before"), Specificity::new(0, 0, 2));
        assert_eq!(Specificity::of("#nav a:visited"), Specificity::new(1, 1, 1));
        assert_eq!(Specificity::of("input::-moz-focus-inner"), Specificity::new(0, 0, 2));
    }

    #[test]
    fn test_not_takes_argument_specificity() {
        assert_eq!(Specificity::of("a:not(.x):hover"), Specificity::new(0, 2, 1));
    }
}
