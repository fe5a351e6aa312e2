//! Where a rule ends up.

use selectors::parser::Selector;

use crate::css::{Rule, compile_selector, is_unsupported_selector};
use crate::dom::InkSelectors;

/// Terminal placement of a rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Placement {
    /// Written as `style` attributes on matching elements.
    Inline,
    /// Copied into the head stylesheet as written.
    HeadVerbatim,
    /// Copied into the head stylesheet inside its `@media` block.
    HeadMedia,
}

/// Classify a rule. Depends only on the rule itself.
pub fn classify(rule: &Rule) -> Placement {
    match compile_for_inlining(rule) {
        Ok(_) => Placement::Inline,
        Err(placement) => placement,
    }
}

/// The compiled selectors of an inlinable rule, or the head placement of
/// any other rule.
pub(crate) fn compile_for_inlining(rule: &Rule) -> Result<Vec<Selector<InkSelectors>>, Placement> {
    if !rule.has_default_media() {
        return Err(Placement::HeadMedia);
    }
    if is_unsupported_selector(&rule.selector) {
        return Err(Placement::HeadVerbatim);
    }
    compile_selector(&rule.selector).map_err(|e| {
        log::debug!("{e}; keeping rule in head");
        Placement::HeadVerbatim
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::css::Stylesheet;

    fn placements(css: &str) -> Vec<(String, Placement)> {
        Stylesheet::parse(css)
            .rules()
            .iter()
            .map(|rule| (rule.selector.clone(), classify(rule)))
            .collect()
    }

    #[test]
    fn test_classify() {
        let css = "p { color: red }\n\
                   a:hover { color: blue }\n\
                   @media print { p { color: black } }\n\
                   @font-face { font-family: X }\n\
                   li:first-child { margin: 0 }";
        assert_eq!(
            placements(css),
            [
                ("p".to_string(), Placement::Inline),
                ("a:hover".to_string(), Placement::HeadVerbatim),
                ("p".to_string(), Placement::HeadMedia),
                ("@font-face".to_string(), Placement::HeadVerbatim),
                ("li:first-child".to_string(), Placement::Inline),
            ]
        );
    }

    #[test]
    fn test_compiled_selectors_for_inline_rules() {
        let rules = Stylesheet::parse("h1, h2 { margin: 0 } a:hover { color: red }").into_rules();
        assert_eq!(compile_for_inlining(&rules[0]).map(|s| s.len()), Ok(1));
        assert_eq!(compile_for_inlining(&rules[2]).map(|s| s.len()), Err(Placement::HeadVerbatim));
    }

    #[test]
    fn test_unparseable_selector_goes_to_head() {
        let rules = Stylesheet::parse("p:unknown-thing { color: red }").into_rules();
        assert_eq!(classify(&rules[0]), Placement::HeadVerbatim);
    }
}
