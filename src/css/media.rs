//! Flattening nested `@media` blocks into a single query list.

use cssparser::{ParseError, Parser, ParserInput};

use super::stylesheet::MEDIA_ALL;

/// Query matching no media, for nested types that cannot overlap.
const MEDIA_NONE: &str = "not all";

/// One query of a media query list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct MediaQuery<'a> {
    only: bool,
    negated: bool,
    media_type: Option<&'a str>,
    condition: Option<&'a str>,
}

impl<'a> MediaQuery<'a> {
    fn parse(text: &'a str) -> Self {
        let mut rest = text.trim();
        let mut only = false;
        let mut negated = false;
        if let Some(tail) = strip_keyword(rest, "only") {
            only = true;
            rest = tail;
        } else if let Some(tail) = strip_keyword(rest, "not") {
            negated = true;
            rest = tail;
        }

        if rest.starts_with('(') || rest.is_empty() {
            return Self {
                only,
                negated,
                media_type: None,
                condition: (!rest.is_empty()).then_some(rest),
            };
        }

        let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
        let (media_type, tail) = rest.split_at(end);
        Self {
            only,
            negated,
            media_type: Some(media_type),
            condition: strip_keyword(tail.trim_start(), "and"),
        }
    }

    /// The type, with `all` treated as no restriction.
    fn restricted_type(&self) -> Option<&'a str> {
        self.media_type.filter(|t| !t.eq_ignore_ascii_case(MEDIA_ALL))
    }

    fn to_css(self) -> String {
        let mut out = String::new();
        if self.only {
            out.push_str("only ");
        }
        match (self.media_type, self.condition) {
            (Some(t), Some(c)) => {
                out.push_str(t);
                out.push_str(" and ");
                out.push_str(c);
            }
            (Some(t), None) => out.push_str(t),
            (None, Some(c)) => out.push_str(c),
            (None, None) => out.push_str(MEDIA_ALL),
        }
        out
    }
}

fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let head = text.get(..keyword.len())?;
    let tail = &text[keyword.len()..];
    (head.eq_ignore_ascii_case(keyword) && tail.starts_with(char::is_whitespace))
        .then(|| tail.trim_start())
}

/// Split a media query list at top-level commas.
fn split_queries(list: &str) -> Vec<&str> {
    let mut input = ParserInput::new(list);
    let mut parser = Parser::new(&mut input);
    parser
        .parse_comma_separated(|input| {
            let start = input.position();
            while input.next().is_ok() {}
            Ok::<_, ParseError<'_, ()>>(input.slice_from(start).trim())
        })
        .unwrap_or_else(|_| vec![list.trim()])
}

/// Combine one outer and one inner query, or `None` when negation makes
/// the intersection inexpressible as a single query.
fn intersect(outer: MediaQuery<'_>, inner: MediaQuery<'_>) -> Option<String> {
    if outer.negated || inner.negated {
        return None;
    }

    let media_type = match (outer.restricted_type(), inner.restricted_type()) {
        (Some(a), Some(b)) if !a.eq_ignore_ascii_case(b) => return Some(MEDIA_NONE.to_string()),
        (Some(t), _) | (None, Some(t)) => Some(t),
        (None, None) => None,
    };

    let condition = match (outer.condition, inner.condition) {
        (Some(a), Some(b)) => Some(format!("{a} and {b}")),
        (Some(c), None) | (None, Some(c)) => Some(c.to_string()),
        (None, None) => None,
    };

    Some(
        MediaQuery {
            only: (outer.only || inner.only) && media_type.is_some(),
            negated: false,
            media_type,
            condition: condition.as_deref(),
        }
        .to_css(),
    )
}

/// The query list for rules of an `inner` `@media` block nested inside
/// `outer`: every outer query combined with every inner query.
///
/// Negated queries cannot be combined; the outer list is kept for those so
/// nested rules never escape the outer block's media.
pub(crate) fn nest_media(outer: &str, inner: &str) -> String {
    if outer.eq_ignore_ascii_case(MEDIA_ALL) {
        return inner.to_string();
    }
    if inner.eq_ignore_ascii_case(MEDIA_ALL) {
        return outer.to_string();
    }

    let outer_queries = split_queries(outer);
    let inner_queries = split_queries(inner);

    let mut combined: Vec<String> = Vec::new();
    for o in &outer_queries {
        for i in &inner_queries {
            let Some(query) = intersect(MediaQuery::parse(o), MediaQuery::parse(i)) else {
                log::debug!("cannot combine `@media {o}` with nested `@media {i}`, keeping outer");
                return outer.to_string();
            };
            if query != MEDIA_NONE && !combined.contains(&query) {
                combined.push(query);
            }
        }
    }

    if combined.is_empty() {
        MEDIA_NONE.to_string()
    } else {
        combined.join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nest_with_all() {
        assert_eq!(nest_media("all", "print"), "print");
        assert_eq!(nest_media("screen", "all"), "screen");
    }

    #[test]
    fn test_nest_type_and_features() {
        assert_eq!(nest_media("print", "(min-width: 1px)"), "print and (min-width: 1px)");
        assert_eq!(
            nest_media("screen and (max-width: 600px)", "(orientation: portrait)"),
            "screen and (max-width: 600px) and (orientation: portrait)"
        );
        assert_eq!(nest_media("(min-width: 1px)", "only screen"), "only screen and (min-width: 1px)");
    }

    #[test]
    fn test_nest_query_lists() {
        assert_eq!(
            nest_media("screen, print", "(min-width: 1px)"),
            "screen and (min-width: 1px), print and (min-width: 1px)"
        );
        assert_eq!(nest_media("screen, print", "print"), "print");
    }

    #[test]
    fn test_nest_disjoint_types() {
        assert_eq!(nest_media("print", "screen"), "not all");
        assert_eq!(nest_media("PRINT", "print"), "PRINT");
    }

    #[test]
    fn test_nest_negation_keeps_outer() {
        assert_eq!(nest_media("print", "not screen"), "print");
        assert_eq!(nest_media("not print", "(min-width: 1px)"), "not print");
    }
}
