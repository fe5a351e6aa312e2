//! Rewriting of relative `url()` references.

use std::borrow::Cow;
use std::ops::Range;

use cssparser::{ParseError, Parser, ParserInput, Token};
use url::Url;

use super::stylesheet::Declaration;

/// Rewrite relative `url()` references in every declaration value against
/// `base`. Without a base the declarations are returned unchanged.
pub fn rewrite_declarations(declarations: &[Declaration], base: Option<&Url>) -> Vec<Declaration> {
    let Some(base) = base else {
        return declarations.to_vec();
    };

    declarations
        .iter()
        .map(|decl| Declaration {
            value: rewrite_value(&decl.value, base).into_owned(),
            ..decl.clone()
        })
        .collect()
}

/// Rewrite relative `url()` references in a piece of CSS text.
///
/// Both `url(a.png)` and `url("a.png")` are handled, including inside other
/// functions such as `image-set()`. Absolute references, root-relative
/// paths, fragments and `data:` URIs are left as written, so rewriting is
/// idempotent.
pub fn rewrite_value<'a>(value: &'a str, base: &Url) -> Cow<'a, str> {
    if !value.as_bytes().windows(4).any(|w| w.eq_ignore_ascii_case(b"url(")) {
        return Cow::Borrowed(value);
    }

    let mut edits = Vec::new();
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    collect_urls(&mut parser, &mut edits);

    let mut out = String::with_capacity(value.len());
    let mut last = 0;
    let mut changed = false;
    for edit in edits {
        let Some(resolved) = resolve_reference(&edit.url, base) else {
            continue;
        };
        out.push_str(&value[last..edit.range.start]);
        out.push_str(&edit.style.render(&resolved));
        last = edit.range.end;
        changed = true;
    }

    if !changed {
        return Cow::Borrowed(value);
    }
    out.push_str(&value[last..]);
    Cow::Owned(out)
}

/// Resolve a reference against `base`, or `None` when it must be kept
/// as written.
pub fn resolve_reference(reference: &str, base: &Url) -> Option<String> {
    let reference = reference.trim();
    if reference.is_empty() || is_absolute_reference(reference) {
        return None;
    }

    match base.join(reference) {
        Ok(url) => Some(url.to_string()),
        Err(e) => {
            log::debug!("cannot resolve `{reference}` against {base}: {e}");
            None
        }
    }
}

/// Returns true for references that carry a scheme (`http:`, `data:`), are
/// protocol-relative or root-relative (`//cdn`, `/img`), or are bare
/// fragments (`#id`).
pub fn is_absolute_reference(reference: &str) -> bool {
    if reference.starts_with('/') || reference.starts_with('#') {
        return true;
    }

    let Some((scheme, _)) = reference.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UrlStyle {
    /// `url(a.png)`; the range covers the whole token.
    Unquoted,
    /// `url("a.png")`; the range covers the string and its quotes.
    Quoted(char),
}

impl UrlStyle {
    fn render(self, url: &str) -> String {
        match self {
            UrlStyle::Unquoted if !url.contains(['(', ')', '"', '\'', ' ', '\\']) => {
                format!("url({url})")
            }
            UrlStyle::Quoted(quote) if !url.contains([quote, '\\']) => {
                format!("{quote}{url}{quote}")
            }
            UrlStyle::Unquoted => {
                let mut quoted = String::from("url(");
                // Writing to a String cannot fail
                let _ = cssparser::serialize_string(url, &mut quoted);
                quoted.push(')');
                quoted
            }
            UrlStyle::Quoted(_) => {
                let mut quoted = String::new();
                let _ = cssparser::serialize_string(url, &mut quoted);
                quoted
            }
        }
    }
}

#[derive(Debug)]
struct UrlEdit {
    range: Range<usize>,
    url: String,
    style: UrlStyle,
}

fn collect_urls(input: &mut Parser<'_, '_>, edits: &mut Vec<UrlEdit>) {
    loop {
        let start = input.position().byte_index();
        let token = match input.next_including_whitespace_and_comments() {
            Ok(token) => token.clone(),
            Err(_) => break,
        };

        match token {
            Token::UnquotedUrl(url) => edits.push(UrlEdit {
                range: start..input.position().byte_index(),
                url: url.to_string(),
                style: UrlStyle::Unquoted,
            }),
            Token::Function(name) if name.eq_ignore_ascii_case("url") => {
                let _ = input.parse_nested_block(|nested| {
                    nested.skip_whitespace();
                    let start = nested.position();
                    if let Ok(Token::QuotedString(url)) = nested.next().cloned() {
                        let range = start.byte_index()..nested.position().byte_index();
                        let quote = nested.slice(start..nested.position()).chars().next();
                        edits.push(UrlEdit {
                            range,
                            url: url.to_string(),
                            style: UrlStyle::Quoted(quote.unwrap_or('"')),
                        });
                    }
                    Ok::<(), ParseError<'_, ()>>(())
                });
            }
            Token::Function(_)
            | Token::ParenthesisBlock
            | Token::SquareBracketBlock
            | Token::CurlyBracketBlock => {
                let _ = input.parse_nested_block(|nested| {
                    collect_urls(nested, edits);
                    Ok::<(), ParseError<'_, ()>>(())
                });
            }
            _ => {}
        }
    }
}
