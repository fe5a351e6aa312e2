//! CSS stylesheet parsing and rule structures.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, StyleSheetParser,
};
use url::Url;

use super::media::nest_media;
use super::specificity::Specificity;
use super::url::{rewrite_declarations, rewrite_value};

/// Media query of rules outside any `@media` block.
pub const MEDIA_ALL: &str = "all";

/// Prefix for properties that keep their case.
const CUSTOM_PROPERTY_PREFIX: &str = "--";

/// At-rules whose block is a plain declaration list.
const DECLARATION_AT_RULES: &[&str] = &["font-face", "page", "viewport", "counter-style", "property"];

/// At-rules that end with `;` instead of a block.
const STATEMENT_AT_RULES: &[&str] = &["import", "namespace"];

/// A single `property: value` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub property: String,
    pub value: String,
    pub important: bool,
}

impl Declaration {
    pub fn new(property: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            property: property.into(),
            value: value.into(),
            important: false,
        }
    }

    pub fn important(mut self) -> Self {
        self.important = true;
        self
    }

    /// Vendor-prefixed properties (`-webkit-…`) cannot always be inlined.
    pub fn is_vendor_prefixed(&self) -> bool {
        self.property.starts_with('-') && !self.property.starts_with(CUSTOM_PROPERTY_PREFIX)
    }

    /// Render as `property: value`, with `!important` when set.
    pub fn to_css(&self) -> String {
        if self.important {
            format!("{}: {} !important", self.property, self.value)
        } else {
            format!("{}: {}", self.property, self.value)
        }
    }
}

/// Body of a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuleBody {
    /// Style rules and declaration at-rules such as `@font-face`.
    Declarations(Vec<Declaration>),
    /// Any other block at-rule (`@keyframes`, `@supports`), kept as written.
    Raw(String),
    /// Statement at-rules such as `@import`.
    Statement,
}

/// One rule with a single selector.
///
/// Grouped selectors are split into one rule per selector, sharing the same
/// declarations and `source_index`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Selector text with whitespace collapsed. At-rules use `@name prelude`.
    pub selector: String,
    pub specificity: Specificity,
    pub body: RuleBody,
    /// The enclosing media query, or [`MEDIA_ALL`].
    pub media: String,
    /// Position of the rule block across every stylesheet parsed into the
    /// same [`Stylesheet`].
    pub source_index: usize,
}

impl Rule {
    /// The rule's declarations; empty for raw and statement at-rules.
    pub fn declarations(&self) -> &[Declaration] {
        match &self.body {
            RuleBody::Declarations(declarations) => declarations,
            RuleBody::Raw(_) | RuleBody::Statement => &[],
        }
    }

    pub fn is_at_rule(&self) -> bool {
        self.selector.starts_with('@')
    }

    pub fn has_default_media(&self) -> bool {
        self.media == MEDIA_ALL
    }
}

/// Rules parsed from one or more stylesheets, in source order.
#[derive(Debug, Default, Clone)]
pub struct Stylesheet {
    rules: Vec<Rule>,
    next_index: usize,
}

impl Stylesheet {
    /// Parse a CSS stylesheet from a string.
    pub fn parse(css: &str) -> Self {
        let mut stylesheet = Self::default();
        stylesheet.append(css, None);
        stylesheet
    }

    /// Parse another stylesheet into this one. Source indices continue from
    /// the previous call so later sheets win cascade ties. With a base URL,
    /// relative `url()` references are made absolute.
    pub fn append(&mut self, css: &str, base_url: Option<&Url>) {
        let first = self.rules.len();

        let mut input = ParserInput::new(css);
        let mut parser = Parser::new(&mut input);
        let mut rule_parser = TopLevelRuleParser {
            rules: &mut self.rules,
            next_index: &mut self.next_index,
            media: MEDIA_ALL.to_string(),
        };

        for result in StyleSheetParser::new(&mut parser, &mut rule_parser) {
            if let Err((err, slice)) = result {
                log::debug!("skipping invalid CSS `{}`: {:?}", slice.trim(), err.kind);
            }
        }

        if let Some(base) = base_url {
            for rule in &mut self.rules[first..] {
                rewrite_rule_urls(rule, base);
            }
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn into_rules(self) -> Vec<Rule> {
        self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Check if the stylesheet is empty.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

fn rewrite_rule_urls(rule: &mut Rule, base: &Url) {
    match &mut rule.body {
        RuleBody::Declarations(declarations) => {
            *declarations = rewrite_declarations(declarations, Some(base));
        }
        RuleBody::Raw(raw) => {
            *raw = rewrite_value(raw, base).into_owned();
        }
        RuleBody::Statement => {
            rule.selector = rewrite_value(&rule.selector, base).into_owned();
        }
    }
}

/// Collapse runs of whitespace to a single space.
fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Consume the rest of `input` and return its source text.
fn remaining_source<'i>(input: &mut Parser<'i, '_>) -> &'i str {
    let start = input.position();
    while input.next_including_whitespace_and_comments().is_ok() {}
    input.slice_from(start)
}

/// Parser for rule lists: the stylesheet itself and `@media` blocks.
struct TopLevelRuleParser<'a> {
    rules: &'a mut Vec<Rule>,
    next_index: &'a mut usize,
    media: String,
}

impl TopLevelRuleParser<'_> {
    fn take_index(&mut self) -> usize {
        let index = *self.next_index;
        *self.next_index += 1;
        index
    }

    fn push(&mut self, selector: String, body: RuleBody, source_index: usize) {
        self.rules.push(Rule {
            specificity: Specificity::of(&selector),
            selector,
            body,
            media: self.media.clone(),
            source_index,
        });
    }
}

enum AtRulePrelude {
    Media(String),
    Declarations(String),
    Raw(String),
    Statement(String),
    Charset,
}

impl<'i> AtRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = AtRulePrelude;
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        let name = name.to_ascii_lowercase();
        let prelude = collapse_whitespace(remaining_source(input));
        let header = if prelude.is_empty() {
            format!("@{name}")
        } else {
            format!("@{name} {prelude}")
        };

        Ok(match name.as_str() {
            "charset" => AtRulePrelude::Charset,
            "media" if prelude.is_empty() || prelude.eq_ignore_ascii_case(MEDIA_ALL) => {
                AtRulePrelude::Media(MEDIA_ALL.to_string())
            }
            "media" => AtRulePrelude::Media(prelude),
            n if DECLARATION_AT_RULES.contains(&n) => AtRulePrelude::Declarations(header),
            n if STATEMENT_AT_RULES.contains(&n) => AtRulePrelude::Statement(header),
            _ => AtRulePrelude::Raw(header),
        })
    }

    fn rule_without_block(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        match prelude {
            AtRulePrelude::Charset => Ok(()),
            AtRulePrelude::Statement(header) => {
                let index = self.take_index();
                self.push(header, RuleBody::Statement, index);
                Ok(())
            }
            _ => Err(()),
        }
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        match prelude {
            AtRulePrelude::Media(query) => {
                let mut nested = TopLevelRuleParser {
                    rules: &mut *self.rules,
                    next_index: &mut *self.next_index,
                    media: nest_media(&self.media, &query),
                };
                for result in StyleSheetParser::new(input, &mut nested) {
                    if let Err((err, slice)) = result {
                        log::debug!("skipping invalid CSS `{}`: {:?}", slice.trim(), err.kind);
                    }
                }
                Ok(())
            }
            AtRulePrelude::Declarations(header) => {
                let declarations = parse_declaration_block(input);
                if !declarations.is_empty() {
                    let index = self.take_index();
                    self.push(header, RuleBody::Declarations(declarations), index);
                }
                Ok(())
            }
            AtRulePrelude::Raw(header) => {
                let raw = collapse_whitespace(remaining_source(input));
                let index = self.take_index();
                self.push(header, RuleBody::Raw(raw), index);
                Ok(())
            }
            AtRulePrelude::Statement(_) | AtRulePrelude::Charset => Err(input.new_custom_error(())),
        }
    }
}

impl<'i> QualifiedRuleParser<'i> for TopLevelRuleParser<'_> {
    type Prelude = Vec<String>;
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        // Split at top-level commas only: `a[title="x,y"]` and `:is(a, b)`
        // stay whole
        let selectors: Vec<String> = input
            .parse_comma_separated(|i| {
                Ok::<_, ParseError<'i, ()>>(collapse_whitespace(remaining_source(i)))
            })?
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();

        if selectors.is_empty() {
            return Err(input.new_custom_error(()));
        }
        Ok(selectors)
    }

    fn parse_block<'t>(
        &mut self,
        prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let declarations = parse_declaration_block(input);
        if declarations.is_empty() {
            return Ok(());
        }

        let index = self.take_index();
        for selector in prelude {
            self.push(selector, RuleBody::Declarations(declarations.clone()), index);
        }
        Ok(())
    }
}

fn parse_declaration_block(input: &mut Parser<'_, '_>) -> Vec<Declaration> {
    let mut declarations = Vec::new();
    let mut decl_parser = DeclarationListParser {
        declarations: &mut declarations,
    };

    for result in RuleBodyParser::new(input, &mut decl_parser) {
        if let Err((err, slice)) = result {
            log::debug!("skipping invalid declaration `{}`: {:?}", slice.trim(), err.kind);
        }
    }

    declarations
}

struct DeclarationListParser<'a> {
    declarations: &'a mut Vec<Declaration>,
}

impl<'i> AtRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for DeclarationListParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let property = if name.starts_with(CUSTOM_PROPERTY_PREFIX) {
            name.to_string()
        } else {
            name.to_ascii_lowercase()
        };

        let start = input.position();
        let mut end = start;
        let mut important = false;
        loop {
            if input
                .try_parse(|i| {
                    cssparser::parse_important(i)?;
                    i.expect_exhausted()
                })
                .is_ok()
            {
                important = true;
                break;
            }
            if input.next_including_whitespace_and_comments().is_err() {
                break;
            }
            end = input.position();
        }

        let value = input.slice(start..end).trim();
        if value.is_empty() {
            return Err(input.new_custom_error(()));
        }

        self.declarations.push(Declaration {
            property,
            value: value.to_string(),
            important,
        });
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for DeclarationListParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}
