//! Cascade resolution.
//!
//! Every declaration that applies to an element gets a cascade key of
//! `(important, specificity, source_index, position)`. Declarations are
//! applied in ascending key order, so for each property the declaration with
//! the largest key is the one left standing.

use std::collections::BTreeMap;

use crate::css::{Declaration, Rule, Specificity};
use crate::dom::ArenaNodeId;

/// Ordering of a declaration in the cascade. Larger wins.
///
/// Field order matters: the derived `Ord` compares `important` first, so an
/// `!important` declaration beats any normal one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CascadeKey {
    pub important: bool,
    pub specificity: Specificity,
    pub source_index: usize,
    pub position: usize,
}

/// A declaration contributed by a matched rule.
#[derive(Debug)]
struct MatchedDeclaration<'a> {
    declaration: &'a Declaration,
    key: CascadeKey,
}

/// The resolved declarations for one target, one per property.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeclarationBlock {
    declarations: Vec<Declaration>,
}

impl DeclarationBlock {
    /// De-duplicate a single rule's declaration list: a later declaration of
    /// the same property wins unless the earlier one is `!important`.
    pub fn for_rule(declarations: &[Declaration]) -> Self {
        Self::resolve(declarations.iter().enumerate().map(|(position, declaration)| {
            (
                CascadeKey {
                    important: declaration.important,
                    specificity: Specificity::default(),
                    source_index: 0,
                    position,
                },
                declaration,
            )
        }))
    }

    /// Apply declarations in cascade order. A property that is overridden
    /// moves to the end of the block.
    pub fn resolve<'a>(declarations: impl IntoIterator<Item = (CascadeKey, &'a Declaration)>) -> Self {
        let mut matched: Vec<MatchedDeclaration<'a>> = declarations
            .into_iter()
            .map(|(key, declaration)| MatchedDeclaration { declaration, key })
            .collect();

        if matched.len() > 1 {
            matched.sort_by_key(|m| m.key);
        }

        let mut block = Self::default();
        for m in matched {
            block.apply(m.declaration.clone());
        }
        block
    }

    fn apply(&mut self, declaration: Declaration) {
        self.declarations
            .retain(|existing| existing.property != declaration.property);
        self.declarations.push(declaration);
    }

    pub fn get(&self, property: &str) -> Option<&Declaration> {
        self.declarations.iter().find(|d| d.property == property)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter()
    }

    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }

    /// Render for a `style` attribute. `!important` is dropped: inline
    /// styles already outrank every stylesheet rule left in the head.
    pub fn to_inline_style(&self) -> String {
        self.declarations
            .iter()
            .map(|d| format!("{}: {}", d.property, d.value))
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Render as the body of a stylesheet rule, keeping `!important`.
    pub fn to_css(&self) -> String {
        self.declarations
            .iter()
            .map(Declaration::to_css)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

/// Declarations collected per element, resolved once all rules are seen.
#[derive(Debug, Default)]
pub struct Cascade<'a> {
    targets: BTreeMap<ArenaNodeId, Vec<(CascadeKey, &'a Declaration)>>,
}

impl<'a> Cascade<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `rule` matched `element`, contributing `declarations`
    /// (a subset of the rule's own declarations, with their positions).
    pub fn add<I>(&mut self, element: ArenaNodeId, rule: &'a Rule, declarations: I)
    where
        I: IntoIterator<Item = (usize, &'a Declaration)>,
    {
        let entry = self.targets.entry(element).or_default();
        for (position, declaration) in declarations {
            entry.push((
                CascadeKey {
                    important: declaration.important,
                    specificity: rule.specificity,
                    source_index: rule.source_index,
                    position,
                },
                declaration,
            ));
        }
    }

    pub fn is_empty(&self) -> bool {
        self.targets.is_empty()
    }

    /// Resolve every element's declarations, in document order of the
    /// element ids.
    pub fn resolve(self) -> BTreeMap<ArenaNodeId, DeclarationBlock> {
        self.targets
            .into_iter()
            .map(|(element, declarations)| (element, DeclarationBlock::resolve(declarations)))
            .filter(|(_, block)| !block.is_empty())
            .collect()
    }
}
