//! Projection of matches into caller-facing results.

use crate::matcher::Match;
use crate::tree::{Node, Span};
use serde::Serialize;
use std::collections::HashMap;

/// A tag attached to a source span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tagged<'r> {
    pub tag: &'r str,
    pub span: Span,
}

/// Project matches to `(tag, span)` pairs, keeping order and duplicates.
pub fn emit<'t, 'r, I>(matches: I) -> Vec<Tagged<'r>>
where
    I: IntoIterator<Item = Match<'t, 'r>>,
{
    matches
        .into_iter()
        .map(|m| Tagged {
            tag: m.tag,
            span: m.node.span(),
        })
        .collect()
}

/// Matched nodes grouped by tag, each group in traversal order.
#[derive(Debug, Default)]
pub struct Captures<'t, 'r> {
    by_tag: HashMap<&'r str, Vec<Node<'t>>>,
}

impl<'t, 'r> Captures<'t, 'r> {
    pub fn collect<I>(matches: I) -> Self
    where
        I: IntoIterator<Item = Match<'t, 'r>>,
    {
        let mut by_tag: HashMap<&'r str, Vec<Node<'t>>> = HashMap::new();
        for m in matches {
            by_tag.entry(m.tag).or_default().push(m.node);
        }
        Self { by_tag }
    }

    /// Nodes tagged with `tag`; empty if the tag never fired.
    pub fn get(&self, tag: &str) -> &[Node<'t>] {
        self.by_tag.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.by_tag.contains_key(tag)
    }

    pub fn total(&self) -> usize {
        self.by_tag.values().map(Vec::len).sum()
    }
}
