//! Pattern matching over syntax trees.
//!
//! [`match_tree`] walks a tree once in pre-order and tests every registered
//! pattern at every node, in registration order. Matches are produced lazily
//! and borrow both the tree and the registry.

use crate::pattern::{Pattern, Quantifier, Registry, Shape, Slot};
use crate::tree::{MalformedNode, Node, SyntaxTree};
use std::iter::FusedIterator;

/// A successful pattern application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'t, 'r> {
    pub tag: &'r str,
    /// The captured node, or the pattern root when nothing is captured.
    pub node: Node<'t>,
    /// Position of the pattern in the registry.
    pub pattern: usize,
}

/// Match every pattern of `registry` against every node of `tree`.
///
/// Results come in traversal order (node before children, children left to
/// right) and, within one node, in pattern registration order. Running the
/// pass again over the same inputs yields the same sequence.
pub fn match_tree<'t, 'r>(tree: &'t SyntaxTree, registry: &'r Registry) -> Matches<'t, 'r> {
    Matches {
        patterns: registry.all(),
        stack: vec![tree.root()],
        current: None,
        next_pattern: 0,
    }
}

/// Lazy iterator returned by [`match_tree`].
pub struct Matches<'t, 'r> {
    patterns: &'r [Pattern],
    stack: Vec<Node<'t>>,
    current: Option<Node<'t>>,
    next_pattern: usize,
}

impl<'t, 'r> Iterator for Matches<'t, 'r> {
    type Item = Match<'t, 'r>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let node = match self.current {
                Some(node) => node,
                None => {
                    let node = self.stack.pop()?;
                    self.stack.extend(node.children().rev());
                    self.current = Some(node);
                    self.next_pattern = 0;
                    node
                }
            };

            while let Some(pattern) = self.patterns.get(self.next_pattern) {
                let index = self.next_pattern;
                self.next_pattern += 1;

                match evaluate(pattern.shape(), node) {
                    Ok(Eval::Hit(captured)) => {
                        return Some(Match {
                            tag: pattern.tag(),
                            node: captured.unwrap_or(node),
                            pattern: index,
                        });
                    }
                    Ok(Eval::Miss) => {}
                    Err(malformed) => {
                        tracing::debug!(
                            tag = pattern.tag(),
                            error = %malformed,
                            "skipping pattern on malformed node"
                        );
                    }
                }
            }

            self.current = None;
        }
    }
}

impl FusedIterator for Matches<'_, '_> {}

enum Eval<'t> {
    Miss,
    Hit(Option<Node<'t>>),
}

fn evaluate<'t>(shape: &Shape, node: Node<'t>) -> Result<Eval<'t>, MalformedNode> {
    if !shape.kind.matches(node.kind()) {
        return Ok(Eval::Miss);
    }

    let mut captured = shape.capture.then_some(node);

    for constraint in &shape.children {
        let candidates: Vec<Node<'t>> = match &constraint.slot {
            Slot::Field(field) => node.children_by_field(field)?,
            Slot::Any => node.named_children().collect(),
        };

        let mut hits = 0usize;
        let mut inner_capture = None;
        for candidate in candidates {
            if let Eval::Hit(capture) = evaluate(&constraint.shape, candidate)? {
                hits += 1;
                inner_capture = inner_capture.or(capture);
            }
        }

        let satisfied = match constraint.quantifier {
            Quantifier::Exact => hits == 1,
            Quantifier::Optional => true,
            Quantifier::OneOrMore => hits >= 1,
        };
        if !satisfied {
            return Ok(Eval::Miss);
        }
        captured = captured.or(inner_capture);
    }

    Ok(Eval::Hit(captured))
}
