//! Structured shape descriptors.
//!
//! A [`Shape`] describes a node by kind plus constraints on its children.
//! Optionality and repetition are explicit [`Quantifier`]s, so the matcher
//! interprets plain data and never parses rule text.
//!
//! ```
//! use nxstyle::pattern::{Shape, Slot};
//!
//! // (function_definition
//! //   (storage_class_specifier)?
//! //   body: (compound_statement) @tag)
//! let shape = Shape::kind("function_definition")
//!     .optional(Slot::Any, Shape::kind("storage_class_specifier"))
//!     .field("body", Shape::kind("compound_statement").captured());
//! assert_eq!(shape.children.len(), 2);
//! ```

use serde::Deserialize;

/// Which node kinds a shape accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KindMatch {
    Any,
    Kind(String),
    OneOf(Vec<String>),
}

impl KindMatch {
    pub fn matches(&self, kind: &str) -> bool {
        match self {
            KindMatch::Any => true,
            KindMatch::Kind(k) => k == kind,
            KindMatch::OneOf(kinds) => kinds.iter().any(|k| k == kind),
        }
    }

    /// Kind names referenced by this matcher.
    pub fn names(&self) -> &[String] {
        match self {
            KindMatch::Any => &[],
            KindMatch::Kind(k) => std::slice::from_ref(k),
            KindMatch::OneOf(kinds) => kinds,
        }
    }
}

/// Where a child constraint looks for candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// Any named child, at any position.
    Any,
    /// The children recorded under a grammar field.
    Field(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Quantifier {
    /// Exactly one candidate in the slot satisfies the shape.
    #[default]
    Exact,
    /// Never fails; a present, satisfying candidate may still be captured.
    Optional,
    /// At least one candidate satisfies the shape.
    OneOrMore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildConstraint {
    pub slot: Slot,
    pub quantifier: Quantifier,
    pub shape: Shape,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    pub kind: KindMatch,
    /// Tag this node instead of the pattern root.
    pub capture: bool,
    pub children: Vec<ChildConstraint>,
}

impl Shape {
    pub fn new(kind: KindMatch) -> Self {
        Self {
            kind,
            capture: false,
            children: Vec::new(),
        }
    }

    pub fn kind(kind: impl Into<String>) -> Self {
        Self::new(KindMatch::Kind(kind.into()))
    }

    pub fn one_of<I, S>(kinds: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(KindMatch::OneOf(kinds.into_iter().map(Into::into).collect()))
    }

    pub fn any() -> Self {
        Self::new(KindMatch::Any)
    }

    pub fn captured(mut self) -> Self {
        self.capture = true;
        self
    }

    pub fn constrain(mut self, slot: Slot, quantifier: Quantifier, shape: Shape) -> Self {
        self.children.push(ChildConstraint {
            slot,
            quantifier,
            shape,
        });
        self
    }

    /// Require the child under `field` to satisfy `shape`.
    pub fn field(self, field: impl Into<String>, shape: Shape) -> Self {
        self.constrain(Slot::Field(field.into()), Quantifier::Exact, shape)
    }

    /// Require exactly one named child satisfying `shape`.
    pub fn child(self, shape: Shape) -> Self {
        self.constrain(Slot::Any, Quantifier::Exact, shape)
    }

    pub fn optional(self, slot: Slot, shape: Shape) -> Self {
        self.constrain(slot, Quantifier::Optional, shape)
    }

    pub fn one_or_more(self, slot: Slot, shape: Shape) -> Self {
        self.constrain(slot, Quantifier::OneOrMore, shape)
    }
}
