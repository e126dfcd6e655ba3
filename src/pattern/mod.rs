//! Pattern registry and shape descriptors.
//!
//! Patterns are tree shapes with a tag. They are validated against a
//! [`Grammar`] when registered and are immutable afterwards.

pub mod errors;
pub mod grammar;
pub mod registry;
pub mod shape;

pub use errors::{InvalidShapeError, ShapeIssue, UnknownKindWarning};
pub use grammar::{Grammar, OpenGrammar, StaticGrammar};
pub use registry::{tags, Pattern, Registry};
pub use shape::{ChildConstraint, KindMatch, Quantifier, Shape, Slot};
