//! Syntax tree model and the tree-sitter C front end.
//!
//! The matcher only ever sees [`SyntaxTree`]; tree-sitter is confined to
//! [`parser`], which converts its concrete syntax trees into this model.

pub mod errors;
pub mod node;
pub mod parser;

pub use errors::TreeError;
pub use node::{MalformedNode, Node, NodeId, NodeSpec, Point, Span, SyntaxTree};
pub use parser::{c_language, CParser};
