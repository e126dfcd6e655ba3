//! nxstyle: tree pattern tagging and NuttX C style checking
//!
//! Syntax trees are matched against a registry of shape patterns. Every node
//! that fits a pattern is reported with the pattern's tag; style rules then
//! run over the tagged nodes.
//!
//! # Architecture
//!
//! - [`tree`]: arena-backed syntax trees, built by tree-sitter or from JSON.
//! - [`pattern`]: shape descriptors and the [`Registry`] that validates them.
//! - [`matcher`]: pre-order matching of a registry against a tree.
//! - [`emit`]: projection of matches into `(tag, span)` pairs.
//! - [`config`]: TOML pattern files.
//! - [`style`]: NuttX style rules driven by the builtin tags.
//!
//! # Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! use nxstyle::{emit, match_tree, CParser, Registry};
//!
//! let tree = CParser::new()?.parse("struct point_s\n{\n  int x;\n};\n")?;
//! for tagged in emit(match_tree(&tree, Registry::builtin())) {
//!     println!("{} at {}", tagged.tag, tagged.span);
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod emit;
pub mod matcher;
pub mod pattern;
pub mod pool;
pub mod style;
pub mod telemetry;
pub mod tree;

// Re-exports
pub use config::{load_from_path, load_from_str, registry_from_path, ConfigError, PatternConfig};
pub use emit::{emit, Captures, Tagged};
pub use matcher::{match_tree, Match, Matches};
pub use pattern::{
    InvalidShapeError, KindMatch, Pattern, Quantifier, Registry, Shape, Slot, UnknownKindWarning,
};
pub use style::{check_file, check_source, CheckOptions, Diagnostic, Severity, StyleError};
pub use tree::{CParser, Node, NodeSpec, Point, Span, SyntaxTree, TreeError};
