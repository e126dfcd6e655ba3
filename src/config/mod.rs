pub mod loader;
pub mod schema;

pub use loader::{
    load_from_path, load_from_str, registry_from_path, registry_from_path_with, registry_from_str,
    registry_from_str_with, ConfigError,
};
pub use schema::{
    ChildDecl, NodeDecl, PatternConfig, PatternDecl, ValidationError, ValidationIssue, ANY_SLOT,
};
