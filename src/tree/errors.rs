use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("failed to set C language for tree-sitter parser")]
    LanguageSet,

    #[error("failed to parse source code")]
    ParseFailed,

    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid syntax tree JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("node span {start}..{end} lies outside the {len}-byte source")]
    SpanOutOfBounds { start: usize, end: usize, len: usize },
}
