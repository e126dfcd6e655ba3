use std::fmt;
use thiserror::Error;

/// A pattern that cannot be registered.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid shape for pattern `{tag}`: {issue}")]
pub struct InvalidShapeError {
    pub tag: String,
    pub issue: ShapeIssue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShapeIssue {
    EmptyTag,
    EmptyKind,
    UnknownField { field: String },
    RepeatedField { field: String },
    MultipleCaptures,
    CaptureInRepetition,
}

impl fmt::Display for ShapeIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShapeIssue::EmptyTag => write!(f, "tag is empty"),
            ShapeIssue::EmptyKind => write!(f, "kind name is empty"),
            ShapeIssue::UnknownField { field } => {
                write!(f, "field `{field}` is not defined by the grammar")
            }
            ShapeIssue::RepeatedField { field } => write!(
                f,
                "field `{field}` holds a single child and cannot take a one-or-more quantifier"
            ),
            ShapeIssue::MultipleCaptures => write!(f, "more than one node is marked as captured"),
            ShapeIssue::CaptureInRepetition => {
                write!(f, "a captured node cannot sit under a one-or-more quantifier")
            }
        }
    }
}

/// A pattern referencing a node kind the grammar does not define.
///
/// Registration still succeeds; the pattern simply never matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKindWarning {
    pub tag: String,
    pub kind: String,
    pub suggestion: Option<String>,
}

impl fmt::Display for UnknownKindWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "pattern `{}` references unknown node kind `{}`",
            self.tag, self.kind
        )?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " (did you mean `{suggestion}`?)")?;
        }
        Ok(())
    }
}
