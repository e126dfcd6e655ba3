use crate::pattern::{InvalidShapeError, KindMatch, Quantifier, Registry, Shape, Slot};
use serde::Deserialize;
use std::fmt;

/// Slot value that selects any named child instead of a field.
pub const ANY_SLOT: &str = "*";

/// A pattern file: an ordered list of pattern declarations.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct PatternConfig {
    #[serde(default)]
    pub patterns: Vec<PatternDecl>,
}

impl PatternConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        let mut issues = Vec::new();

        if self.patterns.is_empty() {
            issues.push(ValidationIssue::EmptyPatternList);
        }

        for pattern in &self.patterns {
            let tag = (!pattern.tag.trim().is_empty()).then(|| pattern.tag.clone());
            if tag.is_none() {
                issues.push(ValidationIssue::MissingField {
                    tag: None,
                    field: "tag",
                });
            }
            pattern.node.collect_issues(tag.as_deref(), &mut issues);
        }

        if issues.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { issues })
        }
    }

    /// Register every declaration, in file order.
    ///
    /// A rejected declaration does not stop the ones after it; all rejections
    /// are returned.
    pub fn register_all(&self, registry: &mut Registry) -> Vec<InvalidShapeError> {
        self.patterns
            .iter()
            .filter_map(|decl| registry.register(decl.tag.clone(), decl.node.to_shape()).err())
            .collect()
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct PatternDecl {
    pub tag: String,
    #[serde(flatten)]
    pub node: NodeDecl,
}

/// Node constraint shared by pattern roots and children.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct NodeDecl {
    #[serde(default)]
    pub kind: Option<String>,
    #[serde(default)]
    pub kinds: Option<Vec<String>>,
    #[serde(default)]
    pub capture: bool,
    #[serde(default)]
    pub children: Vec<ChildDecl>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChildDecl {
    /// Field name, or `*`/absent for any named child.
    #[serde(default)]
    pub slot: Option<String>,
    #[serde(default)]
    pub quantifier: Quantifier,
    #[serde(flatten)]
    pub node: NodeDecl,
}

impl NodeDecl {
    pub fn to_shape(&self) -> Shape {
        let kind = match (&self.kind, &self.kinds) {
            (Some(kind), _) => KindMatch::Kind(kind.clone()),
            (None, Some(kinds)) => KindMatch::OneOf(kinds.clone()),
            (None, None) => KindMatch::Any,
        };
        let mut shape = Shape::new(kind);
        shape.capture = self.capture;
        for child in &self.children {
            let slot = match child.slot.as_deref() {
                None | Some(ANY_SLOT) => Slot::Any,
                Some(field) => Slot::Field(field.to_string()),
            };
            shape = shape.constrain(slot, child.quantifier, child.node.to_shape());
        }
        shape
    }

    fn collect_issues(&self, tag: Option<&str>, issues: &mut Vec<ValidationIssue>) {
        if self.kind.is_some() && self.kinds.is_some() {
            issues.push(ValidationIssue::InvalidCombo {
                tag: tag.map(str::to_string),
                message: "`kind` and `kinds` cannot both be set".to_string(),
            });
        }
        for child in &self.children {
            child.node.collect_issues(tag, issues);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub issues: Vec<ValidationIssue>,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, issue) in self.issues.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationError {}

#[derive(Debug, Clone)]
pub enum ValidationIssue {
    EmptyPatternList,
    MissingField {
        tag: Option<String>,
        field: &'static str,
    },
    InvalidCombo {
        tag: Option<String>,
        message: String,
    },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::EmptyPatternList => write!(f, "pattern file contains no patterns"),
            ValidationIssue::MissingField { tag, field } => match tag {
                Some(tag) => write!(f, "pattern '{tag}' missing required field '{field}'"),
                None => write!(f, "pattern missing required field '{field}'"),
            },
            ValidationIssue::InvalidCombo { tag, message } => match tag {
                Some(tag) => write!(f, "pattern '{tag}' has invalid configuration: {message}"),
                None => write!(f, "invalid pattern configuration: {message}"),
            },
        }
    }
}
