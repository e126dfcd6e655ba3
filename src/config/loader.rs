use crate::config::schema::{PatternConfig, ValidationError};
use crate::pattern::{Grammar, InvalidShapeError, Registry};
use crate::tree::c_language;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug)]
pub enum ConfigError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Toml {
        path: Option<PathBuf>,
        source: toml_edit::de::Error,
    },
    Validation {
        path: Option<PathBuf>,
        source: ValidationError,
    },
    Registration {
        path: Option<PathBuf>,
        errors: Vec<InvalidShapeError>,
    },
}

impl ConfigError {
    fn with_path(self, path: &Path) -> Self {
        let path = path.to_path_buf();
        match self {
            ConfigError::Io { .. } => self,
            ConfigError::Toml { path: None, source } => ConfigError::Toml {
                path: Some(path),
                source,
            },
            ConfigError::Validation { path: None, source } => ConfigError::Validation {
                path: Some(path),
                source,
            },
            ConfigError::Registration { path: None, errors } => ConfigError::Registration {
                path: Some(path),
                errors,
            },
            other => other,
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(
                    f,
                    "failed to read pattern file {}: {}",
                    path.display(),
                    source
                )
            }
            ConfigError::Toml { path, source } => match path {
                Some(path) => write!(
                    f,
                    "failed to parse pattern file TOML ({}): {}",
                    path.display(),
                    source
                ),
                None => write!(f, "failed to parse pattern file TOML: {}", source),
            },
            ConfigError::Validation { path, source } => match path {
                Some(path) => write!(f, "invalid pattern file ({}): {}", path.display(), source),
                None => write!(f, "invalid pattern file: {}", source),
            },
            ConfigError::Registration { path, errors } => {
                match path {
                    Some(path) => write!(
                        f,
                        "{} pattern(s) rejected in {}",
                        errors.len(),
                        path.display()
                    )?,
                    None => write!(f, "{} pattern(s) rejected", errors.len())?,
                }
                for error in errors {
                    write!(f, "\n  {error}")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Toml { source, .. } => Some(source),
            ConfigError::Validation { source, .. } => Some(source),
            ConfigError::Registration { errors, .. } => errors
                .first()
                .map(|e| e as &(dyn std::error::Error + 'static)),
        }
    }
}

pub fn load_from_str(input: &str) -> Result<PatternConfig, ConfigError> {
    let config: PatternConfig = toml_edit::de::from_str(input)
        .map_err(|source| ConfigError::Toml { path: None, source })?;
    config
        .validate()
        .map_err(|source| ConfigError::Validation { path: None, source })?;
    Ok(config)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<PatternConfig, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    load_from_str(&contents).map_err(|error| error.with_path(path))
}

/// Build a C registry from pattern file text.
///
/// Every declaration is attempted; the call fails if any was rejected.
pub fn registry_from_str(input: &str) -> Result<Registry, ConfigError> {
    registry_from_str_with(input, c_language())
}

/// Build a registry whose kinds and fields are validated against `grammar`.
///
/// Trees from another parser carry their own field names, so pattern files
/// written for them are checked with that parser's grammar (or
/// [`OpenGrammar`](crate::pattern::OpenGrammar) when none is known).
pub fn registry_from_str_with(
    input: &str,
    grammar: impl Grammar + 'static,
) -> Result<Registry, ConfigError> {
    let config = load_from_str(input)?;
    let mut registry = Registry::with_grammar(grammar);
    let errors = config.register_all(&mut registry);
    if errors.is_empty() {
        Ok(registry)
    } else {
        Err(ConfigError::Registration { path: None, errors })
    }
}

pub fn registry_from_path(path: impl AsRef<Path>) -> Result<Registry, ConfigError> {
    registry_from_path_with(path, c_language())
}

pub fn registry_from_path_with(
    path: impl AsRef<Path>,
    grammar: impl Grammar + 'static,
) -> Result<Registry, ConfigError> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    registry_from_str_with(&contents, grammar).map_err(|error| error.with_path(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::{OpenGrammar, Quantifier, ShapeIssue, Slot};

    const BUILTIN_EQUIVALENT: &str = r#"
[[patterns]]
tag = "function.body"
kind = "function_definition"

[[patterns.children]]
kind = "storage_class_specifier"
quantifier = "optional"

[[patterns.children]]
slot = "type"
kind = "primitive_type"

[[patterns.children]]
slot = "declarator"
kind = "function_declarator"

[[patterns.children]]
slot = "body"
kind = "compound_statement"
capture = true

[[patterns]]
tag = "expression.paranthesis"
kind = "parenthesized_expression"

[[patterns]]
tag = "list.arguments"
kind = "argument_list"

[[patterns]]
tag = "structs"
kind = "struct_specifier"

[[patterns]]
tag = "enums"
kind = "enum_specifier"

[[patterns]]
tag = "declarator.pointer"
kind = "declaration"

[[patterns.children]]
slot = "*"
kind = "pointer_declarator"
quantifier = "one-or-more"

[[patterns]]
tag = "declarator.pointer"
kind = "cast_expression"
"#;

    #[test]
    fn file_reproduces_builtin_rules() {
        let registry = registry_from_str(BUILTIN_EQUIVALENT).unwrap();
        assert_eq!(registry.all(), Registry::builtin().all());
    }

    #[test]
    fn nested_children_and_alternatives() {
        let config = load_from_str(
            r#"
[[patterns]]
tag = "records"
kinds = ["struct_specifier", "union_specifier"]

[[patterns.children]]
slot = "body"
kind = "field_declaration_list"

[[patterns.children.children]]
kind = "field_declaration"
quantifier = "one-or-more"
"#,
        )
        .unwrap();

        let shape = config.patterns[0].node.to_shape();
        assert!(shape.kind.matches("union_specifier"));
        let body = &shape.children[0];
        assert_eq!(body.slot, Slot::Field("body".into()));
        assert_eq!(body.shape.children[0].quantifier, Quantifier::OneOrMore);
        assert_eq!(body.shape.children[0].slot, Slot::Any);
    }

    #[test]
    fn rejects_empty_file() {
        let err = load_from_str("").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(err.to_string().contains("no patterns"));
    }

    #[test]
    fn rejects_kind_and_kinds_together() {
        let err = load_from_str(
            r#"
[[patterns]]
tag = "x"
kind = "a"
kinds = ["b"]
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("cannot both be set"));
    }

    #[test]
    fn reports_every_rejected_pattern() {
        let err = registry_from_str(
            r#"
[[patterns]]
tag = "bad-field"
kind = "declaration"

[[patterns.children]]
slot = "declarator"
kind = "pointer_declarator"
quantifier = "one-or-more"

[[patterns]]
tag = "fine"
kind = "enum_specifier"

[[patterns]]
tag = "bad-slot"
kind = "declaration"

[[patterns.children]]
slot = "nonexistent_field"
"#,
        )
        .unwrap_err();

        match err {
            ConfigError::Registration { errors, .. } => {
                assert_eq!(errors.len(), 2);
                assert_eq!(errors[0].tag, "bad-field");
                assert!(matches!(errors[0].issue, ShapeIssue::RepeatedField { .. }));
                assert_eq!(errors[1].tag, "bad-slot");
                assert!(matches!(errors[1].issue, ShapeIssue::UnknownField { .. }));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn grammar_decides_which_fields_exist() {
        let input = r#"
[[patterns]]
tag = "assignment.rhs"
kind = "assignment"

[[patterns.children]]
slot = "rhs"
capture = true
"#;

        let err = registry_from_str(input).unwrap_err();
        assert!(matches!(err, ConfigError::Registration { .. }));
        assert!(err.to_string().contains("rhs"));

        let registry = registry_from_str_with(input, OpenGrammar).unwrap();
        assert_eq!(registry.tags(), vec!["assignment.rhs"]);
        assert!(registry.warnings().is_empty());
    }

    #[test]
    fn path_is_attached_to_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.toml");
        fs::write(&path, "[[patterns]\n").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { path: Some(_), .. }));
        assert!(err.to_string().contains("broken.toml"));

        let missing = load_from_path(dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }
}
