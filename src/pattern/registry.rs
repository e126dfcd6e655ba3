use crate::pattern::errors::{InvalidShapeError, ShapeIssue, UnknownKindWarning};
use crate::pattern::grammar::{Grammar, OpenGrammar};
use crate::pattern::shape::{KindMatch, Quantifier, Shape, Slot};
use crate::tree::c_language;
use std::fmt;
use std::sync::LazyLock;

/// Tags emitted by the builtin C rule set.
pub mod tags {
    pub const FUNCTION_BODY: &str = "function.body";
    pub const PARENTHESIZED: &str = "expression.paranthesis";
    pub const ARGUMENTS: &str = "list.arguments";
    pub const STRUCTS: &str = "structs";
    pub const ENUMS: &str = "enums";
    pub const POINTER: &str = "declarator.pointer";
}

/// Suggestions below this similarity are not worth showing.
const SUGGESTION_THRESHOLD: f64 = 0.7;

static BUILTIN: LazyLock<Registry> = LazyLock::new(Registry::c_style);

/// A registered, immutable pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pattern {
    tag: String,
    shape: Shape,
}

impl Pattern {
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }
}

/// Ordered collection of patterns, validated against a [`Grammar`].
pub struct Registry {
    grammar: Box<dyn Grammar>,
    patterns: Vec<Pattern>,
    warnings: Vec<UnknownKindWarning>,
}

impl Registry {
    /// An empty registry that accepts any kind or field name.
    pub fn new() -> Self {
        Self::with_grammar(OpenGrammar)
    }

    pub fn with_grammar(grammar: impl Grammar + 'static) -> Self {
        Self {
            grammar: Box::new(grammar),
            patterns: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// An empty registry validated against the tree-sitter C grammar.
    pub fn for_c() -> Self {
        Self::with_grammar(c_language())
    }

    /// The builtin C style rules, built once per process.
    pub fn builtin() -> &'static Registry {
        &BUILTIN
    }

    /// A fresh copy of the builtin C style rules.
    pub fn c_style() -> Self {
        let mut registry = Self::for_c();
        for (tag, shape) in builtin_rules() {
            if let Err(e) = registry.register(tag, shape) {
                // Builtin shapes are fixed; this only fires if the grammar changes.
                tracing::error!(error = %e, "builtin pattern rejected");
            }
        }
        registry
    }

    /// Append a pattern and return its position, the same index reported in
    /// [`Match::pattern`](crate::matcher::Match).
    ///
    /// On error the registry is left untouched. Kinds unknown to the grammar
    /// are accepted with an [`UnknownKindWarning`].
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        shape: Shape,
    ) -> Result<usize, InvalidShapeError> {
        let tag = tag.into();
        let mut check = ShapeCheck {
            grammar: self.grammar.as_ref(),
            captures: 0,
            unknown: Vec::new(),
        };

        let outcome = if tag.trim().is_empty() {
            Err(ShapeIssue::EmptyTag)
        } else {
            check.visit(&shape, false)
        };
        if let Err(issue) = outcome {
            return Err(InvalidShapeError { tag, issue });
        }

        for kind in check.unknown {
            let warning = UnknownKindWarning {
                suggestion: self.suggest(&kind),
                tag: tag.clone(),
                kind,
            };
            tracing::warn!(
                tag = %warning.tag,
                kind = %warning.kind,
                suggestion = warning.suggestion.as_deref().unwrap_or(""),
                "pattern references unknown node kind and will never match"
            );
            self.warnings.push(warning);
        }

        let index = self.patterns.len();
        tracing::debug!(tag = %tag, index, "registered pattern");
        self.patterns.push(Pattern { tag, shape });
        Ok(index)
    }

    pub fn all(&self) -> &[Pattern] {
        &self.patterns
    }

    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    pub fn warnings(&self) -> &[UnknownKindWarning] {
        &self.warnings
    }

    /// Distinct tags in first-registration order.
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = Vec::new();
        for pattern in &self.patterns {
            if !tags.contains(&pattern.tag()) {
                tags.push(pattern.tag());
            }
        }
        tags
    }

    fn suggest(&self, kind: &str) -> Option<String> {
        self.grammar
            .kinds()
            .into_iter()
            .map(|known| (strsim::normalized_levenshtein(kind, &known), known))
            .filter(|(score, _)| *score >= SUGGESTION_THRESHOLD)
            .max_by(|a, b| a.0.total_cmp(&b.0))
            .map(|(_, known)| known)
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("patterns", &self.patterns)
            .field("warnings", &self.warnings)
            .finish_non_exhaustive()
    }
}

struct ShapeCheck<'g> {
    grammar: &'g dyn Grammar,
    captures: usize,
    unknown: Vec<String>,
}

impl ShapeCheck<'_> {
    fn visit(&mut self, shape: &Shape, repeated: bool) -> Result<(), ShapeIssue> {
        if matches!(&shape.kind, KindMatch::OneOf(kinds) if kinds.is_empty()) {
            return Err(ShapeIssue::EmptyKind);
        }
        for kind in shape.kind.names() {
            if kind.trim().is_empty() {
                return Err(ShapeIssue::EmptyKind);
            }
            if !self.grammar.has_kind(kind) && !self.unknown.contains(kind) {
                self.unknown.push(kind.clone());
            }
        }

        if shape.capture {
            if repeated {
                return Err(ShapeIssue::CaptureInRepetition);
            }
            self.captures += 1;
            if self.captures > 1 {
                return Err(ShapeIssue::MultipleCaptures);
            }
        }

        for constraint in &shape.children {
            if let Slot::Field(field) = &constraint.slot {
                if field.trim().is_empty() || !self.grammar.has_field(field) {
                    return Err(ShapeIssue::UnknownField {
                        field: field.clone(),
                    });
                }
                if constraint.quantifier == Quantifier::OneOrMore {
                    return Err(ShapeIssue::RepeatedField {
                        field: field.clone(),
                    });
                }
            }
            let repeated = repeated || constraint.quantifier == Quantifier::OneOrMore;
            self.visit(&constraint.shape, repeated)?;
        }
        Ok(())
    }
}

/// The NuttX C style rule set.
fn builtin_rules() -> Vec<(&'static str, Shape)> {
    vec![
        (
            tags::FUNCTION_BODY,
            Shape::kind("function_definition")
                .optional(Slot::Any, Shape::kind("storage_class_specifier"))
                .field("type", Shape::kind("primitive_type"))
                .field("declarator", Shape::kind("function_declarator"))
                .field("body", Shape::kind("compound_statement").captured()),
        ),
        (tags::PARENTHESIZED, Shape::kind("parenthesized_expression")),
        (tags::ARGUMENTS, Shape::kind("argument_list")),
        (tags::STRUCTS, Shape::kind("struct_specifier")),
        (tags::ENUMS, Shape::kind("enum_specifier")),
        (
            tags::POINTER,
            Shape::kind("declaration").one_or_more(Slot::Any, Shape::kind("pointer_declarator")),
        ),
        (tags::POINTER, Shape::kind("cast_expression")),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::grammar::StaticGrammar;

    #[test]
    fn builtin_rules_register_cleanly() {
        let registry = Registry::builtin();
        assert_eq!(registry.len(), 7);
        assert!(registry.warnings().is_empty());
        assert_eq!(
            registry.tags(),
            vec![
                "function.body",
                "expression.paranthesis",
                "list.arguments",
                "structs",
                "enums",
                "declarator.pointer",
            ]
        );
    }

    #[test]
    fn repetition_on_field_is_rejected_without_side_effects() {
        let mut registry = Registry::for_c();
        registry.register("structs", Shape::kind("struct_specifier")).unwrap();

        let err = registry
            .register(
                "bad",
                Shape::kind("declaration").one_or_more(
                    Slot::Field("declarator".into()),
                    Shape::kind("pointer_declarator"),
                ),
            )
            .unwrap_err();

        assert_eq!(
            err.issue,
            ShapeIssue::RepeatedField {
                field: "declarator".into()
            }
        );
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.all()[0].tag(), "structs");
    }

    #[test]
    fn failed_registration_does_not_block_later_ones() {
        let mut registry = Registry::for_c();
        assert!(registry
            .register("bad", Shape::kind("function_definition").field("torso", Shape::any()))
            .is_err());
        assert!(registry.register("enums", Shape::kind("enum_specifier")).is_ok());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn rejects_malformed_shapes() {
        let mut registry = Registry::new();

        let empty_tag = registry.register("  ", Shape::kind("x")).unwrap_err();
        assert_eq!(empty_tag.issue, ShapeIssue::EmptyTag);

        let empty_kind = registry.register("t", Shape::kind("")).unwrap_err();
        assert_eq!(empty_kind.issue, ShapeIssue::EmptyKind);

        let no_alternatives = registry
            .register("t", Shape::one_of(Vec::<String>::new()))
            .unwrap_err();
        assert_eq!(no_alternatives.issue, ShapeIssue::EmptyKind);

        let two_captures = registry
            .register(
                "t",
                Shape::kind("a")
                    .captured()
                    .child(Shape::kind("b").captured()),
            )
            .unwrap_err();
        assert_eq!(two_captures.issue, ShapeIssue::MultipleCaptures);

        let capture_in_repeat = registry
            .register(
                "t",
                Shape::kind("a").one_or_more(Slot::Any, Shape::kind("b").captured()),
            )
            .unwrap_err();
        assert_eq!(capture_in_repeat.issue, ShapeIssue::CaptureInRepetition);

        assert!(registry.is_empty());
    }

    #[test]
    fn register_returns_the_pattern_position() {
        let mut registry = Registry::for_c();
        assert_eq!(registry.register("structs", Shape::kind("struct_specifier")), Ok(0));
        assert!(registry.register("", Shape::kind("enum_specifier")).is_err());
        assert_eq!(registry.register("enums", Shape::kind("enum_specifier")), Ok(1));
        assert_eq!(registry.all()[1].tag(), "enums");
    }

    #[test]
    fn unknown_kind_is_a_warning() {
        let mut registry = Registry::for_c();
        registry
            .register("structs", Shape::kind("struct_specifer"))
            .unwrap();

        assert_eq!(registry.len(), 1);
        let warning = &registry.warnings()[0];
        assert_eq!(warning.kind, "struct_specifer");
        assert_eq!(warning.suggestion.as_deref(), Some("struct_specifier"));
        assert!(warning.to_string().contains("did you mean `struct_specifier`"));
    }

    #[test]
    fn static_grammar_drives_validation() {
        let grammar = StaticGrammar::new(["declaration", "pointer_declarator"], ["declarator"]);
        let mut registry = Registry::with_grammar(grammar);

        registry
            .register(
                "declarator.pointer",
                Shape::kind("declaration").field("declarator", Shape::kind("pointer_declarator")),
            )
            .unwrap();
        let err = registry
            .register("x", Shape::kind("declaration").field("value", Shape::any()))
            .unwrap_err();
        assert_eq!(err.issue, ShapeIssue::UnknownField { field: "value".into() });
    }
}
