//! Node kind and field vocabularies used to validate patterns.

use std::collections::BTreeSet;
use tree_sitter::Language;

/// The vocabulary a registry checks patterns against.
pub trait Grammar: Send + Sync {
    fn has_kind(&self, kind: &str) -> bool;

    fn has_field(&self, field: &str) -> bool;

    /// Named node kinds, used to suggest corrections for unknown kinds.
    fn kinds(&self) -> Vec<String>;
}

/// Accepts every kind and field. Used when trees come from an unknown parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenGrammar;

impl Grammar for OpenGrammar {
    fn has_kind(&self, _kind: &str) -> bool {
        true
    }

    fn has_field(&self, _field: &str) -> bool {
        true
    }

    fn kinds(&self) -> Vec<String> {
        Vec::new()
    }
}

/// A fixed vocabulary, for trees from parsers described by data.
#[derive(Debug, Clone, Default)]
pub struct StaticGrammar {
    kinds: BTreeSet<String>,
    fields: BTreeSet<String>,
}

impl StaticGrammar {
    pub fn new<K, F>(kinds: K, fields: F) -> Self
    where
        K: IntoIterator,
        K::Item: Into<String>,
        F: IntoIterator,
        F::Item: Into<String>,
    {
        Self {
            kinds: kinds.into_iter().map(Into::into).collect(),
            fields: fields.into_iter().map(Into::into).collect(),
        }
    }
}

impl Grammar for StaticGrammar {
    fn has_kind(&self, kind: &str) -> bool {
        self.kinds.contains(kind)
    }

    fn has_field(&self, field: &str) -> bool {
        self.fields.contains(field)
    }

    fn kinds(&self) -> Vec<String> {
        self.kinds.iter().cloned().collect()
    }
}

impl Grammar for Language {
    fn has_kind(&self, kind: &str) -> bool {
        self.id_for_node_kind(kind, true) != 0 || self.id_for_node_kind(kind, false) != 0
    }

    fn has_field(&self, field: &str) -> bool {
        self.field_id_for_name(field).is_some()
    }

    fn kinds(&self) -> Vec<String> {
        let count = u16::try_from(self.node_kind_count()).unwrap_or(u16::MAX);
        let mut kinds: Vec<String> = (0..count)
            .filter(|&id| self.node_kind_is_named(id))
            .filter_map(|id| self.node_kind_for_id(id))
            .map(str::to_string)
            .collect();
        kinds.sort();
        kinds.dedup();
        kinds
    }
}

impl<G: Grammar + ?Sized> Grammar for Box<G> {
    fn has_kind(&self, kind: &str) -> bool {
        (**self).has_kind(kind)
    }

    fn has_field(&self, field: &str) -> bool {
        (**self).has_field(field)
    }

    fn kinds(&self) -> Vec<String> {
        (**self).kinds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::c_language;

    #[test]
    fn c_grammar_vocabulary() {
        let c = c_language();
        assert!(c.has_kind("struct_specifier"));
        assert!(c.has_kind("cast_expression"));
        assert!(!c.has_kind("struct_spec"));
        assert!(c.has_field("body"));
        assert!(!c.has_field("torso"));
        assert!(c.kinds().iter().any(|k| k == "enum_specifier"));
    }

    #[test]
    fn static_grammar_is_exact() {
        let g = StaticGrammar::new(["declaration"], ["declarator"]);
        assert!(g.has_kind("declaration"));
        assert!(!g.has_kind("Declaration"));
        assert!(g.has_field("declarator"));
        assert!(OpenGrammar.kinds().is_empty());
    }

    #[test]
    fn boxed_grammar_delegates() {
        let boxed: Box<dyn Grammar> = Box::new(StaticGrammar::new(["declaration"], ["declarator"]));
        assert!(boxed.has_kind("declaration"));
        assert!(!boxed.has_field("body"));
        assert_eq!(boxed.kinds(), vec!["declaration".to_string()]);
    }
}
