use crate::tree::errors::TreeError;
use crate::tree::node::{NodeId, Span, SyntaxTree, TreeBuilder};
use ast_grep_language::{LanguageExt, SupportLang};
use std::path::Path;
use tree_sitter::{Language, Parser, TreeCursor};

/// The tree-sitter C grammar bundled with ast-grep-language.
pub fn c_language() -> Language {
    SupportLang::C.get_ts_language()
}

/// Tree-sitter parser wrapper for C source code.
///
/// Produces [`SyntaxTree`]s, so nothing downstream of the parser depends on
/// tree-sitter types.
pub struct CParser {
    parser: Parser,
}

impl CParser {
    pub fn new() -> Result<Self, TreeError> {
        let mut parser = Parser::new();
        parser
            .set_language(&c_language())
            .map_err(|_| TreeError::LanguageSet)?;
        Ok(Self { parser })
    }

    /// Parse source code into a [`SyntaxTree`] that owns a copy of the text.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree, TreeError> {
        let ts_tree = self
            .parser
            .parse(source, None)
            .ok_or(TreeError::ParseFailed)?;

        let mut builder = TreeBuilder::new(source.to_string());
        let mut cursor = ts_tree.walk();
        convert(&mut cursor, &mut builder);
        let tree = builder.finish();

        tracing::debug!(nodes = tree.len(), bytes = source.len(), "parsed C source");
        Ok(tree)
    }

    pub fn parse_file(&mut self, path: &Path) -> Result<SyntaxTree, TreeError> {
        let source = std::fs::read_to_string(path).map_err(|e| TreeError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        self.parse(&source)
    }
}

/// Copy the tree under the cursor into the arena in pre-order.
///
/// Walks with the cursor alone so nesting depth is bounded by heap, not stack.
fn convert(cursor: &mut TreeCursor<'_>, builder: &mut TreeBuilder) {
    let mut parents: Vec<NodeId> = Vec::new();
    loop {
        let node = cursor.node();
        let span = Span {
            byte_start: node.start_byte(),
            byte_end: node.end_byte(),
            start: node.start_position().into(),
            end: node.end_position().into(),
        };
        let id = builder.push(
            parents.last().copied(),
            cursor.field_name(),
            node.kind(),
            node.is_named(),
            node.is_missing(),
            span,
        );

        if cursor.goto_first_child() {
            parents.push(id);
            continue;
        }

        while !cursor.goto_next_sibling() {
            if !cursor.goto_parent() {
                return;
            }
            parents.pop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_valid_c() {
        let mut parser = CParser::new().unwrap();
        let tree = parser.parse("int main(void)\n{\n  return 0;\n}\n").unwrap();

        assert!(!tree.has_errors());
        let root = tree.root();
        assert_eq!(root.kind(), "translation_unit");

        let func = root.child(0).unwrap();
        assert_eq!(func.kind(), "function_definition");
        assert_eq!(func.child_by_field_name("type").unwrap().kind(), "primitive_type");
        assert_eq!(
            func.child_by_field_name("declarator").unwrap().kind(),
            "function_declarator"
        );
        let body = func.child_by_field_name("body").unwrap();
        assert_eq!(body.kind(), "compound_statement");
        assert_eq!(body.start_point().row, 1);
        assert_eq!(body.first_child().unwrap().kind(), "{");
    }

    #[test]
    fn parse_invalid_c() {
        let mut parser = CParser::new().unwrap();
        let tree = parser.parse("int main( {").unwrap();

        assert!(tree.has_errors());
        assert!(!tree.error_spans().is_empty());
    }

    #[test]
    fn text_matches_node_range() {
        let mut parser = CParser::new().unwrap();
        let tree = parser.parse("int *p;\n").unwrap();
        let decl = tree.root().child(0).unwrap();
        assert_eq!(decl.kind(), "declaration");
        assert_eq!(decl.text(), "int *p;");
        assert_eq!(
            decl.child_by_field_name("declarator").unwrap().kind(),
            "pointer_declarator"
        );
    }

    #[test]
    fn deep_nesting_does_not_exhaust_the_stack() {
        const DEPTH: usize = 20_000;
        let source = format!("int x = {}1{};", "(".repeat(DEPTH), ")".repeat(DEPTH));

        let mut parser = CParser::new().unwrap();
        let tree = parser.parse(&source).unwrap();

        assert!(!tree.has_errors());
        let mut parens = 0;
        let mut stack = vec![tree.root()];
        while let Some(node) = stack.pop() {
            if node.kind() == "parenthesized_expression" {
                parens += 1;
            }
            stack.extend(node.children());
        }
        assert_eq!(parens, DEPTH);

        let tagged = crate::matcher::match_tree(&tree, crate::pattern::Registry::builtin())
            .filter(|m| m.tag == crate::pattern::tags::PARENTHESIZED)
            .count();
        assert_eq!(tagged, DEPTH);
    }
}
