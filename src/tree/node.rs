//! Read-only syntax tree model consumed by the matcher.
//!
//! Trees live in an arena owned by [`SyntaxTree`]; callers work with borrowed
//! [`Node`] handles, so anything derived from a node (matches, captures) is
//! tied to the lifetime of the tree it came from.
//!
//! A tree can be produced by the tree-sitter front end
//! ([`CParser`](crate::tree::CParser)) or assembled from a [`NodeSpec`], the
//! JSON interchange format accepted from external parsers.

use crate::tree::errors::TreeError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// Index of a node inside its [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Zero-based row and byte column.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
pub struct Point {
    pub row: usize,
    pub column: usize,
}

impl Point {
    pub fn new(row: usize, column: usize) -> Self {
        Self { row, column }
    }
}

impl From<tree_sitter::Point> for Point {
    fn from(p: tree_sitter::Point) -> Self {
        Self::new(p.row, p.column)
    }
}

/// Source location of a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Span {
    pub byte_start: usize,
    pub byte_end: usize,
    pub start: Point,
    pub end: Point,
}

impl Span {
    pub fn byte_range(&self) -> Range<usize> {
        self.byte_start..self.byte_end
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}-{}:{} (bytes {}..{})",
            self.start.row + 1,
            self.start.column,
            self.end.row + 1,
            self.end.column,
            self.byte_start,
            self.byte_end
        )
    }
}

/// A field table entry that points at a child position the node does not have.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("node {node} ({kind}) maps field `{field}` to child {index} but has {count} children")]
pub struct MalformedNode {
    pub node: NodeId,
    pub kind: String,
    pub field: String,
    pub index: usize,
    pub count: usize,
}

#[derive(Debug, Clone)]
struct NodeData {
    kind: String,
    named: bool,
    missing: bool,
    span: Span,
    parent: Option<NodeId>,
    /// Position among the parent's children.
    slot: usize,
    children: Vec<NodeId>,
    /// Field name -> position in `children`. Names may repeat.
    fields: Vec<(String, usize)>,
}

/// An immutable syntax tree together with the source text it spans.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    source: String,
    nodes: Vec<NodeData>,
}

impl SyntaxTree {
    /// Build a tree from an interchange description.
    ///
    /// Points are derived from byte offsets against `source`. When `source`
    /// is empty no bounds are enforced and every node sits on row 0.
    pub fn from_spec(source: impl Into<String>, spec: &NodeSpec) -> Result<Self, TreeError> {
        let source = source.into();
        let lines = LineIndex::new(&source);
        let mut builder = TreeBuilder::new(source);
        builder.push_spec(&lines, None, spec)?;
        Ok(builder.finish())
    }

    /// Build a tree from the JSON form of [`NodeSpec`].
    pub fn from_json(source: impl Into<String>, json: &str) -> Result<Self, TreeError> {
        let spec: NodeSpec = serde_json::from_str(json)?;
        Self::from_spec(source, &spec)
    }

    pub fn root(&self) -> Node<'_> {
        Node {
            tree: self,
            id: NodeId(0),
        }
    }

    pub fn node(&self, id: NodeId) -> Option<Node<'_>> {
        (id.0 < self.nodes.len()).then_some(Node { tree: self, id })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// True if the producer marked any node as an error or a missing token.
    pub fn has_errors(&self) -> bool {
        self.nodes.iter().any(|n| n.kind == "ERROR" || n.missing)
    }

    /// Spans of all error and missing nodes, in arena order.
    pub fn error_spans(&self) -> Vec<Span> {
        self.nodes
            .iter()
            .filter(|n| n.kind == "ERROR" || n.missing)
            .map(|n| n.span)
            .collect()
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Borrowed handle to a node of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct Node<'t> {
    tree: &'t SyntaxTree,
    id: NodeId,
}

impl<'t> Node<'t> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tree(&self) -> &'t SyntaxTree {
        self.tree
    }

    pub fn kind(&self) -> &'t str {
        &self.tree.data(self.id).kind
    }

    pub fn is_named(&self) -> bool {
        self.tree.data(self.id).named
    }

    pub fn is_missing(&self) -> bool {
        self.tree.data(self.id).missing
    }

    pub fn span(&self) -> Span {
        self.tree.data(self.id).span
    }

    pub fn start_point(&self) -> Point {
        self.span().start
    }

    pub fn end_point(&self) -> Point {
        self.span().end
    }

    pub fn byte_range(&self) -> Range<usize> {
        self.span().byte_range()
    }

    /// Source text covered by the node; empty if the tree carries no source.
    pub fn text(&self) -> &'t str {
        self.tree.source.get(self.byte_range()).unwrap_or_default()
    }

    pub fn parent(&self) -> Option<Node<'t>> {
        self.tree
            .data(self.id)
            .parent
            .map(|id| Node { tree: self.tree, id })
    }

    pub fn child_count(&self) -> usize {
        self.tree.data(self.id).children.len()
    }

    pub fn child(&self, index: usize) -> Option<Node<'t>> {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .get(index)
            .map(|&id| Node { tree, id })
    }

    pub fn children(&self) -> impl DoubleEndedIterator<Item = Node<'t>> + 't {
        let tree = self.tree;
        tree.data(self.id)
            .children
            .iter()
            .map(move |&id| Node { tree, id })
    }

    pub fn named_children(&self) -> impl Iterator<Item = Node<'t>> + 't {
        self.children().filter(|n| n.is_named())
    }

    pub fn named_child_count(&self) -> usize {
        self.named_children().count()
    }

    pub fn first_child(&self) -> Option<Node<'t>> {
        self.child(0)
    }

    pub fn last_child(&self) -> Option<Node<'t>> {
        self.child_count().checked_sub(1).and_then(|i| self.child(i))
    }

    pub fn prev_sibling(&self) -> Option<Node<'t>> {
        let slot = self.tree.data(self.id).slot;
        self.parent()?.child(slot.checked_sub(1)?)
    }

    pub fn next_sibling(&self) -> Option<Node<'t>> {
        let slot = self.tree.data(self.id).slot;
        self.parent()?.child(slot + 1)
    }

    /// All children recorded under `field`, in child order.
    ///
    /// Fails if the field table names a child position that does not exist.
    pub fn children_by_field(&self, field: &str) -> Result<Vec<Node<'t>>, MalformedNode> {
        let data = self.tree.data(self.id);
        data.fields
            .iter()
            .filter(|(name, _)| name == field)
            .map(|&(_, index)| {
                self.child(index).ok_or_else(|| MalformedNode {
                    node: self.id,
                    kind: data.kind.clone(),
                    field: field.to_string(),
                    index,
                    count: data.children.len(),
                })
            })
            .collect()
    }

    /// First well-formed child recorded under `field`.
    pub fn child_by_field_name(&self, field: &str) -> Option<Node<'t>> {
        self.tree
            .data(self.id)
            .fields
            .iter()
            .filter(|(name, _)| name == field)
            .find_map(|&(_, index)| self.child(index))
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.tree, other.tree) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.kind(), self.span())
    }
}

/// Interchange description of a syntax tree.
///
/// `fields` maps a field name to a position in `children`. The mapping is
/// taken as given: a position past the end of `children` produces a node the
/// matcher treats as malformed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSpec {
    pub kind: String,
    #[serde(default = "named_by_default")]
    pub named: bool,
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, usize>,
}

fn named_by_default() -> bool {
    true
}

impl NodeSpec {
    /// A named node covering `range`.
    pub fn new(kind: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            kind: kind.into(),
            named: true,
            start: range.start,
            end: range.end,
            children: Vec::new(),
            fields: BTreeMap::new(),
        }
    }

    /// An anonymous token such as `{` or `;`.
    pub fn token(kind: impl Into<String>, range: Range<usize>) -> Self {
        Self {
            named: false,
            ..Self::new(kind, range)
        }
    }

    pub fn child(mut self, child: NodeSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn field(mut self, name: impl Into<String>, child: NodeSpec) -> Self {
        self.fields.insert(name.into(), self.children.len());
        self.children.push(child);
        self
    }
}

/// Incremental arena construction shared by the `NodeSpec` and tree-sitter paths.
pub(crate) struct TreeBuilder {
    source: String,
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    pub(crate) fn new(source: String) -> Self {
        Self {
            source,
            nodes: Vec::new(),
        }
    }

    /// Append a node as the last child of `parent`.
    pub(crate) fn push(
        &mut self,
        parent: Option<NodeId>,
        field: Option<&str>,
        kind: &str,
        named: bool,
        missing: bool,
        span: Span,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        let mut slot = 0;
        if let Some(parent) = parent {
            let data = &mut self.nodes[parent.0];
            slot = data.children.len();
            if let Some(field) = field {
                data.fields.push((field.to_string(), slot));
            }
            data.children.push(id);
        }
        self.nodes.push(NodeData {
            kind: kind.to_string(),
            named,
            missing,
            span,
            parent,
            slot,
            children: Vec::new(),
            fields: Vec::new(),
        });
        id
    }

    pub(crate) fn finish(self) -> SyntaxTree {
        SyntaxTree {
            source: self.source,
            nodes: self.nodes,
        }
    }

    fn push_spec(
        &mut self,
        lines: &LineIndex,
        parent: Option<NodeId>,
        spec: &NodeSpec,
    ) -> Result<NodeId, TreeError> {
        let len = self.source.len();
        if spec.start > spec.end || (len > 0 && spec.end > len) {
            return Err(TreeError::SpanOutOfBounds {
                start: spec.start,
                end: spec.end,
                len,
            });
        }

        let span = Span {
            byte_start: spec.start,
            byte_end: spec.end,
            start: lines.point(spec.start),
            end: lines.point(spec.end),
        };
        let id = self.push(parent, None, &spec.kind, spec.named, false, span);
        for (name, &index) in &spec.fields {
            self.nodes[id.0].fields.push((name.clone(), index));
        }
        for child in &spec.children {
            self.push_spec(lines, Some(id), child)?;
        }
        Ok(id)
    }
}

/// Byte offset to row/column conversion.
struct LineIndex {
    line_starts: Vec<usize>,
}

impl LineIndex {
    fn new(source: &str) -> Self {
        let line_starts = std::iter::once(0)
            .chain(source.match_indices('\n').map(|(i, _)| i + 1))
            .collect();
        Self { line_starts }
    }

    fn point(&self, byte: usize) -> Point {
        let row = self
            .line_starts
            .partition_point(|&start| start <= byte)
            .saturating_sub(1);
        Point::new(row, byte - self.line_starts[row])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> SyntaxTree {
        // struct a_s {};
        let source = "struct a_s\n{\n};";
        let spec = NodeSpec::new("translation_unit", 0..15).child(
            NodeSpec::new("struct_specifier", 0..14)
                .child(NodeSpec::token("struct", 0..6))
                .field("name", NodeSpec::new("type_identifier", 7..10))
                .field(
                    "body",
                    NodeSpec::new("field_declaration_list", 11..14)
                        .child(NodeSpec::token("{", 11..12))
                        .child(NodeSpec::token("}", 13..14)),
                ),
        );
        SyntaxTree::from_spec(source, &spec).unwrap()
    }

    #[test]
    fn navigates_parents_and_siblings() {
        let tree = sample();
        let root = tree.root();
        assert_eq!(root.kind(), "translation_unit");
        assert!(root.parent().is_none());

        let st = root.child(0).unwrap();
        let name = st.child_by_field_name("name").unwrap();
        assert_eq!(name.text(), "a_s");
        assert_eq!(name.parent(), Some(st));
        assert_eq!(name.prev_sibling().unwrap().kind(), "struct");
        assert_eq!(name.next_sibling().unwrap().kind(), "field_declaration_list");
        assert_eq!(st.named_child_count(), 2);
        assert_eq!(st.child_count(), 3);
    }

    #[test]
    fn points_follow_line_breaks() {
        let tree = sample();
        let body = tree.root().child(0).unwrap().child_by_field_name("body").unwrap();
        assert_eq!(body.start_point(), Point::new(1, 0));
        assert_eq!(body.last_child().unwrap().start_point(), Point::new(2, 0));
    }

    #[test]
    fn malformed_field_is_reported() {
        let mut spec = NodeSpec::new("function_definition", 0..0);
        spec.fields.insert("body".to_string(), 3);
        let tree = SyntaxTree::from_spec("", &spec).unwrap();

        let err = tree.root().children_by_field("body").unwrap_err();
        assert_eq!(err.index, 3);
        assert_eq!(err.count, 0);
        assert!(tree.root().child_by_field_name("body").is_none());
    }

    #[test]
    fn rejects_span_past_source() {
        let spec = NodeSpec::new("translation_unit", 0..20);
        let result = SyntaxTree::from_spec("int x;", &spec);
        assert!(matches!(result, Err(TreeError::SpanOutOfBounds { .. })));
    }

    #[test]
    fn parses_json_interchange() {
        let json = r#"{
            "kind": "cast_expression", "start": 0, "end": 7,
            "children": [
                {"kind": "(", "named": false, "start": 0, "end": 1},
                {"kind": "type_descriptor", "start": 1, "end": 5},
                {"kind": ")", "named": false, "start": 5, "end": 6},
                {"kind": "identifier", "start": 6, "end": 7}
            ],
            "fields": {"type": 1, "value": 3}
        }"#;
        let tree = SyntaxTree::from_json("(int*)x", json).unwrap();
        let root = tree.root();
        assert_eq!(root.child_by_field_name("value").unwrap().text(), "x");
        assert_eq!(root.named_child_count(), 2);
    }
}
