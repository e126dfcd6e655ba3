//! NuttX layout rules applied to tagged nodes.
//!
//! Indentation is two columns per level. Braces of a block sit on their own
//! lines, one level deeper than the statement that owns them, and the block
//! contents go one level deeper still.

use crate::emit::Captures;
use crate::pattern::tags;
use crate::style::diagnostic::{Diagnostic, Severity};
use crate::style::whitespace::{has_pointer_qualifier, spacing_issues, star_without_leading_space};
use crate::style::CheckOptions;
use crate::tree::{Node, Point};
use std::path::{Path, PathBuf};

const INDENT: usize = 2;

/// Statements whose condition is a parenthesized expression after a keyword.
const CONTROL_STATEMENTS: &[&str] = &[
    "if_statement",
    "for_statement",
    "while_statement",
    "do_statement",
    "switch_statement",
];

/// Statements checked for indentation but not opening a block of their own.
const SIMPLE_STATEMENTS: &[&str] = &[
    "return_statement",
    "expression_statement",
    "declaration",
    "break_statement",
    "field_declaration",
    "enumerator",
];

fn wrong_indent(expected: usize, actual: usize) -> String {
    format!("Wrong indentation [Expected: {expected} / Actual: {actual}]")
}

/// Style checker for C source files.
pub struct CChecker<'o> {
    path: PathBuf,
    options: &'o CheckOptions,
    diagnostics: Vec<Diagnostic>,
}

impl<'o> CChecker<'o> {
    pub fn new(path: &Path, options: &'o CheckOptions) -> Self {
        Self {
            path: path.to_path_buf(),
            options,
            diagnostics: Vec::new(),
        }
    }

    /// Run every rule against the tagged nodes.
    pub fn check(mut self, captures: &Captures<'_, '_>) -> Vec<Diagnostic> {
        for body in captures.get(tags::FUNCTION_BODY) {
            for statement in body.named_children() {
                self.check_indents(INDENT, statement);
            }
        }

        for expr in captures.get(tags::PARENTHESIZED) {
            self.check_keyword_spacing(*expr);
            self.check_spacing(*expr);
        }

        for args in captures.get(tags::ARGUMENTS) {
            self.check_spacing(*args);
        }

        for record in captures.get(tags::STRUCTS) {
            self.check_record(*record, "struct", "_s");
        }

        for record in captures.get(tags::ENUMS) {
            self.check_record(*record, "enum", "_e");
        }

        for pointer in captures.get(tags::POINTER) {
            self.check_pointer(*pointer);
        }

        self.diagnostics
    }

    fn report(&mut self, point: Point, severity: Severity, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            path: self.path.clone(),
            point,
            severity,
            message: message.into(),
        });
    }

    /// Record an error when `violated` holds.
    fn flag(&mut self, violated: bool, point: Point, message: impl Into<String>) {
        if violated {
            self.report(point, Severity::Error, message);
        }
    }

    fn check_indent_at(&mut self, node: Node<'_>, expected: usize) {
        let point = node.start_point();
        self.flag(
            point.column != expected,
            point,
            wrong_indent(expected, point.column),
        );
    }

    /// Check the start column of a statement and descend into nested blocks.
    fn check_indents(&mut self, indent: usize, node: Node<'_>) {
        match node.kind() {
            "if_statement" | "else_clause" => self.check_if(indent, node),
            "for_statement" => self.check_for(indent, node),
            "while_statement" | "do_statement" => self.check_while(indent, node),
            "switch_statement" => self.check_switch(indent, node),
            kind if SIMPLE_STATEMENTS.contains(&kind) => {
                for child in node.named_children() {
                    self.check_indents(indent + INDENT, child);
                }
            }
            _ => return,
        }
        self.check_indent_at(node, indent);
    }

    /// Braces on their own lines at `indent`, contents one level deeper.
    fn check_body(&mut self, indent: usize, node: Node<'_>) {
        if node.kind() == "expression_statement" {
            self.check_indents(indent, node);
            return;
        }

        let children: Vec<Node<'_>> = node.children().collect();
        let [open, after_open, ..] = children.as_slice() else {
            return;
        };
        let [.., before_close, close] = children.as_slice() else {
            return;
        };

        self.flag(
            open.start_point().row == after_open.start_point().row,
            node.start_point(),
            "Left bracket not on separate line",
        );
        self.check_indent_at(*open, indent);

        for child in node.named_children() {
            self.check_indents(indent + INDENT, child);
        }

        self.flag(
            close.start_point().row == before_close.start_point().row,
            node.start_point(),
            "Right bracket not on separate line",
        );
        self.check_indent_at(*close, indent);
    }

    /// Opening brace of `body` must not share a line with what precedes it.
    fn check_brace_line(&mut self, body: Node<'_>, previous: Node<'_>) {
        self.flag(
            body.start_point().row == previous.start_point().row,
            body.start_point(),
            "Left bracket not on separate line",
        );
    }

    fn check_if(&mut self, indent: usize, node: Node<'_>) {
        let mut node = node;

        if node.kind() == "else_clause" {
            let Some(branch) = node.child(1) else {
                return;
            };
            if branch.kind() != "if_statement" {
                self.check_body(indent + INDENT, branch);
                return;
            }
            self.flag(
                branch.start_point().row != node.start_point().row,
                branch.start_point(),
                "If keyword not inlined with else keyword",
            );
            node = branch;
        }

        if let Some(consequence) = node.child_by_field_name("consequence") {
            self.flag(
                consequence.start_point().row == node.start_point().row,
                consequence.start_point(),
                "Left bracket not on separate line",
            );
            self.check_body(indent + INDENT, consequence);
        }

        if let Some(alternative) = node.child_by_field_name("alternative") {
            self.check_indents(indent, alternative);
        }
    }

    fn check_for(&mut self, indent: usize, node: Node<'_>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(previous) = body.prev_sibling() else {
            return;
        };

        match body.kind() {
            "compound_statement" => {
                self.check_brace_line(body, previous);
                self.check_body(indent + INDENT, body);
            }
            "expression_statement" if body.named_child_count() == 0 => {
                self.flag(
                    previous.start_point().row != body.start_point().row,
                    body.start_point(),
                    "Empty body should be inline with last node",
                );
            }
            "expression_statement" => {
                for child in body.named_children() {
                    self.check_indents(indent + 2 * INDENT, child);
                }
            }
            _ => {}
        }
    }

    fn check_while(&mut self, indent: usize, node: Node<'_>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(previous) = body.prev_sibling() else {
            return;
        };

        self.check_brace_line(body, previous);
        self.check_body(indent + INDENT, body);
    }

    fn check_switch(&mut self, indent: usize, node: Node<'_>) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(previous) = body.prev_sibling() else {
            return;
        };

        self.check_brace_line(body, previous);
        self.check_indent_at(body, indent + INDENT);

        for case in body
            .named_children()
            .filter(|n| n.kind() == "case_statement")
        {
            self.check_case(indent + 2 * INDENT, case);
        }

        let children: Vec<Node<'_>> = body.children().collect();
        if let [.., before_close, close] = children.as_slice() {
            self.flag(
                close.start_point().row == before_close.start_point().row,
                body.start_point(),
                "Right bracket not on separate line",
            );
            self.check_indent_at(*close, indent + INDENT);
        }
    }

    fn check_case(&mut self, indent: usize, node: Node<'_>) {
        self.check_indent_at(node, indent);

        let Some(keyword) = node.first_child() else {
            return;
        };
        // `case <value> :` puts the first statement at 3, `default :` at 2.
        let offset = if keyword.kind() == "case" { 3 } else { 2 };
        let Some(body) = node.child(offset) else {
            return;
        };

        if body.kind() == "compound_statement" {
            let Some(previous) = body.prev_sibling() else {
                return;
            };
            self.check_brace_line(body, previous);
            self.check_body(indent + INDENT, body);
        } else {
            for child in node.children().skip(offset) {
                self.check_indents(indent + INDENT, child);
            }
        }
    }

    /// Exactly one space between a control keyword and its condition.
    fn check_keyword_spacing(&mut self, expr: Node<'_>) {
        let Some(parent) = expr.parent() else {
            return;
        };
        if !CONTROL_STATEMENTS.contains(&parent.kind()) {
            return;
        }
        let Some(keyword) = expr.prev_sibling() else {
            return;
        };

        let gap = expr
            .start_point()
            .column
            .checked_sub(keyword.end_point().column);
        self.flag(
            gap != Some(1),
            expr.start_point(),
            "There should be exactly one whitespace after keyword",
        );
    }

    fn check_spacing(&mut self, node: Node<'_>) {
        for issue in spacing_issues(node.text()) {
            self.report(node.start_point(), Severity::Error, issue.message());
        }
    }

    /// Naming and layout for struct and enum specifiers with a body.
    fn check_record(&mut self, node: Node<'_>, keyword: &str, suffix: &str) {
        let Some(body) = node.child_by_field_name("body") else {
            return;
        };
        let Some(previous) = body.prev_sibling() else {
            return;
        };

        match node.child_by_field_name("name") {
            None => self.report(
                node.start_point(),
                Severity::Warning,
                format!("Avoid anonymous {keyword}s"),
            ),
            Some(name) => {
                let mut title = keyword.to_string();
                title[..1].make_ascii_uppercase();
                self.flag(
                    !name.text().ends_with(suffix),
                    node.start_point(),
                    format!("{title} name should end in \"{suffix}\""),
                );
            }
        }

        self.check_brace_line(body, previous);
        self.check_body(node.start_point().column, body);
    }

    fn check_pointer(&mut self, node: Node<'_>) {
        let text = node.text();
        if self.options.nuttx_codebase {
            self.flag(
                !has_pointer_qualifier(text),
                node.start_point(),
                "Pointer qualifier missing",
            );
        }
        self.flag(
            star_without_leading_space(text),
            node.start_point(),
            "Missing whitespace before pointer",
        );
    }
}
