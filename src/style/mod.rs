//! NuttX C style checking on top of the pattern tagger.
//!
//! Source is parsed with tree-sitter, tagged with a [`Registry`], and the
//! tagged nodes are handed to [`CChecker`] which reports [`Diagnostic`]s.

mod checker;
mod diagnostic;
mod whitespace;

pub use checker::CChecker;
pub use diagnostic::{Diagnostic, Severity};
pub use whitespace::{spacing_issues, SpacingIssue};

use crate::emit::Captures;
use crate::matcher::match_tree;
use crate::pattern::Registry;
use crate::pool::with_parser;
use crate::tree::{SyntaxTree, TreeError};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckOptions {
    /// Require `FAR`/`NEAR`/`DSEG`/`CODE` on pointer declarations.
    pub nuttx_codebase: bool,
}

impl Default for CheckOptions {
    fn default() -> Self {
        Self {
            nuttx_codebase: true,
        }
    }
}

/// What a path holds, judged by its suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Source,
    Header,
}

impl SourceKind {
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("c") => Some(SourceKind::Source),
            Some("h") => Some(SourceKind::Header),
            _ => None,
        }
    }
}

#[derive(Error, Debug)]
pub enum StyleError {
    #[error(transparent)]
    Tree(#[from] TreeError),

    #[error("unsupported file type: {0}")]
    Unsupported(PathBuf),
}

/// Check an already parsed tree. `path` only labels the diagnostics.
pub fn check_tree(
    tree: &SyntaxTree,
    registry: &Registry,
    path: &Path,
    options: &CheckOptions,
) -> Vec<Diagnostic> {
    let captures = Captures::collect(match_tree(tree, registry));
    tracing::debug!(
        path = %path.display(),
        tagged = captures.total(),
        "checking tagged nodes"
    );
    CChecker::new(path, options).check(&captures)
}

/// Parse and check C source text.
pub fn check_source(
    source: &str,
    registry: &Registry,
    path: &Path,
    options: &CheckOptions,
) -> Result<Vec<Diagnostic>, StyleError> {
    let tree = with_parser(|parser| parser.parse(source))??;
    if tree.has_errors() {
        tracing::warn!(
            path = %path.display(),
            errors = tree.error_spans().len(),
            "source has syntax errors, diagnostics may be incomplete"
        );
    }
    Ok(check_tree(&tree, registry, path, options))
}

/// Check a file on disk. Headers are accepted and produce no diagnostics.
pub fn check_file(
    path: &Path,
    registry: &Registry,
    options: &CheckOptions,
) -> Result<Vec<Diagnostic>, StyleError> {
    match SourceKind::from_path(path) {
        Some(SourceKind::Source) => {}
        Some(SourceKind::Header) => {
            tracing::debug!(path = %path.display(), "skipping header");
            return Ok(Vec::new());
        }
        None => return Err(StyleError::Unsupported(path.to_path_buf())),
    }

    let source = fs::read_to_string(path).map_err(|source| TreeError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let display = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    check_source(&source, registry, &display, options)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(source: &str) -> Vec<Diagnostic> {
        check_with(source, &CheckOptions::default())
    }

    fn check_with(source: &str, options: &CheckOptions) -> Vec<Diagnostic> {
        check_source(source, Registry::builtin(), Path::new("test.c"), options).unwrap()
    }

    fn messages(diags: &[Diagnostic]) -> Vec<&str> {
        diags.iter().map(|d| d.message.as_str()).collect()
    }

    #[test]
    fn conforming_function_is_clean() {
        let src = "int main(void)\n{\n  int x = 0;\n\n  if (x == 0)\n    {\n      x = 1;\n    }\n\n  return x;\n}\n";
        let diags = check(src);
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
    }

    #[test]
    fn misindented_statement() {
        let src = "int main(void)\n{\n    return 0;\n}\n";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec!["Wrong indentation [Expected: 2 / Actual: 4]"]
        );
        assert_eq!(diags[0].point.row, 2);
        assert!(diags[0].is_error());
    }

    #[test]
    fn keyword_spacing() {
        let src = "int main(void)\n{\n  if(1)\n    {\n      return 1;\n    }\n\n  return 0;\n}\n";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec!["There should be exactly one whitespace after keyword"]
        );
    }

    #[test]
    fn brace_on_keyword_line() {
        let src = "int main(void)\n{\n  while (1) {\n      return 1;\n    }\n}\n";
        let diags = check(src);
        assert!(messages(&diags).contains(&"Left bracket not on separate line"));
    }

    #[test]
    fn argument_spacing() {
        let src = "int main(void)\n{\n  foo( 1,2);\n}\n";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec![
                "Whitespace after open parenthesis",
                "Missing whitespace after comma"
            ]
        );
    }

    #[test]
    fn record_names() {
        let src = "struct foo_s\n{\n  int a;\n};\n\nstruct bar\n{\n  int a;\n};\n\nenum color\n{\n  RED\n};\n";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec![
                "Struct name should end in \"_s\"",
                "Enum name should end in \"_e\""
            ]
        );
    }

    #[test]
    fn anonymous_struct_is_a_warning() {
        let src = "struct\n{\n  int a;\n} x;\n";
        let diags = check(src);
        assert_eq!(messages(&diags), vec!["Avoid anonymous structs"]);
        assert_eq!(diags[0].severity, Severity::Warning);
    }

    #[test]
    fn pointer_rules() {
        let diags = check("char* p;\n");
        assert_eq!(
            messages(&diags),
            vec!["Pointer qualifier missing", "Missing whitespace before pointer"]
        );

        assert_eq!(
            messages(&check("char *p;\n")),
            vec!["Pointer qualifier missing"]
        );

        let relaxed = CheckOptions {
            nuttx_codebase: false,
        };
        assert!(check_with("char *p;\n", &relaxed).is_empty());
    }

    #[test]
    fn conforming_control_flow_is_clean() {
        let src = "\
int main(void)
{
  int i;

  switch (i)
    {
      case 1:
        i = 2;
        break;

      default:
        break;
    }

  if (i == 1)
    {
      return 1;
    }
  else if (i == 2)
    {
      return 2;
    }
  else
    {
      i = 0;
    }

  for (i = 0; i < 10; i++);

  do
    {
      i--;
    }
  while (i > 0);

  return 0;
}
";
        let diags = check(src);
        assert!(diags.is_empty(), "unexpected: {:?}", messages(&diags));
    }

    #[test]
    fn case_labels_and_bodies_are_indented() {
        let src = "\
int main(void)
{
  switch (x)
    {
    case 1:
      break;
    }
}
";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec![
                "Wrong indentation [Expected: 6 / Actual: 4]",
                "Wrong indentation [Expected: 8 / Actual: 6]"
            ]
        );
        assert_eq!(diags[0].point.row, 4);
    }

    #[test]
    fn else_if_must_share_a_line() {
        let src = "\
int main(void)
{
  if (x)
    {
      return 1;
    }
  else
  if (y)
    {
      return 2;
    }
}
";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec!["If keyword not inlined with else keyword"]
        );
        assert_eq!(diags[0].point.row, 7);
    }

    #[test]
    fn empty_for_body_stays_on_the_header_line() {
        let src = "\
int main(void)
{
  for (i = 0; i < 10; i++)
    ;
}
";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec!["Empty body should be inline with last node"]
        );
    }

    #[test]
    fn closing_brace_on_its_own_line() {
        let src = "struct a_s\n{\n  int a; };\n";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec![
                "Right bracket not on separate line",
                "Wrong indentation [Expected: 0 / Actual: 9]"
            ]
        );
    }

    #[test]
    fn operator_spacing_in_conditions() {
        let src = "\
int main(void)
{
  if (a==b)
    {
      return 1;
    }

  return 0;
}
";
        let diags = check(src);
        assert_eq!(
            messages(&diags),
            vec![
                "Missing whitespace before operator",
                "Missing whitespace after operator"
            ]
        );
    }

    #[test]
    fn source_kinds() {
        assert_eq!(
            SourceKind::from_path(Path::new("a/b.c")),
            Some(SourceKind::Source)
        );
        assert_eq!(
            SourceKind::from_path(Path::new("b.h")),
            Some(SourceKind::Header)
        );
        assert_eq!(SourceKind::from_path(Path::new("b.rs")), None);
    }

    #[test]
    fn check_file_handles_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let header = dir.path().join("a.h");
        fs::write(&header, "char* p;\n").unwrap();
        assert!(check_file(&header, Registry::builtin(), &CheckOptions::default())
            .unwrap()
            .is_empty());

        let source = dir.path().join("a.c");
        fs::write(&source, "char* p;\n").unwrap();
        let diags = check_file(&source, Registry::builtin(), &CheckOptions::default()).unwrap();
        assert_eq!(diags.len(), 2);
        assert!(diags[0].path.is_absolute());

        let other = dir.path().join("a.txt");
        assert!(matches!(
            check_file(&other, Registry::builtin(), &CheckOptions::default()),
            Err(StyleError::Unsupported(_))
        ));
    }
}
