//! Per-thread C parser reuse.
//!
//! A `check` run parses every file with the same grammar, and setting up a
//! tree-sitter parser is not free. Each thread keeps one [`CParser`] around;
//! [`with_parser`] lends it out.

use crate::tree::{CParser, TreeError};
use std::cell::RefCell;

thread_local! {
    static C_PARSER: RefCell<Option<CParser>> = const { RefCell::new(None) };
}

/// Run `f` with this thread's C parser, creating it on first use.
///
/// The outer `Result` only fails when the parser cannot be created.
///
/// # Example
///
/// ```no_run
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// use nxstyle::pool::with_parser;
///
/// let tree = with_parser(|parser| parser.parse("int main(void) { return 0; }"))??;
/// assert_eq!(tree.root().kind(), "translation_unit");
/// # Ok(())
/// # }
/// ```
pub fn with_parser<F, R>(f: F) -> Result<R, TreeError>
where
    F: FnOnce(&mut CParser) -> R,
{
    C_PARSER.with(|cell| {
        let mut slot = cell.borrow_mut();
        let parser = match slot.take() {
            Some(parser) => parser,
            None => {
                tracing::debug!("creating C parser for this thread");
                CParser::new()?
            }
        };
        Ok(f(slot.insert(parser)))
    })
}
