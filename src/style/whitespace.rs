//! Text-level spacing rules applied to parenthesized expressions, argument
//! lists and pointer declarations.

use fancy_regex::Regex as LookaroundRegex;
use regex::Regex;
use std::sync::LazyLock;

const OPERATORS: &str = r"(\|\||&&|<<=|>>=|[+*/%&|^<>!=]=)";

static SPACE_AFTER_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(\s+").expect("valid regex"));

static SPACE_BEFORE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+\)").expect("valid regex"));

static STRING_LITERAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"["'].*?""#).expect("valid regex"));

static POINTER_QUALIFIER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(FAR|NEAR|DSEG|CODE)").expect("valid regex"));

static NO_SPACE_BEFORE_OPERATOR: LazyLock<LookaroundRegex> = LazyLock::new(|| {
    LookaroundRegex::new(&format!(r"(?<!\s){OPERATORS}")).expect("valid regex")
});

static NO_SPACE_AFTER_OPERATOR: LazyLock<LookaroundRegex> = LazyLock::new(|| {
    LookaroundRegex::new(&format!(r"{OPERATORS}(?!\s)")).expect("valid regex")
});

static NO_SPACE_AFTER_COMMA: LazyLock<LookaroundRegex> =
    LazyLock::new(|| LookaroundRegex::new(r",(?!\s)").expect("valid regex"));

static NO_SPACE_BEFORE_STAR: LazyLock<LookaroundRegex> =
    LazyLock::new(|| LookaroundRegex::new(r"(?<!\s)\*").expect("valid regex"));

/// A spacing problem found in a span of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpacingIssue {
    SpaceAfterOpenParen,
    SpaceBeforeCloseParen,
    NoSpaceBeforeOperator,
    NoSpaceAfterOperator,
    NoSpaceAfterComma,
}

impl SpacingIssue {
    pub fn message(self) -> &'static str {
        match self {
            SpacingIssue::SpaceAfterOpenParen => "Whitespace after open parenthesis",
            SpacingIssue::SpaceBeforeCloseParen => "Whitespace before close parenthesis",
            SpacingIssue::NoSpaceBeforeOperator => "Missing whitespace before operator",
            SpacingIssue::NoSpaceAfterOperator => "Missing whitespace after operator",
            SpacingIssue::NoSpaceAfterComma => "Missing whitespace after comma",
        }
    }
}

fn lookaround_match(re: &LookaroundRegex, text: &str) -> bool {
    // Backtracking limits only trip on pathological input; treat as no match.
    matches!(re.is_match(text), Ok(true))
}

/// Spacing issues in a parenthesized span, in rule order.
pub fn spacing_issues(text: &str) -> Vec<SpacingIssue> {
    let without_strings = STRING_LITERAL.replace_all(text, "");
    [
        (
            SPACE_AFTER_OPEN.is_match(text),
            SpacingIssue::SpaceAfterOpenParen,
        ),
        (
            SPACE_BEFORE_CLOSE.is_match(text),
            SpacingIssue::SpaceBeforeCloseParen,
        ),
        (
            lookaround_match(&NO_SPACE_BEFORE_OPERATOR, text),
            SpacingIssue::NoSpaceBeforeOperator,
        ),
        (
            lookaround_match(&NO_SPACE_AFTER_OPERATOR, text),
            SpacingIssue::NoSpaceAfterOperator,
        ),
        (
            lookaround_match(&NO_SPACE_AFTER_COMMA, &without_strings),
            SpacingIssue::NoSpaceAfterComma,
        ),
    ]
    .into_iter()
    .filter_map(|(hit, issue)| hit.then_some(issue))
    .collect()
}

pub fn has_pointer_qualifier(text: &str) -> bool {
    POINTER_QUALIFIER.is_match(text)
}

pub fn star_without_leading_space(text: &str) -> bool {
    lookaround_match(&NO_SPACE_BEFORE_STAR, text)
}
