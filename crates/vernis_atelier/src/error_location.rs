//! Remapping of compiler parse errors into file coordinates.
//!
//! Compilers only see the extracted block, so the positions they report are
//! block-relative (1-based line, 1-based column). The mapper shifts them by
//! the block's offset in the file and by the indentation removed before
//! compiling.

use std::path::Path;

use vernis_carton::BlockOffset;

use crate::error::{PositionedError, PreprocessError, PreprocessResult};
use crate::types::{Position, Processed};

/// Messages up to this many lines are reported as-is.
const SUMMARY_MIN_LINES: usize = 8;

/// Maximum number of expectations listed in a summary.
const SUMMARY_MAX_ENTRIES: usize = 5;

/// Expectation categories listed first in a summary, in this order.
const PRIORITY_CATEGORIES: &[&str] = &[
    "Identifier",
    "IdentifierName",
    "Expression",
    "StringLiteral",
    "NumericLiteral",
    "Keyword",
    "Operator",
    "Punctuator",
    "EOS",
];

/// A parse error as reported by a compiler, in block coordinates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerParseError {
    pub message: String,
    /// 1-based line inside the block.
    pub line: u32,
    /// 1-based column inside the block.
    pub column: u32,
}

/// Converts block-relative parse errors into [`PositionedError`]s.
#[derive(Debug, Clone, Copy)]
pub struct ErrorLocationMapper {
    offset: BlockOffset,
    report_errors: bool,
    summarize: bool,
}

impl ErrorLocationMapper {
    pub fn new(offset: BlockOffset) -> Self {
        Self {
            offset,
            report_errors: true,
            summarize: false,
        }
    }

    /// With `false`, parse errors become an empty result.
    pub fn report_errors(mut self, report: bool) -> Self {
        self.report_errors = report;
        self
    }

    /// Condense long "Expected: ... Found: ..." messages.
    pub fn summarize(mut self, summarize: bool) -> Self {
        self.summarize = summarize;
        self
    }

    /// File-absolute position (1-based line, 0-based column) of a
    /// block-relative one.
    pub fn absolute_position(&self, line: u32, column: u32) -> Position {
        Position::new(
            self.offset.script_tag_line + line,
            (self.offset.indent_len + column).saturating_sub(1),
        )
    }

    /// Map a parse error.
    ///
    /// Returns an empty result when error reporting is disabled, and a
    /// [`PreprocessError::Positioned`] otherwise.
    pub fn map(
        &self,
        error: CompilerParseError,
        filename: Option<&Path>,
    ) -> PreprocessResult<Processed> {
        if !self.report_errors {
            tracing::debug!(message = %error.message, "parse error suppressed");
            return Ok(Processed::code(""));
        }

        let start = self.absolute_position(error.line, error.column);
        let end = Position::new(start.line, start.column + 1);
        let message = if self.summarize {
            summarize_parse_message(&error.message).unwrap_or(error.message)
        } else {
            error.message
        };

        Err(PreprocessError::Positioned(PositionedError {
            message,
            filename: filename.map(Path::to_path_buf),
            start,
            end,
        }))
    }
}

/// Condense a long parser message of the shape
///
/// ```text
/// <header lines>
/// Expected:
///     <Category> <example>
///     ...
/// Found: <token>
/// ```
///
/// into the header, an `Expected one of:` list with the first example of
/// each category (priority categories first, at most five entries) and the
/// footer. Returns `None` when the message is short or not of that shape.
pub fn summarize_parse_message(message: &str) -> Option<String> {
    let lines: Vec<&str> = message.lines().collect();
    if lines.len() <= SUMMARY_MIN_LINES {
        return None;
    }

    let expected = lines.iter().position(|l| l.trim() == "Expected:")?;
    let found = lines.iter().rposition(|l| l.trim_start().starts_with("Found:"))?;
    if found <= expected {
        return None;
    }

    // First example per category, in order of appearance.
    let mut categories: Vec<(&str, &str)> = Vec::new();
    for entry in lines[expected + 1..found].iter().map(|l| l.trim()) {
        let Some(category) = entry.split_whitespace().next() else {
            continue;
        };
        if !categories.iter().any(|(c, _)| *c == category) {
            categories.push((category, entry));
        }
    }
    if categories.is_empty() {
        return None;
    }

    // Stable: unprioritized categories keep their order.
    categories.sort_by_key(|(category, _)| {
        PRIORITY_CATEGORIES
            .iter()
            .position(|p| p == category)
            .unwrap_or(PRIORITY_CATEGORIES.len())
    });

    let mut out = String::new();
    for line in &lines[..expected] {
        out.push_str(line);
        out.push('\n');
    }
    out.push_str("Expected one of:\n");
    for (_, entry) in categories.iter().take(SUMMARY_MAX_ENTRIES) {
        out.push_str("  ");
        out.push_str(entry);
        out.push('\n');
    }
    out.push_str(&lines[found..].join("\n"));

    Some(out)
}
