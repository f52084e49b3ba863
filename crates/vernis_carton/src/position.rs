//! Text position helpers shared by the pipeline and the error mapper.
//!
//! Blocks are handed to compilers in isolation, so anything a compiler
//! reports lives in block-relative coordinates. These helpers describe
//! where a block sits inside its file and how much indentation was removed
//! from it.

/// Convert byte offset to line and column (0-based).
pub fn offset_to_line_col(content: &str, offset: usize) -> Option<(u32, u32)> {
    if offset > content.len() {
        return None;
    }

    let mut line = 0u32;
    let mut col = 0u32;
    let mut current = 0;

    for ch in content.chars() {
        if current >= offset {
            break;
        }
        if ch == '\n' {
            line += 1;
            col = 0;
        } else {
            col += 1;
        }
        current += ch.len_utf8();
    }

    Some((line, col))
}

/// Width of the leading `[ \t]*` run of a line.
#[inline]
fn leading_ws(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ' || *b == b'\t').count()
}

/// Smallest leading indentation across all lines that contain code.
///
/// Whitespace-only lines do not participate. Returns 0 for blank input.
pub fn indentation_width(content: &str) -> usize {
    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(leading_ws)
        .min()
        .unwrap_or(0)
}

/// Result of [`strip_indent`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrippedContent {
    /// Content with the common indentation removed.
    pub content: String,
    /// Number of indentation characters removed from each line.
    pub width: usize,
}

/// Remove the common leading indentation from every line.
///
/// Lines whose leading whitespace is shorter than the common width (blank
/// lines, typically) are left untouched. Line endings are preserved.
pub fn strip_indent(content: &str) -> StrippedContent {
    let width = indentation_width(content);
    if width == 0 {
        return StrippedContent {
            content: content.to_string(),
            width,
        };
    }

    let mut out = String::with_capacity(content.len());
    for line in content.split_inclusive('\n') {
        if leading_ws(line) >= width {
            out.push_str(&line[width..]);
        } else {
            out.push_str(line);
        }
    }

    StrippedContent {
        content: out,
        width,
    }
}

/// Location of an extracted block inside the full file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BlockOffset {
    /// Number of newlines before the block content (0-based line of the
    /// opening tag when the content starts right after it).
    pub script_tag_line: u32,
    /// Indentation width removed from the block before compiling.
    pub indent_len: u32,
}

impl BlockOffset {
    pub fn new(script_tag_line: u32, indent_len: u32) -> Self {
        Self {
            script_tag_line,
            indent_len,
        }
    }

    /// Describe `content` starting at byte `start` of `markup`.
    ///
    /// Returns `None` when `start` lies past the end of the markup.
    pub fn at(markup: &str, start: usize, content: &str) -> Option<Self> {
        let (script_tag_line, _) = offset_to_line_col(markup, start)?;
        Some(Self {
            script_tag_line,
            indent_len: indentation_width(content) as u32,
        })
    }

    /// Find `content` inside `markup` and describe where it starts.
    ///
    /// Only the first occurrence is considered; use [`BlockOffset::at`] when
    /// the block position is known. Returns `None` when the content does not
    /// occur verbatim in the markup.
    pub fn locate(markup: &str, content: &str) -> Option<Self> {
        Self::at(markup, markup.find(content)?, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_to_line_col() {
        let content = "abc\ndef\nghi";
        assert_eq!(offset_to_line_col(content, 0), Some((0, 0)));
        assert_eq!(offset_to_line_col(content, 3), Some((0, 3)));
        assert_eq!(offset_to_line_col(content, 4), Some((1, 0)));
        assert_eq!(offset_to_line_col(content, 8), Some((2, 0)));
        assert_eq!(offset_to_line_col(content, 99), None);
    }

    #[test]
    fn test_indentation_width_ignores_blank_lines() {
        assert_eq!(indentation_width("\n    a\n\n  b\n      \n"), 2);
        assert_eq!(indentation_width(""), 0);
        assert_eq!(indentation_width("\t\tx\n\ty"), 1);
    }

    #[test]
    fn test_strip_indent() {
        let stripped = strip_indent("\n    a\n      b\n\n    c\n");
        assert_eq!(stripped.content, "\na\n  b\n\nc\n");
        assert_eq!(stripped.width, 4);
    }

    #[test]
    fn test_strip_indent_noop() {
        let stripped = strip_indent("a\n  b");
        assert_eq!(stripped.content, "a\n  b");
        assert_eq!(stripped.width, 0);
    }

    #[test]
    fn test_block_offset_locate() {
        let markup = "<div />\n\n\n<script lang=\"civet\">\n  x := 1\n</script>";
        let content = "\n  x := 1\n";
        let offset = BlockOffset::locate(markup, content).unwrap();
        assert_eq!(offset, BlockOffset::new(3, 2));
    }

    #[test]
    fn test_block_offset_at_repeated_block() {
        let body = "\n  x := 1\n";
        let markup = format!(
            "<script context=\"module\" lang=\"civet\">{body}</script>\n\n\
             <script lang=\"civet\">{body}</script>"
        );
        let second = markup.rfind(body).unwrap();

        assert_eq!(BlockOffset::locate(&markup, body), Some(BlockOffset::new(0, 2)));
        assert_eq!(BlockOffset::at(&markup, second, body), Some(BlockOffset::new(4, 2)));
        assert_eq!(BlockOffset::at(&markup, markup.len() + 1, body), None);
    }

    #[test]
    fn test_block_offset_missing() {
        assert_eq!(BlockOffset::locate("<script></script>", "nope"), None);
    }
}
