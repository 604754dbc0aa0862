//! Source excerpts with a highlighted range
//!
//! Renders a few lines of source around a [`Span`] with a line-number gutter,
//! a `>` marker on highlighted lines, and `^` markers under the range:
//!
//! ```text
//!   1 | {
//! > 2 |   "size": 123
//!     |           ^^^
//!   3 | }
//! ```

use crate::jsonc::Span;

/// ANSI escape sequence to reset all formatting
pub const ANSI_RESET: &str = "\x1b[0m";
/// Bold red, used for markers and error text
pub const ANSI_RED_BOLD: &str = "\x1b[1;31m";
/// Plain red
pub const ANSI_RED: &str = "\x1b[31m";
/// Gray, used for the gutter
pub const ANSI_GRAY: &str = "\x1b[90m";

/// Options for [`code_frame`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodeFrameOptions {
    /// Context lines shown above the highlighted range
    pub lines_above: usize,
    /// Context lines shown below the highlighted range
    pub lines_below: usize,
    /// Emit ANSI colors
    pub color: bool,
}

impl Default for CodeFrameOptions {
    fn default() -> Self {
        Self { lines_above: 2, lines_below: 3, color: false }
    }
}

/// Render an excerpt of `text` around `span`.
pub fn code_frame(text: &str, span: Span, options: &CodeFrameOptions) -> String {
    let lines: Vec<&str> = text.split('\n').map(|l| l.strip_suffix('\r').unwrap_or(l)).collect();
    let count = lines.len();

    let start_line = span.start.line.clamp(1, count);
    let end_line = span.end.line.clamp(start_line, count);
    let first = start_line.saturating_sub(options.lines_above).max(1);
    let last = (end_line + options.lines_below).min(count);
    let width = last.to_string().len();

    let paint = |code: &str, s: &str| {
        if options.color {
            format!("{}{}{}", code, s, ANSI_RESET)
        } else {
            s.to_string()
        }
    };

    let mut out = Vec::new();
    for number in first..=last {
        let line = lines[number - 1];
        let highlighted = number >= start_line && number <= end_line;

        let gutter = paint(ANSI_GRAY, &format!(" {:>width$} |", number, width = width));
        let arrow = if highlighted { paint(ANSI_RED_BOLD, ">") } else { " ".to_string() };
        if line.is_empty() {
            out.push(format!("{}{}", arrow, gutter));
        } else {
            out.push(format!("{}{} {}", arrow, gutter, line));
        }

        if !highlighted {
            continue;
        }
        let line_len = line.chars().count();
        let (column, len) = if start_line == end_line {
            (span.start.column, span.end.column.saturating_sub(span.start.column).max(1))
        } else if number == start_line {
            (span.start.column, (line_len + 1).saturating_sub(span.start.column).max(1))
        } else if number == end_line {
            (1, span.end.column.saturating_sub(1))
        } else {
            (1, line_len)
        };
        if len == 0 {
            continue;
        }

        let spacing: String = line
            .chars()
            .take(column.saturating_sub(1))
            .map(|c| if c == '\t' { '\t' } else { ' ' })
            .collect();
        let marker_gutter = paint(ANSI_GRAY, &format!(" {:>width$} |", "", width = width));
        out.push(format!(" {} {}{}", marker_gutter, spacing, paint(ANSI_RED_BOLD, &"^".repeat(len))));
    }

    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonc::parse;

    #[test]
    fn test_single_line_frame() {
        let text = r#"{"tasks":[{"output": 123}]}"#;
        let tree = parse(text).unwrap();
        let node = tree.member("tasks").unwrap().element(0).unwrap().member("output").unwrap();
        let frame = code_frame(text, node.span, &CodeFrameOptions::default());
        assert_eq!(frame, "> 1 | {\"tasks\":[{\"output\": 123}]}\n    |                      ^^^");
    }

    #[test]
    fn test_context_lines() {
        let text = "{\n  \"a\": 1,\n  \"b\": 2,\n  \"c\": true,\n  \"d\": 4,\n  \"e\": 5,\n  \"f\": 6,\n  \"g\": 7\n}";
        let tree = parse(text).unwrap();
        let node = tree.member("c").unwrap();
        let frame = code_frame(text, node.span, &CodeFrameOptions::default());
        let expected = [
            "  2 |   \"a\": 1,",
            "  3 |   \"b\": 2,",
            "> 4 |   \"c\": true,",
            "    |        ^^^^",
            "  5 |   \"d\": 4,",
            "  6 |   \"e\": 5,",
            "  7 |   \"f\": 6,",
        ]
        .join("\n");
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_multi_line_span() {
        let text = "{\n  \"toc\": {\n    \"x\": 1\n  }\n}";
        let tree = parse(text).unwrap();
        let node = tree.member("toc").unwrap();
        let frame = code_frame(text, node.span, &CodeFrameOptions { lines_above: 0, lines_below: 0, color: false });
        let expected = [
            "> 2 |   \"toc\": {",
            "    |          ^",
            "> 3 |     \"x\": 1",
            "    | ^^^^^^^^^^",
            "> 4 |   }",
            "    | ^^^",
        ]
        .join("\n");
        assert_eq!(frame, expected);
    }

    #[test]
    fn test_gutter_width_follows_last_line() {
        let text = (1..=12).map(|i| format!("{}", i)).collect::<Vec<_>>().join("\n");
        let tree_span = Span {
            start: crate::jsonc::Position { line: 10, column: 1, offset: 0 },
            end: crate::jsonc::Position { line: 10, column: 3, offset: 0 },
        };
        let frame = code_frame(&text, tree_span, &CodeFrameOptions::default());
        assert!(frame.starts_with("   8 | 8\n"));
        assert!(frame.contains("> 10 | 10\n     | ^^"));
    }

    #[test]
    fn test_color_output() {
        let text = "[1]";
        let tree = parse(text).unwrap();
        let frame = code_frame(text, tree.span, &CodeFrameOptions { color: true, ..Default::default() });
        assert!(frame.contains(ANSI_RED_BOLD));
        assert!(frame.contains(ANSI_RESET));
    }
}
