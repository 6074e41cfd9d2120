//! Incremental markdown rendering and the display reindentation pass

use pulldown_cmark::{Event, Parser, Tag, TagEnd};

/// Indent unit the markup transform emits (spaces per nesting level)
const SOURCE_INDENT_UNIT: usize = 4;
/// Indent unit the display prefers (spaces per nesting level)
const DISPLAY_INDENT_UNIT: usize = 2;

/// Cumulative plain text of the in-flight assistant response.
///
/// Chunks are appended verbatim; every render pass transforms the entire
/// buffer, so formatting that depends on later tokens (an unclosed code
/// fence, say) is retroactively correct on the next increment.
#[derive(Debug, Default)]
pub struct RenderBuffer {
    text: String,
}

impl RenderBuffer {
    /// Create an empty buffer
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a decoded chunk in full
    pub fn push_chunk(&mut self, chunk: &str) {
        self.text.push_str(chunk);
    }

    /// The raw text received so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether nothing has been received yet
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    /// Re-render the whole buffer into display markup
    pub fn render(&self) -> String {
        render_markup(&self.text)
    }

    /// Consume the buffer, yielding the raw text
    pub fn into_text(self) -> String {
        self.text
    }
}

/// Transform markdown into display markup: markdown-to-markup plus the
/// reindentation pass.
pub fn render_markup(text: &str) -> String {
    reindent(&markdown_to_markup(text))
}

fn heading_marker(level: pulldown_cmark::HeadingLevel) -> &'static str {
    use pulldown_cmark::HeadingLevel::*;
    match level {
        H1 => "#",
        H2 => "##",
        H3 => "###",
        H4 => "####",
        H5 => "#####",
        H6 => "######",
    }
}

fn flush(lines: &mut Vec<String>, current: &mut String) {
    if !current.is_empty() {
        lines.push(std::mem::take(current));
    }
}

/// Render markdown to plain text markup in the transform's native indent
/// convention: one 4-space unit per list nesting level or code block.
pub fn markdown_to_markup(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut in_code_block = false;
    let mut code_block = String::new();
    // One entry per open list; `Some(n)` carries the next ordered-item number.
    let mut list_stack: Vec<Option<u64>> = Vec::new();
    let mut item_marker_pending = false;

    for event in Parser::new(text) {
        match event {
            Event::Start(tag) => match tag {
                Tag::Heading { level, .. } => {
                    flush(&mut lines, &mut current);
                    current.push_str(heading_marker(level));
                    current.push(' ');
                }
                Tag::Paragraph => {
                    // A paragraph opening a loose list item stays on the
                    // bullet's line.
                    if !item_marker_pending {
                        flush(&mut lines, &mut current);
                    }
                }
                Tag::CodeBlock(_) => {
                    in_code_block = true;
                    code_block.clear();
                    flush(&mut lines, &mut current);
                }
                Tag::List(start) => {
                    flush(&mut lines, &mut current);
                    list_stack.push(start);
                }
                Tag::Item => {
                    flush(&mut lines, &mut current);
                    let depth = list_stack.len().saturating_sub(1);
                    current.push_str(&" ".repeat(depth * SOURCE_INDENT_UNIT));
                    if let Some(Some(n)) = list_stack.last_mut() {
                        current.push_str(&format!("{}. ", n));
                        *n += 1;
                    } else {
                        current.push_str("- ");
                    }
                    item_marker_pending = true;
                }
                Tag::Emphasis => current.push('*'),
                Tag::Strong => current.push_str("**"),
                Tag::Strikethrough => current.push_str("~~"),
                _ => {}
            },
            Event::End(tag_end) => match tag_end {
                TagEnd::Heading(_) => {
                    flush(&mut lines, &mut current);
                    lines.push(String::new());
                }
                TagEnd::Paragraph => {
                    flush(&mut lines, &mut current);
                    if list_stack.is_empty() {
                        lines.push(String::new());
                    }
                }
                TagEnd::CodeBlock => {
                    in_code_block = false;
                    for code_line in code_block.lines() {
                        let mut line = " ".repeat(SOURCE_INDENT_UNIT);
                        line.push_str(code_line);
                        lines.push(line);
                    }
                    lines.push(String::new());
                }
                TagEnd::List(_) => {
                    list_stack.pop();
                    if list_stack.is_empty() {
                        lines.push(String::new());
                    }
                }
                TagEnd::Item => {
                    flush(&mut lines, &mut current);
                    item_marker_pending = false;
                }
                TagEnd::Emphasis => current.push('*'),
                TagEnd::Strong => current.push_str("**"),
                TagEnd::Strikethrough => current.push_str("~~"),
                _ => {}
            },
            Event::Text(text) => {
                if in_code_block {
                    code_block.push_str(&text);
                } else {
                    current.push_str(&text);
                    item_marker_pending = false;
                }
            }
            Event::Code(code) => {
                current.push('`');
                current.push_str(&code);
                current.push('`');
                item_marker_pending = false;
            }
            Event::SoftBreak => current.push(' '),
            Event::HardBreak => flush(&mut lines, &mut current),
            Event::Rule => {
                flush(&mut lines, &mut current);
                lines.push("---".to_owned());
                lines.push(String::new());
            }
            _ => {}
        }
    }
    flush(&mut lines, &mut current);

    while lines.last().is_some_and(|line| line.is_empty()) {
        lines.pop();
    }
    lines.join("\n")
}

fn leading_spaces(line: &str) -> usize {
    line.bytes().take_while(|b| *b == b' ').count()
}

/// Rewrite leading indentation from the transform's 4-space unit to the
/// display's 2-space unit, leaving everything after the indentation intact.
///
/// The document converts only when every indented line sits on a whole
/// source-unit boundary; documents already in the display convention (any
/// odd-depth indent present) pass through unchanged, which makes the pass
/// idempotent on its own output.
pub fn reindent(markup: &str) -> String {
    let mut convertible = false;
    for line in markup.lines() {
        let indent = leading_spaces(line);
        if indent == 0 || indent == line.len() {
            continue;
        }
        if indent % SOURCE_INDENT_UNIT != 0 {
            return markup.to_owned();
        }
        convertible = true;
    }
    if !convertible {
        return markup.to_owned();
    }

    let converted: Vec<String> = markup
        .split('\n')
        .map(|line| {
            let indent = leading_spaces(line);
            if indent == 0 || indent == line.len() {
                return line.to_owned();
            }
            let units = indent / SOURCE_INDENT_UNIT;
            let mut out = " ".repeat(units * DISPLAY_INDENT_UNIT);
            out.push_str(&line[indent..]);
            out
        })
        .collect();
    converted.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    // --- Render buffer ---

    #[test]
    fn test_buffer_accumulates_chunks_verbatim() {
        let mut buffer = RenderBuffer::new();
        buffer.push_chunk("Hi");
        buffer.push_chunk("  there");
        assert_eq!(buffer.text(), "Hi  there");
    }

    // --- Markdown transform ---

    #[test]
    fn test_plain_paragraph() {
        assert_eq!(markdown_to_markup("Hello world"), "Hello world");
    }

    #[test]
    fn test_soft_break_joins_lines() {
        assert_eq!(markdown_to_markup("one\ntwo"), "one two");
    }

    #[test]
    fn test_code_block_indented_one_unit() {
        let markup = markdown_to_markup("```\nlet x = 1;\n```");
        assert_eq!(markup, "    let x = 1;");
    }

    #[test]
    fn test_unclosed_fence_still_renders_as_code() {
        // Mid-stream the closing fence has not arrived yet.
        let markup = markdown_to_markup("before\n\n```rust\nlet x = 1;");
        assert!(markup.contains("before"));
        assert!(markup.contains("    let x = 1;"));
    }

    #[test]
    fn test_nested_list_indents_by_units() {
        let markup = markdown_to_markup("- a\n    - b");
        assert_eq!(markup, "- a\n    - b");
    }

    #[test]
    fn test_ordered_list_numbering() {
        let markup = markdown_to_markup("1. one\n2. two");
        assert_eq!(markup, "1. one\n2. two");
    }

    #[test]
    fn test_heading_and_inline_markers() {
        let markup = markdown_to_markup("## Title\n\nsome *em* and `code`");
        assert_eq!(markup, "## Title\n\nsome *em* and `code`");
    }

    // --- Reindentation pass ---

    #[test]
    fn test_reindent_converts_single_unit() {
        assert_eq!(reindent("    - item"), "  - item");
    }

    #[test]
    fn test_reindent_k_units_to_k_units() {
        // Two source units in, exactly two display units out.
        assert_eq!(reindent("        x"), "    x");
        assert_eq!(reindent("            y"), "      y");
    }

    #[test]
    fn test_reindent_leaves_unindented_content_alone() {
        assert_eq!(reindent("plain text\nmore"), "plain text\nmore");
    }

    #[test]
    fn test_reindent_preserves_blank_lines() {
        assert_eq!(reindent("a\n\n    b"), "a\n\n  b");
    }

    #[test]
    fn test_reindent_idempotent_on_converted_output() {
        let markup = "- a\n    - b\n        - c\n\n    code line";
        let once = reindent(markup);
        assert_eq!(reindent(&once), once);
    }

    #[test]
    fn test_reindent_skips_display_convention_documents() {
        // Already in 2-space units: untouched.
        let display = "- a\n  - b";
        assert_eq!(reindent(display), display);
    }

    // --- Full pipeline ---

    #[test]
    fn test_render_markup_code_block_display_indent() {
        let rendered = render_markup("```\nlet x = 1;\n```");
        assert_eq!(rendered, "  let x = 1;");
    }

    #[test]
    fn test_render_markup_nested_list_display_indent() {
        let rendered = render_markup("- a\n    - b");
        assert_eq!(rendered, "- a\n  - b");
    }

    #[test]
    fn test_render_is_stable_for_growing_buffer() {
        // Rendering a prefix then the full text gives the full text's render;
        // nothing carries over between passes.
        let full = "intro\n\n```\nfn f() {}\n```\ndone";
        let partial = render_markup("intro\n\n```\nfn f()");
        assert!(partial.contains("  fn f()"));
        let complete = render_markup(full);
        assert!(complete.contains("  fn f() {}"));
        assert!(complete.contains("done"));
    }
}
