//! Markdown editor buffer
//!
//! The text being edited, the caret and selection, and the few editing
//! helpers the editor toolbar exposes. Offsets are byte offsets into the
//! UTF-8 text and always sit on character boundaries.

use crate::active_section::{ActiveSection, SectionSubscriber};
use regex::Regex;
use std::sync::OnceLock;

/// Indentation inserted by Tab
pub const INDENT: &str = "  ";

/// Inline markup the toolbar can wrap a selection in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineMarkup {
    Bold,
    Italic,
}

impl InlineMarkup {
    fn marker(self) -> &'static str {
        match self {
            Self::Bold => "**",
            Self::Italic => "*",
        }
    }
}

/// Byte offset of the first character of a line
///
/// Sums the lengths of all preceding lines plus one newline each. A line
/// number past the end yields the length of the text.
pub fn line_offset(text: &str, line_number: usize) -> usize {
    text.split('\n')
        .take(line_number)
        .map(|line| line.len() + 1)
        .sum::<usize>()
        .min(text.len())
}

/// Whitespace-separated word count
pub fn word_count(text: &str) -> usize {
    text.split_whitespace().count()
}

/// Number of lines, counting an empty text as one line
pub fn line_count(text: &str) -> usize {
    text.split('\n').count()
}

fn list_marker() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\s*)([-*+]|\d+\.)\s").unwrap())
}

/// Editor state for one document
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EditorBuffer {
    text: String,
    saved: String,
    caret: usize,
    selection: Option<(usize, usize)>,
    scroll_line: Option<usize>,
}

impl EditorBuffer {
    /// Buffer holding already-saved content
    pub fn new(content: &str) -> Self {
        Self {
            text: content.to_string(),
            saved: content.to_string(),
            ..Self::default()
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn caret(&self) -> usize {
        self.caret
    }

    pub fn selection(&self) -> Option<(usize, usize)> {
        self.selection
    }

    /// Line the view was last asked to bring into view
    pub fn scroll_line(&self) -> Option<usize> {
        self.scroll_line
    }

    /// True when the text differs from the last saved content
    pub fn has_unsaved_changes(&self) -> bool {
        self.text != self.saved
    }

    /// Record the current text as saved
    pub fn mark_saved(&mut self) {
        self.saved = self.text.clone();
    }

    /// Replace the content with freshly loaded text, discarding local edits
    pub fn load(&mut self, content: &str) {
        *self = Self::new(content);
    }

    /// Replace the whole text as typed by the user
    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.caret = self.clamp(self.caret);
        self.selection = None;
    }

    pub fn word_count(&self) -> usize {
        word_count(&self.text)
    }

    pub fn line_count(&self) -> usize {
        line_count(&self.text)
    }

    /// Place the caret, collapsing any selection
    pub fn set_caret(&mut self, offset: usize) {
        self.caret = self.clamp(offset);
        self.selection = None;
    }

    /// Select a byte range; the caret follows the end
    pub fn select(&mut self, start: usize, end: usize) {
        let (start, end) = (self.clamp(start.min(end)), self.clamp(start.max(end)));
        self.selection = Some((start, end));
        self.caret = end;
    }

    /// Move the caret to the start of a line and scroll it into view
    pub fn go_to_line(&mut self, line_number: usize) {
        let offset = line_offset(&self.text, line_number);
        self.selection = Some((offset, offset));
        self.caret = offset;
        self.scroll_line = Some(line_number);
    }

    /// Indent by two spaces
    ///
    /// With a selection every selected line is prefixed; otherwise the
    /// spaces go in at the caret.
    pub fn indent(&mut self) {
        match self.selection.filter(|(start, end)| start < end) {
            Some((start, end)) => {
                let indented = self.text[start..end]
                    .split('\n')
                    .map(|line| format!("{}{}", INDENT, line))
                    .collect::<Vec<_>>()
                    .join("\n");
                self.replace_selection(start, end, indented);
            }
            None => self.insert_at_caret(INDENT),
        }
    }

    /// Remove up to two spaces of indentation
    ///
    /// With a selection each selected line loses a leading two-space
    /// indent. Otherwise up to two whitespace characters directly before
    /// the caret on its line are removed.
    ///
    /// # Returns
    /// * `true` - Indentation was removed
    pub fn unindent(&mut self) -> bool {
        if let Some((start, end)) = self.selection.filter(|(start, end)| start < end) {
            let selected = &self.text[start..end];
            let unindented = selected
                .split('\n')
                .map(|line| line.strip_prefix(INDENT).unwrap_or(line))
                .collect::<Vec<_>>()
                .join("\n");
            if unindented.len() == selected.len() {
                return false;
            }
            self.replace_selection(start, end, unindented);
            return true;
        }

        let line_start = self.text[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        let start = self.text[line_start..self.caret]
            .char_indices()
            .rev()
            .take(INDENT.len())
            .take_while(|(_, c)| c.is_whitespace())
            .last()
            .map_or(self.caret, |(i, _)| line_start + i);

        if start == self.caret {
            return false;
        }
        self.text.replace_range(start..self.caret, "");
        self.caret = start;
        self.selection = None;
        true
    }

    /// Swap a selected range for new text, keeping the new text selected
    fn replace_selection(&mut self, start: usize, end: usize, replacement: String) {
        let new_end = start + replacement.len();
        self.text.replace_range(start..end, &replacement);
        self.selection = Some((start, new_end));
        self.caret = new_end;
    }

    /// Wrap the selection in bold or italic markers
    pub fn wrap_selection(&mut self, markup: InlineMarkup) {
        let (start, end) = self.selection.unwrap_or((self.caret, self.caret));
        let marker = markup.marker();
        let wrapped = format!("{}{}{}", marker, &self.text[start..end], marker);
        self.text.replace_range(start..end, &wrapped);
        self.caret = start + wrapped.len();
        self.selection = None;
    }

    /// Prefix the selection with a level-1 heading marker
    pub fn make_heading(&mut self) {
        let (start, end) = self.selection.unwrap_or((self.caret, self.caret));
        let heading = format!("# {}", &self.text[start..end]);
        self.text.replace_range(start..end, &heading);
        self.caret = start + heading.len();
        self.selection = None;
    }

    /// Break the line at the caret, continuing a list item's indentation
    ///
    /// When the caret line starts with a list marker (`-`, `*`, `+` or `N.`)
    /// the new line gets the marker's indentation plus two spaces.
    pub fn newline(&mut self) {
        let line_start = self.text[..self.caret].rfind('\n').map_or(0, |i| i + 1);
        let current_line = &self.text[line_start..self.caret];

        let indent = match list_marker().captures(current_line) {
            Some(captures) => format!("{}{}", &captures[1], INDENT),
            None => String::new(),
        };
        self.insert_at_caret(&format!("\n{}", indent));
    }

    fn insert_at_caret(&mut self, text: &str) {
        if let Some((start, end)) = self.selection.take() {
            self.text.replace_range(start..end, "");
            self.caret = start;
        }
        self.text.insert_str(self.caret, text);
        self.caret += text.len();
    }

    /// Clamp an offset into the text and back onto a char boundary
    fn clamp(&self, offset: usize) -> usize {
        let mut offset = offset.min(self.text.len());
        while !self.text.is_char_boundary(offset) {
            offset -= 1;
        }
        offset
    }
}

impl SectionSubscriber for EditorBuffer {
    fn on_section_changed(&mut self, section: Option<&ActiveSection>) {
        if let Some(line_number) = section.and_then(|s| s.line_number) {
            self.go_to_line(line_number);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_offset() {
        let text = "# Goals\nintro\n## Q1";
        assert_eq!(line_offset(text, 0), 0);
        assert_eq!(line_offset(text, 1), 8);
        assert_eq!(line_offset(text, 2), 14);
        assert_eq!(&text[line_offset(text, 2)..], "## Q1");
        assert_eq!(line_offset(text, 10), text.len());
    }

    #[test]
    fn test_counts() {
        assert_eq!(word_count("  one two\n\nthree  "), 3);
        assert_eq!(word_count(""), 0);
        assert_eq!(line_count(""), 1);
        assert_eq!(line_count("a\nb\n"), 3);
    }

    #[test]
    fn test_unsaved_changes() {
        let mut buffer = EditorBuffer::new("# A");
        assert!(!buffer.has_unsaved_changes());
        buffer.set_text("# A\n## B");
        assert!(buffer.has_unsaved_changes());
        buffer.mark_saved();
        assert!(!buffer.has_unsaved_changes());
    }

    #[test]
    fn test_section_change_moves_caret() {
        let mut buffer = EditorBuffer::new("# Goals\n## Q1\n");
        let section = ActiveSection {
            node_id: "section-1".to_string(),
            line_number: Some(1),
            text: "Q1".to_string(),
        };
        buffer.on_section_changed(Some(&section));
        assert_eq!(buffer.caret(), 8);
        assert_eq!(buffer.selection(), Some((8, 8)));
        assert_eq!(buffer.scroll_line(), Some(1));

        // Clearing the section leaves the caret where it is
        buffer.on_section_changed(None);
        assert_eq!(buffer.caret(), 8);
    }

    #[test]
    fn test_indent_and_unindent() {
        let mut buffer = EditorBuffer::new("- item");
        buffer.set_caret(0);
        buffer.indent();
        assert_eq!(buffer.text(), "  - item");
        assert_eq!(buffer.caret(), 2);
        assert!(buffer.unindent());
        assert_eq!(buffer.text(), "- item");
        assert_eq!(buffer.caret(), 0);
        assert!(!buffer.unindent());
    }

    #[test]
    fn test_unindent_multibyte_whitespace() {
        let mut buffer = EditorBuffer::new("\u{a0}x");
        buffer.set_caret(3);
        assert!(!buffer.unindent());
        assert_eq!(buffer.text(), "\u{a0}x");

        buffer.set_caret(2);
        assert!(buffer.unindent());
        assert_eq!(buffer.text(), "x");
        assert_eq!(buffer.caret(), 0);

        let mut mixed = EditorBuffer::new(" \u{a0}\u{a0}y");
        mixed.set_caret(5);
        assert!(mixed.unindent());
        assert_eq!(mixed.text(), " y");
        assert_eq!(mixed.caret(), 1);
    }

    #[test]
    fn test_indent_selected_lines() {
        let mut buffer = EditorBuffer::new("intro\n- a\n- b\nend");
        buffer.select(6, 13);
        buffer.indent();
        assert_eq!(buffer.text(), "intro\n  - a\n  - b\nend");
        assert_eq!(buffer.selection(), Some((6, 17)));

        assert!(buffer.unindent());
        assert_eq!(buffer.text(), "intro\n- a\n- b\nend");
        assert_eq!(buffer.selection(), Some((6, 13)));
        assert!(!buffer.unindent());
    }

    #[test]
    fn test_wrap_selection() {
        let mut buffer = EditorBuffer::new("make this bold");
        buffer.select(5, 9);
        buffer.wrap_selection(InlineMarkup::Bold);
        assert_eq!(buffer.text(), "make **this** bold");

        buffer.select(0, 4);
        buffer.wrap_selection(InlineMarkup::Italic);
        assert_eq!(buffer.text(), "*make* **this** bold");
    }

    #[test]
    fn test_make_heading() {
        let mut buffer = EditorBuffer::new("Title");
        buffer.select(0, 5);
        buffer.make_heading();
        assert_eq!(buffer.text(), "# Title");
    }

    #[test]
    fn test_newline_continues_list_indentation() {
        let mut buffer = EditorBuffer::new("  - item");
        buffer.set_caret(8);
        buffer.newline();
        assert_eq!(buffer.text(), "  - item\n    ");
        assert_eq!(buffer.caret(), buffer.text().len());

        let mut plain = EditorBuffer::new("text");
        plain.set_caret(4);
        plain.newline();
        assert_eq!(plain.text(), "text\n");

        let mut numbered = EditorBuffer::new("1. first");
        numbered.set_caret(8);
        numbered.newline();
        assert_eq!(numbered.text(), "1. first\n  ");
    }

    #[test]
    fn test_caret_clamped_to_char_boundary() {
        let mut buffer = EditorBuffer::new("héllo");
        buffer.set_caret(2);
        assert_eq!(buffer.caret(), 1);
        buffer.set_caret(100);
        assert_eq!(buffer.caret(), buffer.text().len());
    }
}
