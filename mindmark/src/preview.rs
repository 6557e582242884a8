//! Rendered preview pane
//!
//! Holds the rendered form of the document and follows the active section:
//! when the selection changes the pane looks up the matching heading,
//! moves the single highlight onto it and records it as the scroll target.

use crate::active_section::{ActiveSection, SectionSubscriber};

mod heading_match;
mod render;

pub use heading_match::{find_heading, strip_inline_markup, HeadingMatch, MatchStrategy};
pub use render::{
    collect_headings, render_html, render_page, slugify, with_table_of_contents,
    RenderedHeading, ACTIVE_CLASS, TOC_TITLE,
};

/// Preview of one document
#[derive(Debug, Clone)]
pub struct PreviewPane {
    /// Markdown actually rendered (table of contents applied)
    markdown: String,
    table_of_contents: bool,
    headings: Vec<RenderedHeading>,
    active: Option<usize>,
    scroll_target: Option<String>,
    last_match: Option<HeadingMatch>,
}

impl PreviewPane {
    /// Build a pane for the given document content
    pub fn new(content: &str, table_of_contents: bool) -> Self {
        let mut pane = Self {
            markdown: String::new(),
            table_of_contents,
            headings: Vec::new(),
            active: None,
            scroll_target: None,
            last_match: None,
        };
        pane.set_content(content);
        pane
    }

    /// Re-render after the document content changed
    ///
    /// The highlight survives when a heading with the same text still exists.
    pub fn set_content(&mut self, content: &str) {
        let active_text = self.active_heading().map(|h| h.text.clone());

        self.markdown = if self.table_of_contents {
            with_table_of_contents(content)
        } else {
            content.to_string()
        };
        self.headings = collect_headings(&self.markdown);

        self.active = active_text.and_then(|text| self.headings.iter().position(|h| h.text == text));
        if self.active.is_none() {
            self.scroll_target = None;
        }
    }

    /// Headings in rendered order
    pub fn headings(&self) -> &[RenderedHeading] {
        &self.headings
    }

    /// The heading carrying the active highlight
    pub fn active_heading(&self) -> Option<&RenderedHeading> {
        self.active.and_then(|index| self.headings.get(index))
    }

    /// Anchor the view should scroll to after the last successful match
    pub fn scroll_target(&self) -> Option<&str> {
        self.scroll_target.as_deref()
    }

    /// Strategy that located the current highlight
    pub fn last_match(&self) -> Option<HeadingMatch> {
        self.last_match
    }

    /// Render the pane as an HTML fragment
    pub fn render(&self) -> String {
        render_html(&self.markdown, &self.headings, self.active)
    }

    /// Highlight the heading for a section
    ///
    /// # Returns
    /// * `true` - A heading matched and now carries the highlight
    /// * `false` - No heading matched; highlight and scroll position are unchanged
    pub fn highlight(&mut self, section: &ActiveSection) -> bool {
        let texts: Vec<&str> = self.headings.iter().map(|h| h.text.as_str()).collect();

        match find_heading(&texts, &section.text) {
            Some(found) => {
                self.active = Some(found.index);
                self.scroll_target = Some(self.headings[found.index].anchor.clone());
                self.last_match = Some(found);
                log::debug!(
                    "Preview matched '{}' to heading {} via {:?}",
                    section.text,
                    found.index,
                    found.strategy
                );
                true
            }
            None => {
                log::info!("Could not find heading for: {}", section.text);
                log::info!("Cleaned text: {}", strip_inline_markup(&section.text));
                log::info!("Available headings: {:?}", texts);
                false
            }
        }
    }

    /// Drop the highlight
    pub fn clear_highlight(&mut self) {
        self.active = None;
        self.scroll_target = None;
        self.last_match = None;
    }
}

impl SectionSubscriber for PreviewPane {
    fn on_section_changed(&mut self, section: Option<&ActiveSection>) {
        match section {
            Some(section) => {
                self.highlight(section);
            }
            None => self.clear_highlight(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn section(text: &str) -> ActiveSection {
        ActiveSection {
            node_id: "section-0".to_string(),
            line_number: Some(0),
            text: text.to_string(),
        }
    }

    #[test]
    fn test_stripped_match_for_bold_heading() {
        let mut pane = PreviewPane::new("# Intro\n\n## **Setup**\n", false);
        assert!(pane.highlight(&section("**Setup**")));
        assert_eq!(pane.active_heading().unwrap().text, "Setup");
        assert_eq!(pane.last_match().unwrap().strategy, MatchStrategy::Stripped);
        assert_eq!(pane.scroll_target(), Some("setup"));
        assert_eq!(pane.render().matches(ACTIVE_CLASS).count(), 1);
    }

    #[test]
    fn test_highlight_moves_between_headings() {
        let mut pane = PreviewPane::new("# A\n\n# B\n", false);
        pane.highlight(&section("A"));
        pane.highlight(&section("B"));
        let html = pane.render();
        assert_eq!(html.matches(ACTIVE_CLASS).count(), 1);
        assert_eq!(pane.active_heading().unwrap().text, "B");
    }

    #[test]
    fn test_failed_match_keeps_previous_state() {
        let mut pane = PreviewPane::new("# A\n", false);
        pane.highlight(&section("A"));
        assert!(!pane.highlight(&section("Missing")));
        assert_eq!(pane.active_heading().unwrap().text, "A");
        assert_eq!(pane.scroll_target(), Some("a"));
    }

    #[test]
    fn test_table_of_contents_heading_is_rendered() {
        let pane = PreviewPane::new("# Goals\n## Q1", true);
        let texts: Vec<&str> = pane.headings().iter().map(|h| h.text.as_str()).collect();
        assert_eq!(texts, vec![TOC_TITLE, "Goals", "Q1"]);
    }

    #[test]
    fn test_subscriber_clears_on_none() {
        let mut pane = PreviewPane::new("# A\n", false);
        pane.on_section_changed(Some(&section("A")));
        assert!(pane.active_heading().is_some());
        pane.on_section_changed(None);
        assert!(pane.active_heading().is_none());
        assert!(pane.scroll_target().is_none());
    }

    #[test]
    fn test_highlight_survives_content_change() {
        let mut pane = PreviewPane::new("# A\n# B\n", false);
        pane.highlight(&section("B"));
        pane.set_content("intro\n\n# New\n# B\n");
        assert_eq!(pane.active_heading().unwrap().text, "B");

        pane.set_content("# Only\n");
        assert!(pane.active_heading().is_none());
    }
}
