//! Markdown to HTML rendering for the preview pane
//!
//! Rendering goes through pulldown-cmark. Headings are rewritten on the way
//! out so each carries a slug id and a `content-h<N>` class, and the active
//! one also carries [`ACTIVE_CLASS`].

use super::heading_match::strip_inline_markup;
use crate::outline::parse_heading_line;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag, TagEnd};

/// Class applied to the highlighted heading
pub const ACTIVE_CLASS: &str = "active-section";

/// Title of the generated table of contents
pub const TOC_TITLE: &str = "Table of Contents";

/// A heading as it appears in the rendered output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedHeading {
    /// Heading level (1-6)
    pub level: usize,
    /// Text content with all inline markup removed
    pub text: String,
    /// Element id used as scroll target
    pub anchor: String,
}

fn markdown_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Anchor slug: lowercase with whitespace runs replaced by `-`
pub fn slugify(text: &str) -> String {
    text.to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("-")
}

/// Prepend a generated table of contents when the content has headings
///
/// # Parameters
/// * `content` - Markdown source
///
/// # Returns
/// * `String` - Markdown with a `## Table of Contents` list and a rule in front,
///   or the content unchanged when it has no headings
pub fn with_table_of_contents(content: &str) -> String {
    let entries: Vec<String> = content
        .split('\n')
        .filter_map(parse_heading_line)
        .map(|heading| {
            let indent = "  ".repeat(heading.level.saturating_sub(1));
            let anchor = slugify(&strip_inline_markup(heading.text));
            format!("{}- [{}](#{})\n", indent, heading.text, anchor)
        })
        .collect();

    if entries.is_empty() {
        return content.to_string();
    }

    let mut output = format!("## {}\n\n", TOC_TITLE);
    for entry in entries {
        output.push_str(&entry);
    }
    output.push_str("\n---\n\n");
    output.push_str(content);
    output
}

/// Collect rendered headings in document order
pub fn collect_headings(markdown: &str) -> Vec<RenderedHeading> {
    let mut headings = Vec::new();
    let mut current: Option<(usize, String)> = None;

    for event in Parser::new_ext(markdown, markdown_options()) {
        match event {
            Event::Start(Tag::Heading { level, .. }) => {
                current = Some((level as usize, String::new()));
            }
            Event::Text(text) | Event::Code(text) => {
                if let Some((_, ref mut buffer)) = current {
                    buffer.push_str(&text);
                }
            }
            Event::SoftBreak | Event::HardBreak => {
                if let Some((_, ref mut buffer)) = current {
                    buffer.push(' ');
                }
            }
            Event::End(TagEnd::Heading(_)) => {
                if let Some((level, text)) = current.take() {
                    let text = text.trim().to_string();
                    headings.push(RenderedHeading {
                        level,
                        anchor: slugify(&text),
                        text,
                    });
                }
            }
            _ => {}
        }
    }

    headings
}

/// Render markdown to an HTML fragment
///
/// # Parameters
/// * `markdown` - Markdown to render (table of contents already applied)
/// * `headings` - Output of [`collect_headings`] for the same markdown
/// * `active` - Index into `headings` of the highlighted heading
///
/// # Returns
/// * `String` - HTML fragment
pub fn render_html(markdown: &str, headings: &[RenderedHeading], active: Option<usize>) -> String {
    let mut heading_index = 0;
    let events = Parser::new_ext(markdown, markdown_options()).map(|event| match event {
        Event::Start(Tag::Heading {
            level,
            id,
            mut classes,
            attrs,
        }) => {
            let index = heading_index;
            heading_index += 1;

            classes.push(CowStr::from(format!("content-h{}", level as usize)));
            if active == Some(index) {
                classes.push(CowStr::Borrowed(ACTIVE_CLASS));
            }
            let id = headings
                .get(index)
                .map(|h| CowStr::from(h.anchor.clone()))
                .or(id);

            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            })
        }
        other => other,
    });

    let mut output = String::new();
    html::push_html(&mut output, events);
    output
}

/// Wrap an HTML fragment in a standalone page
pub fn render_page(title: &str, body: &str) -> String {
    let mut output = String::new();
    output.push_str("<!DOCTYPE html>\n");
    output.push_str("<html lang=\"en\">\n");
    output.push_str("<head>\n");
    output.push_str("<meta charset=\"UTF-8\">\n");
    output.push_str("<meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n");
    output.push_str(&format!("<title>{}</title>\n", escape_html(title)));
    output.push_str("<style>\n");
    output.push_str(CSS_STYLES);
    output.push_str("</style>\n");
    output.push_str("</head>\n");
    output.push_str("<body>\n");
    output.push_str("<div class=\"content-viewer\">\n");
    output.push_str(body);
    output.push_str("</div>\n");
    output.push_str("</body>\n");
    output.push_str("</html>\n");
    output
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const CSS_STYLES: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', 'Roboto', sans-serif;
    line-height: 1.6;
    color: #333;
    background-color: #f5f5f5;
    padding: 20px;
}

.content-viewer {
    max-width: 900px;
    margin: 0 auto;
    background: white;
    padding: 40px;
    border-radius: 4px;
}

.content-h1, .content-h2, .content-h3,
.content-h4, .content-h5, .content-h6 {
    margin: 24px 0 12px;
    color: #1a1a1a;
    scroll-margin-top: 40vh;
}

.active-section {
    background-color: #fff3e0;
    border-left: 4px solid #ff5722;
    padding-left: 8px;
}

pre {
    background: #f6f8fa;
    padding: 12px;
    overflow-x: auto;
}

table {
    border-collapse: collapse;
}

th, td {
    border: 1px solid #ddd;
    padding: 6px 10px;
}
"#;
