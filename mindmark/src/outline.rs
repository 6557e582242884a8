//! Outline extraction from markdown text
//!
//! Scans markdown line by line and builds the heading tree that drives the
//! mindmap. Extraction is a pure function of the text: no state survives
//! between calls, so the same content always yields the same tree.

use serde::{Deserialize, Serialize};

/// Identifier of the synthetic root node
pub const ROOT_ID: &str = "root";

/// Text used for the root when no document title is supplied
pub const DEFAULT_ROOT_TEXT: &str = "Root";

/// Deepest ATX heading level
pub const MAX_HEADING_LEVEL: usize = 6;

/// One heading in the outline tree
///
/// The root of every outline is synthetic: it has `level` 0, no line
/// number, and its text is the document name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlineNode {
    /// Stable identifier (`section-<line index>` for headings, `root` for the root)
    pub id: String,

    /// Heading text with the leading `#` markers removed
    pub text: String,

    /// Number of leading `#` characters (0 for the root)
    #[serde(default)]
    pub level: usize,

    /// Zero-based line index of the heading in the source text
    #[serde(
        rename = "lineNumber",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub line_number: Option<usize>,

    /// Nested headings in document order
    #[serde(default)]
    pub children: Vec<OutlineNode>,
}

impl OutlineNode {
    /// Create an empty root node with the given text
    pub fn root(text: impl Into<String>) -> Self {
        Self {
            id: ROOT_ID.to_string(),
            text: text.into(),
            level: 0,
            line_number: None,
            children: Vec::new(),
        }
    }

    fn heading(line_index: usize, level: usize, text: String) -> Self {
        Self {
            id: format!("section-{}", line_index),
            text,
            level,
            line_number: Some(line_index),
            children: Vec::new(),
        }
    }

    /// Replace the root text, consuming the node
    pub fn titled(mut self, text: impl Into<String>) -> Self {
        self.text = text.into();
        self
    }

    /// True for the synthetic root
    pub fn is_root(&self) -> bool {
        self.level == 0 && self.line_number.is_none()
    }

    /// True when the tree below this node is empty
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Find a node anywhere in this subtree by id
    pub fn find(&self, id: &str) -> Option<&OutlineNode> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }

    /// Depth-first, pre-order walk over every node below this one
    pub fn descendants(&self) -> Vec<&OutlineNode> {
        let mut nodes = Vec::new();
        collect_descendants(self, &mut nodes);
        nodes
    }
}

fn collect_descendants<'a>(node: &'a OutlineNode, out: &mut Vec<&'a OutlineNode>) {
    for child in &node.children {
        out.push(child);
        collect_descendants(child, out);
    }
}

/// A heading line recognised by [`parse_heading_line`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadingLine<'a> {
    /// Count of leading `#` characters
    pub level: usize,
    /// Remaining text after the markers and any whitespace following them
    pub text: &'a str,
}

/// Recognise an ATX-style heading line
///
/// A line is a heading when its trimmed form starts with one to six `#`
/// characters. The level is the number of leading `#` characters and the
/// text is what follows them once the whitespace after the markers is
/// dropped. A longer run of `#` is ordinary text.
///
/// # Parameters
/// * `line` - A single line of markdown, without its newline
///
/// # Returns
/// * `Some(HeadingLine)` - The line is a heading
/// * `None` - Any other line
pub fn parse_heading_line(line: &str) -> Option<HeadingLine<'_>> {
    let trimmed = line.trim();
    if !trimmed.starts_with('#') {
        return None;
    }

    let level = trimmed.chars().take_while(|c| *c == '#').count();
    if level > MAX_HEADING_LEVEL {
        return None;
    }
    // '#' is one byte, so the marker count is also the byte offset
    let text = trimmed[level..].trim_start();

    Some(HeadingLine { level, text })
}

/// Extract the heading tree from markdown content
///
/// Non-heading lines never enter the tree but still advance the line index
/// used for node ids and line numbers. Skipped levels are kept as written:
/// `#` followed by `###` nests the `###` directly under the `#`.
///
/// # Parameters
/// * `content` - Full markdown text
///
/// # Returns
/// * `OutlineNode` - Synthetic root whose children are the top-level headings
pub fn extract_outline(content: &str) -> OutlineNode {
    let mut root = OutlineNode::root(DEFAULT_ROOT_TEXT);

    // Path of open ancestors, stored as child indices from the root down,
    // paired with each ancestor's level.
    let mut path: Vec<(usize, usize)> = Vec::new();

    for (index, line) in content.split('\n').enumerate() {
        let Some(heading) = parse_heading_line(line) else {
            continue;
        };

        while path
            .last()
            .is_some_and(|(_, open_level)| *open_level >= heading.level)
        {
            path.pop();
        }

        let parent = node_at_path(&mut root, &path);
        parent.children.push(OutlineNode::heading(
            index,
            heading.level,
            heading.text.to_string(),
        ));
        path.push((parent.children.len() - 1, heading.level));
    }

    log::debug!(
        "Extracted outline with {} top-level headings",
        root.children.len()
    );

    root
}

fn node_at_path<'a>(root: &'a mut OutlineNode, path: &[(usize, usize)]) -> &'a mut OutlineNode {
    path.iter()
        .fold(root, |node, (child_index, _)| &mut node.children[*child_index])
}

/// Count nodes in a tree, the given node included
///
/// Used by the home view to show how large each mindmap is.
pub fn count_nodes(node: &OutlineNode) -> usize {
    1 + node.children.iter().map(count_nodes).sum::<usize>()
}

/// Count every heading line in the content
pub fn heading_count(content: &str) -> usize {
    content
        .split('\n')
        .filter(|line| parse_heading_line(line).is_some())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(nodes: &[OutlineNode]) -> Vec<&str> {
        nodes.iter().map(|n| n.text.as_str()).collect()
    }

    #[test]
    fn test_no_headings_gives_empty_root() {
        let root = extract_outline("Start writing your content here...");
        assert!(root.is_root());
        assert!(root.children.is_empty());
        assert_eq!(root.id, ROOT_ID);
    }

    #[test]
    fn test_empty_input() {
        let root = extract_outline("");
        assert!(root.children.is_empty());
    }

    #[test]
    fn test_simple_nesting() {
        let root = extract_outline("# Goals\n## Q1");
        assert_eq!(texts(&root.children), vec!["Goals"]);
        let goals = &root.children[0];
        assert_eq!(goals.level, 1);
        assert_eq!(goals.line_number, Some(0));
        assert_eq!(goals.id, "section-0");
        assert_eq!(texts(&goals.children), vec!["Q1"]);
        assert_eq!(goals.children[0].id, "section-1");
        assert_eq!(goals.children[0].line_number, Some(1));
    }

    #[test]
    fn test_siblings_and_ancestors() {
        let content = "# A\n## A1\n### A1a\n## A2\n# B\n## B1";
        let root = extract_outline(content);

        assert_eq!(texts(&root.children), vec!["A", "B"]);
        let a = &root.children[0];
        assert_eq!(texts(&a.children), vec!["A1", "A2"]);
        assert_eq!(texts(&a.children[0].children), vec!["A1a"]);
        assert!(a.children[1].children.is_empty());
        assert_eq!(texts(&root.children[1].children), vec!["B1"]);
    }

    #[test]
    fn test_level_skip_is_not_normalised() {
        let root = extract_outline("# Top\n### Deep\n## Mid");
        let top = &root.children[0];
        assert_eq!(texts(&top.children), vec!["Deep", "Mid"]);
        assert_eq!(top.children[0].level, 3);
        assert_eq!(top.children[1].level, 2);
    }

    #[test]
    fn test_shallower_heading_after_deep_start_attaches_by_level() {
        // A level-2 heading must not become the child of a preceding level-3 heading
        let root = extract_outline("### Deep\n## Shallow");
        assert_eq!(texts(&root.children), vec!["Deep", "Shallow"]);
    }

    #[test]
    fn test_non_heading_lines_advance_line_numbers() {
        let content = "intro\n\n# First\nbody text\nmore\n## Second";
        let root = extract_outline(content);
        let first = &root.children[0];
        assert_eq!(first.line_number, Some(2));
        assert_eq!(first.children[0].line_number, Some(5));
        assert_eq!(first.children[0].id, "section-5");
    }

    #[test]
    fn test_indented_heading_and_marker_whitespace() {
        let root = extract_outline("   ##   Spaced out  ");
        assert_eq!(root.children[0].level, 2);
        assert_eq!(root.children[0].text, "Spaced out");
    }

    #[test]
    fn test_more_than_six_markers_is_not_a_heading() {
        assert_eq!(parse_heading_line("###### Six").map(|h| h.level), Some(6));
        assert!(parse_heading_line("####### Seven").is_none());

        let root = extract_outline("# A\n####### not a heading\n## B");
        assert_eq!(texts(&root.children[0].children), vec!["B"]);
        assert_eq!(count_nodes(&root), 3);
    }

    #[test]
    fn test_inline_markup_is_kept_in_text() {
        let root = extract_outline("## **Setup**");
        assert_eq!(root.children[0].text, "**Setup**");
    }

    #[test]
    fn test_deterministic() {
        let content = "# A\ntext\n## B\n### C\n# D\n";
        assert_eq!(extract_outline(content), extract_outline(content));
    }

    #[test]
    fn test_find_and_descendants() {
        let root = extract_outline("# A\n## B\n# C");
        assert_eq!(root.find("section-1").map(|n| n.text.as_str()), Some("B"));
        assert!(root.find("section-9").is_none());
        let order: Vec<&str> = root.descendants().iter().map(|n| n.text.as_str()).collect();
        assert_eq!(order, vec!["A", "B", "C"]);
    }

    #[test]
    fn test_count_nodes() {
        assert_eq!(count_nodes(&OutlineNode::root("x")), 1);
        let root = extract_outline("# A\n## B\n# C");
        assert_eq!(count_nodes(&root), 4);
        assert_eq!(heading_count("# A\n## B\nplain\n# C"), 3);
    }

    #[test]
    fn test_json_shape() {
        let root = extract_outline("# A").titled("Plan");
        let json = serde_json::to_value(&root).unwrap();
        assert_eq!(json["id"], "root");
        assert_eq!(json["text"], "Plan");
        assert!(json.get("lineNumber").is_none());
        assert_eq!(json["children"][0]["lineNumber"], 0);
        assert_eq!(json["children"][0]["level"], 1);
    }
}
