//! Tree layout for the mindmap graph
//!
//! Places every visible outline node on a 2D canvas using fixed per-level
//! spacing and emits parent/child edges. The synthetic root is never drawn;
//! its children form the first row. Layout is recomputed in full whenever
//! the structure, the collapsed set, or the active node changes.

use crate::config::LayoutConfig;
use crate::outline::OutlineNode;
use std::collections::HashSet;

/// Deepest level whose nodes may be collapsed
pub const MAX_COLLAPSIBLE_LEVEL: usize = 2;

/// Label shown for a heading with no text
pub const UNTITLED_LABEL: &str = "Untitled";

/// Colour band assigned by tree level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelBand {
    /// Level 1
    MainTopic,
    /// Level 2
    Section,
    /// Level 3 and below
    Detail,
}

impl LevelBand {
    /// Band for a tree level (1-based)
    pub fn for_level(level: usize) -> Self {
        match level {
            0 | 1 => Self::MainTopic,
            2 => Self::Section,
            _ => Self::Detail,
        }
    }

    /// Legend caption for the band
    pub fn caption(self) -> &'static str {
        match self {
            Self::MainTopic => "Main Topic",
            Self::Section => "Section",
            Self::Detail => "Detail",
        }
    }
}

/// Visual style of a drawn node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeStyle {
    pub background: &'static str,
    pub foreground: &'static str,
    pub border: &'static str,
    pub font_size: u8,
    pub font_weight: u16,
    /// Set only on the active node
    pub shadow: Option<&'static str>,
}

impl NodeStyle {
    /// Style for a node at `level`, highlighted when it is the active node
    ///
    /// The highlight replaces background, border and shadow regardless of
    /// level; size and weight still follow the band.
    pub fn for_node(level: usize, active: bool) -> Self {
        let band = LevelBand::for_level(level);
        let (background, foreground, font_size) = match band {
            LevelBand::MainTopic => ("#e3f2fd", "#1976d2", 14),
            LevelBand::Section => ("#f3e5f5", "#7b1fa2", 13),
            LevelBand::Detail => ("#f1f8e9", "#388e3c", 12),
        };
        let font_weight = if level <= 2 { 600 } else { 500 };

        if active {
            Self {
                background: "#fff3e0",
                foreground,
                border: "3px solid #ff5722",
                font_size,
                font_weight,
                shadow: Some("0 4px 16px rgba(255,87,34,0.3)"),
            }
        } else {
            Self {
                background,
                foreground,
                border: "2px solid #e0e0e0",
                font_size,
                font_weight,
                shadow: None,
            }
        }
    }

    /// True when this is the active-node highlight
    pub fn is_highlighted(&self) -> bool {
        self.shadow.is_some()
    }
}

/// An outline node placed on the canvas
#[derive(Debug, Clone, PartialEq)]
pub struct PositionedNode {
    /// Id of the outline node this was placed for
    pub id: String,
    /// Display label
    pub label: String,
    /// Depth below the synthetic root (1 for the first row)
    pub level: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Whether the node's subtree is currently hidden
    pub collapsed: bool,
    /// Whether the node has children in the outline (hidden or not)
    pub has_children: bool,
    pub style: NodeStyle,
    /// The outline data the node was built from, handed back on click
    pub source: OutlineNode,
}

impl PositionedNode {
    /// Whether double-click may collapse this node
    pub fn is_collapsible(&self) -> bool {
        self.level <= MAX_COLLAPSIBLE_LEVEL
    }
}

/// Directed edge from a parent node to a child node
#[derive(Debug, Clone, PartialEq)]
pub struct Edge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// True when the target is the active node
    pub highlighted: bool,
}

impl Edge {
    /// Stroke colour and width for rendering
    pub fn stroke(&self) -> (&'static str, u8) {
        if self.highlighted {
            ("#ff5722", 3)
        } else {
            ("#bdbdbd", 2)
        }
    }
}

/// Set of collapsed node ids
///
/// Pure UI state: never persisted with the document.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollapseState {
    collapsed: HashSet<String>,
}

impl CollapseState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_collapsed(&self, id: &str) -> bool {
        self.collapsed.contains(id)
    }

    /// Flip the collapsed state of a drawn node
    ///
    /// # Returns
    /// * `true` - The state changed
    /// * `false` - The node is deeper than level 2 and cannot collapse
    pub fn toggle(&mut self, node: &PositionedNode) -> bool {
        self.toggle_at(&node.id, node.level)
    }

    /// Flip the collapsed state of a node given its id and tree level
    pub fn toggle_at(&mut self, id: &str, level: usize) -> bool {
        if level > MAX_COLLAPSIBLE_LEVEL {
            return false;
        }
        if !self.collapsed.remove(id) {
            self.collapsed.insert(id.to_string());
        }
        true
    }

    /// Drop every collapsed entry
    pub fn clear(&mut self) {
        self.collapsed.clear();
    }

    pub fn len(&self) -> usize {
        self.collapsed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.collapsed.is_empty()
    }
}

/// Result of one layout pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GraphLayout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<Edge>,
}

impl GraphLayout {
    /// True when there is nothing to draw (the view shows its empty state)
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Lay out an outline tree
///
/// # Parameters
/// * `root` - Outline root; only its children and below are drawn
/// * `collapsed` - Nodes whose descendants are hidden
/// * `active_id` - Id of the active node, drawn with the highlight style
/// * `config` - Spacing and node size
///
/// # Returns
/// * `GraphLayout` - Drawn nodes in pre-order and the edges between them
pub fn layout(
    root: &OutlineNode,
    collapsed: &CollapseState,
    active_id: Option<&str>,
    config: &LayoutConfig,
) -> GraphLayout {
    let mut graph = GraphLayout::default();
    let mut pass = LayoutPass {
        collapsed,
        active_id,
        config,
        graph: &mut graph,
    };

    if !collapsed.is_collapsed(&root.id) {
        pass.place_children(None, &root.children, 1, config.origin_x, config.origin_y);
    }

    log::debug!(
        "Laid out {} nodes and {} edges",
        graph.nodes.len(),
        graph.edges.len()
    );

    graph
}

struct LayoutPass<'a> {
    collapsed: &'a CollapseState,
    active_id: Option<&'a str>,
    config: &'a LayoutConfig,
    graph: &'a mut GraphLayout,
}

impl LayoutPass<'_> {
    fn place_children(
        &mut self,
        parent_id: Option<&str>,
        children: &[OutlineNode],
        level: usize,
        start_x: f64,
        start_y: f64,
    ) {
        if children.is_empty() {
            return;
        }

        let spacing = self.config.horizontal_spacing;
        let total_width = (children.len() - 1) as f64 * spacing;
        let first_x = start_x - total_width / 2.0;
        let y = start_y + self.config.vertical_spacing;

        for (index, child) in children.iter().enumerate() {
            let x = first_x + index as f64 * spacing;
            let active = self.active_id == Some(child.id.as_str());
            let collapsed = self.collapsed.is_collapsed(&child.id);

            self.graph.nodes.push(PositionedNode {
                id: child.id.clone(),
                label: if child.text.is_empty() {
                    UNTITLED_LABEL.to_string()
                } else {
                    child.text.clone()
                },
                level,
                x,
                y,
                width: self.config.node_width,
                height: self.config.node_height,
                collapsed,
                has_children: !child.children.is_empty(),
                style: NodeStyle::for_node(level, active),
                source: child.clone(),
            });

            if let Some(parent_id) = parent_id {
                self.graph.edges.push(Edge {
                    id: format!("edge-{}-{}", parent_id, child.id),
                    source: parent_id.to_string(),
                    target: child.id.clone(),
                    highlighted: active,
                });
            }

            if !collapsed {
                self.place_children(Some(&child.id), &child.children, level + 1, x, y);
            }
        }
    }
}
