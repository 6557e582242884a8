//! Pages and the per-document workspace
//!
//! The home page lists documents; the mindmap page is a
//! [`DocumentWorkspace`] tying the document to its editor, graph and
//! preview. Views stay in step through the shared active section, and
//! edits reach the store through a debounced save.

use crate::active_section::{ActiveSection, SectionChannel, Subscription};
use crate::config::{AppConfig, LayoutConfig};
use crate::document::Document;
use crate::editor::EditorBuffer;
use crate::layout::{layout, CollapseState, GraphLayout};
use crate::outline::count_nodes;
use crate::preview::PreviewPane;
use crate::schedule::{Debouncer, Timer};
use crate::store::{ContentStore, StoreError, StoreNotice, StoreOperation};
use chrono::{DateTime, Utc};
use std::fmt;
use std::time::Instant;

const MINDMAP_PREFIX: &str = "/mindmap/";

/// Application route
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// `/`
    Home,
    /// `/mindmap/<id>`
    Mindmap(String),
}

impl Route {
    /// Parse a path, `None` for paths no page serves
    pub fn parse(path: &str) -> Option<Self> {
        if path == "/" || path.is_empty() {
            return Some(Self::Home);
        }
        let id = path.strip_prefix(MINDMAP_PREFIX)?;
        if id.is_empty() || id.contains('/') {
            return None;
        }
        Some(Self::Mindmap(id.to_string()))
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Home => f.write_str("/"),
            Self::Mindmap(id) => write!(f, "{}{}", MINDMAP_PREFIX, id),
        }
    }
}

/// One row of the home listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HomeEntry {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Root plus every heading
    pub node_count: usize,
    pub updated_at: DateTime<Utc>,
}

impl From<&Document> for HomeEntry {
    fn from(document: &Document) -> Self {
        Self {
            id: document.id.clone(),
            name: document.name.clone(),
            description: document.description.clone(),
            node_count: count_nodes(&document.structure),
            updated_at: document.updated_at,
        }
    }
}

/// Build the home listing, keeping the store's order
///
/// # Parameters
/// * `documents` - Documents as returned by the store
/// * `search` - Case-insensitive name filter; blank matches everything
pub fn home_entries(documents: &[Document], search: Option<&str>) -> Vec<HomeEntry> {
    let needle = search.map(|s| s.trim().to_lowercase()).unwrap_or_default();
    documents
        .iter()
        .filter(|d| needle.is_empty() || d.name.to_lowercase().contains(&needle))
        .map(HomeEntry::from)
        .collect()
}

/// Page shown for a route
pub enum Page {
    Home(Vec<HomeEntry>),
    Mindmap(Box<DocumentWorkspace>),
}

impl Page {
    /// The route actually displayed, after any redirect
    pub fn route(&self) -> Route {
        match self {
            Self::Home(_) => Route::Home,
            Self::Mindmap(workspace) => Route::Mindmap(workspace.document().id.clone()),
        }
    }
}

/// Resolve a route to a page; a missing document redirects home
pub fn navigate(
    store: &mut ContentStore,
    route: &Route,
    config: &AppConfig,
) -> Result<Page, StoreError> {
    if let Route::Mindmap(id) = route {
        if let Some(workspace) = DocumentWorkspace::open(store, id, config)? {
            return Ok(Page::Mindmap(Box::new(workspace)));
        }
        log::info!("Mindmap {} not found, redirecting to {}", id, Route::Home);
    }
    Ok(Page::Home(home_entries(&store.get_all()?, None)))
}

/// The three panes of the mindmap page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Panel {
    Editor,
    Graph,
    Preview,
}

/// Which panes are shown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelVisibility {
    pub editor: bool,
    pub graph: bool,
    pub preview: bool,
}

impl Default for PanelVisibility {
    fn default() -> Self {
        Self {
            editor: true,
            graph: true,
            preview: true,
        }
    }
}

impl PanelVisibility {
    pub fn toggle(&mut self, panel: Panel) {
        let shown = match panel {
            Panel::Editor => &mut self.editor,
            Panel::Graph => &mut self.graph,
            Panel::Preview => &mut self.preview,
        };
        *shown = !*shown;
    }

    pub fn is_visible(&self, panel: Panel) -> bool {
        match panel {
            Panel::Editor => self.editor,
            Panel::Graph => self.graph,
            Panel::Preview => self.preview,
        }
    }
}

/// An open document with its editor, graph and preview
pub struct DocumentWorkspace {
    document: Document,
    editor: EditorBuffer,
    preview: PreviewPane,
    collapsed: CollapseState,
    section: SectionChannel,
    editor_cursor: Subscription,
    preview_cursor: Subscription,
    pending_save: Debouncer<String>,
    retry_save: Timer,
    layout_config: LayoutConfig,
    panels: PanelVisibility,
    notices: Vec<StoreNotice>,
    save_failed: bool,
}

impl DocumentWorkspace {
    /// Load a document into a fresh workspace
    ///
    /// # Returns
    /// * `Ok(Some(DocumentWorkspace))` - Document loaded, nothing selected
    /// * `Ok(None)` - No such document; the caller goes back to [`Route::Home`]
    /// * `Err(StoreError)` - The local store failed
    pub fn open(
        store: &mut ContentStore,
        id: &str,
        config: &AppConfig,
    ) -> Result<Option<Self>, StoreError> {
        let Some(document) = store.get_by_id(id)? else {
            return Ok(None);
        };
        let notices = store.take_notices();

        let section = SectionChannel::new();
        let editor_cursor = section.subscribe();
        let preview_cursor = section.subscribe();

        Ok(Some(Self {
            editor: EditorBuffer::new(&document.content),
            preview: PreviewPane::new(&document.content, config.preview.table_of_contents),
            collapsed: CollapseState::new(),
            section,
            editor_cursor,
            preview_cursor,
            pending_save: Debouncer::new(config.editor.debounce()),
            retry_save: Timer::new(),
            layout_config: config.layout.clone(),
            panels: PanelVisibility::default(),
            notices,
            save_failed: false,
            document,
        }))
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn editor(&self) -> &EditorBuffer {
        &self.editor
    }

    /// Editor for toolbar actions; use [`Self::edit`] to record the result
    pub fn editor_mut(&mut self) -> &mut EditorBuffer {
        &mut self.editor
    }

    pub fn preview(&self) -> &PreviewPane {
        &self.preview
    }

    pub fn panels(&self) -> PanelVisibility {
        self.panels
    }

    pub fn toggle_panel(&mut self, panel: Panel) {
        self.panels.toggle(panel);
    }

    pub fn active_section(&self) -> Option<&ActiveSection> {
        self.section.get()
    }

    pub fn has_pending_save(&self) -> bool {
        self.pending_save.is_pending()
    }

    /// True when the last save only reached local storage
    pub fn save_failed(&self) -> bool {
        self.save_failed
    }

    /// Drain store notices raised by this workspace
    pub fn take_notices(&mut self) -> Vec<StoreNotice> {
        std::mem::take(&mut self.notices)
    }

    /// Record new editor text
    ///
    /// The outline, graph and preview follow immediately; the save waits
    /// for the debounce delay, replacing any save still pending.
    pub fn edit(&mut self, text: &str, now: Instant) {
        self.editor.set_text(text);
        self.document.set_content(text);
        self.preview.set_content(text);
        self.pending_save.schedule(text.to_string(), now);
        self.retry_save.cancel();
    }

    /// Run the debounced save once it is due
    ///
    /// A save that only reached local storage is retried after each quiet
    /// period of the debounce delay until the backend takes it.
    ///
    /// # Returns
    /// * `Ok(true)` - A save or retry ran
    /// * `Ok(false)` - Nothing was due
    pub fn tick(&mut self, store: &mut ContentStore, now: Instant) -> Result<bool, StoreError> {
        if let Some(text) = self.pending_save.poll(now) {
            self.persist(store, text)?;
            self.arm_retry(now);
            return Ok(true);
        }
        if self.retry_save.poll(now) && self.retry_failed_save(store)? {
            self.arm_retry(now);
            return Ok(true);
        }
        self.arm_retry(now);
        Ok(false)
    }

    fn arm_retry(&mut self, now: Instant) {
        if self.save_failed && !self.pending_save.is_pending() && !self.retry_save.is_armed() {
            self.retry_save.arm(now, self.pending_save.delay());
        }
    }

    /// Save the current text now, cancelling any pending debounced save
    pub fn save_now(&mut self, store: &mut ContentStore) -> Result<(), StoreError> {
        self.pending_save.cancel();
        self.retry_save.cancel();
        let text = self.editor.text().to_string();
        self.persist(store, text)
    }

    /// Write any pending save before the page goes away
    pub fn flush(&mut self, store: &mut ContentStore) -> Result<bool, StoreError> {
        match self.pending_save.flush() {
            Some(text) => {
                self.persist(store, text)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Repeat a save that only reached local storage
    ///
    /// # Returns
    /// * `Ok(true)` - A save was retried
    /// * `Ok(false)` - The last save had not failed
    pub fn retry_failed_save(&mut self, store: &mut ContentStore) -> Result<bool, StoreError> {
        if !self.save_failed {
            return Ok(false);
        }
        log::info!("Retrying save of {}", self.document.id);
        self.save_now(store)?;
        Ok(true)
    }

    fn persist(&mut self, store: &mut ContentStore, text: String) -> Result<(), StoreError> {
        self.document.set_content(&text);
        let saved = store.update(&self.document)?;

        let notices = store.take_notices();
        self.save_failed = notices
            .iter()
            .any(|n| n.operation == StoreOperation::Update);
        self.notices.extend(notices);

        self.document = saved;
        if self.editor.text() == text {
            self.editor.mark_saved();
        }
        self.preview.set_content(self.editor.text());
        log::debug!(
            "Saved {} ({} bytes) at {}",
            self.document.id,
            text.len(),
            self.document.updated_at
        );
        Ok(())
    }

    /// Make an outline node the active section
    ///
    /// The editor moves its caret to the heading line and the preview
    /// highlights the matching heading.
    ///
    /// # Returns
    /// * `false` - No node with that id in the current outline
    pub fn select_node(&mut self, id: &str) -> bool {
        let Some(node) = self.document.structure.find(id) else {
            log::debug!("Ignoring selection of unknown node {}", id);
            return false;
        };
        if node.is_root() {
            return false;
        }
        self.section.select(node);
        self.sync_views();
        true
    }

    /// Clear the active section
    pub fn clear_selection(&mut self) {
        self.section.clear();
        self.sync_views();
    }

    fn sync_views(&mut self) {
        self.section
            .deliver(&mut self.editor_cursor, &mut self.editor);
        self.section
            .deliver(&mut self.preview_cursor, &mut self.preview);
    }

    /// Lay out the graph for the current outline and selection
    pub fn graph(&self) -> GraphLayout {
        layout(
            &self.document.structure,
            &self.collapsed,
            self.section.get().map(|s| s.node_id.as_str()),
            &self.layout_config,
        )
    }

    /// Collapse or expand a drawn node
    ///
    /// # Returns
    /// * `false` - The node is not drawn or sits below level 2
    pub fn toggle_collapse(&mut self, id: &str) -> bool {
        let graph = self.graph();
        match graph.node(id) {
            Some(node) => self.collapsed.toggle(node),
            None => false,
        }
    }

    /// Re-read the document from the store, dropping unsaved edits
    ///
    /// # Returns
    /// * `Ok(false)` - The document is gone; the caller goes back to [`Route::Home`]
    pub fn reload(&mut self, store: &mut ContentStore) -> Result<bool, StoreError> {
        let Some(document) = store.get_by_id(&self.document.id)? else {
            return Ok(false);
        };
        self.notices.extend(store.take_notices());

        self.pending_save.cancel();
        self.retry_save.cancel();
        self.editor.load(&document.content);
        self.preview.set_content(&document.content);
        self.document = document;
        self.save_failed = false;
        self.clear_selection();
        Ok(true)
    }
}
