//! mindmark - Markdown mindmap tool
//!
//! Keeps markdown documents in a hosted table (or a local JSON file when
//! the backend is unavailable) and presents each one as an outline, a
//! mindmap graph and a rendered preview that follow the same selection.

#![deny(unsafe_code)]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::all))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(clippy::pedantic))]
#![cfg_attr(all(not(debug_assertions), not(test)), deny(missing_docs))]
// Allow some pedantic lints that are too strict for this project
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(dead_code)]

mod active_section;
mod cli;
mod config;
mod document;
mod editor;
mod layout;
mod outline;
mod preview;
mod schedule;
mod session;
mod store;
mod workspace;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands};
use config::{AppConfig, CONFIG_FILE_NAME};
use document::NewDocument;
use outline::OutlineNode;
use session::{AuthGate, Session, SessionEvent};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use store::{ContentStore, StoreNotice};
use workspace::{home_entries, navigate, DocumentWorkspace, Page, Route};

/// Main entry point for the mindmark CLI application
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {:?}", e);
        std::process::exit(1);
    }
}

/// Run the CLI application
fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut logger = env_logger::Builder::from_default_env();
    if cli.verbose {
        logger.filter_level(log::LevelFilter::Info);
    }
    logger.init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| PathBuf::from(CONFIG_FILE_NAME));
    let config = AppConfig::load_or_default(&config_path)
        .with_context(|| format!("Failed to load configuration from {}", config_path.display()))?;

    let session = authenticate(&config, cli.pin.as_deref())?;
    let mut store = ContentStore::from_config(&config);

    match cli.command {
        Commands::List { search } => {
            handle_list_command(&mut store, search.as_deref())?;
        }

        Commands::New {
            name,
            description,
            from,
        } => {
            handle_new_command(&mut store, name, description, from)?;
        }

        Commands::Show { id } => {
            handle_show_command(&mut store, &config, &id)?;
        }

        Commands::Layout {
            id,
            collapse,
            section,
        } => {
            handle_layout_command(&mut store, &config, &id, &collapse, section.as_deref())?;
        }

        Commands::Preview {
            id,
            section,
            output,
        } => {
            handle_preview_command(&mut store, &config, &id, section.as_deref(), output)?;
        }

        Commands::Edit { id, from } => {
            handle_edit_command(&mut store, &config, &id, &from)?;
        }

        Commands::Watch {
            id,
            file,
            interval_ms,
            stop_after,
        } => {
            let interval = Duration::from_millis(interval_ms.max(10));
            let stop_after = stop_after.map(Duration::from_secs);
            handle_watch_command(&mut store, &config, &id, &file, interval, stop_after, session)?;
        }

        Commands::Delete { id } => {
            handle_delete_command(&mut store, &id)?;
        }
    }

    report_notices(store.take_notices());

    Ok(())
}

/// Check the PIN when the configuration sets one
///
/// # Returns
/// * `Ok(Some(Session))` - PIN accepted, session started
/// * `Ok(None)` - No PIN configured
fn authenticate(config: &AppConfig, pin: Option<&str>) -> Result<Option<Session>> {
    let Some(gate) =
        AuthGate::from_config(&config.session).context("Invalid PIN in configuration")?
    else {
        return Ok(None);
    };

    let pin = pin.ok_or_else(|| anyhow::anyhow!("This workspace is locked. Pass --pin <PIN>"))?;
    let session = gate
        .login(pin, &config.session, Instant::now())
        .context("Authentication failed")?;
    Ok(Some(session))
}

/// Open a document page, failing when the route falls back to home
fn open_workspace(
    store: &mut ContentStore,
    config: &AppConfig,
    id: &str,
) -> Result<DocumentWorkspace> {
    match navigate(store, &Route::Mindmap(id.to_string()), config)? {
        Page::Mindmap(workspace) => Ok(*workspace),
        Page::Home(_) => anyhow::bail!(
            "Mindmap '{}' not found. Run 'mindmark list' to see available documents",
            id
        ),
    }
}

fn report_notices(notices: Vec<StoreNotice>) {
    for notice in notices {
        eprintln!("Warning: {}", notice);
    }
}

/// Handle the list command
fn handle_list_command(store: &mut ContentStore, search: Option<&str>) -> Result<()> {
    let documents = store.get_all().context("Failed to load documents")?;
    let entries = home_entries(&documents, search);

    if entries.is_empty() {
        match search {
            Some(term) => println!("No mindmaps match '{}'", term),
            None => println!("No mindmaps yet. Create one with 'mindmark new <NAME>'"),
        }
        return Ok(());
    }

    for entry in entries {
        println!("{}  {}", entry.id, entry.name);
        if let Some(description) = &entry.description {
            println!("    {}", description);
        }
        println!(
            "    {} nodes, updated {}",
            entry.node_count,
            entry.updated_at.format("%Y-%m-%d %H:%M")
        );
    }
    Ok(())
}

/// Handle the new command
fn handle_new_command(
    store: &mut ContentStore,
    name: String,
    description: Option<String>,
    from: Option<PathBuf>,
) -> Result<()> {
    let content = from
        .as_ref()
        .map(|path| {
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read {}", path.display()))
        })
        .transpose()?;

    let document = store
        .create(NewDocument {
            name,
            description,
            content,
        })
        .context("Failed to create mindmap")?;

    println!("✓ Created '{}'", document.name);
    println!("  id: {}", document.id);
    println!("  route: {}", Route::Mindmap(document.id.clone()));
    Ok(())
}

/// Handle the show command
fn handle_show_command(store: &mut ContentStore, config: &AppConfig, id: &str) -> Result<()> {
    let mut workspace = open_workspace(store, config, id)?;
    let document = workspace.document();

    println!("{}", document.structure.text);
    if document.is_empty_outline() {
        println!("  (no headings yet; add lines starting with '#')");
    }
    for child in &document.structure.children {
        print_outline(child, 1);
    }
    println!(
        "\n{} words, {} lines",
        workspace.editor().word_count(),
        workspace.editor().line_count()
    );
    report_notices(workspace.take_notices());
    Ok(())
}

fn print_outline(node: &OutlineNode, depth: usize) {
    let line = node
        .line_number
        .map(|n| format!(" (line {})", n + 1))
        .unwrap_or_default();
    println!("{}- [{}] {}{}", "  ".repeat(depth), node.id, node.text, line);
    for child in &node.children {
        print_outline(child, depth + 1);
    }
}

/// Handle the layout command
fn handle_layout_command(
    store: &mut ContentStore,
    config: &AppConfig,
    id: &str,
    collapse: &[String],
    section: Option<&str>,
) -> Result<()> {
    let mut workspace = open_workspace(store, config, id)?;

    if let Some(section) = section {
        if !workspace.select_node(section) {
            log::warn!("No node '{}' in this mindmap", section);
        }
    }
    for node in collapse {
        if !workspace.toggle_collapse(node) {
            log::warn!("Node '{}' cannot be collapsed", node);
        }
    }

    let graph = workspace.graph();
    if graph.is_empty() {
        println!("Add headings to your content to build the mindmap");
        return Ok(());
    }

    println!("Nodes:");
    for node in &graph.nodes {
        let mut flags = Vec::new();
        if node.collapsed {
            flags.push("collapsed");
        }
        if node.style.is_highlighted() {
            flags.push("active");
        }
        println!(
            "  {:<14} {:<10} ({:>7.1}, {:>6.1})  {}{}",
            node.id,
            layout::LevelBand::for_level(node.level).caption(),
            node.x,
            node.y,
            node.label,
            if flags.is_empty() {
                String::new()
            } else {
                format!("  [{}]", flags.join(", "))
            }
        );
    }

    println!("Edges:");
    for edge in &graph.edges {
        let (color, width) = edge.stroke();
        println!(
            "  {} -> {}  stroke {} {}px",
            edge.source, edge.target, color, width
        );
    }
    report_notices(workspace.take_notices());
    Ok(())
}

/// Handle the preview command
fn handle_preview_command(
    store: &mut ContentStore,
    config: &AppConfig,
    id: &str,
    section: Option<&str>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut workspace = open_workspace(store, config, id)?;

    if let Some(section) = section {
        if workspace.select_node(section) {
            let editor = workspace.editor();
            eprintln!(
                "Editor caret at byte {} (line {})",
                editor.caret(),
                editor.scroll_line().map_or(0, |line| line + 1)
            );
            match workspace.preview().last_match() {
                Some(found) => eprintln!(
                    "Highlighted heading {} ({:?} match)",
                    found.index + 1,
                    found.strategy
                ),
                None => eprintln!("No heading matched; preview left unhighlighted"),
            }
        } else {
            log::warn!("No node '{}' in this mindmap", section);
        }
    }

    let page = preview::render_page(&workspace.document().name, &workspace.preview().render());
    match output {
        Some(path) => {
            std::fs::write(&path, page)
                .with_context(|| format!("Failed to write preview to {}", path.display()))?;
            println!("✓ Successfully wrote: {}", path.display());
        }
        None => print!("{}", page),
    }
    report_notices(workspace.take_notices());
    Ok(())
}

/// Handle the edit command
fn handle_edit_command(
    store: &mut ContentStore,
    config: &AppConfig,
    id: &str,
    from: &Path,
) -> Result<()> {
    let text = std::fs::read_to_string(from)
        .with_context(|| format!("Failed to read {}", from.display()))?;
    let mut workspace = open_workspace(store, config, id)?;

    workspace.edit(&text, Instant::now());
    workspace
        .save_now(store)
        .with_context(|| format!("Failed to save mindmap '{}'", id))?;

    let document = workspace.document();
    println!(
        "✓ Saved '{}' ({} headings)",
        document.name,
        document.structure.descendants().len()
    );
    report_notices(workspace.take_notices());
    Ok(())
}

/// Handle the watch command
///
/// Every change to the file goes through the debounced save; pending
/// changes are written when watching stops.
fn handle_watch_command(
    store: &mut ContentStore,
    config: &AppConfig,
    id: &str,
    file: &Path,
    interval: Duration,
    stop_after: Option<Duration>,
    mut session: Option<Session>,
) -> Result<()> {
    let mut workspace = open_workspace(store, config, id)?;

    if !file.exists() {
        std::fs::write(file, workspace.editor().text())
            .with_context(|| format!("Failed to create {}", file.display()))?;
    }

    let started = Instant::now();
    let mut last_seen = String::from(workspace.editor().text());
    println!(
        "Watching {} for '{}' (saving {}ms after the last change)",
        file.display(),
        workspace.document().name,
        config.editor.debounce().as_millis()
    );

    loop {
        let now = Instant::now();
        let text = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read {}", file.display()))?;
        if text != last_seen {
            workspace.edit(&text, now);
            if let Some(session) = session.as_mut() {
                session.record_activity(now);
            }
            last_seen = text;
        }

        if workspace
            .tick(store, now)
            .with_context(|| format!("Failed to save mindmap '{}'", id))?
        {
            println!(
                "✓ Saved ({} words, {} nodes)",
                workspace.editor().word_count(),
                outline::count_nodes(&workspace.document().structure)
            );
        }
        report_notices(workspace.take_notices());

        if let Some(session) = session.as_mut() {
            match session.poll(now) {
                Some(SessionEvent::Warning { remaining }) => {
                    println!(
                        "Session expires in {}s without activity",
                        remaining.as_secs()
                    );
                }
                Some(SessionEvent::LoggedOut) => {
                    println!("Session timed out");
                    break;
                }
                None => {}
            }
        }

        if stop_after.is_some_and(|limit| now.duration_since(started) >= limit) {
            break;
        }
        std::thread::sleep(interval);
    }

    if workspace
        .flush(store)
        .with_context(|| format!("Failed to save mindmap '{}'", id))?
    {
        println!("✓ Saved pending changes");
    }
    // Last attempt to get a locally kept save onto the server
    if workspace
        .retry_failed_save(store)
        .with_context(|| format!("Failed to save mindmap '{}'", id))?
        && !workspace.save_failed()
    {
        println!("✓ Saved changes to the server");
    }
    report_notices(workspace.take_notices());
    Ok(())
}

/// Handle the delete command
fn handle_delete_command(store: &mut ContentStore, id: &str) -> Result<()> {
    if store
        .delete(id)
        .with_context(|| format!("Failed to delete mindmap '{}'", id))?
    {
        println!("✓ Deleted {}", id);
    } else {
        println!("No mindmap with id {}", id);
    }
    Ok(())
}
