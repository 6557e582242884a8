//! Command-line interface definitions for mindmark

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// CLI structure for the mindmark application
#[derive(Parser)]
#[command(name = "mindmark")]
#[command(version)]
#[command(about = "Markdown mindmaps: outline, graph and preview", long_about = None)]
pub struct Cli {
    /// Configuration file (defaults to ./mindmark.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Six-digit PIN, required when the configuration sets one
    #[arg(long, global = true, value_name = "PIN")]
    pub pin: Option<String>,

    /// The subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands for mindmark
#[derive(Subcommand)]
pub enum Commands {
    /// List documents, most recently updated first
    List {
        /// Case-insensitive name filter
        #[arg(short, long)]
        search: Option<String>,
    },

    /// Create a new document
    New {
        /// Document name
        name: String,

        /// Short description shown in the listing
        #[arg(short, long)]
        description: Option<String>,

        /// Initial markdown content (defaults to a placeholder)
        #[arg(long, value_name = "FILE")]
        from: Option<PathBuf>,
    },

    /// Print a document's outline tree
    Show {
        /// Document id
        id: String,
    },

    /// Print the mindmap graph layout
    Layout {
        /// Document id
        id: String,

        /// Collapse a node before laying out (repeatable)
        #[arg(long, value_name = "NODE")]
        collapse: Vec<String>,

        /// Node to draw as the active section
        #[arg(short, long, value_name = "NODE")]
        section: Option<String>,
    },

    /// Render the document preview to HTML
    Preview {
        /// Document id
        id: String,

        /// Outline node to highlight (e.g. section-3)
        #[arg(short, long, value_name = "NODE")]
        section: Option<String>,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace a document's content and save it immediately
    Edit {
        /// Document id
        id: String,

        /// Markdown file holding the new content
        #[arg(long, value_name = "FILE")]
        from: PathBuf,
    },

    /// Edit a document through a local file, saving changes as they settle
    Watch {
        /// Document id
        id: String,

        /// Markdown file to watch; created from the document when missing
        file: PathBuf,

        /// Polling interval in milliseconds
        #[arg(long, default_value_t = 100)]
        interval_ms: u64,

        /// Stop watching after this many seconds
        #[arg(long, value_name = "SECS")]
        stop_after: Option<u64>,
    },

    /// Delete a document
    Delete {
        /// Document id
        id: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "mindmark", "layout", "abc", "--collapse", "section-0", "--collapse", "section-4",
            "--pin", "111111", "-v",
        ])
        .unwrap();

        assert!(cli.verbose);
        assert_eq!(cli.pin.as_deref(), Some("111111"));
        match cli.command {
            Commands::Layout { id, collapse, .. } => {
                assert_eq!(id, "abc");
                assert_eq!(collapse, vec!["section-0", "section-4"]);
            }
            _ => panic!("expected layout command"),
        }
    }

    #[test]
    fn test_edit_requires_source_file() {
        assert!(Cli::try_parse_from(["mindmark", "edit", "abc"]).is_err());
    }
}
