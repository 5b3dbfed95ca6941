//! CLI command definitions and parsing
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mnema",
    version,
    about = "Local knowledge store with hybrid lexical and semantic retrieval",
    long_about = "Mnema stores notes and imported documents with free-text tags and \
                  retrieves them through hybrid search: exact substring matching fused \
                  with embedding similarity, plus a separate semantic tag search."
)]
pub struct Cli {
    /// Global config file path (defaults to ~/.config/mnema/config.toml)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add a knowledge item (inline note or imported text file)
    Add {
        /// Item title
        title: String,

        /// Note text (mutually exclusive with --file)
        #[arg(long, conflicts_with = "file")]
        content: Option<String>,

        /// Import text from a file; its name is kept on the item
        #[arg(long)]
        file: Option<PathBuf>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,
    },

    /// Hybrid search: exact matching fused with semantic similarity
    Search {
        /// Search query text
        query: String,

        /// Maximum number of results to return
        #[arg(short, long)]
        limit: Option<usize>,

        /// Minimum cosine similarity for semantic matches
        #[arg(short, long)]
        threshold: Option<f32>,

        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Semantic tag search over consolidated tag embeddings
    Tags {
        /// Comma-separated tags to search for
        query: String,

        /// Maximum number of results to return
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// List all stored items
    List {
        /// Show results in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Show one item in full
    Show {
        /// Item id
        id: i64,
    },

    /// Delete an item
    Delete {
        /// Item id
        id: i64,
    },

    /// Show store statistics
    Stats,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the active configuration
    Show,
}

impl Cli {
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
