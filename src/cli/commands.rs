//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Walk a paginated HTTP API and print what it returns
#[derive(Parser, Debug)]
#[command(name = "pagewalk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Paging definition file (YAML or JSON)
    #[arg(short, long, global = true)]
    pub definition: Option<PathBuf>,

    /// Extra request header as NAME:VALUE (repeatable)
    #[arg(short = 'H', long = "header", global = true)]
    pub headers: Vec<String>,

    /// Resume from a continuation token instead of the first page
    #[arg(long, global = true)]
    pub continuation_token: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, default_value = "30")]
    pub timeout: u64,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print every item as one JSON line
    Items {
        /// URL of the first page
        url: String,

        /// Stop after this many items
        #[arg(long)]
        max_items: Option<usize>,
    },

    /// Print one JSON line per page
    Pages {
        /// URL of the first page
        url: String,

        /// Stop after this many pages
        #[arg(long)]
        max_pages: Option<usize>,
    },

    /// Validate the paging definition
    Validate,
}
