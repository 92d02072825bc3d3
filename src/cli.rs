//! Command-line argument parsing for contextbuddy
//!
//! Provides a clap-based CLI with subcommands for listing, running, and
//! composing tool results.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// contextbuddy - fresh project signals for AI-assisted triage
#[derive(Parser, Debug)]
#[command(name = "contextbuddy")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version = "0.3.0")]
#[command(about = "Gather fresh project signals into model-ready context", long_about = None)]
pub struct Args {
    /// Workspace root (current directory by default)
    #[arg(long)]
    pub workspace: Option<PathBuf>,

    /// Tools configuration file path
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List resolved tools
    List,

    /// Run a tool by id
    Run {
        /// Tool id to execute
        id: String,

        /// Bypass deduplication and staleness checks
        #[arg(long)]
        force: bool,
    },

    /// Show cached results
    Results {
        /// Show only this tool id
        id: Option<String>,
    },

    /// Refresh stale auto-run tools
    Refresh,

    /// Compose cached results into a context block
    Compose {
        /// Character budget for the block
        #[arg(long, default_value_t = 20_000)]
        max_chars: usize,
    },
}

impl Args {
    /// Get the workspace root (current dir if not specified)
    pub fn workspace_root(&self) -> PathBuf {
        self.workspace
            .clone()
            .unwrap_or_else(|| std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")))
    }
}
