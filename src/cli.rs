//! CLI definitions for framesnap.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// framesnap CLI.
#[derive(Parser)]
#[command(name = "framesnap")]
#[command(about = "Multi-frame hybrid page snapshots over the Chrome DevTools Protocol")]
#[command(version)]
pub(crate) struct Cli {
    /// Configuration file path (default: config/framesnap.toml if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log filter, overrides the configured level (e.g. "debug" or "framesnap_core=trace")
    #[arg(long, global = true, env = "FRAMESNAP_LOG")]
    pub log: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub(crate) enum Commands {
    /// Capture a snapshot of a page
    Capture {
        #[command(flatten)]
        browser: BrowserArgs,

        /// Selector (XPath or CSS) of the element to focus on
        #[arg(short, long)]
        focus: Option<String>,

        /// Walk shadow roots while indexing the DOM
        #[arg(long)]
        experimental: bool,

        /// Include per-frame outlines in JSON output
        #[arg(long)]
        per_frame: bool,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Tree)]
        format: OutputFormat,

        /// Write the snapshot to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the frames of a page with their ordinals and sessions
    Frames {
        #[command(flatten)]
        browser: BrowserArgs,
    },
}

/// Browser connection overrides shared by the commands.
#[derive(Args, Debug, Default)]
pub(crate) struct BrowserArgs {
    /// DevTools endpoint (http://host:port or ws:// browser URL)
    #[arg(short, long, env = "FRAMESNAP_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Page target id or URL substring
    #[arg(short, long)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    /// Combined outline only
    Tree,
    /// Full snapshot as JSON
    Json,
}
