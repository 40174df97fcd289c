//! Command-line interface definitions for the portal publisher.
//!
//! Credentials and endpoints come from the environment (see
//! [`crate::config`]); the command line only carries per-invocation choices.

use clap::Parser;
use std::path::PathBuf;

/// Publish the pending portal article to WordPress, once.
///
/// # Examples
///
/// ```sh
/// # Normal scheduled run
/// WP_USER=editor WP_APP_PASSWORD="abcd efgh" portal_publisher
///
/// # Inspect what would be published without touching anything
/// portal_publisher --dry-run --config ./publisher.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Optional path to a YAML settings file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Category name to publish under, overriding WP_CATEGORY
    #[arg(long)]
    pub category: Option<String>,

    /// Fetch and resolve everything but do not upload, publish or acknowledge
    #[arg(long)]
    pub dry_run: bool,
}
