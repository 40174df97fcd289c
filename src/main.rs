//! # Portal Publisher
//!
//! Takes the article waiting in a news portal's queue and publishes it to a
//! WordPress site, once per invocation. Meant to be run by a scheduler
//! (cron, systemd timer) that watches the exit code.
//!
//! ## Usage
//!
//! ```sh
//! WP_USER=editor WP_APP_PASSWORD="abcd efgh ijkl" portal_publisher
//! ```
//!
//! ## Pipeline
//!
//! 1. **Auth**: find which header (`Authorization` or `X-Authorization`) the CMS accepts
//! 2. **Fetch**: ask the portal for its pending article; none means a clean exit
//! 3. **Category**: look up the category id by name, falling back to a fixed id
//! 4. **Media**: download the article image and upload it to the media library
//! 5. **Publish**: create the post
//! 6. **Acknowledge**: ask the portal to drop the article from its queue
//!
//! ## Exit codes
//!
//! - `0`: published, dry run, or nothing to publish
//! - `1`: the run failed (authentication, fetch or publish)
//! - `2`: configuration error

use clap::Parser;
use std::process::ExitCode;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod aggregator;
mod auth;
mod cli;
mod cms;
mod config;
mod error;
mod headers;
mod models;
mod pipeline;
mod utils;

use cli::Cli;
use config::Config;
use pipeline::{RunOptions, RunOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!(version = env!("CARGO_PKG_VERSION"), "portal_publisher starting up");

    let args = Cli::parse();
    debug!(?args.config, ?args.category, args.dry_run, "Parsed CLI arguments");

    let config = match Config::load(&args) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Configuration error");
            return ExitCode::from(e.exit_code());
        }
    };
    info!(
        portal = %config.portal_url,
        cms = %config.cms_url,
        category = %config.category,
        timeout_secs = config.timeout.as_secs(),
        "Loaded configuration"
    );

    let options = RunOptions {
        dry_run: args.dry_run,
    };
    let code = match pipeline::run(&config, options).await {
        Ok(RunOutcome::NothingToPublish) => {
            info!("No pending article; exiting cleanly");
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::DryRun { article_id, payload }) => {
            info!(
                %article_id,
                title = %payload.title,
                categories = ?payload.categories,
                "Dry run complete"
            );
            ExitCode::SUCCESS
        }
        Ok(RunOutcome::Published(report)) => {
            if !report.acknowledged {
                warn!(article_id = %report.article_id, "Published, but the article is still queued on the portal");
            }
            info!(
                article_id = %report.article_id,
                post_id = report.post.id,
                link = report.post.link.as_deref().unwrap_or("<none>"),
                category = %report.category,
                featured_media = ?report.media,
                "Article published"
            );
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = %e, "Run failed");
            ExitCode::from(e.exit_code())
        }
    };

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );
    code
}
