//! One publish run: negotiate auth, fetch, resolve, upload, publish, acknowledge.
//!
//! Steps run strictly in sequence. Required steps (auth, fetch, post
//! creation) propagate their error and end the run; best-effort steps
//! (category, featured image) fall back to their defaults; the queue
//! acknowledgement is only ever a warning, because the post already exists.

use crate::aggregator::AggregatorClient;
use crate::auth::resolve_auth_channel;
use crate::cms::CmsClient;
use crate::config::Config;
use crate::error::{BestEffort, Result};
use crate::models::{ArticleId, CategoryId, MediaId, PendingArticle, PostPayload, PublishedPost};
use crate::utils::truncate_for_log;
use reqwest::Client;
use reqwest::redirect::Policy;
use tracing::{info, instrument, warn};

/// Per-invocation switches from the command line.
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    pub dry_run: bool,
}

/// What a run did. Every variant maps to exit code 0.
#[derive(Debug)]
pub enum RunOutcome {
    /// The portal had no pending article.
    NothingToPublish,
    /// Dry run: the payload that would have been posted.
    DryRun {
        article_id: ArticleId,
        payload: PostPayload,
    },
    Published(PublishReport),
}

#[derive(Debug)]
pub struct PublishReport {
    pub article_id: ArticleId,
    pub post: PublishedPost,
    pub category: CategoryId,
    pub media: Option<MediaId>,
    /// `false` when the post exists but the portal still lists the article.
    pub acknowledged: bool,
}

const MAX_REDIRECTS: usize = 5;

/// HTTP client shared by the portal and CMS calls.
///
/// Redirects are only followed within the same origin, so neither auth
/// header ever reaches another host.
pub fn http_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .redirect(same_origin_redirects())
        .build()?)
}

/// HTTP client for image downloads, which carry no credentials and may be
/// redirected to a CDN.
pub fn download_client(config: &Config) -> Result<Client> {
    Ok(Client::builder()
        .timeout(config.timeout)
        .redirect(Policy::limited(MAX_REDIRECTS))
        .build()?)
}

fn same_origin_redirects() -> Policy {
    Policy::custom(|attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            return attempt.error("too many redirects");
        }
        let same_origin = attempt
            .previous()
            .last()
            .is_some_and(|from| from.origin() == attempt.url().origin());
        if same_origin {
            attempt.follow()
        } else {
            attempt.stop()
        }
    })
}

/// Execute one run against the configured portal and CMS.
#[instrument(level = "info", skip_all, fields(dry_run = options.dry_run))]
pub async fn run(config: &Config, options: RunOptions) -> Result<RunOutcome> {
    let http = http_client(config)?;

    let channel = resolve_auth_channel(&http, &config.cms_url, &config.credentials).await?;
    let cms = CmsClient::new(http.clone(), config.cms_url.clone(), channel)
        .with_download_client(download_client(config)?);
    info!(channel = cms.channel().label(), "Resolved CMS authentication channel");
    let portal = AggregatorClient::new(http, config.portal_url.clone());

    let Some(article) = portal.fetch_pending().await? else {
        info!("Nothing to publish");
        return Ok(RunOutcome::NothingToPublish);
    };
    info!(
        id = %article.id,
        title = %truncate_for_log(&article.title, 80),
        has_image = article.image_url.is_some(),
        "Fetched pending article"
    );

    if options.dry_run {
        let category = settle(
            cms.resolve_category(&config.category, config.fallback_category)
                .await,
            "category",
        );
        let payload = PostPayload::for_article(&article, category, None);
        info!(
            payload = %truncate_for_log(&serde_json::to_string(&payload)?, 500),
            image_url = article.image_url.as_deref().unwrap_or("<none>"),
            "Dry run; nothing uploaded, published or acknowledged"
        );
        return Ok(RunOutcome::DryRun {
            article_id: article.id,
            payload,
        });
    }

    let report = post_article(
        &cms,
        &portal,
        &config.category,
        config.fallback_category,
        &article,
    )
    .await?;
    Ok(RunOutcome::Published(report))
}

/// Publish `article` and clear it from the portal queue.
///
/// # Errors
///
/// Only post creation can fail the call. A failed acknowledgement is logged
/// and reported through [`PublishReport::acknowledged`].
#[instrument(level = "info", skip_all, fields(id = %article.id))]
pub async fn post_article(
    cms: &CmsClient,
    portal: &AggregatorClient,
    category_name: &str,
    fallback_category: CategoryId,
    article: &PendingArticle,
) -> Result<PublishReport> {
    let category = settle(
        cms.resolve_category(category_name, fallback_category).await,
        "category",
    );
    let media = settle(
        cms.attach_image(article.image_url.as_deref()).await,
        "featured image",
    );

    let payload = PostPayload::for_article(article, category, media);
    let post = cms.create_post(&payload).await?;

    let acknowledged = match portal.acknowledge(&article.id).await {
        Ok(()) => true,
        Err(e) => {
            warn!(
                error = %e,
                "Post published but the portal queue was not cleared; the article may be published again"
            );
            false
        }
    };

    Ok(PublishReport {
        article_id: article.id.clone(),
        post,
        category,
        media,
        acknowledged,
    })
}

fn settle<T>(outcome: BestEffort<T>, step: &'static str) -> T {
    if let Some(cause) = outcome.cause() {
        warn!(step, error = %cause, "Best-effort step failed; continuing with default");
    }
    outcome.into_value()
}
