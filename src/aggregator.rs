//! Client for the news portal's pending-article mailbox.
//!
//! The portal exposes a single slot: `get_latest.php` returns the article
//! waiting to be published (or a `{message}` when there is none), and
//! `queue.php` removes an article once it has been published.

use crate::error::{Error, Result};
use crate::headers::HeaderSet;
use crate::models::{ArticleId, PendingArticle};
use crate::utils::{endpoint, truncate_for_log};
use reqwest::{Client, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Body of the acknowledgement request.
#[derive(Debug, Serialize)]
struct QueueCommand<'a> {
    action: &'static str,
    id: &'a ArticleId,
}

#[derive(Debug, Clone)]
pub struct AggregatorClient {
    http: Client,
    base: Url,
}

impl AggregatorClient {
    pub fn new(http: Client, base: Url) -> Self {
        Self { http, base }
    }

    /// Fetch the article waiting to be published, if any.
    ///
    /// A non-200 status, a body that is not JSON, or JSON without an `id`
    /// all mean there is nothing to publish and yield `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`Error::Network`] when the request itself fails or times out.
    #[instrument(level = "info", skip_all)]
    pub async fn fetch_pending(&self) -> Result<Option<PendingArticle>> {
        let url = endpoint(&self.base, "get_latest.php")?;
        let response = self
            .http
            .get(url)
            .headers(HeaderSet::browser().accept_json().build())
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(%status, "Portal did not return a pending article");
            return Ok(None);
        }

        let body = response.text().await?;
        Ok(parse_pending(&body))
    }

    /// Ask the portal to drop `id` from its pending set.
    ///
    /// # Errors
    ///
    /// [`Error::Network`] on transport failure, [`Error::UnexpectedStatus`] on
    /// any non-2xx answer.
    #[instrument(level = "info", skip_all, fields(%id))]
    pub async fn acknowledge(&self, id: &ArticleId) -> Result<()> {
        let url = endpoint(&self.base, "queue.php")?;
        let response = self
            .http
            .post(url)
            .headers(HeaderSet::browser().accept_json().build())
            .json(&QueueCommand {
                action: "delete",
                id,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Error::from_response("queue.php", response).await);
        }
        info!("Removed article from portal queue");
        Ok(())
    }
}

/// Interpret a `get_latest.php` body.
pub fn parse_pending(body: &str) -> Option<PendingArticle> {
    let value: Value = match serde_json::from_str(body) {
        Ok(value) => value,
        Err(e) => {
            warn!(
                error = %e,
                body = %truncate_for_log(body, 200),
                "Portal response is not JSON; nothing to publish"
            );
            return None;
        }
    };

    if value.get("id").is_none_or(Value::is_null) {
        match value.get("message").and_then(Value::as_str) {
            Some(message) => info!(%message, "Portal has no pending article"),
            None => info!("Portal has no pending article"),
        }
        return None;
    }

    match serde_json::from_value::<PendingArticle>(value) {
        Ok(article) => {
            debug!(id = %article.id, title = %truncate_for_log(&article.title, 80), "Pending article");
            Some(article)
        }
        Err(e) => {
            warn!(error = %e, "Portal article has an unexpected shape; nothing to publish");
            None
        }
    }
}
