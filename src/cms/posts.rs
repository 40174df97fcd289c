//! Post creation.

use super::CmsClient;
use crate::error::{Error, Result};
use crate::models::{PostPayload, PublishedPost};
use reqwest::StatusCode;
use tracing::{info, instrument};

impl CmsClient {
    /// Submit `payload` to `POST /posts`.
    ///
    /// # Errors
    ///
    /// Anything other than `201 Created` is [`Error::UnexpectedStatus`].
    #[instrument(level = "info", skip_all, fields(featured_media = ?payload.featured_media))]
    pub async fn create_post(&self, payload: &PostPayload) -> Result<PublishedPost> {
        let response = self
            .http
            .post(self.url("posts")?)
            .headers(self.headers().build())
            .json(payload)
            .send()
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(Error::from_response("posts", response).await);
        }

        let post: PublishedPost = serde_json::from_str(&response.text().await?)?;
        info!(
            post_id = post.id,
            link = post.link.as_deref().unwrap_or("<none>"),
            "Post published"
        );
        Ok(post)
    }
}
