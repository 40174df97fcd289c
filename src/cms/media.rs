//! Featured image download and upload.
//!
//! The image is fetched from wherever the portal points (without CMS
//! credentials) and re-uploaded as raw bytes to the media library. Any failure
//! degrades to "no featured image"; the post is still published.

use super::CmsClient;
use crate::error::{BestEffort, Error, Result};
use crate::headers::{HeaderSet, Layer};
use crate::models::{CreatedMedia, MediaId};
use crate::utils::{
    content_type_for_extension, content_type_for_url, extension_for_content_type, media_filename,
};
use chrono::Utc;
use reqwest::StatusCode;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE, HeaderValue};
use tracing::{debug, info, instrument};
use url::Url;

const FALLBACK_FORMAT: (&str, &str) = ("image/jpeg", "jpg");

#[derive(Debug)]
struct DownloadedImage {
    bytes: Vec<u8>,
    content_type: &'static str,
    extension: &'static str,
}

impl CmsClient {
    /// Upload the article image, if there is one, and return its media id.
    #[instrument(level = "info", skip_all, fields(image_url = image_url.unwrap_or("<none>")))]
    pub async fn attach_image(&self, image_url: Option<&str>) -> BestEffort<Option<MediaId>> {
        let Some(image_url) = image_url else {
            debug!("Article has no image");
            return BestEffort::Resolved(None);
        };
        BestEffort::from_result(self.upload_from(image_url).await.map(Some), None)
    }

    async fn upload_from(&self, image_url: &str) -> Result<MediaId> {
        let image = self.download_image(image_url).await?;
        self.upload_media(image).await
    }

    async fn download_image(&self, image_url: &str) -> Result<DownloadedImage> {
        let url = Url::parse(image_url)?;
        let response = self
            .downloads
            .get(url)
            .headers(HeaderSet::browser().accept_images().build())
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(Error::from_response("image download", response).await);
        }

        let served_as = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let (content_type, extension) = image_format(served_as.as_deref(), image_url)?;
        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), content_type, "Downloaded image");

        Ok(DownloadedImage {
            bytes,
            content_type,
            extension,
        })
    }

    async fn upload_media(&self, image: DownloadedImage) -> Result<MediaId> {
        let filename = media_filename(Utc::now(), image.extension);
        let headers = self
            .headers()
            .content_type(HeaderValue::from_static(image.content_type))
            .with(
                Layer::Request,
                CONTENT_DISPOSITION,
                HeaderValue::from_str(&format!("attachment; filename=\"{filename}\""))?,
            )
            .build();

        let response = self
            .http
            .post(self.url("media")?)
            .headers(headers)
            .body(image.bytes)
            .send()
            .await?;
        if response.status() != StatusCode::CREATED {
            return Err(Error::from_response("media", response).await);
        }

        let media: CreatedMedia = serde_json::from_str(&response.text().await?)?;
        info!(media_id = %media.id, %filename, "Uploaded featured image");
        Ok(media.id)
    }
}

/// Content type and file extension for an image: the served `image/*` type
/// when recognised, else the URL's extension, else JPEG.
///
/// A served type outside `image/*` (a hotlink-block page, say) is an error.
fn image_format(
    served_as: Option<&str>,
    image_url: &str,
) -> Result<(&'static str, &'static str)> {
    if let Some(served_as) = served_as {
        let essence = served_as.split(';').next().unwrap_or_default().trim();
        if !essence.to_ascii_lowercase().starts_with("image/") {
            return Err(Error::NotAnImage {
                content_type: essence.to_string(),
            });
        }
        if let Some(extension) = extension_for_content_type(essence) {
            if let Some(content_type) = content_type_for_extension(extension) {
                return Ok((content_type, extension));
            }
        }
    }
    if let Some(content_type) = content_type_for_url(image_url) {
        if let Some(extension) = extension_for_content_type(content_type) {
            return Ok((content_type, extension));
        }
    }
    Ok(FALLBACK_FORMAT)
}
