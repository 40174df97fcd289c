//! Authenticated client for the WordPress REST API.
//!
//! A [`CmsClient`] is only constructed after [`crate::auth::resolve_auth_channel`]
//! has found a channel the CMS accepts; the channel is fixed for the client's
//! lifetime and every request carries it.
//!
//! # Submodules
//!
//! - [`categories`]: category search with a fallback id
//! - [`media`]: featured image download and upload
//! - [`posts`]: post creation

pub mod categories;
pub mod media;
pub mod posts;

use crate::auth::AuthChannel;
use crate::error::Result;
use crate::headers::HeaderSet;
use crate::utils::endpoint;
use reqwest::Client;
use url::Url;

#[derive(Debug, Clone)]
pub struct CmsClient {
    http: Client,
    downloads: Client,
    base: Url,
    channel: AuthChannel,
}

impl CmsClient {
    pub fn new(http: Client, base: Url, channel: AuthChannel) -> Self {
        Self {
            downloads: http.clone(),
            http,
            base,
            channel,
        }
    }

    /// Use a separate client for fetching article images.
    pub fn with_download_client(mut self, downloads: Client) -> Self {
        self.downloads = downloads;
        self
    }

    pub fn channel(&self) -> &AuthChannel {
        &self.channel
    }

    /// Identity, JSON negotiation and the resolved auth header.
    fn headers(&self) -> HeaderSet {
        HeaderSet::browser()
            .accept_json()
            .with_auth(&self.channel)
    }

    fn url(&self, path: &str) -> Result<Url> {
        endpoint(&self.base, path)
    }
}
