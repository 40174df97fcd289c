//! Layered outbound header sets.
//!
//! Headers are grouped into [`Layer`]s with a fixed precedence. When the same
//! header appears in two layers the higher layer wins, so a per-request
//! `Content-Type` always beats the negotiated `Accept` family, and the
//! authentication header can never be shadowed by identity headers.

use crate::auth::AuthChannel;
use once_cell::sync::Lazy;
use reqwest::header::{
    ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue, USER_AGENT,
};
use std::collections::BTreeMap;

/// Desktop browser identity. Some upstream hosts reject non-browser clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

static BROWSER_IDENTITY: Lazy<HeaderMap> = Lazy::new(|| {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("sr-RS,sr;q=0.9,en-US;q=0.8,en;q=0.7"),
    );
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8"),
    );
    headers
});

/// Header precedence, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layer {
    /// Who we claim to be (User-Agent and friends).
    Identity,
    /// What we want back (Accept).
    Negotiation,
    /// The resolved authentication channel.
    Auth,
    /// Headers specific to one request (Content-Type, Content-Disposition).
    Request,
}

/// An immutable-by-value set of layered headers.
#[derive(Debug, Clone, Default)]
pub struct HeaderSet {
    layers: BTreeMap<Layer, HeaderMap>,
}

impl HeaderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// A set carrying the browser identity layer.
    pub fn browser() -> Self {
        let mut set = Self::new();
        set.layers.insert(Layer::Identity, BROWSER_IDENTITY.clone());
        set
    }

    /// Set `name` in `layer`, replacing any earlier value in the same layer.
    pub fn with(mut self, layer: Layer, name: HeaderName, value: HeaderValue) -> Self {
        self.layers.entry(layer).or_default().insert(name, value);
        self
    }

    pub fn accept_json(self) -> Self {
        self.with(
            Layer::Negotiation,
            ACCEPT,
            HeaderValue::from_static("application/json"),
        )
    }

    pub fn accept_images(self) -> Self {
        self.with(
            Layer::Negotiation,
            ACCEPT,
            HeaderValue::from_static("image/avif,image/webp,image/*,*/*;q=0.8"),
        )
    }

    pub fn content_type(self, value: HeaderValue) -> Self {
        self.with(Layer::Request, CONTENT_TYPE, value)
    }

    pub fn with_auth(self, channel: &AuthChannel) -> Self {
        self.with(Layer::Auth, channel.header_name(), channel.value().clone())
    }

    /// Flatten the layers into a single map, higher layers overriding lower ones.
    pub fn build(&self) -> HeaderMap {
        let mut out = HeaderMap::new();
        for headers in self.layers.values() {
            for (name, value) in headers {
                out.insert(name.clone(), value.clone());
            }
        }
        out
    }
}
