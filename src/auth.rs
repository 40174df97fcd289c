//! CMS credentials and authentication channel negotiation.
//!
//! Some hosting setups strip the standard `Authorization` header before the
//! request reaches WordPress. [`resolve_auth_channel`] probes the
//! current-user endpoint with the header first and, if the CMS does not answer
//! 200, with the same token in `X-Authorization`. The channel that worked is
//! returned and used for every later CMS call of the run.

use crate::error::{Error, Result};
use crate::headers::HeaderSet;
use crate::models::CmsUser;
use crate::utils::endpoint;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::header::{AUTHORIZATION, HeaderName, HeaderValue};
use reqwest::{Client, StatusCode};
use std::fmt;
use tracing::{info, instrument, warn};
use url::Url;

/// Custom header carrying the token when `Authorization` is stripped.
pub const BYPASS_HEADER: &str = "x-authorization";

/// Account identifier and application password for the CMS.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub user: String,
    secret: String,
}

impl Credentials {
    pub fn new(user: impl Into<String>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    /// `Basic base64(user:secret)`.
    pub fn basic_token(&self) -> String {
        format!(
            "Basic {}",
            STANDARD.encode(format!("{}:{}", self.user, self.secret))
        )
    }

    /// The token as a header value flagged sensitive.
    pub fn header_value(&self) -> Result<HeaderValue> {
        let mut value = HeaderValue::from_str(&self.basic_token())?;
        value.set_sensitive(true);
        Ok(value)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// How the token is delivered to the CMS.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthChannel {
    /// Standard `Authorization` header.
    Standard(HeaderValue),
    /// `X-Authorization` header.
    Bypass(HeaderValue),
}

impl AuthChannel {
    pub fn header_name(&self) -> HeaderName {
        match self {
            AuthChannel::Standard(_) => AUTHORIZATION,
            AuthChannel::Bypass(_) => HeaderName::from_static(BYPASS_HEADER),
        }
    }

    pub fn value(&self) -> &HeaderValue {
        match self {
            AuthChannel::Standard(value) | AuthChannel::Bypass(value) => value,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuthChannel::Standard(_) => "authorization",
            AuthChannel::Bypass(_) => BYPASS_HEADER,
        }
    }
}

/// Find the authentication channel the CMS accepts.
///
/// # Errors
///
/// - [`Error::AuthRejected`] when neither probe answers 200
/// - [`Error::Network`] when a probe cannot complete (timeout, connection refused)
#[instrument(level = "info", skip_all, fields(user = %credentials.user))]
pub async fn resolve_auth_channel(
    http: &Client,
    cms_base: &Url,
    credentials: &Credentials,
) -> Result<AuthChannel> {
    let url = endpoint(cms_base, "users/me")?;
    let token = credentials.header_value()?;

    let standard = AuthChannel::Standard(token.clone());
    let standard_status = probe(http, &url, &standard).await?;
    if standard_status == StatusCode::OK {
        return Ok(standard);
    }
    warn!(
        status = %standard_status,
        "Authorization header rejected; retrying with X-Authorization"
    );

    let bypass = AuthChannel::Bypass(token);
    let bypass_status = probe(http, &url, &bypass).await?;
    if bypass_status == StatusCode::OK {
        return Ok(bypass);
    }

    Err(Error::AuthRejected {
        standard: standard_status,
        bypass: bypass_status,
    })
}

#[instrument(level = "debug", skip_all, fields(channel = channel.label()))]
async fn probe(http: &Client, url: &Url, channel: &AuthChannel) -> Result<StatusCode> {
    let headers = HeaderSet::browser().accept_json().with_auth(channel).build();
    let response = http.get(url.clone()).headers(headers).send().await?;
    let status = response.status();

    if status == StatusCode::OK {
        match response.json::<CmsUser>().await {
            Ok(user) => info!(
                channel = channel.label(),
                user_id = user.id,
                name = %user.name,
                "Authenticated against CMS"
            ),
            Err(_) => info!(channel = channel.label(), "Authenticated against CMS"),
        }
    }
    Ok(status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn credentials() -> Credentials {
        Credentials::new("user", "pass")
    }

    #[test]
    fn test_basic_token() {
        assert_eq!(credentials().basic_token(), "Basic dXNlcjpwYXNz");
    }

    #[test]
    fn test_header_value_is_sensitive() {
        assert!(credentials().header_value().unwrap().is_sensitive());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("editor", "abcd efgh ijkl"));
        assert!(rendered.contains("editor"));
        assert!(!rendered.contains("abcd"));
    }

    #[test]
    fn test_channel_header_names() {
        let value = HeaderValue::from_static("Basic x");
        assert_eq!(AuthChannel::Standard(value.clone()).header_name(), AUTHORIZATION);
        assert_eq!(
            AuthChannel::Bypass(value).header_name().as_str(),
            "x-authorization"
        );
    }

    #[tokio::test]
    async fn test_standard_channel_accepted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({ "id": 3, "name": "Urednik" })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let channel = resolve_auth_channel(&Client::new(), &base, &credentials())
            .await
            .unwrap();
        assert!(matches!(channel, AuthChannel::Standard(_)));
    }

    #[tokio::test]
    async fn test_falls_back_to_bypass_header() {
        let server = MockServer::start().await;
        // Simulates a proxy that strips Authorization: the CMS sees an anonymous request.
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header("x-authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "id": 3 })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .and(header_exists("authorization"))
            .respond_with(ResponseTemplate::new(401))
            .expect(1)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let channel = resolve_auth_channel(&Client::new(), &base, &credentials())
            .await
            .unwrap();
        assert!(matches!(channel, AuthChannel::Bypass(_)));
        assert_eq!(channel.label(), "x-authorization");
    }

    #[tokio::test]
    async fn test_both_channels_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/users/me"))
            .respond_with(ResponseTemplate::new(401))
            .expect(2)
            .mount(&server)
            .await;

        let base = Url::parse(&server.uri()).unwrap();
        let err = resolve_auth_channel(&Client::new(), &base, &credentials())
            .await
            .unwrap_err();
        match err {
            Error::AuthRejected { standard, bypass } => {
                assert_eq!(standard, StatusCode::UNAUTHORIZED);
                assert_eq!(bypass, StatusCode::UNAUTHORIZED);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
