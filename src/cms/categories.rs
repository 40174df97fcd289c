//! Category lookup by display name.

use super::CmsClient;
use crate::error::{BestEffort, Error, Result};
use crate::models::{CategoryId, CmsCategory};
use reqwest::StatusCode;
use tracing::{debug, info, instrument};

impl CmsClient {
    /// Resolve `name` to a category id, falling back to `fallback` on any failure.
    #[instrument(level = "info", skip(self))]
    pub async fn resolve_category(&self, name: &str, fallback: CategoryId) -> BestEffort<CategoryId> {
        let outcome = BestEffort::from_result(self.search_category(name).await, fallback);
        if let BestEffort::Resolved(id) = &outcome {
            info!(%id, "Resolved category");
        }
        outcome
    }

    async fn search_category(&self, name: &str) -> Result<CategoryId> {
        let mut url = self.url("categories")?;
        url.query_pairs_mut().append_pair("search", name);

        let response = self
            .http
            .get(url)
            .headers(self.headers().build())
            .send()
            .await?;
        if response.status() != StatusCode::OK {
            return Err(Error::from_response("categories", response).await);
        }

        let categories: Vec<CmsCategory> = serde_json::from_str(&response.text().await?)?;
        let category = categories
            .into_iter()
            .next()
            .ok_or_else(|| Error::CategoryNotFound(name.to_string()))?;
        debug!(id = %category.id, matched = %category.name, "Category search hit");
        Ok(category.id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthChannel;
    use reqwest::Client;
    use reqwest::header::HeaderValue;
    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> CmsClient {
        CmsClient::new(
            Client::new(),
            Url::parse(&server.uri()).unwrap(),
            AuthChannel::Standard(HeaderValue::from_static("Basic dXNlcjpwYXNz")),
        )
    }

    #[tokio::test]
    async fn test_first_match_wins() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .and(query_param("search", "Vesti iz grada"))
            .and(header("authorization", "Basic dXNlcjpwYXNz"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "id": 14, "name": "Vesti iz grada" },
                { "id": 15, "name": "Vesti iz grada i okoline" }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let outcome = client_for(&server)
            .resolve_category("Vesti iz grada", CategoryId(1))
            .await;
        assert!(outcome.cause().is_none());
        assert_eq!(outcome.into_value(), CategoryId(14));
    }

    #[tokio::test]
    async fn test_empty_result_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .mount(&server)
            .await;

        let outcome = client_for(&server).resolve_category("Nepostojeca", CategoryId(1)).await;
        assert!(matches!(outcome.cause(), Some(Error::CategoryNotFound(_))));
        assert_eq!(outcome.into_value(), CategoryId(1));
    }

    #[tokio::test]
    async fn test_error_status_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let outcome = client_for(&server).resolve_category("Vesti", CategoryId(3)).await;
        assert!(matches!(outcome.cause(), Some(Error::UnexpectedStatus { .. })));
        assert_eq!(outcome.into_value(), CategoryId(3));
    }

    #[tokio::test]
    async fn test_garbage_body_falls_back() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/categories"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html></html>"))
            .mount(&server)
            .await;

        let outcome = client_for(&server).resolve_category("Vesti", CategoryId(1)).await;
        assert!(matches!(outcome.cause(), Some(Error::Serialization(_))));
        assert_eq!(outcome.into_value(), CategoryId(1));
    }
}
