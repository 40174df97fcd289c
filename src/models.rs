//! Data models exchanged with the portal and the CMS.
//!
//! - [`PendingArticle`]: the single article the portal wants published
//! - [`PostPayload`]: the JSON body submitted to the CMS posts endpoint
//! - [`PublishedPost`], [`CmsCategory`], [`CmsUser`], [`CreatedMedia`]: CMS responses

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Identifier of a portal article.
///
/// The portal has returned both numeric and string ids; whichever form
/// arrives is echoed back unchanged when acknowledging.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum ArticleId {
    Number(i64),
    Text(String),
}

impl fmt::Display for ArticleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArticleId::Number(n) => write!(f, "{n}"),
            ArticleId::Text(s) => f.write_str(s),
        }
    }
}

/// CMS category identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct CategoryId(pub u64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// CMS media library identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct MediaId(pub u64);

impl fmt::Display for MediaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An article waiting in the portal's queue.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PendingArticle {
    pub id: ArticleId,
    #[serde(default)]
    pub title: String,
    /// HTML body, produced upstream and passed through untouched.
    #[serde(default)]
    pub content: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub image_url: Option<String>,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty()))
}

/// Publication status of a post. Only `publish` is ever sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    Publish,
}

/// Body of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostPayload {
    pub title: String,
    pub content: String,
    pub status: PostStatus,
    pub categories: Vec<CategoryId>,
    /// Omitted from the JSON when the article has no uploaded image.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_media: Option<MediaId>,
}

impl PostPayload {
    pub fn for_article(
        article: &PendingArticle,
        category: CategoryId,
        media: Option<MediaId>,
    ) -> Self {
        Self {
            title: article.title.clone(),
            content: article.content.clone(),
            status: PostStatus::Publish,
            categories: vec![category],
            featured_media: media,
        }
    }
}

/// Response of `POST /posts`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PublishedPost {
    pub id: u64,
    /// Permalink of the published post.
    #[serde(default)]
    pub link: Option<String>,
}

/// One entry of `GET /categories?search=`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CmsCategory {
    pub id: CategoryId,
    #[serde(default)]
    pub name: String,
}

/// Response of `POST /media`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedMedia {
    pub id: MediaId,
}

/// Response of `GET /users/me`; only used for the log line.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CmsUser {
    pub id: u64,
    #[serde(default)]
    pub name: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn article(image_url: Option<&str>) -> PendingArticle {
        PendingArticle {
            id: ArticleId::Number(42),
            title: "T".to_string(),
            content: "C".to_string(),
            image_url: image_url.map(str::to_string),
        }
    }

    #[test]
    fn test_pending_article_numeric_id() {
        let parsed: PendingArticle = serde_json::from_value(json!({
            "id": 42,
            "title": "T",
            "content": "<p>C</p>",
            "image_url": null
        }))
        .unwrap();
        assert_eq!(parsed.id, ArticleId::Number(42));
        assert_eq!(parsed.content, "<p>C</p>");
        assert_eq!(parsed.image_url, None);
    }

    #[test]
    fn test_pending_article_string_id_and_missing_fields() {
        let parsed: PendingArticle = serde_json::from_value(json!({ "id": "a-17" })).unwrap();
        assert_eq!(parsed.id, ArticleId::Text("a-17".to_string()));
        assert_eq!(parsed.id.to_string(), "a-17");
        assert_eq!(parsed.title, "");
        assert_eq!(parsed.image_url, None);
    }

    #[test]
    fn test_blank_image_url_is_absent() {
        let parsed: PendingArticle =
            serde_json::from_value(json!({ "id": 1, "image_url": "   " })).unwrap();
        assert_eq!(parsed.image_url, None);

        let parsed: PendingArticle = serde_json::from_value(json!({
            "id": 1,
            "image_url": " https://img.example/a.jpg "
        }))
        .unwrap();
        assert_eq!(parsed.image_url.as_deref(), Some("https://img.example/a.jpg"));
    }

    #[test]
    fn test_payload_omits_featured_media_without_image() {
        let payload = PostPayload::for_article(&article(None), CategoryId(1), None);
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            value,
            json!({
                "title": "T",
                "content": "C",
                "status": "publish",
                "categories": [1]
            })
        );
        assert!(value.get("featured_media").is_none());
    }

    #[test]
    fn test_payload_includes_featured_media() {
        let payload = PostPayload::for_article(
            &article(Some("https://img.example/a.jpg")),
            CategoryId(5),
            Some(MediaId(900)),
        );
        let value = serde_json::to_value(&payload).unwrap();
        assert_eq!(value["featured_media"], json!(900));
        assert_eq!(value["categories"], json!([5]));
    }

    #[test]
    fn test_article_id_serializes_in_original_form() {
        assert_eq!(serde_json::to_value(ArticleId::Number(3)).unwrap(), json!(3));
        assert_eq!(
            serde_json::to_value(ArticleId::Text("x".to_string())).unwrap(),
            json!("x")
        );
    }
}
