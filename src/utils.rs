//! Utility functions for URL building, log previews and media naming.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use url::Url;

/// Truncate a string for logging purposes.
///
/// Long strings are cut at the last character boundary at or before `max`
/// bytes, with an ellipsis and the number of dropped bytes appended.
///
/// # Examples
///
/// ```ignore
/// assert_eq!(truncate_for_log("short", 100), "short");
/// assert_eq!(truncate_for_log(&"a".repeat(500), 10), "aaaaaaaaaa…(+490 bytes)");
/// ```
pub fn truncate_for_log(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    let mut cut = max;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}…(+{} bytes)", &s[..cut], s.len() - cut)
}

/// Append `path` (slash separated) to the path of `base`.
///
/// Unlike [`Url::join`], the last segment of `base` is kept whether or not it
/// ends with a slash, so `https://site/wp-json/wp/v2` + `users/me` gives
/// `https://site/wp-json/wp/v2/users/me`.
pub fn endpoint(base: &Url, path: &str) -> Result<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| Error::InvalidConfig {
            key: base.to_string(),
            message: "URL cannot be used as a base".to_string(),
        })?
        .pop_if_empty()
        .extend(path.split('/').filter(|segment| !segment.is_empty()));
    Ok(url)
}

/// File extension matching an image content type.
pub fn extension_for_content_type(content_type: &str) -> Option<&'static str> {
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    match essence.as_str() {
        "image/jpeg" | "image/jpg" | "image/pjpeg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/gif" => Some("gif"),
        "image/webp" => Some("webp"),
        "image/avif" => Some("avif"),
        _ => None,
    }
}

/// Content type for an image file extension.
pub fn content_type_for_extension(extension: &str) -> Option<&'static str> {
    match extension.to_ascii_lowercase().as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// Content type guessed from the extension in an image URL's path.
pub fn content_type_for_url(image_url: &str) -> Option<&'static str> {
    let url = Url::parse(image_url).ok()?;
    let (_, extension) = url.path().rsplit_once('.')?;
    content_type_for_extension(extension)
}

/// Collision-free upload filename, e.g. `news-20261019-081502-123.jpg`.
pub fn media_filename(now: DateTime<Utc>, extension: &str) -> String {
    format!("news-{}.{}", now.format("%Y%m%d-%H%M%S-%3f"), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_truncate_for_log_short_string() {
        let s = "Hello, world!";
        assert_eq!(truncate_for_log(s, 100), "Hello, world!");
    }

    #[test]
    fn test_truncate_for_log_long_string() {
        let s = "a".repeat(500);
        let result = truncate_for_log(&s, 100);
        assert!(result.starts_with(&"a".repeat(100)));
        assert!(result.contains("…(+400 bytes)"));
    }

    #[test]
    fn test_truncate_for_log_respects_char_boundaries() {
        // "š" is two bytes; cutting at 3 would split the second one.
        let result = truncate_for_log("šššš", 3);
        assert_eq!(result, "š…(+6 bytes)");
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let base = Url::parse("https://site.example/wp-json/wp/v2").unwrap();
        assert_eq!(
            endpoint(&base, "users/me").unwrap().as_str(),
            "https://site.example/wp-json/wp/v2/users/me"
        );

        let slashed = Url::parse("https://portal.example/api/").unwrap();
        assert_eq!(
            endpoint(&slashed, "get_latest.php").unwrap().as_str(),
            "https://portal.example/api/get_latest.php"
        );
    }

    #[test]
    fn test_endpoint_on_bare_host() {
        let base = Url::parse("http://127.0.0.1:8080").unwrap();
        assert_eq!(
            endpoint(&base, "posts").unwrap().as_str(),
            "http://127.0.0.1:8080/posts"
        );
    }

    #[test]
    fn test_endpoint_rejects_opaque_url() {
        let base = Url::parse("mailto:editor@example.com").unwrap();
        assert!(matches!(
            endpoint(&base, "posts"),
            Err(Error::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_extension_for_content_type() {
        assert_eq!(extension_for_content_type("image/jpeg"), Some("jpg"));
        assert_eq!(extension_for_content_type("image/PNG; charset=binary"), Some("png"));
        assert_eq!(extension_for_content_type("text/html"), None);
    }

    #[test]
    fn test_content_type_for_url() {
        assert_eq!(
            content_type_for_url("https://img.example/photos/a.JPEG?w=800"),
            Some("image/jpeg")
        );
        assert_eq!(content_type_for_url("https://img.example/a.webp"), Some("image/webp"));
        assert_eq!(content_type_for_url("https://img.example/image"), None);
        assert_eq!(content_type_for_url("not a url"), None);
    }

    #[test]
    fn test_media_filename() {
        let now = Utc.with_ymd_and_hms(2026, 10, 19, 8, 15, 2).unwrap();
        assert_eq!(media_filename(now, "png"), "news-20261019-081502-000.png");
    }
}
