//! Run configuration.
//!
//! [`Config`] is built once at startup from three sources, highest precedence
//! first: command-line overrides, injected key-value pairs (the process
//! environment in production) and an optional YAML settings file. Missing
//! credentials fail fast with [`Error::MissingConfig`] naming the key.
//!
//! # Keys
//!
//! | Key | Required | Default |
//! |-----|----------|---------|
//! | `WP_USER` | yes | |
//! | `WP_APP_PASSWORD` | yes | |
//! | `PORTAL_API_URL` | no | [`DEFAULT_PORTAL_URL`] |
//! | `WP_API_URL` | no | [`DEFAULT_CMS_URL`] |
//! | `WP_CATEGORY` | no | [`DEFAULT_CATEGORY`] |
//! | `WP_FALLBACK_CATEGORY_ID` | no | `1` |
//! | `HTTP_TIMEOUT_SECS` | no | `30` |

use crate::auth::Credentials;
use crate::cli::Cli;
use crate::error::{Error, Result};
use crate::models::CategoryId;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

pub const KEY_USER: &str = "WP_USER";
pub const KEY_APP_PASSWORD: &str = "WP_APP_PASSWORD";
pub const KEY_PORTAL_URL: &str = "PORTAL_API_URL";
pub const KEY_CMS_URL: &str = "WP_API_URL";
pub const KEY_CATEGORY: &str = "WP_CATEGORY";
pub const KEY_FALLBACK_CATEGORY: &str = "WP_FALLBACK_CATEGORY_ID";
pub const KEY_TIMEOUT: &str = "HTTP_TIMEOUT_SECS";

pub const DEFAULT_PORTAL_URL: &str = "https://portal.sokobanja.org.rs/api";
pub const DEFAULT_CMS_URL: &str = "https://sokobanja.org.rs/wp-json/wp/v2";
pub const DEFAULT_CATEGORY: &str = "Vesti";
pub const DEFAULT_FALLBACK_CATEGORY: u64 = 1;
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Optional YAML settings file. Secrets are never read from it.
///
/// ```yaml
/// portal_url: https://portal.example/api
/// cms_url: https://blog.example/wp-json/wp/v2
/// category: Vesti
/// fallback_category_id: 1
/// timeout_secs: 20
/// ```
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileSettings {
    pub portal_url: Option<String>,
    pub cms_url: Option<String>,
    pub category: Option<String>,
    pub fallback_category_id: Option<u64>,
    pub timeout_secs: Option<u64>,
}

impl FileSettings {
    #[instrument(level = "debug", skip_all, fields(path = %path.display()))]
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|source| Error::ConfigFile {
            path: path.display().to_string(),
            source,
        })?;
        let settings = serde_yaml::from_str(&raw).map_err(|source| Error::ConfigParse {
            path: path.display().to_string(),
            source,
        })?;
        debug!(?settings, "Loaded settings file");
        Ok(settings)
    }
}

/// Everything a run needs, resolved and validated.
#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub portal_url: Url,
    pub cms_url: Url,
    pub category: String,
    pub fallback_category: CategoryId,
    pub timeout: Duration,
}

impl Config {
    /// Build from the process environment and the command line.
    pub fn load(cli: &Cli) -> Result<Self> {
        Self::from_sources(std::env::vars(), cli)
    }

    /// Build from injected key-value pairs and the command line.
    pub fn from_sources<I, K, V>(vars: I, cli: &Cli) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let file = match &cli.config {
            Some(path) => FileSettings::load(path)?,
            None => FileSettings::default(),
        };
        let mut config = Self::from_vars(vars, file)?;
        if let Some(category) = cli.category.as_deref().and_then(non_blank) {
            config.category = category;
        }
        Ok(config)
    }

    /// Build from key-value pairs layered over a settings file.
    ///
    /// Empty or whitespace-only values count as absent.
    pub fn from_vars<I, K, V>(vars: I, file: FileSettings) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: HashMap<String, String> = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let lookup = |key: &str| vars.get(key).and_then(|v| non_blank(v));

        let user = lookup(KEY_USER).ok_or(Error::MissingConfig(KEY_USER))?;
        // Application passwords contain significant spaces; only reject blank ones.
        let secret = vars
            .get(KEY_APP_PASSWORD)
            .filter(|v| !v.trim().is_empty())
            .cloned()
            .ok_or(Error::MissingConfig(KEY_APP_PASSWORD))?;

        let portal_url = parse_base_url(
            KEY_PORTAL_URL,
            lookup(KEY_PORTAL_URL)
                .or(file.portal_url.as_deref().and_then(non_blank))
                .as_deref()
                .unwrap_or(DEFAULT_PORTAL_URL),
        )?;
        let cms_url = parse_base_url(
            KEY_CMS_URL,
            lookup(KEY_CMS_URL)
                .or(file.cms_url.as_deref().and_then(non_blank))
                .as_deref()
                .unwrap_or(DEFAULT_CMS_URL),
        )?;

        let category = lookup(KEY_CATEGORY)
            .or(file.category.as_deref().and_then(non_blank))
            .unwrap_or_else(|| DEFAULT_CATEGORY.to_string());

        let fallback_category = match lookup(KEY_FALLBACK_CATEGORY) {
            Some(raw) => parse_positive(KEY_FALLBACK_CATEGORY, &raw)?,
            None => positive(
                KEY_FALLBACK_CATEGORY,
                file.fallback_category_id.unwrap_or(DEFAULT_FALLBACK_CATEGORY),
            )?,
        };
        let timeout_secs = match lookup(KEY_TIMEOUT) {
            Some(raw) => parse_positive(KEY_TIMEOUT, &raw)?,
            None => positive(
                KEY_TIMEOUT,
                file.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS),
            )?,
        };

        Ok(Self {
            credentials: Credentials::new(user, secret),
            portal_url,
            cms_url,
            category,
            fallback_category: CategoryId(fallback_category),
            timeout: Duration::from_secs(timeout_secs),
        })
    }
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_base_url(key: &str, raw: &str) -> Result<Url> {
    let url = Url::parse(raw).map_err(|e| Error::InvalidConfig {
        key: key.to_string(),
        message: format!("{raw:?} is not a URL: {e}"),
    })?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(Error::InvalidConfig {
            key: key.to_string(),
            message: format!("{raw:?} is not an http(s) base URL"),
        });
    }
    Ok(url)
}

fn parse_positive(key: &str, raw: &str) -> Result<u64> {
    let value = raw.parse::<u64>().map_err(|e| Error::InvalidConfig {
        key: key.to_string(),
        message: format!("{raw:?} is not a positive integer: {e}"),
    })?;
    positive(key, value)
}

fn positive(key: &str, value: u64) -> Result<u64> {
    if value == 0 {
        return Err(Error::InvalidConfig {
            key: key.to_string(),
            message: "must be greater than zero".to_string(),
        });
    }
    Ok(value)
}
