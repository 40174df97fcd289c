//! Error taxonomy for a publish run.
//!
//! Every required step returns [`Result`]; a failure there aborts the run and
//! surfaces as a non-zero exit code. Steps that are allowed to fail without
//! invalidating the run (category lookup, featured image) return
//! [`BestEffort`] instead, which always carries a usable value.

use crate::utils::truncate_for_log;
use reqwest::{Response, StatusCode};
use thiserror::Error;

/// Result type alias for publish operations
pub type Result<T> = std::result::Result<T, Error>;

/// Exit code for configuration errors.
pub const EXIT_CONFIG: u8 = 2;
/// Exit code for every other unrecoverable failure.
pub const EXIT_FAILURE: u8 = 1;

/// Main error type for a publish run.
#[derive(Debug, Error)]
pub enum Error {
    /// A required configuration key is absent or empty
    #[error("missing configuration: {0} is not set")]
    MissingConfig(&'static str),

    /// A configuration key is present but unusable
    #[error("invalid configuration for {key}: {message}")]
    InvalidConfig {
        /// The offending key (e.g. "WP_API_URL")
        key: String,
        /// Why the value was rejected
        message: String,
    },

    /// The settings file could not be read
    #[error("failed to read settings file {path}: {source}")]
    ConfigFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The settings file is not valid YAML for [`crate::config::FileSettings`]
    #[error("failed to parse settings file {path}: {source}")]
    ConfigParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    /// The CMS refused both authentication delivery channels
    #[error(
        "CMS rejected authentication on both channels (Authorization: {standard}, X-Authorization: {bypass})"
    )]
    AuthRejected {
        standard: StatusCode,
        bypass: StatusCode,
    },

    /// Connection failure, timeout or body read failure
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A remote endpoint answered with a status the step does not accept
    #[error("unexpected status {status} from {endpoint}: {body}")]
    UnexpectedStatus {
        endpoint: &'static str,
        status: StatusCode,
        /// Truncated response body, for the log
        body: String,
    },

    /// JSON encoding or decoding failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// An image URL served something other than an image
    #[error("image URL served {content_type:?} instead of an image")]
    NotAnImage { content_type: String },

    /// The category search returned no results
    #[error("no CMS category matches {0:?}")]
    CategoryNotFound(String),

    /// A header value could not be constructed
    #[error("invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    /// A URL could not be parsed or extended
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
}

impl Error {
    /// Whether this error comes from configuration rather than the run itself.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Error::MissingConfig(_)
                | Error::InvalidConfig { .. }
                | Error::ConfigFile { .. }
                | Error::ConfigParse { .. }
        )
    }

    /// Turn a rejected response into [`Error::UnexpectedStatus`], keeping a
    /// short body preview for the log.
    pub async fn from_response(endpoint: &'static str, response: Response) -> Self {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        Error::UnexpectedStatus {
            endpoint,
            status,
            body: truncate_for_log(&body, 300),
        }
    }

    /// Process exit code reported to the invoking scheduler.
    pub fn exit_code(&self) -> u8 {
        if self.is_config() {
            EXIT_CONFIG
        } else {
            EXIT_FAILURE
        }
    }
}

/// Outcome of a step that may degrade instead of failing.
///
/// `Defaulted` keeps the cause so the caller can log it, but the value is
/// always usable and the run continues.
#[derive(Debug)]
pub enum BestEffort<T> {
    /// The step produced its value.
    Resolved(T),
    /// The step failed; `value` is the documented default.
    Defaulted { value: T, cause: Error },
}

impl<T> BestEffort<T> {
    /// Fold a fallible step into a best-effort outcome.
    pub fn from_result(result: Result<T>, default: T) -> Self {
        match result {
            Ok(value) => BestEffort::Resolved(value),
            Err(cause) => BestEffort::Defaulted {
                value: default,
                cause,
            },
        }
    }

    /// The cause of degradation, if any.
    pub fn cause(&self) -> Option<&Error> {
        match self {
            BestEffort::Resolved(_) => None,
            BestEffort::Defaulted { cause, .. } => Some(cause),
        }
    }

    pub fn into_value(self) -> T {
        match self {
            BestEffort::Resolved(value) | BestEffort::Defaulted { value, .. } => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(Error::MissingConfig("WP_USER").exit_code(), EXIT_CONFIG);
        assert_eq!(
            Error::InvalidConfig {
                key: "WP_API_URL".to_string(),
                message: "bad".to_string(),
            }
            .exit_code(),
            EXIT_CONFIG
        );
        assert_eq!(
            Error::AuthRejected {
                standard: StatusCode::UNAUTHORIZED,
                bypass: StatusCode::FORBIDDEN,
            }
            .exit_code(),
            EXIT_FAILURE
        );
    }

    #[test]
    fn test_missing_config_names_key() {
        let err = Error::MissingConfig("WP_APP_PASSWORD");
        assert!(err.to_string().contains("WP_APP_PASSWORD"));
    }

    #[test]
    fn test_best_effort_from_result() {
        let ok: BestEffort<u64> = BestEffort::from_result(Ok(7), 1);
        assert!(ok.cause().is_none());
        assert_eq!(ok.into_value(), 7);

        let failed: BestEffort<u64> =
            BestEffort::from_result(Err(Error::CategoryNotFound("Vesti".to_string())), 1);
        assert!(matches!(failed.cause(), Some(Error::CategoryNotFound(_))));
        assert_eq!(failed.into_value(), 1);
    }
}
