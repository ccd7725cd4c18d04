use reqwest::StatusCode;

use crate::context::Interruption;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Invalid client configuration, reported at construction time.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// No response was received: connection, DNS, TLS, timeout or cancellation.
    #[error("failed to call {url}: transport error: {source}")]
    Transport {
        url: String,
        #[source]
        source: TransportFailure,
    },
    /// Response status >= 400 with the raw response body.
    #[error("failed to call {url}: http error {status}: {body}")]
    Http {
        url: String,
        status: StatusCode,
        body: String,
    },
    /// Request payload encoding, response read, or response JSON decoding failed.
    #[error("failed to call {url}: body error: {source}")]
    Body {
        url: String,
        #[source]
        source: BodyFailure,
    },
}

/// Construction-time configuration failures.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("timeout has to be larger than 0")]
    InvalidTimeout,
    #[error("max attempts has to be larger than 0")]
    InvalidMaxAttempts,
    #[error("base delay has to be larger than 0")]
    InvalidBaseDelay,
    #[error("factor has to be a finite number larger than 0")]
    InvalidFactor,
    #[error("invalid default header '{name}'")]
    InvalidHeader { name: String },
    /// `Content-Type` and `Accept` are always `application/json`.
    #[error("default header '{name}' conflicts with the JSON wire contract")]
    ReservedHeader { name: String },
    #[error("environment variable {name} has invalid value '{value}'")]
    Env { name: String, value: String },
}

#[derive(Debug, thiserror::Error)]
pub enum TransportFailure {
    #[error(transparent)]
    Request(reqwest::Error),
    #[error("call cancelled")]
    Cancelled,
    #[error("call deadline exceeded")]
    DeadlineExceeded,
}

#[derive(Debug, thiserror::Error)]
pub enum BodyFailure {
    #[error("request body encode error: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("response read error: {0}")]
    Read(#[source] reqwest::Error),
    #[error("response decode error: {0}")]
    Decode(#[source] serde_json::Error),
}

impl From<Interruption> for TransportFailure {
    fn from(reason: Interruption) -> Self {
        match reason {
            Interruption::Cancelled => Self::Cancelled,
            Interruption::DeadlineExceeded => Self::DeadlineExceeded,
        }
    }
}

impl ClientError {
    /// Target URL of the failed call; `None` for configuration errors.
    pub fn url(&self) -> Option<&str> {
        match self {
            Self::Config(_) => None,
            Self::Transport { url, .. } | Self::Http { url, .. } | Self::Body { url, .. } => {
                Some(url)
            }
        }
    }

    /// HTTP status for [`ClientError::Http`].
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    pub fn is_body(&self) -> bool {
        matches!(self, Self::Body { .. })
    }

    /// True when the call was aborted by its [`crate::CallContext`].
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            Self::Transport {
                source: TransportFailure::Cancelled | TransportFailure::DeadlineExceeded,
                ..
            }
        )
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error as _;

    use reqwest::StatusCode;

    use super::{ClientError, ConfigError, TransportFailure};
    use crate::context::Interruption;

    #[test]
    fn http_error_exposes_status_and_url() {
        let err = ClientError::Http {
            url: "http://svc/items/9".to_owned(),
            status: StatusCode::NOT_FOUND,
            body: "{\"error\":\"missing\"}".to_owned(),
        };
        assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(err.url(), Some("http://svc/items/9"));
        assert!(err.is_http());
        assert_eq!(
            err.to_string(),
            "failed to call http://svc/items/9: http error 404 Not Found: {\"error\":\"missing\"}"
        );
    }

    #[test]
    fn interruption_maps_to_cancellation_transport_error() {
        let err = ClientError::Transport {
            url: "http://svc".to_owned(),
            source: Interruption::DeadlineExceeded.into(),
        };
        assert!(err.is_transport());
        assert!(err.is_cancelled());
        assert!(matches!(
            err.source().and_then(|s| s.downcast_ref::<TransportFailure>()),
            Some(TransportFailure::DeadlineExceeded)
        ));
    }

    #[test]
    fn config_error_has_no_url() {
        let err = ClientError::from(ConfigError::InvalidTimeout);
        assert_eq!(err.url(), None);
        assert_eq!(
            err.to_string(),
            "invalid configuration: timeout has to be larger than 0"
        );
    }
}
