use crate::ratelimit::RateLimitScope;
use reqwest::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("missing user ID")]
    MissingUserId,

    #[error("missing bucket")]
    MissingBucket,

    /// A global set operation was called without `global: Some(true)`.
    #[error("global must be true for global {} rate limit", .0.describe())]
    GlobalRequired(RateLimitScope),

    #[error("{0}")]
    Config(String),

    #[error("request to radosgw failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx answer from the gateway. `code` is the gateway's `Code` when it sent one.
    #[error("radosgw returned {status} ({code}): {message}")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
    },

    #[error("failed to unmarshal radosgw http response. {body}. {source}")]
    Decode {
        body: String,
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Whether a caller may reasonably try the same request again.
    /// The client itself never retries.
    pub fn is_retriable(&self) -> bool {
        match self {
            Error::Transport(_) => true,
            Error::Api { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            _ => false,
        }
    }

    /// True for errors raised locally before any request was sent.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Error::MissingUserId | Error::MissingBucket | Error::GlobalRequired(_)
        )
    }
}
