use reqwest::StatusCode;
use thiserror::Error;

/// Failures of a single call from the terminal client to the tutor API.
#[derive(Error, Debug)]
pub enum ClientError {
    /// The service could not be reached at all: refused connection or timeout.
    #[error("could not connect to the API server at {url}: {reason}")]
    Connectivity { url: String, reason: String },

    /// The service answered with an error status.
    #[error("the server answered {status}: {detail}")]
    Service { status: StatusCode, detail: String },

    /// The service answered 2xx but the body was not a structured response.
    #[error("unexpected response from the server: {0}")]
    Decode(String),

    /// Anything else the HTTP layer reports.
    #[error("request failed: {0}")]
    Request(String),
}

impl ClientError {
    /// Classifies a transport error for the request sent to `url`.
    pub fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            ClientError::Connectivity {
                url: url.to_string(),
                reason: format!("request timed out: {}", err),
            }
        } else if err.is_connect() {
            ClientError::Connectivity {
                url: url.to_string(),
                reason: format!("connection failed: {}", err),
            }
        } else if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::Request(err.to_string())
        }
    }

    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Connectivity { .. })
    }
}
