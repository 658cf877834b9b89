//! Error type for backend calls.
//!
//! The backend attaches a human-readable `detail` string to most error
//! responses; user-facing messages always prefer it over generic text.

use serde::Deserialize;
use std::fmt;

/// Failure of a single backend operation.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status, when the server produced a response at all.
    pub status: Option<u16>,
    /// Server-provided detail string, when present.
    pub detail: Option<String>,
    /// Fallback description (transport error text or a generic message).
    pub message: String,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    detail: Option<String>,
}

impl ApiError {
    /// Build from a non-success HTTP response, consuming the body to pull
    /// out the `detail` field when the server sent one.
    pub async fn from_response(response: reqwest::Response) -> Self {
        let status = response.status().as_u16();
        let detail = match response.text().await {
            Ok(body) => serde_json::from_str::<ErrorBody>(&body)
                .ok()
                .and_then(|b| b.detail),
            Err(_) => None,
        };
        Self {
            status: Some(status),
            detail,
            message: format!("server responded with status {status}"),
        }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        Self {
            status: err.status().map(|s| s.as_u16()),
            detail: None,
            message: err.to_string(),
        }
    }

    pub fn other(message: impl Into<String>) -> Self {
        Self {
            status: None,
            detail: None,
            message: message.into(),
        }
    }

    /// Active report already exists for the project.
    pub fn is_conflict(&self) -> bool {
        self.status == Some(409)
    }

    pub fn is_not_found(&self) -> bool {
        self.status == Some(404)
    }

    /// The most specific message available: server detail first.
    pub fn user_message(&self) -> &str {
        self.detail.as_deref().unwrap_or(&self.message)
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.user_message())
    }
}

impl std::error::Error for ApiError {}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        Self::transport(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_message_prefers_server_detail() {
        let err = ApiError {
            status: Some(409),
            detail: Some("An active report already exists.".into()),
            message: "server responded with status 409".into(),
        };
        assert!(err.is_conflict());
        assert_eq!(err.user_message(), "An active report already exists.");

        let bare = ApiError {
            status: Some(500),
            detail: None,
            message: "server responded with status 500".into(),
        };
        assert_eq!(bare.user_message(), "server responded with status 500");
    }
}
