use serde::Serialize;
use thiserror::Error;

/// Failure reported by a data collaborator (page source or subject source).
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourceError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("not found: {0}")]
    NotFound(String),
}

impl From<reqwest::Error> for SourceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            SourceError::Decode(e.to_string())
        } else {
            SourceError::Network(e.to_string())
        }
    }
}

/// The single error surfaced on the read-model.
#[derive(Debug, Clone, PartialEq, Serialize, Error)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum FeedError {
    #[error("subject lookup failed: {0}")]
    Subject(SourceError),

    #[error("subject list lookup failed: {0}")]
    SubjectList(SourceError),

    #[error("page {page} failed: {source}")]
    Page { page: u32, source: SourceError },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_name_the_failing_step() {
        let e = FeedError::Page {
            page: 3,
            source: SourceError::Status { status: 502, message: "bad gateway".into() },
        };
        assert_eq!(e.to_string(), "page 3 failed: server returned 502: bad gateway");
        let e = FeedError::Subject(SourceError::NotFound("acc-1".into()));
        assert_eq!(e.to_string(), "subject lookup failed: not found: acc-1");
    }
}
