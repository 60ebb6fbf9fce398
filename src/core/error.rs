//! Typed error handling for the ipms client
//!
//! Every failure a store operation can hit is a [`ClientError`]. The store
//! keeps the last one in its state, so the type is `Clone` and carries owned
//! messages rather than source errors.
//!
//! # Error Categories
//!
//! - [`ClientError::Transport`]: no response was received
//! - [`ClientError::Server`]: the backend answered with a non-2xx status
//! - [`ClientError::MalformedResponse`]: a 2xx answer that cannot be used
//!   (missing `x-total-count`, undecodable body)
//! - [`ClientError::Validation`] / [`ClientError::MissingId`]: rejected
//!   before anything is sent
//!
//! # Example
//!
//! ```rust,ignore
//! match store.fetch_list(QueryParams::default()).await {
//!     Ok(page) => println!("{} incidents", page.len()),
//!     Err(ClientError::MalformedResponse { message }) => eprintln!("bad page: {}", message),
//!     Err(e) => eprintln!("request failed: {}", e),
//! }
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for client operations
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// The error type for every request issued through a resource client or store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ClientError {
    /// The request never produced a response (connection refused, timeout, ...)
    #[error("Transport error: {message}")]
    Transport { message: String },

    /// The backend answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Server { status: u16, message: String },

    /// The backend answered successfully but the response is unusable
    #[error("Malformed response: {message}")]
    MalformedResponse { message: String },

    /// A record could not be encoded for sending
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// A record failed pre-flight validation
    #[error("Validation failed for {resource}: {message}")]
    Validation { resource: String, message: String },

    /// An operation addressing a single record was given one without an id
    #[error("{resource} has no id; cannot {operation}")]
    MissingId {
        resource: String,
        operation: &'static str,
    },
}

impl ClientError {
    /// Short machine-readable code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            ClientError::Transport { .. } => "TRANSPORT_ERROR",
            ClientError::Server { .. } => "SERVER_ERROR",
            ClientError::MalformedResponse { .. } => "MALFORMED_RESPONSE",
            ClientError::Serialization { .. } => "SERIALIZATION_ERROR",
            ClientError::Validation { .. } => "VALIDATION_ERROR",
            ClientError::MissingId { .. } => "MISSING_ID",
        }
    }

    /// HTTP status of a server error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Server { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        ClientError::MalformedResponse {
            message: message.into(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>) -> Self {
        ClientError::Transport {
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Serialization {
            message: err.to_string(),
        }
    }
}

/// Problem-style error body exchanged with the backend
///
/// The backend fills `title` and `detail`; older deployments send only
/// `message`, so every field is optional on the way in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Problem {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Problem {
    /// The most specific human-readable message the body carries
    pub fn best_message(&self) -> Option<&str> {
        self.detail
            .as_deref()
            .or(self.title.as_deref())
            .or(self.message.as_deref())
            .filter(|m| !m.is_empty())
    }
}
