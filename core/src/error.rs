//! Error types for the grocery API client.
//!
//! # Design
//! Every non-2xx response becomes `ApiError::Http` carrying a human-readable
//! `message` already normalized from the server's error body, the status and
//! the raw body. Callers that need to branch on the class of failure use
//! `ApiError::kind()` instead of matching on status codes.

use thiserror::Error;

/// Errors returned by `GroceryClient` parse methods and the `Api` facade.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The server answered with a non-2xx status.
    #[error("{message}")]
    Http {
        message: String,
        status: u16,
        body: String,
    },

    /// No response was received.
    #[error("network error: {0}")]
    Network(String),

    /// A body was required but the response had none.
    #[error("response had no content")]
    MissingContent,

    /// The response body could not be deserialized into the expected type.
    #[error("deserialization failed: {0}")]
    Deserialization(String),

    /// The request payload could not be serialized.
    #[error("serialization failed: {0}")]
    Serialization(String),
}

/// Coarse classification used for user-facing messaging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Rejected locally before any request was sent, or 422 from the server.
    Validation,
    Authentication,
    /// Duplicate resource, e.g. an email that is already registered.
    Conflict,
    NotFound,
    Server,
    Network,
    Client,
    Protocol,
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Http {
                status, message, ..
            } => match *status {
                401 | 403 => ErrorKind::Authentication,
                404 => ErrorKind::NotFound,
                409 => ErrorKind::Conflict,
                400 if message.contains("already exists") => ErrorKind::Conflict,
                422 => ErrorKind::Validation,
                500..=599 => ErrorKind::Server,
                _ => ErrorKind::Client,
            },
            ApiError::Network(_) => ErrorKind::Network,
            ApiError::MissingContent
            | ApiError::Deserialization(_)
            | ApiError::Serialization(_) => ErrorKind::Protocol,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16, message: &str) -> ApiError {
        ApiError::Http {
            message: message.to_string(),
            status,
            body: String::new(),
        }
    }

    #[test]
    fn display_is_the_normalized_message() {
        assert_eq!(http(400, "name: field required").to_string(), "name: field required");
    }

    #[test]
    fn kinds_follow_status_classes() {
        assert_eq!(http(401, "x").kind(), ErrorKind::Authentication);
        assert_eq!(http(404, "x").kind(), ErrorKind::NotFound);
        assert_eq!(http(422, "x").kind(), ErrorKind::Validation);
        assert_eq!(http(503, "x").kind(), ErrorKind::Server);
        assert_eq!(http(418, "x").kind(), ErrorKind::Client);
        assert_eq!(ApiError::Network("refused".into()).kind(), ErrorKind::Network);
        assert_eq!(ApiError::MissingContent.kind(), ErrorKind::Protocol);
    }

    #[test]
    fn duplicate_email_is_a_conflict() {
        let err = http(400, "User with this email already exists");
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(err.status(), Some(400));
    }
}
