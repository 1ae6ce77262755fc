//! Resource error taxonomy.

use serde_json::{json, Value};
use thiserror::Error;

/// Errors a resource operation can report to the caller.
///
/// Each kind carries a numeric code in the HTTP status space so that callers
/// and logs can classify failures without knowing the kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    /// Malformed request or unmet parameter contract.
    #[error("Bad Request: {0}")]
    BadRequest(String),

    /// A handler or filter explicitly rejected the operation.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// The id resolved to no route, or the resource does not exist.
    #[error("Not Found: {0}")]
    NotFound(String),

    /// The operation conflicts with the current resource state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Uncaught fault, script failure or resource exhaustion.
    #[error("Internal Server Error: {0}")]
    Internal(String),

    /// A collaborator needed to serve the request is unavailable.
    #[error("Service Unavailable: {0}")]
    Unavailable(String),
}

/// Message used for internal failures whose detail must not leave the router.
pub const INTERNAL_ERROR_MESSAGE: &str = "Internal Server Error";

impl ResourceError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Generic internal error carrying no diagnostic detail.
    pub fn internal() -> Self {
        Self::Internal(INTERNAL_ERROR_MESSAGE.to_string())
    }

    pub fn internal_with(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Build an error from a numeric code. Unknown codes are internal errors.
    pub fn from_code(code: u16, msg: impl Into<String>) -> Self {
        let msg = msg.into();
        match code {
            400 => Self::BadRequest(msg),
            403 => Self::Forbidden(msg),
            404 => Self::NotFound(msg),
            409 => Self::Conflict(msg),
            503 => Self::Unavailable(msg),
            _ => Self::Internal(msg),
        }
    }

    pub fn code(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Conflict(_) => 409,
            Self::Internal(_) => 500,
            Self::Unavailable(_) => 503,
        }
    }

    /// Short reason phrase for the code.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::BadRequest(_) => "Bad Request",
            Self::Forbidden(_) => "Forbidden",
            Self::NotFound(_) => "Not Found",
            Self::Conflict(_) => "Conflict",
            Self::Internal(_) => "Internal Server Error",
            Self::Unavailable(_) => "Service Unavailable",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::Conflict(m)
            | Self::Internal(m)
            | Self::Unavailable(m) => m,
        }
    }

    /// True for codes in the server error range (500-599).
    pub fn is_server_error(&self) -> bool {
        (500..=599).contains(&self.code())
    }

    /// Serialized form exposed to filter scripts and to callers.
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.code(),
            "reason": self.reason(),
            "message": self.message(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_round_trip_through_from_code() {
        for err in [
            ResourceError::bad_request("x"),
            ResourceError::forbidden("x"),
            ResourceError::not_found("x"),
            ResourceError::Conflict("x".into()),
            ResourceError::internal_with("x"),
            ResourceError::Unavailable("x".into()),
        ] {
            assert_eq!(ResourceError::from_code(err.code(), "x"), err);
        }
        assert_eq!(ResourceError::from_code(418, "teapot").code(), 500);
    }

    #[test]
    fn test_server_error_range() {
        assert!(ResourceError::internal().is_server_error());
        assert!(ResourceError::Unavailable("down".into()).is_server_error());
        assert!(!ResourceError::not_found("/x").is_server_error());
    }

    #[test]
    fn test_to_json() {
        let json = ResourceError::forbidden("no access").to_json();
        assert_eq!(json["error"], 403);
        assert_eq!(json["reason"], "Forbidden");
        assert_eq!(json["message"], "no access");
    }

    #[test]
    fn test_generic_internal_has_no_detail() {
        let err = ResourceError::internal();
        assert_eq!(err.message(), INTERNAL_ERROR_MESSAGE);
        assert_eq!(err.to_string(), "Internal Server Error: Internal Server Error");
    }
}
