use thiserror::Error;

// ── Error codes ─────────────────────────────────────────────────────
//
// Stable, machine-readable identifiers. Scripts driving the CLI match on
// these, never on the human-readable message string.

/// Stable error code constants.
///
/// JSON output renders errors as `{"code": "PARTIAL_SALE", "message": "..."}`.
/// Codes never change; messages may be reworded.
pub mod error_code {
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const ALREADY_EXISTS: &str = "ALREADY_EXISTS";
    pub const VALIDATION_FAILED: &str = "VALIDATION_FAILED";
    pub const GATEWAY_ERROR: &str = "GATEWAY_ERROR";
    pub const PARTIAL_SALE: &str = "PARTIAL_SALE";
    pub const CONFIG_ERROR: &str = "CONFIG_ERROR";
    pub const INTERNAL: &str = "INTERNAL";
}

// ── ServiceError ────────────────────────────────────────────────────

/// Unified error type returned by every stock operation.
///
/// Each variant maps to a stable error code (see [`error_code`]) and a
/// process exit code used by the CLI.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Referenced record does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The target record is in a state that forbids the operation
    /// (e.g. selling a device that is already sold).
    #[error("{0}")]
    Conflict(String),

    /// Input rejected before any store call was made.
    #[error("{0}")]
    Validation(String),

    /// The data gateway failed; nothing was changed by this call.
    #[error("{0}")]
    Gateway(String),

    /// A sale was recorded but its device could not be marked sold.
    /// Requires manual reconciliation.
    #[error("{0}")]
    PartialSale(String),

    /// Invalid or missing configuration.
    #[error("{0}")]
    Config(String),

    /// Unexpected internal error.
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    /// Stable, machine-readable error code.
    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound(_) => error_code::NOT_FOUND,
            ServiceError::Conflict(_) => error_code::ALREADY_EXISTS,
            ServiceError::Validation(_) => error_code::VALIDATION_FAILED,
            ServiceError::Gateway(_) => error_code::GATEWAY_ERROR,
            ServiceError::PartialSale(_) => error_code::PARTIAL_SALE,
            ServiceError::Config(_) => error_code::CONFIG_ERROR,
            ServiceError::Internal(_) => error_code::INTERNAL,
        }
    }

    /// Process exit code for this error.
    ///
    /// Partial sales get their own code so wrapping scripts can page an
    /// operator instead of blindly retrying.
    pub fn exit_code(&self) -> u8 {
        match self {
            ServiceError::Validation(_) => 2,
            ServiceError::NotFound(_) | ServiceError::Conflict(_) => 3,
            ServiceError::Gateway(_) => 4,
            ServiceError::PartialSale(_) => 5,
            ServiceError::Config(_) => 6,
            ServiceError::Internal(_) => 1,
        }
    }

    /// JSON error body: `{"code": ..., "message": ...}`.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::json!({
            "code": self.error_code(),
            "message": self.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_code_mapping() {
        assert_eq!(ServiceError::NotFound("x".into()).error_code(), "NOT_FOUND");
        assert_eq!(ServiceError::Conflict("x".into()).error_code(), "ALREADY_EXISTS");
        assert_eq!(ServiceError::Validation("x".into()).error_code(), "VALIDATION_FAILED");
        assert_eq!(ServiceError::Gateway("x".into()).error_code(), "GATEWAY_ERROR");
        assert_eq!(ServiceError::PartialSale("x".into()).error_code(), "PARTIAL_SALE");
        assert_eq!(ServiceError::Config("x".into()).error_code(), "CONFIG_ERROR");
        assert_eq!(ServiceError::Internal("x".into()).error_code(), "INTERNAL");
    }

    #[test]
    fn partial_sale_is_distinct_from_gateway_failure() {
        let partial = ServiceError::PartialSale("sale s1 recorded".into());
        let gateway = ServiceError::Gateway("connection refused".into());
        assert_ne!(partial.error_code(), gateway.error_code());
        assert_ne!(partial.exit_code(), gateway.exit_code());
    }

    #[test]
    fn json_body_format() {
        let err = ServiceError::NotFound("device 'abc' not found".into());
        let body = err.to_json();
        assert_eq!(body["code"], "NOT_FOUND");
        assert_eq!(body["message"], "device 'abc' not found");
    }

    #[test]
    fn error_display_is_just_message() {
        assert_eq!(ServiceError::NotFound("device 123".into()).to_string(), "device 123");
        assert_eq!(ServiceError::Validation("bad input".into()).to_string(), "bad input");
        assert_eq!(ServiceError::Gateway("timeout".into()).to_string(), "timeout");
    }
}
