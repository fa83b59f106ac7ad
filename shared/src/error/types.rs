//! Error types

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Application error with structured error code and details
///
/// This is the error shape handed to the hosting page:
/// - Standardized error codes via [`ErrorCode`]
/// - Human-readable, user-facing messages
/// - Optional structured details (coupon code, renderer) for reproduction
#[derive(Debug, Clone, PartialEq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct AppError {
    /// The error code identifying the type of error
    pub code: ErrorCode,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<BTreeMap<String, Value>>,
}

impl AppError {
    /// Create a new error with the default message for the error code
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    /// Create a new error with a custom message
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    /// Add a detail entry to this error
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(BTreeMap::new)
            .insert(key.into(), value.into());
        self
    }

    // ==================== Convenience constructors ====================

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }
}

/// Type alias for Result with AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_new() {
        let err = AppError::new(ErrorCode::PdfFailed);
        assert_eq!(err.code, ErrorCode::PdfFailed);
        assert_eq!(err.message, "Error generating PDF. Please try again.");
        assert!(err.details.is_none());
    }

    #[test]
    fn test_app_error_with_detail() {
        let err = AppError::validation("Discount value must be positive")
            .with_detail("coupon", "ABCD-1234")
            .with_detail("renderer", "pdf");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details.get("coupon").unwrap(), "ABCD-1234");
        assert_eq!(details.get("renderer").unwrap(), "pdf");
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::with_message(ErrorCode::PrintFailed, "Print dialog closed");
        assert_eq!(format!("{}", err), "Print dialog closed");
    }

    #[test]
    fn test_app_error_serialize() {
        let err = AppError::new(ErrorCode::BatchEmpty);
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], 1004);
        assert!(json.get("details").is_none());
    }
}
