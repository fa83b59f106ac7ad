//! Pipeline errors and their mapping onto the shared error codes

use buyagain_printer::PrintError;
use shared::error::{AppError, ErrorCode};
use thiserror::Error;

use crate::state::ExportAction;

/// Card pipeline error types
///
/// `Encoding`, `Network`, `Timeout` and `InvalidImage` are recovered inside
/// the pipeline (placeholder QR); they only surface from the lower-level
/// encoder and fetch APIs.
#[derive(Debug, Error)]
pub enum CardError {
    /// Invalid coupon, style or configuration input
    #[error("Validation error: {0}")]
    Validation(AppError),

    /// QR encoding failed
    #[error("QR encoding failed: {0}")]
    Encoding(String),

    /// Remote fetch failed
    #[error("Network error: {0}")]
    Network(String),

    /// Remote fetch exceeded its time budget
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Fetched QR image does not decode
    #[error("Invalid QR image: {0}")]
    InvalidImage(String),

    /// Rendering or handing off an artifact failed
    #[error("{action} failed: {reason}")]
    Export { action: ExportAction, reason: String },

    /// The same export is already running
    #[error("{0} is already in progress")]
    Busy(ExportAction),

    /// Thermal printer failure
    #[error("Printer error: {0}")]
    Printer(#[from] PrintError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CardError {
    pub fn validation(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Validation(AppError::with_message(code, message))
    }

    pub fn export(action: ExportAction, reason: impl Into<String>) -> Self {
        Self::Export {
            action,
            reason: reason.into(),
        }
    }
}

impl From<CardError> for AppError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::Validation(e) => e,
            CardError::Encoding(msg) => {
                AppError::new(ErrorCode::QrEncodingFailed).with_detail("reason", msg)
            }
            CardError::Network(msg) => {
                AppError::new(ErrorCode::NetworkError).with_detail("reason", msg)
            }
            CardError::Timeout(msg) => {
                AppError::new(ErrorCode::TimeoutError).with_detail("reason", msg)
            }
            CardError::InvalidImage(msg) => {
                AppError::new(ErrorCode::QrImageInvalid).with_detail("reason", msg)
            }
            CardError::Export { action, reason } => AppError::new(action.error_code())
                .with_detail("action", action.as_str())
                .with_detail("reason", reason),
            CardError::Busy(action) => AppError::new(ErrorCode::ExportInProgress)
                .with_detail("action", action.as_str()),
            CardError::Printer(e) => {
                let code = match e {
                    PrintError::Connection(_) | PrintError::Timeout(_) => {
                        ErrorCode::PrinterNotAvailable
                    }
                    _ => ErrorCode::PrintFailed,
                };
                AppError::new(code).with_detail("reason", e.to_string())
            }
            CardError::Io(e) => AppError::new(ErrorCode::IoError).with_detail("reason", e.to_string()),
        }
    }
}

/// Result type for pipeline operations
pub type CardResult<T> = Result<T, CardError>;
