//! Unified error codes for the BuyAgain card pipeline
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Coupon / style validation errors
//! - 2xxx: QR encoding errors
//! - 3xxx: Network errors
//! - 4xxx: Export errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility with the dashboard front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Invalid format
    InvalidFormat = 6,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: Coupon ====================
    /// Coupon code is empty
    CouponCodeMissing = 1001,
    /// Discount value is zero, negative or not a number
    DiscountValueInvalid = 1002,
    /// Accent color is not a 6-digit hex color
    AccentColorInvalid = 1003,
    /// Batch contains no coupons
    BatchEmpty = 1004,
    /// Coupon-generation response could not be parsed
    BatchMalformed = 1005,

    // ==================== 2xxx: QR ====================
    /// QR matrix could not be encoded
    QrEncodingFailed = 2001,
    /// QR raster could not be decoded
    QrImageInvalid = 2002,

    // ==================== 3xxx: Network ====================
    /// Remote fetch failed
    NetworkError = 3001,
    /// Remote fetch timed out
    TimeoutError = 3002,

    // ==================== 4xxx: Export ====================
    /// Print dialog unavailable or rejected
    PrintFailed = 4001,
    /// PDF generation failed
    PdfFailed = 4002,
    /// Receipt window could not be opened
    ReceiptWindowFailed = 4004,
    /// Share target could not be opened
    ShareFailed = 4005,
    /// The same export is already running
    ExportInProgress = 4006,
    /// Thermal printer unreachable
    PrinterNotAvailable = 4007,

    // ==================== 9xxx: System ====================
    /// File system error
    IoError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the default message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::InvalidFormat => "Invalid format",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // Coupon
            ErrorCode::CouponCodeMissing => "Coupon code is missing",
            ErrorCode::DiscountValueInvalid => "Discount value must be a positive number",
            ErrorCode::AccentColorInvalid => "Card color must be a 6-digit hex color",
            ErrorCode::BatchEmpty => "No coupons generated to print.",
            ErrorCode::BatchMalformed => "Unexpected coupon response from server",

            // QR
            ErrorCode::QrEncodingFailed => "QR code could not be generated",
            ErrorCode::QrImageInvalid => "QR image could not be read",

            // Network
            ErrorCode::NetworkError => "Network error",
            ErrorCode::TimeoutError => "Operation timed out",

            // Export
            ErrorCode::PrintFailed => "Error printing cards. Please try again.",
            ErrorCode::PdfFailed => "Error generating PDF. Please try again.",
            ErrorCode::ReceiptWindowFailed => "Error generating POS receipt. Please try again.",
            ErrorCode::ShareFailed => "Error sharing card. Please try again.",
            ErrorCode::ExportInProgress => "Export already in progress",
            ErrorCode::PrinterNotAvailable => "Printer is not available",

            // System
            ErrorCode::IoError => "File system error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        let code = match value {
            2 => ErrorCode::ValidationFailed,
            6 => ErrorCode::InvalidFormat,
            8 => ErrorCode::ValueOutOfRange,
            1001 => ErrorCode::CouponCodeMissing,
            1002 => ErrorCode::DiscountValueInvalid,
            1003 => ErrorCode::AccentColorInvalid,
            1004 => ErrorCode::BatchEmpty,
            1005 => ErrorCode::BatchMalformed,
            2001 => ErrorCode::QrEncodingFailed,
            2002 => ErrorCode::QrImageInvalid,
            3001 => ErrorCode::NetworkError,
            3002 => ErrorCode::TimeoutError,
            4001 => ErrorCode::PrintFailed,
            4002 => ErrorCode::PdfFailed,
            4004 => ErrorCode::ReceiptWindowFailed,
            4005 => ErrorCode::ShareFailed,
            4006 => ErrorCode::ExportInProgress,
            4007 => ErrorCode::PrinterNotAvailable,
            9006 => ErrorCode::IoError,
            other => return Err(InvalidErrorCode(other)),
        };
        Ok(code)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
