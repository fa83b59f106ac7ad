//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Validation errors (caller must correct the input)
/// - 2xxx: Encoding errors (recovered locally with a placeholder)
/// - 3xxx: Network errors (recovered locally with fallback content)
/// - 4xxx: Export errors (surfaced to the user)
/// - 9xxx: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Validation errors (1xxx)
    Validation,
    /// Encoding errors (2xxx)
    Encoding,
    /// Network errors (3xxx)
    Network,
    /// Export errors (4xxx)
    Export,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Validation,
            2000..3000 => Self::Encoding,
            3000..4000 => Self::Network,
            4000..5000 => Self::Export,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Validation => "validation",
            Self::Encoding => "encoding",
            Self::Network => "network",
            Self::Export => "export",
            Self::System => "system",
        }
    }

    /// Whether errors of this category are recovered without involving the user
    pub fn is_recoverable_locally(&self) -> bool {
        matches!(self, Self::Encoding | Self::Network)
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
