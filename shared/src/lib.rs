//! Shared types for the BuyAgain card pipeline
//!
//! Coupon value objects, merchant profile, the coupon-generation response
//! shape and the unified error system used by every crate in the workspace.

pub mod error;
pub mod models;

// Re-exports
pub use error::{AppError, AppResult, ErrorCategory, ErrorCode};
pub use models::{Coupon, CouponBatch, CouponKind, DiscountKind, MerchantProfile};
pub use serde::{Deserialize, Serialize};
