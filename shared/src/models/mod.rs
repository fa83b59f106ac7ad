//! Domain models shared by the card pipeline

pub mod batch;
pub mod coupon;
pub mod merchant;

pub use batch::CouponBatch;
pub use coupon::{Coupon, CouponKind, DiscountKind};
pub use merchant::MerchantProfile;
