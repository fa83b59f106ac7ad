//! Coupon Model

use chrono::{DateTime, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{AppError, AppResult, ErrorCode};

/// Maximum length accepted for a coupon code
pub const MAX_CODE_LEN: usize = 64;

/// How the discount value is interpreted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountKind {
    /// `value` percent off
    #[default]
    Percentage,
    /// `value` Naira off
    #[serde(alias = "FIXED")]
    FixedAmount,
}

/// Coupon type as issued by the coupon service
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CouponKind {
    #[default]
    Discount,
    Referral,
}

/// A single-use discount or referral code (read-only, owned by the coupon service)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
    /// Opaque code, e.g. `ABCD-1234`
    pub code: String,
    #[serde(alias = "value")]
    pub discount_value: Decimal,
    /// Unset or null means percentage
    #[serde(default, alias = "valueType", deserialize_with = "nullable_kind")]
    pub discount_kind: DiscountKind,
    /// Absent means "no expiry"
    #[serde(default, deserialize_with = "lenient_date")]
    pub expiry_date: Option<NaiveDate>,
    #[serde(default, alias = "terms")]
    pub terms_text: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: CouponKind,
    #[serde(default)]
    pub referrer_name: Option<String>,
    #[serde(default)]
    pub referrer_phone: Option<String>,
}

impl Coupon {
    /// Create a discount coupon with no expiry and no terms
    pub fn new(code: impl Into<String>, discount_value: Decimal, discount_kind: DiscountKind) -> Self {
        Self {
            code: code.into(),
            discount_value,
            discount_kind,
            expiry_date: None,
            terms_text: None,
            kind: CouponKind::Discount,
            referrer_name: None,
            referrer_phone: None,
        }
    }

    /// Set the expiry date
    pub fn with_expiry(mut self, date: NaiveDate) -> Self {
        self.expiry_date = Some(date);
        self
    }

    /// Set the terms text
    pub fn with_terms(mut self, terms: impl Into<String>) -> Self {
        self.terms_text = Some(terms.into());
        self
    }

    /// Terms text if present and not blank
    pub fn terms(&self) -> Option<&str> {
        self.terms_text
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    /// Check the invariants the card pipeline relies on
    pub fn validate(&self) -> AppResult<()> {
        let code = self.code.trim();
        if code.is_empty() {
            return Err(AppError::new(ErrorCode::CouponCodeMissing));
        }
        if code.len() > MAX_CODE_LEN {
            return Err(AppError::with_message(
                ErrorCode::ValueOutOfRange,
                format!("coupon code is too long ({} chars, max {MAX_CODE_LEN})", code.len()),
            )
            .with_detail("coupon", code));
        }
        if self.discount_value <= Decimal::ZERO {
            return Err(AppError::new(ErrorCode::DiscountValueInvalid)
                .with_detail("coupon", code)
                .with_detail("value", self.discount_value.to_string()));
        }
        Ok(())
    }
}

fn nullable_kind<'de, D>(deserializer: D) -> Result<DiscountKind, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<DiscountKind>::deserialize(deserializer)?.unwrap_or_default())
}

/// Accepts `2025-12-31` as well as full RFC 3339 timestamps from the API
fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    let Some(raw) = raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    if let Ok(date) = NaiveDate::parse_from_str(&raw, "%Y-%m-%d") {
        return Ok(Some(date));
    }
    DateTime::parse_from_rfc3339(&raw)
        .map(|dt| Some(dt.date_naive()))
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_api_coupon() {
        let json = r#"{
            "code": "ABCD-1234",
            "value": 15,
            "valueType": "PERCENTAGE",
            "expiryDate": "2025-12-31T00:00:00.000Z",
            "type": "DISCOUNT"
        }"#;
        let coupon: Coupon = serde_json::from_str(json).unwrap();
        assert_eq!(coupon.code, "ABCD-1234");
        assert_eq!(coupon.discount_value, Decimal::from(15));
        assert_eq!(coupon.discount_kind, DiscountKind::Percentage);
        assert_eq!(coupon.expiry_date, NaiveDate::from_ymd_opt(2025, 12, 31));
    }

    #[test]
    fn test_fixed_alias_and_missing_kind() {
        let fixed: Coupon =
            serde_json::from_str(r#"{"code":"X1","value":500,"valueType":"FIXED"}"#).unwrap();
        assert_eq!(fixed.discount_kind, DiscountKind::FixedAmount);

        let unset: Coupon =
            serde_json::from_str(r#"{"code":"X2","value":5,"valueType":null}"#).unwrap();
        assert_eq!(unset.discount_kind, DiscountKind::Percentage);
        assert!(unset.expiry_date.is_none());
    }

    #[test]
    fn test_validate() {
        let ok = Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage);
        assert!(ok.validate().is_ok());

        let zero = Coupon::new("ABCD-1234", Decimal::ZERO, DiscountKind::Percentage);
        assert_eq!(
            zero.validate().unwrap_err().code,
            ErrorCode::DiscountValueInvalid
        );

        let blank = Coupon::new("   ", Decimal::from(10), DiscountKind::FixedAmount);
        assert_eq!(blank.validate().unwrap_err().code, ErrorCode::CouponCodeMissing);
    }

    #[test]
    fn test_blank_terms_are_absent() {
        let coupon =
            Coupon::new("A", Decimal::from(1), DiscountKind::Percentage).with_terms("   ");
        assert_eq!(coupon.terms(), None);
    }
}
