//! Coupon batch as returned by the coupon-generation endpoint
//!
//! The endpoint is not consistent about its payload: depending on the coupon
//! type it answers with `{ data: { coupons: [...] } }`, `{ data: [...] }` or a
//! single coupon in `data`. The number of coupons actually returned is what
//! gets rendered; the quantity originally requested is never consulted.

use serde::{Deserialize, Serialize};

use super::coupon::Coupon;
use crate::error::{AppError, AppResult, ErrorCode};

/// Coupons produced by one generation request, in server order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouponBatch {
    pub coupons: Vec<Coupon>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum GeneratePayload {
    Wrapped { coupons: Vec<Coupon> },
    Many(Vec<Coupon>),
    Single(Box<Coupon>),
}

#[derive(Deserialize)]
struct GenerateEnvelope {
    #[serde(default = "default_success")]
    success: bool,
    #[serde(default)]
    data: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<String>,
}

fn default_success() -> bool {
    true
}

impl CouponBatch {
    pub fn new(coupons: Vec<Coupon>) -> Self {
        Self { coupons }
    }

    /// Parse the raw JSON body of a generation response
    pub fn from_response_json(body: &str) -> AppResult<Self> {
        let envelope: GenerateEnvelope = serde_json::from_str(body).map_err(|e| {
            AppError::with_message(ErrorCode::BatchMalformed, format!("invalid response: {e}"))
        })?;

        if !envelope.success {
            let msg = envelope
                .error
                .unwrap_or_else(|| "Failed to generate coupons".to_string());
            return Err(AppError::with_message(ErrorCode::BatchMalformed, msg));
        }

        let data = envelope
            .data
            .ok_or_else(|| AppError::with_message(ErrorCode::BatchMalformed, "response has no data"))?;
        Self::from_data(data)
    }

    /// Interpret the `data` member of a generation response
    pub fn from_data(data: serde_json::Value) -> AppResult<Self> {
        let payload: GeneratePayload = serde_json::from_value(data).map_err(|e| {
            AppError::with_message(ErrorCode::BatchMalformed, format!("unrecognised coupon payload: {e}"))
        })?;

        let coupons = match payload {
            GeneratePayload::Wrapped { coupons } => coupons,
            GeneratePayload::Many(coupons) => coupons,
            GeneratePayload::Single(coupon) => vec![*coupon],
        };
        Ok(Self { coupons })
    }

    pub fn len(&self) -> usize {
        self.coupons.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coupons.is_empty()
    }

    /// First coupon, used by the single-card exports
    pub fn first(&self) -> Option<&Coupon> {
        self.coupons.first()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Coupon> {
        self.coupons.iter()
    }
}

impl From<Vec<Coupon>> for CouponBatch {
    fn from(coupons: Vec<Coupon>) -> Self {
        Self { coupons }
    }
}

impl<'a> IntoIterator for &'a CouponBatch {
    type Item = &'a Coupon;
    type IntoIter = std::slice::Iter<'a, Coupon>;

    fn into_iter(self) -> Self::IntoIter {
        self.coupons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wrapped_coupons() {
        let body = r#"{"success":true,"data":{"coupons":[
            {"code":"A-1","value":10,"valueType":"PERCENTAGE"},
            {"code":"A-2","value":10,"valueType":"PERCENTAGE"},
            {"code":"A-3","value":10,"valueType":"PERCENTAGE"}
        ]}}"#;
        let batch = CouponBatch::from_response_json(body).unwrap();
        assert_eq!(batch.len(), 3);
        assert_eq!(batch.first().unwrap().code, "A-1");
    }

    #[test]
    fn test_bare_array() {
        let body = r#"{"success":true,"data":[{"code":"B-1","value":500,"valueType":"FIXED"}]}"#;
        let batch = CouponBatch::from_response_json(body).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn test_single_coupon() {
        let body = r#"{"success":true,"data":{"code":"REF-9","value":20,"type":"REFERRAL","referrerName":"Ada"}}"#;
        let batch = CouponBatch::from_response_json(body).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch.first().unwrap().referrer_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_server_error() {
        let body = r#"{"success":false,"error":"Plan limit reached"}"#;
        let err = CouponBatch::from_response_json(body).unwrap_err();
        assert_eq!(err.code, ErrorCode::BatchMalformed);
        assert_eq!(err.message, "Plan limit reached");
    }

    #[test]
    fn test_returned_length_is_authoritative() {
        // 10 were requested, the server only issued 2
        let body = r#"{"success":true,"data":{"requested":10,"coupons":[
            {"code":"C-1","value":5},{"code":"C-2","value":5}
        ]}}"#;
        let batch = CouponBatch::from_response_json(body).unwrap();
        assert_eq!(batch.len(), 2);
    }
}
