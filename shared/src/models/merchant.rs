//! Merchant Profile Model

use serde::{Deserialize, Serialize};

/// Shown when the merchant has not set a business name
pub const BUSINESS_NAME_PLACEHOLDER: &str = "(Name of Business)";
/// Shown when the merchant has not set a phone number
pub const PHONE_PLACEHOLDER: &str = "NO";

/// Merchant profile fields printed on every card
///
/// Fetched once per session by the host and treated as immutable while
/// rendering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantProfile {
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
}

impl MerchantProfile {
    pub fn new(business_name: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            business_name: Some(business_name.into()),
            phone: Some(phone.into()),
        }
    }

    /// Business name, or the placeholder when missing or blank
    pub fn display_name(&self) -> &str {
        non_blank(self.business_name.as_deref()).unwrap_or(BUSINESS_NAME_PLACEHOLDER)
    }

    /// Phone number, or the placeholder when missing or blank
    pub fn display_phone(&self) -> &str {
        non_blank(self.phone.as_deref()).unwrap_or(PHONE_PLACEHOLDER)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
