use std::time::Duration;

/// Card pipeline configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | BUYAGAIN_REDEEM_BASE_URL | https://buyagain.ng/redeem | Redemption URL prefix encoded in every QR |
/// | BUYAGAIN_BRAND_DOMAIN | buyagain.ng | Domain shown in the card copyright and preview QR |
/// | BUYAGAIN_QR_SERVICE_URL | https://api.qrserver.com/v1/create-qr-code/ | Remote QR image service |
/// | BUYAGAIN_QR_FETCH_TIMEOUT_MS | 5000 | Remote QR fetch timeout |
/// | BUYAGAIN_PRINT_SETTLE_MS | 1000 | Delay before injected print nodes are removed |
/// | BUYAGAIN_POS_CLOSE_DELAY_MS | 1000 | Delay before the receipt window closes after printing |
/// | BUYAGAIN_DATE_FORMAT | %d/%m/%Y | Expiry date format (chrono strftime) |
/// | BUYAGAIN_SHARE_BASE_URL | https://wa.me/ | Share fallback link |
/// | BUYAGAIN_RECEIPT_WIDTH | 32 | Receipt paper width in characters (24-64) |
///
/// # Example
///
/// ```ignore
/// BUYAGAIN_DATE_FORMAT="%b %d, %Y" BUYAGAIN_RECEIPT_WIDTH=48 ./host
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CardConfig {
    /// Prefix of every redemption URL, without trailing slash
    pub redeem_base_url: String,
    pub brand_domain: String,
    pub qr_service_url: String,
    pub qr_fetch_timeout_ms: u64,
    pub print_settle_ms: u64,
    pub pos_close_delay_ms: u64,
    pub date_format: String,
    pub share_base_url: String,
    pub receipt_width: usize,
}

impl Default for CardConfig {
    fn default() -> Self {
        Self {
            redeem_base_url: "https://buyagain.ng/redeem".into(),
            brand_domain: "buyagain.ng".into(),
            qr_service_url: "https://api.qrserver.com/v1/create-qr-code/".into(),
            qr_fetch_timeout_ms: 5000,
            print_settle_ms: 1000,
            pos_close_delay_ms: 1000,
            date_format: "%d/%m/%Y".into(),
            share_base_url: "https://wa.me/".into(),
            receipt_width: 32,
        }
    }
}

impl CardConfig {
    /// Load configuration from environment variables
    ///
    /// Unset or unparsable variables fall back to the defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redeem_base_url: env_string("BUYAGAIN_REDEEM_BASE_URL")
                .map(|s| s.trim_end_matches('/').to_string())
                .unwrap_or(defaults.redeem_base_url),
            brand_domain: env_string("BUYAGAIN_BRAND_DOMAIN").unwrap_or(defaults.brand_domain),
            qr_service_url: env_string("BUYAGAIN_QR_SERVICE_URL")
                .unwrap_or(defaults.qr_service_url),
            qr_fetch_timeout_ms: env_parse("BUYAGAIN_QR_FETCH_TIMEOUT_MS")
                .unwrap_or(defaults.qr_fetch_timeout_ms),
            print_settle_ms: env_parse("BUYAGAIN_PRINT_SETTLE_MS")
                .unwrap_or(defaults.print_settle_ms),
            pos_close_delay_ms: env_parse("BUYAGAIN_POS_CLOSE_DELAY_MS")
                .unwrap_or(defaults.pos_close_delay_ms),
            date_format: env_string("BUYAGAIN_DATE_FORMAT").unwrap_or(defaults.date_format),
            share_base_url: env_string("BUYAGAIN_SHARE_BASE_URL")
                .unwrap_or(defaults.share_base_url),
            receipt_width: env_parse("BUYAGAIN_RECEIPT_WIDTH")
                .filter(|w| (24..=64).contains(w))
                .unwrap_or(defaults.receipt_width),
        }
    }

    // === Overrides (tests and embedding hosts) ===

    pub fn with_redeem_base_url(mut self, url: impl Into<String>) -> Self {
        self.redeem_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_qr_service_url(mut self, url: impl Into<String>) -> Self {
        self.qr_service_url = url.into();
        self
    }

    pub fn with_qr_fetch_timeout(mut self, timeout: Duration) -> Self {
        self.qr_fetch_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn with_print_settle(mut self, delay: Duration) -> Self {
        self.print_settle_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_pos_close_delay(mut self, delay: Duration) -> Self {
        self.pos_close_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn with_date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = format.into();
        self
    }

    pub fn with_receipt_width(mut self, width: usize) -> Self {
        self.receipt_width = width;
        self
    }

    // === Derived values ===

    pub fn qr_fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.qr_fetch_timeout_ms)
    }

    pub fn print_settle(&self) -> Duration {
        Duration::from_millis(self.print_settle_ms)
    }

    pub fn pos_close_delay(&self) -> Duration {
        Duration::from_millis(self.pos_close_delay_ms)
    }

    /// Redemption URL for a coupon code: `<redeem-base>/<code>`
    pub fn redemption_url(&self, code: &str) -> String {
        format!("{}/{}", self.redeem_base_url, code.trim())
    }

    /// Static URL encoded by the signed-out preview card
    pub fn preview_url(&self) -> String {
        format!("https://{}", self.brand_domain)
    }
}

fn env_string(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env_string(key).and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redemption_url() {
        let config = CardConfig::default();
        assert_eq!(
            config.redemption_url("ABCD-1234"),
            "https://buyagain.ng/redeem/ABCD-1234"
        );

        let staging = CardConfig::default().with_redeem_base_url("https://staging.buyagain.ng/redeem/");
        assert_eq!(
            staging.redemption_url("X"),
            "https://staging.buyagain.ng/redeem/X"
        );
    }

    #[test]
    fn test_overrides() {
        let config = CardConfig::default()
            .with_print_settle(Duration::from_millis(5))
            .with_receipt_width(48);
        assert_eq!(config.print_settle(), Duration::from_millis(5));
        assert_eq!(config.receipt_width, 48);
        assert_eq!(config.preview_url(), "https://buyagain.ng");
    }
}
