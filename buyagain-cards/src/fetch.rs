//! Remote QR images
//!
//! PDF and receipt exports fall back to a hosted QR service when the local
//! encoder fails. Resolution order is local encoder, remote service, then the
//! placeholder box; the remote call is always bounded by the configured
//! timeout.

use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{instrument, warn};

use crate::config::CardConfig;
use crate::error::{CardError, CardResult};
use crate::qr::{QrArtwork, QrEncoder, QrLevel, decode_png};

const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Source of ready-made QR images (PNG bytes)
#[allow(async_fn_in_trait)]
pub trait QrImageSource {
    async fn fetch(&self, data: &str, size_px: u32, level: QrLevel) -> CardResult<Vec<u8>>;
}

/// Client for `api.qrserver.com` style services
#[derive(Debug, Clone)]
pub struct QrServerClient {
    client: Client,
    service_url: Url,
}

impl QrServerClient {
    pub fn new(config: &CardConfig) -> CardResult<Self> {
        let service_url = Url::parse(&config.qr_service_url)
            .map_err(|e| CardError::Network(format!("invalid QR service URL: {e}")))?;
        let client = Client::builder()
            .timeout(config.qr_fetch_timeout())
            .build()
            .map_err(|e| CardError::Network(e.to_string()))?;
        Ok(Self {
            client,
            service_url,
        })
    }

    /// Request URL for a QR image of `data`
    pub fn image_url(&self, data: &str, size_px: u32, level: QrLevel) -> Url {
        let size = format!("{size_px}x{size_px}");
        let mut url = self.service_url.clone();
        url.query_pairs_mut()
            .append_pair("size", &size)
            .append_pair("data", data)
            .append_pair("ecc", level.as_letter())
            .append_pair("format", "png");
        url
    }
}

impl QrImageSource for QrServerClient {
    #[instrument(skip(self), fields(service = %self.service_url))]
    async fn fetch(&self, data: &str, size_px: u32, level: QrLevel) -> CardResult<Vec<u8>> {
        let url = self.image_url(data, size_px, level);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(CardError::Network(format!("QR service returned {status}")));
        }

        let bytes = response.bytes().await.map_err(request_error)?;
        if !bytes.starts_with(PNG_MAGIC) {
            return Err(CardError::InvalidImage("QR service did not return a PNG".into()));
        }
        decode_png(&bytes)?;
        Ok(bytes.to_vec())
    }
}

fn request_error(e: reqwest::Error) -> CardError {
    if e.is_timeout() {
        CardError::Timeout(e.to_string())
    } else {
        CardError::Network(e.to_string())
    }
}

/// Source that is never reachable, for offline hosts
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRemoteQr;

impl QrImageSource for NoRemoteQr {
    async fn fetch(&self, _data: &str, _size_px: u32, _level: QrLevel) -> CardResult<Vec<u8>> {
        Err(CardError::Network("remote QR service disabled".into()))
    }
}

/// Local encoder, then remote source (bounded by `timeout`), then placeholder
pub async fn resolve_artwork<E, S>(
    encoder: &E,
    source: &S,
    data: &str,
    size_px: u32,
    timeout: Duration,
) -> QrArtwork
where
    E: QrEncoder,
    S: QrImageSource,
{
    let local_err = match encoder.encode(data, size_px, QrLevel::M) {
        Ok(img) => return QrArtwork::Matrix(img),
        Err(e) => e,
    };
    warn!(data = %data, error = %local_err, "local QR encoding failed, trying remote service");

    match tokio::time::timeout(timeout, source.fetch(data, size_px, QrLevel::M)).await {
        Ok(Ok(png)) => match QrArtwork::remote(data, png) {
            Ok(art) => art,
            Err(e) => {
                warn!(data = %data, error = %e, "remote QR image unreadable, using placeholder");
                QrArtwork::placeholder(data)
            }
        },
        Ok(Err(e)) => {
            warn!(data = %data, error = %e, "remote QR fetch failed, using placeholder");
            QrArtwork::placeholder(data)
        }
        Err(_) => {
            warn!(data = %data, timeout_ms = timeout.as_millis() as u64, "remote QR fetch timed out, using placeholder");
            QrArtwork::placeholder(data)
        }
    }
}
