//! QR encoding and QR artwork
//!
//! Every card QR encodes the redemption URL, never the bare coupon code.
//! Card renders use error correction level M; the signed-out preview uses L
//! with grey modules.

use std::fmt;
use std::io::Cursor;
use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use image::{DynamicImage, GrayImage, ImageFormat, Luma};
use qrcode::render::svg;
use qrcode::{EcLevel, QrCode};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CardError, CardResult};

/// QR size on the HTML card, in CSS pixels
pub const CARD_QR_PX: u32 = 48;
/// QR size on the signed-out preview card
pub const PREVIEW_QR_PX: u32 = 64;
/// QR size requested for PDF exports
pub const PDF_QR_PX: u32 = 80;
/// QR size requested for receipts
pub const RECEIPT_QR_PX: u32 = 150;

const DARK: &str = "#000000";
const PREVIEW_DARK: &str = "#999999";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QrLevel {
    /// ~7% recovery, preview only
    L,
    /// ~15% recovery, every printed or shared card
    M,
}

impl QrLevel {
    fn ec_level(self) -> EcLevel {
        match self {
            QrLevel::L => EcLevel::L,
            QrLevel::M => EcLevel::M,
        }
    }

    /// Letter used by the remote QR service `ecc` parameter
    pub fn as_letter(self) -> &'static str {
        match self {
            QrLevel::L => "L",
            QrLevel::M => "M",
        }
    }
}

/// Encodes a URL into a QR symbol
pub trait QrEncoder {
    fn encode(&self, url: &str, size_px: u32, level: QrLevel) -> CardResult<QrImage>;
}

/// [`QrEncoder`] backed by the `qrcode` crate
#[derive(Debug, Clone, Copy, Default)]
pub struct QrcodeEncoder;

impl QrEncoder for QrcodeEncoder {
    fn encode(&self, url: &str, size_px: u32, level: QrLevel) -> CardResult<QrImage> {
        if url.is_empty() {
            return Err(CardError::Encoding("empty QR payload".into()));
        }
        let code = QrCode::with_error_correction_level(url, level.ec_level())
            .map_err(|e| CardError::Encoding(e.to_string()))?;
        Ok(QrImage {
            code: Arc::new(code),
            data: url.to_string(),
            level,
            size_px,
            dark: DARK,
        })
    }
}

/// An encoded QR symbol
#[derive(Clone)]
pub struct QrImage {
    code: Arc<QrCode>,
    data: String,
    level: QrLevel,
    size_px: u32,
    dark: &'static str,
}

impl fmt::Debug for QrImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QrImage")
            .field("data", &self.data)
            .field("level", &self.level)
            .field("modules", &self.code.width())
            .finish()
    }
}

impl QrImage {
    /// Encoded payload
    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn level(&self) -> QrLevel {
        self.level
    }

    pub fn size_px(&self) -> u32 {
        self.size_px
    }

    /// Modules per side, without quiet zone
    pub fn modules(&self) -> usize {
        self.code.width()
    }

    /// Render with grey modules (signed-out preview)
    pub fn greyed(mut self) -> Self {
        self.dark = PREVIEW_DARK;
        self
    }

    pub fn to_svg(&self) -> String {
        self.code
            .render::<svg::Color>()
            .min_dimensions(self.size_px, self.size_px)
            .dark_color(svg::Color(self.dark))
            .light_color(svg::Color("#ffffff"))
            .build()
    }

    /// Greyscale raster at least `min_px` wide, quiet zone included
    pub fn to_raster(&self, min_px: u32) -> GrayImage {
        let dark = if self.dark == DARK { 0 } else { 0x99 };
        self.code
            .render::<Luma<u8>>()
            .min_dimensions(min_px, min_px)
            .dark_color(Luma([dark]))
            .light_color(Luma([255]))
            .build()
    }
}

/// QR artwork placed on a card
#[derive(Debug, Clone)]
pub enum QrArtwork {
    /// Encoded locally
    Matrix(QrImage),
    /// PNG fetched from the remote QR service
    Remote { data: String, png: Vec<u8> },
    /// Encoding and fetching both failed; a labelled box stands in
    Placeholder { data: String },
}

impl QrArtwork {
    pub fn placeholder(data: impl Into<String>) -> Self {
        Self::Placeholder { data: data.into() }
    }

    /// Remote artwork, rejected unless `png` decodes
    pub fn remote(data: impl Into<String>, png: Vec<u8>) -> CardResult<Self> {
        decode_png(&png)?;
        Ok(Self::Remote {
            data: data.into(),
            png,
        })
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, QrArtwork::Placeholder { .. })
    }

    /// Whether a scannable code can be drawn from this artwork
    pub fn is_drawable(&self) -> bool {
        match self {
            QrArtwork::Matrix(_) => true,
            QrArtwork::Remote { png, .. } => decode_png(png).is_ok(),
            QrArtwork::Placeholder { .. } => false,
        }
    }

    /// URL the artwork stands for
    pub fn data(&self) -> &str {
        match self {
            QrArtwork::Matrix(img) => img.data(),
            QrArtwork::Remote { data, .. } | QrArtwork::Placeholder { data } => data,
        }
    }

    /// Inline markup for HTML cards
    pub fn html_markup(&self, size_px: u32) -> String {
        match self {
            QrArtwork::Matrix(img) => img.to_svg(),
            QrArtwork::Remote { .. } => match self.png_data_url(size_px) {
                Some(src) => format!(
                    r#"<img src="{src}" width="{size_px}" height="{size_px}" alt="QR code" />"#
                ),
                None => placeholder_svg(size_px),
            },
            QrArtwork::Placeholder { .. } => placeholder_svg(size_px),
        }
    }

    /// `data:` URL of a PNG rendering, `None` when nothing scannable exists
    pub fn png_data_url(&self, size_px: u32) -> Option<String> {
        let png = match self {
            QrArtwork::Matrix(img) => encode_png(img.to_raster(size_px))?,
            QrArtwork::Remote { data, png } => match decode_png(png) {
                Ok(_) => png.clone(),
                Err(e) => {
                    warn!(data = %data, error = %e, "remote QR image is not decodable");
                    return None;
                }
            },
            QrArtwork::Placeholder { .. } => return None,
        };
        Some(format!("data:image/png;base64,{}", BASE64.encode(png)))
    }

    /// Greyscale pixels for PDF embedding, `None` for the placeholder
    pub fn raster(&self, min_px: u32) -> Option<GrayImage> {
        match self {
            QrArtwork::Matrix(img) => Some(img.to_raster(min_px)),
            QrArtwork::Remote { data, png } => match decode_png(png) {
                Ok(decoded) => Some(decoded.to_luma8()),
                Err(e) => {
                    warn!(data = %data, error = %e, "remote QR image is not decodable");
                    None
                }
            },
            QrArtwork::Placeholder { .. } => None,
        }
    }
}

/// Encode the redemption URL, falling back to the placeholder on failure
pub fn card_artwork<E: QrEncoder>(encoder: &E, url: &str, size_px: u32) -> QrArtwork {
    match encoder.encode(url, size_px, QrLevel::M) {
        Ok(img) => QrArtwork::Matrix(img),
        Err(e) => {
            warn!(url = %url, error = %e, "QR encoding failed, using placeholder");
            QrArtwork::placeholder(url)
        }
    }
}

/// Grey, low-correction QR of the brand site for the signed-out preview
pub fn preview_artwork<E: QrEncoder>(encoder: &E, preview_url: &str) -> QrArtwork {
    match encoder.encode(preview_url, PREVIEW_QR_PX, QrLevel::L) {
        Ok(img) => QrArtwork::Matrix(img.greyed()),
        Err(e) => {
            warn!(error = %e, "preview QR encoding failed");
            QrArtwork::placeholder(preview_url)
        }
    }
}

/// Fully decode PNG bytes; a valid signature over a corrupt body is rejected
pub fn decode_png(bytes: &[u8]) -> CardResult<DynamicImage> {
    image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .map_err(|e| CardError::InvalidImage(e.to_string()))
}

fn encode_png(img: GrayImage) -> Option<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    match DynamicImage::ImageLuma8(img).write_to(&mut buf, ImageFormat::Png) {
        Ok(()) => Some(buf.into_inner()),
        Err(e) => {
            warn!(error = %e, "PNG encoding of QR failed");
            None
        }
    }
}

/// Bordered box labelled `QR` / `FAIL`
pub fn placeholder_svg(size_px: u32) -> String {
    format!(
        concat!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{s}" height="{s}" viewBox="0 0 20 20" data-qr-placeholder="true">"#,
            r##"<rect x="0.5" y="0.5" width="19" height="19" fill="#ffffff" stroke="#999999" stroke-width="1"/>"##,
            r##"<text x="10" y="8.5" font-size="5" text-anchor="middle" fill="#666666">QR</text>"##,
            r##"<text x="10" y="15" font-size="5" text-anchor="middle" fill="#666666">FAIL</text>"##,
            "</svg>"
        ),
        s = size_px
    )
}
