//! Thermal receipt renderer
//!
//! One card rendered twice: as a narrow monospace HTML document for a popup
//! receipt window (prints itself on load, then closes), and as ESC/POS bytes
//! for printers reachable over the network.

use std::fmt::Write;

use buyagain_printer::{EscPosBuilder, QrErrorLevel};
use tracing::instrument;

use super::{CardRenderer, escape_html};
use crate::artifact::ReceiptDocument;
use crate::error::CardResult;
use crate::layout::{CardLayout, ElementKind};
use crate::qr::{QrArtwork, RECEIPT_QR_PX};

pub const WINDOW_WIDTH: u32 = 300;
pub const WINDOW_HEIGHT: u32 = 600;

/// QR module size in printer dots
const ESCPOS_QR_MODULE: u8 = 6;

const RECEIPT_STYLE: &str = "\
body{font-family:'Courier New',Courier,monospace;font-size:12px;margin:0;padding:10px;color:#000;}\
.receipt{max-width:250px;margin:0 auto;text-align:center;}\
.divider{border-top:1px dashed #000;margin:8px 0;}\
.business{font-weight:bold;font-size:14px;}\
.headline{font-weight:bold;}\
.discount{font-size:16px;font-weight:bold;margin:6px 0;}\
.qr{margin:8px auto;}\
.qr img,.qr svg{width:100px;height:100px;}\
.code{font-weight:bold;letter-spacing:1px;}\
.small{font-size:10px;}\
@media print{body{padding:0;}}";

#[derive(Debug, Clone)]
pub struct ReceiptRenderer {
    /// Paper width in characters
    width: usize,
    close_delay_ms: u64,
}

impl ReceiptRenderer {
    pub fn new(width: usize, close_delay_ms: u64) -> Self {
        Self {
            width,
            close_delay_ms,
        }
    }

    fn html(&self, layout: &CardLayout, qr: &QrArtwork) -> String {
        let text = |kind| escape_html(&layout.text(kind).unwrap_or_default());
        let qr_markup = match qr.png_data_url(RECEIPT_QR_PX) {
            Some(src) => format!(r#"<img src="{src}" alt="QR code" />"#),
            None => qr.html_markup(100),
        };

        let mut html = String::with_capacity(4 * 1024);
        let _ = write!(
            html,
            concat!(
                "<!DOCTYPE html><html><head><meta charset=\"utf-8\" /><title>POS Receipt</title>",
                "<style>{style}</style></head><body><div class=\"receipt\" data-code=\"{code}\">",
                "<div class=\"business\">{business}</div>",
                "<div class=\"divider\"></div>",
                "<div class=\"headline\">{headline}</div>",
                "<div class=\"small\">{description}</div>",
                "<div class=\"divider\"></div>",
                "<div class=\"discount\">{discount}</div>",
                "<div class=\"qr\" data-qr=\"{url}\">{qr}</div>",
                "<div class=\"code\">{code}</div>",
                "<div class=\"small\">{validity}</div>",
                "<div class=\"small\">{terms}</div>",
                "<div class=\"divider\"></div>",
                "<div class=\"small\">{phone}</div>",
                "<div class=\"small\">{copyright}</div>",
                "</div><script>window.onload=function(){{window.print();",
                "setTimeout(function(){{window.close();}},{delay});}};</script></body></html>"
            ),
            style = RECEIPT_STYLE,
            code = escape_html(&layout.code),
            business = text(ElementKind::BusinessName),
            headline = text(ElementKind::Headline),
            description = text(ElementKind::Description),
            discount = text(ElementKind::Discount),
            url = escape_html(qr.data()),
            qr = qr_markup,
            validity = text(ElementKind::Validity),
            terms = text(ElementKind::Terms),
            phone = text(ElementKind::Phone),
            copyright = text(ElementKind::Copyright),
            delay = self.close_delay_ms,
        );
        html
    }

    fn escpos(&self, layout: &CardLayout) -> CardResult<Vec<u8>> {
        let text = |kind| layout.text(kind).unwrap_or_default();
        let mut b = EscPosBuilder::new(self.width);

        b.center();
        b.bold();
        b.wrapped(&text(ElementKind::BusinessName));
        b.bold_off();
        b.sep_dashed();

        b.bold();
        b.wrapped(&text(ElementKind::Headline));
        b.bold_off();
        b.wrapped(&text(ElementKind::Description));
        b.sep_dashed();

        b.double_height().bold();
        b.wrapped(&text(ElementKind::Discount));
        b.reset_size().bold_off();
        b.newline();

        b.qr_code(&layout.qr.url, ESCPOS_QR_MODULE, QrErrorLevel::M)?;
        b.bold();
        b.line(&layout.code);
        b.bold_off();
        b.wrapped(&text(ElementKind::Validity));
        b.wrapped(&text(ElementKind::Terms));
        b.sep_dashed();

        b.wrapped(&text(ElementKind::Phone));
        b.line(&text(ElementKind::Copyright));
        b.cut_feed(3);

        Ok(b.build())
    }
}

impl Default for ReceiptRenderer {
    fn default() -> Self {
        Self::new(32, 1000)
    }
}

impl CardRenderer for ReceiptRenderer {
    type Output = ReceiptDocument;

    const NAME: &'static str = "receipt";

    #[instrument(skip_all, fields(code = %layout.code, renderer = Self::NAME))]
    fn render(&self, layout: &CardLayout, qr: &QrArtwork) -> CardResult<ReceiptDocument> {
        Ok(ReceiptDocument {
            html: self.html(layout, qr),
            escpos: self.escpos(layout)?,
            window_width: WINDOW_WIDTH,
            window_height: WINDOW_HEIGHT,
            placeholder_qr: !qr.is_drawable(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::layout::compute_layout;
    use crate::qr::{QrcodeEncoder, card_artwork};
    use crate::style::CardStyle;
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use shared::models::{Coupon, DiscountKind, MerchantProfile};

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|w| w == needle)
    }

    fn layout() -> CardLayout {
        let coupon = Coupon::new("NAIRA-500", Decimal::from(500), DiscountKind::FixedAmount)
            .with_expiry(NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
        compute_layout(
            &coupon,
            &CardStyle::default(),
            &MerchantProfile::new("Mama Put", "08012345678"),
            &CardConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_receipt_html() {
        let layout = layout();
        let qr = card_artwork(&QrcodeEncoder, &layout.qr.url, layout.qr.size_px);
        let doc = ReceiptRenderer::default().render(&layout, &qr).unwrap();

        assert_eq!((doc.window_width, doc.window_height), (300, 600));
        assert!(doc.html.contains("Courier New"));
        assert!(doc.html.contains("max-width:250px"));
        assert!(doc.html.contains("1px dashed"));
        assert!(doc.html.contains("Get ₦500 off."));
        assert!(doc.html.contains("Valid until 15/01/2026"));
        assert!(doc.html.contains("data:image/png;base64,"));
        assert!(doc.html.contains("window.print();"));
        assert!(doc.html.contains("window.close();},1000);"));
        assert!(!doc.placeholder_qr);
    }

    #[test]
    fn test_receipt_escpos() {
        let layout = layout();
        let doc = ReceiptRenderer::new(32, 1000)
            .render(&layout, &QrArtwork::placeholder(layout.qr.url.clone()))
            .unwrap();

        assert!(contains(&doc.escpos, b"MAMA PUT\n"));
        assert!(contains(&doc.escpos, b"Get NGN500 off.\n"));
        assert!(contains(&doc.escpos, b"NAIRA-500\n"));
        // printer-side QR still encodes the redemption URL
        assert!(contains(&doc.escpos, b"https://buyagain.ng/redeem/NAIRA-500"));
        // ends with feed + cut
        assert!(doc.escpos.ends_with(&[0x1D, 0x56, 0x42, 3]));
        assert!(doc.placeholder_qr);
        assert!(doc.html.contains(">FAIL<"));
    }

    #[test]
    fn test_undecodable_remote_qr_uses_placeholder_box() {
        let layout = layout();
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend_from_slice(b"garbage");
        let qr = QrArtwork::Remote {
            data: layout.qr.url.clone(),
            png,
        };

        let doc = ReceiptRenderer::default().render(&layout, &qr).unwrap();
        assert!(doc.placeholder_qr);
        assert!(doc.html.contains(">FAIL<"));
        assert!(!doc.html.contains("data:image/png;base64,"));
    }
}
