//! HTML card renderer
//!
//! Produces a self-contained fragment: inline styles only, millimetre sizing,
//! every element absolutely placed from the layout.

use std::fmt::Write;

use tracing::instrument;

use super::{CardRenderer, escape_html};
use crate::error::CardResult;
use crate::layout::{
    Align, CARD_HEIGHT_MM, CARD_WIDTH_MM, CardLayout, Icon, LayoutElement, Region, Weight,
};
use crate::qr::{CARD_QR_PX, QrArtwork, QrEncoder, placeholder_svg, preview_artwork};

/// Horizontal padding of centered text in the accent region
const CENTER_PAD_MM: f32 = 1.5;
const ICON_GAP_MM: f32 = 1.5;

#[derive(Debug, Clone, Copy, Default)]
pub struct HtmlRenderer;

impl CardRenderer for HtmlRenderer {
    type Output = String;

    const NAME: &'static str = "html";

    #[instrument(skip_all, fields(code = %layout.code, renderer = Self::NAME))]
    fn render(&self, layout: &CardLayout, qr: &QrArtwork) -> CardResult<String> {
        Ok(self.card_markup(layout, qr, false))
    }
}

impl HtmlRenderer {
    /// Signed-out preview: same card, grey low-correction QR of the brand site
    pub fn render_preview<E: QrEncoder>(
        &self,
        layout: &CardLayout,
        encoder: &E,
        preview_url: &str,
    ) -> CardResult<String> {
        let artwork = preview_artwork(encoder, preview_url);
        Ok(self.card_markup(layout, &artwork, true))
    }

    /// Stand-in card for a coupon whose layout or render failed
    pub fn render_fallback(&self, code: &str, url: &str) -> String {
        format!(
            concat!(
                r#"<div class="coupon-card coupon-card--fallback" data-code="{code}" style="box-sizing:border-box;"#,
                "width:{w}mm;height:{h}mm;border:0.3mm dashed #999999;border-radius:2mm;display:flex;",
                "flex-direction:column;align-items:center;justify-content:center;gap:2mm;",
                r#"font-family:Helvetica,Arial,sans-serif;font-size:8pt;color:#666666;page-break-inside:avoid;">"#,
                r#"<div data-qr="{url}">{qr}</div><div data-el="code">{code}</div></div>"#
            ),
            code = escape_html(code),
            url = escape_html(url),
            w = mm(CARD_WIDTH_MM),
            h = mm(CARD_HEIGHT_MM),
            qr = placeholder_svg(CARD_QR_PX),
        )
    }

    fn card_markup(&self, layout: &CardLayout, qr: &QrArtwork, preview: bool) -> String {
        let mut html = String::with_capacity(8 * 1024);
        let _ = write!(
            html,
            concat!(
                r#"<div class="coupon-card" data-code="{code}"{preview} style="position:relative;box-sizing:border-box;"#,
                "width:{w}mm;height:{h}mm;overflow:hidden;border:0.3mm solid #e5e7eb;border-radius:2mm;",
                r#"background:#ffffff;color:#000000;font-family:Helvetica,Arial,sans-serif;line-height:1;page-break-inside:avoid;break-inside:avoid;">"#
            ),
            code = escape_html(&layout.code),
            preview = if preview { r#" data-preview="true""# } else { "" },
            w = mm(layout.width_mm),
            h = mm(layout.height_mm),
        );

        for region in [Region::Info, Region::Discount] {
            let background = match region {
                Region::Info => "#ffffff".to_string(),
                Region::Discount => layout.accent.to_string(),
            };
            let _ = write!(
                html,
                r#"<div class="coupon-card__{name}" style="position:absolute;top:0;left:{left}mm;width:{width}mm;height:{h}mm;background:{background};">"#,
                name = match region {
                    Region::Info => "info",
                    Region::Discount => "discount",
                },
                left = mm(layout.region_left_mm(region)),
                width = mm(layout.region_width_mm(region)),
                h = mm(layout.height_mm),
            );

            if region == Region::Discount {
                self.icon_row(&mut html, layout);
                self.qr_box(&mut html, layout, qr);
            }
            for element in layout.elements.iter().filter(|e| e.region == region) {
                self.text_line(&mut html, layout, element);
            }
            html.push_str("</div>");
        }

        html.push_str("</div>");
        html
    }

    fn text_line(&self, html: &mut String, layout: &CardLayout, e: &LayoutElement) {
        let region_w = layout.region_width_mm(e.region);
        let (left, width, align) = match e.align {
            Align::Left => {
                let inset = e.anchor.x * region_w;
                (inset, region_w - 2.0 * inset, "left")
            }
            Align::Center => (CENTER_PAD_MM, region_w - 2.0 * CENTER_PAD_MM, "center"),
        };
        let bottom = layout.height_mm * (1.0 - e.anchor.y);

        let _ = write!(
            html,
            concat!(
                r#"<div data-el="{kind}" style="position:absolute;left:{left}mm;width:{width}mm;bottom:{bottom}mm;"#,
                "font-size:{size}pt;font-weight:{weight};font-style:{style};opacity:{tone};text-align:{align};",
                r#"white-space:nowrap;overflow:hidden;text-overflow:ellipsis;">{text}</div>"#
            ),
            kind = e.kind.as_str(),
            left = mm(left),
            width = mm(width),
            bottom = mm(bottom),
            size = e.tier.html_pt(),
            weight = match e.weight {
                Weight::Bold => 700,
                Weight::Normal => 400,
            },
            style = if e.italic { "italic" } else { "normal" },
            tone = e.tone,
            align = align,
            text = escape_html(&e.display_text()),
        );
    }

    fn icon_row(&self, html: &mut String, layout: &CardLayout) {
        let size = layout.icons.size * layout.height_mm;
        let _ = write!(
            html,
            r#"<div class="coupon-card__icons" style="position:absolute;left:0;width:100%;top:{top}mm;display:flex;justify-content:center;gap:{gap}mm;">"#,
            top = mm(layout.icons.anchor.y * layout.height_mm),
            gap = ICON_GAP_MM,
        );
        for icon in &layout.icons.icons {
            let _ = write!(
                html,
                r##"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 24 24" style="width:{s}mm;height:{s}mm;" fill="none" stroke="#000000" stroke-width="2" stroke-linecap="round" stroke-linejoin="round">{body}</svg>"##,
                s = mm(size),
                body = icon_svg_body(*icon),
            );
        }
        html.push_str("</div>");
    }

    fn qr_box(&self, html: &mut String, layout: &CardLayout, qr: &QrArtwork) {
        let region_w = layout.region_width_mm(layout.qr.region);
        let size = layout.qr.size * layout.height_mm;
        let _ = write!(
            html,
            concat!(
                r#"<div class="coupon-card__qr" data-qr="{url}" style="position:absolute;left:{left}mm;top:{top}mm;"#,
                r#"width:{s}mm;height:{s}mm;box-sizing:border-box;padding:0.6mm;background:#ffffff;display:flex;align-items:center;justify-content:center;overflow:hidden;">"#,
                "{artwork}</div>"
            ),
            url = escape_html(qr.data()),
            left = mm(layout.qr.anchor.x * region_w - size / 2.0),
            top = mm(layout.qr.anchor.y * layout.height_mm),
            s = mm(size),
            artwork = qr.html_markup(layout.qr.size_px),
        );
    }
}

fn icon_svg_body(icon: Icon) -> &'static str {
    match icon {
        Icon::Percent => {
            r#"<line x1="19" y1="5" x2="5" y2="19"/><circle cx="6.5" cy="6.5" r="2.5"/><circle cx="17.5" cy="17.5" r="2.5"/>"#
        }
        Icon::Maximize => {
            r#"<path d="M8 3H5a2 2 0 0 0-2 2v3m18 0V5a2 2 0 0 0-2-2h-3m0 18h3a2 2 0 0 0 2-2v-3M3 16v3a2 2 0 0 0 2 2h3"/>"#
        }
        Icon::Clock => r#"<circle cx="12" cy="12" r="10"/><polyline points="12 6 12 12 16 14"/>"#,
    }
}

/// Millimetre value rounded to 0.01mm
fn mm(v: f32) -> String {
    let rounded = (v * 100.0).round() / 100.0;
    format!("{rounded}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::error::CardError;
    use crate::layout::compute_layout;
    use crate::qr::{QrImage, QrLevel, QrcodeEncoder, card_artwork};
    use crate::style::{AccentColor, CardStyle};
    use rust_decimal::Decimal;
    use shared::models::{Coupon, DiscountKind, MerchantProfile};

    struct FailingEncoder;

    impl QrEncoder for FailingEncoder {
        fn encode(&self, _url: &str, _size_px: u32, _level: QrLevel) -> crate::error::CardResult<QrImage> {
            Err(CardError::Encoding("simulated".into()))
        }
    }

    fn layout_for(coupon: &Coupon, profile: &MerchantProfile) -> CardLayout {
        let style = CardStyle::new(AccentColor::parse("#87CEEB").unwrap());
        compute_layout(coupon, &style, profile, &CardConfig::default()).unwrap()
    }

    #[test]
    fn test_card_contains_texts_and_qr() {
        let coupon = Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage);
        let layout = layout_for(&coupon, &MerchantProfile::new("Mama Put", "0801"));
        let qr = card_artwork(&QrcodeEncoder, &layout.qr.url, layout.qr.size_px);
        let html = HtmlRenderer.render(&layout, &qr).unwrap();

        assert!(html.contains("Get 15% off."));
        assert!(html.contains("ABCD-1234"));
        assert!(html.contains("Valid until (Expiring date)"));
        assert!(html.contains("MAMA PUT"));
        assert!(html.contains("background:#87CEEB"));
        assert!(html.contains(r#"data-qr="https://buyagain.ng/redeem/ABCD-1234""#));
        assert!(html.contains("<svg"));
        assert!(!html.contains("FAIL"));
    }

    #[test]
    fn test_text_is_escaped() {
        let coupon = Coupon::new("X-1", Decimal::from(5), DiscountKind::Percentage)
            .with_terms("<script>alert(1)</script> & more");
        let layout = layout_for(&coupon, &MerchantProfile::new("Ade & Sons", "0801"));
        let html = HtmlRenderer
            .render(&layout, &QrArtwork::placeholder(layout.qr.url.clone()))
            .unwrap();
        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt; &amp; more"));
        assert!(html.contains("ADE &amp; SONS"));
    }

    #[test]
    fn test_failed_qr_shows_marker() {
        let coupon = Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage);
        let layout = layout_for(&coupon, &MerchantProfile::default());
        let qr = card_artwork(&FailingEncoder, &layout.qr.url, layout.qr.size_px);
        let html = HtmlRenderer.render(&layout, &qr).unwrap();
        assert!(html.contains(">QR<"));
        assert!(html.contains(">FAIL<"));
        assert!(html.contains("Get 15% off."));
    }

    #[test]
    fn test_preview_uses_grey_brand_qr() {
        let coupon = Coupon::new("PREVIEW", Decimal::from(10), DiscountKind::Percentage);
        let layout = layout_for(&coupon, &MerchantProfile::default());
        let html = HtmlRenderer
            .render_preview(&layout, &QrcodeEncoder, "https://buyagain.ng")
            .unwrap();
        assert!(html.contains(r#"data-preview="true""#));
        assert!(html.contains(r#"data-qr="https://buyagain.ng""#));
        assert!(html.contains("#999999"));
    }

    #[test]
    fn test_fallback_card() {
        let html = HtmlRenderer.render_fallback("BAD<1>", "https://buyagain.ng/redeem/BAD<1>");
        assert!(html.contains("coupon-card--fallback"));
        assert!(html.contains("BAD&lt;1&gt;"));
        assert!(html.contains(">FAIL<"));
    }

    #[test]
    fn test_mm_rounding() {
        assert_eq!(mm(58.0), "58");
        assert_eq!(mm(4.2), "4.2");
        assert_eq!(mm(1.0 / 3.0), "0.33");
    }
}
