//! PDF card renderer
//!
//! One A4 page with the card centred on it. Placement is planned first in
//! page millimetres (top-left origin) and painted afterwards, flipping to
//! the PDF bottom-left origin only at paint time.
//!
//! The builtin Helvetica faces are WinAnsi-only: `₦` is written as `NGN` and
//! anything outside Latin-1 as `?`. Text is measured with the Helvetica
//! metrics and shrunk until it fits its region.

use std::io::BufWriter;

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, ColorBits, ColorSpace, Image, ImageTransform, ImageXObject,
    IndirectFontRef, Line, Mm, PdfDocument as PdfDoc, PdfLayerReference, Point, Polygon, Px, Rgb,
};
use tracing::instrument;

use super::CardRenderer;
use crate::artifact::PdfDocument;
use crate::error::{CardError, CardResult};
use crate::layout::{Align, CardLayout, ElementKind, Icon, LayoutElement, Region, Weight};
use crate::qr::QrArtwork;
use crate::state::ExportAction;
use crate::style::AccentColor;

pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;
pub const PDF_CARD_WIDTH_MM: f32 = 180.0;
pub const PDF_FILE_NAME: &str = "discount-card.pdf";

const PT_TO_MM: f32 = 0.352_778;
const MIN_FONT_PT: f32 = 4.0;
/// Horizontal padding of centered text
const CENTER_PAD_MM: f32 = 4.0;
/// White frame around the QR
const QR_FRAME_MM: f32 = 1.5;
const ICON_GAP_MM: f32 = 3.0;
/// Raster size used when embedding the QR
const QR_RASTER_PX: u32 = 300;

// Helvetica advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    278, 278, 584, 584, 584, 556, 1015, // :..@
    667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611, // A-Z
    278, 278, 278, 469, 556, 333, // [..`
    556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, 556, 556, 333, 500,
    278, 556, 500, 722, 500, 500, 500, // a-z
    334, 260, 334, 584, // {..~
];

const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // ' '../
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, // 0-9
    333, 333, 584, 584, 584, 611, 975, // :..@
    722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, 667, 778, 722, 667,
    611, 722, 667, 944, 667, 667, 611, // A-Z
    333, 278, 333, 584, 556, 333, // [..`
    556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, 611, 611, 389, 556,
    333, 611, 556, 778, 556, 556, 500, // a-z
    389, 280, 389, 584, // {..~
];

/// Rectangle in page millimetres, top-left origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectMm {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl RectMm {
    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> f32 {
        self.x + self.width / 2.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PdfFont {
    Regular,
    Bold,
    Oblique,
    BoldOblique,
}

impl PdfFont {
    fn for_element(e: &LayoutElement) -> Self {
        match (e.weight, e.italic) {
            (Weight::Normal, false) => PdfFont::Regular,
            (Weight::Bold, false) => PdfFont::Bold,
            (Weight::Normal, true) => PdfFont::Oblique,
            (Weight::Bold, true) => PdfFont::BoldOblique,
        }
    }

    fn builtin(self) -> BuiltinFont {
        match self {
            PdfFont::Regular => BuiltinFont::Helvetica,
            PdfFont::Bold => BuiltinFont::HelveticaBold,
            PdfFont::Oblique => BuiltinFont::HelveticaOblique,
            PdfFont::BoldOblique => BuiltinFont::HelveticaBoldOblique,
        }
    }

    fn is_bold(self) -> bool {
        matches!(self, PdfFont::Bold | PdfFont::BoldOblique)
    }
}

/// A line of text positioned on the page
#[derive(Debug, Clone, PartialEq)]
pub struct TextPlacement {
    pub kind: ElementKind,
    /// Text as written to the PDF (WinAnsi-safe)
    pub text: String,
    pub font: PdfFont,
    pub size_pt: f32,
    /// Left edge of the text
    pub x_mm: f32,
    /// Baseline, from the top of the page
    pub baseline_mm: f32,
    pub width_mm: f32,
    /// Region the text must stay inside
    pub region: RectMm,
}

/// Advance width of `text` in millimetres
pub fn text_width_mm(text: &str, font: PdfFont, size_pt: f32) -> f32 {
    let table = if font.is_bold() {
        &HELVETICA_BOLD
    } else {
        &HELVETICA
    };
    let units: u32 = text
        .chars()
        .map(|c| match c as u32 {
            code @ 32..=126 => table[(code - 32) as usize] as u32,
            0xA9 => 737,
            _ => 556,
        })
        .sum();
    units as f32 / 1000.0 * size_pt * PT_TO_MM
}

/// Make text writable with the builtin WinAnsi fonts
pub fn pdf_text(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '₦' => out.push_str("NGN"),
            c if (c as u32) < 0x100 => out.push(c),
            _ => out.push('?'),
        }
    }
    out
}

/// Shrink, then truncate, until the text fits `avail_mm`
fn fit_text(text: String, font: PdfFont, base_pt: f32, avail_mm: f32) -> (String, f32, f32) {
    let width = text_width_mm(&text, font, base_pt);
    if width <= avail_mm {
        return (text, base_pt, width);
    }

    let fitted = (base_pt * avail_mm / width * 10.0).floor() / 10.0;
    if fitted >= MIN_FONT_PT {
        let width = text_width_mm(&text, font, fitted);
        return (text, fitted, width);
    }

    let mut chars: Vec<char> = text.chars().collect();
    loop {
        chars.pop();
        let candidate = format!("{}...", chars.iter().collect::<String>().trim_end());
        let width = text_width_mm(&candidate, font, MIN_FONT_PT);
        if width <= avail_mm || chars.is_empty() {
            return (candidate, MIN_FONT_PT, width);
        }
    }
}

struct PagePlan {
    card: RectMm,
    info: RectMm,
    discount: RectMm,
    accent: AccentColor,
    texts: Vec<TextPlacement>,
    qr: RectMm,
    icons: Vec<(Icon, RectMm)>,
}

#[derive(Debug, Clone)]
pub struct PdfRenderer {
    card_width_mm: f32,
    file_name: String,
}

impl Default for PdfRenderer {
    fn default() -> Self {
        Self {
            card_width_mm: PDF_CARD_WIDTH_MM,
            file_name: PDF_FILE_NAME.to_string(),
        }
    }
}

impl PdfRenderer {
    fn plan(&self, layout: &CardLayout) -> PagePlan {
        let scale = self.card_width_mm / layout.width_mm;
        let card = RectMm {
            x: (A4_WIDTH_MM - self.card_width_mm) / 2.0,
            y: (A4_HEIGHT_MM - layout.height_mm * scale) / 2.0,
            width: self.card_width_mm,
            height: layout.height_mm * scale,
        };
        let region_rect = |region: Region| RectMm {
            x: card.x + layout.region_left_mm(region) * scale,
            y: card.y,
            width: layout.region_width_mm(region) * scale,
            height: card.height,
        };
        let info = region_rect(Region::Info);
        let discount = region_rect(Region::Discount);

        let texts = layout
            .elements
            .iter()
            .map(|e| {
                let region = region_rect(e.region);
                let font = PdfFont::for_element(e);
                let text = pdf_text(&e.display_text());
                let (inset, avail) = match e.align {
                    Align::Left => {
                        let inset = e.anchor.x * region.width;
                        (inset, region.width - 2.0 * inset)
                    }
                    Align::Center => (CENTER_PAD_MM, region.width - 2.0 * CENTER_PAD_MM),
                };
                let (text, size_pt, width_mm) = fit_text(text, font, e.tier.pdf_pt(), avail);
                let x_mm = match e.align {
                    Align::Left => region.x + inset,
                    Align::Center => region.center_x() - width_mm / 2.0,
                };
                TextPlacement {
                    kind: e.kind,
                    text,
                    font,
                    size_pt,
                    x_mm,
                    baseline_mm: card.y + e.anchor.y * card.height,
                    width_mm,
                    region,
                }
            })
            .collect();

        let qr_region = region_rect(layout.qr.region);
        let qr_size = layout.qr.size * card.height;
        let qr = RectMm {
            x: qr_region.x + layout.qr.anchor.x * qr_region.width - qr_size / 2.0,
            y: card.y + layout.qr.anchor.y * card.height,
            width: qr_size,
            height: qr_size,
        };

        let icon_size = layout.icons.size * card.height;
        let count = layout.icons.icons.len() as f32;
        let total = count * icon_size + (count - 1.0).max(0.0) * ICON_GAP_MM;
        let start = discount.x + layout.icons.anchor.x * discount.width - total / 2.0;
        let icons = layout
            .icons
            .icons
            .iter()
            .enumerate()
            .map(|(i, icon)| {
                (
                    *icon,
                    RectMm {
                        x: start + i as f32 * (icon_size + ICON_GAP_MM),
                        y: card.y + layout.icons.anchor.y * card.height,
                        width: icon_size,
                        height: icon_size,
                    },
                )
            })
            .collect();

        PagePlan {
            card,
            info,
            discount,
            accent: layout.accent,
            texts,
            qr,
            icons,
        }
    }

    /// PDF bytes, and whether the QR slot holds the placeholder box
    fn paint(&self, plan: &PagePlan, qr: &QrArtwork) -> Result<(Vec<u8>, bool), String> {
        let (doc, page, layer) =
            PdfDoc::new("Discount Card", Mm(A4_WIDTH_MM), Mm(A4_HEIGHT_MM), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);

        let add_font = |font: PdfFont| {
            doc.add_builtin_font(font.builtin())
                .map_err(|e| format!("font {font:?}: {e}"))
        };
        let fonts = [
            (PdfFont::Regular, add_font(PdfFont::Regular)?),
            (PdfFont::Bold, add_font(PdfFont::Bold)?),
            (PdfFont::Oblique, add_font(PdfFont::Oblique)?),
            (PdfFont::BoldOblique, add_font(PdfFont::BoldOblique)?),
        ];

        // card background and accent column
        fill_rect(&layer, plan.info, rgb(1.0, 1.0, 1.0));
        let (r, g, b) = plan.accent.to_unit_rgb();
        fill_rect(&layer, plan.discount, rgb(r, g, b));
        layer.set_outline_color(rgb(0.85, 0.85, 0.85));
        layer.set_outline_thickness(0.5);
        stroke_rect(&layer, plan.card);

        // icons
        layer.set_outline_color(rgb(0.0, 0.0, 0.0));
        layer.set_outline_thickness(0.6);
        for (icon, rect) in &plan.icons {
            draw_icon(&layer, *icon, *rect);
        }

        // QR with white frame
        let frame = RectMm {
            x: plan.qr.x - QR_FRAME_MM,
            y: plan.qr.y - QR_FRAME_MM,
            width: plan.qr.width + 2.0 * QR_FRAME_MM,
            height: plan.qr.height + 2.0 * QR_FRAME_MM,
        };
        fill_rect(&layer, frame, rgb(1.0, 1.0, 1.0));
        let placeholder = match qr.raster(QR_RASTER_PX) {
            Some(img) => {
                let (w, h) = img.dimensions();
                let image = Image::from(ImageXObject {
                    width: Px(w as usize),
                    height: Px(h as usize),
                    color_space: ColorSpace::Greyscale,
                    bits_per_component: ColorBits::Bit8,
                    interpolate: false,
                    image_data: img.into_raw(),
                    image_filter: None,
                    clipping_bbox: None,
                    smask: None,
                });
                let dpi = w as f32 / (plan.qr.width / 25.4);
                image.add_to_layer(
                    layer.clone(),
                    ImageTransform {
                        translate_x: Some(Mm(plan.qr.x)),
                        translate_y: Some(Mm(A4_HEIGHT_MM - plan.qr.bottom())),
                        dpi: Some(dpi),
                        ..Default::default()
                    },
                );
                false
            }
            None => {
                layer.set_outline_color(rgb(0.6, 0.6, 0.6));
                layer.set_outline_thickness(0.5);
                stroke_rect(&layer, plan.qr);
                let label = "QR Code";
                let size = 6.0;
                let width = text_width_mm(label, PdfFont::Regular, size);
                layer.set_fill_color(rgb(0.4, 0.4, 0.4));
                layer.use_text(
                    label,
                    size,
                    Mm(plan.qr.center_x() - width / 2.0),
                    Mm(A4_HEIGHT_MM - (plan.qr.y + plan.qr.height / 2.0 + 1.0)),
                    font_ref(&fonts, PdfFont::Regular),
                );
                true
            }
        };

        for t in &plan.texts {
            let gray = text_gray(t.kind);
            layer.set_fill_color(rgb(gray, gray, gray));
            layer.use_text(
                t.text.clone(),
                t.size_pt,
                Mm(t.x_mm),
                Mm(A4_HEIGHT_MM - t.baseline_mm),
                font_ref(&fonts, t.font),
            );
        }

        let mut writer = BufWriter::new(Vec::new());
        doc.save(&mut writer).map_err(|e| e.to_string())?;
        let bytes = writer.into_inner().map_err(|e| e.to_string())?;
        Ok((bytes, placeholder))
    }
}

impl CardRenderer for PdfRenderer {
    type Output = PdfDocument;

    const NAME: &'static str = "pdf";

    #[instrument(skip_all, fields(code = %layout.code, renderer = Self::NAME))]
    fn render(&self, layout: &CardLayout, qr: &QrArtwork) -> CardResult<PdfDocument> {
        let plan = self.plan(layout);
        let (bytes, placeholder_qr) = self
            .paint(&plan, qr)
            .map_err(|reason| CardError::export(ExportAction::DownloadPdf, reason))?;

        Ok(PdfDocument {
            file_name: self.file_name.clone(),
            bytes,
            page_count: 1,
            card: plan.card,
            discount_region: plan.discount,
            texts: plan.texts,
            placeholder_qr,
        })
    }
}

fn font_ref(fonts: &[(PdfFont, IndirectFontRef)], font: PdfFont) -> &IndirectFontRef {
    fonts
        .iter()
        .find(|(f, _)| *f == font)
        .map(|(_, r)| r)
        .unwrap_or(&fonts[0].1)
}

/// Gray level of each text line (0 is black)
fn text_gray(kind: ElementKind) -> f32 {
    match kind {
        ElementKind::Description => 0.2,
        ElementKind::Terms | ElementKind::Copyright => 0.4,
        ElementKind::Validity => 0.15,
        _ => 0.0,
    }
}

fn rgb(r: f32, g: f32, b: f32) -> Color {
    Color::Rgb(Rgb::new(r, g, b, None))
}

fn corners(rect: RectMm) -> Vec<(Point, bool)> {
    let top = A4_HEIGHT_MM - rect.y;
    let bottom = A4_HEIGHT_MM - rect.bottom();
    vec![
        (Point::new(Mm(rect.x), Mm(bottom)), false),
        (Point::new(Mm(rect.right()), Mm(bottom)), false),
        (Point::new(Mm(rect.right()), Mm(top)), false),
        (Point::new(Mm(rect.x), Mm(top)), false),
    ]
}

fn fill_rect(layer: &PdfLayerReference, rect: RectMm, color: Color) {
    layer.set_fill_color(color);
    layer.add_polygon(Polygon {
        rings: vec![corners(rect)],
        mode: PaintMode::Fill,
        winding_order: WindingOrder::NonZero,
    });
}

fn stroke_rect(layer: &PdfLayerReference, rect: RectMm) {
    layer.add_line(Line {
        points: corners(rect),
        is_closed: true,
    });
}

/// Stroke a polyline given in unit coordinates of `rect` (0..1, top-left origin)
fn stroke_unit(layer: &PdfLayerReference, rect: RectMm, points: &[(f32, f32)], closed: bool) {
    let points = points
        .iter()
        .map(|(u, v)| {
            (
                Point::new(
                    Mm(rect.x + u * rect.width),
                    Mm(A4_HEIGHT_MM - (rect.y + v * rect.height)),
                ),
                false,
            )
        })
        .collect();
    layer.add_line(Line {
        points,
        is_closed: closed,
    });
}

fn circle(cx: f32, cy: f32, r: f32) -> Vec<(f32, f32)> {
    (0..24)
        .map(|i| {
            let a = i as f32 / 24.0 * std::f32::consts::TAU;
            (cx + r * a.cos(), cy + r * a.sin())
        })
        .collect()
}

fn draw_icon(layer: &PdfLayerReference, icon: Icon, rect: RectMm) {
    match icon {
        Icon::Percent => {
            stroke_unit(layer, rect, &[(0.8, 0.2), (0.2, 0.8)], false);
            stroke_unit(layer, rect, &circle(0.27, 0.27, 0.1), true);
            stroke_unit(layer, rect, &circle(0.73, 0.73, 0.1), true);
        }
        Icon::Maximize => {
            for corner in [
                [(0.35, 0.1), (0.1, 0.1), (0.1, 0.35)],
                [(0.65, 0.1), (0.9, 0.1), (0.9, 0.35)],
                [(0.9, 0.65), (0.9, 0.9), (0.65, 0.9)],
                [(0.35, 0.9), (0.1, 0.9), (0.1, 0.65)],
            ] {
                stroke_unit(layer, rect, &corner, false);
            }
        }
        Icon::Clock => {
            stroke_unit(layer, rect, &circle(0.5, 0.5, 0.42), true);
            stroke_unit(layer, rect, &[(0.5, 0.25), (0.5, 0.5), (0.67, 0.58)], false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CardConfig;
    use crate::layout::compute_layout;
    use crate::qr::{QrcodeEncoder, card_artwork};
    use crate::style::CardStyle;
    use rust_decimal::Decimal;
    use shared::models::{Coupon, DiscountKind, MerchantProfile};

    fn layout(profile: MerchantProfile, coupon: Coupon) -> CardLayout {
        compute_layout(&coupon, &CardStyle::default(), &profile, &CardConfig::default()).unwrap()
    }

    #[test]
    fn test_text_width() {
        // "Hi" in Helvetica: H 722 + i 222 = 944 units
        let w = text_width_mm("Hi", PdfFont::Regular, 10.0);
        assert!((w - 0.944 * 10.0 * PT_TO_MM).abs() < 1e-4);
        assert!(text_width_mm("Hi", PdfFont::Bold, 10.0) > w);
    }

    #[test]
    fn test_pdf_text_is_winansi() {
        assert_eq!(pdf_text("Get ₦500 off."), "Get NGN500 off.");
        assert_eq!(pdf_text("© buyagain.ng"), "© buyagain.ng");
        assert_eq!(pdf_text("餐厅"), "??");
    }

    #[test]
    fn test_fit_text_shrinks_then_truncates() {
        let long = "A".repeat(40);
        let (text, size, width) = fit_text(long.clone(), PdfFont::Regular, 12.0, 80.0);
        assert_eq!(text, long);
        assert!(size < 12.0 && size >= MIN_FONT_PT);
        assert!(width <= 80.0 + 1e-3);

        let huge = "W".repeat(400);
        let (text, size, width) = fit_text(huge, PdfFont::Bold, 12.0, 50.0);
        assert!(text.ends_with("..."));
        assert_eq!(size, MIN_FONT_PT);
        assert!(width <= 50.0 + 1e-3);
    }

    #[test]
    fn test_single_a4_page_centred() {
        let layout = layout(
            MerchantProfile::new("Mama Put", "0801"),
            Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage),
        );
        let qr = card_artwork(&QrcodeEncoder, &layout.qr.url, layout.qr.size_px);
        let doc = PdfRenderer::default().render(&layout, &qr).unwrap();

        assert!(doc.bytes.starts_with(b"%PDF-"));
        assert_eq!(doc.page_count, 1);
        assert_eq!(doc.file_name, "discount-card.pdf");
        assert!((doc.card.center_x() - A4_WIDTH_MM / 2.0).abs() < 1e-3);
        assert!((doc.card.y + doc.card.height / 2.0 - A4_HEIGHT_MM / 2.0).abs() < 1e-3);
        assert!((doc.card.width / doc.card.height - 2.0).abs() < 1e-3);
        assert!(!doc.placeholder_qr);

        let discount = doc
            .texts
            .iter()
            .find(|t| t.kind == ElementKind::Discount)
            .unwrap();
        assert_eq!(discount.text, "Get 15% off.");
        assert!(discount.x_mm >= doc.discount_region.x);
        assert!(discount.x_mm + discount.width_mm <= doc.discount_region.right());
        let center = discount.x_mm + discount.width_mm / 2.0;
        assert!((center - doc.discount_region.center_x()).abs() < 1e-3);
    }

    #[test]
    fn test_long_text_never_overflows() {
        let layout = layout(
            MerchantProfile::new(
                "The Extremely Long Business Name Of A Restaurant In Lekki Phase One",
                "0801",
            ),
            Coupon::new("ABCD-1234", Decimal::from(1_000_000), DiscountKind::FixedAmount)
                .with_terms("Valid on weekdays only, excluding public holidays, one per table, not combinable with other offers"),
        );
        let doc = PdfRenderer::default()
            .render(&layout, &QrArtwork::placeholder(layout.qr.url.clone()))
            .unwrap();

        assert!(doc.placeholder_qr);
        for t in &doc.texts {
            assert!(t.x_mm >= t.region.x - 1e-3, "{:?} starts outside", t.kind);
            assert!(t.x_mm + t.width_mm <= t.region.right() + 1e-3, "{:?} overflows", t.kind);
        }
    }

    #[test]
    fn test_undecodable_remote_qr_is_flagged() {
        let layout = layout(
            MerchantProfile::new("Mama Put", "0801"),
            Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage),
        );
        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend_from_slice(&[0u8; 32]);
        let qr = QrArtwork::Remote {
            data: layout.qr.url.clone(),
            png,
        };

        let doc = PdfRenderer::default().render(&layout, &qr).unwrap();
        assert!(doc.placeholder_qr);
        assert!(doc.bytes.starts_with(b"%PDF-"));
    }
}
