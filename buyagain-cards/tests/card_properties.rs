use buyagain_cards::layout::{ElementKind, EXPIRY_PLACEHOLDER};
use buyagain_cards::qr::card_artwork;
use buyagain_cards::{
    CardConfig, CardError, CardRenderer, CardResult, CardStyle, HtmlRenderer, PALETTE,
    PdfRenderer, QrEncoder, QrImage, QrLevel, compute_layout,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use shared::models::{Coupon, DiscountKind, MerchantProfile};

struct FailingEncoder;

impl QrEncoder for FailingEncoder {
    fn encode(&self, _url: &str, _size_px: u32, _level: QrLevel) -> CardResult<QrImage> {
        Err(CardError::Encoding("simulated".into()))
    }
}

fn profile() -> MerchantProfile {
    MerchantProfile::new("Mama Put", "08012345678")
}

#[test]
fn test_layout_is_deterministic() {
    let coupon = Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage)
        .with_expiry(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap())
        .with_terms("Weekdays only");
    let style = CardStyle::default();
    let config = CardConfig::default();

    let a = compute_layout(&coupon, &style, &profile(), &config).unwrap();
    let b = compute_layout(&coupon, &style, &profile(), &config).unwrap();
    assert_eq!(a, b);
    assert_eq!(
        serde_json::to_string(&a).unwrap(),
        serde_json::to_string(&b).unwrap()
    );
}

#[test]
fn test_discount_formats() {
    let config = CardConfig::default();
    let cases = [
        (Decimal::from(15), DiscountKind::Percentage, "Get 15% off."),
        (Decimal::from(500), DiscountKind::FixedAmount, "Get ₦500 off."),
    ];
    for (value, kind, expected) in cases {
        let coupon = Coupon::new("X-1", value, kind);
        let layout = compute_layout(&coupon, &CardStyle::default(), &profile(), &config).unwrap();
        assert_eq!(layout.text(ElementKind::Discount).unwrap(), expected);
    }
}

#[test]
fn test_expiry_text() {
    let config = CardConfig::default();
    let coupon = Coupon::new("X-1", Decimal::from(5), DiscountKind::Percentage);
    let layout = compute_layout(&coupon, &CardStyle::default(), &profile(), &config).unwrap();
    assert_eq!(
        layout.text(ElementKind::Validity).unwrap(),
        format!("Valid until {EXPIRY_PLACEHOLDER}")
    );

    let coupon = coupon.with_expiry(NaiveDate::from_ymd_opt(2026, 12, 31).unwrap());
    let layout = compute_layout(&coupon, &CardStyle::default(), &profile(), &config).unwrap();
    assert_eq!(layout.text(ElementKind::Validity).unwrap(), "Valid until 31/12/2026");
}

#[test]
fn test_color_cycle_has_period_five() {
    for start in PALETTE {
        let mut style = CardStyle::new(start);
        for _ in 0..5 {
            style.cycle_color();
        }
        assert_eq!(style.accent_color, start);
    }

    let mut a = CardStyle::default();
    let mut b = CardStyle::default();
    for _ in 0..13 {
        a.cycle_color();
    }
    for _ in 0..3 {
        b.cycle_color();
    }
    assert_eq!(a, b);
}

#[test]
fn test_failed_qr_is_marked_not_raised() {
    let coupon = Coupon::new("ABCD-1234", Decimal::from(15), DiscountKind::Percentage);
    let layout =
        compute_layout(&coupon, &CardStyle::default(), &profile(), &CardConfig::default()).unwrap();
    let qr = card_artwork(&FailingEncoder, &layout.qr.url, layout.qr.size_px);

    let html = HtmlRenderer.render(&layout, &qr).unwrap();
    assert!(html.contains(">QR<") && html.contains(">FAIL<"));

    let pdf = PdfRenderer::default().render(&layout, &qr).unwrap();
    assert!(pdf.placeholder_qr);
    assert!(pdf.bytes.starts_with(b"%PDF-"));
}

#[test]
fn test_invalid_coupons_rejected() {
    let config = CardConfig::default();
    for coupon in [
        Coupon::new("", Decimal::from(10), DiscountKind::Percentage),
        Coupon::new("X-1", Decimal::ZERO, DiscountKind::Percentage),
        Coupon::new("X-1", Decimal::from(-5), DiscountKind::FixedAmount),
    ] {
        let result = compute_layout(&coupon, &CardStyle::default(), &profile(), &config);
        assert!(matches!(result, Err(CardError::Validation(_))));
    }
}
