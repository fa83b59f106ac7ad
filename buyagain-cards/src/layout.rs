//! Card layout engine
//!
//! Turns a coupon, the merchant profile and a card style into a
//! [`CardLayout`]: every element of the card with its region, anchor,
//! alignment and typography. The layout is pure data measured against a
//! 100mm × 50mm reference card; renderers scale it to their medium.
//!
//! The same inputs always produce an identical layout.

use std::fmt::Write;

use chrono::NaiveDate;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use shared::models::{Coupon, DiscountKind, MerchantProfile};

use crate::config::CardConfig;
use crate::error::{CardError, CardResult};
use crate::qr::{CARD_QR_PX, QrLevel};
use crate::style::{AccentColor, CardStyle};

pub const CARD_WIDTH_MM: f32 = 100.0;
pub const CARD_HEIGHT_MM: f32 = 50.0;
/// Share of the card width taken by the white info region
pub const INFO_RATIO: f32 = 0.58;

pub const HEADLINE: &str = "Thank you for your patronage!";
pub const DESCRIPTION: &str = "Here's a special Discount for your next visit";
pub const TERMS_PLACEHOLDER: &str = "(discount terms / conditions)";
pub const EXPIRY_PLACEHOLDER: &str = "(Expiring date)";

/// Horizontal inset of left-aligned text, as a fraction of the region width
const TEXT_INSET: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    /// White left column (58%)
    Info,
    /// Accent right column (42%)
    Discount,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontTier {
    Header,
    Body,
    Caption,
}

impl FontTier {
    /// Point size on the 100mm HTML card
    pub fn html_pt(self) -> f32 {
        match self {
            FontTier::Header => 9.0,
            FontTier::Body => 6.5,
            FontTier::Caption => 5.0,
        }
    }

    /// Point size on the 180mm PDF card
    pub fn pdf_pt(self) -> f32 {
        match self {
            FontTier::Header => 12.0,
            FontTier::Body => 8.0,
            FontTier::Caption => 6.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Weight {
    Normal,
    Bold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElementKind {
    BusinessName,
    Headline,
    Description,
    Terms,
    Phone,
    Discount,
    Code,
    Validity,
    Copyright,
}

impl ElementKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ElementKind::BusinessName => "business_name",
            ElementKind::Headline => "headline",
            ElementKind::Description => "description",
            ElementKind::Terms => "terms",
            ElementKind::Phone => "phone",
            ElementKind::Discount => "discount",
            ElementKind::Code => "code",
            ElementKind::Validity => "validity",
            ElementKind::Copyright => "copyright",
        }
    }
}

/// Position inside a region, as fractions of its width and height
///
/// `y` is the text baseline, measured from the top of the card.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    pub x: f32,
    pub y: f32,
}

impl Anchor {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// One line of text on the card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutElement {
    pub kind: ElementKind,
    pub region: Region,
    pub anchor: Anchor,
    pub align: Align,
    pub tier: FontTier,
    pub weight: Weight,
    pub italic: bool,
    pub uppercase: bool,
    /// Text opacity on white, 1.0 is solid black
    pub tone: f32,
    /// Fixed label printed before `text` (e.g. `Valid until `)
    pub prefix: Option<String>,
    pub text: String,
}

impl LayoutElement {
    /// Text as printed: prefix, content, case transform
    pub fn display_text(&self) -> String {
        let full = match &self.prefix {
            Some(prefix) => format!("{prefix}{}", self.text),
            None => self.text.clone(),
        };
        if self.uppercase {
            full.to_uppercase()
        } else {
            full
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Icon {
    Percent,
    Maximize,
    Clock,
}

/// Decorative icon row at the top of the discount region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconRow {
    pub anchor: Anchor,
    /// Icon edge as a fraction of the card height
    pub size: f32,
    pub icons: Vec<Icon>,
}

/// Where the QR goes and what it encodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QrSlot {
    pub region: Region,
    /// Horizontal center and top edge
    pub anchor: Anchor,
    /// Edge length as a fraction of the card height
    pub size: f32,
    pub size_px: u32,
    pub level: QrLevel,
    pub url: String,
}

/// Fully resolved card
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardLayout {
    pub width_mm: f32,
    pub height_mm: f32,
    pub info_ratio: f32,
    pub accent: AccentColor,
    /// Coupon code, for logs and markup attributes
    pub code: String,
    pub elements: Vec<LayoutElement>,
    pub icons: IconRow,
    pub qr: QrSlot,
}

impl CardLayout {
    /// Width of a region in reference millimetres
    pub fn region_width_mm(&self, region: Region) -> f32 {
        match region {
            Region::Info => self.width_mm * self.info_ratio,
            Region::Discount => self.width_mm * (1.0 - self.info_ratio),
        }
    }

    /// Left edge of a region in reference millimetres
    pub fn region_left_mm(&self, region: Region) -> f32 {
        match region {
            Region::Info => 0.0,
            Region::Discount => self.width_mm * self.info_ratio,
        }
    }

    pub fn element(&self, kind: ElementKind) -> Option<&LayoutElement> {
        self.elements.iter().find(|e| e.kind == kind)
    }

    /// Printed text of an element
    pub fn text(&self, kind: ElementKind) -> Option<String> {
        self.element(kind).map(LayoutElement::display_text)
    }
}

/// `15%` / `₦500`
pub fn discount_amount(value: Decimal, kind: DiscountKind) -> String {
    match kind {
        DiscountKind::Percentage => format!("{}%", value.normalize()),
        DiscountKind::FixedAmount => {
            let naira = value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
            format!("₦{}", naira.normalize())
        }
    }
}

/// `Get 15% off.` / `Get ₦500 off.`
pub fn format_discount(value: Decimal, kind: DiscountKind) -> String {
    format!("Get {} off.", discount_amount(value, kind))
}

/// Format an expiry date, rejecting malformed strftime patterns
pub fn format_expiry(date: NaiveDate, pattern: &str) -> CardResult<String> {
    let mut out = String::new();
    write!(out, "{}", date.format(pattern)).map_err(|_| {
        CardError::validation(
            ErrorCode::InvalidFormat,
            format!("invalid date format {pattern:?}"),
        )
    })?;
    Ok(out)
}

struct TextSpec {
    kind: ElementKind,
    region: Region,
    anchor: Anchor,
    tier: FontTier,
    weight: Weight,
    tone: f32,
}

impl TextSpec {
    fn element(self, text: impl Into<String>) -> LayoutElement {
        LayoutElement {
            kind: self.kind,
            region: self.region,
            anchor: self.anchor,
            align: match self.region {
                Region::Info => Align::Left,
                Region::Discount => Align::Center,
            },
            tier: self.tier,
            weight: self.weight,
            italic: false,
            uppercase: false,
            tone: self.tone,
            prefix: None,
            text: text.into(),
        }
    }
}

const fn info(kind: ElementKind, y: f32, tier: FontTier, weight: Weight, tone: f32) -> TextSpec {
    TextSpec {
        kind,
        region: Region::Info,
        anchor: Anchor::new(TEXT_INSET, y),
        tier,
        weight,
        tone,
    }
}

const fn discount(kind: ElementKind, y: f32, tier: FontTier, weight: Weight, tone: f32) -> TextSpec {
    TextSpec {
        kind,
        region: Region::Discount,
        anchor: Anchor::new(0.5, y),
        tier,
        weight,
        tone,
    }
}

/// QR top edge and size, as fractions of the card height
const QR_TOP: f32 = 0.32;
const QR_SIZE: f32 = 0.26;

/// Compute the layout of one card
pub fn compute_layout(
    coupon: &Coupon,
    style: &CardStyle,
    profile: &MerchantProfile,
    config: &CardConfig,
) -> CardResult<CardLayout> {
    coupon.validate().map_err(CardError::Validation)?;

    let expiry = match coupon.expiry_date {
        Some(date) => format_expiry(date, &config.date_format)?,
        None => EXPIRY_PLACEHOLDER.to_string(),
    };
    let code = coupon.code.trim().to_string();
    let below_qr = QR_TOP + QR_SIZE;

    let mut business = info(ElementKind::BusinessName, 0.15, FontTier::Body, Weight::Bold, 1.0)
        .element(profile.display_name());
    business.uppercase = true;

    let mut terms = info(ElementKind::Terms, 0.45, FontTier::Caption, Weight::Normal, 0.6)
        .element(coupon.terms().unwrap_or(TERMS_PLACEHOLDER));
    terms.italic = true;

    let mut phone = info(ElementKind::Phone, 0.85, FontTier::Caption, Weight::Bold, 1.0)
        .element(profile.display_phone());
    phone.prefix = Some("Business Phone: ".into());

    let mut validity =
        discount(ElementKind::Validity, below_qr + 0.18, FontTier::Caption, Weight::Normal, 0.85)
            .element(expiry);
    validity.prefix = Some("Valid until ".into());

    let elements = vec![
        business,
        info(ElementKind::Headline, 0.27, FontTier::Header, Weight::Bold, 1.0).element(HEADLINE),
        info(ElementKind::Description, 0.36, FontTier::Body, Weight::Normal, 0.8)
            .element(DESCRIPTION),
        terms,
        phone,
        discount(ElementKind::Discount, 0.27, FontTier::Body, Weight::Bold, 1.0).element(
            format_discount(coupon.discount_value, coupon.discount_kind),
        ),
        discount(ElementKind::Code, below_qr + 0.09, FontTier::Caption, Weight::Bold, 1.0)
            .element(code.clone()),
        validity,
        discount(ElementKind::Copyright, below_qr + 0.28, FontTier::Caption, Weight::Normal, 0.6)
            .element(format!("© {}", config.brand_domain)),
    ];

    Ok(CardLayout {
        width_mm: CARD_WIDTH_MM,
        height_mm: CARD_HEIGHT_MM,
        info_ratio: INFO_RATIO,
        accent: style.accent_color,
        qr: QrSlot {
            region: Region::Discount,
            anchor: Anchor::new(0.5, QR_TOP),
            size: QR_SIZE,
            size_px: CARD_QR_PX,
            level: QrLevel::M,
            url: config.redemption_url(&code),
        },
        code,
        elements,
        icons: IconRow {
            anchor: Anchor::new(0.5, 0.06),
            size: 0.08,
            icons: vec![Icon::Percent, Icon::Maximize, Icon::Clock],
        },
    })
}
