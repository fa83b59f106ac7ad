//! Card accent color and palette cycling

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;

use crate::error::CardError;

/// An sRGB color written as `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccentColor {
    r: u8,
    g: u8,
    b: u8,
}

/// Accent colors offered by the "change color" control, in cycle order
pub const PALETTE: [AccentColor; 5] = [
    AccentColor::rgb(0x87, 0xCE, 0xEB),
    AccentColor::rgb(0xFF, 0xB6, 0xC1),
    AccentColor::rgb(0x98, 0xFB, 0x98),
    AccentColor::rgb(0xFF, 0xD7, 0x00),
    AccentColor::rgb(0xDD, 0xA0, 0xDD),
];

impl AccentColor {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (case-insensitive)
    pub fn parse(s: &str) -> Result<Self, CardError> {
        let invalid = || {
            CardError::validation(
                ErrorCode::AccentColorInvalid,
                format!("invalid accent color {s:?}, expected #RRGGBB"),
            )
        };
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Channels scaled to 0.0..=1.0 (PDF color space)
    pub fn to_unit_rgb(self) -> (f32, f32, f32) {
        (
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
        )
    }

    /// Next palette entry, wrapping after the last
    ///
    /// A color that is not in the palette moves to the first entry.
    pub fn next(self) -> Self {
        match PALETTE.iter().position(|c| *c == self) {
            Some(i) => PALETTE[(i + 1) % PALETTE.len()],
            None => PALETTE[0],
        }
    }
}

impl Default for AccentColor {
    fn default() -> Self {
        PALETTE[0]
    }
}

impl fmt::Display for AccentColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl FromStr for AccentColor {
    type Err = CardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for AccentColor {
    type Error = CardError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<AccentColor> for String {
    fn from(c: AccentColor) -> Self {
        c.to_string()
    }
}

/// Visual style of a card, a snapshot taken when an export starts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardStyle {
    pub accent_color: AccentColor,
}

impl CardStyle {
    pub fn new(accent_color: AccentColor) -> Self {
        Self { accent_color }
    }

    /// "Change color" control
    pub fn cycle_color(&mut self) {
        self.accent_color = self.accent_color.next();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_display() {
        let c = AccentColor::parse("#87ceeb").unwrap();
        assert_eq!(c, PALETTE[0]);
        assert_eq!(c.to_string(), "#87CEEB");

        assert!(AccentColor::parse("87CEEB").is_err());
        assert!(AccentColor::parse("#87CEE").is_err());
        assert!(AccentColor::parse("#GGGGGG").is_err());
        assert!(AccentColor::parse("#8₦CEEB").is_err());
    }

    #[test]
    fn test_cycle_wraps() {
        assert_eq!(PALETTE[4].next(), PALETTE[0]);
        assert_eq!(PALETTE[1].next(), PALETTE[2]);
    }

    #[test]
    fn test_cycle_period_is_five() {
        for start in PALETTE {
            let mut style = CardStyle::new(start);
            for _ in 0..5 {
                style.cycle_color();
            }
            assert_eq!(style.accent_color, start);

            // N presses == N mod 5 presses
            let mut a = CardStyle::new(start);
            let mut b = CardStyle::new(start);
            for _ in 0..13 {
                a.cycle_color();
            }
            for _ in 0..(13 % 5) {
                b.cycle_color();
            }
            assert_eq!(a, b);
        }
    }

    #[test]
    fn test_unknown_color_moves_to_first() {
        let custom = AccentColor::parse("#123456").unwrap();
        assert_eq!(custom.next(), PALETTE[0]);
    }

    #[test]
    fn test_serde_as_hex() {
        let style = CardStyle::default();
        let json = serde_json::to_string(&style).unwrap();
        assert_eq!(json, r##"{"accentColor":"#87CEEB"}"##);
        let back: CardStyle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, style);
        assert!(serde_json::from_str::<CardStyle>(r#"{"accentColor":"blue"}"#).is_err());
    }
}
