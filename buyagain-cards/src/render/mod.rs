//! Card renderers
//!
//! Each renderer turns a [`CardLayout`] and its QR artwork into one output
//! format. Renderers hold configuration only; no state is shared between
//! renders.

pub mod html;
pub mod pdf;
pub mod receipt;

pub use html::HtmlRenderer;
pub use pdf::PdfRenderer;
pub use receipt::ReceiptRenderer;

use crate::error::CardResult;
use crate::layout::CardLayout;
use crate::qr::QrArtwork;

pub trait CardRenderer {
    type Output;

    /// Renderer name used in logs
    const NAME: &'static str;

    fn render(&self, layout: &CardLayout, qr: &QrArtwork) -> CardResult<Self::Output>;
}

/// Escape text for HTML element content and attribute values
pub(crate) fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
