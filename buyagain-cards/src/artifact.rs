//! Export artifacts handed to the presentation sink
//!
//! Artifacts are write-once: renderers build them, the sink consumes them.

use crate::render::pdf::{RectMm, TextPlacement};

/// Printable markup for a batch of cards plus its print-only stylesheet
#[derive(Debug, Clone, PartialEq)]
pub struct PrintDocument {
    /// DOM id of the injected container, scopes the stylesheet
    pub mount_id: String,
    pub markup: String,
    pub stylesheet: String,
    pub card_count: usize,
    pub columns: usize,
    pub rows: usize,
}

/// Single-page A4 PDF of one card
#[derive(Debug, Clone)]
pub struct PdfDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    /// Card outline on the page, top-left origin
    pub card: RectMm,
    /// Accent region on the page, top-left origin
    pub discount_region: RectMm,
    pub texts: Vec<TextPlacement>,
    /// The QR was drawn as a placeholder box
    pub placeholder_qr: bool,
}

/// Thermal receipt of one card
#[derive(Debug, Clone, PartialEq)]
pub struct ReceiptDocument {
    /// Standalone document for a popup receipt window
    pub html: String,
    /// Same receipt as ESC/POS bytes for direct printing
    pub escpos: Vec<u8>,
    pub window_width: u32,
    pub window_height: u32,
    pub placeholder_qr: bool,
}
