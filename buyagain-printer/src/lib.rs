//! # buyagain-printer
//!
//! ESC/POS thermal printing for coupon receipts. Low-level only.
//!
//! ## Scope
//!
//! This crate handles HOW to print:
//! - ESC/POS command building, including the printer's native QR command
//! - Windows-1252 transcoding for Latin receipt printers
//! - Network printing (TCP port 9100)
//!
//! WHAT goes on a receipt (coupon code, discount, validity) is decided by
//! `buyagain-cards`.
//!
//! ## Example
//!
//! ```ignore
//! use buyagain_printer::{EscPosBuilder, NetworkPrinter, Printer, QrErrorLevel};
//!
//! let mut builder = EscPosBuilder::new(32);
//! builder.center();
//! builder.bold();
//! builder.line("MAMA PUT KITCHEN");
//! builder.bold_off();
//! builder.line("Get 15% off.");
//! builder.qr_code("https://buyagain.ng/redeem/ABCD-1234", 6, QrErrorLevel::M);
//! builder.cut_feed(3);
//!
//! let printer = NetworkPrinter::new("192.168.1.100", 9100)?;
//! printer.print(&builder.build()).await?;
//! ```

mod encoding;
mod error;
mod escpos;
mod printer;

// Re-exports
pub use error::{PrintError, PrintResult};
pub use escpos::{EscPosBuilder, QrErrorLevel};
pub use printer::{NetworkPrinter, Printer};
