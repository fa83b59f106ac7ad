//! # buyagain-cards
//!
//! Coupon card rendering and export pipeline.
//!
//! A coupon plus the merchant profile and a card style goes through:
//!
//! 1. [`layout::compute_layout`] → a pure, deterministic [`CardLayout`]
//! 2. QR artwork from a [`QrEncoder`] (remote [`QrImageSource`] and a
//!    placeholder as fallbacks)
//! 3. A [`CardRenderer`]: HTML card, A4 PDF or thermal receipt
//! 4. The [`ExportOrchestrator`], which hands artifacts to a
//!    [`PresentationSink`] (print, download, receipt window, share)
//!
//! ## Example
//!
//! ```ignore
//! use buyagain_cards::{CardConfig, CardStyle, ExportOrchestrator, MemorySink, QrcodeEncoder, QrServerClient};
//!
//! let config = CardConfig::from_env();
//! let orchestrator = ExportOrchestrator::new(
//!     config.clone(),
//!     profile,
//!     QrcodeEncoder,
//!     QrServerClient::new(&config)?,
//!     MemorySink::new(),
//! );
//! orchestrator.print_batch(&batch, &CardStyle::default()).await?;
//! ```

pub mod artifact;
pub mod config;
pub mod error;
pub mod fetch;
pub mod layout;
pub mod logger;
pub mod orchestrator;
pub mod qr;
pub mod render;
pub mod sheet;
pub mod sink;
pub mod state;
pub mod style;

// Re-exports
pub use artifact::{PdfDocument, PrintDocument, ReceiptDocument};
pub use config::CardConfig;
pub use error::{CardError, CardResult};
pub use fetch::{NoRemoteQr, QrImageSource, QrServerClient};
pub use layout::{CardLayout, compute_layout};
pub use orchestrator::ExportOrchestrator;
pub use qr::{QrArtwork, QrEncoder, QrImage, QrLevel, QrcodeEncoder};
pub use render::{CardRenderer, HtmlRenderer, PdfRenderer, ReceiptRenderer};
pub use sink::{DirectorySink, MemorySink, PresentationSink, ShareBehavior, ShareOutcome, SinkEvent};
pub use state::{ExportAction, ExportState};
pub use style::{AccentColor, CardStyle, PALETTE};
