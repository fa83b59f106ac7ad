//! Export orchestrator
//!
//! One orchestrator drives every export action for a merchant session. It
//! owns the read-only context (config and merchant profile), the QR sources
//! and the presentation sink, and tracks per-action state so a running export
//! cannot be started twice.

use buyagain_printer::Printer;
use reqwest::Url;
use shared::error::ErrorCode;
use shared::models::{Coupon, CouponBatch, MerchantProfile};
use tracing::{error, info, instrument, warn};

use crate::config::CardConfig;
use crate::error::{CardError, CardResult};
use crate::fetch::{QrImageSource, resolve_artwork};
use crate::layout::{CardLayout, compute_layout, discount_amount};
use crate::qr::{PDF_QR_PX, QrArtwork, QrEncoder, RECEIPT_QR_PX, card_artwork};
use crate::render::{CardRenderer, HtmlRenderer, PdfRenderer, ReceiptRenderer};
use crate::sheet::print_sheet;
use crate::sink::{MountedSheet, PresentationSink, ShareOutcome};
use crate::state::{ExportAction, ExportState, ExportTracker};
use crate::style::CardStyle;

pub const SHARE_TITLE: &str = "Discount Card";
pub const PLACEHOLDER_QR_NOTICE: &str =
    "The QR code could not be generated. The card contains a placeholder instead.";

pub struct ExportOrchestrator<E, S, K> {
    config: CardConfig,
    profile: MerchantProfile,
    encoder: E,
    source: S,
    sink: K,
    tracker: ExportTracker,
    html: HtmlRenderer,
    pdf: PdfRenderer,
    receipt: ReceiptRenderer,
}

impl<E, S, K> ExportOrchestrator<E, S, K>
where
    E: QrEncoder,
    S: QrImageSource,
    K: PresentationSink,
{
    pub fn new(config: CardConfig, profile: MerchantProfile, encoder: E, source: S, sink: K) -> Self {
        let receipt = ReceiptRenderer::new(config.receipt_width, config.pos_close_delay_ms);
        Self {
            config,
            profile,
            encoder,
            source,
            sink,
            tracker: ExportTracker::new(),
            html: HtmlRenderer,
            pdf: PdfRenderer::default(),
            receipt,
        }
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn profile(&self) -> &MerchantProfile {
        &self.profile
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn state(&self, action: ExportAction) -> ExportState {
        self.tracker.state(action)
    }

    /// Whether the control for `action` should be enabled
    pub fn is_enabled(&self, action: ExportAction) -> bool {
        self.tracker.is_enabled(action)
    }

    pub fn layout(&self, coupon: &Coupon, style: &CardStyle) -> CardResult<CardLayout> {
        compute_layout(coupon, style, &self.profile, &self.config)
    }

    /// On-screen HTML card
    pub fn render_card(&self, coupon: &Coupon, style: &CardStyle) -> CardResult<String> {
        let layout = self.layout(coupon, style)?;
        let qr = card_artwork(&self.encoder, &layout.qr.url, layout.qr.size_px);
        self.html.render(&layout, &qr)
    }

    /// Signed-out preview card pointing at the brand site
    pub fn render_preview(&self, coupon: &Coupon, style: &CardStyle) -> CardResult<String> {
        let layout = self.layout(coupon, style)?;
        self.html
            .render_preview(&layout, &self.encoder, &self.config.preview_url())
    }

    /// Print one card per coupon on A4 sheets
    ///
    /// The printable nodes are dismissed after the settle delay once the
    /// print returns. If the job is dropped first they are dismissed at once.
    #[instrument(skip_all, fields(action = "print_batch", count = batch.len()))]
    pub async fn print_batch(&self, batch: &CouponBatch, style: &CardStyle) -> CardResult<()> {
        if batch.is_empty() {
            return Err(CardError::validation(ErrorCode::BatchEmpty, "No coupons to print"));
        }
        let ticket = self.tracker.begin(ExportAction::PrintBatch)?;

        let cards: Vec<String> = batch
            .iter()
            .map(|coupon| self.card_or_fallback(coupon, style))
            .collect();
        let doc = print_sheet(&cards);

        let sheet = MountedSheet::new(&self.sink, doc.mount_id.clone());
        let printed = match self.sink.present_printable(&doc).await {
            Ok(()) => self.sink.print(sheet.mount_id()).await,
            Err(e) => Err(e),
        };
        tokio::time::sleep(self.config.print_settle()).await;
        let dismissed = sheet.dismiss();

        if let Err(e) = &dismissed {
            warn!(mount_id = %doc.mount_id, error = %e, "failed to dismiss print sheet");
        }
        match printed.and(dismissed) {
            Ok(()) => {
                info!(cards = doc.card_count, rows = doc.rows, "batch printed");
                ticket.complete();
                Ok(())
            }
            Err(e) => {
                error!(error = %e, "batch print failed");
                Err(export_error(ExportAction::PrintBatch, e))
            }
        }
    }

    /// Single-page A4 PDF of the first coupon
    #[instrument(skip_all, fields(action = "download_pdf"))]
    pub async fn download_pdf(&self, batch: &CouponBatch, style: &CardStyle) -> CardResult<()> {
        let layout = self.layout(first(batch)?, style)?;
        let ticket = self.tracker.begin(ExportAction::DownloadPdf)?;
        let qr = resolve_artwork(
            &self.encoder,
            &self.source,
            &layout.qr.url,
            PDF_QR_PX,
            self.config.qr_fetch_timeout(),
        )
        .await;

        let doc = self
            .pdf
            .render(&layout, &qr)
            .map_err(|e| export_error(ExportAction::DownloadPdf, e))?;
        self.sink
            .present_download(&doc)
            .await
            .map_err(|e| export_error(ExportAction::DownloadPdf, e))?;

        info!(code = %layout.code, file = %doc.file_name, size = doc.bytes.len(), "PDF ready");
        if doc.placeholder_qr {
            self.sink.notify(PLACEHOLDER_QR_NOTICE);
            ticket.fallback();
        } else {
            ticket.complete();
        }
        Ok(())
    }

    /// Receipt window for the first coupon
    #[instrument(skip_all, fields(action = "print_pos"))]
    pub async fn print_pos(&self, batch: &CouponBatch, style: &CardStyle) -> CardResult<()> {
        let layout = self.layout(first(batch)?, style)?;
        let ticket = self.tracker.begin(ExportAction::PrintPos)?;
        let qr = resolve_artwork(
            &self.encoder,
            &self.source,
            &layout.qr.url,
            RECEIPT_QR_PX,
            self.config.qr_fetch_timeout(),
        )
        .await;

        let doc = self
            .receipt
            .render(&layout, &qr)
            .map_err(|e| export_error(ExportAction::PrintPos, e))?;
        self.sink
            .present_receipt_window(&doc)
            .await
            .map_err(|e| export_error(ExportAction::PrintPos, e))?;

        info!(code = %layout.code, "receipt window opened");
        if doc.placeholder_qr {
            self.sink.notify(PLACEHOLDER_QR_NOTICE);
            ticket.fallback();
        } else {
            ticket.complete();
        }
        Ok(())
    }

    /// Send the first coupon's receipt straight to a thermal printer
    #[instrument(skip_all, fields(action = "send_to_printer"))]
    pub async fn send_to_printer<P: Printer>(
        &self,
        batch: &CouponBatch,
        style: &CardStyle,
        printer: &P,
    ) -> CardResult<()> {
        let layout = self.layout(first(batch)?, style)?;
        let ticket = self.tracker.begin(ExportAction::SendToPrinter)?;
        // the printer encodes its own QR, no artwork needed
        let doc = self
            .receipt
            .render(&layout, &QrArtwork::placeholder(layout.qr.url.clone()))
            .map_err(|e| export_error(ExportAction::SendToPrinter, e))?;

        if let Err(e) = printer.print(&doc.escpos).await {
            error!(code = %layout.code, error = %e, "thermal print failed");
            return Err(e.into());
        }
        info!(code = %layout.code, bytes = doc.escpos.len(), "sent to printer");
        ticket.complete();
        Ok(())
    }

    /// Share the first coupon, falling back to a messaging link
    ///
    /// The link fallback is unconditional: no native share, a cancelled share
    /// sheet and a failed share all end with the link being opened.
    #[instrument(skip_all, fields(action = "share_social"))]
    pub async fn share_social(&self, batch: &CouponBatch, style: &CardStyle) -> CardResult<()> {
        let coupon = first(batch)?;
        let layout = self.layout(coupon, style)?;
        let ticket = self.tracker.begin(ExportAction::ShareSocial)?;
        let url = layout.qr.url.clone();
        let text = format!(
            "Get {} off at {}! Scan the QR code: {}",
            discount_amount(coupon.discount_value, coupon.discount_kind),
            self.profile.display_name(),
            url
        );

        if !self.sink.is_standalone() {
            match self.sink.native_share(SHARE_TITLE, &text, &url).await {
                Ok(ShareOutcome::Shared) => {
                    info!(code = %layout.code, "shared natively");
                    ticket.complete();
                    return Ok(());
                }
                Ok(outcome) => info!(outcome = ?outcome, "native share not completed"),
                Err(e) => warn!(error = %e, "native share failed"),
            }
        }

        let link = self.share_link(&text, &url)?;
        self.sink
            .open_link(link.as_str())
            .await
            .map_err(|e| export_error(ExportAction::ShareSocial, e))?;
        info!(code = %layout.code, "share link opened");
        ticket.fallback();
        Ok(())
    }

    /// `https://wa.me/?text=<message url>`
    pub fn share_link(&self, text: &str, url: &str) -> CardResult<Url> {
        let message = format!("{text} {url}");
        Url::parse_with_params(&self.config.share_base_url, [("text", message.as_str())])
            .map_err(|e| CardError::export(ExportAction::ShareSocial, format!("invalid share URL: {e}")))
    }

    fn card_or_fallback(&self, coupon: &Coupon, style: &CardStyle) -> String {
        match self.render_card(coupon, style) {
            Ok(card) => card,
            Err(e) => {
                warn!(
                    code = %coupon.code,
                    renderer = HtmlRenderer::NAME,
                    error = %e,
                    "card render failed, using fallback card"
                );
                self.html
                    .render_fallback(&coupon.code, &self.config.redemption_url(&coupon.code))
            }
        }
    }
}

fn first(batch: &CouponBatch) -> CardResult<&Coupon> {
    batch
        .first()
        .ok_or_else(|| CardError::validation(ErrorCode::BatchEmpty, "No coupons to export"))
}

/// Attribute a failure to `action`, keeping already classified errors
fn export_error(action: ExportAction, err: CardError) -> CardError {
    match err {
        CardError::Export { .. } | CardError::Validation(_) | CardError::Busy(_) => err,
        other => CardError::export(action, other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::NoRemoteQr;
    use crate::qr::QrcodeEncoder;
    use crate::sink::{MemorySink, ShareBehavior, SinkEvent};
    use rust_decimal::Decimal;
    use shared::models::DiscountKind;
    use std::time::Duration;

    fn orchestrator(sink: MemorySink) -> ExportOrchestrator<QrcodeEncoder, NoRemoteQr, MemorySink> {
        let config = CardConfig::default().with_print_settle(Duration::from_millis(5));
        ExportOrchestrator::new(
            config,
            MerchantProfile::new("Mama Put", "08012345678"),
            QrcodeEncoder,
            NoRemoteQr,
            sink,
        )
    }

    fn batch(codes: &[&str]) -> CouponBatch {
        codes
            .iter()
            .map(|c| Coupon::new(*c, Decimal::from(15), DiscountKind::Percentage))
            .collect::<Vec<_>>()
            .into()
    }

    #[tokio::test]
    async fn test_print_batch_uses_fallback_card() {
        let sink = MemorySink::new();
        let orch = orchestrator(sink.clone());
        let mut coupons = batch(&["A-1", "A-2"]).coupons;
        coupons.push(Coupon::new("BAD-1", Decimal::ZERO, DiscountKind::Percentage));

        orch.print_batch(&coupons.into(), &CardStyle::default())
            .await
            .unwrap();

        let doc = &sink.printables()[0];
        assert_eq!(doc.card_count, 3);
        assert_eq!(doc.markup.matches("coupon-card--fallback").count(), 1);
        assert!(doc.markup.contains(r#"data-code="BAD-1""#));
        assert!(sink.mounted().is_empty());
        assert_eq!(orch.state(ExportAction::PrintBatch), ExportState::Completed);
    }

    #[tokio::test]
    async fn test_empty_batch_rejected() {
        let orch = orchestrator(MemorySink::new());
        let err = orch
            .print_batch(&CouponBatch::default(), &CardStyle::default())
            .await
            .unwrap_err();
        assert!(matches!(err, CardError::Validation(ref e) if e.code == ErrorCode::BatchEmpty));
        assert!(orch.is_enabled(ExportAction::PrintBatch));
        assert_eq!(orch.state(ExportAction::PrintBatch), ExportState::Idle);
    }

    #[tokio::test]
    async fn test_invalid_input_leaves_state_idle() {
        let orch = orchestrator(MemorySink::new());
        let bad = batch(&[""]);
        let style = CardStyle::default();

        assert!(orch.download_pdf(&bad, &style).await.is_err());
        assert!(orch.print_pos(&CouponBatch::default(), &style).await.is_err());
        assert!(orch.share_social(&bad, &style).await.is_err());
        for action in [
            ExportAction::DownloadPdf,
            ExportAction::PrintPos,
            ExportAction::ShareSocial,
        ] {
            assert_eq!(orch.state(action), ExportState::Idle, "{action:?}");
        }
    }

    #[tokio::test]
    async fn test_abandoned_print_dismisses_sheet() {
        let sink = MemorySink::new();
        let config = CardConfig::default().with_print_settle(Duration::from_millis(500));
        let orch = ExportOrchestrator::new(
            config,
            MerchantProfile::new("Mama Put", "08012345678"),
            QrcodeEncoder,
            NoRemoteQr,
            sink.clone(),
        );

        let coupons = batch(&["A-1", "A-2"]);
        let style = CardStyle::default();
        let job = orch.print_batch(&coupons, &style);
        let timed_out = tokio::time::timeout(Duration::from_millis(50), job).await;

        assert!(timed_out.is_err());
        assert_eq!(sink.printables().len(), 1);
        assert!(sink.mounted().is_empty(), "print sheet left mounted");
        assert_eq!(
            orch.state(ExportAction::PrintBatch),
            ExportState::FailedWithFallback
        );
        assert!(orch.is_enabled(ExportAction::PrintBatch));
    }

    #[tokio::test]
    async fn test_share_falls_back_to_link() {
        for behavior in [ShareBehavior::Cancel, ShareBehavior::Unavailable, ShareBehavior::Fail] {
            let sink = MemorySink::new().with_share(behavior);
            let orch = orchestrator(sink.clone());
            orch.share_social(&batch(&["ABCD-1234"]), &CardStyle::default())
                .await
                .unwrap();

            let links = sink.opened_links();
            assert_eq!(links.len(), 1, "{behavior:?}");
            assert!(links[0].starts_with("https://wa.me/?text=Get+15%25+off+at+Mama+Put"));
            assert_eq!(
                orch.state(ExportAction::ShareSocial),
                ExportState::FailedWithFallback
            );
        }
    }

    #[tokio::test]
    async fn test_share_native() {
        let sink = MemorySink::new();
        let orch = orchestrator(sink.clone());
        orch.share_social(&batch(&["ABCD-1234"]), &CardStyle::default())
            .await
            .unwrap();

        assert_eq!(
            sink.events(),
            vec![SinkEvent::Shared {
                title: "Discount Card".into(),
                text: "Get 15% off at Mama Put! Scan the QR code: https://buyagain.ng/redeem/ABCD-1234".into(),
                url: "https://buyagain.ng/redeem/ABCD-1234".into(),
            }]
        );
        assert!(sink.opened_links().is_empty());
        assert_eq!(orch.state(ExportAction::ShareSocial), ExportState::Completed);
    }

    #[tokio::test]
    async fn test_standalone_skips_native_share() {
        let sink = MemorySink::new().standalone();
        let orch = orchestrator(sink.clone());
        orch.share_social(&batch(&["ABCD-1234"]), &CardStyle::default())
            .await
            .unwrap();
        assert_eq!(sink.events().len(), 1);
        assert_eq!(sink.opened_links().len(), 1);
    }

    #[tokio::test]
    async fn test_receipt_window_failure_surfaces() {
        let sink = MemorySink::new().fail_receipt_window();
        let orch = orchestrator(sink);
        let err = orch
            .print_pos(&batch(&["ABCD-1234"]), &CardStyle::default())
            .await
            .unwrap_err();
        let app: shared::error::AppError = err.into();
        assert_eq!(app.code, ErrorCode::ReceiptWindowFailed);
        assert!(orch.is_enabled(ExportAction::PrintPos));
    }

    #[test]
    fn test_share_link_encoding() {
        let orch = orchestrator(MemorySink::new());
        let link = orch
            .share_link("Get ₦500 off at A&B!", "https://buyagain.ng/redeem/X")
            .unwrap();
        assert_eq!(
            link.as_str(),
            "https://wa.me/?text=Get+%E2%82%A6500+off+at+A%26B%21+https%3A%2F%2Fbuyagain.ng%2Fredeem%2FX"
        );
    }
}
