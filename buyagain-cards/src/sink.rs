//! Presentation sinks
//!
//! Everything platform-specific (print dialog, file save, popup window,
//! native share sheet, link opening) sits behind [`PresentationSink`]. The
//! pipeline only prepares artifacts and hands them over.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{info, warn};

use crate::artifact::{PdfDocument, PrintDocument, ReceiptDocument};
use crate::error::{CardError, CardResult};
use crate::state::ExportAction;

/// Result of a native share attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareOutcome {
    Shared,
    /// The user dismissed the share sheet
    Cancelled,
    /// The platform has no native share
    Unavailable,
}

/// Host platform primitives used by the export actions
#[allow(async_fn_in_trait)]
pub trait PresentationSink {
    /// Mount printable markup and its stylesheet
    async fn present_printable(&self, doc: &PrintDocument) -> CardResult<()>;

    /// Open the print dialog for a mounted document
    async fn print(&self, mount_id: &str) -> CardResult<()>;

    /// Remove a mounted document and its stylesheet
    ///
    /// Synchronous so it can run from a drop guard.
    fn dismiss_printable(&self, mount_id: &str) -> CardResult<()>;

    async fn present_download(&self, doc: &PdfDocument) -> CardResult<()>;

    async fn present_receipt_window(&self, doc: &ReceiptDocument) -> CardResult<()>;

    async fn native_share(&self, title: &str, text: &str, url: &str) -> CardResult<ShareOutcome>;

    async fn open_link(&self, url: &str) -> CardResult<()>;

    /// Running as an installed app (native share is skipped)
    fn is_standalone(&self) -> bool;

    /// Non-blocking user notice
    fn notify(&self, message: &str);
}

/// A mounted print sheet, dismissed when dropped
///
/// Created before the sheet is presented, so a failed print, a panic in the
/// print dialog and a cancelled job all leave nothing mounted.
pub struct MountedSheet<'a, K: PresentationSink> {
    sink: &'a K,
    mount_id: String,
    dismissed: bool,
}

impl<'a, K: PresentationSink> MountedSheet<'a, K> {
    pub fn new(sink: &'a K, mount_id: impl Into<String>) -> Self {
        Self {
            sink,
            mount_id: mount_id.into(),
            dismissed: false,
        }
    }

    pub fn mount_id(&self) -> &str {
        &self.mount_id
    }

    /// Dismiss now and report the outcome
    pub fn dismiss(mut self) -> CardResult<()> {
        self.dismissed = true;
        self.sink.dismiss_printable(&self.mount_id)
    }
}

impl<K: PresentationSink> Drop for MountedSheet<'_, K> {
    fn drop(&mut self) {
        if self.dismissed {
            return;
        }
        warn!(mount_id = %self.mount_id, "print job abandoned, dismissing sheet");
        if let Err(e) = self.sink.dismiss_printable(&self.mount_id) {
            warn!(mount_id = %self.mount_id, error = %e, "failed to dismiss print sheet");
        }
    }
}

/// Recorded sink interaction
#[derive(Debug, Clone, PartialEq)]
pub enum SinkEvent {
    Presented(String),
    Printed(String),
    Dismissed(String),
    Downloaded(String),
    ReceiptWindow,
    Shared { title: String, text: String, url: String },
    OpenedLink(String),
    Notice(String),
}

/// Scripted native share behaviour
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShareBehavior {
    #[default]
    Share,
    Cancel,
    Unavailable,
    Fail,
}

#[derive(Debug, Default)]
struct Recorded {
    events: Vec<SinkEvent>,
    mounted: HashSet<String>,
    printables: Vec<PrintDocument>,
    downloads: Vec<PdfDocument>,
    receipts: Vec<ReceiptDocument>,
}

#[derive(Debug, Default)]
struct Faults {
    print: bool,
    download: bool,
    receipt_window: bool,
    share: ShareBehavior,
    standalone: bool,
}

/// Headless sink that records every interaction
///
/// Clones share the same record, so a handle kept by a test sees what the
/// orchestrator did.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
    faults: Arc<Mutex<Faults>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `print` fail, as a rejected or crashed print dialog would
    pub fn fail_print(self) -> Self {
        self.faults().print = true;
        self
    }

    pub fn fail_download(self) -> Self {
        self.faults().download = true;
        self
    }

    /// Make the receipt popup blocked
    pub fn fail_receipt_window(self) -> Self {
        self.faults().receipt_window = true;
        self
    }

    pub fn with_share(self, behavior: ShareBehavior) -> Self {
        self.faults().share = behavior;
        self
    }

    pub fn standalone(self) -> Self {
        self.faults().standalone = true;
        self
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.recorded().events.clone()
    }

    /// Ids of documents still mounted
    pub fn mounted(&self) -> Vec<String> {
        self.recorded().mounted.iter().cloned().collect()
    }

    pub fn printables(&self) -> Vec<PrintDocument> {
        self.recorded().printables.clone()
    }

    pub fn downloads(&self) -> Vec<PdfDocument> {
        self.recorded().downloads.clone()
    }

    pub fn receipts(&self) -> Vec<ReceiptDocument> {
        self.recorded().receipts.clone()
    }

    pub fn notices(&self) -> Vec<String> {
        self.recorded()
            .events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Notice(msg) => Some(msg.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn opened_links(&self) -> Vec<String> {
        self.recorded()
            .events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::OpenedLink(url) => Some(url.clone()),
                _ => None,
            })
            .collect()
    }

    fn recorded(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn faults(&self) -> MutexGuard<'_, Faults> {
        self.faults.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, event: SinkEvent) {
        self.recorded().events.push(event);
    }
}

impl PresentationSink for MemorySink {
    async fn present_printable(&self, doc: &PrintDocument) -> CardResult<()> {
        let mut recorded = self.recorded();
        recorded.mounted.insert(doc.mount_id.clone());
        recorded.printables.push(doc.clone());
        recorded.events.push(SinkEvent::Presented(doc.mount_id.clone()));
        Ok(())
    }

    async fn print(&self, mount_id: &str) -> CardResult<()> {
        if self.faults().print {
            return Err(CardError::export(ExportAction::PrintBatch, "print dialog failed"));
        }
        self.record(SinkEvent::Printed(mount_id.to_string()));
        Ok(())
    }

    fn dismiss_printable(&self, mount_id: &str) -> CardResult<()> {
        let mut recorded = self.recorded();
        recorded.mounted.remove(mount_id);
        recorded.events.push(SinkEvent::Dismissed(mount_id.to_string()));
        Ok(())
    }

    async fn present_download(&self, doc: &PdfDocument) -> CardResult<()> {
        if self.faults().download {
            return Err(CardError::export(ExportAction::DownloadPdf, "download rejected"));
        }
        let mut recorded = self.recorded();
        recorded.downloads.push(doc.clone());
        recorded.events.push(SinkEvent::Downloaded(doc.file_name.clone()));
        Ok(())
    }

    async fn present_receipt_window(&self, doc: &ReceiptDocument) -> CardResult<()> {
        if self.faults().receipt_window {
            return Err(CardError::export(ExportAction::PrintPos, "popup blocked"));
        }
        let mut recorded = self.recorded();
        recorded.receipts.push(doc.clone());
        recorded.events.push(SinkEvent::ReceiptWindow);
        Ok(())
    }

    async fn native_share(&self, title: &str, text: &str, url: &str) -> CardResult<ShareOutcome> {
        let behavior = self.faults().share;
        let outcome = match behavior {
            ShareBehavior::Share => ShareOutcome::Shared,
            ShareBehavior::Cancel => ShareOutcome::Cancelled,
            ShareBehavior::Unavailable => return Ok(ShareOutcome::Unavailable),
            ShareBehavior::Fail => {
                return Err(CardError::export(ExportAction::ShareSocial, "share sheet failed"));
            }
        };
        self.record(SinkEvent::Shared {
            title: title.to_string(),
            text: text.to_string(),
            url: url.to_string(),
        });
        Ok(outcome)
    }

    async fn open_link(&self, url: &str) -> CardResult<()> {
        self.record(SinkEvent::OpenedLink(url.to_string()));
        Ok(())
    }

    fn is_standalone(&self) -> bool {
        self.faults().standalone
    }

    fn notify(&self, message: &str) {
        self.record(SinkEvent::Notice(message.to_string()));
    }
}

/// Sink that writes artifacts into a directory
///
/// Print sheets land as `<mount id>.html`, PDFs under their file name and
/// receipts as `receipt.html` + `receipt.bin` (ESC/POS). There is no share
/// sheet; links and notices are logged.
#[derive(Debug, Clone)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    async fn write(&self, name: &str, bytes: &[u8]) -> CardResult<PathBuf> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, bytes).await?;
        info!(path = %path.display(), size = bytes.len(), "artifact written");
        Ok(path)
    }
}

impl PresentationSink for DirectorySink {
    async fn present_printable(&self, doc: &PrintDocument) -> CardResult<()> {
        let page = format!(
            "<!DOCTYPE html><html><head><meta charset=\"utf-8\" /><title>Coupon cards</title>\
             <style>{}</style></head><body>{}</body></html>",
            doc.stylesheet, doc.markup
        );
        self.write(&format!("{}.html", doc.mount_id), page.as_bytes())
            .await?;
        Ok(())
    }

    async fn print(&self, mount_id: &str) -> CardResult<()> {
        info!(mount_id = %mount_id, "print sheet ready");
        Ok(())
    }

    fn dismiss_printable(&self, _mount_id: &str) -> CardResult<()> {
        // the written sheet is the deliverable
        Ok(())
    }

    async fn present_download(&self, doc: &PdfDocument) -> CardResult<()> {
        self.write(&doc.file_name, &doc.bytes).await?;
        Ok(())
    }

    async fn present_receipt_window(&self, doc: &ReceiptDocument) -> CardResult<()> {
        self.write("receipt.html", doc.html.as_bytes()).await?;
        self.write("receipt.bin", &doc.escpos).await?;
        Ok(())
    }

    async fn native_share(&self, _title: &str, _text: &str, _url: &str) -> CardResult<ShareOutcome> {
        Ok(ShareOutcome::Unavailable)
    }

    async fn open_link(&self, url: &str) -> CardResult<()> {
        info!(url = %url, "share link");
        Ok(())
    }

    fn is_standalone(&self) -> bool {
        false
    }

    fn notify(&self, message: &str) {
        warn!("{}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::print_sheet;

    #[tokio::test]
    async fn test_memory_sink_mount_and_dismiss() {
        let sink = MemorySink::new();
        let doc = print_sheet(&["<div></div>".to_string()]);
        sink.present_printable(&doc).await.unwrap();
        assert_eq!(sink.mounted(), vec![doc.mount_id.clone()]);

        sink.dismiss_printable(&doc.mount_id).unwrap();
        assert!(sink.mounted().is_empty());
        assert_eq!(
            sink.events(),
            vec![
                SinkEvent::Presented(doc.mount_id.clone()),
                SinkEvent::Dismissed(doc.mount_id.clone())
            ]
        );
    }

    #[tokio::test]
    async fn test_mounted_sheet_dismissed_on_drop() {
        let sink = MemorySink::new();
        let doc = print_sheet(&["<div></div>".to_string()]);
        {
            let sheet = MountedSheet::new(&sink, doc.mount_id.clone());
            sink.present_printable(&doc).await.unwrap();
            assert_eq!(sheet.mount_id(), doc.mount_id);
            assert_eq!(sink.mounted().len(), 1);
        }
        assert!(sink.mounted().is_empty());

        // explicit dismissal is not repeated on drop
        let sheet = MountedSheet::new(&sink, doc.mount_id.clone());
        sink.present_printable(&doc).await.unwrap();
        sheet.dismiss().unwrap();
        let dismissals = sink
            .events()
            .iter()
            .filter(|e| matches!(e, SinkEvent::Dismissed(_)))
            .count();
        assert_eq!(dismissals, 2);
    }

    #[tokio::test]
    async fn test_memory_sink_faults() {
        let sink = MemorySink::new()
            .fail_print()
            .with_share(ShareBehavior::Cancel)
            .standalone();
        let handle = sink.clone();

        assert!(sink.print("x").await.is_err());
        assert!(handle.is_standalone());
        assert_eq!(
            sink.native_share("t", "m", "u").await.unwrap(),
            ShareOutcome::Cancelled
        );
    }

    #[tokio::test]
    async fn test_directory_sink_writes_files() {
        let dir = tempfile::tempdir().unwrap();
        let sink = DirectorySink::new(dir.path().join("out"));

        let doc = print_sheet(&["<div class=\"coupon-card\"></div>".to_string()]);
        sink.present_printable(&doc).await.unwrap();
        let page = std::fs::read_to_string(sink.dir().join(format!("{}.html", doc.mount_id))).unwrap();
        assert!(page.contains("coupon-card"));
        assert!(page.contains("@media print"));

        let receipt = ReceiptDocument {
            html: "<html></html>".into(),
            escpos: vec![0x1B, 0x40],
            window_width: 300,
            window_height: 600,
            placeholder_qr: false,
        };
        sink.present_receipt_window(&receipt).await.unwrap();
        assert_eq!(std::fs::read(sink.dir().join("receipt.bin")).unwrap(), vec![0x1B, 0x40]);
        assert_eq!(
            sink.native_share("t", "m", "u").await.unwrap(),
            ShareOutcome::Unavailable
        );
    }
}
