//! Per-action export state
//!
//! Every export action moves `Idle → InProgress → {Completed | FailedWithFallback}`.
//! While an action is `InProgress` its control is disabled: a second request
//! is rejected with [`CardError::Busy`]. The [`ExportTicket`] returned by
//! [`ExportTracker::begin`] guarantees the action leaves `InProgress` on
//! every exit path, including early returns and panics.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use shared::error::ErrorCode;
use tracing::debug;

use crate::error::{CardError, CardResult};

/// User-facing export actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportAction {
    PrintBatch,
    DownloadPdf,
    PrintPos,
    ShareSocial,
    SendToPrinter,
}

impl ExportAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExportAction::PrintBatch => "print_batch",
            ExportAction::DownloadPdf => "download_pdf",
            ExportAction::PrintPos => "print_pos",
            ExportAction::ShareSocial => "share_social",
            ExportAction::SendToPrinter => "send_to_printer",
        }
    }

    /// Error code reported when this action fails
    pub fn error_code(&self) -> ErrorCode {
        match self {
            ExportAction::PrintBatch | ExportAction::SendToPrinter => ErrorCode::PrintFailed,
            ExportAction::DownloadPdf => ErrorCode::PdfFailed,
            ExportAction::PrintPos => ErrorCode::ReceiptWindowFailed,
            ExportAction::ShareSocial => ErrorCode::ShareFailed,
        }
    }
}

impl fmt::Display for ExportAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportState {
    #[default]
    Idle,
    InProgress,
    Completed,
    /// Finished, but through a fallback path (placeholder QR, share link, ...)
    FailedWithFallback,
}

/// Concurrent map of action → state
#[derive(Debug, Clone, Default)]
pub struct ExportTracker {
    states: Arc<DashMap<ExportAction, ExportState>>,
}

impl ExportTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, action: ExportAction) -> ExportState {
        self.states.get(&action).map(|s| *s).unwrap_or_default()
    }

    /// Whether the control for `action` should be enabled
    pub fn is_enabled(&self, action: ExportAction) -> bool {
        self.state(action) != ExportState::InProgress
    }

    /// Move `action` to `InProgress`, or reject if it already is
    pub fn begin(&self, action: ExportAction) -> CardResult<ExportTicket> {
        let mut entry = self.states.entry(action).or_default();
        if *entry == ExportState::InProgress {
            return Err(CardError::Busy(action));
        }
        *entry = ExportState::InProgress;
        drop(entry);

        debug!(action = %action, "export started");
        Ok(ExportTicket {
            tracker: self.clone(),
            action,
            outcome: None,
        })
    }

    fn finish(&self, action: ExportAction, state: ExportState) {
        self.states.insert(action, state);
        debug!(action = %action, state = ?state, "export finished");
    }
}

/// RAII guard for an in-progress export
///
/// Dropping without an explicit outcome records `FailedWithFallback`.
#[derive(Debug)]
pub struct ExportTicket {
    tracker: ExportTracker,
    action: ExportAction,
    outcome: Option<ExportState>,
}

impl ExportTicket {
    pub fn action(&self) -> ExportAction {
        self.action
    }

    pub fn complete(mut self) {
        self.outcome = Some(ExportState::Completed);
    }

    pub fn fallback(mut self) {
        self.outcome = Some(ExportState::FailedWithFallback);
    }
}

impl Drop for ExportTicket {
    fn drop(&mut self) {
        let state = self.outcome.unwrap_or(ExportState::FailedWithFallback);
        self.tracker.finish(self.action, state);
    }
}
