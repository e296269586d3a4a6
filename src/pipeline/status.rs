//! Download phases and the events a running download reports.

use std::fmt;
use tokio::sync::mpsc::UnboundedSender;

/// Phase of a download operation.
///
/// A run walks `Resolving → Rendering → Fetching → Packaging → Done`;
/// any error moves it to `Failed`. Both `Done` and `Failed` are final.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DownloadState {
    Idle,
    /// Searching for the card
    Resolving,
    /// Writing the HTML report
    Rendering,
    /// Downloading the card image and gallery
    Fetching,
    /// Applying the bundle mode
    Packaging,
    Done,
    Failed,
}

impl DownloadState {
    /// `Done` or `Failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadState::Done | DownloadState::Failed)
    }

    /// A phase during which the operation owns its output directory
    pub fn is_active(&self) -> bool {
        !self.is_terminal() && *self != DownloadState::Idle
    }
}

impl fmt::Display for DownloadState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DownloadState::Idle => "idle",
            DownloadState::Resolving => "searching for card",
            DownloadState::Rendering => "writing card info",
            DownloadState::Fetching => "downloading images",
            DownloadState::Packaging => "bundling",
            DownloadState::Done => "done",
            DownloadState::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Notification sent from a running download to whoever started it
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusEvent {
    State(DownloadState),
    Info(String),
    Warning(String),
}

/// Where a download reports its progress.
///
/// Every event is logged; when a channel is attached it is also forwarded.
/// A closed channel is ignored so a departed listener cannot fail a run.
#[derive(Debug, Clone, Default)]
pub struct StatusSink {
    tx: Option<UnboundedSender<StatusEvent>>,
}

impl StatusSink {
    pub fn new(tx: UnboundedSender<StatusEvent>) -> Self {
        Self { tx: Some(tx) }
    }

    /// Log only
    pub fn silent() -> Self {
        Self::default()
    }

    pub fn state(&self, state: DownloadState) {
        tracing::info!(%state, "download state changed");
        self.emit(StatusEvent::State(state));
    }

    pub fn info(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!("{}", message);
        self.emit(StatusEvent::Info(message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        let message = message.into();
        tracing::warn!("{}", message);
        self.emit(StatusEvent::Warning(message));
    }

    fn emit(&self, event: StatusEvent) {
        if let Some(tx) = &self.tx {
            let _ = tx.send(event);
        }
    }
}
