//! Runs a complete card download and reports its progress.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

use crate::config::{BundleMode, Settings};
use crate::models::CardRecord;
use crate::sources::CardSource;
use crate::utils::card_slug;

use super::assets::{self, GalleryOutcome};
use super::report::{render_report, report_file_name};
use super::{bundle, resolver, DownloadError, DownloadState, StatusEvent, StatusSink};

/// What to download and where to put it
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRequest {
    /// Card name or code to search for
    pub query: String,

    /// Parent directory of the card folder
    pub output_directory: Option<PathBuf>,

    pub bundle: BundleMode,
}

impl DownloadRequest {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            output_directory: None,
            bundle: BundleMode::default(),
        }
    }

    /// Request using the saved output directory and bundle mode
    pub fn from_settings(query: impl Into<String>, settings: &Settings) -> Self {
        Self {
            query: query.into(),
            output_directory: settings.output_directory().map(Path::to_path_buf),
            bundle: settings.bundle_option,
        }
    }

    pub fn output_directory(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_directory = Some(dir.into());
        self
    }

    pub fn bundle(mut self, mode: BundleMode) -> Self {
        self.bundle = mode;
        self
    }

    /// Check the inputs; returns the trimmed query and the output directory.
    pub fn validate(&self) -> Result<(&str, &Path), DownloadError> {
        let query = self.query.trim();
        if query.is_empty() {
            return Err(DownloadError::Validation(
                "Please enter the name of the card.".to_string(),
            ));
        }
        let dir = self
            .output_directory
            .as_deref()
            .filter(|dir| !dir.as_os_str().is_empty())
            .ok_or_else(|| {
                DownloadError::Validation("Please select an output directory.".to_string())
            })?;
        Ok((query, dir))
    }
}

/// Result of a successful download
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadOutcome {
    pub card: CardRecord,

    /// The card folder, or the zip archive that replaced it
    pub bundle_path: PathBuf,

    pub mode: BundleMode,

    pub gallery: GalleryOutcome,
}

impl DownloadOutcome {
    /// One-line confirmation for the user
    pub fn summary(&self) -> String {
        match self.mode {
            BundleMode::Zip => format!(
                "All files have been saved and zipped at {}",
                self.bundle_path.display()
            ),
            BundleMode::Folder => {
                format!("All files have been saved in {}", self.bundle_path.display())
            }
        }
    }
}

/// Runs download operations against a card source
#[derive(Debug, Clone)]
pub struct Downloader {
    source: Arc<dyn CardSource>,
}

impl Downloader {
    pub fn new(source: Arc<dyn CardSource>) -> Self {
        Self { source }
    }

    pub fn source(&self) -> &dyn CardSource {
        self.source.as_ref()
    }

    /// Run one download to completion.
    ///
    /// Invalid input fails before any event or I/O. Once resolving starts,
    /// every phase is reported to `sink` and the run ends in `Done` or
    /// `Failed`. A failed run leaves its partial folder on disk.
    pub async fn run(
        &self,
        request: &DownloadRequest,
        sink: &StatusSink,
    ) -> Result<DownloadOutcome, DownloadError> {
        let (query, output_dir) = request.validate()?;

        match self.execute(query, output_dir, request.bundle, sink).await {
            Ok(outcome) => {
                sink.state(DownloadState::Done);
                tracing::info!(path = %outcome.bundle_path.display(), "download finished");
                Ok(outcome)
            }
            Err(e) => {
                tracing::error!(query, error = %e, "download failed");
                sink.state(DownloadState::Failed);
                Err(e)
            }
        }
    }

    /// Run a download on a background task.
    pub fn spawn(&self, request: DownloadRequest) -> DownloadHandle {
        let (tx, events) = mpsc::unbounded_channel();
        let downloader = self.clone();
        let task = tokio::spawn(async move {
            let sink = StatusSink::new(tx);
            downloader.run(&request, &sink).await
        });
        DownloadHandle { events, task }
    }

    async fn execute(
        &self,
        query: &str,
        output_dir: &Path,
        mode: BundleMode,
        sink: &StatusSink,
    ) -> Result<DownloadOutcome, DownloadError> {
        sink.state(DownloadState::Resolving);
        let card = resolver::resolve_card(self.source(), query).await?;
        tracing::info!(id = card.id, full_path = %card.full_path, "resolved card");

        let slug = folder_slug(&card);
        let card_dir = output_dir.join(&slug);
        tokio::fs::create_dir_all(&card_dir)
            .await
            .map_err(|e| DownloadError::filesystem(&card_dir, e))?;

        sink.state(DownloadState::Rendering);
        let report_path = card_dir.join(report_file_name(&slug));
        assets::write_file(&report_path, render_report(&card).as_bytes()).await?;

        sink.state(DownloadState::Fetching);
        assets::fetch_primary_image(self.source(), &card, &card_dir, &slug).await?;
        let gallery = assets::fetch_gallery(self.source(), &card, &card_dir, sink).await?;

        sink.state(DownloadState::Packaging);
        let bundle_path = bundle::package(&card_dir, mode).await?;

        Ok(DownloadOutcome {
            card,
            bundle_path,
            mode,
            gallery,
        })
    }
}

fn folder_slug(card: &CardRecord) -> String {
    let slug = card_slug(&card.name);
    if slug.is_empty() {
        format!("card_{}", card.id)
    } else {
        slug
    }
}

/// A download running on a background task
#[derive(Debug)]
pub struct DownloadHandle {
    events: UnboundedReceiver<StatusEvent>,
    task: JoinHandle<Result<DownloadOutcome, DownloadError>>,
}

impl DownloadHandle {
    /// Next progress event; `None` once the download has stopped reporting.
    pub async fn next_event(&mut self) -> Option<StatusEvent> {
        self.events.recv().await
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Wait for the download and return its result.
    pub async fn wait(self) -> Result<DownloadOutcome, DownloadError> {
        self.task
            .await
            .map_err(|e| DownloadError::Worker(e.to_string()))?
    }
}
