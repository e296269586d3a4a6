//! The fetch-and-assemble pipeline behind a card download.
//!
//! - [`resolver`]: turn a search term into exactly one card
//! - [`report`]: render the card metadata as a standalone HTML page
//! - [`assets`]: download the card image and its gallery
//! - [`bundle`]: leave the result as a folder or a zip archive
//! - [`orchestrator`]: run the steps in order and report progress

pub mod assets;
pub mod bundle;
pub mod orchestrator;
pub mod report;
pub mod resolver;
pub mod status;

pub use assets::{GalleryOutcome, SkippedImage};
pub use orchestrator::{DownloadHandle, DownloadOutcome, DownloadRequest, Downloader};
pub use status::{DownloadState, StatusEvent, StatusSink};

use std::path::PathBuf;

use crate::sources::{ApiDetail, SourceError};

/// Errors that end a download
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    /// Missing input; raised before any I/O
    #[error("{0}")]
    Validation(String),

    /// The search matched nothing
    #[error("No card found with the given name \"{query}\".{}", not_found_hint(.authenticated))]
    NotFound { query: String, authenticated: bool },

    /// The search matched several cards
    #[error("Multiple cards ({count}) found for \"{query}\". Please enter a more specific name or the card code.")]
    Ambiguous { query: String, count: usize },

    /// The API could not be reached
    #[error("An error occurred: {0}")]
    Transport(String),

    /// The API answered with a non-success status
    #[error("HTTP error occurred\nStatus Code: {status}\n{detail}")]
    Api { status: u16, detail: ApiDetail },

    /// The API answered with something that is not the expected JSON
    #[error("Unexpected API response: {0}")]
    Parse(String),

    /// Creating or writing a file failed
    #[error("Failed to write {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing the zip archive failed
    #[error("Failed to create archive: {0}")]
    Archive(String),

    /// The background task running the download died
    #[error("Download worker stopped unexpectedly: {0}")]
    Worker(String),
}

fn not_found_hint(authenticated: &bool) -> &'static str {
    if *authenticated {
        ""
    } else {
        "\n\nIf you're searching for NSFL or private cards, you may need to set your Chub.ai token."
    }
}

impl DownloadError {
    /// Short heading for the error, suitable for a dialog title
    pub fn title(&self) -> &'static str {
        match self {
            DownloadError::Validation(_) => "Input Error",
            DownloadError::NotFound { .. } => "No Results",
            DownloadError::Ambiguous { .. } => "Multiple Results",
            DownloadError::Transport(_) => "Network Error",
            DownloadError::Api { .. } => "API Error",
            DownloadError::Parse(_) => "API Error",
            DownloadError::Filesystem { .. } => "File Error",
            DownloadError::Archive(_) => "Archive Error",
            DownloadError::Worker(_) => "Error",
        }
    }

    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        DownloadError::Filesystem {
            path: path.into(),
            source,
        }
    }
}

impl From<SourceError> for DownloadError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::Network(message) => DownloadError::Transport(message),
            SourceError::Api { status, detail } => DownloadError::Api { status, detail },
            SourceError::Parse(message) => DownloadError::Parse(message),
        }
    }
}
