//! # Chub Card Downloader
//!
//! Download a character card from Chub.ai together with its gallery and an
//! HTML page describing the card, optionally bundled into a zip archive.
//!
//! ## Architecture
//!
//! The library is organized into several modules:
//!
//! - [`models`]: Card records and the API request/response shapes
//! - [`sources`]: The Chub.ai API client behind the [`CardSource`] trait
//! - [`pipeline`]: Resolve, render, fetch and bundle a card
//! - [`utils`]: HTTP client and filename helpers
//! - [`config`]: Configuration management
//! - [`ui`]: Terminal output for the CLI

pub mod config;
pub mod models;
pub mod pipeline;
pub mod sources;
pub mod ui;
pub mod utils;

// Re-export commonly used types
pub use config::{BundleMode, Config, Settings};
pub use models::CardRecord;
pub use pipeline::{DownloadError, DownloadOutcome, DownloadRequest, Downloader};
pub use sources::{CardSource, ChubSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
