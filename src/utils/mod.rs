//! Utility modules shared by the download pipeline.
//!
//! - [`sanitize_filename`]: Strip characters that are not valid in file names
//! - [`card_slug`]: Folder and file stem for a card name
//! - [`asset_file_name`]: Local file name for a gallery image URL
//! - [`HttpClient`]: Shared reqwest client carrying the tool's user agent

mod http;
mod validate;

pub use http::{HttpClient, DEFAULT_USER_AGENT};
pub use validate::{asset_file_name, card_slug, sanitize_filename, INVALID_FILENAME_CHARS};
