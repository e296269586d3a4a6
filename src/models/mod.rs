//! Data models for cards and the API requests that fetch them.

mod card;
mod search;

pub use card::{CardBuilder, CardRecord, GalleryEntry, Label, TOKEN_COUNTS_LABEL};
pub use search::{
    CardDownloadRequest, GalleryPage, GalleryQuery, SearchPage, SearchQuery, SortBy,
};
