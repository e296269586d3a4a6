//! Request and response models for the search, download and gallery endpoints.

use serde::{Deserialize, Serialize};

use super::card::{CardRecord, GalleryEntry};

/// Field the search endpoint sorts by
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortBy {
    CreatedAt,
    LastActivityAt,
    StarCount,
}

impl SortBy {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortBy::CreatedAt => "created_at",
            SortBy::LastActivityAt => "last_activity_at",
            SortBy::StarCount => "star_count",
        }
    }
}

/// Search query parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchQuery {
    /// Free-text card name or code
    pub search: String,

    /// Include NSFW cards
    pub nsfw: bool,

    /// Include NSFL cards
    pub nsfl: bool,

    /// Page size
    pub first: usize,

    /// 1-based page number
    pub page: usize,

    pub sort: SortBy,

    /// Ascending when true, newest first otherwise
    pub ascending: bool,
}

impl Default for SearchQuery {
    fn default() -> Self {
        Self {
            search: String::new(),
            nsfw: true,
            nsfl: true,
            first: 100,
            page: 1,
            sort: SortBy::CreatedAt,
            ascending: false,
        }
    }
}

impl SearchQuery {
    /// Create a new search query with the defaults used for card lookup:
    /// adult content included, 100 results, newest first.
    pub fn new(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Default::default()
        }
    }

    /// Set page size
    pub fn first(mut self, first: usize) -> Self {
        self.first = first;
        self
    }

    /// Set page number
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    /// Query-string pairs in the order the API documents them
    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("search", self.search.clone()),
            ("nsfw", self.nsfw.to_string()),
            ("nsfl", self.nsfl.to_string()),
            ("first", self.first.to_string()),
            ("page", self.page.to_string()),
            ("sort", self.sort.as_str().to_string()),
            ("asc", self.ascending.to_string()),
        ]
    }
}

/// Search endpoint response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchPage {
    /// Total number of matches reported by the API
    #[serde(default)]
    pub count: usize,

    #[serde(default)]
    pub nodes: Vec<CardRecord>,
}

impl SearchPage {
    pub fn new(nodes: Vec<CardRecord>) -> Self {
        Self {
            count: nodes.len(),
            nodes,
        }
    }
}

/// Body of the card download request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardDownloadRequest {
    pub format: String,

    #[serde(rename = "fullPath")]
    pub full_path: String,

    pub version: String,
}

impl CardDownloadRequest {
    /// Request the PNG card (V2 card spec embedded in the image) of the main
    /// version of a card.
    pub fn card_spec_v2(full_path: impl Into<String>) -> Self {
        Self {
            format: "card_spec_v2".to_string(),
            full_path: full_path.into(),
            version: "main".to_string(),
        }
    }
}

/// Gallery listing parameters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryQuery {
    pub project_id: u64,
    pub nsfw: bool,
    pub page: usize,
    pub limit: usize,
}

impl GalleryQuery {
    pub fn new(project_id: u64) -> Self {
        Self {
            project_id,
            nsfw: true,
            page: 1,
            limit: 24,
        }
    }

    pub fn to_params(&self) -> Vec<(&'static str, String)> {
        vec![
            ("nsfw", self.nsfw.to_string()),
            ("page", self.page.to_string()),
            ("limit", self.limit.to_string()),
        ]
    }
}

/// Gallery endpoint response
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GalleryPage {
    #[serde(default)]
    pub count: usize,

    #[serde(default)]
    pub nodes: Vec<GalleryEntry>,
}

impl GalleryPage {
    pub fn new(urls: Vec<String>) -> Self {
        let nodes: Vec<GalleryEntry> = urls
            .into_iter()
            .map(|primary_image_path| GalleryEntry { primary_image_path })
            .collect();
        Self {
            count: nodes.len(),
            nodes,
        }
    }
}
