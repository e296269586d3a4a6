//! Card model representing a single character card returned by the API.

use serde::{Deserialize, Deserializer, Serialize};

/// Title of the label that carries the token-count JSON blob.
pub const TOKEN_COUNTS_LABEL: &str = "TOKEN_COUNTS";

/// A label attached to a card.
///
/// Most labels are plain tags, but the API smuggles structured data through
/// some of them (see [`TOKEN_COUNTS_LABEL`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Label {
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,

    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
}

/// Treat an explicit JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// A character card as returned in the `nodes` array of a search response.
///
/// Only `id`, `fullPath` and `name` are required; everything else is
/// optional because the API omits fields freely depending on the card.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardRecord {
    /// Numeric project identifier (used by the gallery endpoint)
    pub id: u64,

    /// Canonical `creator/slug` path (used by the download endpoint)
    pub full_path: String,

    /// Display name
    pub name: String,

    /// Markdown description
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,

    #[serde(default)]
    pub tagline: Option<String>,

    #[serde(default, rename = "avatar_url")]
    pub avatar_url: Option<String>,

    /// Shown as "Downloads" in the report
    #[serde(default)]
    pub star_count: Option<u64>,

    #[serde(default)]
    pub last_activity_at: Option<String>,

    #[serde(default)]
    pub created_at: Option<String>,

    /// Tags
    #[serde(default, deserialize_with = "null_as_default")]
    pub topics: Vec<String>,

    #[serde(default)]
    pub forks_count: Option<u64>,

    #[serde(default)]
    pub rating: Option<f64>,

    #[serde(default)]
    pub rating_count: Option<u64>,

    #[serde(default)]
    pub n_chats: Option<u64>,

    #[serde(default)]
    pub n_messages: Option<u64>,

    #[serde(default, rename = "n_public_chats")]
    pub n_public_chats: Option<u64>,

    #[serde(default, rename = "n_favorites")]
    pub n_favorites: Option<u64>,

    #[serde(default, deserialize_with = "null_as_default")]
    pub labels: Vec<Label>,
}

impl CardRecord {
    /// Create a card with the required fields and everything else empty
    pub fn new(id: u64, full_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id,
            full_path: full_path.into(),
            name: name.into(),
            description: String::new(),
            tagline: None,
            avatar_url: None,
            star_count: None,
            last_activity_at: None,
            created_at: None,
            topics: Vec::new(),
            forks_count: None,
            rating: None,
            rating_count: None,
            n_chats: None,
            n_messages: None,
            n_public_chats: None,
            n_favorites: None,
            labels: Vec::new(),
        }
    }

    /// Returns the first label with the given title
    pub fn label(&self, title: &str) -> Option<&Label> {
        self.labels.iter().find(|label| label.title == title)
    }

    /// Tags joined the way the report displays them
    pub fn tag_list(&self) -> String {
        self.topics.join(", ")
    }
}

/// Builder for constructing [`CardRecord`] values, mostly for tests and the
/// mock source.
#[derive(Debug, Clone)]
pub struct CardBuilder {
    card: CardRecord,
}

impl CardBuilder {
    /// Create a new builder with required fields
    pub fn new(id: u64, full_path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            card: CardRecord::new(id, full_path, name),
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.card.description = description.into();
        self
    }

    pub fn tagline(mut self, tagline: impl Into<String>) -> Self {
        self.card.tagline = Some(tagline.into());
        self
    }

    pub fn avatar_url(mut self, url: impl Into<String>) -> Self {
        self.card.avatar_url = Some(url.into());
        self
    }

    pub fn topics<I, S>(mut self, topics: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.card.topics = topics.into_iter().map(Into::into).collect();
        self
    }

    pub fn star_count(mut self, count: u64) -> Self {
        self.card.star_count = Some(count);
        self
    }

    pub fn rating(mut self, rating: f64, count: u64) -> Self {
        self.card.rating = Some(rating);
        self.card.rating_count = Some(count);
        self
    }

    /// Append a label
    pub fn label(mut self, title: impl Into<String>, description: impl Into<String>) -> Self {
        self.card.labels.push(Label {
            title: title.into(),
            description: description.into(),
        });
        self
    }

    pub fn build(self) -> CardRecord {
        self.card
    }
}

/// One entry of a gallery listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GalleryEntry {
    pub primary_image_path: String,
}
