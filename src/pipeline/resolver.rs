//! Resolve a free-text search to exactly one card.

use crate::models::{CardRecord, SearchQuery};
use crate::sources::CardSource;

use super::DownloadError;

/// Search for `term` and return the single matching card.
///
/// The search includes NSFW/NSFL cards and asks for up to 100 results,
/// newest first. Zero matches is [`DownloadError::NotFound`], more than one
/// is [`DownloadError::Ambiguous`]; neither touches the filesystem.
pub async fn resolve_card(source: &dyn CardSource, term: &str) -> Result<CardRecord, DownloadError> {
    let query = SearchQuery::new(term);
    let page = source.search(&query).await?;

    tracing::debug!(count = page.count, nodes = page.nodes.len(), "search finished");

    match page.count {
        0 => Err(DownloadError::NotFound {
            query: term.to_string(),
            authenticated: source.has_credentials(),
        }),
        1 => page.nodes.into_iter().next().ok_or_else(|| {
            DownloadError::Parse("search reported one match but returned no card".to_string())
        }),
        count => Err(DownloadError::Ambiguous {
            query: term.to_string(),
            count,
        }),
    }
}
