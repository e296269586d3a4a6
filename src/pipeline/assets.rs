//! Download the card image and the card's gallery.
//!
//! Bodies are written to disk exactly as received. The card PNG carries the
//! character definition in a text chunk, so it must never be re-encoded.

use std::path::{Path, PathBuf};

use crate::models::{CardDownloadRequest, CardRecord, GalleryQuery};
use crate::sources::{CardSource, SourceError};
use crate::utils::asset_file_name;

use super::{DownloadError, StatusSink};

/// File name of the card image inside the card folder
pub fn card_image_file_name(slug: &str) -> String {
    format!("{}.png", slug)
}

/// A gallery image that was not saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedImage {
    pub url: String,
    pub status: u16,
}

/// What the gallery step produced
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GalleryOutcome {
    /// Files written, in gallery order
    pub saved: Vec<PathBuf>,

    /// Images answered with a non-200 status
    pub skipped: Vec<SkippedImage>,

    /// The API reported no gallery images
    pub empty: bool,
}

/// Download the card image and write it to `{dir}/{slug}.png`.
pub async fn fetch_primary_image(
    source: &dyn CardSource,
    card: &CardRecord,
    dir: &Path,
    slug: &str,
) -> Result<PathBuf, DownloadError> {
    let request = CardDownloadRequest::card_spec_v2(&card.full_path);
    let bytes = source.download_card(&request).await?;

    let path = dir.join(card_image_file_name(slug));
    write_file(&path, &bytes).await?;
    tracing::info!(path = %path.display(), bytes = bytes.len(), "saved card image");
    Ok(path)
}

/// Download every image on the first gallery page into `dir`.
///
/// An empty gallery is reported as information. An image answered with a
/// non-200 status is logged, reported and skipped; any other failure ends
/// the download.
pub async fn fetch_gallery(
    source: &dyn CardSource,
    card: &CardRecord,
    dir: &Path,
    sink: &StatusSink,
) -> Result<GalleryOutcome, DownloadError> {
    let page = source.gallery(&GalleryQuery::new(card.id)).await?;
    let mut outcome = GalleryOutcome::default();

    if page.count == 0 {
        sink.info("No gallery images found.");
        outcome.empty = true;
        return Ok(outcome);
    }

    for (index, entry) in page.nodes.iter().enumerate() {
        let url = &entry.primary_image_path;
        match source.fetch_asset(url).await {
            Ok(bytes) => {
                let path = dir.join(asset_file_name(url, index));
                write_file(&path, &bytes).await?;
                tracing::debug!(path = %path.display(), "saved gallery image");
                outcome.saved.push(path);
            }
            Err(SourceError::Api { status, .. }) => {
                sink.warn(format!(
                    "Skipped gallery image {} (status {})",
                    url, status
                ));
                outcome.skipped.push(SkippedImage {
                    url: url.clone(),
                    status,
                });
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        saved = outcome.saved.len(),
        skipped = outcome.skipped.len(),
        "gallery finished"
    );
    Ok(outcome)
}

pub(crate) async fn write_file(path: &Path, bytes: &[u8]) -> Result<(), DownloadError> {
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| DownloadError::filesystem(path, e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::GalleryPage;
    use crate::pipeline::StatusEvent;
    use crate::sources::mock::make_card;
    use crate::sources::MockSource;
    use tempfile::tempdir;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_primary_image_written_verbatim() {
        let dir = tempdir().unwrap();
        let source = MockSource::new();
        let png: Vec<u8> = vec![0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n', 0, 0, 0, 0];
        source.set_card_image(png.clone());

        let card = make_card(1, "Aria Test");
        let path = fetch_primary_image(&source, &card, dir.path(), "Aria_Test")
            .await
            .unwrap();

        assert_eq!(path, dir.path().join("Aria_Test.png"));
        assert_eq!(std::fs::read(&path).unwrap(), png);
    }

    #[tokio::test]
    async fn test_empty_gallery_is_informational() {
        let dir = tempdir().unwrap();
        let source = MockSource::new();
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = fetch_gallery(&source, &make_card(1, "A"), dir.path(), &StatusSink::new(tx))
            .await
            .unwrap();

        assert!(outcome.empty);
        assert!(outcome.saved.is_empty());
        assert_eq!(
            rx.try_recv().unwrap(),
            StatusEvent::Info("No gallery images found.".to_string())
        );
    }

    #[tokio::test]
    async fn test_failed_gallery_image_is_skipped() {
        let dir = tempdir().unwrap();
        let source = MockSource::new();
        source.set_gallery_response(GalleryPage::new(vec![
            "http://x/g1.jpg".to_string(),
            "http://x/missing.jpg".to_string(),
            "http://x/g3.png?size=full".to_string(),
        ]));
        source.set_asset("http://x/g1.jpg", b"one".to_vec());
        source.set_asset_status("http://x/missing.jpg", 404);
        source.set_asset("http://x/g3.png?size=full", b"three".to_vec());
        let (tx, mut rx) = mpsc::unbounded_channel();

        let outcome = fetch_gallery(&source, &make_card(1, "A"), dir.path(), &StatusSink::new(tx))
            .await
            .unwrap();

        assert_eq!(
            outcome.saved,
            vec![dir.path().join("g1.jpg"), dir.path().join("g3.png")]
        );
        assert_eq!(
            outcome.skipped,
            vec![SkippedImage {
                url: "http://x/missing.jpg".to_string(),
                status: 404
            }]
        );
        assert_eq!(std::fs::read(dir.path().join("g1.jpg")).unwrap(), b"one");
        assert_eq!(std::fs::read(dir.path().join("g3.png")).unwrap(), b"three");
        assert!(!dir.path().join("missing.jpg").exists());
        assert!(matches!(rx.try_recv().unwrap(), StatusEvent::Warning(_)));
    }

    #[tokio::test]
    async fn test_unwritable_directory_is_filesystem_error() {
        let dir = tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");
        let source = MockSource::new();

        let err = fetch_primary_image(&source, &make_card(1, "A"), &missing, "A")
            .await
            .unwrap_err();
        assert!(matches!(err, DownloadError::Filesystem { .. }));
    }
}
