//! Filename sanitization for card names and gallery image URLs.
//!
//! Every name that ends up on disk goes through [`sanitize_filename`] first.
//! Sanitizing never fails; it may produce an empty string, which callers are
//! expected to replace with a fallback name.

/// Characters that are rejected by at least one major filesystem.
pub const INVALID_FILENAME_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Remove `<>:"/\|?*` and strip trailing spaces and periods.
///
/// ```
/// use chub_card_downloader::utils::sanitize_filename;
///
/// assert_eq!(sanitize_filename("What? A <Card>..."), "What A Card");
/// assert_eq!(sanitize_filename("***"), "");
/// ```
pub fn sanitize_filename(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .filter(|ch| !INVALID_FILENAME_CHARS.contains(ch))
        .collect();

    cleaned.trim_end_matches(&[' ', '.'][..]).to_string()
}

/// Folder and file stem used for a card: the sanitized name with spaces
/// replaced by underscores.
pub fn card_slug(name: &str) -> String {
    sanitize_filename(name).replace(' ', "_")
}

/// File name for a downloaded gallery image.
///
/// Uses the last path segment of the URL (query and fragment ignored),
/// sanitized. Falls back to `gallery_{index}` when nothing usable is left.
pub fn asset_file_name(image_url: &str, index: usize) -> String {
    let segment = match url::Url::parse(image_url) {
        Ok(parsed) => parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .map(|s| s.to_string())
            .unwrap_or_default(),
        Err(_) => image_url
            .split(|ch: char| ch == '?' || ch == '#')
            .next()
            .unwrap_or_default()
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string(),
    };

    let name = sanitize_filename(&segment);
    if name.is_empty() {
        format!("gallery_{}", index)
    } else {
        name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[&str] = &[
        "",
        "Aria Test",
        "What? A <Card>...",
        "trailing dots...",
        "trailing spaces   ",
        "mixed . . . ",
        "a/b\\c:d*e?f\"g<h>i|j",
        "***",
        "...",
        "  leading spaces kept",
        "ends with ?. ",
        "émoji 🎉 name.",
    ];

    #[test]
    fn test_sanitize_removes_invalid_chars() {
        for sample in SAMPLES {
            let out = sanitize_filename(sample);
            assert!(
                !out.contains(INVALID_FILENAME_CHARS),
                "{:?} -> {:?}",
                sample,
                out
            );
        }
    }

    #[test]
    fn test_sanitize_no_trailing_space_or_period() {
        for sample in SAMPLES {
            let out = sanitize_filename(sample);
            assert!(!out.ends_with(' '), "{:?} -> {:?}", sample, out);
            assert!(!out.ends_with('.'), "{:?} -> {:?}", sample, out);
        }
    }

    #[test]
    fn test_sanitize_idempotent() {
        for sample in SAMPLES {
            let once = sanitize_filename(sample);
            assert_eq!(sanitize_filename(&once), once);
        }
    }

    #[test]
    fn test_sanitize_examples() {
        assert_eq!(sanitize_filename("Aria Test"), "Aria Test");
        assert_eq!(sanitize_filename("a/b\\c:d*e?f\"g<h>i|j"), "abcdefghij");
        assert_eq!(sanitize_filename("ends with ?. "), "ends with");
        assert_eq!(sanitize_filename("  leading spaces kept"), "  leading spaces kept");
        assert_eq!(sanitize_filename("émoji 🎉 name."), "émoji 🎉 name");
    }

    #[test]
    fn test_sanitize_can_be_empty() {
        assert_eq!(sanitize_filename(""), "");
        assert_eq!(sanitize_filename("***"), "");
        assert_eq!(sanitize_filename("..."), "");
        assert_eq!(sanitize_filename("?? .."), "");
        assert_eq!(card_slug("<>"), "");
    }

    #[test]
    fn test_card_slug() {
        assert_eq!(card_slug("Aria Test"), "Aria_Test");
        assert_eq!(card_slug("Aria Test. "), "Aria_Test");
        assert_eq!(card_slug("Who: Me?"), "Who_Me");
    }

    #[test]
    fn test_asset_file_name() {
        assert_eq!(asset_file_name("http://x/g1.jpg", 0), "g1.jpg");
        assert_eq!(
            asset_file_name("https://cdn.example.com/images/abc/def.webp?w=100#top", 0),
            "def.webp"
        );
        assert_eq!(asset_file_name("not a url/pic.png?x=1", 0), "pic.png");
    }

    #[test]
    fn test_asset_file_name_fallback() {
        assert_eq!(asset_file_name("http://x/", 3), "gallery_3");
        assert_eq!(asset_file_name("", 1), "gallery_1");
    }
}
