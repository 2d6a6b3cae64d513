//! Four-way decision over a record's image column.

use crate::model::ImageField;

/// Prefix carried by inline data URIs.
pub const INLINE_PREFIX: &str = "data:";

/// Values longer than this many characters are treated as inline payloads.
pub const INLINE_LENGTH_THRESHOLD: usize = 1000;

/// What the driver should do with a record's image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision<'a> {
    /// No image value.
    SkipAbsent,
    /// Already hosted on the target CDN.
    SkipAlreadyMigrated,
    /// External URL that is not an inline payload.
    SkipNotInline,
    /// Inline payload to decode and upload.
    Migrate(&'a str),
}

/// Classify an image value. Rules apply in order, first match wins:
/// empty, contains the target marker, not inline-looking, otherwise migrate.
#[must_use]
pub fn classify<'a>(image: Option<&'a str>, target_marker: &str) -> Decision<'a> {
    match ImageField::parse(image, target_marker) {
        ImageField::Absent => Decision::SkipAbsent,
        ImageField::TargetReference(_) => Decision::SkipAlreadyMigrated,
        ImageField::RemoteReference(_) => Decision::SkipNotInline,
        ImageField::InlinePayload { .. } => image.map_or(Decision::SkipAbsent, Decision::Migrate),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MARKER: &str = "res.cloudinary.com";

    #[test]
    fn absent_values_are_skipped() {
        assert_eq!(classify(None, MARKER), Decision::SkipAbsent);
        assert_eq!(classify(Some(""), MARKER), Decision::SkipAbsent);
        assert_eq!(classify(Some(" \n"), MARKER), Decision::SkipAbsent);
    }

    #[test]
    fn target_marker_wins_over_inline_shape() {
        assert_eq!(
            classify(Some("https://res.cloudinary.com/demo/image/upload/p.jpg"), MARKER),
            Decision::SkipAlreadyMigrated
        );
        let long_cdn = format!(
            "https://res.cloudinary.com/demo/{}",
            "a".repeat(INLINE_LENGTH_THRESHOLD)
        );
        assert_eq!(
            classify(Some(&long_cdn), MARKER),
            Decision::SkipAlreadyMigrated
        );
    }

    #[test]
    fn short_external_urls_are_not_inline() {
        assert_eq!(
            classify(Some("https://images.example.com/p/1.jpg"), MARKER),
            Decision::SkipNotInline
        );
        let exactly_threshold = "b".repeat(INLINE_LENGTH_THRESHOLD);
        assert_eq!(
            classify(Some(&exactly_threshold), MARKER),
            Decision::SkipNotInline
        );
    }

    #[test]
    fn prefixed_or_long_values_migrate() {
        let payload = "data:image/png;base64,iVBORw0KGgo=";
        assert_eq!(classify(Some(payload), MARKER), Decision::Migrate(payload));

        let bare = "c".repeat(INLINE_LENGTH_THRESHOLD + 1);
        assert_eq!(classify(Some(&bare), MARKER), Decision::Migrate(&bare));
    }

    #[test]
    fn long_signed_urls_are_a_known_false_positive() {
        let signed = format!(
            "https://storage.example.com/p/1.jpg?signature={}",
            "s".repeat(INLINE_LENGTH_THRESHOLD)
        );
        assert_eq!(classify(Some(&signed), MARKER), Decision::Migrate(&signed));
    }

    #[test]
    fn malformed_prefixes_still_migrate() {
        assert_eq!(
            classify(Some("data:garbage"), MARKER),
            Decision::Migrate("data:garbage")
        );
    }
}
