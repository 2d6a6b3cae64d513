//! Environment variable names and shared value parsers.
//!
//! The CLI binds each flag to one of these variables, so every setting has a single
//! environment source. Validation messages name the same variables.

use imgshift_core::FetchStrategy;

/// Cloudinary cloud name.
pub const ENV_CLOUD_NAME: &str = "IMGSHIFT_CLOUD_NAME";
/// Unsigned upload preset.
pub const ENV_UPLOAD_PRESET: &str = "IMGSHIFT_UPLOAD_PRESET";
/// Destination folder.
pub const ENV_FOLDER: &str = "IMGSHIFT_FOLDER";
/// Upload API base override.
pub const ENV_UPLOAD_API: &str = "IMGSHIFT_UPLOAD_API";
/// `PostgREST` base URL.
pub const ENV_STORE_URL: &str = "IMGSHIFT_STORE_URL";
/// `PostgREST` API key.
pub const ENV_STORE_KEY: &str = "IMGSHIFT_STORE_KEY";
/// Record table.
pub const ENV_TABLE: &str = "IMGSHIFT_TABLE";
/// Listing order.
pub const ENV_ORDER_BY: &str = "IMGSHIFT_ORDER_BY";
/// Listing strategy (`bulk` or `by-id`).
pub const ENV_STRATEGY: &str = "IMGSHIFT_STRATEGY";
/// Records per batch.
pub const ENV_BATCH_SIZE: &str = "IMGSHIFT_BATCH_SIZE";
/// Pause between batches in milliseconds.
pub const ENV_BATCH_DELAY_MS: &str = "IMGSHIFT_BATCH_DELAY_MS";
/// Pause after each migrated record in milliseconds.
pub const ENV_RECORD_DELAY_MS: &str = "IMGSHIFT_RECORD_DELAY_MS";
/// Candidate cap.
pub const ENV_LIMIT: &str = "IMGSHIFT_LIMIT";
/// Dry-run toggle.
pub const ENV_DRY_RUN: &str = "IMGSHIFT_DRY_RUN";
/// Public id prefix.
pub const ENV_PUBLIC_ID_PREFIX: &str = "IMGSHIFT_PUBLIC_ID_PREFIX";
/// Target CDN marker.
pub const ENV_TARGET_MARKER: &str = "IMGSHIFT_TARGET_MARKER";
/// HTTP timeout in seconds.
pub const ENV_HTTP_TIMEOUT_SECS: &str = "IMGSHIFT_HTTP_TIMEOUT_SECS";
/// Log format (`json`, `pretty` or `auto`).
pub const ENV_LOG_FORMAT: &str = "IMGSHIFT_LOG_FORMAT";
/// Log level filter.
pub const ENV_LOG_LEVEL: &str = "IMGSHIFT_LOG_LEVEL";

/// Parse a strategy name (`bulk`, `by-id`, `by_id`, `byid`).
#[must_use]
pub fn parse_strategy(value: &str) -> Option<FetchStrategy> {
    match value.to_ascii_lowercase().as_str() {
        "bulk" => Some(FetchStrategy::Bulk),
        "by-id" | "by_id" | "byid" => Some(FetchStrategy::ById),
        _ => None,
    }
}
