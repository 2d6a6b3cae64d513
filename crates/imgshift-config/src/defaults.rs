//! Fallback values and placeholders.
//!
//! # Design
//! - Placeholders are the literal values shipped in sample environment files; a run
//!   must refuse to start while any of them is still in place.

/// Placeholder cloud name shipped in sample configuration.
pub const PLACEHOLDER_CLOUD_NAME: &str = "your-cloud-name";
/// Placeholder upload preset shipped in sample configuration.
pub const PLACEHOLDER_UPLOAD_PRESET: &str = "your-upload-preset";
/// Base of the Cloudinary upload API; `<cloud>/image/upload` is appended.
pub const DEFAULT_UPLOAD_API: &str = "https://api.cloudinary.com/v1_1/";
/// Table holding the product records.
pub const DEFAULT_TABLE: &str = "products";
/// Per-request HTTP timeout.
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;
