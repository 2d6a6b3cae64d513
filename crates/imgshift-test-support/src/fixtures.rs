//! Payload and record fixtures.

use base64::Engine as _;
use base64::engine::general_purpose;
use imgshift_core::ProductRecord;

/// First bytes of a PNG file.
pub const PNG_SIGNATURE: &[u8] = b"\x89PNG\r\n\x1a\n";

/// Cloudinary-hosted URL recognised as already migrated.
pub const MIGRATED_URL: &str = "https://res.cloudinary.com/demo/image/upload/v1/products/p.jpg";

/// External URL that is not an inline payload.
pub const EXTERNAL_URL: &str = "https://images.example.com/catalog/1.jpg";

/// Encode bytes as a `data:` URI.
#[must_use]
pub fn data_uri(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", general_purpose::STANDARD.encode(bytes))
}

/// Small PNG data URI.
#[must_use]
pub fn png_payload() -> String {
    data_uri("image/png", PNG_SIGNATURE)
}

/// Record with the given image column.
#[must_use]
pub fn product(id: &str, image: Option<&str>) -> ProductRecord {
    ProductRecord::new(id, format!("Product {id}"), image.map(str::to_string))
}

/// The three-record scenario: no image, already migrated, inline PNG.
#[must_use]
pub fn mixed_catalog() -> Vec<ProductRecord> {
    vec![
        product("1", None),
        product("2", Some("https://res.cloudinary.com/x/y.jpg")),
        product("3", Some(&png_payload())),
    ]
}

/// `count` records that all carry inline payloads, ids `1..=count`.
#[must_use]
pub fn inline_catalog(count: usize) -> Vec<ProductRecord> {
    (1..=count)
        .map(|id| product(&id.to_string(), Some(&png_payload())))
        .collect()
}
