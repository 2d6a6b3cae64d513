#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::module_name_repetitions)]

//! Cloudinary integration for the image migration.
//!
//! Layout:
//! - `cloudinary.rs`: unsigned multipart upload implementing [`imgshift_core::UploadGateway`]
//! - `response.rs`: tagged decoding of upload responses
//! - `delivery.rs`: delivery URL and transformation helpers

pub mod cloudinary;
pub mod delivery;
mod response;

pub use cloudinary::CloudinaryGateway;
pub use delivery::{
    Crop, DELIVERY_HOST, Preset, Transformation, UnknownPreset, delivery_url, transform_url,
};
