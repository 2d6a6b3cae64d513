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

//! Store- and host-agnostic core of the product image migration.
//!
//! Layout: `model/` (records, upload DTOs, tallies), `classify.rs` (four-way
//! image decision), `decode.rs` (inline payload decoding), `service/`
//! (collaborator traits), `driver.rs` (batch migration driver), `error.rs`.

pub mod classify;
pub mod decode;
pub mod driver;
pub mod error;
pub mod model;
pub mod service;

pub use classify::{Decision, INLINE_LENGTH_THRESHOLD, INLINE_PREFIX, classify};
pub use decode::{DEFAULT_MIME, DecodedImage, decode, extension_for_mime};
pub use driver::{
    DEFAULT_FOLDER, DEFAULT_PUBLIC_ID_PREFIX, DEFAULT_TARGET_MARKER, DriverPhase, DriverSettings,
    FetchStrategy, MigrationDriver,
};
pub use error::{
    BoxError, DecodeError, GatewayError, GatewayResult, MigrationError, MigrationResult,
    RecordError, StoreError, StoreResult, error_chain,
};
pub use model::{
    BatchOutcome, ErrorDetail, ImageField, ProductRecord, RecordOutcome, RecordStage, RunResult,
    ScanReport, SkipReason, UploadRequest, UploadResult,
};
pub use service::{ProgressSink, RecordSource, UploadGateway};
