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

//! Configuration for a migration run.
//!
//! Layout: `model.rs` (raw input and validated models), `validate.rs`
//! (placeholder, URL and range checks), `env.rs` (environment variable names),
//! `defaults.rs` (fallback values), `error.rs`.

pub mod defaults;
pub mod env;
pub mod error;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use model::{CloudinaryConfig, MigrationConfig, RawConfig, RunConfig, StoreConfig};
pub use validate::resolve;
