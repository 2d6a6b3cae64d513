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

//! Record source backed by a `PostgREST`-style REST API (for example Supabase).
//!
//! Layout: `endpoint.rs` (base URL, credentials, table), `postgrest.rs` (the
//! [`imgshift_core::RecordSource`] implementation), `row.rs` (wire rows).

pub mod endpoint;
pub mod postgrest;
mod row;

pub use endpoint::{DEFAULT_ORDER, DEFAULT_TABLE, EndpointError, StoreEndpoint};
pub use postgrest::PostgrestStore;
