//! Command handlers grouped by concern.

pub(crate) mod config;
pub(crate) mod delivery;
pub(crate) mod migrate;
