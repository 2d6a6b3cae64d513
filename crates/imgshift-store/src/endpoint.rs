//! Connection details for a `PostgREST` table.
//!
//! # Design
//! - The table URL is resolved once, when the endpoint is built, so request paths
//!   cannot fail later in the run.
//! - Table names are restricted to identifier characters; they are spliced into the path.

use thiserror::Error;
use url::Url;

/// Table holding the product records.
pub const DEFAULT_TABLE: &str = "products";
/// Ordering applied to listings, matching insertion order for serial keys.
pub const DEFAULT_ORDER: &str = "id.asc";

const REST_PREFIX: [&str; 2] = ["rest", "v1"];

/// Errors raised while building a [`StoreEndpoint`].
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EndpointError {
    /// The base URL cannot carry a path (for example `mailto:`).
    #[error("store url cannot be used as a base url")]
    NotABase {
        /// Offending URL.
        value: String,
    },
    /// The table name is empty or contains characters outside `[A-Za-z0-9_]`.
    #[error("invalid table name")]
    InvalidTable {
        /// Offending table name.
        value: String,
    },
    /// The API key is empty.
    #[error("store api key is empty")]
    MissingKey,
}

/// Where and how to reach the record table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreEndpoint {
    table_url: Url,
    table: String,
    api_key: String,
    order: Option<String>,
}

impl StoreEndpoint {
    /// Resolve `<base_url>/rest/v1/<table>`.
    ///
    /// # Errors
    ///
    /// Returns [`EndpointError`] when the URL cannot be a base, the table name is not a
    /// plain identifier, or the key is empty.
    pub fn new(base_url: &Url, table: &str, api_key: &str) -> Result<Self, EndpointError> {
        if api_key.trim().is_empty() {
            return Err(EndpointError::MissingKey);
        }
        if table.is_empty()
            || !table
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '_')
        {
            return Err(EndpointError::InvalidTable {
                value: table.to_string(),
            });
        }

        let mut table_url = base_url.clone();
        table_url
            .path_segments_mut()
            .map_err(|()| EndpointError::NotABase {
                value: base_url.to_string(),
            })?
            .pop_if_empty()
            .extend(REST_PREFIX)
            .push(table);
        table_url.set_query(None);

        Ok(Self {
            table_url,
            table: table.to_string(),
            api_key: api_key.trim().to_string(),
            order: Some(DEFAULT_ORDER.to_string()),
        })
    }

    /// Override the listing order (`<column>.<asc|desc>`); `None` leaves it to the store.
    #[must_use]
    pub fn with_order(mut self, order: Option<String>) -> Self {
        self.order = order.filter(|value| !value.trim().is_empty());
        self
    }

    /// Fully resolved table URL.
    #[must_use]
    pub const fn table_url(&self) -> &Url {
        &self.table_url
    }

    /// Table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Listing order, if any.
    #[must_use]
    pub fn order(&self) -> Option<&str> {
        self.order.as_deref()
    }

    pub(crate) fn api_key(&self) -> &str {
        &self.api_key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base(raw: &str) -> Url {
        Url::parse(raw).expect("valid url")
    }

    #[test]
    fn table_url_appends_rest_prefix() {
        let endpoint =
            StoreEndpoint::new(&base("https://abc.supabase.co"), "products", "key").expect("ok");
        assert_eq!(
            endpoint.table_url().as_str(),
            "https://abc.supabase.co/rest/v1/products"
        );
        assert_eq!(endpoint.order(), Some(DEFAULT_ORDER));
    }

    #[test]
    fn table_url_keeps_base_path_and_drops_query() {
        let endpoint =
            StoreEndpoint::new(&base("http://proxy.local/db/?x=1"), "items", "key").expect("ok");
        assert_eq!(
            endpoint.table_url().as_str(),
            "http://proxy.local/db/rest/v1/items"
        );
    }

    #[test]
    fn rejects_unusable_inputs() {
        let url = base("https://abc.supabase.co");
        assert_eq!(
            StoreEndpoint::new(&url, "products; drop", "key"),
            Err(EndpointError::InvalidTable {
                value: "products; drop".into()
            })
        );
        assert_eq!(
            StoreEndpoint::new(&url, "products", "  "),
            Err(EndpointError::MissingKey)
        );
        assert!(matches!(
            StoreEndpoint::new(&base("mailto:ops@example.com"), "products", "key"),
            Err(EndpointError::NotABase { .. })
        ));
    }

    #[test]
    fn blank_order_is_cleared() {
        let endpoint = StoreEndpoint::new(&base("https://abc.supabase.co"), "products", "key")
            .expect("ok")
            .with_order(Some(" ".into()));
        assert_eq!(endpoint.order(), None);
    }
}
