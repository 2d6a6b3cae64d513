//! [`RecordSource`] over the `PostgREST` query dialect.
//!
//! # Design
//! - Every request carries both the `apikey` header and a bearer token, as Supabase expects.
//! - Candidate listings filter `image=not.is.null` server side.
//! - Response bodies are read fully before decoding so decode failures and transport
//!   failures stay distinguishable.
//! - Write-backs ask for the updated ids back; an update matching no row is an error.

use async_trait::async_trait;
use imgshift_core::{ProductRecord, RecordSource, StoreError, StoreResult};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::endpoint::StoreEndpoint;
use crate::row::{
    ID_COLUMN, IdRow, ImagePatch, RECORD_COLUMNS, RecordRow, UnsupportedId, failure_message,
};

const HEADER_API_KEY: &str = "apikey";
const HEADER_PREFER: &str = "Prefer";
const RETURN_REPRESENTATION: &str = "return=representation";
const NOT_NULL: &str = "not.is.null";

/// `PostgREST`-backed record source.
#[derive(Clone)]
pub struct PostgrestStore {
    client: Client,
    endpoint: StoreEndpoint,
}

impl PostgrestStore {
    /// Wrap a configured HTTP client; the client's timeout applies to every call.
    #[must_use]
    pub const fn new(client: Client, endpoint: StoreEndpoint) -> Self {
        Self { client, endpoint }
    }

    /// Endpoint this store talks to.
    #[must_use]
    pub const fn endpoint(&self) -> &StoreEndpoint {
        &self.endpoint
    }

    fn request(&self, method: Method) -> RequestBuilder {
        self.client
            .request(method, self.endpoint.table_url().clone())
            .header(HEADER_API_KEY, self.endpoint.api_key())
            .bearer_auth(self.endpoint.api_key())
    }

    fn listing(&self, columns: &str, limit: Option<usize>) -> RequestBuilder {
        let mut request = self
            .request(Method::GET)
            .query(&[("select", columns), ("image", NOT_NULL)]);
        if let Some(order) = self.endpoint.order() {
            request = request.query(&[("order", order)]);
        }
        if let Some(limit) = limit {
            request = request.query(&[("limit", limit)]);
        }
        request
    }
}

fn transport(operation: &'static str) -> impl FnOnce(reqwest::Error) -> StoreError {
    move |source| StoreError::Transport {
        operation,
        source: Box::new(source),
    }
}

async fn execute(operation: &'static str, request: RequestBuilder) -> StoreResult<Vec<u8>> {
    let response = request.send().await.map_err(transport(operation))?;
    let status = response.status();
    let body = response.bytes().await.map_err(transport(operation))?;
    if !status.is_success() {
        return Err(StoreError::Status {
            operation,
            status: status.as_u16(),
            message: status_message(status, &body),
        });
    }
    Ok(body.to_vec())
}

fn status_message(status: StatusCode, body: &[u8]) -> String {
    let message = failure_message(body);
    if message.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("no response body")
            .to_string()
    } else {
        message
    }
}

fn decode_rows<T: DeserializeOwned>(operation: &'static str, body: &[u8]) -> StoreResult<Vec<T>> {
    serde_json::from_slice(body).map_err(|source| StoreError::Decode {
        operation,
        source: Box::new(source),
    })
}

fn invalid_row(operation: &'static str) -> impl Fn(UnsupportedId) -> StoreError {
    move |source| StoreError::Decode {
        operation,
        source: Box::new(source),
    }
}

#[async_trait]
impl RecordSource for PostgrestStore {
    #[instrument(
        name = "postgrest.list_candidates",
        skip(self),
        fields(table = %self.endpoint.table())
    )]
    async fn list_candidates(&self, limit: Option<usize>) -> StoreResult<Vec<ProductRecord>> {
        const OPERATION: &str = "postgrest.list_candidates";
        let body = execute(OPERATION, self.listing(RECORD_COLUMNS, limit)).await?;
        let records = decode_rows::<RecordRow>(OPERATION, &body)?
            .into_iter()
            .map(RecordRow::into_record)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_row(OPERATION))?;
        debug!(rows = records.len(), "candidate records listed");
        Ok(records)
    }

    #[instrument(
        name = "postgrest.list_candidate_ids",
        skip(self),
        fields(table = %self.endpoint.table())
    )]
    async fn list_candidate_ids(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        const OPERATION: &str = "postgrest.list_candidate_ids";
        let body = execute(OPERATION, self.listing(ID_COLUMN, limit)).await?;
        let ids = decode_rows::<IdRow>(OPERATION, &body)?
            .into_iter()
            .map(IdRow::into_id)
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid_row(OPERATION))?;
        debug!(rows = ids.len(), "candidate ids listed");
        Ok(ids)
    }

    #[instrument(
        name = "postgrest.fetch_record",
        skip(self),
        fields(table = %self.endpoint.table())
    )]
    async fn fetch_record(&self, id: &str) -> StoreResult<Option<ProductRecord>> {
        const OPERATION: &str = "postgrest.fetch_record";
        let filter = format!("eq.{id}");
        let request = self
            .request(Method::GET)
            .query(&[("select", RECORD_COLUMNS), (ID_COLUMN, filter.as_str())]);
        let body = execute(OPERATION, request).await?;
        decode_rows::<RecordRow>(OPERATION, &body)?
            .into_iter()
            .next()
            .map(RecordRow::into_record)
            .transpose()
            .map_err(invalid_row(OPERATION))
    }

    #[instrument(
        name = "postgrest.update_image",
        skip(self, url),
        fields(table = %self.endpoint.table())
    )]
    async fn update_image(&self, id: &str, url: &str) -> StoreResult<()> {
        const OPERATION: &str = "postgrest.update_image";
        let filter = format!("eq.{id}");
        let request = self
            .request(Method::PATCH)
            .query(&[(ID_COLUMN, filter.as_str()), ("select", ID_COLUMN)])
            .header(HEADER_PREFER, RETURN_REPRESENTATION)
            .json(&ImagePatch { image: url });
        let body = execute(OPERATION, request).await?;
        let updated = decode_rows::<IdRow>(OPERATION, &body)?.len();
        if updated == 0 {
            return Err(StoreError::NoMatch {
                operation: OPERATION,
                id: id.to_string(),
            });
        }
        debug!(rows = updated, "image column updated");
        Ok(())
    }
}
