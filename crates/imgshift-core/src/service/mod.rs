//! Collaborator traits implemented by store and gateway adapters.

use async_trait::async_trait;

use crate::error::{GatewayResult, StoreResult};
use crate::model::{ProductRecord, RecordOutcome, UploadRequest, UploadResult};

/// Queryable store of product records.
#[async_trait]
pub trait RecordSource: Send + Sync {
    /// List records whose image column is not null, in store order, up to `limit` rows.
    async fn list_candidates(&self, limit: Option<usize>) -> StoreResult<Vec<ProductRecord>>;

    /// List only the identifiers of records whose image column is not null, ordered by
    /// insertion, up to `limit` rows.
    async fn list_candidate_ids(&self, limit: Option<usize>) -> StoreResult<Vec<String>>;

    /// Fetch a single record by id; `None` when it no longer exists.
    async fn fetch_record(&self, id: &str) -> StoreResult<Option<ProductRecord>>;

    /// Replace the image column of a record.
    async fn update_image(&self, id: &str, url: &str) -> StoreResult<()>;
}

/// Image host accepting binary uploads.
#[async_trait]
pub trait UploadGateway: Send + Sync {
    /// Upload an image under a stable public id, overwriting any previous asset.
    async fn upload(&self, request: UploadRequest) -> GatewayResult<UploadResult>;
}

/// Observer notified as the driver makes progress.
pub trait ProgressSink: Send + Sync {
    /// A batch is about to be processed.
    fn batch_started(&self, index: usize, batch_count: usize, size: usize) {
        let _ = (index, batch_count, size);
    }

    /// A record reached its terminal outcome.
    fn record_finished(&self, record_id: &str, name: &str, outcome: &RecordOutcome) {
        let _ = (record_id, name, outcome);
    }
}
