//! In-memory collaborators standing in for the record store and the upload gateway.

use std::collections::HashSet;
use std::io;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use imgshift_core::{
    GatewayError, GatewayResult, ProductRecord, ProgressSink, RecordOutcome, RecordSource,
    StoreError, StoreResult, UploadGateway, UploadRequest, UploadResult, extension_for_mime,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[derive(Default)]
struct StoreState {
    records: Vec<ProductRecord>,
    reads: usize,
    writes: Vec<(String, String)>,
    fail_listing: bool,
    fail_fetch: HashSet<String>,
    fail_update: HashSet<String>,
}

/// Record store backed by a vector, with scripted failures.
///
/// Listings return every record, including those without an image, so suites exercise
/// the driver's skip-absent branch rather than relying on the store-side filter.
#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<StoreState>,
}

impl MemoryStore {
    /// Store seeded with the given records, in order.
    #[must_use]
    pub fn new(records: Vec<ProductRecord>) -> Self {
        Self {
            state: Mutex::new(StoreState {
                records,
                ..StoreState::default()
            }),
        }
    }

    /// Make every listing call fail.
    #[must_use]
    pub fn failing_listing(self) -> Self {
        lock(&self.state).fail_listing = true;
        self
    }

    /// Make fetching the given record fail.
    #[must_use]
    pub fn failing_fetch(self, id: &str) -> Self {
        lock(&self.state).fail_fetch.insert(id.to_string());
        self
    }

    /// Make updating the given record fail.
    #[must_use]
    pub fn failing_update(self, id: &str) -> Self {
        lock(&self.state).fail_update.insert(id.to_string());
        self
    }

    /// Remove a record, as if it were deleted by another process.
    pub fn remove(&self, id: &str) {
        lock(&self.state).records.retain(|record| record.id != id);
    }

    /// Current copy of a record.
    #[must_use]
    pub fn record(&self, id: &str) -> Option<ProductRecord> {
        lock(&self.state)
            .records
            .iter()
            .find(|record| record.id == id)
            .cloned()
    }

    /// Number of read calls (listings and fetches) served so far.
    #[must_use]
    pub fn reads(&self) -> usize {
        lock(&self.state).reads
    }

    /// Successful `(id, url)` writes in call order.
    #[must_use]
    pub fn writes(&self) -> Vec<(String, String)> {
        lock(&self.state).writes.clone()
    }
}

fn scripted_failure(operation: &'static str, id: &str) -> StoreError {
    StoreError::Status {
        operation,
        status: 500,
        message: format!("scripted failure for record {id}"),
    }
}

#[async_trait]
impl RecordSource for MemoryStore {
    async fn list_candidates(&self, limit: Option<usize>) -> StoreResult<Vec<ProductRecord>> {
        let mut state = lock(&self.state);
        state.reads += 1;
        if state.fail_listing {
            return Err(StoreError::Transport {
                operation: "memory.list_candidates",
                source: Box::new(io::Error::other("store unreachable")),
            });
        }
        Ok(state
            .records
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .cloned()
            .collect())
    }

    async fn list_candidate_ids(&self, limit: Option<usize>) -> StoreResult<Vec<String>> {
        let mut state = lock(&self.state);
        state.reads += 1;
        if state.fail_listing {
            return Err(StoreError::Transport {
                operation: "memory.list_candidate_ids",
                source: Box::new(io::Error::other("store unreachable")),
            });
        }
        Ok(state
            .records
            .iter()
            .take(limit.unwrap_or(usize::MAX))
            .map(|record| record.id.clone())
            .collect())
    }

    async fn fetch_record(&self, id: &str) -> StoreResult<Option<ProductRecord>> {
        let mut state = lock(&self.state);
        state.reads += 1;
        if state.fail_fetch.contains(id) {
            return Err(scripted_failure("memory.fetch_record", id));
        }
        Ok(state.records.iter().find(|record| record.id == id).cloned())
    }

    async fn update_image(&self, id: &str, url: &str) -> StoreResult<()> {
        let mut state = lock(&self.state);
        if state.fail_update.contains(id) {
            return Err(scripted_failure("memory.update_image", id));
        }
        let record = state
            .records
            .iter_mut()
            .find(|record| record.id == id)
            .ok_or_else(|| StoreError::NoMatch {
                operation: "memory.update_image",
                id: id.to_string(),
            })?;
        record.image = Some(url.to_string());
        state.writes.push((id.to_string(), url.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct GatewayState {
    uploads: Vec<UploadRequest>,
    rejected: HashSet<String>,
}

/// Upload gateway that records requests and answers with Cloudinary-shaped URLs.
pub struct ScriptedGateway {
    cloud_name: String,
    state: Mutex<GatewayState>,
}

impl ScriptedGateway {
    /// Gateway producing URLs under `res.cloudinary.com/<cloud_name>`.
    #[must_use]
    pub fn new(cloud_name: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            state: Mutex::new(GatewayState::default()),
        }
    }

    /// Reject uploads for the given public id with an embedded error.
    #[must_use]
    pub fn rejecting(self, public_id: &str) -> Self {
        lock(&self.state).rejected.insert(public_id.to_string());
        self
    }

    /// Requests received so far, including rejected ones.
    #[must_use]
    pub fn uploads(&self) -> Vec<UploadRequest> {
        lock(&self.state).uploads.clone()
    }

    /// Number of upload calls received so far.
    #[must_use]
    pub fn upload_count(&self) -> usize {
        lock(&self.state).uploads.len()
    }
}

impl Default for ScriptedGateway {
    fn default() -> Self {
        Self::new("demo")
    }
}

#[async_trait]
impl UploadGateway for ScriptedGateway {
    async fn upload(&self, request: UploadRequest) -> GatewayResult<UploadResult> {
        let mut state = lock(&self.state);
        state.uploads.push(request.clone());
        if state.rejected.contains(&request.public_id) {
            return Err(GatewayError::Rejected {
                status: 400,
                message: "Invalid image file".to_string(),
            });
        }

        let format = extension_for_mime(&request.mime).to_string();
        let public_id = format!("{}/{}", request.folder, request.public_id);
        Ok(UploadResult {
            url: format!(
                "https://res.cloudinary.com/{}/image/upload/v1/{public_id}.{format}",
                self.cloud_name
            ),
            public_id,
            format,
            width: 1,
            height: 1,
            bytes: u64::try_from(request.bytes.len()).unwrap_or(u64::MAX),
        })
    }
}

/// Event captured by [`RecordingProgress`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProgressEvent {
    /// A batch started.
    Batch {
        /// Zero-based batch index.
        index: usize,
        /// Number of records in the batch.
        size: usize,
    },
    /// A record finished.
    Record {
        /// Record identifier.
        id: String,
        /// Terminal outcome.
        outcome: RecordOutcome,
    },
}

/// Progress sink that keeps every notification in order.
#[derive(Default)]
pub struct RecordingProgress {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingProgress {
    /// Events received so far.
    #[must_use]
    pub fn events(&self) -> Vec<ProgressEvent> {
        lock(&self.events).clone()
    }

    /// Record ids in the order they finished.
    #[must_use]
    pub fn record_order(&self) -> Vec<String> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Record { id, .. } => Some(id.clone()),
                ProgressEvent::Batch { .. } => None,
            })
            .collect()
    }

    /// Sizes of the batches in the order they started.
    #[must_use]
    pub fn batch_sizes(&self) -> Vec<usize> {
        lock(&self.events)
            .iter()
            .filter_map(|event| match event {
                ProgressEvent::Batch { size, .. } => Some(*size),
                ProgressEvent::Record { .. } => None,
            })
            .collect()
    }
}

impl ProgressSink for RecordingProgress {
    fn batch_started(&self, index: usize, _batch_count: usize, size: usize) {
        lock(&self.events).push(ProgressEvent::Batch { index, size });
    }

    fn record_finished(&self, record_id: &str, _name: &str, outcome: &RecordOutcome) {
        lock(&self.events).push(ProgressEvent::Record {
            id: record_id.to_string(),
            outcome: outcome.clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{mixed_catalog, product};

    #[tokio::test]
    async fn memory_store_lists_in_order_and_counts_reads() -> StoreResult<()> {
        let store = MemoryStore::new(mixed_catalog());
        let listed = store.list_candidates(None).await?;
        assert_eq!(listed.len(), 3);
        let ids = store.list_candidate_ids(Some(2)).await?;
        assert_eq!(ids, ["1", "2"]);
        assert_eq!(store.reads(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn memory_store_applies_updates() -> StoreResult<()> {
        let store = MemoryStore::new(vec![product("9", Some("data:x"))]);
        store.update_image("9", "https://cdn/9.png").await?;
        assert_eq!(
            store.record("9").and_then(|record| record.image).as_deref(),
            Some("https://cdn/9.png")
        );
        assert_eq!(store.writes().len(), 1);
        assert!(store.update_image("missing", "u").await.is_err());
        Ok(())
    }

    #[tokio::test]
    async fn scripted_gateway_rejects_configured_ids() {
        let gateway = ScriptedGateway::default().rejecting("product-2");
        let request = |public_id: &str| UploadRequest {
            bytes: vec![1, 2, 3],
            mime: "image/png".into(),
            folder: "products".into(),
            public_id: public_id.into(),
        };
        let ok = gateway.upload(request("product-1")).await;
        assert!(
            ok.is_ok_and(|result| result.url
                == "https://res.cloudinary.com/demo/image/upload/v1/products/product-1.png")
        );
        let err = gateway.upload(request("product-2")).await;
        assert!(matches!(err, Err(GatewayError::Rejected { status: 400, .. })));
        assert_eq!(gateway.upload_count(), 2);
    }
}
