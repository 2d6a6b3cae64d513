//! Record, upload and tally types shared across the workspace.

use serde::{Deserialize, Serialize};

use crate::classify::{INLINE_LENGTH_THRESHOLD, INLINE_PREFIX};
use crate::decode::split_data_uri;

/// Product row as read from the record store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRecord {
    /// Stable unique identifier.
    pub id: String,
    /// Display name, used only for logging.
    pub name: String,
    /// Raw image column: null, a URL, or an inline payload.
    pub image: Option<String>,
}

impl ProductRecord {
    /// Convenience constructor used by adapters and tests.
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, image: Option<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            image,
        }
    }
}

/// Typed view over a raw image column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageField<'a> {
    /// Null, empty, or whitespace only.
    Absent,
    /// URL pointing anywhere other than the target CDN.
    RemoteReference(&'a str),
    /// URL already hosted on the target CDN.
    TargetReference(&'a str),
    /// Inline-encoded image.
    InlinePayload {
        /// Media type carried by a `data:` prefix, when present.
        mime: Option<&'a str>,
        /// Base64 body (the whole value when no prefix is present).
        data: &'a str,
    },
}

impl<'a> ImageField<'a> {
    /// Interpret a raw image column against the target-CDN marker.
    ///
    /// Values longer than [`INLINE_LENGTH_THRESHOLD`] characters are treated as inline
    /// payloads even without the `data:` prefix; long signed URLs are a known false
    /// positive of this heuristic.
    #[must_use]
    pub fn parse(raw: Option<&'a str>, target_marker: &str) -> Self {
        let Some(value) = raw.filter(|value| !value.trim().is_empty()) else {
            return Self::Absent;
        };
        if !target_marker.is_empty() && value.contains(target_marker) {
            return Self::TargetReference(value);
        }
        if value.starts_with(INLINE_PREFIX) {
            return split_data_uri(value).map_or(
                Self::InlinePayload {
                    mime: None,
                    data: value,
                },
                |(mime, data)| Self::InlinePayload {
                    mime: Some(mime),
                    data,
                },
            );
        }
        if value.chars().count() > INLINE_LENGTH_THRESHOLD {
            return Self::InlinePayload {
                mime: None,
                data: value,
            };
        }
        Self::RemoteReference(value)
    }
}

/// Binary upload submitted to the gateway.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Decoded image bytes.
    pub bytes: Vec<u8>,
    /// MIME type of the image.
    pub mime: String,
    /// Destination folder on the CDN.
    pub folder: String,
    /// Stable public id; re-uploading with the same id overwrites the asset.
    pub public_id: String,
}

/// Metadata returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResult {
    /// Durable HTTPS delivery URL.
    pub url: String,
    /// Public id assigned by the gateway.
    pub public_id: String,
    /// Stored image format (e.g. `png`).
    pub format: String,
    /// Pixel width.
    pub width: u32,
    /// Pixel height.
    pub height: u32,
    /// Stored size in bytes.
    pub bytes: u64,
}

/// Stage of the per-record pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecordStage {
    /// Re-reading the record by id.
    Fetch,
    /// Decoding the inline payload.
    Decode,
    /// Uploading to the gateway.
    Upload,
    /// Writing the new URL back to the store.
    WriteBack,
}

impl RecordStage {
    /// Stable string form used in logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fetch => "fetch",
            Self::Decode => "decode",
            Self::Upload => "upload",
            Self::WriteBack => "write_back",
        }
    }
}

/// Why a record was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// No image value.
    Absent,
    /// Image already hosted on the target CDN.
    AlreadyMigrated,
    /// Image is an external URL, not an inline payload.
    NotInline,
}

impl SkipReason {
    /// Stable string form used in logs and summaries.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Absent => "no image",
            Self::AlreadyMigrated => "already migrated",
            Self::NotInline => "not an inline payload",
        }
    }
}

/// Terminal outcome of one record within a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// Uploaded and written back; `url` is `None` during a dry run.
    Migrated {
        /// New CDN URL when the upload actually happened.
        url: Option<String>,
    },
    /// Skipped without contacting the gateway.
    Skipped(SkipReason),
    /// Failed at the given stage.
    Failed {
        /// Stage that failed.
        stage: RecordStage,
        /// Human-readable failure description.
        message: String,
    },
}

/// Per-record failure entry listed at the end of a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    /// Identifier of the failed record.
    pub record_id: String,
    /// Display name of the failed record.
    pub name: String,
    /// Human-readable failure description.
    pub message: String,
    /// Stage that failed.
    pub stage: RecordStage,
}

/// Tally accumulated while processing one batch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    /// Records migrated in this batch.
    pub migrated: usize,
    /// Records skipped in this batch.
    pub skipped: usize,
    /// Records that failed in this batch.
    pub errors: usize,
    /// Failure entries in processing order.
    pub error_details: Vec<ErrorDetail>,
}

impl BatchOutcome {
    /// Fold a single record outcome into the tally.
    pub fn record(&mut self, record_id: &str, name: &str, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Migrated { .. } => self.migrated += 1,
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed { stage, message } => {
                self.errors += 1;
                self.error_details.push(ErrorDetail {
                    record_id: record_id.to_string(),
                    name: name.to_string(),
                    message: message.clone(),
                    stage: *stage,
                });
            }
        }
    }

    /// Number of records accounted for in this batch.
    #[must_use]
    pub const fn processed(&self) -> usize {
        self.migrated + self.skipped + self.errors
    }
}

/// Final tally of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResult {
    /// Candidate records considered.
    pub total: usize,
    /// Records migrated (or that would be, during a dry run).
    pub migrated: usize,
    /// Records skipped.
    pub skipped: usize,
    /// Records that failed.
    pub errors: usize,
    /// Batches processed.
    pub batches: usize,
    /// Listing hit the candidate cap; another run may find more records.
    pub more_may_remain: bool,
    /// No uploads or writes were performed.
    pub dry_run: bool,
    /// Failure entries in processing order.
    pub error_details: Vec<ErrorDetail>,
}

impl RunResult {
    /// Sum a finished batch into the run tally.
    pub fn absorb(&mut self, batch: BatchOutcome) {
        self.migrated += batch.migrated;
        self.skipped += batch.skipped;
        self.errors += batch.errors;
        self.batches += 1;
        self.error_details.extend(batch.error_details);
    }
}

/// Classification counts produced by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanReport {
    /// Candidate records considered.
    pub total: usize,
    /// Records without an image.
    pub absent: usize,
    /// Records already on the target CDN.
    pub already_migrated: usize,
    /// Records pointing at other URLs.
    pub not_inline: usize,
    /// Records that would be migrated.
    pub migratable: usize,
    /// Records that could not be re-read (by-id listing only).
    pub unreadable: usize,
    /// Listing hit the candidate cap.
    pub more_may_remain: bool,
}
