//! Batch migration driver.
//!
//! # Design
//! - One driver serves both listing strategies; `FetchStrategy` picks how candidates are
//!   loaded and supplies the pacing defaults for that strategy.
//! - Records are processed strictly in listing order, one at a time. Batches only bound
//!   pacing; they never run in parallel.
//! - Per-record failures become tally entries. Only a listing failure aborts the run.

use std::borrow::Cow;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::classify::{Decision, classify};
use crate::decode::decode;
use crate::error::{MigrationError, MigrationResult, RecordError, error_chain};
use crate::model::{
    BatchOutcome, ProductRecord, RecordOutcome, RunResult, ScanReport, SkipReason, UploadRequest,
};
use crate::service::{ProgressSink, RecordSource, UploadGateway};

/// Default CDN folder receiving migrated images.
pub const DEFAULT_FOLDER: &str = "products";
/// Default prefix of the stable public id (`<prefix>-<record id>`).
pub const DEFAULT_PUBLIC_ID_PREFIX: &str = "product";
/// Default substring identifying URLs already hosted on the target CDN.
pub const DEFAULT_TARGET_MARKER: &str = "res.cloudinary.com";

/// How candidate records are listed and loaded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchStrategy {
    /// Load every candidate row up front and process it in chunks.
    #[default]
    Bulk,
    /// List candidate ids only, then re-read each record right before processing it.
    ById,
}

impl FetchStrategy {
    /// Stable string form used in logs and configuration.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bulk => "bulk",
            Self::ById => "by-id",
        }
    }

    /// Records per batch. By-id batches are smaller because each record carries a full
    /// inline payload.
    #[must_use]
    pub const fn default_batch_size(self) -> usize {
        match self {
            Self::Bulk => 10,
            Self::ById => 5,
        }
    }

    /// Pause between consecutive batches.
    #[must_use]
    pub const fn default_batch_delay(self) -> Duration {
        match self {
            Self::Bulk => Duration::from_secs(2),
            Self::ById => Duration::from_secs(3),
        }
    }

    /// Pause after each migrated record.
    #[must_use]
    pub const fn default_record_delay(self) -> Duration {
        match self {
            Self::Bulk => Duration::ZERO,
            Self::ById => Duration::from_millis(500),
        }
    }

    /// Maximum number of candidates listed per run.
    #[must_use]
    pub const fn default_candidate_cap(self) -> Option<usize> {
        match self {
            Self::Bulk => None,
            Self::ById => Some(100),
        }
    }
}

/// Phases of a run, reported in structured logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverPhase {
    /// Enumerating candidate records.
    Listing,
    /// Re-reading a record by id.
    Fetching,
    /// Deciding what to do with a record.
    Classifying,
    /// Decoding and uploading an inline payload.
    Migrating,
    /// Writing the new URL back to the store.
    Writing,
    /// Waiting between batches.
    Pausing,
    /// Run finished.
    Done,
}

impl DriverPhase {
    /// Stable string form used as a log field.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Listing => "listing",
            Self::Fetching => "fetching",
            Self::Classifying => "classifying",
            Self::Migrating => "migrating",
            Self::Writing => "writing",
            Self::Pausing => "pausing",
            Self::Done => "done",
        }
    }
}

/// Tunables for a migration run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DriverSettings {
    /// Listing strategy.
    pub strategy: FetchStrategy,
    /// Records per batch; values below one are treated as one.
    pub batch_size: usize,
    /// Pause between batches.
    pub batch_delay: Duration,
    /// Pause after each migrated record.
    pub record_delay: Duration,
    /// Maximum number of candidates listed; `None` lists everything.
    pub candidate_cap: Option<usize>,
    /// Destination folder on the CDN.
    pub folder: String,
    /// Prefix of the stable public id.
    pub public_id_prefix: String,
    /// Substring identifying already-migrated URLs.
    pub target_marker: String,
    /// Classify and decode only; never upload or write back.
    pub dry_run: bool,
}

impl DriverSettings {
    /// Settings carrying the defaults of the given strategy.
    #[must_use]
    pub fn for_strategy(strategy: FetchStrategy) -> Self {
        Self {
            strategy,
            batch_size: strategy.default_batch_size(),
            batch_delay: strategy.default_batch_delay(),
            record_delay: strategy.default_record_delay(),
            candidate_cap: strategy.default_candidate_cap(),
            folder: DEFAULT_FOLDER.to_string(),
            public_id_prefix: DEFAULT_PUBLIC_ID_PREFIX.to_string(),
            target_marker: DEFAULT_TARGET_MARKER.to_string(),
            dry_run: false,
        }
    }

    /// Stable public id for a record.
    #[must_use]
    pub fn public_id_for(&self, record_id: &str) -> String {
        format!("{}-{record_id}", self.public_id_prefix)
    }
}

impl Default for DriverSettings {
    fn default() -> Self {
        Self::for_strategy(FetchStrategy::default())
    }
}

enum Candidate {
    Loaded(ProductRecord),
    Pending(String),
}

impl Candidate {
    fn id(&self) -> &str {
        match self {
            Self::Loaded(record) => &record.id,
            Self::Pending(id) => id,
        }
    }
}

struct Listing {
    candidates: Vec<Candidate>,
    capped: bool,
}

/// Orchestrates classification, decoding, upload and write-back over all candidates.
pub struct MigrationDriver {
    source: Arc<dyn RecordSource>,
    gateway: Arc<dyn UploadGateway>,
    settings: DriverSettings,
    progress: Option<Arc<dyn ProgressSink>>,
}

impl MigrationDriver {
    /// Build a driver over the given collaborators.
    #[must_use]
    pub fn new(
        source: Arc<dyn RecordSource>,
        gateway: Arc<dyn UploadGateway>,
        settings: DriverSettings,
    ) -> Self {
        Self {
            source,
            gateway,
            settings,
            progress: None,
        }
    }

    /// Attach a progress observer.
    #[must_use]
    pub fn with_progress(mut self, progress: Arc<dyn ProgressSink>) -> Self {
        self.progress = Some(progress);
        self
    }

    /// Settings in effect for this driver.
    #[must_use]
    pub const fn settings(&self) -> &DriverSettings {
        &self.settings
    }

    /// Migrate every eligible candidate and return the run tally.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Listing`] when candidates cannot be enumerated. Failures
    /// of individual records are counted in the result instead.
    pub async fn run(&self) -> MigrationResult<RunResult> {
        let settings = &self.settings;
        let listing = self.list().await?;
        let mut result = RunResult {
            total: listing.candidates.len(),
            dry_run: settings.dry_run,
            more_may_remain: listing.capped,
            ..RunResult::default()
        };

        if listing.candidates.is_empty() {
            info!(
                phase = DriverPhase::Done.as_str(),
                "no candidate records found"
            );
            return Ok(result);
        }

        let batch_size = settings.batch_size.max(1);
        let batch_count = listing.candidates.len().div_ceil(batch_size);
        for (index, batch) in listing.candidates.chunks(batch_size).enumerate() {
            let outcome = self.process_batch(index, batch_count, batch).await;
            info!(
                batch = index + 1,
                batches = batch_count,
                migrated = outcome.migrated,
                skipped = outcome.skipped,
                errors = outcome.errors,
                "batch complete"
            );
            result.absorb(outcome);

            if index + 1 < batch_count && !settings.batch_delay.is_zero() {
                debug!(
                    phase = DriverPhase::Pausing.as_str(),
                    delay_ms = millis(settings.batch_delay),
                    "pausing before next batch"
                );
                sleep(settings.batch_delay).await;
            }
        }

        if listing.capped {
            warn!(
                cap = ?settings.candidate_cap,
                "candidate cap reached; more records may remain, re-run to continue"
            );
        }

        info!(
            phase = DriverPhase::Done.as_str(),
            total = result.total,
            migrated = result.migrated,
            skipped = result.skipped,
            errors = result.errors,
            dry_run = result.dry_run,
            "migration run complete"
        );
        Ok(result)
    }

    /// Classify every candidate without decoding, uploading or writing anything.
    ///
    /// # Errors
    ///
    /// Returns [`MigrationError::Listing`] when candidates cannot be enumerated.
    pub async fn scan(&self) -> MigrationResult<ScanReport> {
        let listing = self.list().await?;
        let mut report = ScanReport {
            total: listing.candidates.len(),
            more_may_remain: listing.capped,
            ..ScanReport::default()
        };

        for candidate in &listing.candidates {
            let record = match self.load(candidate).await {
                Ok(record) => record,
                Err(err) => {
                    warn!(record_id = %candidate.id(), error = %error_chain(&err), "record unreadable");
                    report.unreadable += 1;
                    continue;
                }
            };
            match classify(record.image.as_deref(), &self.settings.target_marker) {
                Decision::SkipAbsent => report.absent += 1,
                Decision::SkipAlreadyMigrated => report.already_migrated += 1,
                Decision::SkipNotInline => report.not_inline += 1,
                Decision::Migrate(_) => report.migratable += 1,
            }
        }

        info!(
            total = report.total,
            migratable = report.migratable,
            already_migrated = report.already_migrated,
            "scan complete"
        );
        Ok(report)
    }

    async fn list(&self) -> MigrationResult<Listing> {
        let settings = &self.settings;
        info!(
            phase = DriverPhase::Listing.as_str(),
            strategy = settings.strategy.as_str(),
            cap = ?settings.candidate_cap,
            dry_run = settings.dry_run,
            "listing candidate records"
        );

        let cap = settings.candidate_cap;
        let listed: Vec<Candidate> = match settings.strategy {
            FetchStrategy::Bulk => self
                .source
                .list_candidates(cap)
                .await
                .map_err(|source| MigrationError::Listing { source })?
                .into_iter()
                .map(Candidate::Loaded)
                .collect(),
            FetchStrategy::ById => self
                .source
                .list_candidate_ids(cap)
                .await
                .map_err(|source| MigrationError::Listing { source })?
                .into_iter()
                .map(Candidate::Pending)
                .collect(),
        };

        let listed_count = listed.len();
        let capped = cap.is_some_and(|cap| listed_count >= cap);

        let mut seen = HashSet::with_capacity(listed_count);
        let candidates: Vec<Candidate> = listed
            .into_iter()
            .filter(|candidate| seen.insert(candidate.id().to_string()))
            .collect();
        if candidates.len() < listed_count {
            warn!(
                duplicates = listed_count - candidates.len(),
                "dropping duplicate candidate ids"
            );
        }

        info!(candidates = candidates.len(), capped, "candidates listed");
        Ok(Listing { candidates, capped })
    }

    async fn load<'a>(
        &self,
        candidate: &'a Candidate,
    ) -> Result<Cow<'a, ProductRecord>, RecordError> {
        match candidate {
            Candidate::Loaded(record) => Ok(Cow::Borrowed(record)),
            Candidate::Pending(id) => {
                debug!(
                    phase = DriverPhase::Fetching.as_str(),
                    record_id = %id,
                    "fetching record"
                );
                self.source
                    .fetch_record(id)
                    .await
                    .map_err(|source| RecordError::Fetch { source })?
                    .map(Cow::Owned)
                    .ok_or(RecordError::Missing)
            }
        }
    }

    async fn process_batch(
        &self,
        index: usize,
        batch_count: usize,
        batch: &[Candidate],
    ) -> BatchOutcome {
        info!(
            batch = index + 1,
            batches = batch_count,
            size = batch.len(),
            "processing batch"
        );
        if let Some(progress) = &self.progress {
            progress.batch_started(index, batch_count, batch.len());
        }

        let mut outcome = BatchOutcome::default();
        for candidate in batch {
            let (name, record_outcome) = self.process_record(candidate).await;
            outcome.record(candidate.id(), &name, &record_outcome);
            if let Some(progress) = &self.progress {
                progress.record_finished(candidate.id(), &name, &record_outcome);
            }
        }
        outcome
    }

    async fn process_record(&self, candidate: &Candidate) -> (String, RecordOutcome) {
        let record = match self.load(candidate).await {
            Ok(record) => record,
            Err(err) => return (String::new(), failure(candidate.id(), &err)),
        };

        let decision = classify(record.image.as_deref(), &self.settings.target_marker);
        debug!(
            phase = DriverPhase::Classifying.as_str(),
            record_id = %record.id,
            decision = decision_label(decision),
            "record classified"
        );

        let outcome = match decision {
            Decision::SkipAbsent => RecordOutcome::Skipped(SkipReason::Absent),
            Decision::SkipAlreadyMigrated => RecordOutcome::Skipped(SkipReason::AlreadyMigrated),
            Decision::SkipNotInline => RecordOutcome::Skipped(SkipReason::NotInline),
            Decision::Migrate(payload) => match self.migrate(&record, payload).await {
                Ok(url) => {
                    let uploaded = url.is_some();
                    info!(
                        record_id = %record.id,
                        name = %record.name,
                        url = url.as_deref().unwrap_or("-"),
                        dry_run = !uploaded,
                        "record migrated"
                    );
                    if uploaded && !self.settings.record_delay.is_zero() {
                        sleep(self.settings.record_delay).await;
                    }
                    RecordOutcome::Migrated { url }
                }
                Err(err) => failure(&record.id, &err),
            },
        };

        (record.name.clone(), outcome)
    }

    async fn migrate(
        &self,
        record: &ProductRecord,
        payload: &str,
    ) -> Result<Option<String>, RecordError> {
        let image = decode(payload).map_err(|source| RecordError::Decode { source })?;
        let public_id = self.settings.public_id_for(&record.id);

        if self.settings.dry_run {
            info!(
                record_id = %record.id,
                public_id = %public_id,
                mime = %image.mime,
                bytes = image.bytes.len(),
                "dry run; upload skipped"
            );
            return Ok(None);
        }

        debug!(
            phase = DriverPhase::Migrating.as_str(),
            record_id = %record.id,
            public_id = %public_id,
            bytes = image.bytes.len(),
            "uploading image"
        );
        let uploaded = self
            .gateway
            .upload(UploadRequest {
                bytes: image.bytes,
                mime: image.mime,
                folder: self.settings.folder.clone(),
                public_id,
            })
            .await
            .map_err(|source| RecordError::Gateway { source })?;

        debug!(
            phase = DriverPhase::Writing.as_str(),
            record_id = %record.id,
            url = %uploaded.url,
            "writing url back"
        );
        self.source
            .update_image(&record.id, &uploaded.url)
            .await
            .map_err(|source| RecordError::WriteBack {
                public_id: uploaded.public_id.clone(),
                source,
            })?;

        Ok(Some(uploaded.url))
    }
}

fn failure(record_id: &str, err: &RecordError) -> RecordOutcome {
    let message = error_chain(err);
    let stage = err.stage();
    warn!(
        record_id = %record_id,
        stage = stage.as_str(),
        error = %message,
        "record migration failed"
    );
    RecordOutcome::Failed { stage, message }
}

const fn decision_label(decision: Decision<'_>) -> &'static str {
    match decision {
        Decision::SkipAbsent => "skip_absent",
        Decision::SkipAlreadyMigrated => "skip_already_migrated",
        Decision::SkipNotInline => "skip_not_inline",
        Decision::Migrate(_) => "migrate",
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
