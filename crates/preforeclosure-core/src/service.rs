//! Backend seam
//!
//! The admin view never owns durable state; everything goes through a
//! `RecordService`. The browser build implements it over `fetch`, tests use
//! an in-memory double.

use crate::error::ServiceError;
use crate::model::{Record, RecordPatch, UploadOutcome, UploadSummary};

/// Operations the remote data service exposes
///
/// Futures are awaited on a single-threaded event loop and are not required
/// to be `Send`.
#[allow(async_fn_in_trait)]
pub trait RecordService {
    /// Handle to the file being uploaded (a browser `File`, bytes in tests)
    type File;

    async fn list(&self) -> Result<Vec<Record>, ServiceError>;

    async fn update(&self, patch: &RecordPatch) -> Result<Record, ServiceError>;

    async fn upload(&self, file: &Self::File) -> Result<UploadOutcome, ServiceError>;

    async fn latest_upload_stats(&self) -> Result<Option<UploadSummary>, ServiceError>;
}
