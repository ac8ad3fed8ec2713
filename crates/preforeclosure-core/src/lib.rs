//! Pre-foreclosure admin view logic
//!
//! Target-independent core of the admin view: the record model, client-side
//! filtering, spreadsheet upload orchestration and the status/notes edit
//! flow. All state transitions are plain functions over owned values so they
//! can be tested without a browser; the backend is reached only through the
//! [`RecordService`] trait.

pub mod config;
pub mod edit;
pub mod error;
pub mod filter;
pub mod headers;
pub mod model;
pub mod notify;
pub mod service;
pub mod store;
pub mod upload;

pub use config::AdminConfig;
pub use edit::{status_patch, DraftField, NotesDraft, NotesEditor};
pub use error::{AdminError, EditError, ServiceError, UploadRejection};
pub use filter::{filter_records, FilterAction, FilterCriteria, FilterOptions, RecordStats};
pub use headers::{Column, HeaderReport};
pub use model::{
    InternalStatus, Record, RecordPatch, RecordType, UploadOutcome, UploadStatsResponse,
    UploadSummary,
};
pub use notify::{Notification, NotificationLevel};
pub use service::RecordService;
pub use store::{LoadState, RecordStore};
pub use upload::{upload_file, FileCandidate, UploadFlow, UploadPolicy};
