//! Cached record collection
//!
//! The cache is read-mostly: it is replaced wholesale on load and mutated
//! locally only to reflect a pending edit, which is rolled back if the
//! backend refuses it.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{EditError, ServiceError};
use crate::filter::{filter_records, FilterCriteria, FilterOptions, RecordStats};
use crate::model::{Record, RecordPatch};
use crate::notify::Notification;

/// Status of the initial/refresh fetch
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum LoadState {
    Loading,
    Loaded,
    Failed { message: String },
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    records: Vec<Record>,
    state: LoadState,
}

impl Default for RecordStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordStore {
    /// A store waiting for its first fetch
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            state: LoadState::Loading,
        }
    }

    pub fn with_records(records: Vec<Record>) -> Self {
        Self {
            records,
            state: LoadState::Loaded,
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn begin_loading(&mut self) {
        self.state = LoadState::Loading;
    }

    /// Settle a fetch. Records from a previous load are kept on failure.
    pub fn finish_loading(
        &mut self,
        result: Result<Vec<Record>, ServiceError>,
    ) -> Option<Notification> {
        match result {
            Ok(records) => {
                debug!(count = records.len(), "Records loaded");
                self.records = records;
                self.state = LoadState::Loaded;
                None
            }
            Err(err) => {
                warn!(error = %err, "Record fetch failed");
                self.state = LoadState::Failed {
                    message: err.user_message(),
                };
                Some(Notification::from(&err))
            }
        }
    }

    pub fn get(&self, document_number: &str) -> Option<&Record> {
        self.records
            .iter()
            .find(|r| r.document_number == document_number)
    }

    /// Reflect a pending edit locally; returns the record as it was
    pub fn apply_patch(&mut self, patch: &RecordPatch) -> Result<Record, EditError> {
        let record = self
            .records
            .iter_mut()
            .find(|r| r.document_number == patch.document_number)
            .ok_or_else(|| EditError::UnknownRecord(patch.document_number.clone()))?;
        let previous = record.clone();
        patch.apply_to(record);
        debug!(document = %patch.document_number, "Applied optimistic patch");
        Ok(previous)
    }

    /// Undo an optimistic patch after the backend refused it
    ///
    /// Only the fields the patch touched are restored, so edits to other
    /// fields saved in the meantime survive.
    pub fn rollback(&mut self, patch: &RecordPatch, previous: &Record) {
        debug!(document = %patch.document_number, "Rolling back patch");
        match self
            .records
            .iter_mut()
            .find(|r| r.document_number == patch.document_number)
        {
            Some(record) => patch.revert_on(record, previous),
            None => self.records.push(previous.clone()),
        }
    }

    /// Store the backend's copy of a record, keyed by document number
    pub fn replace(&mut self, record: Record) {
        match self
            .records
            .iter_mut()
            .find(|r| r.document_number == record.document_number)
        {
            Some(existing) => *existing = record,
            None => self.records.push(record),
        }
    }

    /// Records to display under the given criteria
    pub fn visible(&self, criteria: &FilterCriteria, today: NaiveDate) -> Vec<&Record> {
        filter_records(&self.records, criteria, today)
    }

    pub fn options(&self) -> FilterOptions {
        FilterOptions::from_records(&self.records)
    }

    pub fn stats(&self, today: NaiveDate) -> RecordStats {
        RecordStats::from_records(&self.records, today)
    }
}
