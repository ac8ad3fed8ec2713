//! Record model shared by the filter engine, the edit flow and the backend seam
//!
//! Field names follow the backend's camelCase JSON. Dates are held as
//! `NaiveDate`; the backend may send either `YYYY-MM-DD` or a full ISO-8601
//! timestamp, and anything unparsable is treated as absent.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Date format used on the wire and in `<input type="date">`
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Kind of filing a record tracks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RecordType {
    Mortgage,
    Tax,
}

impl RecordType {
    pub const ALL: [RecordType; 2] = [RecordType::Mortgage, RecordType::Tax];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordType::Mortgage => "Mortgage",
            RecordType::Tax => "Tax",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "Mortgage" => Ok(RecordType::Mortgage),
            "Tax" => Ok(RecordType::Tax),
            other => Err(format!("Unknown record type: {}", other)),
        }
    }
}

/// Workflow stage assigned by a user
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum InternalStatus {
    #[default]
    New,
    #[serde(rename = "Contact Attempted")]
    ContactAttempted,
    Monitoring,
    Dead,
}

impl InternalStatus {
    pub const ALL: [InternalStatus; 4] = [
        InternalStatus::New,
        InternalStatus::ContactAttempted,
        InternalStatus::Monitoring,
        InternalStatus::Dead,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InternalStatus::New => "New",
            InternalStatus::ContactAttempted => "Contact Attempted",
            InternalStatus::Monitoring => "Monitoring",
            InternalStatus::Dead => "Dead",
        }
    }
}

impl fmt::Display for InternalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InternalStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        InternalStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == trimmed)
            .ok_or_else(|| format!("Unknown status: {}", trimmed))
    }
}

/// A tracked pre-foreclosure filing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub document_number: String,
    #[serde(rename = "type")]
    pub record_type: RecordType,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub address: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub city: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub zip: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub filing_month: Option<String>,
    #[serde(default)]
    pub inactive: bool,
    #[serde(default)]
    pub internal_status: InternalStatus,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub last_action_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "lenient_date")]
    pub next_follow_up_date: Option<NaiveDate>,
}

impl Record {
    /// Whether the follow-up date has arrived (on or before `today`)
    pub fn follow_up_due(&self, today: NaiveDate) -> bool {
        self.next_follow_up_date
            .map(|date| date <= today)
            .unwrap_or(false)
    }
}

/// Partial update keyed by document number
///
/// `None` leaves a field untouched and is omitted from the JSON body.
/// `Some(None)` clears the field and is sent as `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordPatch {
    pub document_number: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub internal_status: Option<InternalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_action_date: Option<Option<NaiveDate>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_follow_up_date: Option<Option<NaiveDate>>,
}

impl RecordPatch {
    pub fn new(document_number: impl Into<String>) -> Self {
        Self {
            document_number: document_number.into(),
            ..Self::default()
        }
    }

    /// Apply the patch to a local copy of the record
    pub fn apply_to(&self, record: &mut Record) {
        if let Some(status) = self.internal_status {
            record.internal_status = status;
        }
        if let Some(notes) = &self.notes {
            record.notes = notes.clone();
        }
        if let Some(date) = self.last_action_date {
            record.last_action_date = date;
        }
        if let Some(date) = self.next_follow_up_date {
            record.next_follow_up_date = date;
        }
    }

    /// Put back the fields this patch touched, taking them from `previous`
    pub fn revert_on(&self, record: &mut Record, previous: &Record) {
        if self.internal_status.is_some() {
            record.internal_status = previous.internal_status;
        }
        if self.notes.is_some() {
            record.notes = previous.notes.clone();
        }
        if self.last_action_date.is_some() {
            record.last_action_date = previous.last_action_date;
        }
        if self.next_follow_up_date.is_some() {
            record.next_follow_up_date = previous.next_follow_up_date;
        }
    }

    pub fn is_empty(&self) -> bool {
        self.internal_status.is_none()
            && self.notes.is_none()
            && self.last_action_date.is_none()
            && self.next_follow_up_date.is_none()
    }
}

/// Counts returned by the backend after processing an upload
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadOutcome {
    pub records_processed: u64,
    pub total_records: u64,
    pub active_records: u64,
    pub inactive_records: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub new_records: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_records: Option<u64>,
}

/// Summary of the most recent upload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSummary {
    pub filename: String,
    pub uploaded_at: Option<DateTime<Utc>>,
    pub new_records: u64,
    pub updated_records: u64,
    pub inactive_records: u64,
    pub active_records: u64,
}

/// Raw latest-upload stats as the backend sends them
///
/// The backend answers `{ "hasData": false }` before the first upload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UploadStatsResponse {
    pub has_data: bool,
    pub filename: Option<String>,
    pub uploaded_at: Option<String>,
    pub new_records: Option<u64>,
    pub updated_records: Option<u64>,
    pub inactive_records: Option<u64>,
    pub active_records: Option<u64>,
}

impl UploadStatsResponse {
    pub fn into_summary(self) -> Option<UploadSummary> {
        if !self.has_data {
            return None;
        }
        Some(UploadSummary {
            filename: self.filename.unwrap_or_default(),
            uploaded_at: self
                .uploaded_at
                .as_deref()
                .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
                .map(|dt| dt.with_timezone(&Utc)),
            new_records: self.new_records.unwrap_or(0),
            updated_records: self.updated_records.unwrap_or(0),
            inactive_records: self.inactive_records.unwrap_or(0),
            active_records: self.active_records.unwrap_or(0),
        })
    }
}

/// Parse a backend date: `YYYY-MM-DD`, optionally followed by a time part
pub fn parse_wire_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    let date_part = match trimmed.len() {
        10 => trimmed,
        n if n > 10 && matches!(trimmed.as_bytes()[10], b'T' | b' ') => &trimmed[..10],
        _ => return None,
    };
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

fn lenient_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_wire_date))
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.filter(|value| !value.trim().is_empty()))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.unwrap_or_default())
}
