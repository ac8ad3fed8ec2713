//! Status changes and the notes dialog
//!
//! A status change is a one-field patch sent right away. The notes dialog
//! stages its three fields as raw input text and only turns them into a
//! patch on save; cancel simply drops the draft.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::EditError;
use crate::model::{InternalStatus, Record, RecordPatch, DATE_FORMAT};

/// Patch for an inline status change
pub fn status_patch(document_number: &str, status: InternalStatus) -> RecordPatch {
    RecordPatch {
        internal_status: Some(status),
        ..RecordPatch::new(document_number)
    }
}

/// Field of the notes dialog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DraftField {
    LastActionDate,
    NextFollowUpDate,
    Notes,
}

impl DraftField {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "lastActionDate" => Some(DraftField::LastActionDate),
            "nextFollowUpDate" => Some(DraftField::NextFollowUpDate),
            "notes" => Some(DraftField::Notes),
            _ => None,
        }
    }
}

/// Staged copy of the editable fields, as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesDraft {
    pub document_number: String,
    pub last_action_date: String,
    pub next_follow_up_date: String,
    pub notes: String,
}

impl NotesDraft {
    pub fn from_record(record: &Record) -> Self {
        let format = |date: Option<NaiveDate>| {
            date.map(|d| d.format(DATE_FORMAT).to_string())
                .unwrap_or_default()
        };
        Self {
            document_number: record.document_number.clone(),
            last_action_date: format(record.last_action_date),
            next_follow_up_date: format(record.next_follow_up_date),
            notes: record.notes.clone().unwrap_or_default(),
        }
    }

    pub fn with_field(mut self, field: DraftField, value: impl Into<String>) -> Self {
        let value = value.into();
        match field {
            DraftField::LastActionDate => self.last_action_date = value,
            DraftField::NextFollowUpDate => self.next_follow_up_date = value,
            DraftField::Notes => self.notes = value,
        }
        self
    }

    /// Turn the draft into a single patch carrying all three fields
    ///
    /// Empty inputs become explicit clears, never empty strings.
    pub fn commit(&self) -> Result<RecordPatch, EditError> {
        Ok(RecordPatch {
            last_action_date: Some(parse_input_date(
                "lastActionDate",
                &self.last_action_date,
            )?),
            next_follow_up_date: Some(parse_input_date(
                "nextFollowUpDate",
                &self.next_follow_up_date,
            )?),
            notes: Some(Some(self.notes.trim().to_string()).filter(|n| !n.is_empty())),
            ..RecordPatch::new(self.document_number.clone())
        })
    }
}

fn parse_input_date(field: &'static str, raw: &str) -> Result<Option<NaiveDate>, EditError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
        .map(Some)
        .map_err(|_| EditError::InvalidDate {
            field,
            value: trimmed.to_string(),
        })
}

/// Notes dialog state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "state", content = "draft", rename_all = "camelCase")]
pub enum NotesEditor {
    #[default]
    Closed,
    Open(NotesDraft),
}

impl NotesEditor {
    pub fn open(record: &Record) -> Self {
        NotesEditor::Open(NotesDraft::from_record(record))
    }

    /// Edit a staged field; editing a closed dialog is a no-op
    pub fn edit(&self, field: DraftField, value: impl Into<String>) -> Self {
        match self {
            NotesEditor::Open(draft) => NotesEditor::Open(draft.clone().with_field(field, value)),
            NotesEditor::Closed => NotesEditor::Closed,
        }
    }

    /// Discard the staged copy without touching the backend
    pub fn cancel(&self) -> Self {
        NotesEditor::Closed
    }

    pub fn draft(&self) -> Option<&NotesDraft> {
        match self {
            NotesEditor::Open(draft) => Some(draft),
            NotesEditor::Closed => None,
        }
    }

    /// Patch to send on save
    pub fn save(&self) -> Result<RecordPatch, EditError> {
        self.draft().ok_or(EditError::NoDraft)?.commit()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecordType;
    use pretty_assertions::assert_eq;

    fn record() -> Record {
        Record {
            document_number: "2024-0099".to_string(),
            record_type: RecordType::Tax,
            address: "1 Elm".to_string(),
            city: "Reno".to_string(),
            zip: "89501".to_string(),
            filing_month: None,
            inactive: false,
            internal_status: InternalStatus::New,
            notes: Some("left voicemail".to_string()),
            last_action_date: NaiveDate::from_ymd_opt(2024, 4, 2),
            next_follow_up_date: None,
        }
    }

    #[test]
    fn test_status_patch_only_carries_status() {
        let patch = status_patch("2024-0099", InternalStatus::Monitoring);
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"documentNumber": "2024-0099", "internalStatus": "Monitoring"})
        );
    }

    #[test]
    fn test_draft_prefills_from_record() {
        let draft = NotesDraft::from_record(&record());
        assert_eq!(draft.last_action_date, "2024-04-02");
        assert_eq!(draft.next_follow_up_date, "");
        assert_eq!(draft.notes, "left voicemail");
    }

    #[test]
    fn test_empty_dates_commit_as_null() {
        let editor = NotesEditor::open(&record())
            .edit(DraftField::LastActionDate, "")
            .edit(DraftField::NextFollowUpDate, "  ");
        let patch = editor.save().unwrap();
        let value = serde_json::to_value(&patch).unwrap();
        assert_eq!(value["lastActionDate"], serde_json::Value::Null);
        assert_eq!(value["nextFollowUpDate"], serde_json::Value::Null);
        assert_eq!(value["notes"], "left voicemail");
    }

    #[test]
    fn test_commit_parses_dates_and_trims_notes() {
        let editor = NotesEditor::open(&record())
            .edit(DraftField::NextFollowUpDate, "2024-06-10")
            .edit(DraftField::Notes, "  owner called back \n");
        let patch = editor.save().unwrap();
        assert_eq!(
            patch.next_follow_up_date,
            Some(NaiveDate::from_ymd_opt(2024, 6, 10))
        );
        assert_eq!(patch.notes, Some(Some("owner called back".to_string())));
        assert_eq!(patch.internal_status, None);
    }

    #[test]
    fn test_blank_notes_clear() {
        let patch = NotesEditor::open(&record())
            .edit(DraftField::Notes, "   ")
            .save()
            .unwrap();
        assert_eq!(patch.notes, Some(None));
    }

    #[test]
    fn test_invalid_date_rejected() {
        let result = NotesEditor::open(&record())
            .edit(DraftField::LastActionDate, "04/02/2024")
            .save();
        assert_eq!(
            result,
            Err(EditError::InvalidDate {
                field: "lastActionDate",
                value: "04/02/2024".to_string()
            })
        );
    }

    #[test]
    fn test_cancel_discards_and_save_needs_draft() {
        let editor = NotesEditor::open(&record()).edit(DraftField::Notes, "changed");
        let closed = editor.cancel();
        assert_eq!(closed, NotesEditor::Closed);
        assert_eq!(closed.save(), Err(EditError::NoDraft));
        assert_eq!(closed.edit(DraftField::Notes, "x"), NotesEditor::Closed);
    }

    #[test]
    fn test_draft_field_names() {
        assert_eq!(DraftField::parse("notes"), Some(DraftField::Notes));
        assert_eq!(
            DraftField::parse("nextFollowUpDate"),
            Some(DraftField::NextFollowUpDate)
        );
        assert_eq!(DraftField::parse("status"), None);
    }
}
