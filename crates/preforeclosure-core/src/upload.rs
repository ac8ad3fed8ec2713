//! Spreadsheet upload orchestration
//!
//! A candidate file is validated locally, then handed to the backend. The
//! presentational state is an explicit machine:
//!
//! ```text
//! Idle --select(valid)--> Pending --complete--> Success | Failed --reset--> Idle
//!   \--select(invalid)--> Idle (input cleared, notification)
//! ```
//!
//! `reset` leaves `Pending` untouched.
//!
//! Drag-and-drop and the file picker both go through [`UploadFlow::select`].

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{ServiceError, UploadRejection};
use crate::model::UploadOutcome;
use crate::notify::Notification;
use crate::service::RecordService;

/// Largest spreadsheet the backend accepts (100 MiB)
pub const MAX_UPLOAD_BYTES: u64 = 100 * 1024 * 1024;

/// Accepted filename suffixes (case-sensitive)
pub const ALLOWED_EXTENSIONS: [&str; 2] = [".xlsx", ".xls"];

/// Name and size of a file chosen by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileCandidate {
    pub name: String,
    pub size: u64,
}

impl FileCandidate {
    pub fn new(name: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

/// Client-side constraints on uploaded files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadPolicy {
    pub max_bytes: u64,
    pub allowed_extensions: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_bytes: MAX_UPLOAD_BYTES,
            allowed_extensions: ALLOWED_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
        }
    }
}

impl UploadPolicy {
    /// Check extension first, then size
    pub fn validate(&self, candidate: &FileCandidate) -> Result<(), UploadRejection> {
        let extension_ok = self
            .allowed_extensions
            .iter()
            .any(|ext| candidate.name.ends_with(ext.as_str()));
        if !extension_ok {
            return Err(UploadRejection::InvalidFileType {
                filename: candidate.name.clone(),
                expected: self.describe_extensions(),
            });
        }

        if candidate.size > self.max_bytes {
            return Err(UploadRejection::FileTooLarge {
                size: candidate.size,
                limit: self.max_bytes,
            });
        }

        Ok(())
    }

    /// Human-readable list, e.g. ".xlsx or .xls"
    pub fn describe_extensions(&self) -> String {
        match self.allowed_extensions.split_last() {
            None => String::new(),
            Some((last, [])) => last.clone(),
            Some((last, rest)) => format!("{} or {}", rest.join(", "), last),
        }
    }
}

/// Presentational upload state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", rename_all = "camelCase")]
pub enum UploadFlow {
    #[default]
    Idle,
    Pending {
        filename: String,
    },
    Success {
        filename: String,
        outcome: UploadOutcome,
    },
    Failed {
        filename: String,
        message: String,
    },
}

impl UploadFlow {
    /// Only the idle state accepts a new file
    pub fn accepts_input(&self) -> bool {
        matches!(self, UploadFlow::Idle)
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, UploadFlow::Pending { .. })
    }

    /// Validate a candidate and move to `Pending`
    ///
    /// On rejection the flow is unchanged; the caller clears the file input
    /// and shows the rejection's notification.
    pub fn select(
        &self,
        policy: &UploadPolicy,
        candidate: &FileCandidate,
    ) -> Result<UploadFlow, UploadRejection> {
        match self {
            UploadFlow::Pending { .. } => return Err(UploadRejection::UploadBusy),
            UploadFlow::Success { .. } | UploadFlow::Failed { .. } => {
                return Err(UploadRejection::AwaitingReset)
            }
            UploadFlow::Idle => {}
        }

        if let Err(rejection) = policy.validate(candidate) {
            warn!(file = %candidate.name, size = candidate.size, %rejection, "Upload rejected");
            return Err(rejection);
        }

        info!(file = %candidate.name, size = candidate.size, "Upload started");
        Ok(UploadFlow::Pending {
            filename: candidate.name.clone(),
        })
    }

    /// Record the backend's answer
    ///
    /// Returns the terminal state and the notification to show. Completing a
    /// flow that is not pending leaves it untouched and yields nothing.
    pub fn complete(
        &self,
        result: Result<UploadOutcome, ServiceError>,
    ) -> (UploadFlow, Option<Notification>) {
        let filename = match self {
            UploadFlow::Pending { filename } => filename.clone(),
            other => {
                warn!(state = ?other, "Upload completion ignored, no upload pending");
                return (other.clone(), None);
            }
        };

        match result {
            Ok(outcome) => {
                info!(
                    file = %filename,
                    processed = outcome.records_processed,
                    total = outcome.total_records,
                    "Upload finished"
                );
                let notification = Notification::success(
                    "Upload successful",
                    format!(
                        "Processed {} of {} records ({} active, {} inactive)",
                        outcome.records_processed,
                        outcome.total_records,
                        outcome.active_records,
                        outcome.inactive_records
                    ),
                );
                (UploadFlow::Success { filename, outcome }, Some(notification))
            }
            Err(err) => {
                warn!(file = %filename, error = %err, "Upload failed");
                let notification = Notification::from(&err);
                (
                    UploadFlow::Failed {
                        filename,
                        message: err.user_message(),
                    },
                    Some(notification),
                )
            }
        }
    }

    /// "Try again" / "Upload another"
    ///
    /// An in-flight upload cannot be reset; the flow stays pending until
    /// `complete` settles it.
    pub fn reset(&self) -> UploadFlow {
        match self {
            UploadFlow::Pending { .. } => self.clone(),
            _ => UploadFlow::Idle,
        }
    }
}

/// Validate, upload and settle a file against the backend
///
/// `on_pending` sees the `Pending` state before the request is sent so the
/// host can disable re-submission while it is in flight.
pub async fn upload_file<S, F>(
    service: &S,
    policy: &UploadPolicy,
    flow: &UploadFlow,
    candidate: &FileCandidate,
    file: &S::File,
    on_pending: F,
) -> Result<(UploadFlow, Option<Notification>), UploadRejection>
where
    S: RecordService,
    F: FnOnce(&UploadFlow),
{
    let pending = flow.select(policy, candidate)?;
    on_pending(&pending);
    let result = service.upload(file).await;
    Ok(pending.complete(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn outcome() -> UploadOutcome {
        UploadOutcome {
            records_processed: 120,
            total_records: 125,
            active_records: 110,
            inactive_records: 15,
            new_records: None,
            updated_records: None,
        }
    }

    #[test]
    fn test_csv_rejected_as_invalid_type() {
        let result = UploadPolicy::default().validate(&FileCandidate::new("data.csv", 10));
        assert!(matches!(
            result,
            Err(UploadRejection::InvalidFileType { ref filename, .. }) if filename == "data.csv"
        ));
    }

    #[test]
    fn test_extension_check_is_case_sensitive() {
        let result = UploadPolicy::default().validate(&FileCandidate::new("DATA.XLSX", 10));
        assert!(matches!(result, Err(UploadRejection::InvalidFileType { .. })));
    }

    #[test]
    fn test_both_excel_extensions_accepted() {
        let policy = UploadPolicy::default();
        assert!(policy.validate(&FileCandidate::new("a.xlsx", 1)).is_ok());
        assert!(policy.validate(&FileCandidate::new("a.xls", 1)).is_ok());
    }

    #[test]
    fn test_size_limit_boundary() {
        let policy = UploadPolicy::default();
        assert!(policy
            .validate(&FileCandidate::new("big.xlsx", 104_857_600))
            .is_ok());
        assert_eq!(
            policy.validate(&FileCandidate::new("big.xlsx", 104_857_601)),
            Err(UploadRejection::FileTooLarge {
                size: 104_857_601,
                limit: 104_857_600
            })
        );
    }

    #[test]
    fn test_extension_checked_before_size() {
        let result = UploadPolicy::default().validate(&FileCandidate::new("huge.csv", u64::MAX));
        assert!(matches!(result, Err(UploadRejection::InvalidFileType { .. })));
    }

    #[test]
    fn test_describe_extensions() {
        assert_eq!(UploadPolicy::default().describe_extensions(), ".xlsx or .xls");
        let policy = UploadPolicy {
            max_bytes: 1,
            allowed_extensions: vec![".a".into(), ".b".into(), ".c".into()],
        };
        assert_eq!(policy.describe_extensions(), ".a, .b or .c");
    }

    #[test]
    fn test_select_moves_idle_to_pending() {
        let flow = UploadFlow::Idle
            .select(&UploadPolicy::default(), &FileCandidate::new("march.xlsx", 2048))
            .unwrap();
        assert_eq!(
            flow,
            UploadFlow::Pending {
                filename: "march.xlsx".to_string()
            }
        );
        assert!(flow.is_pending());
        assert!(!flow.accepts_input());
    }

    #[test]
    fn test_select_refused_while_pending_or_finished() {
        let candidate = FileCandidate::new("march.xlsx", 2048);
        let pending = UploadFlow::Pending {
            filename: "feb.xlsx".to_string(),
        };
        assert_eq!(
            pending.select(&UploadPolicy::default(), &candidate),
            Err(UploadRejection::UploadBusy)
        );

        let (done, _) = pending.complete(Ok(outcome()));
        assert_eq!(
            done.select(&UploadPolicy::default(), &candidate),
            Err(UploadRejection::AwaitingReset)
        );
    }

    #[test]
    fn test_complete_success_reports_counts() {
        let pending = UploadFlow::Pending {
            filename: "march.xlsx".to_string(),
        };
        let (flow, note) = pending.complete(Ok(outcome()));
        assert!(matches!(flow, UploadFlow::Success { .. }));
        let note = note.unwrap();
        assert_eq!(note.title, "Upload successful");
        assert_eq!(
            note.message,
            "Processed 120 of 125 records (110 active, 15 inactive)"
        );
    }

    #[test]
    fn test_complete_failure_uses_backend_message_or_fallback() {
        let pending = UploadFlow::Pending {
            filename: "march.xlsx".to_string(),
        };
        let (flow, _) = pending.complete(Err(ServiceError::Upload(Some("Bad sheet".into()))));
        assert_eq!(
            flow,
            UploadFlow::Failed {
                filename: "march.xlsx".to_string(),
                message: "Bad sheet".to_string()
            }
        );

        let (flow, note) = pending.complete(Err(ServiceError::Upload(None)));
        assert_eq!(
            flow,
            UploadFlow::Failed {
                filename: "march.xlsx".to_string(),
                message: "Upload failed. Please try again.".to_string()
            }
        );
        assert_eq!(note.unwrap().message, "Upload failed. Please try again.");
    }

    #[test]
    fn test_complete_without_pending_is_ignored() {
        let (flow, note) = UploadFlow::Idle.complete(Ok(outcome()));
        assert_eq!(flow, UploadFlow::Idle);
        assert!(note.is_none());
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let failed = UploadFlow::Failed {
            filename: "x.xlsx".into(),
            message: "nope".into(),
        };
        assert_eq!(failed.reset(), UploadFlow::Idle);
        assert!(failed.reset().accepts_input());
    }

    #[test]
    fn test_reset_while_pending_keeps_upload_in_flight() {
        let policy = UploadPolicy::default();
        let pending = UploadFlow::Idle
            .select(&policy, &FileCandidate::new("a.xlsx", 10))
            .unwrap();

        let after_reset = pending.reset();
        assert_eq!(
            after_reset,
            UploadFlow::Pending {
                filename: "a.xlsx".into()
            }
        );
        assert_eq!(
            after_reset.select(&policy, &FileCandidate::new("b.xlsx", 10)),
            Err(UploadRejection::UploadBusy)
        );

        let (settled, _) = after_reset.complete(Ok(outcome()));
        assert!(matches!(settled, UploadFlow::Success { ref filename, .. } if filename == "a.xlsx"));
    }

    #[test]
    fn test_flow_serializes_with_phase_tag() {
        let value = serde_json::to_value(UploadFlow::Pending {
            filename: "a.xlsx".into(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"phase": "pending", "filename": "a.xlsx"}));
        let value = serde_json::to_value(UploadFlow::Idle).unwrap();
        assert_eq!(value, serde_json::json!({"phase": "idle"}));
    }
}
