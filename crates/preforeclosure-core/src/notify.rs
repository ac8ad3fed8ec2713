//! Toast notifications handed to the host's notification sink

use serde::{Deserialize, Serialize};

use crate::error::{AdminError, EditError, ServiceError, UploadRejection};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn success(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn error(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            title: title.into(),
            message: message.into(),
        }
    }

    pub fn info(title: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            title: title.into(),
            message: message.into(),
        }
    }
}

impl From<&UploadRejection> for Notification {
    fn from(rejection: &UploadRejection) -> Self {
        match rejection {
            UploadRejection::InvalidFileType { expected, .. } => Notification::error(
                "Invalid file type",
                format!("Please upload an Excel file ({})", expected),
            ),
            UploadRejection::FileTooLarge { limit, .. } => Notification::error(
                "File too large",
                format!("Maximum file size is {}", format_size(*limit)),
            ),
            UploadRejection::UploadBusy => Notification::info(
                "Upload in progress",
                "Wait for the current upload to finish",
            ),
            UploadRejection::AwaitingReset => Notification::info(
                "Upload finished",
                "Choose \"Upload another\" to start a new upload",
            ),
        }
    }
}

impl From<&ServiceError> for Notification {
    fn from(err: &ServiceError) -> Self {
        let title = match err {
            ServiceError::Fetch(_) => "Could not load records",
            ServiceError::Update(_) => "Update failed",
            ServiceError::Upload(_) => "Upload failed",
            ServiceError::Stats(_) => "Could not load upload stats",
        };
        Notification::error(title, err.user_message())
    }
}

impl From<&EditError> for Notification {
    fn from(err: &EditError) -> Self {
        Notification::error("Cannot save", err.to_string())
    }
}

impl From<&AdminError> for Notification {
    fn from(err: &AdminError) -> Self {
        match err {
            AdminError::Upload(rejection) => rejection.into(),
            AdminError::Service(err) => err.into(),
            AdminError::Edit(err) => err.into(),
        }
    }
}

/// Format a byte count the way the upload dialog shows limits
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes < KB {
        format!("{} B", bytes)
    } else if bytes < MB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else if bytes % MB == 0 {
        format!("{}MB", bytes / MB)
    } else {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(500), "500 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(104_857_600), "100MB");
        assert_eq!(format_size(2_621_440), "2.5 MB");
    }

    #[test]
    fn test_rejection_notifications() {
        let note = Notification::from(&UploadRejection::FileTooLarge {
            size: 200 * 1024 * 1024,
            limit: 100 * 1024 * 1024,
        });
        assert_eq!(note.level, NotificationLevel::Error);
        assert_eq!(note.title, "File too large");
        assert_eq!(note.message, "Maximum file size is 100MB");

        let note = Notification::from(&UploadRejection::InvalidFileType {
            filename: "data.csv".to_string(),
            expected: ".xlsx or .xls".to_string(),
        });
        assert_eq!(note.message, "Please upload an Excel file (.xlsx or .xls)");
    }

    #[test]
    fn test_service_error_notification_uses_fallback() {
        let note = Notification::from(&ServiceError::Update(None));
        assert_eq!(note.title, "Update failed");
        assert_eq!(note.message, "Failed to update record. Please try again.");
    }

    #[test]
    fn test_admin_error_notification_matches_inner() {
        let busy = AdminError::from(UploadRejection::UploadBusy);
        assert_eq!(
            Notification::from(&busy),
            Notification::from(&UploadRejection::UploadBusy)
        );

        let missing = AdminError::from(EditError::UnknownRecord("Z9".to_string()));
        let note = Notification::from(&missing);
        assert_eq!(note.title, "Cannot save");
        assert_eq!(note.message, "Record not found: Z9");
    }

    #[test]
    fn test_level_serializes_lowercase() {
        let json = serde_json::to_string(&Notification::info("a", "b")).unwrap();
        assert_eq!(json, r#"{"level":"info","title":"a","message":"b"}"#);
    }
}
