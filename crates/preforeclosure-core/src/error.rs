use thiserror::Error;

/// Client-side refusal of a candidate upload, raised before any network call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UploadRejection {
    #[error("Invalid file type: {filename} (expected {expected})")]
    InvalidFileType { filename: String, expected: String },

    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    FileTooLarge { size: u64, limit: u64 },

    #[error("An upload is already in progress")]
    UploadBusy,

    #[error("Dismiss the previous upload result before uploading again")]
    AwaitingReset,
}

/// Failure reported by the backend for one of its operations
///
/// The payload is the backend's message when it sent one.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ServiceError {
    #[error("Failed to load records: {}", .0.as_deref().unwrap_or("no details"))]
    Fetch(Option<String>),

    #[error("Failed to update record: {}", .0.as_deref().unwrap_or("no details"))]
    Update(Option<String>),

    #[error("Upload failed: {}", .0.as_deref().unwrap_or("no details"))]
    Upload(Option<String>),

    #[error("Failed to load upload stats: {}", .0.as_deref().unwrap_or("no details"))]
    Stats(Option<String>),
}

impl ServiceError {
    pub fn message(&self) -> Option<&str> {
        match self {
            ServiceError::Fetch(msg)
            | ServiceError::Update(msg)
            | ServiceError::Upload(msg)
            | ServiceError::Stats(msg) => msg.as_deref().filter(|m| !m.trim().is_empty()),
        }
    }

    /// Message to show the user: the backend's own, or a generic fallback
    pub fn user_message(&self) -> String {
        if let Some(msg) = self.message() {
            return msg.to_string();
        }
        match self {
            ServiceError::Fetch(_) => "Failed to load records. Please try again.",
            ServiceError::Update(_) => "Failed to update record. Please try again.",
            ServiceError::Upload(_) => "Upload failed. Please try again.",
            ServiceError::Stats(_) => "Failed to load upload stats.",
        }
        .to_string()
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    #[error("Invalid date for {field}: '{value}' (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("No notes edit in progress")]
    NoDraft,

    #[error("Record not found: {0}")]
    UnknownRecord(String),
}

/// Any error the admin view can surface
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error(transparent)]
    Upload(#[from] UploadRejection),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error(transparent)]
    Edit(#[from] EditError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_backend_message() {
        let err = ServiceError::Upload(Some("Missing Document Number column".to_string()));
        assert_eq!(err.user_message(), "Missing Document Number column");
    }

    #[test]
    fn test_user_message_falls_back_when_missing_or_blank() {
        assert_eq!(
            ServiceError::Upload(None).user_message(),
            "Upload failed. Please try again."
        );
        assert_eq!(
            ServiceError::Upload(Some("  ".to_string())).user_message(),
            "Upload failed. Please try again."
        );
    }

    #[test]
    fn test_display_includes_details() {
        let err = ServiceError::Fetch(Some("timeout".to_string()));
        assert_eq!(err.to_string(), "Failed to load records: timeout");
        let err = UploadRejection::FileTooLarge {
            size: 104_857_601,
            limit: 104_857_600,
        };
        assert!(err.to_string().contains("104857601"));
    }
}
