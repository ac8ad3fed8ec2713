//! WASM bindings for the pre-foreclosure admin view
//!
//! Session state lives in Rust; JavaScript renders what it is handed and
//! forwards DOM events.
//!
//! ## Usage (JavaScript)
//!
//! ```javascript
//! import init, { AdminSession, droppedFile } from './pkg/preforeclosure_wasm.js';
//!
//! await init();
//!
//! const session = new AdminSession('/api');
//! session.setNotificationSink(({ level, title, message }) => toast(level, title, message));
//! await session.refresh();
//! render(session.getVisibleRecords(), session.getStats());
//!
//! dropZone.addEventListener('drop', async (e) => {
//!   const file = droppedFile(e);
//!   if (file) await session.uploadFile(file, input).catch(() => {});
//! });
//!
//! session.setCity('Reno');
//! await session.changeStatus('2024-001234', 'Monitoring');
//! ```

pub mod dnd;
pub mod http;
pub mod logging;
pub mod session;

use preforeclosure_core::notify::format_size;
use preforeclosure_core::{FileCandidate, HeaderReport, InternalStatus, RecordType, UploadPolicy};
use wasm_bindgen::prelude::*;

pub use http::HttpRecordService;
pub use session::{AdminSession, SessionState};

/// Initialize the WASM module
/// Called automatically by wasm-bindgen
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    logging::install(logging::DEFAULT_DIRECTIVE);
    tracing::debug!(version = env!("CARGO_PKG_VERSION"), "Admin view initialized");
}

/// Get the library version
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

/// Check a file against the default upload limits without a session
#[wasm_bindgen(js_name = validateFile)]
pub fn validate_file(name: &str, size: f64) -> Result<(), JsValue> {
    UploadPolicy::default()
        .validate(&FileCandidate::new(name, size as u64))
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Map a sheet's header row to the columns the backend reads
#[wasm_bindgen(js_name = analyzeHeaders)]
pub fn analyze_headers(headers: Vec<String>) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(&HeaderReport::analyze(&headers))
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

#[wasm_bindgen(js_name = formatFileSize)]
pub fn format_file_size(bytes: f64) -> String {
    format_size(bytes as u64)
}

/// Values for the status dropdown
#[wasm_bindgen(js_name = statusOptions)]
pub fn status_options() -> Vec<String> {
    InternalStatus::ALL.iter().map(|s| s.to_string()).collect()
}

/// Values for the type dropdown
#[wasm_bindgen(js_name = typeOptions)]
pub fn type_options() -> Vec<String> {
    RecordType::ALL.iter().map(|t| t.to_string()).collect()
}


#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_rejected_file_reports_reason() {
        let err = validate_file("records.csv", 10.0).unwrap_err();
        assert!(err.as_string().unwrap().contains(".xlsx"));
    }

    #[wasm_bindgen_test]
    fn test_session_filters_without_records() {
        let session = AdminSession::new(None);
        assert!(!session.has_active_filters());
        session.set_type("Tax").unwrap();
        assert!(session.has_active_filters());
        assert!(session.set_status("Unknown").is_err());
        session.reset_filters();
        assert!(!session.has_active_filters());
        assert_eq!(session.get_visible_count(), 0);
    }

    #[wasm_bindgen_test]
    fn test_analyze_headers_returns_object() {
        let report = analyze_headers(vec!["Document Number".into(), "City".into()]).unwrap();
        assert!(report.is_object());
    }
}
