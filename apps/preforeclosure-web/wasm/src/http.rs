//! `fetch`-backed data service
//!
//! Endpoints, relative to the configured API base:
//! - `GET  /preforeclosure` - all records
//! - `PUT  /preforeclosure` - partial update, JSON body keyed by document number
//! - `POST /preforeclosure/upload` - multipart form, field `file`
//! - `GET  /preforeclosure/upload-stats` - latest upload summary

use preforeclosure_core::{
    AdminConfig, Record, RecordPatch, RecordService, ServiceError, UploadOutcome,
    UploadStatsResponse, UploadSummary,
};
use tracing::debug;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{FormData, Request, RequestInit, RequestMode, Response};

pub const RECORDS_PATH: &str = "preforeclosure";
pub const UPLOAD_PATH: &str = "preforeclosure/upload";
pub const UPLOAD_STATS_PATH: &str = "preforeclosure/upload-stats";

/// Data service reached over HTTP from the browser
pub struct HttpRecordService {
    config: AdminConfig,
}

impl HttpRecordService {
    pub fn new(config: AdminConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AdminConfig {
        &self.config
    }

    fn build_request(
        &self,
        method: &str,
        path: &str,
        body: Option<&JsValue>,
        json_body: bool,
    ) -> Result<Request, Option<String>> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        if let Some(body) = body {
            opts.set_body(body);
        }

        let url = self.config.endpoint(path);
        let request = Request::new_with_str_and_init(&url, &opts).map_err(js_failure)?;
        request
            .headers()
            .set("Accept", "application/json")
            .map_err(js_failure)?;
        if json_body {
            request
                .headers()
                .set("Content-Type", "application/json")
                .map_err(js_failure)?;
        }
        Ok(request)
    }

    /// Send a request and return the response body on 2xx
    ///
    /// `Err(None)` means the backend failed without saying why.
    async fn execute(&self, request: Request) -> Result<String, Option<String>> {
        let window = web_sys::window().ok_or_else(|| Some("No window".to_string()))?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(js_failure)?;
        let response: Response = response.dyn_into().map_err(js_failure)?;
        let text = JsFuture::from(response.text().map_err(js_failure)?)
            .await
            .map_err(js_failure)?
            .as_string()
            .unwrap_or_default();

        debug!(url = %request.url(), status = response.status(), "Backend responded");

        if response.ok() {
            Ok(text)
        } else {
            Err(error_message_from_body(&text))
        }
    }
}

impl RecordService for HttpRecordService {
    type File = web_sys::File;

    async fn list(&self) -> Result<Vec<Record>, ServiceError> {
        let request = self
            .build_request("GET", RECORDS_PATH, None, false)
            .map_err(ServiceError::Fetch)?;
        let body = self.execute(request).await.map_err(ServiceError::Fetch)?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Fetch(Some(unexpected(e))))
    }

    async fn update(&self, patch: &RecordPatch) -> Result<Record, ServiceError> {
        let body = serde_json::to_string(patch)
            .map_err(|e| ServiceError::Update(Some(e.to_string())))?;
        let request = self
            .build_request("PUT", RECORDS_PATH, Some(&JsValue::from_str(&body)), true)
            .map_err(ServiceError::Update)?;
        let body = self.execute(request).await.map_err(ServiceError::Update)?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Update(Some(unexpected(e))))
    }

    async fn upload(&self, file: &web_sys::File) -> Result<UploadOutcome, ServiceError> {
        let form = FormData::new().map_err(|e| ServiceError::Upload(js_failure(e)))?;
        form.append_with_blob_and_filename("file", file, &file.name())
            .map_err(|e| ServiceError::Upload(js_failure(e)))?;
        let form: JsValue = form.into();

        let request = self
            .build_request("POST", UPLOAD_PATH, Some(&form), false)
            .map_err(ServiceError::Upload)?;
        let body = self.execute(request).await.map_err(ServiceError::Upload)?;
        serde_json::from_str(&body).map_err(|e| ServiceError::Upload(Some(unexpected(e))))
    }

    async fn latest_upload_stats(&self) -> Result<Option<UploadSummary>, ServiceError> {
        let request = self
            .build_request("GET", UPLOAD_STATS_PATH, None, false)
            .map_err(ServiceError::Stats)?;
        let body = self.execute(request).await.map_err(ServiceError::Stats)?;
        let raw: UploadStatsResponse = serde_json::from_str(&body)
            .map_err(|e| ServiceError::Stats(Some(unexpected(e))))?;
        Ok(raw.into_summary())
    }
}

/// Pull `error` or `message` out of a JSON error body
pub fn error_message_from_body(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    ["error", "message"]
        .iter()
        .find_map(|key| value.get(key)?.as_str().map(str::to_string))
        .filter(|msg| !msg.trim().is_empty())
}

fn unexpected(err: serde_json::Error) -> String {
    format!("Unexpected response from server: {}", err)
}

fn js_failure(value: JsValue) -> Option<String> {
    value
        .dyn_ref::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .or_else(|| value.as_string())
        .or_else(|| Some("Network error".to_string()))
}
