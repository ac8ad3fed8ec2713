//! Stateful admin session
//!
//! Holds the record cache, filter criteria, upload flow and notes dialog in
//! Rust so the page only renders what it is handed. `SessionState` carries
//! all transitions and is tested natively; `AdminSession` moves values across
//! the JavaScript boundary and drives the backend calls.

use std::cell::RefCell;
use std::rc::Rc;

use chrono::NaiveDate;
use preforeclosure_core::filter::parse_selector;
use preforeclosure_core::{
    status_patch, upload_file, AdminConfig, AdminError, DraftField, EditError, FileCandidate, FilterAction,
    FilterCriteria, InternalStatus, LoadState, NotesDraft, NotesEditor, Notification,
    NotificationLevel, Record, RecordPatch, RecordService, RecordStore, RecordType, ServiceError,
    UploadFlow, UploadPolicy, UploadSummary,
};
use serde::Serialize;
use tracing::{info, warn};
use wasm_bindgen::prelude::*;
use web_sys::HtmlInputElement;

use crate::dnd::clear_file_input;
use crate::http::HttpRecordService;

/// An edit already shown locally, waiting on the backend
#[derive(Debug, Clone, PartialEq)]
pub struct PendingEdit {
    pub patch: RecordPatch,
    pub previous: Record,
}

/// Everything the admin view shows, independent of the browser
#[derive(Debug, Clone)]
pub struct SessionState {
    policy: UploadPolicy,
    store: RecordStore,
    criteria: FilterCriteria,
    upload: UploadFlow,
    notes: NotesEditor,
    latest_upload: Option<UploadSummary>,
}

impl SessionState {
    pub fn new(policy: UploadPolicy) -> Self {
        Self {
            policy,
            store: RecordStore::new(),
            criteria: FilterCriteria::default(),
            upload: UploadFlow::Idle,
            notes: NotesEditor::Closed,
            latest_upload: None,
        }
    }

    pub fn policy(&self) -> &UploadPolicy {
        &self.policy
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn criteria(&self) -> &FilterCriteria {
        &self.criteria
    }

    pub fn filter(&mut self, action: FilterAction) {
        self.criteria = self.criteria.apply(action);
    }

    pub fn set_criteria(&mut self, criteria: FilterCriteria) {
        self.criteria = criteria;
    }

    pub fn visible(&self, today: NaiveDate) -> Vec<&Record> {
        self.store.visible(&self.criteria, today)
    }

    pub fn begin_loading(&mut self) {
        self.store.begin_loading();
    }

    pub fn finish_loading(
        &mut self,
        result: Result<Vec<Record>, ServiceError>,
    ) -> Option<Notification> {
        self.store.finish_loading(result)
    }

    pub fn upload(&self) -> &UploadFlow {
        &self.upload
    }

    pub fn set_upload(&mut self, flow: UploadFlow) {
        self.upload = flow;
    }

    pub fn reset_upload(&mut self) {
        self.upload = self.upload.reset();
    }

    pub fn latest_upload(&self) -> Option<&UploadSummary> {
        self.latest_upload.as_ref()
    }

    pub fn finish_upload_stats(
        &mut self,
        result: Result<Option<UploadSummary>, ServiceError>,
    ) -> Option<Notification> {
        match result {
            Ok(summary) => {
                self.latest_upload = summary;
                None
            }
            Err(err) => {
                warn!(error = %err, "Upload stats unavailable");
                Some(Notification::from(&err))
            }
        }
    }

    /// Show the new status right away and remember what to restore
    pub fn begin_status_change(
        &mut self,
        document_number: &str,
        status: InternalStatus,
    ) -> Result<PendingEdit, EditError> {
        let patch = status_patch(document_number, status);
        let previous = self.store.apply_patch(&patch)?;
        Ok(PendingEdit { patch, previous })
    }

    /// Keep the backend's copy on success, restore the old one on failure
    pub fn finish_status_change(
        &mut self,
        pending: PendingEdit,
        result: Result<Record, ServiceError>,
    ) -> Option<Notification> {
        match result {
            Ok(saved) => {
                info!(document = %saved.document_number, status = %saved.internal_status, "Status saved");
                self.store.replace(saved);
                None
            }
            Err(err) => {
                warn!(document = %pending.previous.document_number, error = %err, "Status change rolled back");
                self.store.rollback(&pending.patch, &pending.previous);
                Some(Notification::from(&err))
            }
        }
    }

    pub fn open_notes(&mut self, document_number: &str) -> Result<&NotesDraft, EditError> {
        let record = self
            .store
            .get(document_number)
            .ok_or_else(|| EditError::UnknownRecord(document_number.to_string()))?;
        self.notes = NotesEditor::open(record);
        self.notes.draft().ok_or(EditError::NoDraft)
    }

    pub fn edit_notes(&mut self, field: DraftField, value: &str) -> Result<(), EditError> {
        if self.notes.draft().is_none() {
            return Err(EditError::NoDraft);
        }
        self.notes = self.notes.edit(field, value);
        Ok(())
    }

    pub fn notes(&self) -> &NotesEditor {
        &self.notes
    }

    pub fn cancel_notes(&mut self) {
        self.notes = self.notes.cancel();
    }

    /// Validate the draft and show it locally. The dialog stays open until
    /// the backend answers.
    pub fn begin_notes_save(&mut self) -> Result<PendingEdit, EditError> {
        let patch = self.notes.save()?;
        let previous = self.store.apply_patch(&patch)?;
        Ok(PendingEdit { patch, previous })
    }

    pub fn finish_notes_save(
        &mut self,
        pending: PendingEdit,
        result: Result<Record, ServiceError>,
    ) -> Notification {
        match result {
            Ok(saved) => {
                info!(document = %saved.document_number, "Notes saved");
                self.store.replace(saved);
                self.notes = self.notes.cancel();
                Notification::success("Saved", "Notes updated")
            }
            Err(err) => {
                warn!(document = %pending.previous.document_number, error = %err, "Notes save rolled back");
                self.store.rollback(&pending.patch, &pending.previous);
                Notification::from(&err)
            }
        }
    }
}

/// Today's date in the browser's local time zone
fn today() -> NaiveDate {
    let now = js_sys::Date::new_0();
    NaiveDate::from_ymd_opt(
        now.get_full_year() as i32,
        now.get_month() + 1,
        now.get_date(),
    )
    .unwrap_or_default()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value)
        .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}

fn js_err(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

/// Admin view session bound to a data service
#[wasm_bindgen]
pub struct AdminSession {
    state: Rc<RefCell<SessionState>>,
    service: HttpRecordService,
    notification_sink: RefCell<Option<js_sys::Function>>,
}

impl AdminSession {
    fn with_config(config: AdminConfig) -> Self {
        let policy = config.upload_policy();
        Self {
            state: Rc::new(RefCell::new(SessionState::new(policy))),
            service: HttpRecordService::new(config),
            notification_sink: RefCell::new(None),
        }
    }

    fn notify(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Error => {
                warn!(title = %notification.title, message = %notification.message, "Notify")
            }
            _ => info!(title = %notification.title, message = %notification.message, "Notify"),
        }

        let Some(callback) = self.notification_sink.borrow().clone() else {
            return;
        };
        if let Ok(value) = serde_wasm_bindgen::to_value(notification) {
            let _ = callback.call1(&JsValue::NULL, &value);
        }
    }

    /// Surface a refused action to the sink and hand the reason to JS
    fn reject(&self, err: impl Into<AdminError>) -> JsValue {
        let err = err.into();
        self.notify(&Notification::from(&err));
        js_err(err)
    }

    fn filter(&self, action: FilterAction) {
        self.state.borrow_mut().filter(action);
    }
}

#[wasm_bindgen]
impl AdminSession {
    /// Create a session talking to `api_base_url` (default `/api`)
    #[wasm_bindgen(constructor)]
    pub fn new(api_base_url: Option<String>) -> Self {
        let mut config = AdminConfig::default();
        if let Some(base) = api_base_url {
            config.api_base_url = base;
        }
        Self::with_config(config)
    }

    /// Create a session from a JSON `AdminConfig`
    #[wasm_bindgen(js_name = fromConfig)]
    pub fn from_config(config_json: &str) -> Result<AdminSession, JsValue> {
        let config = AdminConfig::from_json_str(config_json).map_err(|e| js_err(format!("{:#}", e)))?;
        Ok(Self::with_config(config))
    }

    /// Set the toast sink
    /// Callback signature: (notification: { level, title, message }) => void
    #[wasm_bindgen(js_name = setNotificationSink)]
    pub fn set_notification_sink(&self, callback: js_sys::Function) {
        *self.notification_sink.borrow_mut() = Some(callback);
    }

    // ---- filters ----

    #[wasm_bindgen(js_name = setSearch)]
    pub fn set_search(&self, search: &str) {
        self.filter(FilterAction::SetSearch(search.to_string()));
    }

    /// `"all"` clears the selector
    #[wasm_bindgen(js_name = setType)]
    pub fn set_type(&self, value: &str) -> Result<(), JsValue> {
        let record_type = parse_selector::<RecordType>(value).map_err(js_err)?;
        self.filter(FilterAction::SetType(record_type));
        Ok(())
    }

    #[wasm_bindgen(js_name = setCity)]
    pub fn set_city(&self, value: &str) {
        let city = parse_selector::<String>(value).unwrap_or_default();
        self.filter(FilterAction::SetCity(city));
    }

    #[wasm_bindgen(js_name = setZip)]
    pub fn set_zip(&self, value: &str) {
        let zip = parse_selector::<String>(value).unwrap_or_default();
        self.filter(FilterAction::SetZip(zip));
    }

    #[wasm_bindgen(js_name = setFilingMonth)]
    pub fn set_filing_month(&self, value: &str) {
        let month = parse_selector::<String>(value).unwrap_or_default();
        self.filter(FilterAction::SetFilingMonth(month));
    }

    #[wasm_bindgen(js_name = setStatus)]
    pub fn set_status(&self, value: &str) -> Result<(), JsValue> {
        let status = parse_selector::<InternalStatus>(value).map_err(js_err)?;
        self.filter(FilterAction::SetStatus(status));
        Ok(())
    }

    #[wasm_bindgen(js_name = setNeedsFollowUp)]
    pub fn set_needs_follow_up(&self, on: bool) {
        self.filter(FilterAction::SetNeedsFollowUp(on));
    }

    #[wasm_bindgen(js_name = resetFilters)]
    pub fn reset_filters(&self) {
        self.filter(FilterAction::Reset);
    }

    /// Current criteria, e.g. to persist in the URL
    #[wasm_bindgen(js_name = getCriteria)]
    pub fn get_criteria(&self) -> Result<JsValue, JsValue> {
        to_js(self.state.borrow().criteria())
    }

    #[wasm_bindgen(js_name = setCriteria)]
    pub fn set_criteria(&self, criteria_json: &str) -> Result<(), JsValue> {
        let criteria: FilterCriteria = serde_json::from_str(criteria_json).map_err(js_err)?;
        self.state.borrow_mut().set_criteria(criteria);
        Ok(())
    }

    #[wasm_bindgen(js_name = hasActiveFilters)]
    pub fn has_active_filters(&self) -> bool {
        !self.state.borrow().criteria().is_default()
    }

    // ---- views ----

    #[wasm_bindgen(js_name = getVisibleRecords)]
    pub fn get_visible_records(&self) -> Result<JsValue, JsValue> {
        let state = self.state.borrow();
        to_js(&state.visible(today()))
    }

    #[wasm_bindgen(js_name = getVisibleCount)]
    pub fn get_visible_count(&self) -> usize {
        self.state.borrow().visible(today()).len()
    }

    #[wasm_bindgen(js_name = getFilterOptions)]
    pub fn get_filter_options(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().store().options())
    }

    #[wasm_bindgen(js_name = getStats)]
    pub fn get_stats(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.borrow().store().stats(today()))
    }

    #[wasm_bindgen(js_name = getLoadState)]
    pub fn get_load_state(&self) -> Result<JsValue, JsValue> {
        to_js(self.state.borrow().store().state())
    }

    #[wasm_bindgen(js_name = isLoading)]
    pub fn is_loading(&self) -> bool {
        matches!(self.state.borrow().store().state(), LoadState::Loading)
    }

    /// Fetch all records. Failures are shown through the sink and the load
    /// state; the previous records stay on screen.
    pub async fn refresh(&self) -> Result<bool, JsValue> {
        self.state.borrow_mut().begin_loading();
        let result = self.service.list().await;
        let notification = self.state.borrow_mut().finish_loading(result);
        match notification {
            Some(notification) => {
                self.notify(&notification);
                Ok(false)
            }
            None => Ok(true),
        }
    }

    // ---- upload ----

    #[wasm_bindgen(js_name = getUploadState)]
    pub fn get_upload_state(&self) -> Result<JsValue, JsValue> {
        to_js(self.state.borrow().upload())
    }

    #[wasm_bindgen(js_name = isUploading)]
    pub fn is_uploading(&self) -> bool {
        self.state.borrow().upload().is_pending()
    }

    /// Validate and send a spreadsheet
    ///
    /// A rejected file clears `input` (when given), notifies and rejects the
    /// promise. On success the records and upload stats are reloaded.
    #[wasm_bindgen(js_name = uploadFile)]
    pub async fn upload_file(
        &self,
        file: web_sys::File,
        input: Option<HtmlInputElement>,
    ) -> Result<JsValue, JsValue> {
        let candidate = FileCandidate::new(file.name(), file.size() as u64);
        let (policy, flow) = {
            let state = self.state.borrow();
            (state.policy().clone(), state.upload().clone())
        };

        let state = Rc::clone(&self.state);
        let result = upload_file(
            &self.service,
            &policy,
            &flow,
            &candidate,
            &file,
            |pending| state.borrow_mut().set_upload(pending.clone()),
        )
        .await;

        let (flow, notification) = match result {
            Ok(settled) => settled,
            Err(rejection) => {
                if let Some(input) = &input {
                    clear_file_input(input);
                }
                return Err(self.reject(rejection));
            }
        };

        self.state.borrow_mut().set_upload(flow.clone());
        if let Some(notification) = &notification {
            self.notify(notification);
        }
        if matches!(flow, UploadFlow::Success { .. }) {
            self.refresh().await?;
            self.load_upload_stats().await?;
        }
        to_js(&flow)
    }

    /// Back to idle after a terminal upload state; ignored while uploading
    #[wasm_bindgen(js_name = resetUpload)]
    pub fn reset_upload(&self) {
        self.state.borrow_mut().reset_upload();
    }

    /// Fetch the latest upload summary; resolves to `null` when none exists
    #[wasm_bindgen(js_name = loadUploadStats)]
    pub async fn load_upload_stats(&self) -> Result<JsValue, JsValue> {
        let result = self.service.latest_upload_stats().await;
        let notification = self.state.borrow_mut().finish_upload_stats(result);
        if let Some(notification) = notification {
            self.notify(&notification);
        }
        match self.state.borrow().latest_upload() {
            Some(summary) => to_js(summary),
            None => Ok(JsValue::NULL),
        }
    }

    // ---- edits ----

    /// Change a record's internal status, rolling back if the save fails
    #[wasm_bindgen(js_name = changeStatus)]
    pub async fn change_status(&self, document_number: &str, status: &str) -> Result<(), JsValue> {
        let status: InternalStatus = status.parse().map_err(js_err)?;
        let begun = self
            .state
            .borrow_mut()
            .begin_status_change(document_number, status);
        let pending = begun.map_err(|e| self.reject(e))?;

        let result = self.service.update(&pending.patch).await;
        let failed = result.is_err();
        let notification = self.state.borrow_mut().finish_status_change(pending, result);
        if let Some(notification) = notification {
            self.notify(&notification);
        }
        if failed {
            return Err(js_err("Status change was not saved"));
        }
        Ok(())
    }

    /// Open the notes dialog for a record and return the draft
    #[wasm_bindgen(js_name = openNotes)]
    pub fn open_notes(&self, document_number: &str) -> Result<JsValue, JsValue> {
        let mut state = self.state.borrow_mut();
        let draft = state.open_notes(document_number).map_err(js_err)?;
        to_js(draft)
    }

    /// Update one draft field: `lastActionDate`, `nextFollowUpDate` or `notes`
    #[wasm_bindgen(js_name = editNotes)]
    pub fn edit_notes(&self, field: &str, value: &str) -> Result<(), JsValue> {
        let field = DraftField::parse(field)
            .ok_or_else(|| js_err(format!("Unknown notes field: {}", field)))?;
        self.state.borrow_mut().edit_notes(field, value).map_err(js_err)
    }

    /// Current draft, or `null` when the dialog is closed
    #[wasm_bindgen(js_name = getNotesDraft)]
    pub fn get_notes_draft(&self) -> Result<JsValue, JsValue> {
        match self.state.borrow().notes().draft() {
            Some(draft) => to_js(draft),
            None => Ok(JsValue::NULL),
        }
    }

    #[wasm_bindgen(js_name = cancelNotes)]
    pub fn cancel_notes(&self) {
        self.state.borrow_mut().cancel_notes();
    }

    /// Save the open draft. The dialog closes only when the backend accepts.
    #[wasm_bindgen(js_name = saveNotes)]
    pub async fn save_notes(&self) -> Result<(), JsValue> {
        let begun = self.state.borrow_mut().begin_notes_save();
        let pending = begun.map_err(|e| self.reject(e))?;

        let result = self.service.update(&pending.patch).await;
        let failed = result.is_err();
        let notification = self.state.borrow_mut().finish_notes_save(pending, result);
        self.notify(&notification);
        if failed {
            return Err(js_err(notification.message));
        }
        Ok(())
    }
}
