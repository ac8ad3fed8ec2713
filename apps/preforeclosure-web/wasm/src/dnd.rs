//! Drop zone and file input helpers
//!
//! The page wires these to `dragenter`/`dragover`/`dragleave`/`drop` on the
//! upload area and to `change` on the hidden file input. Only the first file
//! of a drop or selection is used.

use wasm_bindgen::prelude::*;
use web_sys::{DragEvent, Event, File, HtmlInputElement};

/// Stop the browser from opening the dragged file
#[wasm_bindgen(js_name = preventDragDefaults)]
pub fn prevent_drag_defaults(event: &Event) {
    event.prevent_default();
    event.stop_propagation();
}

/// True while the drag carries files, used to highlight the drop zone
#[wasm_bindgen(js_name = isFileDrag)]
pub fn is_file_drag(event: &DragEvent) -> bool {
    event
        .data_transfer()
        .map(|transfer| {
            transfer
                .types()
                .iter()
                .any(|kind| kind.as_string().as_deref() == Some("Files"))
        })
        .unwrap_or(false)
}

/// First file of a drop, if any
#[wasm_bindgen(js_name = droppedFile)]
pub fn dropped_file(event: &DragEvent) -> Option<File> {
    prevent_drag_defaults(event);
    event.data_transfer()?.files()?.get(0)
}

/// First file picked in a file input, if any
#[wasm_bindgen(js_name = selectedFile)]
pub fn selected_file(input: &HtmlInputElement) -> Option<File> {
    input.files()?.get(0)
}

/// Clear the input so the same file can be picked again
#[wasm_bindgen(js_name = clearFileInput)]
pub fn clear_file_input(input: &HtmlInputElement) {
    input.set_value("");
}
