//! Mediadrop - drag-and-drop multi-file upload widget.
//!
//! A WebAssembly widget that lets a user drop or pick files, shows a
//! thumbnail per file and uploads each file on its own to the gallery's
//! upload endpoint, reporting one status line per file.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  bindings (server template)  │  components::DropZone (Leptos) │
//! ├──────────────────────────────────────────────────────────────┤
//! │  widget::UploadWidget                                         │
//! │  ├── handle_file_batch → previews (sync)                      │
//! │  └── one task per file → services::Uploader → status line     │
//! ├──────────────────────────────────────────────────────────────┤
//! │  components::{PreviewGrid, StatusList} render WidgetState      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`] - files, previews, statuses, errors
//! - [`widget`] - batch orchestration
//! - [`bindings`] - wiring to a server-rendered page
//! - [`components`] - Leptos views
//! - [`services`] - HTTP upload and object URLs

use leptos::*;
use leptos_meta::{provide_meta_context, Title};
use leptos_router::*;
use wasm_bindgen::prelude::*;

// =============================================================================
// Module declarations
// =============================================================================

pub mod config;
pub mod types;
pub mod widget;
pub mod bindings;
pub mod components;
pub mod services;

// =============================================================================
// Re-exports
// =============================================================================

// Configuration
pub use config::{WidgetConfig, WidgetOverrides};

// Types
pub use types::{
    // Files
    MediaKind, SelectedFile,
    // Previews
    PreviewEntry,
    // Statuses
    StatusEntry, StatusKind, UploadOutcome,
    // API
    UploadResponse,
    // Drag
    DragState,
    // Errors
    AppError, AppResult, js_error_message,
};

// Widget
pub use widget::{build_preview, BrowserSpawner, UploadTask, UploadWidget, WidgetState};
pub use bindings::{initialize, initialize_from_document, PageWidget, WidgetHandles};

// Components
pub use components::*;

// =============================================================================
// Application Entry Points
// =============================================================================

/// WASM entry point - runs when the module is loaded.
///
/// Binds to the server template when the page has one (unless the drop
/// region asks for manual initialization), otherwise mounts [`App`].
#[wasm_bindgen(start)]
pub fn main() {
    // Setup panic hook for better error messages
    console_error_panic_hook::set_once();

    // Setup console logging
    _ = console_log::init_with_level(log::Level::Debug);

    log::info!("🦀 Mediadrop - starting upload widget");

    if !WidgetHandles::present() {
        mount_to_body(|| view! { <App/> });
        return;
    }

    let manual = gloo_utils::document()
        .get_element_by_id(config::DROP_REGION_ID)
        .map(|region| region.has_attribute(config::MANUAL_INIT_ATTRIBUTE))
        .unwrap_or(false);
    if manual {
        log::info!("Waiting for initUploadWidget()");
        return;
    }

    if let Err(e) = initialize_from_document() {
        log::error!("❌ Could not bind upload widget: {}", e);
    }
}

/// Bind to the page's template with explicit options.
///
/// `options` may be `undefined` or any subset of
/// `{ uploadUrl, csrfToken, csrfField }`; missing fields come from the
/// template's upload form.
#[wasm_bindgen(js_name = initUploadWidget)]
pub fn init_upload_widget(options: JsValue) -> Result<(), JsValue> {
    let to_js = |e: AppError| JsValue::from_str(&e.to_string());

    let overrides = WidgetOverrides::from_js(options).map_err(to_js)?;
    let handles = WidgetHandles::from_document().map_err(to_js)?;
    let config = handles.template_config().merge(overrides);
    initialize(handles, config).map(|_| ()).map_err(to_js)
}

#[component]
pub fn App() -> impl IntoView {
    provide_meta_context();

    view! {
        <Title text="Upload media"/>
        <Router>
            <main>
                <Routes>
                    <Route path="/" view=UploadPage/>
                </Routes>
            </main>
        </Router>
    }
}

#[component]
fn UploadPage() -> impl IntoView {
    view! {
        <div class="container">
            <h1>"Upload media"</h1>
            <DropZone/>
        </div>
    }
}
