//! Binding the widget to a server-rendered template.
//!
//! The page owns four elements (drop region, upload form with its file
//! input, preview container, status container). [`initialize`] wires their
//! events to an [`UploadWidget`] and mounts the preview and status lists
//! into the containers.

use std::cell::Cell;

use leptos::*;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{DragEvent, Element, Event, EventTarget, FileList, HtmlElement, HtmlInputElement};

use crate::components::{PreviewGrid, StatusList};
use crate::config::*;
use crate::services::HttpUploader;
use crate::widget::{BrowserSpawner, UploadWidget, WidgetState};
use crate::{AppError, AppResult, DragState, SelectedFile, WidgetConfig};

/// Widget wired to the page's fetch and event loop.
pub type PageWidget = UploadWidget<HttpUploader, BrowserSpawner>;

thread_local! {
    static INITIALIZED: Cell<bool> = const { Cell::new(false) };
}

/// Template elements the widget binds to.
#[derive(Clone, Debug)]
pub struct WidgetHandles {
    pub drop_region: HtmlElement,
    pub file_input: HtmlInputElement,
    pub preview_container: HtmlElement,
    pub status_container: HtmlElement,
    /// Upload form, source of the endpoint and token when present.
    pub form: Option<Element>,
}

fn element_by_id<T: JsCast>(id: &str) -> AppResult<T> {
    gloo_utils::document()
        .get_element_by_id(id)
        .ok_or_else(|| AppError::Dom(format!("#{} not found", id)))?
        .dyn_into::<T>()
        .map_err(|_| AppError::Dom(format!("#{} has an unexpected element type", id)))
}

impl WidgetHandles {
    /// Look the elements up by their fixed ids.
    pub fn from_document() -> AppResult<Self> {
        let form: Element = element_by_id(UPLOAD_FORM_ID)?;
        let file_input = form
            .query_selector("input[type=\"file\"]")
            .map_err(|e| AppError::Dom(crate::js_error_message(&e)))?
            .ok_or_else(|| AppError::Dom(format!("#{} has no file input", UPLOAD_FORM_ID)))?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| AppError::Dom("file input is not an <input>".to_string()))?;

        Ok(Self {
            drop_region: element_by_id(DROP_REGION_ID)?,
            file_input,
            preview_container: element_by_id(PREVIEW_CONTAINER_ID)?,
            status_container: element_by_id(STATUS_CONTAINER_ID)?,
            form: Some(form),
        })
    }

    /// Endpoint and token as rendered into the upload form.
    pub fn template_config(&self) -> WidgetConfig {
        self.form.as_ref().map(WidgetConfig::from_form).unwrap_or_default()
    }

    /// Whether the page carries the upload template at all.
    pub fn present() -> bool {
        let document = gloo_utils::document();
        [DROP_REGION_ID, UPLOAD_FORM_ID, PREVIEW_CONTAINER_ID, STATUS_CONTAINER_ID]
            .iter()
            .all(|id| document.get_element_by_id(id).is_some())
    }
}

/// Convert a browser `FileList` into files, keeping its order.
pub fn files_from_list(files: Option<FileList>) -> Vec<SelectedFile> {
    let Some(files) = files else {
        return Vec::new();
    };
    (0..files.length())
        .filter_map(|i| files.get(i))
        .map(SelectedFile::from_file)
        .collect()
}

/// Click on the drop region: open the native file dialog.
pub fn on_browse_requested(file_input: &HtmlInputElement) {
    file_input.click();
}

/// Drag entering (or moving over) the region. The default must be
/// prevented or the browser refuses the drop.
pub fn on_drag_enter(widget: &PageWidget, event: &Event) {
    event.prevent_default();
    widget.set_dragging(true);
}

pub fn on_drag_leave(widget: &PageWidget, _event: &Event) {
    widget.set_dragging(false);
}

/// Files dropped on the region. Keeps the browser from opening them.
pub fn on_drop(widget: &PageWidget, event: &DragEvent) {
    event.prevent_default();

    let files = event.data_transfer().and_then(|transfer| transfer.files());
    widget.accept_drop(files_from_list(files));
}

/// Files picked in the dialog.
pub fn on_files_chosen(widget: &PageWidget, file_input: &HtmlInputElement) {
    widget.handle_file_batch(files_from_list(file_input.files()));
}

/// Exclusive right to bind the page.
///
/// Released again when dropped without [`InitClaim::commit`], so a page
/// whose binding failed half-way can retry.
#[must_use]
pub struct InitClaim {
    committed: bool,
}

impl InitClaim {
    pub fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for InitClaim {
    fn drop(&mut self) {
        if !self.committed {
            INITIALIZED.with(|flag| flag.set(false));
        }
    }
}

/// Take the page's single initialization slot.
pub fn claim_initialization() -> AppResult<InitClaim> {
    if INITIALIZED.with(|flag| flag.replace(true)) {
        return Err(AppError::AlreadyInitialized);
    }
    Ok(InitClaim { committed: false })
}

/// Listeners attached so far. Detached on drop unless kept.
#[derive(Default)]
struct Listeners {
    bound: Vec<(EventTarget, &'static str, Closure<dyn FnMut(Event)>)>,
}

impl Listeners {
    fn listen(&mut self, target: &EventTarget, event: &'static str, handler: impl FnMut(Event) + 'static) -> AppResult<()> {
        let closure = Closure::wrap(Box::new(handler) as Box<dyn FnMut(Event)>);
        target
            .add_event_listener_with_callback(event, closure.as_ref().unchecked_ref())
            .map_err(|e| AppError::Dom(format!("Failed to bind {}: {}", event, crate::js_error_message(&e))))?;
        self.bound.push((target.clone(), event, closure));
        Ok(())
    }

    /// Leave every listener attached for the page's lifetime.
    fn keep(mut self) {
        for (_, _, closure) in std::mem::take(&mut self.bound) {
            closure.forget();
        }
    }
}

impl Drop for Listeners {
    fn drop(&mut self) {
        for (target, event, closure) in self.bound.drain(..) {
            let _ = target.remove_event_listener_with_callback(event, closure.as_ref().unchecked_ref());
        }
    }
}

/// Bind every listener and mount the lists. Callable once per page.
pub fn initialize(handles: WidgetHandles, config: WidgetConfig) -> AppResult<PageWidget> {
    let claim = claim_initialization()?;

    let WidgetHandles {
        drop_region,
        file_input,
        preview_container,
        status_container,
        form: _,
    } = handles;

    file_input
        .set_attribute("multiple", "multiple")
        .map_err(|e| AppError::Dom(crate::js_error_message(&e)))?;

    let state = WidgetState::new();
    let widget = UploadWidget::new(state, HttpUploader::new(config), BrowserSpawner);
    let mut listeners = Listeners::default();

    {
        let file_input = file_input.clone();
        listeners.listen(&drop_region, "click", move |_| on_browse_requested(&file_input))?;
    }
    for event in ["dragenter", "dragover"] {
        let widget = widget.clone();
        listeners.listen(&drop_region, event, move |ev| on_drag_enter(&widget, &ev))?;
    }
    {
        let widget = widget.clone();
        listeners.listen(&drop_region, "dragleave", move |ev| on_drag_leave(&widget, &ev))?;
    }
    {
        let widget = widget.clone();
        listeners.listen(&drop_region, "drop", move |ev| {
            if let Some(drag) = ev.dyn_ref::<DragEvent>() {
                on_drop(&widget, drag);
            }
        })?;
    }
    {
        let widget = widget.clone();
        let input = file_input.clone();
        listeners.listen(&file_input, "change", move |_| on_files_chosen(&widget, &input))?;
    }

    // Highlight follows the drag state.
    let highlighted = drop_region.clone();
    create_effect(move |_| {
        let over = state.drag.get() == DragState::DraggingOver;
        let classes = highlighted.class_list();
        for class in HIGHLIGHT_CLASSES {
            if let Err(e) = classes.toggle_with_force(class, over) {
                log::warn!("Could not toggle {}: {}", class, crate::js_error_message(&e));
            }
        }
    });

    preview_container.set_inner_html("");
    status_container.set_inner_html("");
    mount_to(preview_container, move || view! { <PreviewGrid previews=state.previews/> });
    mount_to(status_container, move || view! { <StatusList statuses=state.statuses/> });

    listeners.keep();
    claim.commit();

    log::info!("📦 Upload widget bound to #{}", DROP_REGION_ID);
    Ok(widget)
}

/// Bind to the template using its own form for configuration.
pub fn initialize_from_document() -> AppResult<PageWidget> {
    let handles = WidgetHandles::from_document()?;
    let config = handles.template_config();
    initialize(handles, config)
}
