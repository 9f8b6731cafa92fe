//! Self-contained upload widget for pages without the server template.
//!
//! Renders the same four parts the template provides (drop region, hidden
//! file input, preview grid, status list) and drives them with the same
//! handlers as [`crate::bindings`].

use leptos::*;
use web_sys::{DragEvent, Event, MouseEvent};

use crate::bindings::{on_browse_requested, on_drag_enter, on_drag_leave, on_drop, on_files_chosen};
use crate::components::{PreviewGrid, StatusList};
use crate::config::{DROP_REGION_ID, HIGHLIGHT_CLASSES, PREVIEW_CONTAINER_ID, STATUS_CONTAINER_ID};
use crate::services::HttpUploader;
use crate::widget::{BrowserSpawner, UploadWidget, WidgetState};
use crate::{DragState, WidgetConfig};

const REGION_CLASS: &str = "border-2 border-dashed border-muted rounded-2xl p-10 text-center cursor-pointer transition";

#[component]
pub fn DropZone(
    /// Endpoint and token; defaults to `/upload/` without a token.
    #[prop(optional)]
    config: Option<WidgetConfig>,
) -> impl IntoView {
    let widget = UploadWidget::new(
        WidgetState::new(),
        HttpUploader::new(config.unwrap_or_default()),
        BrowserSpawner,
    );
    let state = widget.state();
    let input_ref = create_node_ref::<html::Input>();

    let region_class = move || {
        if state.drag.get() == DragState::DraggingOver {
            format!("{} {}", REGION_CLASS, HIGHLIGHT_CLASSES.join(" "))
        } else {
            REGION_CLASS.to_string()
        }
    };

    let on_click = move |_: MouseEvent| {
        if let Some(input) = input_ref.get() {
            on_browse_requested(&input);
        }
    };
    let on_enter = {
        let widget = widget.clone();
        move |ev: DragEvent| on_drag_enter(&widget, &ev)
    };
    let on_over = {
        let widget = widget.clone();
        move |ev: DragEvent| on_drag_enter(&widget, &ev)
    };
    let on_leave = {
        let widget = widget.clone();
        move |ev: DragEvent| on_drag_leave(&widget, &ev)
    };
    let on_dropped = {
        let widget = widget.clone();
        move |ev: DragEvent| on_drop(&widget, &ev)
    };
    let on_change = move |_: Event| {
        if let Some(input) = input_ref.get() {
            on_files_chosen(&widget, &input);
        }
    };

    view! {
        <div class="upload-widget">
            <div
                id=DROP_REGION_ID
                class=region_class
                on:click=on_click
                on:dragenter=on_enter
                on:dragover=on_over
                on:dragleave=on_leave
                on:drop=on_dropped
            >
                <div class="text-4xl">"📤"</div>
                <p>"Drop photos, videos or documents here"</p>
                <p class="text-sm opacity-70">"or click to browse"</p>
            </div>
            <input type="file" multiple=true style="display:none" node_ref=input_ref on:change=on_change/>
            <div id=PREVIEW_CONTAINER_ID class="grid grid-cols-2 md:grid-cols-4 gap-4 mt-6">
                <PreviewGrid previews=state.previews/>
            </div>
            <div id=STATUS_CONTAINER_ID class="mt-4 space-y-1">
                <StatusList statuses=state.statuses/>
            </div>
        </div>
    }
}
