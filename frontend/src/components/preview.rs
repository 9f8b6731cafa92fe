//! Thumbnail cards for the current batch.

use leptos::*;

use crate::{MediaKind, PreviewEntry};

const CARD_CLASS: &str = "relative rounded-xl overflow-hidden aspect-square bg-muted/20";
const MEDIA_CLASS: &str = "w-full h-full object-cover";
const GLYPH_CLASS: &str = "w-full h-full flex-center text-4xl";
const CAPTION_CLASS: &str = "absolute bottom-0 left-0 right-0 bg-black/50 text-white text-sm p-2 truncate";

/// One card per file, in selection order.
#[component]
pub fn PreviewGrid(#[prop(into)] previews: Signal<Vec<PreviewEntry>>) -> impl IntoView {
    view! {
        <For
            each=move || previews.get()
            key=|entry: &PreviewEntry| entry.key()
            children=move |entry: PreviewEntry| view! { <PreviewCard entry=entry/> }
        />
    }
}

/// Image, muted video or document glyph, with the file name as caption.
#[component]
pub fn PreviewCard(entry: PreviewEntry) -> impl IntoView {
    let src = entry.src();
    let name = entry.name.clone();

    let media = match entry.kind {
        MediaKind::Image => view! { <img src=src class=MEDIA_CLASS alt=name.clone()/> }.into_view(),
        MediaKind::Video => view! { <video src=src class=MEDIA_CLASS prop:muted=true></video> }.into_view(),
        MediaKind::Document => view! { <div class=GLYPH_CLASS>"📄"</div> }.into_view(),
    };

    view! {
        <div class=CARD_CLASS>
            {media}
            <p class=CAPTION_CLASS title=name.clone()>{name}</p>
        </div>
    }
}
