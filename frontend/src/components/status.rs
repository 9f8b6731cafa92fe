//! Outcome lines, in arrival order.

use leptos::*;

use crate::StatusEntry;

#[component]
pub fn StatusList(#[prop(into)] statuses: Signal<Vec<StatusEntry>>) -> impl IntoView {
    view! {
        <For
            each=move || statuses.get()
            key=|entry: &StatusEntry| entry.id
            children=move |entry: StatusEntry| {
                view! {
                    <p class=entry.kind.css_class() title=entry.at.clone()>
                        {entry.message.clone()}
                    </p>
                }
            }
        />
    }
}
