//! Todo Row Component
//!
//! One list row. Clicking the row toggles it; the delete icon removes it.

use leptos::prelude::*;

use crate::context::AppContext;
use crate::list::Row;

#[component]
pub fn TodoRow(row: Row) -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let id = row.id;

    view! {
        <li
            class=if row.done { "done" } else { "" }
            on:click=move |_| ctx.toggle(id)
        >
            {row.label}
            <div class="options">
                <i
                    class="icon icon-delete"
                    data-index=row.index.to_string()
                    on:click=move |ev| {
                        // Keep the row's toggle from firing too
                        ev.stop_propagation();
                        ctx.delete(id);
                    }
                ></i>
            </div>
        </li>
    }
}
