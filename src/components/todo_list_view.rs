//! Todo List View Component
//!
//! Rebuilds every row from the current list whenever it changes.

use leptos::prelude::*;

use crate::components::TodoRow;
use crate::context::AppContext;

#[component]
pub fn TodoListView() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    view! {
        <ul id="todolist" class="todo-list">
            {move || {
                ctx.rows()
                    .into_iter()
                    .map(|row| view! { <TodoRow row=row /> })
                    .collect_view()
            }}
        </ul>
    }
}
