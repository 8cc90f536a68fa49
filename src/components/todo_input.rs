//! Todo Input Component
//!
//! Text entry for new items. Enter adds; the field clears only when the
//! item was accepted.

use leptos::prelude::*;

use crate::context::AppContext;

#[component]
pub fn TodoInput() -> impl IntoView {
    let ctx = use_context::<AppContext>().expect("AppContext should be provided");

    let (new_text, set_new_text) = signal(String::new());

    let on_keyup = move |ev: web_sys::KeyboardEvent| {
        // Ignore the Enter that commits an IME composition
        if ev.key() != "Enter" || ev.is_composing() {
            return;
        }
        if ctx.add(new_text.get_untracked()) {
            set_new_text.set(String::new());
        }
    };

    view! {
        <input
            type="text"
            class="todo-input"
            placeholder="What needs doing today?"
            autofocus=true
            prop:value=move || new_text.get()
            on:input=move |ev| set_new_text.set(event_target_value(&ev))
            on:keyup=on_keyup
        />
    }
}
