//! Add Item Form Component
//!
//! Collapsed "Add item..." button that expands into title, quantity and
//! category inputs. The category stays selected for quick consecutive adds.

use leptos::html;
use leptos::prelude::*;

use crate::context::AppContext;
use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn AddItemForm() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let store = use_app_store();

    let (expanded, set_expanded) = signal(false);
    let (title, set_title) = signal(String::new());
    let (quantity, set_quantity) = signal(String::new());
    let (category_id, set_category_id) = signal(String::new());
    let title_input = NodeRef::<html::Input>::new();

    // Focus the title when the form opens
    Effect::new(move |_| {
        if expanded.get() {
            if let Some(input) = title_input.get() {
                let _ = input.focus();
            }
        }
    });

    let reset = move || {
        set_title.set(String::new());
        set_quantity.set(String::new());
    };
    let close = move || {
        set_expanded.set(false);
        reset();
    };

    let on_submit = move |ev: web_sys::SubmitEvent| {
        ev.prevent_default();
        let text = title.get().trim().to_string();
        if text.is_empty() {
            return;
        }
        let category = Some(category_id.get()).filter(|c| !c.is_empty());
        let qty = Some(quantity.get().trim().to_string()).filter(|q| !q.is_empty());
        ctx.add_item(text, category, qty);
        reset();
    };

    view! {
        <div class="add-item">
            <Show
                when=move || expanded.get()
                fallback=move || view! {
                    <button class="add-item-collapsed" on:click=move |_| set_expanded.set(true)>
                        <span class="add-icon">"+"</span>
                        <span>"Add item..."</span>
                    </button>
                }
            >
                <form
                    class="add-item-form"
                    on:submit=on_submit
                    on:keydown=move |ev: web_sys::KeyboardEvent| {
                        if ev.key() == "Escape" {
                            close();
                        }
                    }
                >
                    <div class="add-item-row">
                        <span class="add-icon">"+"</span>
                        <input
                            type="text"
                            node_ref=title_input
                            placeholder="What do you need?"
                            prop:value=move || title.get()
                            on:input=move |ev| set_title.set(event_target_value(&ev))
                        />
                    </div>
                    <div class="add-item-details">
                        <input
                            type="text"
                            class="quantity-input"
                            placeholder="Qty"
                            prop:value=move || quantity.get()
                            on:input=move |ev| set_quantity.set(event_target_value(&ev))
                        />
                        <select
                            class="category-select"
                            prop:value=move || category_id.get()
                            on:change=move |ev| set_category_id.set(event_target_value(&ev))
                        >
                            <option value="">"No category"</option>
                            {move || {
                                store
                                    .categories()
                                    .get()
                                    .into_iter()
                                    .map(|category| {
                                        let label = match &category.icon {
                                            Some(icon) => format!("{} {}", icon, category.name),
                                            None => category.name.clone(),
                                        };
                                        view! { <option value=category.id.clone()>{label}</option> }
                                    })
                                    .collect_view()
                            }}
                        </select>
                        <button type="button" class="cancel-btn" on:click=move |_| close()>
                            "Cancel"
                        </button>
                        <button
                            type="submit"
                            class="submit-btn"
                            disabled=move || title.get().trim().is_empty()
                        >
                            "Add"
                        </button>
                    </div>
                </form>
            </Show>
        </div>
    }
}
