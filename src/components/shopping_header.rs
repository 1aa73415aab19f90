//! Shopping Header Component
//!
//! Title, connection badge, counters and the clear-completed action.

use leptos::prelude::*;
use shopping_sync::domain::ShoppingStats;

use crate::context::AppContext;
use crate::store::{use_app_store, AppStateStoreFields};

#[component]
pub fn ShoppingHeader() -> impl IntoView {
    let ctx = expect_context::<AppContext>();
    let store = use_app_store();
    let stats = Memo::new(move |_| ShoppingStats::from_items(&store.items().read()));

    view! {
        <header class="shopping-header">
            <div class="header-title">
                <h1>"Shopping List"</h1>
                <Show when=move || !store.is_online().get()>
                    <span class="status-badge offline">
                        <span class="status-dot"></span>
                        "Offline"
                    </span>
                </Show>
                <Show when=move || store.is_online().get() && store.is_syncing().get()>
                    <span class="status-badge syncing">
                        <span class="spinner"></span>
                        "Syncing"
                    </span>
                </Show>
            </div>

            <div class="header-actions">
                <div class="stats">
                    <Show when=move || { stats.get().remaining > 0 }>
                        <span>
                            <span class="stat-remaining">{move || stats.get().remaining}</span>
                            " to get"
                        </span>
                    </Show>
                    <Show when=move || { stats.get().remaining > 0 && stats.get().completed > 0 }>
                        <span class="stat-separator">"·"</span>
                    </Show>
                    <Show when=move || { stats.get().completed > 0 }>
                        <span>
                            <span class="stat-completed">{move || stats.get().completed}</span>
                            " done"
                        </span>
                    </Show>
                </div>
                <Show when=move || { stats.get().completed > 0 }>
                    <button class="clear-completed-btn" on:click=move |_| ctx.clear_completed()>
                        "Clear completed"
                    </button>
                </Show>
            </div>
        </header>
    }
}
