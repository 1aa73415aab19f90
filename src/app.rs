//! Shopping List Frontend App
//!
//! Main application component: family gate, header, add form and the
//! category sections.

use leptos::prelude::*;
use reactive_stores::Store;

use crate::components::{AddItemForm, CategorySection, ErrorBanner, ShoppingHeader};
use crate::context::AppContext;
use crate::grouping::group_by_category;
use crate::remote;
use crate::store::{AppState, AppStateStoreFields};

/// What the page can show right now
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Phase {
    ResolvingFamily,
    NoFamily,
    Loading,
    Ready,
}

#[component]
pub fn App() -> impl IntoView {
    let store = Store::new(AppState::new());
    provide_context(store);

    let ctx = AppContext::new(remote::connect());
    ctx.bind_store(store);
    provide_context(ctx);
    ctx.start();
    on_cleanup(move || ctx.stop());

    let phase = Memo::new(move |_| {
        if store.family_loading().get() {
            Phase::ResolvingFamily
        } else if store.family().read().is_none() {
            Phase::NoFamily
        } else if store.items_loading().get() || store.categories_loading().get() {
            Phase::Loading
        } else {
            Phase::Ready
        }
    });
    let groups = Memo::new(move |_| group_by_category(&store.items().get(), &store.categories().get()));
    let item_error = Signal::derive(move || store.error().get());
    let category_error = Signal::derive(move || store.category_error().get());
    let retry_categories = Callback::new(move |_: ()| ctx.refetch_categories());

    view! {
        <main class="shopping-app">
            {move || match phase.get() {
                Phase::ResolvingFamily => {
                    view! { <p class="status-message">"Loading family..."</p> }.into_any()
                }
                Phase::NoFamily => {
                    view! {
                        <div class="status-message no-family">
                            <p class="status-title">"No family found"</p>
                            <p class="status-hint">"Please check your database configuration."</p>
                        </div>
                    }.into_any()
                }
                Phase::Loading => {
                    view! {
                        <div class="loading-skeleton">
                            <div class="skeleton-title"></div>
                            <div class="skeleton-row"></div>
                            <div class="skeleton-row"></div>
                            <div class="skeleton-row"></div>
                        </div>
                    }.into_any()
                }
                Phase::Ready => {
                    view! {
                        <ErrorBanner error=item_error />
                        <ErrorBanner error=category_error on_retry=retry_categories />
                        <ShoppingHeader />
                        <AddItemForm />
                        <Show
                            when=move || !groups.get().is_empty()
                            fallback=|| view! {
                                <div class="empty-state">
                                    <div class="empty-icon">"🛒"</div>
                                    <p class="status-title">"Your shopping list is empty"</p>
                                    <p class="status-hint">"Add items to get started"</p>
                                </div>
                            }
                        >
                            <div class="category-sections">
                                <For
                                    each=move || groups.get()
                                    key=|group| group.key()
                                    children=move |group| {
                                        let key = group.key();
                                        let current = Memo::new(move |_| {
                                            groups.get().into_iter().find(|g| g.key() == key)
                                        });
                                        view! { <CategorySection group=current /> }
                                    }
                                />
                            </div>
                        </Show>
                    }.into_any()
                }
            }}
        </main>
    }
}
