//! Category Section Component
//!
//! Collapsible block of one category's items with open / done counters.

use leptos::prelude::*;

use super::ShoppingItemRow;
use crate::grouping::ItemGroup;

#[component]
pub fn CategorySection(group: Memo<Option<ItemGroup>>) -> impl IntoView {
    let (collapsed, set_collapsed) = signal(false);

    move || {
        group.get().map(|group| {
            let open = group.open_count();
            let done = group.completed_count();
            let (icon, name) = match &group.category {
                Some(category) => (category.icon_or_default().to_string(), category.name.clone()),
                None => ("📦".to_string(), "Uncategorized".to_string()),
            };
            let items = group.items;

            view! {
                <section class="category-section">
                    <button
                        class="category-header"
                        on:click=move |_| set_collapsed.update(|c| *c = !*c)
                    >
                        <span class=move || if collapsed.get() { "chevron" } else { "chevron open" }>"▶"</span>
                        <span class="category-icon">{icon}</span>
                        <span class="category-name">{name}</span>
                        <span class="category-counts">
                            {(open > 0).then(|| view! { <span class="count-open">{open}</span> })}
                            {(done > 0).then(|| view! {
                                <span class="count-done">
                                    {if open > 0 { " / " } else { "" }}
                                    <s>{done}</s>
                                </span>
                            })}
                        </span>
                    </button>
                    <Show when=move || !collapsed.get()>
                        <div class="category-items">
                            {items
                                .clone()
                                .into_iter()
                                .map(|item| view! { <ShoppingItemRow item=item /> })
                                .collect_view()}
                        </div>
                    </Show>
                </section>
            }
        })
    }
}
