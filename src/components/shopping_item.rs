//! Shopping Item Component
//!
//! One row: tap to toggle, quantity, who added it, and delete.

use leptos::prelude::*;
use shopping_sync::domain::ShoppingItemWithRelations;

use super::DeleteConfirmButton;
use crate::context::AppContext;

#[component]
pub fn ShoppingItemRow(item: ShoppingItemWithRelations) -> impl IntoView {
    let ctx = expect_context::<AppContext>();

    let id = item.item.id.clone();
    let completed = item.item.is_completed;
    let quantity = item.item.quantity.clone().map(|q| match &item.item.unit {
        Some(unit) => format!("({} {})", q, unit),
        None => format!("({})", q),
    });
    let added_by = item.added_by_user.clone().map(|member| {
        let style = format!("background-color: {}20;", member.color_primary);
        let title = format!("Added by {}", member.display_name);
        view! {
            <span class="added-by" style=style title=title>
                {member.badge().to_string()}
            </span>
        }
    });

    let toggle_id = id.clone();
    let on_delete = Callback::new(move |_| ctx.delete_item(id.clone()));

    view! {
        <div
            class=if completed { "shopping-item completed" } else { "shopping-item" }
            class:pending=item.item.is_provisional()
            on:click=move |_| ctx.toggle_item(toggle_id.clone(), completed)
        >
            <span class=if completed { "check checked" } else { "check" }>
                {completed.then_some("✓")}
            </span>
            <span class="item-title">{item.item.title.clone()}</span>
            {quantity.map(|q| view! { <span class="item-quantity">{q}</span> })}
            {added_by}
            <DeleteConfirmButton label="Delete item" on_confirm=on_delete />
        </div>
    }
}
