//! UI Components
//!
//! Reusable Leptos components.

mod add_item_form;
mod category_section;
mod delete_confirm_button;
mod error_banner;
mod shopping_header;
mod shopping_item;

pub use add_item_form::AddItemForm;
pub use category_section::CategorySection;
pub use delete_confirm_button::DeleteConfirmButton;
pub use error_banner::ErrorBanner;
pub use shopping_header::ShoppingHeader;
pub use shopping_item::ShoppingItemRow;
