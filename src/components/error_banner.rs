//! Error Banner Component

use leptos::prelude::*;

/// Inline banner with the latest error; renders nothing when there is none.
/// With `on_retry` it also offers a retry button.
#[component]
pub fn ErrorBanner(
    #[prop(into)] error: Signal<Option<String>>,
    #[prop(optional, into)] on_retry: Option<Callback<()>>,
) -> impl IntoView {
    move || {
        error.get().map(|message| {
            view! {
                <div class="error-banner" role="alert">
                    <span class="error-message">{message}</span>
                    {on_retry.map(|retry| view! {
                        <button class="retry-btn" on:click=move |_| retry.run(())>"Retry"</button>
                    })}
                </div>
            }
        })
    }
}
