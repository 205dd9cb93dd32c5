use leptos::{component, view, IntoView};

use crate::components::ResetButton;

#[component]
pub fn Settings() -> impl IntoView {
    view! {
        <h2>"Settings"</h2>
        <p>"Something stuck? Resetting removes the cached app and fetches it fresh."</p>
        <ResetButton/>
    }
}
