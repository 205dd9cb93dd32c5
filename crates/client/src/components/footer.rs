use leptos::{component, view, IntoView};

use crate::components::OnlineCheck;

#[component]
pub fn Footer() -> impl IntoView {
    let build = option_env!("BUILD_TIME").map(|v| format!(" ({v})")).unwrap_or_default();

    view! {
        <footer class="footer">
            <OnlineCheck/>
            <small>{ format!("v{}{build}", env!("CARGO_PKG_VERSION")) }</small>
        </footer>
    }
}
