use leptos::{component, view, IntoView};

#[component]
pub fn Home() -> impl IntoView {
    view! {
        <h2>"Home"</h2>
        <p>"This app keeps working offline. Everything it needs is cached on first load."</p>
    }
}
