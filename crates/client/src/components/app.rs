use leptos::{component, create_rw_signal, view, IntoView};

use crate::{
    components::{DiagnosticPanel, Footer},
    Tab, TabBar, TabPanels,
};

#[component]
pub fn App() -> impl IntoView {
    let active = create_rw_signal(Tab::default());

    view! {
        <header>
            <h1>{ shared::NOTIFICATION_TITLE }</h1>
        </header>
        <main>
            <TabPanels active/>
            <DiagnosticPanel/>
        </main>
        <TabBar active/>
        <Footer/>
    }
}
