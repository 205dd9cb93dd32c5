use leptos::{component, view, IntoView, RwSignal, SignalGet, SignalSet};

use crate::components::{Debug, Home, Notifications, Settings};

macro_rules! tabs {
    ($(($id:literal, $view:ident, $ui_text:literal),)+) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq)]
        pub enum Tab {
            $(
                $view,
            )+
        }

        impl Tab {
            pub const ALL: &'static [Tab] = &[$(Tab::$view,)+];

            /// Id of the panel element the tab shows
            pub fn id(self) -> &'static str {
                match self {
                    $(
                        Self::$view => $id,
                    )+
                }
            }

            pub fn ui_text(self) -> &'static str {
                match self {
                    $(
                        Self::$view => $ui_text,
                    )+
                }
            }
        }

        #[component]
        pub fn TabBar(active: RwSignal<Tab>) -> impl IntoView {
            view! {
                <nav class="tab-bar">
                $(
                    <button
                        data-page=Tab::$view.id()
                        class:active=move || active.get() == Tab::$view
                        on:click=move |_| active.set(Tab::$view)
                    >
                        {Tab::$view.ui_text()}
                    </button>
                )+
                </nav>
            }
        }

        /// Every panel stays mounted, switching only toggles which is visible
        #[component]
        pub fn TabPanels(active: RwSignal<Tab>) -> impl IntoView {
            view! {
                $(
                    <section
                        id=Tab::$view.id()
                        class="page"
                        class:active=move || active.get() == Tab::$view
                    >
                        <$view/>
                    </section>
                )+
            }
        }
    };
    ($id:literal, $view:ident, $ui_text:literal) => {
        tabs!(($id, $view, $ui_text),);
    };
    (($id:literal, $view:ident, $ui_text:literal)) => {
        tabs!(($id, $view, $ui_text),);
    };
}

tabs!(
    ("home", Home, "Home"),
    ("notifications", Notifications, "Notifications"),
    ("settings", Settings, "Settings"),
    ("debug", Debug, "Debug"),
);

impl Default for Tab {
    fn default() -> Self {
        Self::ALL[0]
    }
}
