use leptos::{component, create_node_ref, html, view, IntoView, NodeRef};
use shared::diagnostics::{with_mirror, PanelMessage};
use tracing::{info, warn};

use crate::utils::panel::{post_to_panel, PanelSink, PANEL_SRCDOC};

/// Console overlay in an isolated frame
///
/// Everything recorded before the frame loads is flushed into it on load
#[component]
pub fn DiagnosticPanel() -> impl IntoView {
    let frame: NodeRef<html::Iframe> = create_node_ref();

    let on_load = move |_| {
        let Some(window) = frame.get_untracked().and_then(|f| f.content_window()) else {
            warn!("Diagnostic panel loaded without a window");
            return;
        };

        let flushed = with_mirror(|m| m.attach(Box::new(PanelSink::new(window))));
        info!(flushed, "✅ Custom console ready (capturing logs, errors, rejections, network).");
    };

    let clear = move |_| {
        if let Some(window) = frame.get_untracked().and_then(|f| f.content_window()) {
            post_to_panel(&window, &PanelMessage::Clear);
        }
    };

    view! {
        <section class="console">
            <button class="console-clear" on:click=clear>"Clear"</button>
            <iframe
                id="consoleFrame"
                title="Console"
                srcdoc=PANEL_SRCDOC
                node_ref=frame
                on:load=on_load
            />
        </section>
    }
}
