use gloo::console;
use shared::diagnostics::{Diagnostic, DiagnosticSink, PanelMessage};
use wasm_bindgen::JsValue;
use web_sys::Window;

/// Renders diagnostics posted to it. Kept self contained since it runs in an
/// isolated frame
pub const PANEL_SRCDOC: &str = r#"<style>
  body { background:#000; color:#0f0; font-family:monospace; margin:0; padding:5px; }
  #console { height:100%; overflow-y:auto; }
  .log { color:#0f0; }
  .warn { color:#ff0; }
  .error { color:#f55; white-space:pre-wrap; }
  .info { color:#0ff; }
  .network { color:#f0f; }
</style>
<div id="console"></div>
<script>
  window.addEventListener("message", e => {
    let message;
    try { message = JSON.parse(e.data); } catch (_) { return; }
    const log = document.getElementById("console");
    if (message.type === "clear") {
      log.replaceChildren();
      return;
    }
    if (message.type !== "entry") return;
    const el = document.createElement("div");
    el.className = message.kind;
    el.textContent = "[" + message.kind + "] " + message.text;
    log.appendChild(el);
    log.scrollTop = log.scrollHeight;
  });
</script>"#;

/// Posts a message to the panel frame
///
/// Failures go straight to the console. Going through tracing would feed them
/// back into the mirror
pub fn post_to_panel(frame: &Window, message: &PanelMessage) {
    let json = match serde_json::to_string(message) {
        Ok(json) => json,
        Err(e) => {
            console::error!(format!("Failed to serialize panel message: {e}"));
            return;
        }
    };

    if let Err(e) = frame.post_message(&JsValue::from_str(&json), "*") {
        console::error!("Failed to post to the diagnostic panel", e);
    }
}

/// Live sink for the diagnostic mirror once the frame has loaded
pub struct PanelSink {
    frame: Window,
}

impl PanelSink {
    pub fn new(frame: Window) -> Self {
        Self { frame }
    }
}

impl DiagnosticSink for PanelSink {
    fn deliver(&self, diagnostic: &Diagnostic) {
        post_to_panel(&self.frame, &PanelMessage::Entry(diagnostic.clone()))
    }
}
