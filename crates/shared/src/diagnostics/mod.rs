//! Diagnostic mirror
//!
//! Log lines, uncaught errors and failed network calls observed in the page are
//! collected here and forwarded to the debug panel. Until the panel is ready
//! they are buffered in arrival order.

use std::fmt::Display;

use serde::{Deserialize, Serialize};

mod layer;
pub use layer::*;

mod mirror;
pub use mirror::*;

mod network;
pub use network::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticKind {
    Log,
    Info,
    Warn,
    Error,
    Network,
}

impl DiagnosticKind {
    pub const fn as_str(&self) -> &'static str {
        use DiagnosticKind::*;
        match self {
            Log => "log",
            Info => "info",
            Warn => "warn",
            Error => "error",
            Network => "network",
        }
    }
}

impl Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub text: String,
}

impl Diagnostic {
    pub fn new<S: Into<String>>(kind: DiagnosticKind, text: S) -> Self {
        Self { kind, text: text.into() }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.kind, self.text)
    }
}

/// Everything the page sends to the panel frame
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelMessage {
    Entry(Diagnostic),
    Clear,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn panel_message_wire_format() {
        let entry = PanelMessage::Entry(Diagnostic::new(DiagnosticKind::Warn, "low battery"));
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            serde_json::json!({ "type": "entry", "kind": "warn", "text": "low battery" })
        );
        assert_eq!(
            serde_json::to_value(PanelMessage::Clear).unwrap(),
            serde_json::json!({ "type": "clear" })
        );
    }
}
