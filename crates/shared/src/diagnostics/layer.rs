use std::fmt::Debug;

use tracing::{
    field::{Field, Visit},
    Event, Level, Subscriber,
};
use tracing_subscriber::{layer::Context, Layer};

use super::{with_mirror, Diagnostic, DiagnosticKind, NetworkFailure};

/// Target of events that describe failed network calls
pub const NETWORK_TARGET: &str = "diagnostics::network";

/// Logs a failed network call so it reaches the console and the panel
pub fn report_network_failure(failure: &NetworkFailure) {
    tracing::warn!(target: NETWORK_TARGET, "{failure}");
}

/// Maps an event onto a panel category, `None` for levels the panel ignores
pub fn kind_for(level: &Level, target: &str) -> Option<DiagnosticKind> {
    if target == NETWORK_TARGET {
        return Some(DiagnosticKind::Network);
    }

    match *level {
        Level::ERROR => Some(DiagnosticKind::Error),
        Level::WARN => Some(DiagnosticKind::Warn),
        Level::INFO => Some(DiagnosticKind::Info),
        Level::DEBUG => Some(DiagnosticKind::Log),
        _ => None,
    }
}

#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl MessageVisitor {
    fn finish(mut self) -> String {
        for field in self.fields {
            if !self.message.is_empty() {
                self.message.push(' ');
            }
            self.message.push_str(&field);
        }
        self.message
    }
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }
}

/// Forwards tracing events into the thread's [super::DiagnosticMirror]
///
/// Sits next to the console layer, so events are still printed as usual
#[derive(Debug, Clone, Copy, Default)]
pub struct MirrorLayer;

impl<S: Subscriber> Layer<S> for MirrorLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        let Some(kind) = kind_for(metadata.level(), metadata.target()) else {
            return;
        };

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        with_mirror(|mirror| mirror.record(Diagnostic::new(kind, visitor.finish())));
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, rc::Rc};

    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[test]
    fn events_reach_the_mirror() {
        let subscriber = tracing_subscriber::registry().with(MirrorLayer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Service Worker Registered");
            tracing::trace!("too quiet for the panel");
            report_network_failure(&NetworkFailure::FetchStatus {
                url: "/api/ping".to_string(),
                status: 503,
                status_text: "Service Unavailable".to_string(),
            });
            tracing::error!(scope = "/", "Registration failed");
        });

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = seen.clone();
        with_mirror(|mirror| {
            mirror.attach(Box::new(move |d: &Diagnostic| sink_seen.borrow_mut().push(d.clone())))
        });

        assert_eq!(*seen.borrow(), vec![
            Diagnostic::new(DiagnosticKind::Info, "Service Worker Registered"),
            Diagnostic::new(
                DiagnosticKind::Network,
                "Fetch failed: /api/ping → 503 Service Unavailable"
            ),
            Diagnostic::new(DiagnosticKind::Error, "Registration failed scope=/"),
        ]);
    }

    #[test]
    fn levels_map_to_kinds() {
        assert_eq!(kind_for(&Level::DEBUG, "client"), Some(DiagnosticKind::Log));
        assert_eq!(kind_for(&Level::WARN, "client"), Some(DiagnosticKind::Warn));
        assert_eq!(kind_for(&Level::TRACE, "client"), None);
        assert_eq!(kind_for(&Level::ERROR, NETWORK_TARGET), Some(DiagnosticKind::Network));
    }
}
