use std::{
    cell::RefCell,
    collections::VecDeque,
};

use super::{Diagnostic, DiagnosticKind};

/// Somewhere diagnostics end up once the panel is ready
pub trait DiagnosticSink {
    fn deliver(&self, diagnostic: &Diagnostic);
}

impl<F: Fn(&Diagnostic)> DiagnosticSink for F {
    fn deliver(&self, diagnostic: &Diagnostic) {
        self(diagnostic)
    }
}

enum MirrorState {
    Buffering(Vec<Diagnostic>),
    Live(Box<dyn DiagnosticSink>),
}

impl MirrorState {
    fn accept(&mut self, diagnostic: Diagnostic) {
        match self {
            Self::Buffering(queue) => queue.push(diagnostic),
            Self::Live(sink) => sink.deliver(&diagnostic),
        }
    }
}

/// Buffers diagnostics until a sink is attached, then forwards them live
///
/// Each diagnostic is delivered exactly once and in the order it was recorded
pub struct DiagnosticMirror {
    state: RefCell<MirrorState>,
    // Records made while a sink is delivering, replayed right after it returns
    deferred: RefCell<VecDeque<Diagnostic>>,
}

impl Default for DiagnosticMirror {
    fn default() -> Self {
        Self::new()
    }
}

impl DiagnosticMirror {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(MirrorState::Buffering(Vec::new())),
            deferred: RefCell::new(VecDeque::new()),
        }
    }

    pub fn record(&self, diagnostic: Diagnostic) {
        match self.state.try_borrow_mut() {
            Ok(mut state) => state.accept(diagnostic),
            Err(_) => {
                self.deferred.borrow_mut().push_back(diagnostic);
                return;
            }
        }
        self.replay_deferred();
    }

    /// Flushes the buffer into `sink` and forwards everything after live
    ///
    /// Returns how many buffered diagnostics were flushed. Attaching again
    /// replaces the sink
    pub fn attach(&self, sink: Box<dyn DiagnosticSink>) -> usize {
        let flushed = {
            let mut state = self.state.borrow_mut();
            let pending = match std::mem::replace(&mut *state, MirrorState::Live(sink)) {
                MirrorState::Buffering(queue) => queue,
                MirrorState::Live(_) => Vec::new(),
            };

            if let MirrorState::Live(sink) = &*state {
                for diagnostic in pending.iter() {
                    sink.deliver(diagnostic);
                }
            }
            pending.len()
        };

        self.replay_deferred();
        flushed
    }

    pub fn is_live(&self) -> bool {
        matches!(&*self.state.borrow(), MirrorState::Live(_))
    }

    /// Number of diagnostics waiting for a sink
    pub fn pending(&self) -> usize {
        match &*self.state.borrow() {
            MirrorState::Buffering(queue) => queue.len(),
            MirrorState::Live(_) => 0,
        }
    }

    fn replay_deferred(&self) {
        loop {
            let Some(next) = self.deferred.borrow_mut().pop_front() else {
                break;
            };
            self.record(next);
        }
    }

    pub fn log<S: Into<String>>(&self, text: S) {
        self.record(Diagnostic::new(DiagnosticKind::Log, text));
    }

    pub fn error<S: Into<String>>(&self, text: S) {
        self.record(Diagnostic::new(DiagnosticKind::Error, text));
    }

    pub fn uncaught_error(&self, message: &str, filename: &str, line: u32) {
        self.error(format!("{message} at {filename}:{line}"));
    }

    pub fn unhandled_rejection(&self, reason: &str) {
        self.error(format!("Unhandled Promise Rejection: {reason}"));
    }
}

thread_local! {
    static MIRROR: DiagnosticMirror = DiagnosticMirror::new();
}

/// Runs `f` with the mirror of the current thread
pub fn with_mirror<R, F: FnOnce(&DiagnosticMirror) -> R>(f: F) -> R {
    MIRROR.with(f)
}

#[cfg(test)]
mod test {
    use std::rc::Rc;

    use super::*;

    fn collector() -> (Rc<RefCell<Vec<Diagnostic>>>, Box<dyn DiagnosticSink>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink_seen = seen.clone();
        let sink = Box::new(move |d: &Diagnostic| sink_seen.borrow_mut().push(d.clone()));
        (seen, sink)
    }

    #[test]
    fn buffered_then_live_in_order() {
        let mirror = DiagnosticMirror::new();
        mirror.log("first");
        mirror.uncaught_error("boom", "app.js", 12);
        mirror.unhandled_rejection("nope");
        assert_eq!(mirror.pending(), 3);

        let (seen, sink) = collector();
        assert_eq!(mirror.attach(sink), 3);
        assert!(mirror.is_live());
        assert_eq!(mirror.pending(), 0);

        mirror.log("after ready");
        mirror.error("late failure");

        let texts: Vec<_> = seen.borrow().iter().map(|d| d.to_string()).collect();
        assert_eq!(texts, vec![
            "[log] first",
            "[error] boom at app.js:12",
            "[error] Unhandled Promise Rejection: nope",
            "[log] after ready",
            "[error] late failure",
        ]);
    }

    #[test]
    fn reattach_does_not_replay() {
        let mirror = DiagnosticMirror::new();
        mirror.log("once");

        let (first, sink) = collector();
        mirror.attach(sink);
        let (second, sink) = collector();
        assert_eq!(mirror.attach(sink), 0);
        mirror.log("twice");

        assert_eq!(first.borrow().len(), 1);
        assert_eq!(second.borrow().len(), 1);
        assert_eq!(second.borrow()[0].text, "twice");
    }

    #[test]
    fn records_from_inside_a_sink_keep_their_place() {
        let mirror = Rc::new(DiagnosticMirror::new());
        mirror.log("a");
        mirror.log("b");

        let seen = Rc::new(RefCell::new(Vec::new()));
        let (sink_seen, sink_mirror) = (seen.clone(), Rc::downgrade(&mirror));
        mirror.attach(Box::new(move |d: &Diagnostic| {
            sink_seen.borrow_mut().push(d.text.clone());
            if d.text == "a" {
                if let Some(mirror) = sink_mirror.upgrade() {
                    mirror.log("echo of a");
                }
            }
        }));
        mirror.log("c");

        assert_eq!(*seen.borrow(), vec!["a", "b", "echo of a", "c"]);
    }
}
