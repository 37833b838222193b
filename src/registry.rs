//! Ordered detector registry and the dispatch loop.
//!
//! Recognition order is contractual, not accidental: structural formats run
//! before header-gated vendor formats, delayed-delivery warnings run before
//! the generic permanent heuristics, and the weakest heuristic runs last.
//! The first detector to produce anything other than `NotRecognized` ends
//! the dispatch.

use crate::address;
use crate::detector::{DetectorFn, DetectorResult, FailureClass};
use crate::{detectors, dsn};
use anyhow::{bail, Result};
use mailparse::ParsedMail;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Instant;

pub struct DetectorEntry {
    pub name: String,
    pub priority: i32,
    pub detect: DetectorFn,
}

/// Receives the outcome of a dispatch, exactly once per message. `None`
/// means no detector recognized the format.
pub trait RecipientSink {
    fn deliver(&mut self, class: Option<FailureClass>, addresses: &[String]);
}

impl<F: FnMut(Option<FailureClass>, &[String])> RecipientSink for F {
    fn deliver(&mut self, class: Option<FailureClass>, addresses: &[String]) {
        self(class, addresses)
    }
}

pub struct Registry {
    entries: Vec<DetectorEntry>,
}

impl Registry {
    pub fn new() -> Self {
        Registry {
            entries: Vec::new(),
        }
    }

    /// The full built-in detector set in its contractual order.
    pub fn builtin() -> Self {
        let mut registry = Registry::new();
        let install: &[(&str, i32, DetectorFn)] = &[
            ("dsn", 10, dsn::detect),
            ("x-failed-recipients", 20, detectors::exim::detect),
            ("exchange", 30, detectors::exchange::detect),
            ("groupwise", 31, detectors::groupwise::detect),
            ("smtp32", 32, detectors::smtp32::detect),
            ("yahoo", 33, detectors::yahoo::detect),
            ("aol", 34, detectors::aol::detect),
            ("sina", 35, detectors::sina::detect),
            ("yale", 36, detectors::yale::detect),
            ("compuserve", 37, detectors::compuserve::detect),
            ("microsoft", 38, detectors::microsoft::detect),
            ("netscape", 39, detectors::netscape::detect),
            ("simple-warning", 50, detectors::simple::detect_warning),
            ("simple-match", 60, detectors::simple::detect_match),
            ("llnl", 70, detectors::llnl::detect),
        ];
        for (name, priority, detect) in install {
            registry
                .register(name, *priority, *detect)
                .expect("builtin names are unique");
        }
        registry
    }

    /// Install a detector. Lower priorities run first; among equal
    /// priorities, registration order holds. Names must be unique.
    pub fn register(&mut self, name: &str, priority: i32, detect: DetectorFn) -> Result<()> {
        if self.entries.iter().any(|e| e.name == name) {
            bail!("detector '{name}' is already registered");
        }
        self.entries.push(DetectorEntry {
            name: name.to_string(),
            priority,
            detect,
        });
        // stable sort keeps registration order within a priority
        self.entries.sort_by_key(|e| e.priority);
        Ok(())
    }

    /// Remove a detector by name. Returns whether it was present.
    pub fn unregister(&mut self, name: &str) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.name != name);
        self.entries.len() != before
    }

    /// Installed detectors in invocation order.
    pub fn detectors(&self) -> impl Iterator<Item = &DetectorEntry> {
        self.entries.iter()
    }

    /// Run the detectors against one message. Deterministic in the input;
    /// the returned addresses are deduplicated case-insensitively in
    /// first-seen order.
    pub fn dispatch(&self, msg: &ParsedMail) -> DetectorResult {
        self.dispatch_inner(msg, None)
    }

    /// As `dispatch`, but gives up between detectors once `deadline` has
    /// passed, reporting the message as unrecognized.
    pub fn dispatch_with_deadline(&self, msg: &ParsedMail, deadline: Instant) -> DetectorResult {
        self.dispatch_inner(msg, Some(deadline))
    }

    /// Dispatch and hand the outcome to the sink. The sink is called
    /// exactly once, with `None` when nothing matched.
    pub fn dispatch_to(&self, msg: &ParsedMail, sink: &mut dyn RecipientSink) -> DetectorResult {
        let result = self.dispatch(msg);
        match &result {
            DetectorResult::NotRecognized => sink.deliver(None, &[]),
            DetectorResult::Recognized { class, addresses } => {
                sink.deliver(Some(*class), addresses)
            }
        }
        result
    }

    fn dispatch_inner(&self, msg: &ParsedMail, deadline: Option<Instant>) -> DetectorResult {
        for entry in &self.entries {
            if let Some(deadline) = deadline {
                if Instant::now() >= deadline {
                    log::debug!("dispatch deadline reached before '{}'", entry.name);
                    return DetectorResult::NotRecognized;
                }
            }
            // A broken recognizer must not take the whole dispatch down.
            let outcome = match catch_unwind(AssertUnwindSafe(|| (entry.detect)(msg))) {
                Ok(outcome) => outcome,
                Err(_) => {
                    log::warn!("detector '{}' panicked; treating as no match", entry.name);
                    continue;
                }
            };
            match outcome {
                DetectorResult::NotRecognized => continue,
                DetectorResult::Recognized { class, addresses } => {
                    log::debug!(
                        "'{}' recognized a {:?} report, {} address(es)",
                        entry.name,
                        class,
                        addresses.len()
                    );
                    return DetectorResult::Recognized {
                        class,
                        addresses: address::dedup(addresses),
                    };
                }
            }
        }
        DetectorResult::NotRecognized
    }
}

impl Default for Registry {
    fn default() -> Self {
        Registry::builtin()
    }
}
