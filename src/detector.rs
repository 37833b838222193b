use mailparse::ParsedMail;
use serde::{Deserialize, Serialize};

/// Severity of a recognized non-delivery report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureClass {
    /// Delivery will not succeed on retry; the recipient has bounced.
    Permanent,
    /// The remote MTA reports a transient delay and intends further attempts.
    Delayed,
}

/// Outcome of running a single detector against a message.
///
/// `Recognized` with an empty address list is meaningful: it says "this is
/// definitively a report of this format, stop trying other detectors", even
/// though no recipient addresses could be extracted. Detectors that are only
/// guessing from body text return `NotRecognized` in that situation instead,
/// so weaker heuristics further down the chain still get a look.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DetectorResult {
    NotRecognized,
    Recognized {
        class: FailureClass,
        addresses: Vec<String>,
    },
}

impl DetectorResult {
    /// A recognized permanent failure. Addresses are deduplicated
    /// case-insensitively, preserving first-seen order.
    pub fn permanent(addresses: Vec<String>) -> Self {
        DetectorResult::Recognized {
            class: FailureClass::Permanent,
            addresses: crate::address::dedup(addresses),
        }
    }

    /// A recognized delayed-delivery (warning) report.
    pub fn delayed(addresses: Vec<String>) -> Self {
        DetectorResult::Recognized {
            class: FailureClass::Delayed,
            addresses: crate::address::dedup(addresses),
        }
    }

    /// Format recognized, no addresses extracted.
    pub fn recognized_empty(class: FailureClass) -> Self {
        DetectorResult::Recognized {
            class,
            addresses: Vec::new(),
        }
    }

    pub fn is_recognized(&self) -> bool {
        matches!(self, DetectorResult::Recognized { .. })
    }

    pub fn class(&self) -> Option<FailureClass> {
        match self {
            DetectorResult::NotRecognized => None,
            DetectorResult::Recognized { class, .. } => Some(*class),
        }
    }

    pub fn addresses(&self) -> &[String] {
        match self {
            DetectorResult::NotRecognized => &[],
            DetectorResult::Recognized { addresses, .. } => addresses,
        }
    }
}

/// A detector is a pure function over a parsed message. It must not panic on
/// malformed input; anything it cannot make sense of is `NotRecognized`.
pub type DetectorFn = fn(&ParsedMail) -> DetectorResult;
