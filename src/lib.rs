pub mod address;
pub mod detector;
pub mod detectors;
pub mod dsn;
pub mod message;
pub mod registry;

// Re-export the types most callers need
pub use detector::{DetectorFn, DetectorResult, FailureClass};
pub use message::MessageExt;
pub use registry::{DetectorEntry, RecipientSink, Registry};
