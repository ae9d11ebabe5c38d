//! Publish pipeline error types.

/// Conditions that can escape the per-target pipeline as a catastrophic
/// (programmer-error) failure rather than being captured in a
/// `PublishAttempt`.
///
/// Everything expected — validation failures, platform-unavailable,
/// retryable/non-retryable remote errors — is caught and recorded per
/// target inside the pipeline; only failures in the Store itself, or a
/// reduction invariant violation, reach this type.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum PublishErrorKind {
    /// A Store call failed while the pipeline was running.
    #[display("store failure during publish pass: {}", _0)]
    StoreFailure(String),
    /// A target carried an unexpected `publishing` status after the pass
    /// finished; the post-status reduction does not define a post status
    /// for this and the post is left in `publishing` for the next tick.
    #[display("target {} still publishing after pass", _0)]
    StuckPublishing(String),
}

/// Publish pipeline error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Publish Error: {} at line {} in {}", kind, line, file)]
pub struct PublishError {
    kind: PublishErrorKind,
    line: u32,
    file: &'static str,
}

impl PublishError {
    /// Create a new publish error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: PublishErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &PublishErrorKind {
        &self.kind
    }
}
