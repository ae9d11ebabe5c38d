//! Scheduler loop error types.

/// Conditions the scheduler loop can fail with.
///
/// These are process-level failures, distinct from the per-target errors
/// the publisher already converts into `PublishAttempt` rows — a
/// `SchedulerErrorKind::PublishPassFailed` is the catastrophic branch: an
/// uncaught exception escaping the publisher for one claimed post.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum SchedulerErrorKind {
    /// `claimDuePosts` itself failed; no posts were claimed this tick.
    #[display("failed to claim due posts: {}", _0)]
    ClaimFailed(String),
    /// A publish pass for a claimed post escaped with an uncaught error.
    #[display("publish pass failed for post {}: {}", post_id, reason)]
    PublishPassFailed {
        /// The post that was being published.
        post_id: String,
        /// The error that escaped the publisher.
        reason: String,
    },
}

/// Scheduler error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Scheduler Error: {} at line {} in {}", kind, line, file)]
pub struct SchedulerError {
    kind: SchedulerErrorKind,
    line: u32,
    file: &'static str,
}

impl SchedulerError {
    /// Create a new scheduler error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: SchedulerErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &SchedulerErrorKind {
        &self.kind
    }
}
