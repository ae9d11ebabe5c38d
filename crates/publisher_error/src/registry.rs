//! Adapter registry error types.

/// Conditions the adapter registry can fail with.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum RegistryErrorKind {
    /// No factory is registered for the requested platform tag.
    #[display("unknown platform: {}", _0)]
    UnknownPlatform(String),
    /// Credentials are not configured for the requested platform.
    #[display("platform not configured: {}", _0)]
    NotConfigured(String),
    /// Stored credentials could not be parsed.
    #[display("invalid credentials for {}: {}", platform, reason)]
    InvalidCredentials {
        /// The platform tag.
        platform: String,
        /// Why parsing failed.
        reason: String,
    },
    /// A candidate credential set failed live verification against the
    /// remote and was not persisted.
    #[display("credential verification failed for {}: {}", platform, reason)]
    VerificationFailed {
        /// The platform tag.
        platform: String,
        /// Why verification failed.
        reason: String,
    },
}

/// Registry error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Registry Error: {} at line {} in {}", kind, line, file)]
pub struct RegistryError {
    kind: RegistryErrorKind,
    line: u32,
    file: &'static str,
}

impl RegistryError {
    /// Create a new registry error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: RegistryErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &RegistryErrorKind {
        &self.kind
    }
}
