//! Platform adapter error types.

/// Specific conditions a platform adapter can fail with.
///
/// The retryability of each variant is fixed by [`AdapterErrorKind::is_retryable`]
/// rather than left to call sites, so every adapter classifies errors the
/// same way regardless of which remote API raised them.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum AdapterErrorKind {
    /// Credentials are missing, malformed, or incomplete for this platform.
    #[display("platform not available: {}", _0)]
    Unavailable(String),
    /// The remote rejected the request with a rate-limit response.
    #[display("rate limited, retry after {:?}s", _0)]
    RateLimited(Option<u64>),
    /// A connection could not be established or was reset mid-request.
    #[display("connection error: {}", _0)]
    Connection(String),
    /// The request timed out waiting for a response.
    #[display("request timed out: {}", _0)]
    Timeout(String),
    /// The remote returned a 5xx server error.
    #[display("remote server error ({}): {}", status, message)]
    ServerError {
        /// HTTP status code reported by the remote.
        status: u16,
        /// Message body or reason phrase.
        message: String,
    },
    /// The remote returned a 4xx error other than rate limiting.
    #[display("remote rejected request ({}): {}", status, message)]
    RemoteRejected {
        /// HTTP status code reported by the remote.
        status: u16,
        /// Message body or reason phrase.
        message: String,
    },
    /// The remote's response could not be parsed into the expected shape.
    #[display("invalid response from remote: {}", _0)]
    InvalidResponse(String),
    /// Media container processing (Instagram/Mastodon/Threads) reported an
    /// error status instead of becoming ready.
    #[display("media processing failed: {}", _0)]
    MediaProcessingFailed(String),
    /// Media container processing did not become ready within the 60s
    /// polling deadline.
    #[display("media processing timed out after 60s")]
    MediaProcessingTimeout,
    /// Credential verification failed against the remote's auth endpoint.
    #[display("authentication failed: {}", _0)]
    Authentication(String),
}

impl AdapterErrorKind {
    /// Whether the same request might succeed later without changing inputs.
    ///
    /// Mirrors the taxonomy: rate limits, connection resets, timeouts, and
    /// 5xx responses are retryable; everything else consumes a retry slot
    /// without being eligible for automatic retry semantics beyond that.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            AdapterErrorKind::RateLimited(_)
                | AdapterErrorKind::Connection(_)
                | AdapterErrorKind::Timeout(_)
                | AdapterErrorKind::ServerError { .. }
        )
    }

    /// A stable, short error code suitable for `PublishAttempt.errorCode`.
    pub fn code(&self) -> &'static str {
        match self {
            AdapterErrorKind::Unavailable(_) => "PLATFORM_UNAVAILABLE",
            AdapterErrorKind::RateLimited(_) => "RATE_LIMITED",
            AdapterErrorKind::Connection(_) => "CONNECTION_ERROR",
            AdapterErrorKind::Timeout(_) => "TIMEOUT",
            AdapterErrorKind::ServerError { .. } => "SERVER_ERROR",
            AdapterErrorKind::RemoteRejected { .. } => "REMOTE_REJECTED",
            AdapterErrorKind::InvalidResponse(_) => "INVALID_RESPONSE",
            AdapterErrorKind::MediaProcessingFailed(_) => "MEDIA_PROCESSING_FAILED",
            AdapterErrorKind::MediaProcessingTimeout => "MEDIA_PROCESSING_TIMEOUT",
            AdapterErrorKind::Authentication(_) => "AUTHENTICATION_FAILED",
        }
    }
}

/// Adapter error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Adapter Error: {} at line {} in {}", kind, line, file)]
pub struct AdapterError {
    kind: AdapterErrorKind,
    line: u32,
    file: &'static str,
}

impl AdapterError {
    /// Create a new adapter error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: AdapterErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &AdapterErrorKind {
        &self.kind
    }

    /// Whether this error is retryable (delegates to the kind).
    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for AdapterError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        let kind = if err.is_timeout() {
            AdapterErrorKind::Timeout(err.to_string())
        } else if err.is_connect() {
            AdapterErrorKind::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            if status.as_u16() == 429 {
                AdapterErrorKind::RateLimited(None)
            } else if status.is_server_error() {
                AdapterErrorKind::ServerError {
                    status: status.as_u16(),
                    message: err.to_string(),
                }
            } else {
                AdapterErrorKind::RemoteRejected {
                    status: status.as_u16(),
                    message: err.to_string(),
                }
            }
        } else {
            AdapterErrorKind::Connection(err.to_string())
        };
        AdapterError::new(kind)
    }
}
