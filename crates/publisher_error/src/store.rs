//! Store error types.

/// Persistence error conditions.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum StoreErrorKind {
    /// Connection to the database failed.
    #[display("store connection error: {}", _0)]
    Connection(String),
    /// A query failed to execute.
    #[display("store query error: {}", _0)]
    Query(String),
    /// Serialization/deserialization of a stored value failed.
    #[display("store serialization error: {}", _0)]
    Serialization(String),
    /// The requested row does not exist.
    #[display("record not found")]
    NotFound,
    /// A conditional claim/update touched zero rows (lost a race, or the
    /// target row no longer satisfies the precondition).
    #[display("conditional update matched no rows")]
    NoRowsUpdated,
}

/// Store error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Store Error: {} at line {} in {}", kind, line, file)]
pub struct StoreError {
    kind: StoreErrorKind,
    line: u32,
    file: &'static str,
}

impl StoreError {
    /// Create a new store error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StoreErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &StoreErrorKind {
        &self.kind
    }
}

#[cfg(feature = "store")]
impl From<diesel::result::Error> for StoreError {
    #[track_caller]
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => StoreError::new(StoreErrorKind::NotFound),
            other => StoreError::new(StoreErrorKind::Query(other.to_string())),
        }
    }
}

#[cfg(feature = "store")]
impl From<diesel::ConnectionError> for StoreError {
    #[track_caller]
    fn from(err: diesel::ConnectionError) -> Self {
        StoreError::new(StoreErrorKind::Connection(err.to_string()))
    }
}

#[cfg(feature = "store")]
impl From<serde_json::Error> for StoreError {
    #[track_caller]
    fn from(err: serde_json::Error) -> Self {
        StoreError::new(StoreErrorKind::Serialization(err.to_string()))
    }
}
