//! Configuration error types.

/// Conditions configuration loading can fail with.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ConfigErrorKind {
    /// The configuration file could not be read.
    #[display("could not read config file: {}", _0)]
    Io(String),
    /// The configuration file did not parse as valid TOML.
    #[display("could not parse config: {}", _0)]
    Parse(String),
    /// A required environment variable was missing.
    #[display("missing environment variable: {}", _0)]
    MissingEnv(String),
}

/// Configuration error with source location tracking.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Config Error: {} at line {} in {}", kind, line, file)]
pub struct ConfigError {
    kind: ConfigErrorKind,
    line: u32,
    file: &'static str,
}

impl ConfigError {
    /// Create a new config error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: ConfigErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// The classified error kind.
    pub fn kind(&self) -> &ConfigErrorKind {
        &self.kind
    }
}

impl From<std::io::Error> for ConfigError {
    #[track_caller]
    fn from(err: std::io::Error) -> Self {
        ConfigError::new(ConfigErrorKind::Io(err.to_string()))
    }
}

impl From<toml::de::Error> for ConfigError {
    #[track_caller]
    fn from(err: toml::de::Error) -> Self {
        ConfigError::new(ConfigErrorKind::Parse(err.to_string()))
    }
}
