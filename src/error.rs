//! Error types for the storage layer.

use std::fmt;

/// Errors produced by the storage layer.
///
/// Construction-time failures are fatal and always surfaced. Steady-state
/// failures on maintenance paths (`has_connection`, `add_tags`,
/// `remove_tags`) are converted to `false` plus a log entry instead of
/// propagating, so an unavailable cache does not take down the caller.
#[derive(Debug)]
pub enum Error {
    /// The single construction-time connection attempt failed. Not retried
    /// internally; the caller must recreate the component.
    ConnectionFailed(String),
    /// `add` was called for a key that already exists. The stored value is
    /// left untouched.
    AlreadyExists(String),
    /// A network or protocol failure in the middle of an operation.
    TransportError(String),
    /// Settings could not be parsed or resolved.
    ConfigError(String),
    /// A recognized compression envelope whose payload could not be
    /// inverted.
    CodecError(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::ConnectionFailed(msg) => write!(f, "Connection failed: {}", msg),
            Error::AlreadyExists(key) => write!(f, "Can't add key, already exists: {}", key),
            Error::TransportError(msg) => write!(f, "Transport error: {}", msg),
            Error::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            Error::CodecError(msg) => write!(f, "Codec error: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(feature = "redis")]
impl From<redis::RedisError> for Error {
    fn from(e: redis::RedisError) -> Self {
        Error::TransportError(e.to_string())
    }
}

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::AlreadyExists("sku:42".to_string());
        assert!(err.to_string().contains("sku:42"));

        let err = Error::ConnectionFailed("127.0.0.1:6379/0".to_string());
        assert!(err.to_string().contains("127.0.0.1:6379/0"));
    }

    #[test]
    fn test_error_is_std_error() {
        fn assert_error<E: std::error::Error>(_e: &E) {}
        assert_error(&Error::TransportError("boom".to_string()));
    }
}
