//! Error types for kodama.

use thiserror::Error;

/// Common error type for kodama.
#[derive(Error, Debug)]
pub enum KodamaError {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for loaded data or client input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// A guarded resource could not be acquired within the configured bound.
    ///
    /// Only produced when a lock timeout is configured; otherwise acquisition
    /// waits until the previous holder releases.
    #[error("timed out after {waited_ms}ms waiting for lock on {key}")]
    LockTimeout { key: String, waited_ms: u64 },

    /// A trigger referenced a script id that is not registered.
    #[error("unknown script: {0}")]
    UnknownScript(String),

    /// The connection already has a live script session.
    #[error("connection {0} already has an active script session")]
    SessionBusy(u64),

    /// The configured number of live script sessions is reached.
    #[error("script session limit reached ({0})")]
    SessionLimit(usize),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for KodamaError {
    fn from(e: serde_json::Error) -> Self {
        KodamaError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for KodamaError {
    fn from(e: toml::de::Error) -> Self {
        KodamaError::Serialization(e.to_string())
    }
}

/// Result type alias for kodama operations.
pub type Result<T> = std::result::Result<T, KodamaError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error_display() {
        let err = KodamaError::NotFound("character 7".to_string());
        assert_eq!(err.to_string(), "character 7 not found");
    }

    #[test]
    fn test_lock_timeout_display() {
        let err = KodamaError::LockTimeout {
            key: "character 42".to_string(),
            waited_ms: 250,
        };
        assert_eq!(
            err.to_string(),
            "timed out after 250ms waiting for lock on character 42"
        );
    }

    #[test]
    fn test_unknown_script_display() {
        let err = KodamaError::UnknownScript("q9999s".to_string());
        assert_eq!(err.to_string(), "unknown script: q9999s");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: KodamaError = io_err.into();
        assert!(matches!(err, KodamaError::Io(_)));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err: KodamaError = json_err.into();
        assert!(matches!(err, KodamaError::Serialization(_)));
    }

    #[test]
    fn test_result_alias() {
        fn sample_ok() -> Result<i32> {
            Ok(42)
        }

        fn sample_err() -> Result<i32> {
            Err(KodamaError::SessionBusy(3))
        }

        assert_eq!(sample_ok().unwrap(), 42);
        assert!(sample_err().is_err());
    }
}
