//! Errors that unwind a script body.

use thiserror::Error;

use crate::packet::ScriptMessageType;
use crate::KodamaError;

/// Reason a script stopped before returning normally.
///
/// Content scripts propagate these with `?`; the engine maps them onto the
/// session's final state.
#[derive(Error, Debug)]
pub enum ScriptError {
    /// The session was cancelled while suspended: connection closed,
    /// session invalidated, or the client ended the dialogue.
    #[error("script session cancelled")]
    Cancelled,

    /// No reply arrived within the configured reply timeout.
    #[error("timed out waiting for a client reply")]
    ReplyTimeout,

    #[error("expected a reply to {expected:?}, received {received}")]
    UnexpectedReply {
        expected: ScriptMessageType,
        received: &'static str,
    },

    #[error("menu selection {0} is not an offered option")]
    InvalidMenuOption(i32),

    #[error("number {value} outside {min}..={max}")]
    NumberOutOfRange { value: i32, min: i32, max: i32 },

    #[error(transparent)]
    Engine(#[from] KodamaError),
}

impl ScriptError {
    /// Whether the error is an ordinary end of the interaction rather than a
    /// fault worth a warning.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, ScriptError::Cancelled | ScriptError::ReplyTimeout)
    }
}

/// Result type for script bodies and script primitives.
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = ScriptError::UnexpectedReply {
            expected: ScriptMessageType::AskMenu,
            received: "yes_no",
        };
        assert_eq!(err.to_string(), "expected a reply to AskMenu, received yes_no");
        assert_eq!(
            ScriptError::from(KodamaError::NotFound("quest 1".into())).to_string(),
            "quest 1 not found"
        );
    }

    #[test]
    fn test_is_cancellation() {
        assert!(ScriptError::Cancelled.is_cancellation());
        assert!(ScriptError::ReplyTimeout.is_cancellation());
        assert!(!ScriptError::InvalidMenuOption(3).is_cancellation());
    }
}
