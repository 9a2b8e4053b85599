//! Error types for the booking frame lifecycle.
//!
//! Strongly-typed errors for the different layers: lifecycle errors returned
//! to the caller ([`FrameError`]), load failures surfaced to the user
//! ([`LoadFailure`]), and internal errors that are recovered without ever
//! reaching the user ([`GatewayError`], [`FallbackError`]).

use std::time::Duration;

use thiserror::Error;

use crate::state::Status;

/// Errors returned by lifecycle operations.
///
/// None of these are fatal: a failed operation leaves the session exactly as
/// it was, and the session can always be closed cleanly afterwards.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FrameError {
    /// Booking URL is not an absolute http(s) URL
    #[error("invalid booking url {url:?}: {reason}")]
    InvalidBookingUrl {
        /// URL as supplied by the caller
        url: String,
        /// Why it was rejected
        reason: String,
    },

    /// Operation not allowed in the current status
    #[error("invalid state transition: cannot {operation} from {status:?}")]
    InvalidTransition {
        /// Status when the operation was attempted
        status: Status,
        /// Operation that was attempted
        operation: &'static str,
    },

    /// Retry attempted while connectivity is still down
    #[error("cannot retry while offline")]
    StillOffline,

    /// Operation attempted after the session was closed
    #[error("session already closed")]
    SessionClosed,

    /// Configuration rejected by [`crate::FrameConfig::validate`]
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl FrameError {
    /// Returns true if the same operation may succeed later in this session.
    ///
    /// Only a retry blocked by connectivity qualifies: once the platform
    /// reports online again the retry goes through. Everything else is a
    /// caller mistake.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::StillOffline)
    }
}

/// Why a frame load ended in the error state.
///
/// Both variants render as the same error view; the distinction only exists
/// for logging and for deciding whether a late load may still recover.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadFailure {
    /// Load watchdog expired before the frame reported an outcome
    #[error("load timed out after {elapsed:?}")]
    Timeout {
        /// How long the frame was loading
        elapsed: Duration,
    },

    /// Frame reported a load failure
    #[error("frame reported a load failure")]
    FrameReported,
}

/// Reasons a cross-origin message was discarded.
///
/// Never surfaced: the gateway turns these into a silent
/// [`crate::gateway::Verdict`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Origin is not the trusted booking provider
    #[error("untrusted origin")]
    UntrustedOrigin,

    /// Payload is not a JSON object with a string `type`
    #[error("malformed payload: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for GatewayError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

/// Why the fallback navigator fell back to direct navigation.
///
/// Recovered internally; only logged.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FallbackError {
    /// Platform refused to open a new browsing context
    #[error("popup blocked")]
    Blocked,

    /// Opening the new browsing context raised an error
    #[error("popup attempt failed: {0}")]
    Threw(String),

    /// Popup was gone when checked after the grace period
    #[error("popup not confirmed within {grace:?}")]
    Unconfirmed {
        /// Grace period that elapsed
        grace: Duration,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_offline_retry_is_transient() {
        assert!(FrameError::StillOffline.is_transient());
        assert!(!FrameError::SessionClosed.is_transient());
        assert!(
            !FrameError::InvalidTransition { status: Status::Ready, operation: "retry" }
                .is_transient()
        );
        assert!(
            !FrameError::InvalidBookingUrl { url: "x".into(), reason: "relative".into() }
                .is_transient()
        );
    }

    #[test]
    fn load_failures_display() {
        let timeout = LoadFailure::Timeout { elapsed: Duration::from_secs(15) };
        assert_eq!(timeout.to_string(), "load timed out after 15s");
        assert_eq!(LoadFailure::FrameReported.to_string(), "frame reported a load failure");
    }

    #[test]
    fn json_errors_become_malformed() {
        let Err(err) = serde_json::from_str::<serde_json::Value>("{") else {
            unreachable!("truncated object must not parse");
        };
        assert!(matches!(GatewayError::from(err), GatewayError::Malformed(_)));
    }
}
