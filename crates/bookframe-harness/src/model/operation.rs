//! Operations for model-based testing.
//!
//! Operations represent everything that can happen to a session. They are
//! generated randomly and applied to both the model and the real controller.

use arbitrary::Arbitrary;

/// Operations that can be applied to a session.
///
/// Operations are small and composable so the generator can explore
/// interesting interleavings of platform events, user intents, and time.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum Operation {
    /// The mounted frame finished loading.
    FrameLoaded,

    /// The mounted frame reported a load failure.
    FrameFailed,

    /// An outcome arrives from a frame that is no longer mounted.
    StaleOutcome {
        /// Load success if true, failure otherwise.
        loaded: bool,
    },

    /// Connectivity lost.
    GoOffline,

    /// Connectivity restored.
    GoOnline,

    /// User pressed retry.
    Retry,

    /// Advance time.
    ///
    /// Fires the load watchdog and resize debounce when due.
    AdvanceTime {
        /// Milliseconds to advance.
        millis: u16,
    },

    /// Viewport resized or rotated.
    Resize {
        /// New width in pixels.
        width: u16,
        /// New height in pixels.
        height: u16,
    },

    /// Cross-origin message arrived.
    Message {
        /// Whether the origin is the booking provider.
        trusted: bool,
        /// Payload shape.
        kind: MessageKind,
    },

    /// User closed the overlay.
    Close,

    /// User chose to open the booking externally.
    OpenExternally,
}

/// Message payload shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Arbitrary)]
pub enum MessageKind {
    /// `{"type":"booking_complete"}`
    BookingComplete,
    /// `{"type":"navigation","url":...}`
    Navigation,
    /// Object with a type nobody handles.
    Unknown,
    /// Not JSON at all.
    Garbage,
}

impl MessageKind {
    /// Whether the provider would report this as a booking signal.
    pub fn is_signal(self) -> bool {
        matches!(self, Self::BookingComplete | Self::Navigation)
    }

    /// Raw string payload for this shape.
    pub fn payload(self) -> &'static str {
        match self {
            Self::BookingComplete => r#"{"type":"booking_complete"}"#,
            Self::Navigation => r#"{"type":"navigation","url":"https://www.bokadirekt.se/step/2"}"#,
            Self::Unknown => r#"{"type":"resize","height":900}"#,
            Self::Garbage => "<<not json>>",
        }
    }
}

/// Result of applying an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult {
    /// Operation accepted (possibly with no effect).
    Ok,
    /// Operation rejected.
    Error(OperationError),
}

impl OperationResult {
    /// Whether the operation was accepted.
    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok)
    }
}

/// Why a retry was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationError {
    /// Session already closed.
    Closed,
    /// Status is not error or offline.
    NotRetryable,
    /// Connectivity still down.
    StillOffline,
}

#[cfg(test)]
mod tests {
    use arbitrary::Unstructured;

    use super::*;

    #[test]
    fn operations_generate_from_raw_bytes() {
        let bytes: Vec<u8> = (0..=255).collect();
        let mut u = Unstructured::new(&bytes);

        let ops: Vec<Operation> =
            std::iter::from_fn(|| Operation::arbitrary(&mut u).ok()).take(20).collect();

        assert!(!ops.is_empty());
    }

    #[test]
    fn only_provider_events_are_signals() {
        assert!(MessageKind::BookingComplete.is_signal());
        assert!(MessageKind::Navigation.is_signal());
        assert!(!MessageKind::Unknown.is_signal());
        assert!(!MessageKind::Garbage.is_signal());
    }
}
