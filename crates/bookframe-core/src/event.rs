//! Controller input events.
//!
//! This module defines [`FrameEvent`], the set of inputs that drive the
//! [`crate::FrameController`] state machine.
//!
//! Events originate from three distinct sources:
//! - Platform notifications (connectivity, viewport, cross-origin messages).
//! - The embedded frame itself (load success or failure).
//! - User interactions with the overlay ([`UserIntent`]).

use crate::gateway::InboundMessage;

/// Events processed by the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    /// Platform connectivity changed.
    ConnectivityChanged {
        /// New connectivity.
        online: bool,
    },

    /// Frame finished loading.
    FrameLoaded {
        /// Attempt of the frame that loaded.
        attempt: u64,
    },

    /// Frame reported a load failure.
    FrameFailed {
        /// Attempt of the frame that failed.
        attempt: u64,
    },

    /// Viewport resized (includes on-screen keyboard show/hide).
    ViewportResized {
        /// Viewport width in pixels.
        width: u32,
        /// Viewport height in pixels.
        height: u32,
    },

    /// Device orientation changed.
    OrientationChanged {
        /// Viewport width in pixels.
        width: u32,
        /// Viewport height in pixels.
        height: u32,
    },

    /// Cross-origin message received.
    Message(InboundMessage),

    /// User interaction.
    User(UserIntent),
}

/// Actions the user can take on the overlay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserIntent {
    /// Reload the frame with a fresh cache-bust value.
    Retry,
    /// Close the overlay.
    Close,
    /// Leave the embedded experience and open the booking externally.
    OpenExternally,
}
