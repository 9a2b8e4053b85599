//! Observable session state.
//!
//! [`Status`] is the single lifecycle status of a session. [`RenderState`] is
//! the view model handed to the presentation layer, which renders it as a pure
//! function without reaching back into the controller.

use crate::{booking::FrameSpec, error::LoadFailure};

/// Lifecycle status. Exactly one holds at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Frame is loading; the load watchdog is armed.
    Loading,
    /// Frame reported a successful load.
    Ready,
    /// Frame failed to load or the watchdog expired.
    Error(LoadFailure),
    /// Connectivity dropped. Frame is unmounted until an explicit retry.
    Offline {
        /// Status the drop interrupted.
        interrupted: Interrupted,
    },
}

/// Status a connectivity drop interrupted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Interrupted {
    /// A load was in flight.
    Loading,
    /// The form was showing.
    Ready,
    /// The session was already in the error state.
    Error(LoadFailure),
}

impl Status {
    /// True while the load watchdog must be armed.
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    /// True for the statuses a retry may leave.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Error(_) | Self::Offline { .. })
    }

    /// Short lowercase name, as used in logs and timelines.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Loading => "loading",
            Self::Ready => "ready",
            Self::Error(_) => "error",
            Self::Offline { .. } => "offline",
        }
    }

    pub(crate) fn interrupted(self) -> Interrupted {
        match self {
            Self::Loading => Interrupted::Loading,
            Self::Ready => Interrupted::Ready,
            Self::Error(failure) => Interrupted::Error(failure),
            Self::Offline { interrupted } => interrupted,
        }
    }
}

/// Overlay drawn on top of the frame area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Overlay {
    /// Nothing; the frame is visible.
    None,
    /// Loading indicator; the frame loads hidden underneath.
    Loading,
    /// Connectivity notice. Retry stays disabled until connectivity is back.
    Offline,
    /// Connectivity is back but the interrupted frame is gone; offers retry.
    Reconnected,
    /// Load error with retry, open-externally, and support contact.
    Error {
        /// What went wrong, for logging.
        failure: LoadFailure,
        /// Human support contact, if configured.
        support_contact: Option<String>,
    },
}

/// View model for the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderState {
    /// Service being booked.
    pub service_name: String,
    /// Current lifecycle status.
    pub status: Status,
    /// Connectivity indicator.
    pub online: bool,
    /// Mounted frame. `None` while suppressed.
    pub frame: Option<FrameSpec>,
    /// Whether the mounted frame should be visible.
    pub frame_visible: bool,
    /// Overlay to draw.
    pub overlay: Overlay,
    /// Height applied to the container and frame, in pixels.
    pub height: Option<u32>,
}
