//! Controller side-effects and intents.
//!
//! This module defines the [`FrameAction`] enum, which represents instructions
//! produced by the [`crate::FrameController`] for the driver to execute.

use std::time::Duration;

use url::Url;

use crate::{booking::FrameSpec, gateway::BookingSignal, timer::TimerKind};

/// Platform notifications a session listens to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Listener {
    /// Online/offline notifications.
    Connectivity,
    /// Cross-origin messages.
    Message,
    /// Viewport resize.
    Resize,
    /// Orientation change.
    Orientation,
}

impl Listener {
    /// Every listener a session attaches on open.
    pub const ALL: [Self; 4] = [Self::Connectivity, Self::Message, Self::Resize, Self::Orientation];
}

/// Actions produced by the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameAction {
    /// Render the current [`crate::RenderState`].
    Render,

    /// Mount the frame, replacing any mounted frame.
    MountFrame(FrameSpec),

    /// Unmount the frame.
    UnmountFrame,

    /// Apply this height (pixels) to the overlay container and frame.
    ApplyHeight(u32),

    /// A timer was armed. Drivers backed by platform timers call
    /// [`crate::FrameController::tick`] once it is due.
    ArmTimer {
        /// Which timer.
        timer: TimerKind,
        /// Delay until it is due.
        after: Duration,
    },

    /// A timer was cancelled before it fired.
    CancelTimer(TimerKind),

    /// Attach a platform listener.
    Subscribe(Listener),

    /// Detach a platform listener.
    Unsubscribe(Listener),

    /// The booking provider reported a signal. Observational only.
    Observe(BookingSignal),

    /// Open the booking outside the frame.
    OpenExternally {
        /// Booking destination.
        url: Url,
    },

    /// Session closed. Emitted exactly once per session.
    Closed,
}
