//! Driver trait for abstracting platform operations.
//!
//! The [`Driver`] trait decouples the session runtime from a specific
//! platform. Each embedding implements the trait to provide frame mounting,
//! listeners, and navigation, while the generic [`crate::Runtime`] handles all
//! orchestration.

use std::{future::Future, time::Duration};

use bookframe_core::{BookingSignal, FrameEvent, FrameSpec, Listener, RenderState, TimerKind};
use url::Url;

use crate::HostPage;

/// Abstracts platform operations for the session runtime.
///
/// Implementations provide platform-specific effects while the generic
/// [`Runtime`](crate::Runtime) handles orchestration logic. This ensures
/// the same orchestration code runs in a browser embedding and in simulation.
///
/// # Implementations
///
/// - **Browser**: DOM listeners, an `iframe` element, `window.open`
/// - **Simulation**: scripted events on a virtual clock
///
/// Teardown methods (`unsubscribe`, `unmount_frame`, `cancel_timer`) are
/// infallible so a session can always close cleanly.
pub trait Driver: HostPage + Send {
    /// Platform-specific error type.
    type Error: std::error::Error + Send + 'static;

    /// Handle to a browsing context opened by [`Driver::open_popup`].
    type Popup: Send;

    /// Wait for the next platform event.
    ///
    /// Returns `None` once `timeout` elapses without an event. A `None`
    /// timeout waits indefinitely.
    fn poll_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> impl Future<Output = Result<Option<FrameEvent>, Self::Error>> + Send;

    /// Whether the platform currently reports connectivity.
    fn is_online(&self) -> bool;

    /// Viewport size (width, height) in pixels.
    fn viewport(&self) -> (u32, u32);

    /// Attach a platform listener.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform refuses the listener.
    fn subscribe(&mut self, listener: Listener) -> Result<(), Self::Error>;

    /// Detach a platform listener.
    fn unsubscribe(&mut self, listener: Listener);

    /// Mount the sandboxed frame, replacing any mounted one.
    ///
    /// # Errors
    ///
    /// Returns an error if the frame element cannot be created.
    fn mount_frame(&mut self, spec: &FrameSpec) -> Result<(), Self::Error>;

    /// Unmount the frame.
    fn unmount_frame(&mut self);

    /// Apply the available height to the overlay container and frame.
    fn apply_height(&mut self, height: u32);

    /// A controller timer was armed. Drivers that mirror timers on the
    /// platform may schedule a wake-up; the runtime already does.
    fn arm_timer(&mut self, timer: TimerKind, after: Duration) {
        tracing::trace!(?timer, ?after, "timer armed");
    }

    /// A controller timer was cancelled.
    fn cancel_timer(&mut self, timer: TimerKind) {
        tracing::trace!(?timer, "timer cancelled");
    }

    /// Render the session.
    ///
    /// # Errors
    ///
    /// Returns an error if rendering fails.
    fn render(&mut self, view: &RenderState) -> Result<(), Self::Error>;

    /// The booking provider reported a signal.
    fn observe(&mut self, signal: &BookingSignal) {
        tracing::info!(?signal, "booking signal");
    }

    /// Open `url` in a new top-level browsing context.
    ///
    /// Returns `None` if the platform blocked the attempt.
    ///
    /// # Errors
    ///
    /// Returns an error if the platform raised one. The runtime recovers by
    /// navigating directly.
    fn open_popup(&mut self, url: &Url, features: &str) -> Result<Option<Self::Popup>, Self::Error>;

    /// Whether the popup still reports an open browsing context.
    fn popup_is_open(&self, popup: &Self::Popup) -> bool;

    /// Navigate the current page to `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if navigation cannot be started.
    fn navigate_top(&mut self, url: &Url) -> Result<(), Self::Error>;

    /// Invoke the embedder's close callback.
    fn notify_closed(&mut self);
}
