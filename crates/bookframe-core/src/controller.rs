//! Frame lifecycle controller.
//!
//! Owns one overlay session: status, timers, listeners, and the mounted frame.
//! Uses the action pattern: methods take time as input and return
//! [`FrameAction`]s for the driver to execute. The controller never performs
//! I/O and never reads a clock.
//!
//! # State Machine
//!
//! ```text
//!              load ok            ┌───────┐
//!        ┌───────────────────────>│ Ready │
//!        │                        └───────┘
//! ┌─────────┐  load failed/timeout  ┌───────┐
//! │ Loading │──────────────────────>│ Error │
//! └─────────┘                       └───────┘
//!     ↑  ↑          retry               │
//!     │  └──────────────────────────────┘
//!     │ retry (online)  ┌─────────┐
//!     └─────────────────│ Offline │<──── any status, connectivity drop
//!                       └─────────┘
//! ```
//!
//! Connectivity coming back never leaves `Offline` on its own; the user has
//! to retry. `close()` is terminal from any status.

use std::{ops::Sub, time::Duration};

use crate::{
    action::{FrameAction, Listener},
    booking::{BookingUrl, FrameSpec},
    config::FrameConfig,
    connectivity::{ConnectivityChange, ConnectivityMonitor},
    error::{FrameError, LoadFailure},
    event::{FrameEvent, UserIntent},
    gateway::{MessageGateway, Verdict},
    state::{Interrupted, Overlay, RenderState, Status},
    timer::{OneShot, TimerKind},
    viewport::ViewportReconciler,
};

/// Platform state sampled when the overlay opens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenContext {
    /// Whether the platform reports connectivity.
    pub online: bool,
    /// Viewport width in pixels.
    pub width: u32,
    /// Viewport height in pixels.
    pub height: u32,
    /// Wall clock at open, milliseconds since the Unix epoch.
    pub epoch_ms: u64,
}

/// Lifecycle state machine for one overlay session.
///
/// Generic over `Instant` to support both real time and virtual time for
/// deterministic testing.
#[derive(Debug, Clone)]
pub struct FrameController<I> {
    config: FrameConfig,
    booking: BookingUrl,
    service_name: String,
    status: Status,
    connectivity: ConnectivityMonitor,
    /// Armed iff `status == Loading` while open.
    watchdog: Option<OneShot<I>>,
    viewport: ViewportReconciler<I>,
    gateway: MessageGateway,
    /// Incremented on every retry, never reset.
    retry_nonce: u64,
    epoch_ms: u64,
    mounted: Option<FrameSpec>,
    listeners: Vec<Listener>,
    closed: bool,
}

impl<I> FrameController<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Open a session and return the actions that set it up.
    ///
    /// The session starts `Loading` with the watchdog armed and the frame
    /// mounted. If the platform is offline it moves straight to `Offline`
    /// without mounting anything.
    ///
    /// # Errors
    ///
    /// - `FrameError::InvalidBookingUrl` if `booking_url` is not absolute
    ///   http(s)
    /// - `FrameError::InvalidConfig` if `config` fails validation
    pub fn open(
        config: FrameConfig,
        booking_url: &str,
        service_name: impl Into<String>,
        context: OpenContext,
        now: I,
    ) -> Result<(Self, Vec<FrameAction>), FrameError> {
        config.validate()?;
        let booking = BookingUrl::parse(booking_url)?;

        let mut controller = Self {
            viewport: ViewportReconciler::new(config.viewport, config.resize_debounce),
            gateway: MessageGateway::new(config.trusted_domain.clone()),
            config,
            booking,
            service_name: service_name.into(),
            status: Status::Loading,
            connectivity: ConnectivityMonitor::new(context.online),
            watchdog: None,
            retry_nonce: 0,
            epoch_ms: context.epoch_ms,
            mounted: None,
            listeners: Vec::new(),
            closed: false,
        };

        tracing::debug!(
            url = %controller.booking,
            online = context.online,
            "opening booking frame session"
        );

        let mut actions = Vec::new();
        for listener in Listener::ALL {
            controller.listeners.push(listener);
            actions.push(FrameAction::Subscribe(listener));
        }

        if let Some(height) = controller.viewport.reconcile_now(context.width, context.height) {
            actions.push(FrameAction::ApplyHeight(height));
        }

        if context.online {
            let url = controller.booking.as_url().clone();
            controller.start_attempt(url, now, &mut actions);
        } else {
            controller.go_offline(&mut actions);
        }

        actions.push(FrameAction::Render);
        Ok((controller, actions))
    }

    /// Process an event and return actions.
    pub fn handle(&mut self, event: FrameEvent, now: I) -> Vec<FrameAction> {
        if self.closed {
            tracing::trace!(?event, "event after close ignored");
            return vec![];
        }

        match event {
            FrameEvent::ConnectivityChanged { online } => self.connectivity_changed(online),
            FrameEvent::FrameLoaded { attempt } => self.frame_loaded(attempt),
            FrameEvent::FrameFailed { attempt } => self.frame_failed(attempt),
            FrameEvent::ViewportResized { width, height }
            | FrameEvent::OrientationChanged { width, height } => {
                self.viewport.schedule(width, height, now);
                vec![FrameAction::ArmTimer {
                    timer: TimerKind::ResizeDebounce,
                    after: self.config.resize_debounce,
                }]
            },
            FrameEvent::Message(message) => match self.gateway.inspect(&message) {
                Verdict::Observed(signal) => vec![FrameAction::Observe(signal)],
                Verdict::Rejected | Verdict::Ignored => vec![],
            },
            FrameEvent::User(UserIntent::Retry) => self.retry(now).unwrap_or_else(|e| {
                tracing::warn!(error = %e, "retry rejected");
                vec![]
            }),
            FrameEvent::User(UserIntent::Close) => self.close(),
            FrameEvent::User(UserIntent::OpenExternally) => self.open_externally(),
        }
    }

    /// Fire every expired timer.
    ///
    /// Call this whenever [`Self::next_timeout`] elapses. Calling it early or
    /// repeatedly is harmless.
    pub fn tick(&mut self, now: I) -> Vec<FrameAction> {
        if self.closed {
            return vec![];
        }

        let mut actions = Vec::new();

        if let Some(elapsed) = self.watchdog.as_ref().and_then(|w| w.expired(now)) {
            self.watchdog = None;
            if self.status.is_loading() {
                tracing::warn!(?elapsed, attempt = self.retry_nonce, "load watchdog expired");
                self.set_status(Status::Error(LoadFailure::Timeout { elapsed }));
                actions.push(FrameAction::Render);
            }
        }

        if let Some(height) = self.viewport.poll(now) {
            actions.push(FrameAction::ApplyHeight(height));
        }

        actions
    }

    /// Time until the next timer is due. `None` if no timer is armed.
    pub fn next_timeout(&self, now: I) -> Option<Duration> {
        let watchdog = self.watchdog.as_ref().map(|w| w.remaining(now));
        let debounce = self.viewport.timer().map(|t| t.remaining(now));
        match (watchdog, debounce) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    /// Reload the frame with a fresh cache-bust value.
    ///
    /// Increments the retry nonce, rewrites the frame URL, re-arms the
    /// watchdog at its full timeout, and returns to `Loading`.
    ///
    /// # Errors
    ///
    /// - `FrameError::SessionClosed` after [`Self::close`]
    /// - `FrameError::InvalidTransition` from `Loading` or `Ready`
    /// - `FrameError::StillOffline` while connectivity is down
    pub fn retry(&mut self, now: I) -> Result<Vec<FrameAction>, FrameError> {
        if self.closed {
            return Err(FrameError::SessionClosed);
        }
        if !self.status.is_retryable() {
            return Err(FrameError::InvalidTransition { status: self.status, operation: "retry" });
        }
        if !self.connectivity.is_online() {
            return Err(FrameError::StillOffline);
        }

        self.retry_nonce += 1;
        let url = self.booking.with_cache_bust(&self.config.cache_bust_param, &self.cache_bust());

        let mut actions = Vec::new();
        self.start_attempt(url, now, &mut actions);
        actions.push(FrameAction::Render);
        Ok(actions)
    }

    /// Close the session.
    ///
    /// Cancels timers, unmounts the frame, and detaches listeners. Idempotent:
    /// only the first call returns actions, including the single
    /// [`FrameAction::Closed`].
    pub fn close(&mut self) -> Vec<FrameAction> {
        if self.closed {
            return vec![];
        }
        self.closed = true;
        tracing::debug!(status = self.status.name(), "closing booking frame session");

        let mut actions = Vec::new();
        if self.watchdog.take().is_some() {
            actions.push(FrameAction::CancelTimer(TimerKind::LoadWatchdog));
        }
        if self.viewport.cancel() {
            actions.push(FrameAction::CancelTimer(TimerKind::ResizeDebounce));
        }
        if self.mounted.take().is_some() {
            actions.push(FrameAction::UnmountFrame);
        }
        actions.extend(self.listeners.drain(..).map(FrameAction::Unsubscribe));
        actions.push(FrameAction::Closed);
        actions
    }

    /// Leave the embedded experience.
    ///
    /// Emits [`FrameAction::OpenExternally`] with the booking URL as supplied,
    /// then closes the session.
    pub fn open_externally(&mut self) -> Vec<FrameAction> {
        if self.closed {
            return vec![];
        }
        let mut actions = vec![FrameAction::OpenExternally { url: self.booking.as_url().clone() }];
        actions.extend(self.close());
        actions
    }

    /// Current status.
    pub fn status(&self) -> Status {
        self.status
    }

    /// Current connectivity.
    pub fn is_online(&self) -> bool {
        self.connectivity.is_online()
    }

    /// Retries performed this session.
    pub fn retry_nonce(&self) -> u64 {
        self.retry_nonce
    }

    /// Whether [`Self::close`] has run.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Load watchdog, if armed.
    pub fn watchdog(&self) -> Option<&OneShot<I>> {
        self.watchdog.as_ref()
    }

    /// Whether a resize debounce is pending.
    pub fn debounce_pending(&self) -> bool {
        self.viewport.timer().is_some()
    }

    /// Frame currently mounted. `None` while suppressed or closed.
    pub fn mounted_frame(&self) -> Option<&FrameSpec> {
        self.mounted.as_ref()
    }

    /// Attached listeners.
    pub fn listeners(&self) -> &[Listener] {
        &self.listeners
    }

    /// Booking URL as supplied.
    pub fn booking_url(&self) -> &BookingUrl {
        &self.booking
    }

    /// Session configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    /// View model for the presentation layer.
    pub fn render_state(&self) -> RenderState {
        let online = self.connectivity.is_online();
        let overlay = match self.status {
            Status::Loading => Overlay::Loading,
            Status::Ready => Overlay::None,
            Status::Offline { .. } if !online => Overlay::Offline,
            // Back online, an interrupted error keeps its escape hatch
            Status::Error(failure) | Status::Offline { interrupted: Interrupted::Error(failure) } => {
                Overlay::Error { failure, support_contact: self.config.support_contact.clone() }
            },
            Status::Offline { .. } => Overlay::Reconnected,
        };

        RenderState {
            service_name: self.service_name.clone(),
            status: self.status,
            online,
            frame: self.mounted.clone(),
            frame_visible: self.mounted.is_some() && self.status == Status::Ready,
            overlay,
            height: self.viewport.last_applied(),
        }
    }

    fn cache_bust(&self) -> String {
        format!("{}-{}", self.epoch_ms, self.retry_nonce)
    }

    /// Enter `Loading` for a new frame attempt.
    fn start_attempt(&mut self, url: url::Url, now: I, actions: &mut Vec<FrameAction>) {
        let spec = FrameSpec::new(url, self.retry_nonce, &self.service_name);
        tracing::debug!(url = %spec.url, attempt = spec.attempt, "starting frame load");

        self.watchdog = Some(OneShot::arm(now, self.config.load_timeout));
        self.mounted = Some(spec.clone());
        self.set_status(Status::Loading);

        actions.push(FrameAction::ArmTimer {
            timer: TimerKind::LoadWatchdog,
            after: self.config.load_timeout,
        });
        actions.push(FrameAction::MountFrame(spec));
    }

    /// Suppress the frame and enter `Offline`.
    fn go_offline(&mut self, actions: &mut Vec<FrameAction>) {
        if self.watchdog.take().is_some() {
            actions.push(FrameAction::CancelTimer(TimerKind::LoadWatchdog));
        }
        if self.mounted.take().is_some() {
            actions.push(FrameAction::UnmountFrame);
        }
        self.set_status(Status::Offline { interrupted: self.status.interrupted() });
    }

    fn connectivity_changed(&mut self, online: bool) -> Vec<FrameAction> {
        let mut actions = Vec::new();
        match self.connectivity.update(online) {
            Some(ConnectivityChange::WentOffline) => {
                self.go_offline(&mut actions);
                actions.push(FrameAction::Render);
            },
            Some(ConnectivityChange::CameOnline) => {
                // No auto-resume: the content may be stale, the user retries.
                tracing::debug!(status = self.status.name(), "connectivity restored");
                actions.push(FrameAction::Render);
            },
            None => {},
        }
        actions
    }

    fn is_current(&self, attempt: u64) -> bool {
        self.mounted.as_ref().is_some_and(|spec| spec.attempt == attempt)
    }

    fn frame_loaded(&mut self, attempt: u64) -> Vec<FrameAction> {
        if !self.is_current(attempt) {
            tracing::debug!(attempt, "load from superseded frame ignored");
            return vec![];
        }

        match self.status {
            Status::Loading => {
                let mut actions = Vec::new();
                if self.watchdog.take().is_some() {
                    actions.push(FrameAction::CancelTimer(TimerKind::LoadWatchdog));
                }
                self.set_status(Status::Ready);
                actions.extend(self.viewport.last_applied().map(FrameAction::ApplyHeight));
                actions.push(FrameAction::Render);
                actions
            },
            // Slow content that made it after all
            Status::Error(LoadFailure::Timeout { .. }) => {
                self.set_status(Status::Ready);
                let mut actions: Vec<_> =
                    self.viewport.last_applied().map(FrameAction::ApplyHeight).into_iter().collect();
                actions.push(FrameAction::Render);
                actions
            },
            // In-frame navigation fires load again
            Status::Ready | Status::Error(LoadFailure::FrameReported) | Status::Offline { .. } => {
                vec![]
            },
        }
    }

    fn frame_failed(&mut self, attempt: u64) -> Vec<FrameAction> {
        if !self.is_current(attempt) || !self.status.is_loading() {
            tracing::debug!(attempt, status = self.status.name(), "frame failure ignored");
            return vec![];
        }

        let mut actions = Vec::new();
        if self.watchdog.take().is_some() {
            actions.push(FrameAction::CancelTimer(TimerKind::LoadWatchdog));
        }
        self.set_status(Status::Error(LoadFailure::FrameReported));
        actions.push(FrameAction::Render);
        actions
    }

    fn set_status(&mut self, next: Status) {
        if self.status != next {
            tracing::debug!(from = self.status.name(), to = next.name(), "status transition");
        }
        self.status = next;
    }
}
