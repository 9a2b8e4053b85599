//! Generic runtime for booking frame sessions.
//!
//! The Runtime drives one session from open to close, coordinating between:
//! - [`FrameController`]: lifecycle state machine
//! - [`FallbackNavigator`]: external navigation escape hatch
//! - [`Driver`]: platform effects
//!
//! The host page is held by a [`HostGuard`] for the whole session, so its
//! viewport and scroll state are restored on every exit path.

use bookframe_core::{
    BookingSignal, Environment, FallbackNavigator, FallbackOutcome, FallbackStep, FrameAction,
    FrameConfig, FrameController, FrameError, OpenContext, PopupAttempt, Status,
};
use thiserror::Error;
use url::Url;

use crate::{Driver, HostGuard};

/// Errors that end a session run.
#[derive(Error, Debug)]
pub enum RuntimeError<E: std::error::Error + 'static> {
    /// Session could not be opened
    #[error("failed to open session: {0}")]
    Open(#[from] FrameError),

    /// Driver failed while executing an action
    #[error("driver error: {0}")]
    Driver(#[source] E),
}

/// Summary of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionReport {
    /// Status when the session closed.
    pub status: Status,
    /// Retries performed.
    pub retry_nonce: u64,
    /// Booking signals observed from the provider.
    pub signals: Vec<BookingSignal>,
    /// How the booking opened externally. `None` if it never did.
    pub fallback: Option<FallbackOutcome>,
}

/// Generic runtime that orchestrates the controller and a driver.
///
/// # Type Parameters
///
/// - `D`: Platform driver
/// - `E`: Environment providing time
pub struct Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    driver: D,
    env: E,
    config: FrameConfig,
    booking_url: String,
    service_name: String,
}

struct PendingFallback<P, I> {
    navigator: FallbackNavigator<I>,
    popup: Option<P>,
}

/// Session state while the host is held.
struct Active<D, E>
where
    D: Driver,
    E: Environment,
{
    host: HostGuard<D>,
    env: E,
    controller: FrameController<E::Instant>,
    fallback: Option<PendingFallback<D::Popup, E::Instant>>,
    signals: Vec<BookingSignal>,
}

impl<D, E> Runtime<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Create a runtime for one session.
    pub fn new(
        driver: D,
        env: E,
        config: FrameConfig,
        booking_url: impl Into<String>,
        service_name: impl Into<String>,
    ) -> Self {
        Self {
            driver,
            env,
            config,
            booking_url: booking_url.into(),
            service_name: service_name.into(),
        }
    }

    /// Run the session until it closes.
    ///
    /// This is the core orchestration loop that:
    /// 1. Locks the host page and opens the controller
    /// 2. Waits for platform events, bounded by the next controller timer
    /// 3. Feeds events and expired timers to the controller
    /// 4. Executes the resulting actions through the driver
    ///
    /// After the session closes the host page is restored, then a pending
    /// popup confirmation (if the user opened the booking externally) is
    /// completed. Returns the report and the driver.
    ///
    /// # Errors
    ///
    /// Returns an error if the booking URL or config is invalid, or if the
    /// driver fails. The host page is restored in both cases. A driver
    /// failure also closes the session: listeners are detached, timers
    /// cancelled, the frame unmounted, and the close callback runs.
    pub async fn run(self) -> Result<(SessionReport, D), RuntimeError<D::Error>> {
        let Self { driver, env, config, booking_url, service_name } = self;

        let host = HostGuard::acquire(driver, &config.locked_viewport);
        let (width, height) = host.viewport();
        let context = OpenContext {
            online: host.is_online(),
            width,
            height,
            epoch_ms: env.wall_clock_millis(),
        };

        let (controller, actions) =
            FrameController::open(config, &booking_url, service_name, context, env.now())?;

        let mut active = Active { host, env, controller, fallback: None, signals: Vec::new() };
        if let Err(e) = active.drive(actions).await {
            tracing::warn!(error = %e, "driver failed, closing session");
            active.abort();
            return Err(e);
        }

        active.finish().await
    }
}

impl<D, E> Active<D, E>
where
    D: Driver,
    E: Environment,
{
    /// Execute the opening actions, then cycle until the controller closes.
    async fn drive(&mut self, actions: Vec<FrameAction>) -> Result<(), RuntimeError<D::Error>> {
        self.execute(actions)?;
        while !self.controller.is_closed() {
            self.process_cycle().await?;
        }
        Ok(())
    }

    /// Close the controller after a driver failure and run its teardown.
    ///
    /// Only the infallible teardown calls reach the driver, so listeners,
    /// timers, and the frame are released and the close callback runs once.
    fn abort(&mut self) {
        let actions = self.controller.close();
        for action in actions {
            self.teardown(action);
        }
    }

    /// Apply a teardown action. Everything else is dropped.
    fn teardown(&mut self, action: FrameAction) {
        match action {
            FrameAction::UnmountFrame => self.host.unmount_frame(),
            FrameAction::CancelTimer(timer) => self.host.cancel_timer(timer),
            FrameAction::Unsubscribe(listener) => self.host.unsubscribe(listener),
            FrameAction::Closed => self.host.notify_closed(),
            other => tracing::trace!(action = ?other, "skipped after driver failure"),
        }
    }

    /// Wait for one event or timer and process it.
    async fn process_cycle(&mut self) -> Result<(), RuntimeError<D::Error>> {
        let timeout = self.controller.next_timeout(self.env.now());
        let event = self.host.poll_event(timeout).await.map_err(RuntimeError::Driver)?;

        let now = self.env.now();
        let mut actions = match event {
            Some(event) => self.controller.handle(event, now),
            None => Vec::new(),
        };
        actions.extend(self.controller.tick(now));

        self.execute(actions)
    }

    /// Execute controller actions in order.
    ///
    /// If one fails, the teardown actions after it still run before the error
    /// is returned. The controller may already be closed at that point.
    fn execute(&mut self, actions: Vec<FrameAction>) -> Result<(), RuntimeError<D::Error>> {
        let mut actions = actions.into_iter();
        while let Some(action) = actions.next() {
            if let Err(e) = self.apply(action) {
                for rest in actions {
                    self.teardown(rest);
                }
                return Err(e);
            }
        }
        Ok(())
    }

    /// Execute one action through the driver.
    fn apply(&mut self, action: FrameAction) -> Result<(), RuntimeError<D::Error>> {
        match action {
            FrameAction::Render => {
                let view = self.controller.render_state();
                self.host.render(&view).map_err(RuntimeError::Driver)?;
            },
            FrameAction::MountFrame(spec) => {
                self.host.mount_frame(&spec).map_err(RuntimeError::Driver)?;
            },
            FrameAction::UnmountFrame => self.host.unmount_frame(),
            FrameAction::ApplyHeight(height) => self.host.apply_height(height),
            FrameAction::ArmTimer { timer, after } => self.host.arm_timer(timer, after),
            FrameAction::CancelTimer(timer) => self.host.cancel_timer(timer),
            FrameAction::Subscribe(listener) => {
                self.host.subscribe(listener).map_err(RuntimeError::Driver)?;
            },
            FrameAction::Unsubscribe(listener) => self.host.unsubscribe(listener),
            FrameAction::Observe(signal) => {
                self.host.observe(&signal);
                self.signals.push(signal);
            },
            FrameAction::OpenExternally { url } => self.start_fallback(url)?,
            FrameAction::Closed => self.host.notify_closed(),
        }
        Ok(())
    }

    /// Try the popup; navigate directly right away if it is refused.
    fn start_fallback(&mut self, url: Url) -> Result<(), RuntimeError<D::Error>> {
        let config = self.controller.config();
        let mut navigator =
            FallbackNavigator::new(url, config.popup_features.clone(), config.fallback_grace);

        let Some(FallbackStep::OpenPopup { url, features }) = navigator.begin() else {
            return Ok(());
        };

        let mut popup = None;
        let attempt = match self.host.open_popup(&url, &features) {
            Ok(Some(handle)) => {
                popup = Some(handle);
                PopupAttempt::Opened
            },
            Ok(None) => PopupAttempt::Blocked,
            Err(e) => PopupAttempt::Threw(e.to_string()),
        };

        if let Some(FallbackStep::NavigateTop { url }) =
            navigator.record_attempt(attempt, self.env.now())
        {
            self.host.navigate_top(&url).map_err(RuntimeError::Driver)?;
        }

        self.fallback = Some(PendingFallback { navigator, popup });
        Ok(())
    }

    /// Restore the host, then settle any pending popup confirmation.
    async fn finish(self) -> Result<(SessionReport, D), RuntimeError<D::Error>> {
        let Self { host, env, controller, fallback, signals } = self;
        let mut driver = host.release();

        let fallback = match fallback {
            Some(PendingFallback { mut navigator, popup }) => {
                if let Some(wait) = navigator.remaining(env.now()) {
                    env.sleep(wait).await;
                }
                let open = popup.as_ref().is_some_and(|p| driver.popup_is_open(p));
                if let Some(FallbackStep::NavigateTop { url }) = navigator.confirm(open, env.now())
                {
                    driver.navigate_top(&url).map_err(RuntimeError::Driver)?;
                }
                navigator.outcome().cloned()
            },
            None => None,
        };

        let report = SessionReport {
            status: controller.status(),
            retry_nonce: controller.retry_nonce(),
            signals,
            fallback,
        };
        tracing::debug!(?report, "session finished");
        Ok((report, driver))
    }
}
