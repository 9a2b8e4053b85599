//! Simulation driver implementing the Driver trait.
//!
//! `SimDriver` plays a scenario timeline on the shared virtual clock and
//! records every effect the runtime asks for. It implements [`Driver`] so the
//! same [`bookframe_app::Runtime`] orchestration code runs in both production
//! and simulation.
//!
//! Recorded state lives behind an `Arc<Mutex<_>>` so tests can keep a
//! [`SimObserver`] and inspect it after the runtime has consumed the driver,
//! including on error paths where the driver is never handed back.

use std::{
    collections::{BTreeMap, BTreeSet, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use bookframe_app::{Driver, HostPage};
use bookframe_core::{
    BookingSignal, Environment, FrameEvent, FrameSpec, Listener, RenderState, Status, TimerKind,
    UserIntent,
};
use thiserror::Error;
use url::Url;

use crate::{
    invariants::{HostSnapshot, SessionSnapshot},
    scenario::{FailPoint, PopupBehavior, Scenario, ScriptedStep, SimStep},
    sim_env::{SimEnv, SimInstant},
};

/// Error type for simulation driver.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SimDriverError {
    /// Scenario asked this operation to fail
    #[error("injected failure at {0:?}")]
    Injected(FailPoint),

    /// Popup attempt raised an error
    #[error("popup attempt threw")]
    PopupThrew,
}

/// Effect recorded by the driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DriverCall {
    /// Listener attached.
    Subscribe(Listener),
    /// Listener detached.
    Unsubscribe(Listener),
    /// Frame mounted.
    Mount {
        /// Attempt number of the frame.
        attempt: u64,
        /// Frame URL.
        url: String,
    },
    /// Frame unmounted.
    Unmount,
    /// Available height applied.
    Height(u32),
    /// Controller timer armed.
    ArmTimer(TimerKind),
    /// Controller timer cancelled.
    CancelTimer(TimerKind),
    /// Session rendered.
    Render(Status),
    /// Booking signal observed.
    Observe(BookingSignal),
    /// Popup requested.
    OpenPopup(String),
    /// Current page navigated.
    NavigateTop(String),
    /// Close callback invoked.
    Closed,
}

/// Everything the simulated platform has seen.
#[derive(Debug, Clone, Default)]
pub struct SimState {
    /// Calls in order, stamped with virtual time.
    pub timeline: Vec<(Duration, DriverCall)>,
    /// Attached listeners.
    pub listeners: BTreeSet<Listener>,
    /// Armed controller timers and when they fire.
    pub armed_timers: BTreeMap<TimerKind, Duration>,
    /// Currently mounted frame.
    pub mounted: Option<FrameSpec>,
    /// Every frame URL ever mounted, in order.
    pub mounted_urls: Vec<String>,
    /// Last applied height.
    pub height: Option<u32>,
    /// Last rendered view.
    pub last_render: Option<RenderState>,
    /// Distinct statuses in render order.
    pub status_history: Vec<Status>,
    /// Retry nonce history, inferred from mounted attempts.
    pub attempt_history: Vec<u64>,
    /// Signals observed from the provider.
    pub signals: Vec<BookingSignal>,
    /// Whether the platform reports connectivity.
    pub online: bool,
    /// Current viewport.
    pub viewport: (u32, u32),
    /// Host viewport meta content as the session found it.
    pub original_viewport_meta: Option<String>,
    /// Host viewport meta content now.
    pub viewport_meta: Option<String>,
    /// Whether host scrolling is locked.
    pub scroll_locked: bool,
    /// Whether the host page was unlocked again after being locked.
    pub host_released: bool,
    /// Popups requested.
    pub popups_opened: usize,
    /// Top-level navigations.
    pub top_navigations: Vec<String>,
    /// Times the close callback ran.
    pub closed_notifications: usize,
}

impl SimState {
    fn record(&mut self, at: Duration, call: DriverCall) {
        tracing::trace!(at_ms = at.as_millis() as u64, ?call, "driver call");
        self.timeline.push((at, call));
    }

    fn mounted_attempt(&self) -> Option<u64> {
        let attempt = self.mounted.as_ref().map(|spec| spec.attempt);
        if attempt.is_none() {
            tracing::trace!("no frame mounted, outcome dropped");
        }
        attempt
    }

    /// Whether `timer` is armed and has not fired by `now`.
    pub fn timer_pending(&self, timer: TimerKind, now: Duration) -> bool {
        self.armed_timers.get(&timer).is_some_and(|fires_at| *fires_at > now)
    }

    /// Whether the session is over: the close callback ran, or the host page
    /// was handed back after listeners were attached.
    pub fn session_ended(&self) -> bool {
        let started =
            self.timeline.iter().any(|(_, call)| matches!(call, DriverCall::Subscribe(_)));
        self.closed_notifications > 0 || (self.host_released && started)
    }

    /// Driver-side view of the session at `now` for invariant checking.
    pub fn session_snapshot(&self, now: Duration) -> SessionSnapshot {
        let status = self.last_render.as_ref().map_or(Status::Loading, |view| view.status);
        SessionSnapshot {
            status,
            online: self.online,
            closed: self.session_ended(),
            watchdog_armed: self.timer_pending(TimerKind::LoadWatchdog, now),
            debounce_pending: self.timer_pending(TimerKind::ResizeDebounce, now),
            frame_mounted: self.mounted.is_some(),
            listeners: self.listeners.len(),
            nonce_history: self.attempt_history.clone(),
            frame_urls: self.mounted_urls.clone(),
            closed_notifications: self.closed_notifications,
            host: Some(HostSnapshot {
                scroll_locked: self.scroll_locked,
                viewport_meta: self.viewport_meta.clone(),
                original_viewport_meta: self.original_viewport_meta.clone(),
            }),
        }
    }
}

/// Read access to a driver's recorded state.
#[derive(Debug, Clone)]
pub struct SimObserver {
    env: SimEnv,
    state: Arc<Mutex<SimState>>,
}

impl SimObserver {
    /// Copy of the recorded state.
    pub fn state(&self) -> SimState {
        lock(&self.state).clone()
    }

    /// Driver-side session snapshot at the current virtual time.
    pub fn snapshot(&self) -> SessionSnapshot {
        lock(&self.state).session_snapshot(self.env.elapsed())
    }
}

/// Handle to a simulated popup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimPopup {
    alive: bool,
}

/// Simulation driver for deterministic testing.
///
/// Implements [`Driver`] trait so the same [`bookframe_app::Runtime`]
/// orchestration code runs in both production and simulation tests.
pub struct SimDriver {
    env: SimEnv,
    script: VecDeque<ScriptedStep>,
    popup: PopupBehavior,
    fail_on: Option<FailPoint>,
    state: Arc<Mutex<SimState>>,
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

impl SimDriver {
    /// Driver playing `scenario` on `env`'s clock.
    ///
    /// Steps are sorted by time; steps sharing a time keep scenario order.
    pub fn from_scenario(scenario: &Scenario, env: SimEnv) -> Self {
        let mut steps = scenario.steps.clone();
        steps.sort_by_key(|s| s.at_ms);

        let state = SimState {
            online: scenario.online,
            viewport: (scenario.viewport.width, scenario.viewport.height),
            original_viewport_meta: scenario.viewport_meta.clone(),
            viewport_meta: scenario.viewport_meta.clone(),
            ..SimState::default()
        };

        Self {
            env,
            script: steps.into(),
            popup: scenario.popup,
            fail_on: scenario.fail_on,
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// Observer sharing this driver's recorded state.
    pub fn observer(&self) -> SimObserver {
        SimObserver { env: self.env.clone(), state: Arc::clone(&self.state) }
    }

    /// Copy of the recorded state.
    pub fn state(&self) -> SimState {
        lock(&self.state).clone()
    }

    /// Steps not yet delivered.
    pub fn remaining_steps(&self) -> usize {
        self.script.len()
    }

    fn now(&self) -> Duration {
        self.env.elapsed()
    }

    fn record(&self, call: DriverCall) {
        lock(&self.state).record(self.now(), call);
    }

    fn check(&self, point: FailPoint) -> Result<(), SimDriverError> {
        if self.fail_on == Some(point) {
            tracing::debug!(?point, "injecting driver failure");
            return Err(SimDriverError::Injected(point));
        }
        Ok(())
    }

    /// Turn a scripted step into the event the platform would deliver.
    ///
    /// Frame outcomes are tagged with the attempt currently mounted; with no
    /// frame mounted there is nothing to report, so they are dropped.
    fn deliver(&self, step: SimStep) -> Option<FrameEvent> {
        let mut state = lock(&self.state);
        let event = match step {
            SimStep::Online => {
                state.online = true;
                FrameEvent::ConnectivityChanged { online: true }
            },
            SimStep::Offline => {
                state.online = false;
                FrameEvent::ConnectivityChanged { online: false }
            },
            SimStep::FrameLoaded => FrameEvent::FrameLoaded { attempt: state.mounted_attempt()? },
            SimStep::FrameFailed => FrameEvent::FrameFailed { attempt: state.mounted_attempt()? },
            SimStep::Resize { width, height } => {
                state.viewport = (width, height);
                FrameEvent::ViewportResized { width, height }
            },
            SimStep::Orientation { width, height } => {
                state.viewport = (width, height);
                FrameEvent::OrientationChanged { width, height }
            },
            SimStep::Message(message) => FrameEvent::Message(message),
            SimStep::Retry => FrameEvent::User(UserIntent::Retry),
            SimStep::Close => FrameEvent::User(UserIntent::Close),
            SimStep::OpenExternally => FrameEvent::User(UserIntent::OpenExternally),
        };
        Some(event)
    }
}

impl HostPage for SimDriver {
    fn viewport_meta(&self) -> Option<String> {
        lock(&self.state).viewport_meta.clone()
    }

    fn set_viewport_meta(&mut self, content: &str) {
        lock(&self.state).viewport_meta = Some(content.to_string());
    }

    fn set_scroll_locked(&mut self, locked: bool) {
        let mut state = lock(&self.state);
        if state.scroll_locked && !locked {
            state.host_released = true;
        }
        state.scroll_locked = locked;
    }
}

impl Driver for SimDriver {
    type Error = SimDriverError;
    type Popup = SimPopup;

    /// Deliver the next scripted step, or let `timeout` elapse if it comes
    /// first. An exhausted script with no pending timer means the user
    /// walked away, which is delivered as a close.
    async fn poll_event(
        &mut self,
        timeout: Option<Duration>,
    ) -> Result<Option<FrameEvent>, Self::Error> {
        let now = self.env.now();
        let deadline = timeout.map(|t| now + t);
        let next = self.script.front().map(|s| SimInstant::from_millis(s.at_ms));

        match (next, deadline) {
            (Some(at), Some(deadline)) if deadline < at => {
                self.env.advance_to(deadline);
                Ok(None)
            },
            (Some(at), _) => {
                self.env.advance_to(at);
                let Some(scripted) = self.script.pop_front() else {
                    return Ok(None);
                };
                Ok(self.deliver(scripted.step))
            },
            (None, Some(deadline)) => {
                self.env.advance_to(deadline);
                Ok(None)
            },
            (None, None) => {
                tracing::debug!("script exhausted, closing");
                Ok(Some(FrameEvent::User(UserIntent::Close)))
            },
        }
    }

    fn is_online(&self) -> bool {
        lock(&self.state).online
    }

    fn viewport(&self) -> (u32, u32) {
        lock(&self.state).viewport
    }

    fn subscribe(&mut self, listener: Listener) -> Result<(), Self::Error> {
        self.check(FailPoint::Subscribe)?;
        lock(&self.state).listeners.insert(listener);
        self.record(DriverCall::Subscribe(listener));
        Ok(())
    }

    fn unsubscribe(&mut self, listener: Listener) {
        lock(&self.state).listeners.remove(&listener);
        self.record(DriverCall::Unsubscribe(listener));
    }

    fn mount_frame(&mut self, spec: &FrameSpec) -> Result<(), Self::Error> {
        self.check(FailPoint::Mount)?;
        {
            let mut state = lock(&self.state);
            state.mounted = Some(spec.clone());
            state.mounted_urls.push(spec.url.to_string());
            state.attempt_history.push(spec.attempt);
        }
        self.record(DriverCall::Mount { attempt: spec.attempt, url: spec.url.to_string() });
        Ok(())
    }

    fn unmount_frame(&mut self) {
        lock(&self.state).mounted = None;
        self.record(DriverCall::Unmount);
    }

    fn apply_height(&mut self, height: u32) {
        lock(&self.state).height = Some(height);
        self.record(DriverCall::Height(height));
    }

    fn arm_timer(&mut self, timer: TimerKind, after: Duration) {
        let fires_at = self.now() + after;
        lock(&self.state).armed_timers.insert(timer, fires_at);
        self.record(DriverCall::ArmTimer(timer));
    }

    fn cancel_timer(&mut self, timer: TimerKind) {
        lock(&self.state).armed_timers.remove(&timer);
        self.record(DriverCall::CancelTimer(timer));
    }

    fn render(&mut self, view: &RenderState) -> Result<(), Self::Error> {
        self.check(FailPoint::Render)?;
        {
            let mut state = lock(&self.state);
            if state.status_history.last() != Some(&view.status) {
                state.status_history.push(view.status);
            }
            state.last_render = Some(view.clone());
        }
        self.record(DriverCall::Render(view.status));
        Ok(())
    }

    fn observe(&mut self, signal: &BookingSignal) {
        lock(&self.state).signals.push(signal.clone());
        self.record(DriverCall::Observe(signal.clone()));
    }

    fn open_popup(&mut self, url: &Url, _features: &str) -> Result<Option<SimPopup>, Self::Error> {
        lock(&self.state).popups_opened += 1;
        self.record(DriverCall::OpenPopup(url.to_string()));
        match self.popup {
            PopupBehavior::Survives => Ok(Some(SimPopup { alive: true })),
            PopupBehavior::Vanishes => Ok(Some(SimPopup { alive: false })),
            PopupBehavior::Blocked => Ok(None),
            PopupBehavior::Throws => Err(SimDriverError::PopupThrew),
        }
    }

    fn popup_is_open(&self, popup: &SimPopup) -> bool {
        popup.alive
    }

    fn navigate_top(&mut self, url: &Url) -> Result<(), Self::Error> {
        lock(&self.state).top_navigations.push(url.to_string());
        self.record(DriverCall::NavigateTop(url.to_string()));
        Ok(())
    }

    fn notify_closed(&mut self) {
        lock(&self.state).closed_notifications += 1;
        self.record(DriverCall::Closed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://booking.example/svc/1";

    #[tokio::test]
    async fn timeout_before_next_step_advances_clock_only() {
        let env = SimEnv::new();
        let scenario = Scenario::new(URL).step(5_000, SimStep::Offline);
        let mut driver = scenario.driver(&env);

        let event = driver.poll_event(Some(Duration::from_secs(1))).await;

        assert_eq!(event, Ok(None));
        assert_eq!(env.elapsed(), Duration::from_secs(1));
        assert_eq!(driver.remaining_steps(), 1);
    }

    #[tokio::test]
    async fn step_is_delivered_at_its_time() {
        let env = SimEnv::new();
        let scenario = Scenario::new(URL).step(5_000, SimStep::Offline);
        let mut driver = scenario.driver(&env);

        let event = driver.poll_event(Some(Duration::from_secs(15))).await;

        assert_eq!(event, Ok(Some(FrameEvent::ConnectivityChanged { online: false })));
        assert_eq!(env.elapsed(), Duration::from_secs(5));
        assert!(!driver.is_online());
    }

    #[tokio::test]
    async fn outcome_without_mounted_frame_is_dropped() {
        let env = SimEnv::new();
        let scenario = Scenario::new(URL).step(100, SimStep::FrameLoaded);
        let mut driver = scenario.driver(&env);

        assert_eq!(driver.poll_event(None).await, Ok(None));
        assert_eq!(driver.remaining_steps(), 0);
    }

    #[tokio::test]
    async fn exhausted_script_closes() {
        let env = SimEnv::new();
        let mut driver = Scenario::new(URL).driver(&env);

        let event = driver.poll_event(None).await;

        assert_eq!(event, Ok(Some(FrameEvent::User(UserIntent::Close))));
    }

    #[test]
    fn injected_failure_surfaces_as_error() {
        let env = SimEnv::new();
        let mut driver = Scenario::new(URL).failing_on(FailPoint::Subscribe).driver(&env);

        assert_eq!(
            driver.subscribe(Listener::Message),
            Err(SimDriverError::Injected(FailPoint::Subscribe))
        );
        assert!(driver.state().listeners.is_empty());
    }
}
