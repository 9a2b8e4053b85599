//! Virtual-time Environment implementation.
//!
//! `SimEnv` keeps a shared virtual clock that only moves when the simulation
//! moves it. Sleeping advances the clock instead of waiting, so a 15 second
//! load timeout runs in microseconds and every run is reproducible.

use std::{
    ops::{Add, Sub},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
    time::Duration,
};

use bookframe_core::Environment;

/// Default wall clock at simulation start (2024-01-01T00:00:00Z).
pub const DEFAULT_EPOCH_MS: u64 = 1_704_067_200_000;

/// Point in virtual time, measured from simulation start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct SimInstant(Duration);

impl SimInstant {
    /// Instant `millis` after simulation start.
    pub fn from_millis(millis: u64) -> Self {
        Self(Duration::from_millis(millis))
    }

    /// Time since simulation start.
    pub fn since_start(self) -> Duration {
        self.0
    }
}

impl Sub for SimInstant {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Duration {
        self.0.saturating_sub(rhs.0)
    }
}

impl Add<Duration> for SimInstant {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self {
        Self(self.0 + rhs)
    }
}

/// Simulation environment with a shared virtual clock.
///
/// Clones share the clock, so the driver and the runtime always agree on the
/// current time.
#[derive(Debug, Clone)]
pub struct SimEnv {
    nanos: Arc<AtomicU64>,
    epoch_ms: u64,
}

impl Default for SimEnv {
    fn default() -> Self {
        Self::new()
    }
}

impl SimEnv {
    /// Environment starting at [`DEFAULT_EPOCH_MS`].
    pub fn new() -> Self {
        Self::with_epoch(DEFAULT_EPOCH_MS)
    }

    /// Environment whose wall clock starts at `epoch_ms`.
    pub fn with_epoch(epoch_ms: u64) -> Self {
        Self { nanos: Arc::new(AtomicU64::new(0)), epoch_ms }
    }

    /// Time since simulation start.
    pub fn elapsed(&self) -> Duration {
        Duration::from_nanos(self.nanos.load(Ordering::SeqCst))
    }

    /// Move the clock forward by `duration`.
    pub fn advance(&self, duration: Duration) {
        self.nanos.fetch_add(duration.as_nanos() as u64, Ordering::SeqCst);
    }

    /// Move the clock to `instant`. Never moves it backwards.
    pub fn advance_to(&self, instant: SimInstant) {
        self.nanos.fetch_max(instant.since_start().as_nanos() as u64, Ordering::SeqCst);
    }
}

impl Environment for SimEnv {
    type Instant = SimInstant;

    fn now(&self) -> SimInstant {
        SimInstant(self.elapsed())
    }

    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send {
        let clock = self.clone();
        async move { clock.advance(duration) }
    }

    fn wall_clock_millis(&self) -> u64 {
        self.epoch_ms + self.elapsed().as_millis() as u64
    }
}
