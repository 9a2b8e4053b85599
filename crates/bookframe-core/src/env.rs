//! Environment abstraction for deterministic testing.
//!
//! Decouples lifecycle logic from system resources (monotonic time, wall
//! clock, sleeping). Enables deterministic simulation with a virtual clock and
//! production use with real system time.

use std::time::Duration;

/// Abstract environment providing time and async sleeping.
///
/// # Invariants
///
/// Implementations MUST guarantee:
///
/// - `now()` never goes backwards
/// - `wall_clock_millis()` is only used for cache-busting, never for timers
pub trait Environment: Clone + Send + Sync + 'static {
    /// The specific instant type used by this environment.
    ///
    /// Production environments use `std::time::Instant`, while simulation
    /// environments use virtual time.
    type Instant: Copy + Ord + Send + Sync + std::ops::Sub<Output = Duration>;

    /// Current time (monotonic).
    ///
    /// # Invariants
    ///
    /// - This method MUST return values that never decrease within a single
    ///   execution context. Subsequent calls must return times >= previous
    ///   calls.
    fn now(&self) -> Self::Instant;

    /// Sleeps for the specified duration.
    ///
    /// This is the ONLY async method in the trait, and it should only be used
    /// by runtime code (not lifecycle logic).
    fn sleep(&self, duration: Duration) -> impl std::future::Future<Output = ()> + Send;

    /// Milliseconds since the Unix epoch.
    ///
    /// Seeds the cache-bust value of a session so that retried frame URLs
    /// stay unique across sessions, not just within one.
    fn wall_clock_millis(&self) -> u64;
}
