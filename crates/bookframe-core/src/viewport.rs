//! Viewport height reconciliation.
//!
//! Mobile browsers change the visible area when the on-screen keyboard shows
//! or the device rotates. The reconciler debounces those changes and computes
//! the height left for the frame once the host chrome is subtracted.

use std::{ops::Sub, time::Duration};

use crate::{config::ViewportConfig, timer::OneShot};

/// Height available to the overlay for a viewport of the given size.
///
/// The bottom navigation is only present at or below the breakpoint width.
pub fn available_height(config: &ViewportConfig, width: u32, height: u32) -> u32 {
    let nav = if width > config.nav_breakpoint { 0 } else { config.bottom_nav_height };
    height.saturating_sub(config.header_height).saturating_sub(nav)
}

/// Debounced height reconciler.
#[derive(Debug, Clone)]
pub struct ViewportReconciler<I> {
    config: ViewportConfig,
    debounce: Duration,
    /// Latest dimensions seen, applied when the debounce expires.
    pending: Option<(u32, u32)>,
    timer: Option<OneShot<I>>,
    last_applied: Option<u32>,
}

impl<I> ViewportReconciler<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Create a reconciler with nothing applied yet.
    pub fn new(config: ViewportConfig, debounce: Duration) -> Self {
        Self { config, debounce, pending: None, timer: None, last_applied: None }
    }

    /// Compute and apply immediately. Returns the height if it changed.
    pub fn reconcile_now(&mut self, width: u32, height: u32) -> Option<u32> {
        let available = available_height(&self.config, width, height);
        if self.last_applied == Some(available) {
            return None;
        }
        self.last_applied = Some(available);
        Some(available)
    }

    /// Record a resize. Re-arms the debounce; the last dimensions win.
    pub fn schedule(&mut self, width: u32, height: u32, now: I) {
        self.pending = Some((width, height));
        self.timer = Some(OneShot::arm(now, self.debounce));
    }

    /// Apply pending dimensions once the debounce has expired.
    ///
    /// Returns the new height if one was applied and it changed.
    pub fn poll(&mut self, now: I) -> Option<u32> {
        self.timer.as_ref()?.expired(now)?;
        self.timer = None;
        let (width, height) = self.pending.take()?;
        self.reconcile_now(width, height)
    }

    /// Drop any pending debounce. Returns true if one was armed.
    pub fn cancel(&mut self) -> bool {
        self.pending = None;
        self.timer.take().is_some()
    }

    /// Armed debounce timer, if any.
    pub fn timer(&self) -> Option<&OneShot<I>> {
        self.timer.as_ref()
    }

    /// Last height handed to the driver.
    pub fn last_applied(&self) -> Option<u32> {
        self.last_applied
    }
}
