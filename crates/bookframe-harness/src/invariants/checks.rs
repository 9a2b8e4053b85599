//! Standard invariant checks.
//!
//! These invariants capture behavioral properties that must always hold.
//! They verify WHAT must be true, not specific test scenarios.

use std::collections::HashSet;

use bookframe_core::Status;

use super::{Invariant, InvariantResult, SessionSnapshot};

/// The load watchdog is armed exactly while loading.
///
/// An armed watchdog outside `Loading` could turn a ready or offline session
/// into an error; a missing one could leave a spinner up forever. After close
/// nothing is armed.
pub struct DeadlineIffLoading;

impl Invariant for DeadlineIffLoading {
    fn name(&self) -> &'static str {
        "DeadlineIffLoading"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let expected = !state.closed && state.status.is_loading();
        if state.watchdog_armed != expected {
            return Err(self.violation(format!(
                "watchdog armed={} but status={:?} closed={}",
                state.watchdog_armed, state.status, state.closed
            )));
        }
        Ok(())
    }
}

/// Retry nonces strictly increase and no frame URL is ever reused.
///
/// A repeated URL would let an intermediary serve the cached failure again.
pub struct NonceMonotonic;

impl Invariant for NonceMonotonic {
    fn name(&self) -> &'static str {
        "NonceMonotonic"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        for window in state.nonce_history.windows(2) {
            if window[1] <= window[0] {
                return Err(self.violation(format!(
                    "nonce did not increase: {} → {}",
                    window[0], window[1]
                )));
            }
        }

        let mut seen = HashSet::new();
        for url in &state.frame_urls {
            if !seen.insert(url) {
                return Err(self.violation(format!("frame url mounted twice: {url}")));
            }
        }
        Ok(())
    }
}

/// No frame is mounted while connectivity is down.
pub struct FrameOnlyWhenOnline;

impl Invariant for FrameOnlyWhenOnline {
    fn name(&self) -> &'static str {
        "FrameOnlyWhenOnline"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.frame_mounted && !state.online {
            return Err(self.violation("frame mounted while offline".to_string()));
        }
        if state.frame_mounted && matches!(state.status, Status::Offline { .. }) {
            return Err(self.violation("frame mounted in offline status".to_string()));
        }
        Ok(())
    }
}

/// Close releases every resource and notifies the embedder exactly once.
pub struct TeardownComplete;

impl Invariant for TeardownComplete {
    fn name(&self) -> &'static str {
        "TeardownComplete"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        if state.closed_notifications > 1 {
            return Err(
                self.violation(format!("closed {} times", state.closed_notifications))
            );
        }
        if !state.closed {
            return Ok(());
        }

        let mut leaks = Vec::new();
        if state.listeners > 0 {
            leaks.push(format!("{} listeners", state.listeners));
        }
        if state.watchdog_armed {
            leaks.push("load watchdog".to_string());
        }
        if state.debounce_pending {
            leaks.push("resize debounce".to_string());
        }
        if state.frame_mounted {
            leaks.push("mounted frame".to_string());
        }
        if state.closed_notifications != 1 {
            leaks.push("close callback never ran".to_string());
        }

        if leaks.is_empty() {
            Ok(())
        } else {
            Err(self.violation(format!("closed session still holds {}", leaks.join(", "))))
        }
    }
}

/// An unlocked host page shows its original viewport meta.
///
/// The host is locked for the whole session, so whenever it is unlocked it
/// must be exactly as the session found it. A page that had no viewport meta
/// must still have none.
pub struct HostRestored;

impl Invariant for HostRestored {
    fn name(&self) -> &'static str {
        "HostRestored"
    }

    fn check(&self, state: &SessionSnapshot) -> InvariantResult {
        let Some(host) = &state.host else {
            return Ok(());
        };
        if !host.scroll_locked && host.viewport_meta != host.original_viewport_meta {
            return Err(self.violation(format!(
                "host unlocked with viewport meta {:?}, originally {:?}",
                host.viewport_meta, host.original_viewport_meta
            )));
        }
        Ok(())
    }
}
