//! External navigation fallback.
//!
//! When the embedded experience fails or the user opts out, the booking opens
//! in a new top-level browsing context. Mobile browsers and in-app webviews
//! frequently block or silently swallow that attempt, so the navigator gives
//! the popup a short grace period and otherwise navigates the current page.
//!
//! ```text
//! ┌──────┐ OpenPopup ┌────────────┐  opened   ┌──────────────┐ alive  ┌──────┐
//! │ Idle │──────────>│ Attempting │──────────>│ Confirming   │───────>│ Done │
//! └──────┘           └────────────┘           └──────────────┘        └──────┘
//!                          │ blocked/threw          │ gone after grace    ↑
//!                          └────────────────────────┴── NavigateTop ──────┘
//! ```
//!
//! The navigator outlives the overlay session: the session closes as soon as
//! the fallback starts, while confirmation completes afterwards.

use std::{ops::Sub, time::Duration};

use url::Url;

use crate::{error::FallbackError, timer::OneShot};

/// Result of asking the platform to open a popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PopupAttempt {
    /// A browsing context handle came back.
    Opened,
    /// The platform returned no handle.
    Blocked,
    /// The platform raised an error.
    Threw(String),
}

/// Platform step the driver must perform next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackStep {
    /// Open `url` in a new browsing context with `features`.
    OpenPopup {
        /// Booking destination.
        url: Url,
        /// Window features.
        features: String,
    },
    /// Navigate the current page to `url`.
    NavigateTop {
        /// Booking destination.
        url: Url,
    },
}

/// How the booking finally opened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackOutcome {
    /// Popup opened and survived the grace period.
    Popup,
    /// Current page navigated directly.
    DirectNavigation {
        /// Why the popup route was abandoned.
        reason: FallbackError,
    },
}

#[derive(Debug, Clone)]
enum Phase<I> {
    Idle,
    Attempting,
    Confirming(OneShot<I>),
    Done(FallbackOutcome),
}

/// Popup-then-direct-navigation state machine.
#[derive(Debug, Clone)]
pub struct FallbackNavigator<I> {
    url: Url,
    features: String,
    grace: Duration,
    phase: Phase<I>,
}

impl<I> FallbackNavigator<I>
where
    I: Copy + Ord + Sub<Output = Duration>,
{
    /// Navigator for `url`.
    pub fn new(url: Url, features: impl Into<String>, grace: Duration) -> Self {
        Self { url, features: features.into(), grace, phase: Phase::Idle }
    }

    /// Start the fallback. Returns `None` if already started.
    pub fn begin(&mut self) -> Option<FallbackStep> {
        if !matches!(self.phase, Phase::Idle) {
            return None;
        }
        self.phase = Phase::Attempting;
        Some(FallbackStep::OpenPopup { url: self.url.clone(), features: self.features.clone() })
    }

    /// Record how the popup attempt went.
    ///
    /// A blocked or failed attempt navigates directly right away; an opened
    /// popup starts the confirmation grace period.
    pub fn record_attempt(&mut self, attempt: PopupAttempt, now: I) -> Option<FallbackStep> {
        if !matches!(self.phase, Phase::Attempting) {
            return None;
        }

        match attempt {
            PopupAttempt::Opened => {
                self.phase = Phase::Confirming(OneShot::arm(now, self.grace));
                None
            },
            PopupAttempt::Blocked => Some(self.navigate_top(FallbackError::Blocked)),
            PopupAttempt::Threw(message) => {
                Some(self.navigate_top(FallbackError::Threw(message)))
            },
        }
    }

    /// Time left in the grace period. `None` unless confirming.
    pub fn remaining(&self, now: I) -> Option<Duration> {
        match &self.phase {
            Phase::Confirming(timer) => Some(timer.remaining(now)),
            _ => None,
        }
    }

    /// Check the popup once the grace period is over.
    ///
    /// `popup_open` is whether the popup handle still reports an open
    /// context. Before the grace period ends this does nothing.
    pub fn confirm(&mut self, popup_open: bool, now: I) -> Option<FallbackStep> {
        let Phase::Confirming(timer) = &self.phase else {
            return None;
        };
        timer.expired(now)?;

        if popup_open {
            self.phase = Phase::Done(FallbackOutcome::Popup);
            None
        } else {
            Some(self.navigate_top(FallbackError::Unconfirmed { grace: self.grace }))
        }
    }

    /// Final outcome. `None` while still in progress.
    pub fn outcome(&self) -> Option<&FallbackOutcome> {
        match &self.phase {
            Phase::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    fn navigate_top(&mut self, reason: FallbackError) -> FallbackStep {
        tracing::debug!(%reason, url = %self.url, "falling back to direct navigation");
        self.phase = Phase::Done(FallbackOutcome::DirectNavigation { reason });
        FallbackStep::NavigateTop { url: self.url.clone() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_POPUP_FEATURES;

    fn navigator() -> FallbackNavigator<Duration> {
        let url = Url::parse("https://booking.example/svc/123").unwrap_or_else(|_| unreachable!());
        FallbackNavigator::new(url, DEFAULT_POPUP_FEATURES, Duration::from_millis(100))
    }

    fn ms(millis: u64) -> Duration {
        Duration::from_millis(millis)
    }

    #[test]
    fn begin_requests_popup_once() {
        let mut nav = navigator();

        assert!(matches!(nav.begin(), Some(FallbackStep::OpenPopup { .. })));
        assert_eq!(nav.begin(), None);
    }

    #[test]
    fn blocked_popup_navigates_immediately() {
        let mut nav = navigator();
        let _ = nav.begin();

        let step = nav.record_attempt(PopupAttempt::Blocked, ms(0));
        assert!(matches!(step, Some(FallbackStep::NavigateTop { .. })));
        assert_eq!(
            nav.outcome(),
            Some(&FallbackOutcome::DirectNavigation { reason: FallbackError::Blocked })
        );
    }

    #[test]
    fn throwing_popup_navigates_immediately() {
        let mut nav = navigator();
        let _ = nav.begin();

        let step = nav.record_attempt(PopupAttempt::Threw("SecurityError".into()), ms(0));
        assert!(matches!(step, Some(FallbackStep::NavigateTop { .. })));
    }

    #[test]
    fn surviving_popup_is_kept() {
        let mut nav = navigator();
        let _ = nav.begin();
        assert_eq!(nav.record_attempt(PopupAttempt::Opened, ms(0)), None);

        // Too early to judge
        assert_eq!(nav.confirm(false, ms(50)), None);
        assert_eq!(nav.outcome(), None);
        assert_eq!(nav.remaining(ms(50)), Some(ms(50)));

        assert_eq!(nav.confirm(true, ms(100)), None);
        assert_eq!(nav.outcome(), Some(&FallbackOutcome::Popup));
    }

    #[test]
    fn vanished_popup_navigates_after_grace() {
        let mut nav = navigator();
        let _ = nav.begin();
        let _ = nav.record_attempt(PopupAttempt::Opened, ms(0));

        let step = nav.confirm(false, ms(100));
        assert!(matches!(step, Some(FallbackStep::NavigateTop { .. })));
        assert!(matches!(
            nav.outcome(),
            Some(FallbackOutcome::DirectNavigation { reason: FallbackError::Unconfirmed { .. } })
        ));
    }
}
