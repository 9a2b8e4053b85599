//! Reference model of one session.
//!
//! A deliberately plain re-statement of the lifecycle rules, with integer
//! milliseconds instead of timers. It's the oracle against which the real
//! controller is verified.

use bookframe_core::{ViewportConfig, available_height};

use super::operation::{Operation, OperationError, OperationResult};

/// Load watchdog timeout in the model, milliseconds.
pub const MODEL_LOAD_TIMEOUT_MS: u64 = 15_000;

/// Resize debounce in the model, milliseconds.
pub const MODEL_DEBOUNCE_MS: u64 = 100;

/// Lifecycle status as the model sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelStatus {
    /// Loading.
    Loading,
    /// Ready.
    Ready,
    /// Error, with whether the watchdog caused it.
    Error {
        /// True if the watchdog expired.
        timed_out: bool,
    },
    /// Offline.
    Offline,
}

/// Observable state for oracle comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservableState {
    /// Lifecycle status.
    pub status: ModelStatus,
    /// Connectivity.
    pub online: bool,
    /// Retry nonce.
    pub nonce: u64,
    /// Attempt of the mounted frame.
    pub mounted_attempt: Option<u64>,
    /// Whether the load watchdog is armed.
    pub watchdog_armed: bool,
    /// Whether a resize debounce is pending.
    pub debounce_pending: bool,
    /// Last applied height.
    pub height: Option<u32>,
    /// Whether the session closed.
    pub closed: bool,
    /// Booking signals observed.
    pub signals: usize,
    /// External navigations requested.
    pub external_opens: usize,
    /// Times the close callback ran.
    pub closed_notifications: usize,
}

/// Model session - the reference implementation.
#[derive(Debug, Clone)]
pub struct ModelSession {
    viewport: ViewportConfig,
    now_ms: u64,
    status: ModelStatus,
    online: bool,
    nonce: u64,
    mounted: Option<u64>,
    deadline_ms: Option<u64>,
    pending_resize: Option<(u64, u32, u32)>,
    height: Option<u32>,
    closed: bool,
    signals: usize,
    external_opens: usize,
}

impl ModelSession {
    /// Open a session with default chrome offsets.
    pub fn open(online: bool, width: u32, height: u32) -> Self {
        let viewport = ViewportConfig::default();
        Self {
            viewport,
            now_ms: 0,
            status: if online { ModelStatus::Loading } else { ModelStatus::Offline },
            online,
            nonce: 0,
            mounted: online.then_some(0),
            deadline_ms: online.then_some(MODEL_LOAD_TIMEOUT_MS),
            pending_resize: None,
            height: Some(available_height(&viewport, width, height)),
            closed: false,
            signals: 0,
            external_opens: 0,
        }
    }

    /// Current model time in milliseconds.
    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    /// Apply an operation and return the result.
    ///
    /// Only `Retry` can be rejected; everything else is accepted, often with
    /// no effect.
    pub fn apply(&mut self, op: &Operation) -> OperationResult {
        if self.closed {
            return match op {
                Operation::Retry => OperationResult::Error(OperationError::Closed),
                _ => OperationResult::Ok,
            };
        }

        match op {
            Operation::FrameLoaded => self.frame_loaded(),
            Operation::FrameFailed => self.frame_failed(),
            Operation::StaleOutcome { .. } => {},
            Operation::GoOffline => {
                if self.online {
                    self.online = false;
                    self.mounted = None;
                    self.deadline_ms = None;
                    self.status = ModelStatus::Offline;
                }
            },
            Operation::GoOnline => self.online = true,
            Operation::Retry => return self.retry(),
            Operation::AdvanceTime { millis } => self.advance(u64::from(*millis)),
            Operation::Resize { width, height } => {
                self.pending_resize =
                    Some((self.now_ms + MODEL_DEBOUNCE_MS, u32::from(*width), u32::from(*height)));
            },
            Operation::Message { trusted, kind } => {
                if *trusted && kind.is_signal() {
                    self.signals += 1;
                }
            },
            Operation::Close => self.close(),
            Operation::OpenExternally => {
                self.external_opens += 1;
                self.close();
            },
        }
        OperationResult::Ok
    }

    /// Observable state for comparison.
    pub fn observable_state(&self) -> ObservableState {
        ObservableState {
            status: self.status,
            online: self.online,
            nonce: self.nonce,
            mounted_attempt: self.mounted,
            watchdog_armed: self.deadline_ms.is_some(),
            debounce_pending: self.pending_resize.is_some(),
            height: self.height,
            closed: self.closed,
            signals: self.signals,
            external_opens: self.external_opens,
            closed_notifications: usize::from(self.closed),
        }
    }

    fn frame_loaded(&mut self) {
        if self.mounted.is_none() {
            return;
        }
        match self.status {
            ModelStatus::Loading | ModelStatus::Error { timed_out: true } => {
                self.status = ModelStatus::Ready;
                self.deadline_ms = None;
            },
            ModelStatus::Ready | ModelStatus::Error { timed_out: false } | ModelStatus::Offline => {},
        }
    }

    fn frame_failed(&mut self) {
        if self.mounted.is_some() && self.status == ModelStatus::Loading {
            self.status = ModelStatus::Error { timed_out: false };
            self.deadline_ms = None;
        }
    }

    fn retry(&mut self) -> OperationResult {
        if !matches!(self.status, ModelStatus::Error { .. } | ModelStatus::Offline) {
            return OperationResult::Error(OperationError::NotRetryable);
        }
        if !self.online {
            return OperationResult::Error(OperationError::StillOffline);
        }
        self.nonce += 1;
        self.mounted = Some(self.nonce);
        self.deadline_ms = Some(self.now_ms + MODEL_LOAD_TIMEOUT_MS);
        self.status = ModelStatus::Loading;
        OperationResult::Ok
    }

    fn advance(&mut self, millis: u64) {
        self.now_ms += millis;

        if self.deadline_ms.is_some_and(|deadline| deadline <= self.now_ms) {
            self.deadline_ms = None;
            if self.status == ModelStatus::Loading {
                self.status = ModelStatus::Error { timed_out: true };
            }
        }

        if let Some((due, width, height)) = self.pending_resize {
            if due <= self.now_ms {
                self.pending_resize = None;
                self.height = Some(available_height(&self.viewport, width, height));
            }
        }
    }

    fn close(&mut self) {
        self.closed = true;
        self.mounted = None;
        self.deadline_ms = None;
        self.pending_resize = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::operation::MessageKind;

    #[test]
    fn watchdog_fires_at_timeout() {
        let mut model = ModelSession::open(true, 390, 844);

        model.apply(&Operation::AdvanceTime { millis: 14_999 });
        assert_eq!(model.observable_state().status, ModelStatus::Loading);

        model.apply(&Operation::AdvanceTime { millis: 1 });
        let state = model.observable_state();
        assert_eq!(state.status, ModelStatus::Error { timed_out: true });
        assert!(!state.watchdog_armed);
    }

    #[test]
    fn retry_rules() {
        let mut model = ModelSession::open(true, 390, 844);
        assert_eq!(
            model.apply(&Operation::Retry),
            OperationResult::Error(OperationError::NotRetryable)
        );

        model.apply(&Operation::GoOffline);
        assert_eq!(
            model.apply(&Operation::Retry),
            OperationResult::Error(OperationError::StillOffline)
        );

        model.apply(&Operation::GoOnline);
        assert!(model.apply(&Operation::Retry).is_ok());
        assert_eq!(model.observable_state().mounted_attempt, Some(1));
    }

    #[test]
    fn untrusted_signals_are_not_counted() {
        let mut model = ModelSession::open(true, 390, 844);
        model.apply(&Operation::Message { trusted: false, kind: MessageKind::BookingComplete });
        model.apply(&Operation::Message { trusted: true, kind: MessageKind::Garbage });
        model.apply(&Operation::Message { trusted: true, kind: MessageKind::Navigation });

        assert_eq!(model.observable_state().signals, 1);
    }

    #[test]
    fn close_is_terminal() {
        let mut model = ModelSession::open(true, 390, 844);
        model.apply(&Operation::OpenExternally);
        model.apply(&Operation::Close);

        let state = model.observable_state();
        assert!(state.closed);
        assert_eq!(state.external_opens, 1);
        assert_eq!(state.closed_notifications, 1);
        assert_eq!(
            model.apply(&Operation::Retry),
            OperationResult::Error(OperationError::Closed)
        );
    }
}
