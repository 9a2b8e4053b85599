//! Model-based property tests.
//!
//! These tests generate random operation sequences and verify that the real
//! controller behaves identically to the reference model.
//!
//! # Architecture
//!
//! ```text
//! proptest generates: raw bytes ──arbitrary──> Vec<Operation>
//!                          │
//!           ┌──────────────┼──────────────┐
//!           ▼              ▼              ▼
//!     ModelSession   RealSession      Compare
//!     (reference)    (controller)     Results
//! ```

use std::time::Duration;

use arbitrary::{Arbitrary, Unstructured};
use bookframe_core::{
    FrameAction, FrameConfig, FrameController, FrameError, FrameEvent, InboundMessage,
    LoadFailure, OpenContext, Status, UserIntent,
};
use bookframe_harness::{
    ModelSession, ModelStatus, ObservableState, Operation, OperationError, OperationResult,
};
use proptest::prelude::*;

const URL: &str = "https://www.bokadirekt.se/boka-tjanst/salong/klippning-123";
const TRUSTED_ORIGIN: &str = "https://www.bokadirekt.se";
const UNTRUSTED_ORIGIN: &str = "https://bokadirekt.se.evil.example";

/// Real controller wrapper that mirrors ModelSession's interface.
struct RealSession {
    controller: FrameController<Duration>,
    now: Duration,
    signals: usize,
    external_opens: usize,
    closed_notifications: usize,
}

impl RealSession {
    fn open(online: bool, width: u32, height: u32) -> Self {
        let context = OpenContext { online, width, height, epoch_ms: 1_704_067_200_000 };
        let Ok((controller, _)) =
            FrameController::open(FrameConfig::default(), URL, "Klippning", context, Duration::ZERO)
        else {
            unreachable!("open must succeed");
        };
        Self { controller, now: Duration::ZERO, signals: 0, external_opens: 0, closed_notifications: 0 }
    }

    fn current_attempt(&self) -> u64 {
        self.controller.mounted_frame().map_or(self.controller.retry_nonce(), |f| f.attempt)
    }

    fn apply(&mut self, op: &Operation) -> OperationResult {
        let mut result = OperationResult::Ok;
        let mut actions = match op {
            Operation::FrameLoaded => self.handle(FrameEvent::FrameLoaded {
                attempt: self.current_attempt(),
            }),
            Operation::FrameFailed => self.handle(FrameEvent::FrameFailed {
                attempt: self.current_attempt(),
            }),
            Operation::StaleOutcome { loaded } => {
                let attempt = self.current_attempt().wrapping_sub(1);
                if *loaded {
                    self.handle(FrameEvent::FrameLoaded { attempt })
                } else {
                    self.handle(FrameEvent::FrameFailed { attempt })
                }
            },
            Operation::GoOffline => self.handle(FrameEvent::ConnectivityChanged { online: false }),
            Operation::GoOnline => self.handle(FrameEvent::ConnectivityChanged { online: true }),
            Operation::Retry => match self.controller.retry(self.now) {
                Ok(actions) => actions,
                Err(e) => {
                    result = OperationResult::Error(match e {
                        FrameError::SessionClosed => OperationError::Closed,
                        FrameError::StillOffline => OperationError::StillOffline,
                        _ => OperationError::NotRetryable,
                    });
                    Vec::new()
                },
            },
            Operation::AdvanceTime { millis } => {
                self.now += Duration::from_millis(u64::from(*millis));
                Vec::new()
            },
            Operation::Resize { width, height } => self.handle(FrameEvent::ViewportResized {
                width: u32::from(*width),
                height: u32::from(*height),
            }),
            Operation::Message { trusted, kind } => {
                let origin = if *trusted { TRUSTED_ORIGIN } else { UNTRUSTED_ORIGIN };
                self.handle(FrameEvent::Message(InboundMessage::text(origin, kind.payload())))
            },
            Operation::Close => self.handle(FrameEvent::User(UserIntent::Close)),
            Operation::OpenExternally => self.handle(FrameEvent::User(UserIntent::OpenExternally)),
        };
        actions.extend(self.controller.tick(self.now));

        for action in &actions {
            match action {
                FrameAction::Observe(_) => self.signals += 1,
                FrameAction::OpenExternally { .. } => self.external_opens += 1,
                FrameAction::Closed => self.closed_notifications += 1,
                _ => {},
            }
        }
        result
    }

    fn handle(&mut self, event: FrameEvent) -> Vec<FrameAction> {
        self.controller.handle(event, self.now)
    }

    fn observable_state(&self) -> ObservableState {
        let status = match self.controller.status() {
            Status::Loading => ModelStatus::Loading,
            Status::Ready => ModelStatus::Ready,
            Status::Error(LoadFailure::Timeout { .. }) => ModelStatus::Error { timed_out: true },
            Status::Error(LoadFailure::FrameReported) => ModelStatus::Error { timed_out: false },
            Status::Offline { .. } => ModelStatus::Offline,
        };

        ObservableState {
            status,
            online: self.controller.is_online(),
            nonce: self.controller.retry_nonce(),
            mounted_attempt: self.controller.mounted_frame().map(|f| f.attempt),
            watchdog_armed: self.controller.watchdog().is_some(),
            debounce_pending: self.controller.debounce_pending(),
            height: self.controller.render_state().height,
            closed: self.controller.is_closed(),
            signals: self.signals,
            external_opens: self.external_opens,
            closed_notifications: self.closed_notifications,
        }
    }
}

/// Decode operations from raw bytes the way a fuzzer would.
fn operations(bytes: &[u8]) -> Vec<Operation> {
    let mut u = Unstructured::new(bytes);
    let mut ops = Vec::new();
    while !u.is_empty() {
        match Operation::arbitrary(&mut u) {
            Ok(op) => ops.push(op),
            Err(_) => break,
        }
    }
    ops
}

proptest! {
    /// Verify that operation results and observable state match between the
    /// model and the real controller after every operation.
    #[test]
    fn prop_model_matches_real(
        online in any::<bool>(),
        width in 320u32..2_000,
        height in 480u32..1_400,
        bytes in prop::collection::vec(any::<u8>(), 0..512),
    ) {
        let mut model = ModelSession::open(online, width, height);
        let mut real = RealSession::open(online, width, height);
        prop_assert_eq!(model.observable_state(), real.observable_state());

        for (i, op) in operations(&bytes).iter().enumerate() {
            let model_result = model.apply(op);
            let real_result = real.apply(op);

            prop_assert_eq!(
                &model_result,
                &real_result,
                "Result divergence at operation {}: {:?}", i, op
            );
            prop_assert_eq!(
                model.observable_state(),
                real.observable_state(),
                "State divergence at operation {} ({:?}) at {} ms", i, op, model.now_ms()
            );
        }
    }

    /// A long enough quiet period always resolves a load one way or another.
    #[test]
    fn prop_no_session_loads_forever(
        bytes in prop::collection::vec(any::<u8>(), 0..256),
    ) {
        let mut model = ModelSession::open(true, 390, 844);
        let mut real = RealSession::open(true, 390, 844);
        for op in operations(&bytes) {
            model.apply(&op);
            real.apply(&op);
        }

        let quiet = Operation::AdvanceTime { millis: 15_000 };
        model.apply(&quiet);
        real.apply(&quiet);

        prop_assert_ne!(real.observable_state().status, ModelStatus::Loading);
        prop_assert_eq!(model.observable_state(), real.observable_state());
    }
}

#[test]
fn timeout_then_late_load_matches_model() {
    let ops = [
        Operation::AdvanceTime { millis: 15_000 },
        Operation::FrameLoaded,
        Operation::GoOffline,
        Operation::GoOnline,
        Operation::Retry,
        Operation::StaleOutcome { loaded: true },
        Operation::FrameLoaded,
    ];
    let mut model = ModelSession::open(true, 390, 844);
    let mut real = RealSession::open(true, 390, 844);

    for op in &ops {
        assert_eq!(model.apply(op), real.apply(op), "{op:?}");
        assert_eq!(model.observable_state(), real.observable_state(), "{op:?}");
    }
    assert_eq!(real.observable_state().status, ModelStatus::Ready);
    assert_eq!(real.observable_state().nonce, 1);
}
