//! Deterministic simulation harness for booking frame sessions.
//!
//! Virtual-time implementations of the Environment and Driver traits for
//! deterministic, reproducible testing of whole sessions, including timeouts,
//! connectivity drops, and blocked popups.
//!
//! # Scenarios
//!
//! A [`Scenario`] describes the platform and a timeline of events. It builds a
//! [`SimDriver`] and a [`bookframe_app::Runtime`] that share one [`SimEnv`]
//! clock.
//!
//! # Model-Based Testing
//!
//! The `model` module provides a reference implementation for model-based
//! testing. Operations are applied to both the model and real implementation,
//! and their observable states are compared.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Use [`InvariantRegistry::standard()`] for the lifecycle
//! invariants.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod invariants;
pub mod model;
pub mod scenario;
pub mod sim_driver;
pub mod sim_env;

pub use invariants::{
    DeadlineIffLoading, FrameOnlyWhenOnline, HostRestored, HostSnapshot, Invariant,
    InvariantRegistry, InvariantResult, NonceMonotonic, SessionSnapshot, TeardownComplete,
    Violation,
};
pub use model::{
    MessageKind, ModelSession, ModelStatus, ObservableState, Operation, OperationError,
    OperationResult,
};
pub use scenario::{FailPoint, PopupBehavior, Scenario, ScriptedStep, SimStep, Viewport};
pub use sim_driver::{DriverCall, SimDriver, SimDriverError, SimObserver, SimPopup, SimState};
pub use sim_env::{DEFAULT_EPOCH_MS, SimEnv, SimInstant};
