//! Model-based testing support.
//!
//! [`ModelSession`] is a plain reference implementation of the session
//! lifecycle. Tests apply the same [`Operation`] sequence to the model and to
//! the real controller, then compare their [`ObservableState`].

mod operation;
mod session;

pub use operation::{MessageKind, Operation, OperationError, OperationResult};
pub use session::{
    MODEL_DEBOUNCE_MS, MODEL_LOAD_TIMEOUT_MS, ModelSession, ModelStatus, ObservableState,
};
