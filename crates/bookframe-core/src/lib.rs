//! Core lifecycle logic for an embedded booking frame.
//!
//! Pure state machines with no I/O: every operation takes the current time as
//! input and returns actions for a driver to execute, enabling deterministic
//! simulation testing with the same code that runs in production.
//!
//! # Components
//!
//! - [`FrameController`]: session lifecycle (loading, ready, error, offline)
//! - [`MessageGateway`]: origin check and payload interpretation for
//!   cross-origin messages
//! - [`ViewportReconciler`]: debounced available-height computation
//! - [`FallbackNavigator`]: popup-then-direct-navigation escape hatch
//! - [`Environment`]: time abstraction implemented by production and
//!   simulation environments

#![forbid(unsafe_code)]

pub mod action;
pub mod booking;
pub mod config;
pub mod connectivity;
pub mod controller;
pub mod env;
pub mod error;
pub mod event;
pub mod fallback;
pub mod gateway;
pub mod state;
pub mod timer;
pub mod viewport;

pub use action::{FrameAction, Listener};
pub use booking::{BookingUrl, FrameSpec, SandboxToken};
pub use config::{FrameConfig, ViewportConfig};
pub use connectivity::{ConnectivityChange, ConnectivityMonitor};
pub use controller::{FrameController, OpenContext};
pub use env::Environment;
pub use error::{FallbackError, FrameError, GatewayError, LoadFailure};
pub use event::{FrameEvent, UserIntent};
pub use fallback::{FallbackNavigator, FallbackOutcome, FallbackStep, PopupAttempt};
pub use gateway::{BookingSignal, InboundMessage, MessageData, MessageGateway, Verdict};
pub use state::{Interrupted, Overlay, RenderState, Status};
pub use timer::{OneShot, TimerKind};
pub use viewport::{ViewportReconciler, available_height};
