//! Application layer for the booking frame.
//!
//! Generic runtime that executes [`bookframe_core`] actions against a
//! platform, so the same orchestration runs in an embedding and in
//! deterministic simulation.
//!
//! # Components
//!
//! - [`Driver`]: Trait for platform-specific effects
//! - [`HostGuard`]: Scoped lock on host page scrolling and zoom
//! - [`Runtime`]: Generic orchestration loop using Driver
//! - [`SystemEnv`]: Production environment backed by system time

#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod driver;
mod host;
mod runtime;
mod system_env;

pub use driver::Driver;
pub use host::{HostGuard, HostPage};
pub use runtime::{Runtime, RuntimeError, SessionReport};
pub use system_env::SystemEnv;
