//! Scripted session scenarios.
//!
//! A scenario describes the platform a session runs on (connectivity,
//! viewport, host page, popup behavior) and a timeline of platform events.
//! Scenarios are plain JSON so they can be stored as fixtures and replayed by
//! the `bookframe-replay` binary.
//!
//! ```json
//! {
//!   "booking_url": "https://www.bokadirekt.se/boka-tjanst/salong/klippning-123",
//!   "service_name": "Klippning",
//!   "steps": [
//!     { "at_ms": 2000, "event": "frame_loaded" },
//!     { "at_ms": 9000, "event": "close" }
//!   ]
//! }
//! ```

use bookframe_app::Runtime;
use bookframe_core::{FrameConfig, InboundMessage};
use serde::{Deserialize, Serialize};

use crate::{sim_driver::SimDriver, sim_env::SimEnv};

/// Platform event in a scenario timeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum SimStep {
    /// Connectivity restored.
    Online,
    /// Connectivity lost.
    Offline,
    /// The mounted frame finished loading.
    FrameLoaded,
    /// The mounted frame reported a load failure.
    FrameFailed,
    /// Viewport resized.
    Resize {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// Device orientation changed.
    Orientation {
        /// New width in pixels.
        width: u32,
        /// New height in pixels.
        height: u32,
    },
    /// Cross-origin message arrived.
    Message(InboundMessage),
    /// User pressed retry.
    Retry,
    /// User closed the overlay.
    Close,
    /// User chose to open the booking externally.
    OpenExternally,
}

/// Timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptedStep {
    /// Virtual time since session open.
    pub at_ms: u64,
    /// Event delivered at that time.
    #[serde(flatten)]
    pub step: SimStep,
}

/// How the platform treats popup attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopupBehavior {
    /// Popup opens and stays open.
    #[default]
    Survives,
    /// Platform returns no handle.
    Blocked,
    /// Platform raises an error.
    Throws,
    /// Popup opens but is gone by the time it is checked.
    Vanishes,
}

/// Driver operation that fails on purpose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailPoint {
    /// Mounting the frame fails.
    Mount,
    /// Rendering fails.
    Render,
    /// Attaching listeners fails.
    Subscribe,
}

/// Viewport dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self { width: 390, height: 844 }
    }
}

fn default_service_name() -> String {
    "Booking".to_string()
}

fn default_online() -> bool {
    true
}

fn default_viewport_meta() -> Option<String> {
    Some("width=device-width, initial-scale=1".to_string())
}

/// Complete description of one simulated session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Human readable label.
    #[serde(default)]
    pub name: String,
    /// Booking URL passed to the session.
    pub booking_url: String,
    /// Service shown in the overlay header.
    #[serde(default = "default_service_name")]
    pub service_name: String,
    /// Connectivity at open.
    #[serde(default = "default_online")]
    pub online: bool,
    /// Viewport at open.
    #[serde(default)]
    pub viewport: Viewport,
    /// Host page viewport meta content. `None` for a page without one.
    #[serde(default = "default_viewport_meta")]
    pub viewport_meta: Option<String>,
    /// Popup handling.
    #[serde(default)]
    pub popup: PopupBehavior,
    /// Driver operation that fails, if any.
    #[serde(default)]
    pub fail_on: Option<FailPoint>,
    /// Session configuration.
    #[serde(default)]
    pub config: FrameConfig,
    /// Platform events in time order.
    #[serde(default)]
    pub steps: Vec<ScriptedStep>,
}

impl Scenario {
    /// Scenario for `booking_url` with default platform settings and an empty
    /// timeline.
    pub fn new(booking_url: impl Into<String>) -> Self {
        Self {
            name: String::new(),
            booking_url: booking_url.into(),
            service_name: default_service_name(),
            online: true,
            viewport: Viewport::default(),
            viewport_meta: default_viewport_meta(),
            popup: PopupBehavior::default(),
            fail_on: None,
            config: FrameConfig::default(),
            steps: Vec::new(),
        }
    }

    /// Parse a scenario from JSON.
    ///
    /// # Errors
    ///
    /// Returns the parse error if `json` is not a valid scenario.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Use `config` for the session.
    #[must_use]
    pub fn with_config(mut self, config: FrameConfig) -> Self {
        self.config = config;
        self
    }

    /// Start offline.
    #[must_use]
    pub fn offline(mut self) -> Self {
        self.online = false;
        self
    }

    /// Use `behavior` for popup attempts.
    #[must_use]
    pub fn with_popup(mut self, behavior: PopupBehavior) -> Self {
        self.popup = behavior;
        self
    }

    /// Fail the given driver operation.
    #[must_use]
    pub fn failing_on(mut self, point: FailPoint) -> Self {
        self.fail_on = Some(point);
        self
    }

    /// Append a step at `at_ms`.
    #[must_use]
    pub fn step(mut self, at_ms: u64, step: SimStep) -> Self {
        self.steps.push(ScriptedStep { at_ms, step });
        self
    }

    /// Driver for this scenario on `env`'s clock.
    pub fn driver(&self, env: &SimEnv) -> SimDriver {
        SimDriver::from_scenario(self, env.clone())
    }

    /// Runtime for this scenario on `env`'s clock.
    pub fn runtime(&self, env: &SimEnv) -> Runtime<SimDriver, SimEnv> {
        Runtime::new(
            self.driver(env),
            env.clone(),
            self.config.clone(),
            self.booking_url.clone(),
            self.service_name.clone(),
        )
    }
}
