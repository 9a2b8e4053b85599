//! Session configuration.
//!
//! Every constant the lifecycle depends on lives in [`FrameConfig`], with
//! defaults tuned for mobile browsers and webviews.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FrameError;

/// Maximum time a frame may stay loading before the session errors out.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(15);

/// Delay before recomputing heights after a resize or orientation change.
///
/// Long enough to let on-screen keyboard animations settle.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(100);

/// Time a popup gets to prove it opened before direct navigation kicks in.
pub const DEFAULT_FALLBACK_GRACE: Duration = Duration::from_millis(100);

/// Query parameter carrying the cache-bust value on retried frame URLs.
pub const DEFAULT_CACHE_BUST_PARAM: &str = "_t";

/// Window features for the external popup (typical phone form factor).
pub const DEFAULT_POPUP_FEATURES: &str =
    "noopener,noreferrer,width=375,height=667,scrollbars=yes,resizable=yes";

/// Viewport meta content applied while the overlay is open.
pub const LOCKED_VIEWPORT_CONTENT: &str =
    "width=device-width, initial-scale=1.0, maximum-scale=1.0, user-scalable=no, viewport-fit=cover";

/// Configuration for a booking frame session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Load watchdog timeout.
    #[serde(with = "millis")]
    pub load_timeout: Duration,
    /// Resize/orientation debounce delay.
    #[serde(with = "millis")]
    pub resize_debounce: Duration,
    /// Popup confirmation grace period.
    #[serde(with = "millis")]
    pub fallback_grace: Duration,
    /// Host chrome offsets used for height reconciliation.
    pub viewport: ViewportConfig,
    /// Domain of the booking provider. Messages from any other origin are
    /// discarded.
    pub trusted_domain: String,
    /// Query parameter name for the cache-bust value.
    pub cache_bust_param: String,
    /// Window features passed when opening the booking externally.
    pub popup_features: String,
    /// Viewport meta content applied to the host page while open.
    pub locked_viewport: String,
    /// Human support contact shown in the error view. `None` hides it.
    pub support_contact: Option<String>,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            fallback_grace: DEFAULT_FALLBACK_GRACE,
            viewport: ViewportConfig::default(),
            trusted_domain: "bokadirekt.se".to_string(),
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_string(),
            popup_features: DEFAULT_POPUP_FEATURES.to_string(),
            locked_viewport: LOCKED_VIEWPORT_CONTENT.to_string(),
            support_contact: None,
        }
    }
}

impl FrameConfig {
    /// Config trusting the given provider domain, everything else default.
    pub fn for_domain(trusted_domain: impl Into<String>) -> Self {
        Self { trusted_domain: trusted_domain.into(), ..Self::default() }
    }

    /// Reject configurations that would break lifecycle guarantees.
    ///
    /// # Errors
    ///
    /// - `FrameError::InvalidConfig` if the load timeout is zero (the watchdog
    ///   would fire before any frame could load), the trusted domain is empty
    ///   (every origin would be trusted), or the cache-bust parameter is empty
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.load_timeout.is_zero() {
            return Err(FrameError::InvalidConfig("load_timeout must be non-zero".into()));
        }
        if self.trusted_domain.trim().is_empty() {
            return Err(FrameError::InvalidConfig("trusted_domain must not be empty".into()));
        }
        if self.cache_bust_param.is_empty() {
            return Err(FrameError::InvalidConfig("cache_bust_param must not be empty".into()));
        }
        Ok(())
    }
}

/// Fixed pixel offsets of the host navigation chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewportConfig {
    /// Height of the overlay header, always present.
    pub header_height: u32,
    /// Height of the host bottom navigation bar.
    pub bottom_nav_height: u32,
    /// Widths at or below this value show the bottom navigation.
    pub nav_breakpoint: u32,
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self { header_height: 48, bottom_nav_height: 64, nav_breakpoint: 1024 }
    }
}

mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub(super) fn serialize<S: Serializer>(value: &Duration, ser: S) -> Result<S::Ok, S::Error> {
        ser.serialize_u64(value.as_millis() as u64)
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(de: D) -> Result<Duration, D::Error> {
        u64::deserialize(de).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert!(FrameConfig::default().validate().is_ok());
        assert_eq!(FrameConfig::default().load_timeout, Duration::from_secs(15));
    }

    #[test]
    fn zero_timeout_rejected() {
        let config = FrameConfig { load_timeout: Duration::ZERO, ..FrameConfig::default() };
        assert!(matches!(config.validate(), Err(FrameError::InvalidConfig(_))));
    }

    #[test]
    fn empty_domain_rejected() {
        let config = FrameConfig::for_domain("  ");
        assert!(matches!(config.validate(), Err(FrameError::InvalidConfig(_))));
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let json = r#"{"load_timeout": 5000, "trusted_domain": "booking.example"}"#;
        let config: FrameConfig = serde_json::from_str(json).unwrap_or_default();

        assert_eq!(config.load_timeout, Duration::from_secs(5));
        assert_eq!(config.trusted_domain, "booking.example");
        assert_eq!(config.resize_debounce, DEFAULT_RESIZE_DEBOUNCE);
        assert_eq!(config.viewport.header_height, 48);
    }
}
