//! Booking destination and frame embedding contract.
//!
//! [`BookingUrl`] validates the caller-supplied destination once and produces
//! cache-busted variants for retries. [`FrameSpec`] is everything a driver
//! needs to mount the sandboxed frame.

use std::fmt;

use url::Url;

use crate::error::FrameError;

/// Validated absolute http(s) booking URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookingUrl {
    url: Url,
}

impl BookingUrl {
    /// Parse and validate a booking URL.
    ///
    /// # Errors
    ///
    /// - `FrameError::InvalidBookingUrl` if the URL is relative, not http(s),
    ///   or has no host
    pub fn parse(input: &str) -> Result<Self, FrameError> {
        let invalid = |reason: String| FrameError::InvalidBookingUrl { url: input.to_string(), reason };

        let url = Url::parse(input).map_err(|e| invalid(e.to_string()))?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(invalid(format!("unsupported scheme {}", url.scheme())));
        }
        if url.host_str().is_none_or(str::is_empty) {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self { url })
    }

    /// The URL exactly as supplied.
    pub fn as_url(&self) -> &Url {
        &self.url
    }

    /// URL with `param` set to `value`.
    ///
    /// Any existing occurrences of `param` are dropped; every other query
    /// pair, the path, and the fragment are kept byte-for-byte.
    pub fn with_cache_bust(&self, param: &str, value: &str) -> Url {
        let mut url = self.url.clone();
        let bust = format!("{param}={value}");

        let mut pairs: Vec<&str> = self
            .url
            .query()
            .unwrap_or_default()
            .split('&')
            .filter(|pair| !pair.is_empty())
            .filter(|pair| pair.split('=').next() != Some(param))
            .collect();
        pairs.push(&bust);
        url.set_query(Some(&pairs.join("&")));
        url
    }
}

impl fmt::Display for BookingUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.url.fmt(f)
    }
}

/// Capabilities granted to the embedded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SandboxToken {
    /// Script execution.
    Scripts,
    /// Same-origin storage for the provider's own session.
    SameOrigin,
    /// Form submission.
    Forms,
    /// Popup creation (payment providers).
    Popups,
    /// Popups are not sandboxed themselves.
    PopupsToEscapeSandbox,
    /// Top-level navigation, only on user activation.
    TopNavigationByUserActivation,
}

impl SandboxToken {
    /// Minimum capability set the booking form needs.
    pub const MINIMAL: &'static [Self] = &[
        Self::Scripts,
        Self::SameOrigin,
        Self::Forms,
        Self::Popups,
        Self::PopupsToEscapeSandbox,
        Self::TopNavigationByUserActivation,
    ];

    /// Attribute keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Scripts => "allow-scripts",
            Self::SameOrigin => "allow-same-origin",
            Self::Forms => "allow-forms",
            Self::Popups => "allow-popups",
            Self::PopupsToEscapeSandbox => "allow-popups-to-escape-sandbox",
            Self::TopNavigationByUserActivation => "allow-top-navigation-by-user-activation",
        }
    }
}

/// Everything needed to mount one frame attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSpec {
    /// URL to navigate the frame to.
    pub url: Url,
    /// Attempt number. Load outcomes must echo it back.
    pub attempt: u64,
    /// Accessible frame title.
    pub title: String,
    /// Granted sandbox capabilities.
    pub sandbox: &'static [SandboxToken],
    /// Permissions policy.
    pub allow: &'static str,
    /// Referrer policy.
    pub referrer_policy: &'static str,
}

impl FrameSpec {
    /// Frame spec with the minimal sandbox for the given attempt.
    pub fn new(url: Url, attempt: u64, service_name: &str) -> Self {
        Self {
            url,
            attempt,
            title: format!("Secure booking - {service_name}"),
            sandbox: SandboxToken::MINIMAL,
            allow: "payment; geolocation",
            referrer_policy: "strict-origin-when-cross-origin",
        }
    }

    /// Space-separated `sandbox` attribute value.
    pub fn sandbox_attribute(&self) -> String {
        self.sandbox.iter().map(|t| t.keyword()).collect::<Vec<_>>().join(" ")
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn booking(input: &str) -> BookingUrl {
        match BookingUrl::parse(input) {
            Ok(url) => url,
            Err(e) => unreachable!("test url must parse: {e}"),
        }
    }

    #[test]
    fn rejects_relative_and_non_http() {
        assert!(BookingUrl::parse("/svc/123").is_err());
        assert!(BookingUrl::parse("javascript:alert(1)").is_err());
        assert!(BookingUrl::parse("ftp://booking.example/svc").is_err());
        assert!(BookingUrl::parse("https://booking.example/svc/123").is_ok());
    }

    #[test]
    fn cache_bust_appends_param() {
        let url = booking("https://booking.example/svc/123");
        let busted = url.with_cache_bust("_t", "1700000000000-1");

        assert_eq!(busted.as_str(), "https://booking.example/svc/123?_t=1700000000000-1");
    }

    #[test]
    fn cache_bust_overwrites_and_preserves_rest() {
        let url = booking("https://booking.example/svc?lang=sv&_t=old&x=a%20b#step-2");
        let busted = url.with_cache_bust("_t", "42-2");

        assert_eq!(busted.query(), Some("lang=sv&x=a%20b&_t=42-2"));
        assert_eq!(busted.fragment(), Some("step-2"));
        assert_eq!(busted.path(), "/svc");
        // Original is untouched
        assert_eq!(url.as_url().query(), Some("lang=sv&_t=old&x=a%20b"));
    }

    #[test]
    fn minimal_sandbox_attribute() {
        let spec = FrameSpec::new(booking("https://booking.example/").as_url().clone(), 0, "Cut");

        assert_eq!(
            spec.sandbox_attribute(),
            "allow-scripts allow-same-origin allow-forms allow-popups \
             allow-popups-to-escape-sandbox allow-top-navigation-by-user-activation"
        );
        assert_eq!(spec.title, "Secure booking - Cut");
    }

    proptest! {
        #[test]
        fn cache_bust_keeps_other_pairs(
            pairs in prop::collection::vec(("[a-z]{1,6}", "[a-z0-9]{0,6}"), 0..5),
            nonce in 0u64..1_000,
        ) {
            let query: Vec<String> = pairs
                .iter()
                .filter(|(k, _)| k != "_t")
                .map(|(k, v)| format!("{k}={v}"))
                .collect();
            let input = if query.is_empty() {
                "https://booking.example/svc".to_string()
            } else {
                format!("https://booking.example/svc?{}", query.join("&"))
            };
            let busted = booking(&input).with_cache_bust("_t", &format!("1-{nonce}"));

            let mut expected = query.clone();
            expected.push(format!("_t=1-{nonce}"));
            let expected = expected.join("&");
            prop_assert_eq!(busted.query(), Some(expected.as_str()));
            prop_assert_eq!(busted.path(), "/svc");
        }
    }
}
