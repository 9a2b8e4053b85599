//! Cross-origin message gateway.
//!
//! The embedded booking form may post messages to the host page. Only the
//! booking provider is trusted; everything else is dropped without any
//! observable effect. Trusted payloads are interpreted for observation only
//! and never drive the lifecycle.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::GatewayError;

/// Message received from another browsing context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Origin declared by the platform for the sender.
    pub origin: String,
    /// Message payload.
    pub data: MessageData,
}

impl InboundMessage {
    /// Message with a string payload.
    pub fn text(origin: impl Into<String>, data: impl Into<String>) -> Self {
        Self { origin: origin.into(), data: MessageData::Text(data.into()) }
    }

    /// Message with an already structured payload.
    pub fn json(origin: impl Into<String>, data: serde_json::Value) -> Self {
        Self { origin: origin.into(), data: MessageData::Json(data) }
    }
}

/// Message payload as delivered by the platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageData {
    /// String that may contain JSON.
    Text(String),
    /// Structured clone of an object.
    Json(serde_json::Value),
}

/// Booking events the provider reports through messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BookingSignal {
    /// The form navigated internally.
    Navigation {
        /// Location reported by the form.
        url: String,
    },
    /// The booking went through.
    BookingComplete,
}

/// Outcome of inspecting one message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Origin not trusted.
    Rejected,
    /// Trusted origin, but nothing recognizable in the payload.
    Ignored,
    /// Trusted origin with a recognized booking signal.
    Observed(BookingSignal),
}

#[derive(Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Payload {
    Navigation {
        #[serde(default)]
        url: Option<String>,
    },
    BookingComplete,
    #[serde(other)]
    Unknown,
}

/// Origin-checking message gateway.
#[derive(Debug, Clone)]
pub struct MessageGateway {
    trusted_domain: String,
}

impl MessageGateway {
    /// Gateway trusting `trusted_domain` and its subdomains.
    pub fn new(trusted_domain: impl Into<String>) -> Self {
        Self { trusted_domain: trusted_domain.into().trim().to_ascii_lowercase() }
    }

    /// Whether `origin` belongs to the trusted provider.
    ///
    /// The origin's host must equal the trusted domain or end with
    /// `.<domain>`. Opaque origins (`null`) and unparsable origins are never
    /// trusted.
    pub fn is_trusted(&self, origin: &str) -> bool {
        let Ok(url) = Url::parse(origin) else {
            return false;
        };
        let Some(host) = url.host_str() else {
            return false;
        };
        let host = host.to_ascii_lowercase();
        let domain = self.trusted_domain.as_str();

        !domain.is_empty()
            && (host == domain
                || host.strip_suffix(domain).is_some_and(|prefix| prefix.ends_with('.')))
    }

    /// Inspect a message. Never fails; problems are logged and discarded.
    pub fn inspect(&self, message: &InboundMessage) -> Verdict {
        match self.classify(message) {
            Ok(Some(signal)) => {
                tracing::debug!(?signal, "booking signal observed");
                Verdict::Observed(signal)
            },
            Ok(None) => Verdict::Ignored,
            Err(GatewayError::UntrustedOrigin) => Verdict::Rejected,
            Err(e) => {
                tracing::trace!(error = %e, "discarding trusted message");
                Verdict::Ignored
            },
        }
    }

    fn classify(&self, message: &InboundMessage) -> Result<Option<BookingSignal>, GatewayError> {
        if !self.is_trusted(&message.origin) {
            return Err(GatewayError::UntrustedOrigin);
        }

        let payload = match &message.data {
            MessageData::Text(text) => serde_json::from_str::<Payload>(text)?,
            MessageData::Json(value) => Payload::deserialize(value)?,
        };

        Ok(match payload {
            Payload::Navigation { url: Some(url) } => Some(BookingSignal::Navigation { url }),
            Payload::BookingComplete => Some(BookingSignal::BookingComplete),
            Payload::Navigation { url: None } | Payload::Unknown => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn gateway() -> MessageGateway {
        MessageGateway::new("booking.example")
    }

    #[test]
    fn trusts_domain_and_subdomains_only() {
        let gw = gateway();

        assert!(gw.is_trusted("https://booking.example"));
        assert!(gw.is_trusted("https://www.booking.example"));
        assert!(gw.is_trusted("https://WIDGET.Booking.Example:8443"));

        assert!(!gw.is_trusted("https://evilbooking.example"));
        assert!(!gw.is_trusted("https://booking.example.attacker.net"));
        assert!(!gw.is_trusted("null"));
        assert!(!gw.is_trusted(""));
    }

    #[test]
    fn untrusted_origin_rejected_even_with_valid_payload() {
        let msg = InboundMessage::json("https://attacker.net", json!({"type": "booking_complete"}));
        assert_eq!(gateway().inspect(&msg), Verdict::Rejected);
    }

    #[test]
    fn recognizes_string_and_object_payloads() {
        let gw = gateway();

        let text = InboundMessage::text(
            "https://booking.example",
            r#"{"type":"navigation","url":"https://booking.example/step/2"}"#,
        );
        assert_eq!(
            gw.inspect(&text),
            Verdict::Observed(BookingSignal::Navigation {
                url: "https://booking.example/step/2".into()
            })
        );

        let object = InboundMessage::json(
            "https://booking.example",
            json!({"type": "booking_complete", "id": 7}),
        );
        assert_eq!(gw.inspect(&object), Verdict::Observed(BookingSignal::BookingComplete));
    }

    #[test]
    fn navigation_without_url_is_ignored() {
        let msg = InboundMessage::json("https://booking.example", json!({"type": "navigation"}));
        assert_eq!(gateway().inspect(&msg), Verdict::Ignored);
    }

    #[test]
    fn malformed_and_unknown_payloads_are_ignored() {
        let gw = gateway();
        let origin = "https://booking.example";

        for msg in [
            InboundMessage::text(origin, "{not json"),
            InboundMessage::text(origin, "hello"),
            InboundMessage::json(origin, json!(42)),
            InboundMessage::json(origin, json!({"kind": "navigation"})),
            InboundMessage::json(origin, json!({"type": "resize", "height": 900})),
            InboundMessage::json(origin, json!({"type": 3})),
        ] {
            assert_eq!(gw.inspect(&msg), Verdict::Ignored, "{msg:?}");
        }
    }
}
