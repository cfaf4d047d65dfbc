//! Send settings.
//!
//! Settings are read-only once a [`Transaction`](crate::Transaction) is built.
//! They deserialize from JSON with every field optional:
//!
//! ```json
//! {
//!     "signature": "Sent from courier",
//!     "split": true,
//!     "split_counter": true,
//!     "mmsc": {
//!         "url": "http://mms.example.net/mms",
//!         "proxy": { "host": "10.0.0.1", "port": 8080 }
//!     }
//! }
//! ```

use std::path::Path;

use courier_pdu::FailurePolicy;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Default page count above which a long text goes out as MMS.
pub const DEFAULT_LONG_AS_MMS_AFTER: usize = 3;

/// Message sending settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Appended to every SMS body after a newline.
    pub signature: String,
    /// Prefixed to every SMS body, followed by a space. Not stored.
    pub pre_text: String,
    /// Strip accents before sending SMS.
    pub strip_unicode: bool,
    /// Split long bodies into separate messages instead of one multi-part SMS.
    pub split: bool,
    /// Prefix split messages with `(i/total) `.
    pub split_counter: bool,
    /// Request delivery reports.
    pub delivery_reports: bool,
    /// Send to several recipients as one group MMS.
    pub group: bool,
    /// Send long texts as MMS.
    pub send_long_as_mms: bool,
    /// Page count above which `send_long_as_mms` applies.
    pub send_long_as_mms_after: usize,
    /// Submit SMS segments one by one instead of as one multi-part request.
    pub send_segments_individually: bool,
    /// What to do with parts that cannot be built.
    pub failure_policy: FailurePolicy,
    /// Own phone number, used as the MMS sender.
    pub own_number: Option<String>,
    /// MMS gateway.
    pub mmsc: Option<MmscSettings>,
    /// Action names carried on receipt tokens.
    pub signal_actions: SignalActions,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            signature: String::new(),
            pre_text: String::new(),
            strip_unicode: false,
            split: false,
            split_counter: false,
            delivery_reports: false,
            group: false,
            send_long_as_mms: false,
            send_long_as_mms_after: DEFAULT_LONG_AS_MMS_AFTER,
            send_segments_individually: false,
            failure_policy: FailurePolicy::default(),
            own_number: None,
            mmsc: None,
            signal_actions: SignalActions::default(),
        }
    }
}

impl Settings {
    /// Parses settings from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is invalid or the gateway URL does not parse.
    pub fn from_json(json: &str) -> Result<Self> {
        let settings: Self = serde_json::from_str(json)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Loads settings from a JSON file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    fn validate(&self) -> Result<()> {
        if let Some(mmsc) = &self.mmsc {
            mmsc.route_host()?;
        }
        Ok(())
    }

    /// Returns the signature, if one is set.
    #[must_use]
    pub fn signature(&self) -> Option<&str> {
        Some(self.signature.as_str()).filter(|s| !s.is_empty())
    }

    /// Returns the pre-text, if one is set.
    #[must_use]
    pub fn pre_text(&self) -> Option<&str> {
        Some(self.pre_text.as_str()).filter(|s| !s.is_empty())
    }

    /// Returns the sender number, if one is set.
    #[must_use]
    pub fn own_number(&self) -> Option<&str> {
        self.own_number.as_deref().filter(|s| !s.trim().is_empty())
    }
}

/// MMS gateway (MMSC) settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MmscSettings {
    /// Gateway URL the PDU is posted to.
    pub url: String,
    /// HTTP proxy in front of the gateway.
    #[serde(default)]
    pub proxy: Option<ProxyConfig>,
}

impl MmscSettings {
    /// Creates gateway settings without a proxy.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            proxy: None,
        }
    }

    /// Sets the proxy.
    #[must_use]
    pub fn with_proxy(mut self, host: impl Into<String>, port: u16) -> Self {
        self.proxy = Some(ProxyConfig {
            host: host.into(),
            port,
        });
        self
    }

    /// Host a route must exist to before posting: the proxy if set,
    /// otherwise the gateway itself.
    ///
    /// # Errors
    ///
    /// Returns an error if the gateway URL has no host.
    pub fn route_host(&self) -> Result<String> {
        if let Some(proxy) = &self.proxy {
            return Ok(proxy.host.clone());
        }
        let url = url::Url::parse(&self.url)
            .map_err(|e| Error::Config(format!("Invalid MMSC URL {}: {e}", self.url)))?;
        url.host_str()
            .map(ToString::to_string)
            .ok_or_else(|| Error::Config(format!("MMSC URL has no host: {}", self.url)))
    }
}

/// HTTP proxy address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Proxy host.
    pub host: String,
    /// Proxy port.
    pub port: u16,
}

impl ProxyConfig {
    /// Returns the proxy as an `http://host:port` URL.
    #[must_use]
    pub fn url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }
}

/// Action names carried on send and delivery receipt tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SignalActions {
    /// Action on send receipts.
    pub sent: String,
    /// Action on delivery receipts.
    pub delivered: String,
}

impl Default for SignalActions {
    fn default() -> Self {
        Self {
            sent: "courier.SMS_SENT".to_string(),
            delivered: "courier.SMS_DELIVERED".to_string(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_from_empty_json() {
        let settings = Settings::from_json("{}").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.send_long_as_mms_after, DEFAULT_LONG_AS_MMS_AFTER);
        assert_eq!(settings.failure_policy, FailurePolicy::BestEffort);
        assert!(settings.signature().is_none());
    }

    #[test]
    fn test_partial_json() {
        let settings = Settings::from_json(
            r#"{
                "signature": "sig",
                "split": true,
                "failure_policy": "strict",
                "mmsc": { "url": "http://mms.example.net:8002/mms" },
                "signal_actions": { "sent": "app.SENT" }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.signature(), Some("sig"));
        assert!(settings.split);
        assert!(settings.failure_policy.is_strict());
        assert_eq!(settings.signal_actions.sent, "app.SENT");
        assert_eq!(settings.signal_actions.delivered, "courier.SMS_DELIVERED");
        assert_eq!(
            settings.mmsc.unwrap().route_host().unwrap(),
            "mms.example.net"
        );
    }

    #[test]
    fn test_invalid_mmsc_url() {
        let err = Settings::from_json(r#"{ "mmsc": { "url": "not a url" } }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_route_host_prefers_proxy() {
        let mmsc = MmscSettings::new("http://mms.example.net/mms").with_proxy("10.0.0.1", 8080);
        assert_eq!(mmsc.route_host().unwrap(), "10.0.0.1");
        assert_eq!(mmsc.proxy.unwrap().url(), "http://10.0.0.1:8080");
    }

    #[test]
    fn test_load_missing_file() {
        let err = Settings::load("/nonexistent/courier.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
