//! Session configuration
//!
//! `SessionConfig` bundles what the host hands to `Player::init`: the source
//! URL, autoplay and debug flags, the request headers every engine request
//! must carry, and the opaque DRM protection data.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use url::Url;

/// Something that accepts outgoing request headers (an XHR, a fetch init...)
pub trait HeaderTarget {
    fn set_request_header(&mut self, name: &str, value: &str);
}

/// Request headers applied to every engine-issued request.
///
/// Names are case-sensitive and passed through as given.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestHeaders(HashMap<String, String>);

impl RequestHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Write every header onto `target`
    pub fn apply(&self, target: &mut dyn HeaderTarget) {
        for (name, value) in &self.0 {
            target.set_request_header(name, value);
        }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for RequestHeaders {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// DRM protection data handed to the DASH engine untouched.
///
/// Usually an object keyed by key system (`"com.widevine.alpha"`), each entry
/// holding a license server URL and optional request headers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProtectionData(serde_json::Value);

impl ProtectionData {
    pub fn new(value: serde_json::Value) -> Self {
        Self(value)
    }

    pub fn as_value(&self) -> &serde_json::Value {
        &self.0
    }

    /// Key system names present in the blob
    pub fn key_systems(&self) -> Vec<&str> {
        self.0
            .as_object()
            .map(|map| map.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// Configuration for one playback session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Manifest URL, absolute or relative to the hosting page
    pub url: String,
    /// Start playback as soon as the engine is ready
    #[serde(default)]
    pub autoplay: bool,
    /// Enable debug logging in the adapters and the engines
    #[serde(default)]
    pub debug: bool,
    /// Headers injected into every engine request
    #[serde(default)]
    pub headers: Option<RequestHeaders>,
    /// DRM protection data (DASH only)
    #[serde(default)]
    pub protection_data: Option<ProtectionData>,
}

impl SessionConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            autoplay: false,
            debug: false,
            headers: None,
            protection_data: None,
        }
    }

    pub fn with_autoplay(mut self, autoplay: bool) -> Self {
        self.autoplay = autoplay;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_headers(mut self, headers: RequestHeaders) -> Self {
        self.headers = Some(headers);
        self
    }

    pub fn with_protection_data(mut self, data: ProtectionData) -> Self {
        self.protection_data = Some(data);
        self
    }

    /// Parse a configuration from its JSON form
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SessionConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check the source URL.
    ///
    /// Relative URLs are accepted since they resolve against the hosting page.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(Error::InvalidConfig("source url is empty".into()));
        }

        match Url::parse(&self.url) {
            Ok(_) | Err(url::ParseError::RelativeUrlWithoutBase) => Ok(()),
            Err(e) => Err(Error::InvalidConfig(format!("invalid source url {}: {}", self.url, e))),
        }
    }
}
