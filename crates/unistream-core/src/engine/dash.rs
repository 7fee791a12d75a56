//! dash.js capabilities

use crate::config::{HeaderTarget, ProtectionData, RequestHeaders};
use crate::error::Result;
use crate::events::{types, Payload};
use crate::sink::MediaSink;
use std::rc::Rc;

/// Robustness level requested whenever protection data is supplied
pub const SW_SECURE_CRYPTO: &str = "SW_SECURE_CRYPTO";

/// Manifest type of a live (dynamic) MPD
pub const DYNAMIC_MANIFEST: &str = "dynamic";

/// Engine events the adapter subscribes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DashEventKind {
    MetricChanged,
    StreamInitialized,
    ManifestLoaded,
    Error,
}

impl DashEventKind {
    /// Subscription order used by the adapter
    pub const ALL: [DashEventKind; 4] = [
        DashEventKind::MetricChanged,
        DashEventKind::StreamInitialized,
        DashEventKind::ManifestLoaded,
        DashEventKind::Error,
    ];

    /// dash.js event name, also used as the normalized event type
    pub fn name(&self) -> &'static str {
        match self {
            DashEventKind::MetricChanged => types::METRIC_CHANGED,
            DashEventKind::StreamInitialized => types::STREAM_INITIALIZED,
            DashEventKind::ManifestLoaded => types::MANIFEST_LOADED,
            DashEventKind::Error => types::ERROR,
        }
    }
}

/// The `error` member of a dash.js error event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DashError {
    /// Structured error with a numeric code
    Code { code: i64, message: String },
    /// Bare string error such as `"key_session"`
    Named(String),
}

impl DashError {
    pub fn message(&self) -> &str {
        match self {
            DashError::Code { message, .. } => message,
            DashError::Named(name) => name,
        }
    }
}

impl std::fmt::Display for DashError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DashError::Code { code, message } => write!(f, "[{}] {}", code, message),
            DashError::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone)]
pub enum DashEvent {
    MetricChanged(Payload),
    StreamInitialized(Payload),
    ManifestLoaded {
        /// `data.type` of the loaded manifest (`"static"` or `"dynamic"`)
        manifest_type: Option<String>,
        payload: Payload,
    },
    Error {
        error: DashError,
        payload: Payload,
    },
}

impl DashEvent {
    pub fn kind(&self) -> DashEventKind {
        match self {
            DashEvent::MetricChanged(_) => DashEventKind::MetricChanged,
            DashEvent::StreamInitialized(_) => DashEventKind::StreamInitialized,
            DashEvent::ManifestLoaded { .. } => DashEventKind::ManifestLoaded,
            DashEvent::Error { .. } => DashEventKind::Error,
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            DashEvent::MetricChanged(payload)
            | DashEvent::StreamInitialized(payload)
            | DashEvent::ManifestLoaded { payload, .. }
            | DashEvent::Error { payload, .. } => payload,
        }
    }
}

pub type DashListener = Rc<dyn Fn(&DashEvent)>;

/// One entry of `getBitrateInfoListFor("video")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashBitrateInfo {
    pub quality_index: i32,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
}

/// One entry of `getTracksFor("audio")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DashTrackInfo {
    pub index: i32,
    pub lang: String,
    pub name: String,
}

/// Functions registered through the engine's `RequestModifier` extension
#[derive(Debug, Clone)]
pub struct RequestModifier {
    headers: RequestHeaders,
}

impl RequestModifier {
    pub fn new(headers: RequestHeaders) -> Self {
        Self { headers }
    }

    pub fn modify_request_header(&self, request: &mut dyn HeaderTarget) {
        self.headers.apply(request);
    }

    /// Request URLs are passed through unchanged
    pub fn modify_request_url(&self, url: &str) -> String {
        url.to_string()
    }
}

pub trait DashEngine {
    fn on(&self, kind: DashEventKind, listener: &DashListener);
    fn off(&self, kind: DashEventKind, listener: &DashListener);

    fn set_fast_switch_enabled(&self, enabled: bool);
    fn set_log_to_console(&self, enabled: bool);

    fn set_robustness_level(&self, level: &str);
    fn set_protection_data(&self, data: &ProtectionData);
    fn extend_request_modifier(&self, modifier: RequestModifier);

    /// Attach to `sink` and start loading `url`
    fn initialize(&self, sink: &Rc<dyn MediaSink>, url: &str, autoplay: bool);

    fn audio_tracks(&self) -> Vec<DashTrackInfo>;
    fn set_current_track(&self, track: &DashTrackInfo);

    fn video_bitrates(&self) -> Vec<DashBitrateInfo>;
    /// Active video quality index
    fn video_quality(&self) -> i32;
    fn set_video_quality(&self, index: i32);
    fn set_auto_switch_quality(&self, enabled: bool);

    fn reset(&self);
}

/// Builds a fresh engine for each adapter `init`
pub trait DashEngineFactory {
    type Engine: DashEngine + 'static;

    fn create(&self) -> Result<Self::Engine>;
}
