//! hls.js capabilities

use crate::config::{HeaderTarget, RequestHeaders};
use crate::error::Result;
use crate::events::{types, Payload};
use crate::sink::MediaSink;
use std::rc::Rc;

/// `details.type` of an on-demand playlist
pub const VOD_PLAYLIST: &str = "VOD";

/// Options the adapter builds the engine with
#[derive(Debug, Clone, Default)]
pub struct HlsConfig {
    pub enable_worker: bool,
    pub debug: bool,
    pub headers: Option<RequestHeaders>,
}

impl HlsConfig {
    /// `xhrSetup` hook: inject the session headers into an outgoing request
    pub fn xhr_setup(&self, request: &mut dyn HeaderTarget, _url: &str) {
        if let Some(headers) = &self.headers {
            headers.apply(request);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HlsEventKind {
    ManifestParsed,
    LevelLoaded,
    Error,
}

impl HlsEventKind {
    pub const ALL: [HlsEventKind; 3] = [
        HlsEventKind::ManifestParsed,
        HlsEventKind::LevelLoaded,
        HlsEventKind::Error,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            HlsEventKind::ManifestParsed => types::HLS_MANIFEST_PARSED,
            HlsEventKind::LevelLoaded => types::HLS_LEVEL_LOADED,
            HlsEventKind::Error => types::HLS_ERROR,
        }
    }
}

/// `Hls.ErrorTypes`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HlsErrorType {
    Network,
    Media,
    KeySystem,
    Mux,
    Other(String),
}

impl HlsErrorType {
    pub fn parse(value: &str) -> Self {
        match value {
            "networkError" => HlsErrorType::Network,
            "mediaError" => HlsErrorType::Media,
            "keySystemError" => HlsErrorType::KeySystem,
            "muxError" => HlsErrorType::Mux,
            other => HlsErrorType::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            HlsErrorType::Network => "networkError",
            HlsErrorType::Media => "mediaError",
            HlsErrorType::KeySystem => "keySystemError",
            HlsErrorType::Mux => "muxError",
            HlsErrorType::Other(other) => other,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsErrorData {
    pub error_type: HlsErrorType,
    pub details: String,
    pub fatal: bool,
}

#[derive(Debug, Clone)]
pub enum HlsEvent {
    ManifestParsed(Payload),
    LevelLoaded {
        /// `details.type` of the loaded level, `None` when details are missing
        details_type: Option<String>,
        payload: Payload,
    },
    Error {
        error: HlsErrorData,
        payload: Payload,
    },
}

impl HlsEvent {
    pub fn kind(&self) -> HlsEventKind {
        match self {
            HlsEvent::ManifestParsed(_) => HlsEventKind::ManifestParsed,
            HlsEvent::LevelLoaded { .. } => HlsEventKind::LevelLoaded,
            HlsEvent::Error { .. } => HlsEventKind::Error,
        }
    }

    pub fn payload(&self) -> &Payload {
        match self {
            HlsEvent::ManifestParsed(payload)
            | HlsEvent::LevelLoaded { payload, .. }
            | HlsEvent::Error { payload, .. } => payload,
        }
    }
}

pub type HlsListener = Rc<dyn Fn(&HlsEvent)>;

/// One entry of `hls.levels`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsLevel {
    /// Level id when the engine reports one
    pub level: Option<i32>,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
}

/// One entry of `hls.audioTracks`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HlsAudioTrack {
    pub name: String,
    pub lang: String,
}

pub trait HlsEngine {
    fn on(&self, kind: HlsEventKind, listener: &HlsListener);
    fn off(&self, kind: HlsEventKind, listener: &HlsListener);

    fn load_source(&self, url: &str);
    fn attach_media(&self, sink: &Rc<dyn MediaSink>);

    /// Restart the network pipeline after a network error
    fn start_load(&self);
    fn recover_media_error(&self);
    fn swap_audio_codec(&self);

    fn levels(&self) -> Vec<HlsLevel>;
    /// Level currently playing
    fn current_level(&self) -> i32;
    /// `-1` switches the engine back to automatic level selection
    fn set_current_level(&self, level: i32);

    fn audio_tracks(&self) -> Vec<HlsAudioTrack>;
    fn set_audio_track(&self, index: i32);

    fn destroy(&self);
}

pub trait HlsEngineFactory {
    type Engine: HlsEngine + 'static;

    fn create(&self, config: HlsConfig) -> Result<Self::Engine>;
}
