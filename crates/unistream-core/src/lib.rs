//! Unistream Core - one playback-control interface over three streaming engines
//!
//! This crate provides:
//! - The `Tech` contract every engine adapter fulfils
//! - Adapters for DASH, HLS and Smooth Streaming engines
//! - A `Player` facade that owns the media sink and the active adapter
//! - A unified event bus merging native media events and engine events
//! - Per-engine error classification (transport, media, license, fatal)
//!
//! Engines themselves are external. They are reached through the capability
//! traits in [`engine`], implemented by the browser binding or by test doubles.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Unistream Core                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │                                                             │
//! │   ┌──────────────┐    ┌──────────────┐   ┌──────────────┐   │
//! │   │   Session    │    │    Event     │   │  MediaSink   │   │
//! │   │   Config     │    │     Bus      │   │  (<video>)   │   │
//! │   └──────┬───────┘    └──────┬───────┘   └──────┬───────┘   │
//! │          └───────────────────┼──────────────────┘           │
//! │                       ┌──────┴──────┐                       │
//! │                       │   Player    │                       │
//! │                       └──────┬──────┘                       │
//! │         ┌────────────────────┼────────────────────┐         │
//! │   ┌─────┴──────┐      ┌──────┴─────┐      ┌───────┴────┐    │
//! │   │  DashTech  │      │  HlsTech   │      │ SmoothTech │    │
//! │   └────────────┘      └────────────┘      └────────────┘    │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod bitrate;
pub mod config;
pub mod engine;
pub mod error;
pub mod events;
pub mod logger;
pub mod player;
pub mod sink;
pub mod tech;
pub mod types;

pub use bitrate::format_bitrate;
pub use config::{ProtectionData, RequestHeaders, SessionConfig};
pub use error::{Error, Result};
pub use events::{EventCallback, EventEnvelope, HandlerId, LicenseErrorCallback, Payload};
pub use logger::Logger;
pub use player::{PlaybackSession, Player};
pub use sink::{MediaSink, SinkListener, SubtitleTrack};
pub use tech::{Classification, ErrorClass, Tech};
pub use types::*;

#[cfg(feature = "dash")]
pub use tech::DashTech;
#[cfg(feature = "hls")]
pub use tech::HlsTech;
#[cfg(feature = "smooth")]
pub use tech::SmoothTech;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the library
pub fn init() {
    tracing::info!(version = VERSION, "Unistream Core initialized");
}
