//! Capability traits for the wrapped streaming engines
//!
//! Each engine is reached only through the narrow trait below it: event
//! subscription keyed by engine event names, level enumeration, current level
//! get/set, source loading and sink attachment, and teardown. Engine-native
//! shapes are decoded into typed events by whoever implements the trait (the
//! browser binding, or a test double), so adapters never see raw engine
//! objects except as an opaque [`Payload`](crate::events::Payload).
//!
//! Engine methods take `&self`. Engines are driven by their own scheduling
//! and may call listeners while one of their methods is running, so
//! implementations keep interior state and must not hold a borrow across a
//! listener call.

#[cfg(feature = "dash")]
pub mod dash;
#[cfg(feature = "hls")]
pub mod hls;
#[cfg(feature = "smooth")]
pub mod smooth;

#[cfg(feature = "dash")]
pub use dash::{
    DashBitrateInfo, DashEngine, DashEngineFactory, DashError, DashEvent, DashEventKind,
    DashListener, DashTrackInfo, RequestModifier,
};
#[cfg(feature = "hls")]
pub use hls::{
    HlsAudioTrack, HlsConfig, HlsEngine, HlsEngineFactory, HlsErrorData, HlsErrorType, HlsEvent,
    HlsEventKind, HlsLevel, HlsListener,
};
#[cfg(feature = "smooth")]
pub use smooth::{SmoothEngine, SmoothEngineFactory, SmoothListener, SmoothStream, SMOOTH_EVENTS};
