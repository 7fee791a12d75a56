//! The `Tech` contract and its engine adapters
//!
//! ```text
//!               ┌──────────────┐
//!   host ──────▶│    Player    │◀──── native sink events
//!               └──────┬───────┘
//!                      │ Box<dyn Tech>
//!        ┌─────────────┼─────────────┐
//!   ┌────┴────┐   ┌────┴────┐   ┌────┴─────┐
//!   │DashTech │   │ HlsTech │   │SmoothTech│
//!   └────┬────┘   └────┬────┘   └────┬─────┘
//!    DashEngine    HlsEngine    SmoothEngine
//! ```
//!
//! Every adapter owns one engine, created on `init` and released on
//! `destroy`. Engine listeners are stored on the adapter so the exact same
//! values can be detached again; they hold only a weak reference to the
//! adapter state and do nothing once the engine handle is gone.

mod classify;
#[cfg(feature = "dash")]
mod dash;
#[cfg(feature = "hls")]
mod hls;
#[cfg(feature = "smooth")]
mod smooth;

#[cfg(feature = "dash")]
pub use classify::classify_dash;
#[cfg(feature = "hls")]
pub use classify::classify_hls;
pub use classify::{Classification, ErrorClass, DASH_KEY_SESSION_ERROR, DASH_LICENSE_ERROR_CODE};
#[cfg(feature = "dash")]
pub use dash::DashTech;
#[cfg(feature = "hls")]
pub use hls::HlsTech;
#[cfg(feature = "smooth")]
pub use smooth::SmoothTech;

use crate::config::SessionConfig;
use crate::error::Result;
use crate::events::{EventCallback, LicenseErrorCallback};
use crate::sink::MediaSink;
use crate::types::{highest_quality, AudioTrack, QualityLevel, TechKind, TechState};
use std::any::Any;
use std::rc::Rc;

/// Capability set every engine adapter provides
pub trait Tech {
    fn kind(&self) -> TechKind;

    fn state(&self) -> TechState;

    /// Create the engine and start loading `config.url` into `sink`.
    ///
    /// Must be called once; a second call fails with
    /// [`Error::AlreadyInitialized`](crate::Error::AlreadyInitialized).
    fn init(
        &mut self,
        sink: Rc<dyn MediaSink>,
        config: &SessionConfig,
        events: EventCallback,
        on_license_error: Option<LicenseErrorCallback>,
    ) -> Result<()>;

    /// Raw engine handle (`Rc<Engine>`), `None` before init and after destroy
    fn player(&self) -> Option<Rc<dyn Any>>;

    /// Live-stream flag, never reset once set
    fn is_live(&self) -> bool;

    fn audio_tracks(&self) -> Vec<AudioTrack>;

    /// No-op when `index` matches no known track
    fn set_audio_track(&mut self, index: i32);

    /// Levels in engine order
    fn qualities(&self) -> Vec<QualityLevel>;

    /// `-1` re-enables automatic switching, anything else pins that level
    fn set_quality(&mut self, index: i32);

    fn current_quality(&self) -> QualityLevel;

    /// Pin the level with the highest bitrate
    fn set_max_quality(&mut self) {
        let qualities = self.qualities();
        if let Some(best) = highest_quality(&qualities) {
            let index = best.index;
            self.set_quality(index);
        }
    }

    /// Detach engine listeners and release the engine. Idempotent.
    fn destroy(&mut self);
}

/// Resolve the active level against the quality list
pub(crate) fn match_quality(qualities: Vec<QualityLevel>, active: i32) -> QualityLevel {
    qualities
        .into_iter()
        .find(|q| !q.is_auto() && q.index == active)
        .unwrap_or_else(QualityLevel::fallback)
}
