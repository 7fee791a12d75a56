//! hasplayer.js (Smooth Streaming) capabilities

use crate::error::Result;
use crate::events::EventEnvelope;
use crate::sink::MediaSink;
use std::rc::Rc;

/// Engine events forwarded verbatim, in subscription order
pub const SMOOTH_EVENTS: [&str; 16] = [
    "error",
    "warning",
    "cueEnter",
    "cueExit",
    "play_bitrate",
    "download_bitrate",
    "manifestUrlUpdate",
    "metricAdded",
    "metricChanged",
    "bufferLevel_updated",
    "state_changed",
    "loadeddata",
    "play",
    "pause",
    "timeupdate",
    "volumechange",
];

/// Engine events arrive already shaped as envelopes typed by their engine name
pub type SmoothListener = Rc<dyn Fn(&EventEnvelope)>;

/// Stream descriptor passed to `load`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmoothStream {
    pub url: String,
}

pub trait SmoothEngine {
    fn init(&self, sink: &Rc<dyn MediaSink>);
    fn load(&self, stream: &SmoothStream);

    fn add_event_listener(&self, event_type: &str, listener: &SmoothListener);
    fn remove_event_listener(&self, event_type: &str, listener: &SmoothListener);

    fn is_live(&self) -> bool;

    /// Video bitrates in engine order; the position is the quality index
    fn video_bitrates(&self) -> Vec<u64>;
    fn video_quality(&self) -> i32;
    fn set_video_quality(&self, index: i32);
    fn set_auto_switch_quality(&self, enabled: bool);

    fn reset(&self);
}

pub trait SmoothEngineFactory {
    type Engine: SmoothEngine + 'static;

    fn create(&self) -> Result<Self::Engine>;
}
