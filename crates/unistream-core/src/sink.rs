//! Media sink abstraction
//!
//! The sink is the rendering element (an HTML `<video>` in the browser). It
//! is shared between the player, which subscribes to its native events, and
//! the active adapter, which attaches the engine to it. All methods take
//! `&self`: sinks behave like DOM elements and keep their own interior state.

use crate::events::EventEnvelope;
use std::any::Any;
use std::rc::Rc;

/// Listener attached to a sink event, identified by pointer for removal
pub type SinkListener = Rc<dyn Fn(&EventEnvelope)>;

/// A `<track>` child appended to the sink
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleTrack {
    pub label: String,
    pub kind: String,
    pub default: bool,
    pub src: String,
}

impl SubtitleTrack {
    /// Default subtitle track pointing at `src`
    pub fn subtitles(src: impl Into<String>) -> Self {
        Self {
            label: "Subtitle".to_string(),
            kind: "subtitles".to_string(),
            default: true,
            src: src.into(),
        }
    }
}

pub trait MediaSink {
    fn play(&self);
    fn pause(&self);

    /// Playback position in seconds
    fn current_time(&self) -> f64;
    fn set_current_time(&self, seconds: f64);

    /// Duration in seconds, `NaN` while unknown
    fn duration(&self) -> f64;

    fn set_playback_rate(&self, rate: f64);

    fn volume(&self) -> f64;
    fn set_volume(&self, volume: f64);

    fn add_event_listener(&self, event_type: &str, listener: &SinkListener);

    /// Remove the listener previously added with the same `Rc`
    fn remove_event_listener(&self, event_type: &str, listener: &SinkListener);

    fn append_subtitle_track(&self, track: &SubtitleTrack);

    /// Remove every child node (subtitle tracks)
    fn clear_children(&self);

    /// Concrete sink access for engine bindings
    fn as_any(&self) -> &dyn Any;
}
