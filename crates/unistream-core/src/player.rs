//! Player facade
//!
//! Single entry and exit point for the host:
//! - owns the media sink and the active `Tech`
//! - re-exposes playback transport (play, pause, seek, volume, rate)
//! - multiplexes native sink events and adapter events into one event bus
//! - forwards quality, audio track and live queries to the active `Tech`

use crate::config::SessionConfig;
use crate::error::Result;
use crate::events::{
    is_high_frequency, EventCallback, EventEnvelope, EventHandler, HandlerId, HandlerRegistry,
    LicenseErrorCallback, MEDIA_EVENTS,
};
use crate::logger::Logger;
use crate::sink::{MediaSink, SinkListener, SubtitleTrack};
use crate::tech::Tech;
use crate::types::{AudioTrack, QualityLevel, SessionId};
use std::cell::RefCell;
use std::rc::Rc;
use tracing::{info, instrument, warn};

/// Volume a fresh session starts with
pub const DEFAULT_VOLUME: f64 = 0.5;

/// Written to the sink instead of `1.0`: some engines never fire
/// `volumechange` when the volume is set to the maximum on first load.
pub const MAX_SINK_VOLUME: f64 = 0.99;

/// State of one `init` call
#[derive(Debug, Clone)]
pub struct PlaybackSession {
    pub id: SessionId,
    pub config: SessionConfig,
    pub muted: bool,
    pub volume: f64,
}

impl PlaybackSession {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            id: SessionId::new(),
            config,
            muted: false,
            volume: DEFAULT_VOLUME,
        }
    }
}

/// Handler table plus the logger used on dispatch
struct EventBus {
    registry: RefCell<HandlerRegistry>,
    logger: Logger,
}

impl EventBus {
    fn dispatch(&self, envelope: &EventEnvelope) {
        // snapshot so handlers may add or remove handlers while running
        let Some(handlers) = self.registry.borrow().handlers_for(&envelope.event_type) else {
            return;
        };

        if !is_high_frequency(&envelope.event_type) {
            self.logger.d(&envelope.event_type);
        }

        for handler in handlers {
            handler(envelope);
        }
    }
}

/// Playback facade over one `Tech` at a time
pub struct Player {
    bus: Rc<EventBus>,
    /// The one listener attached to every sink event and handed to the tech
    dispatch: SinkListener,
    sink: Option<Rc<dyn MediaSink>>,
    tech: Option<Box<dyn Tech>>,
    session: Option<PlaybackSession>,
    subtitles_url: Option<String>,
}

impl Player {
    pub fn new() -> Self {
        let bus = Rc::new(EventBus {
            registry: RefCell::new(HandlerRegistry::new()),
            logger: Logger::new("Player"),
        });

        let target = bus.clone();
        let dispatch: SinkListener = Rc::new(move |envelope: &EventEnvelope| target.dispatch(envelope));

        Self {
            bus,
            dispatch,
            sink: None,
            tech: None,
            session: None,
            subtitles_url: None,
        }
    }

    /// Start a session: subscribe to the sink's events, then hand the sink to `tech`.
    ///
    /// A previous session is destroyed first. On failure the sink listeners are
    /// removed again and the player stays uninitialized.
    #[instrument(skip_all, fields(tech = %tech.kind(), url = %config.url))]
    pub fn init(
        &mut self,
        mut tech: Box<dyn Tech>,
        sink: Rc<dyn MediaSink>,
        config: SessionConfig,
        on_license_error: Option<LicenseErrorCallback>,
    ) -> Result<()> {
        config.validate()?;

        if self.is_initialized() {
            self.destroy();
        }

        self.bus.logger.set_debug(config.debug);
        let session = PlaybackSession::new(config);

        self.attach_listeners(&sink);

        let events: EventCallback = self.dispatch.clone();
        if let Err(e) = tech.init(sink.clone(), &session.config, events, on_license_error) {
            warn!(error = %e, "Tech init failed");
            self.detach_listeners(&sink);
            return Err(e);
        }

        info!(session_id = %session.id, autoplay = session.config.autoplay, "Session started");
        self.sink = Some(sink);
        self.tech = Some(tech);
        self.session = Some(session);
        Ok(())
    }

    pub fn is_initialized(&self) -> bool {
        self.tech.is_some()
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.session.as_ref().map(|s| s.id)
    }

    pub fn url(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.config.url.as_str())
    }

    pub fn tech(&self) -> Option<&dyn Tech> {
        self.tech.as_deref()
    }

    pub fn tech_mut(&mut self) -> Option<&mut (dyn Tech + 'static)> {
        self.tech.as_deref_mut()
    }

    // =========================================================================
    // Transport
    // =========================================================================

    pub fn play(&self) {
        if let Some(sink) = &self.sink {
            sink.play();
        }
    }

    pub fn pause(&self) {
        if let Some(sink) = &self.sink {
            sink.pause();
        }
    }

    pub fn seek(&self, seconds: f64) {
        if let Some(sink) = &self.sink {
            sink.set_current_time(seconds);
        }
    }

    pub fn current_time(&self) -> f64 {
        self.sink.as_ref().map_or(0.0, |sink| sink.current_time())
    }

    /// `NaN` while no media is attached
    pub fn duration(&self) -> f64 {
        self.sink.as_ref().map_or(f64::NAN, |sink| sink.duration())
    }

    pub fn set_playback_rate(&self, rate: f64) {
        if let Some(sink) = &self.sink {
            sink.set_playback_rate(rate);
        }
    }

    /// Set and remember the volume, unmuting.
    ///
    /// `1.0` is written to the sink as [`MAX_SINK_VOLUME`]; [`volume`](Self::volume)
    /// still reports `1.0`.
    pub fn set_volume(&mut self, volume: f64) {
        if volume.is_nan() {
            warn!("Ignoring NaN volume");
            return;
        }
        let volume = volume.clamp(0.0, 1.0);

        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.muted = false;
        session.volume = volume;

        if let Some(sink) = &self.sink {
            sink.set_volume(if volume == 1.0 { MAX_SINK_VOLUME } else { volume });
        }
    }

    pub fn volume(&self) -> f64 {
        self.session.as_ref().map_or(DEFAULT_VOLUME, |s| s.volume)
    }

    pub fn mute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.muted = true;
        if let Some(sink) = &self.sink {
            sink.set_volume(0.0);
        }
    }

    /// Restore the remembered volume as is
    pub fn unmute(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.muted = false;
        if let Some(sink) = &self.sink {
            sink.set_volume(session.volume);
        }
    }

    pub fn is_muted(&self) -> bool {
        self.session.as_ref().is_some_and(|s| s.muted)
    }

    // =========================================================================
    // Adaptive controls
    // =========================================================================

    pub fn is_live(&self) -> bool {
        self.tech.as_ref().is_some_and(|tech| tech.is_live())
    }

    pub fn qualities(&self) -> Vec<QualityLevel> {
        self.tech.as_ref().map(|tech| tech.qualities()).unwrap_or_default()
    }

    pub fn set_quality(&mut self, index: i32) {
        if let Some(tech) = self.tech.as_mut() {
            tech.set_quality(index);
        }
    }

    pub fn current_quality(&self) -> QualityLevel {
        self.tech
            .as_ref()
            .map(|tech| tech.current_quality())
            .unwrap_or_else(QualityLevel::fallback)
    }

    pub fn set_max_quality(&mut self) {
        if let Some(tech) = self.tech.as_mut() {
            tech.set_max_quality();
        }
    }

    pub fn audio_tracks(&self) -> Vec<AudioTrack> {
        self.tech.as_ref().map(|tech| tech.audio_tracks()).unwrap_or_default()
    }

    pub fn set_audio_track(&mut self, index: i32) {
        if let Some(tech) = self.tech.as_mut() {
            tech.set_audio_track(index);
        }
    }

    // =========================================================================
    // Subtitles
    // =========================================================================

    /// Replace the sink's subtitle tracks with one track loading `url`
    pub fn load_subtitles(&mut self, url: impl Into<String>) {
        let url = url.into();
        if let Some(sink) = &self.sink {
            sink.clear_children();
            sink.append_subtitle_track(&SubtitleTrack::subtitles(url.as_str()));
        }
        self.subtitles_url = Some(url);
    }

    pub fn subtitles_url(&self) -> Option<&str> {
        self.subtitles_url.as_deref()
    }

    // =========================================================================
    // Events
    // =========================================================================

    pub fn add_event_handler<H>(&self, event_type: &str, handler: H) -> HandlerId
    where
        H: Fn(&EventEnvelope) + 'static,
    {
        let handler: EventHandler = Rc::new(handler);
        self.bus.registry.borrow_mut().add(event_type, handler)
    }

    /// Remove exactly the handler registered as `id` for `event_type`
    pub fn remove_event_handler(&self, event_type: &str, id: HandlerId) -> bool {
        self.bus.registry.borrow_mut().remove(event_type, id)
    }

    // =========================================================================
    // Lifecycle
    // =========================================================================

    /// Clear subtitle tracks, detach from the sink and destroy the tech. Idempotent.
    #[instrument(skip(self))]
    pub fn destroy(&mut self) {
        if self.sink.is_none() && self.tech.is_none() {
            return;
        }

        self.bus.logger.d("Player destroy");

        if let Some(sink) = self.sink.take() {
            sink.clear_children();
            self.detach_listeners(&sink);
        }

        if let Some(mut tech) = self.tech.take() {
            tech.destroy();
        }

        self.session = None;
        self.subtitles_url = None;
    }

    fn attach_listeners(&self, sink: &Rc<dyn MediaSink>) {
        for event_type in MEDIA_EVENTS {
            sink.add_event_listener(event_type, &self.dispatch);
        }
    }

    fn detach_listeners(&self, sink: &Rc<dyn MediaSink>) {
        for event_type in MEDIA_EVENTS {
            sink.remove_event_listener(event_type, &self.dispatch);
        }
    }
}

impl Default for Player {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Player {
    fn drop(&mut self) {
        self.destroy();
    }
}
