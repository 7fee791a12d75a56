//! Test doubles shared by the integration tests
//!
//! Every double records the calls it receives in order and keeps its
//! listeners so tests can fire engine or sink events by hand. Listener lists
//! are snapshotted before firing, so a listener may detach itself (or tear
//! the adapter down) while it runs.

#![allow(dead_code)]

use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;
use std::sync::{Arc, Mutex};

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use unistream_core::config::{HeaderTarget, ProtectionData};
use unistream_core::engine::{
    DashBitrateInfo, DashEngine, DashEngineFactory, DashEvent, DashEventKind, DashListener,
    DashTrackInfo, HlsAudioTrack, HlsConfig, HlsEngine, HlsEngineFactory, HlsEvent, HlsEventKind,
    HlsLevel, HlsListener, RequestModifier, SmoothEngine, SmoothEngineFactory, SmoothListener,
    SmoothStream,
};
use unistream_core::{Error, EventEnvelope, MediaSink, Result, SinkListener, SubtitleTrack};

// =============================================================================
// Event recording
// =============================================================================

/// Collects every envelope passed to the callback it hands out
#[derive(Clone, Default)]
pub struct Recorder {
    events: Rc<RefCell<Vec<EventEnvelope>>>,
}

impl Recorder {
    pub fn callback(&self) -> Rc<dyn Fn(&EventEnvelope)> {
        let events = self.events.clone();
        Rc::new(move |envelope: &EventEnvelope| events.borrow_mut().push(envelope.clone()))
    }

    pub fn types(&self) -> Vec<String> {
        self.events.borrow().iter().map(|e| e.event_type.clone()).collect()
    }

    pub fn events(&self) -> Vec<EventEnvelope> {
        self.events.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }
}

/// Counts license callback invocations
#[derive(Clone, Default)]
pub struct LicenseCounter {
    count: Rc<Cell<u32>>,
}

impl LicenseCounter {
    pub fn callback(&self) -> Rc<dyn Fn()> {
        let count = self.count.clone();
        Rc::new(move || count.set(count.get() + 1))
    }

    pub fn count(&self) -> u32 {
        self.count.get()
    }
}

/// Header target standing in for an outgoing request
#[derive(Default)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
}

impl HeaderTarget for RecordedRequest {
    fn set_request_header(&mut self, name: &str, value: &str) {
        self.headers.push((name.to_string(), value.to_string()));
    }
}

// =============================================================================
// Media sink
// =============================================================================

#[derive(Default)]
struct SinkInner {
    calls: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(String, SinkListener)>>,
    tracks: RefCell<Vec<SubtitleTrack>>,
    volume: Cell<f64>,
    current_time: Cell<f64>,
    duration: Cell<f64>,
    playback_rate: Cell<f64>,
}

#[derive(Clone, Default)]
pub struct MockSink {
    inner: Rc<SinkInner>,
}

impl MockSink {
    pub fn new() -> Self {
        let sink = Self::default();
        sink.inner.duration.set(f64::NAN);
        sink.inner.playback_rate.set(1.0);
        sink
    }

    pub fn as_sink(&self) -> Rc<dyn MediaSink> {
        Rc::new(self.clone())
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.inner.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn tracks(&self) -> Vec<SubtitleTrack> {
        self.inner.tracks.borrow().clone()
    }

    pub fn set_duration(&self, duration: f64) {
        self.inner.duration.set(duration);
    }

    pub fn playback_rate(&self) -> f64 {
        self.inner.playback_rate.get()
    }

    /// Fire a native event carrying no payload
    pub fn emit(&self, event_type: &str) {
        let listeners: Vec<SinkListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(t, _)| t == event_type)
            .map(|(_, l)| l.clone())
            .collect();
        let envelope = EventEnvelope::empty(event_type);
        for listener in listeners {
            listener(&envelope);
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.calls.borrow_mut().push(call.into());
    }
}

impl MediaSink for MockSink {
    fn play(&self) {
        self.record("play");
    }

    fn pause(&self) {
        self.record("pause");
    }

    fn current_time(&self) -> f64 {
        self.inner.current_time.get()
    }

    fn set_current_time(&self, seconds: f64) {
        self.record(format!("seek:{}", seconds));
        self.inner.current_time.set(seconds);
    }

    fn duration(&self) -> f64 {
        self.inner.duration.get()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.inner.playback_rate.set(rate);
    }

    fn volume(&self) -> f64 {
        self.inner.volume.get()
    }

    fn set_volume(&self, volume: f64) {
        self.record(format!("volume:{}", volume));
        self.inner.volume.set(volume);
    }

    fn add_event_listener(&self, event_type: &str, listener: &SinkListener) {
        self.inner
            .listeners
            .borrow_mut()
            .push((event_type.to_string(), listener.clone()));
    }

    fn remove_event_listener(&self, event_type: &str, listener: &SinkListener) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(t, l)| !(t == event_type && Rc::ptr_eq(l, listener)));
    }

    fn append_subtitle_track(&self, track: &SubtitleTrack) {
        self.record("appendTrack");
        self.inner.tracks.borrow_mut().push(track.clone());
    }

    fn clear_children(&self) {
        self.record("clearChildren");
        self.inner.tracks.borrow_mut().clear();
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

// =============================================================================
// DASH engine
// =============================================================================

#[derive(Default)]
struct DashInner {
    calls: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(DashEventKind, DashListener)>>,
    bitrates: RefCell<Vec<DashBitrateInfo>>,
    tracks: RefCell<Vec<DashTrackInfo>>,
    quality: Cell<i32>,
    current_track: RefCell<Option<DashTrackInfo>>,
    protection: RefCell<Option<ProtectionData>>,
    modifier: RefCell<Option<RequestModifier>>,
}

#[derive(Clone, Default)]
pub struct MockDashEngine {
    inner: Rc<DashInner>,
}

impl MockDashEngine {
    pub fn with_bitrates(self, bitrates: Vec<DashBitrateInfo>) -> Self {
        *self.inner.bitrates.borrow_mut() = bitrates;
        self
    }

    pub fn with_tracks(self, tracks: Vec<DashTrackInfo>) -> Self {
        *self.inner.tracks.borrow_mut() = tracks;
        self
    }

    pub fn set_active_quality(&self, index: i32) {
        self.inner.quality.set(index);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.inner.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn current_track(&self) -> Option<DashTrackInfo> {
        self.inner.current_track.borrow().clone()
    }

    pub fn protection(&self) -> Option<ProtectionData> {
        self.inner.protection.borrow().clone()
    }

    pub fn modifier(&self) -> Option<RequestModifier> {
        self.inner.modifier.borrow().clone()
    }

    pub fn emit(&self, event: DashEvent) {
        let kind = event.kind();
        let listeners: Vec<DashListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.calls.borrow_mut().push(call.into());
    }
}

impl DashEngine for MockDashEngine {
    fn on(&self, kind: DashEventKind, listener: &DashListener) {
        self.record(format!("on:{}", kind.name()));
        self.inner.listeners.borrow_mut().push((kind, listener.clone()));
    }

    fn off(&self, kind: DashEventKind, listener: &DashListener) {
        self.record(format!("off:{}", kind.name()));
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(k, l)| !(*k == kind && Rc::ptr_eq(l, listener)));
    }

    fn set_fast_switch_enabled(&self, enabled: bool) {
        self.record(format!("fastSwitch:{}", enabled));
    }

    fn set_log_to_console(&self, enabled: bool) {
        self.record(format!("logToConsole:{}", enabled));
    }

    fn set_robustness_level(&self, level: &str) {
        self.record(format!("robustness:{}", level));
    }

    fn set_protection_data(&self, data: &ProtectionData) {
        self.record("protectionData");
        *self.inner.protection.borrow_mut() = Some(data.clone());
    }

    fn extend_request_modifier(&self, modifier: RequestModifier) {
        self.record("requestModifier");
        *self.inner.modifier.borrow_mut() = Some(modifier);
    }

    fn initialize(&self, _sink: &Rc<dyn MediaSink>, url: &str, autoplay: bool) {
        self.record(format!("initialize:{}:{}", url, autoplay));
    }

    fn audio_tracks(&self) -> Vec<DashTrackInfo> {
        self.inner.tracks.borrow().clone()
    }

    fn set_current_track(&self, track: &DashTrackInfo) {
        self.record(format!("setTrack:{}", track.index));
        *self.inner.current_track.borrow_mut() = Some(track.clone());
    }

    fn video_bitrates(&self) -> Vec<DashBitrateInfo> {
        self.inner.bitrates.borrow().clone()
    }

    fn video_quality(&self) -> i32 {
        self.inner.quality.get()
    }

    fn set_video_quality(&self, index: i32) {
        self.record(format!("setQuality:{}", index));
        self.inner.quality.set(index);
    }

    fn set_auto_switch_quality(&self, enabled: bool) {
        self.record(format!("autoSwitch:{}", enabled));
    }

    fn reset(&self) {
        self.record("reset");
    }
}

pub struct MockDashFactory {
    pub engine: MockDashEngine,
    pub fail: bool,
}

impl MockDashFactory {
    pub fn new(engine: &MockDashEngine) -> Self {
        Self {
            engine: engine.clone(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            engine: MockDashEngine::default(),
            fail: true,
        }
    }
}

impl DashEngineFactory for MockDashFactory {
    type Engine = MockDashEngine;

    fn create(&self) -> Result<MockDashEngine> {
        if self.fail {
            return Err(Error::engine("dashjs is not loaded"));
        }
        Ok(self.engine.clone())
    }
}

pub fn dash_bitrate(quality_index: i32, bitrate: u64, width: u32, height: u32) -> DashBitrateInfo {
    DashBitrateInfo {
        quality_index,
        bitrate,
        width,
        height,
    }
}

// =============================================================================
// HLS engine
// =============================================================================

#[derive(Default)]
struct HlsInner {
    calls: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(HlsEventKind, HlsListener)>>,
    levels: RefCell<Vec<HlsLevel>>,
    tracks: RefCell<Vec<HlsAudioTrack>>,
    current_level: Cell<i32>,
    config: RefCell<Option<HlsConfig>>,
}

#[derive(Clone, Default)]
pub struct MockHlsEngine {
    inner: Rc<HlsInner>,
}

impl MockHlsEngine {
    pub fn with_levels(self, levels: Vec<HlsLevel>) -> Self {
        *self.inner.levels.borrow_mut() = levels;
        self
    }

    pub fn with_tracks(self, tracks: Vec<HlsAudioTrack>) -> Self {
        *self.inner.tracks.borrow_mut() = tracks;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.inner.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    /// Config the engine was created with
    pub fn config(&self) -> Option<HlsConfig> {
        self.inner.config.borrow().clone()
    }

    pub fn emit(&self, event: HlsEvent) {
        let kind = event.kind();
        let listeners: Vec<HlsListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(k, _)| *k == kind)
            .map(|(_, l)| l.clone())
            .collect();
        for listener in listeners {
            listener(&event);
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.calls.borrow_mut().push(call.into());
    }
}

impl HlsEngine for MockHlsEngine {
    fn on(&self, kind: HlsEventKind, listener: &HlsListener) {
        self.record(format!("on:{}", kind.name()));
        self.inner.listeners.borrow_mut().push((kind, listener.clone()));
    }

    fn off(&self, kind: HlsEventKind, listener: &HlsListener) {
        self.record(format!("off:{}", kind.name()));
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(k, l)| !(*k == kind && Rc::ptr_eq(l, listener)));
    }

    fn load_source(&self, url: &str) {
        self.record(format!("loadSource:{}", url));
    }

    fn attach_media(&self, _sink: &Rc<dyn MediaSink>) {
        self.record("attachMedia");
    }

    fn start_load(&self) {
        self.record("startLoad");
    }

    fn recover_media_error(&self) {
        self.record("recoverMediaError");
    }

    fn swap_audio_codec(&self) {
        self.record("swapAudioCodec");
    }

    fn levels(&self) -> Vec<HlsLevel> {
        self.inner.levels.borrow().clone()
    }

    fn current_level(&self) -> i32 {
        self.inner.current_level.get()
    }

    fn set_current_level(&self, level: i32) {
        self.record(format!("currentLevel:{}", level));
        self.inner.current_level.set(level);
    }

    fn audio_tracks(&self) -> Vec<HlsAudioTrack> {
        self.inner.tracks.borrow().clone()
    }

    fn set_audio_track(&self, index: i32) {
        self.record(format!("audioTrack:{}", index));
    }

    fn destroy(&self) {
        self.record("destroy");
    }
}

pub struct MockHlsFactory {
    pub engine: MockHlsEngine,
}

impl MockHlsFactory {
    pub fn new(engine: &MockHlsEngine) -> Self {
        Self {
            engine: engine.clone(),
        }
    }
}

impl HlsEngineFactory for MockHlsFactory {
    type Engine = MockHlsEngine;

    fn create(&self, config: HlsConfig) -> Result<MockHlsEngine> {
        *self.engine.inner.config.borrow_mut() = Some(config);
        Ok(self.engine.clone())
    }
}

pub fn hls_level(level: Option<i32>, bitrate: u64, width: u32, height: u32) -> HlsLevel {
    HlsLevel {
        level,
        bitrate,
        width,
        height,
    }
}

// =============================================================================
// Smooth engine
// =============================================================================

#[derive(Default)]
struct SmoothInner {
    calls: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(String, SmoothListener)>>,
    bitrates: RefCell<Vec<u64>>,
    quality: Cell<i32>,
    live: Cell<bool>,
}

#[derive(Clone, Default)]
pub struct MockSmoothEngine {
    inner: Rc<SmoothInner>,
}

impl MockSmoothEngine {
    pub fn with_bitrates(self, bitrates: Vec<u64>) -> Self {
        *self.inner.bitrates.borrow_mut() = bitrates;
        self
    }

    pub fn set_live(&self, live: bool) {
        self.inner.live.set(live);
    }

    pub fn calls(&self) -> Vec<String> {
        self.inner.calls.borrow().clone()
    }

    pub fn count(&self, call: &str) -> usize {
        self.inner.calls.borrow().iter().filter(|c| c.as_str() == call).count()
    }

    pub fn listener_count(&self) -> usize {
        self.inner.listeners.borrow().len()
    }

    pub fn emit(&self, event_type: &str) {
        let listeners: Vec<SmoothListener> = self
            .inner
            .listeners
            .borrow()
            .iter()
            .filter(|(t, _)| t == event_type)
            .map(|(_, l)| l.clone())
            .collect();
        let envelope = EventEnvelope::empty(event_type);
        for listener in listeners {
            listener(&envelope);
        }
    }

    fn record(&self, call: impl Into<String>) {
        self.inner.calls.borrow_mut().push(call.into());
    }
}

impl SmoothEngine for MockSmoothEngine {
    fn init(&self, _sink: &Rc<dyn MediaSink>) {
        self.record("init");
    }

    fn load(&self, stream: &SmoothStream) {
        self.record(format!("load:{}", stream.url));
    }

    fn add_event_listener(&self, event_type: &str, listener: &SmoothListener) {
        self.inner
            .listeners
            .borrow_mut()
            .push((event_type.to_string(), listener.clone()));
    }

    fn remove_event_listener(&self, event_type: &str, listener: &SmoothListener) {
        self.inner
            .listeners
            .borrow_mut()
            .retain(|(t, l)| !(t == event_type && Rc::ptr_eq(l, listener)));
    }

    fn is_live(&self) -> bool {
        self.inner.live.get()
    }

    fn video_bitrates(&self) -> Vec<u64> {
        self.inner.bitrates.borrow().clone()
    }

    fn video_quality(&self) -> i32 {
        self.inner.quality.get()
    }

    fn set_video_quality(&self, index: i32) {
        self.record(format!("setQuality:{}", index));
        self.inner.quality.set(index);
    }

    fn set_auto_switch_quality(&self, enabled: bool) {
        self.record(format!("autoSwitch:{}", enabled));
    }

    fn reset(&self) {
        self.record("reset");
    }
}

pub struct MockSmoothFactory {
    pub engine: MockSmoothEngine,
}

impl MockSmoothFactory {
    pub fn new(engine: &MockSmoothEngine) -> Self {
        Self {
            engine: engine.clone(),
        }
    }
}

impl SmoothEngineFactory for MockSmoothFactory {
    type Engine = MockSmoothEngine;

    fn create(&self) -> Result<MockSmoothEngine> {
        Ok(self.engine.clone())
    }
}

// =============================================================================
// Log capture
// =============================================================================

#[derive(Debug, Clone)]
pub struct CapturedLog {
    pub level: Level,
    pub context: Option<String>,
    pub message: String,
}

/// `tracing` layer keeping every event it sees
#[derive(Clone, Default)]
pub struct LogCapture {
    logs: Arc<Mutex<Vec<CapturedLog>>>,
}

impl LogCapture {
    /// Run `f` with this capture installed as the thread's subscriber
    pub fn run<T>(&self, f: impl FnOnce() -> T) -> T {
        let subscriber = tracing_subscriber::registry().with(self.clone());
        tracing::subscriber::with_default(subscriber, f)
    }

    pub fn logs(&self) -> Vec<CapturedLog> {
        self.logs.lock().map(|logs| logs.clone()).unwrap_or_default()
    }

    pub fn messages_at(&self, level: Level) -> Vec<String> {
        self.logs()
            .into_iter()
            .filter(|log| log.level == level)
            .map(|log| log.message)
            .collect()
    }
}

struct CaptureVisitor<'a> {
    context: &'a mut Option<String>,
    message: &'a mut String,
}

impl Visit for CaptureVisitor<'_> {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "context" => *self.context = Some(value.to_string()),
            "message" => *self.message = value.to_string(),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.message = format!("{:?}", value);
        }
    }
}

impl<S: Subscriber> Layer<S> for LogCapture {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut context = None;
        let mut message = String::new();
        event.record(&mut CaptureVisitor {
            context: &mut context,
            message: &mut message,
        });
        if let Ok(mut logs) = self.logs.lock() {
            logs.push(CapturedLog {
                level: *event.metadata().level(),
                context,
                message,
            });
        }
    }
}
