//! JavaScript-facing player

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::Function;
use serde::Serialize;
use unistream_core::{
    DashTech, EventEnvelope, HandlerId, HlsTech, LicenseErrorCallback, MediaSink, Payload, Player, QualityLevel,
    SessionConfig, SmoothTech, Tech, TechKind,
};
use wasm_bindgen::prelude::*;
use web_sys::HtmlMediaElement;

use crate::engines::{DashJsFactory, HasPlayerFactory, HlsJsFactory};
use crate::sink::HtmlMediaSink;

/// One player bound to one media element.
///
/// Every method takes `&self` so event handlers may call back into the
/// player; a call that would re-enter a running mutation is skipped with a
/// warning.
#[wasm_bindgen]
pub struct UnistreamPlayer {
    player: RefCell<Player>,
    sink: Rc<HtmlMediaSink>,
}

#[wasm_bindgen]
impl UnistreamPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(element: HtmlMediaElement) -> Self {
        Self {
            player: RefCell::new(Player::new()),
            sink: Rc::new(HtmlMediaSink::new(element)),
        }
    }

    /// Start playing `config.url` with `"dash"`, `"hls"` or `"smooth"`.
    ///
    /// `config` is `{url, autoplay?, debug?, headers?, protectionData?}`.
    #[wasm_bindgen]
    pub fn init(&self, tech: &str, config: JsValue, on_license_error: Option<Function>) -> Result<(), JsValue> {
        let kind: TechKind = tech.parse().map_err(|e: unistream_core::Error| host_error(&e))?;
        let config: SessionConfig =
            serde_wasm_bindgen::from_value(config).map_err(|e| JsValue::from_str(&e.to_string()))?;

        let tech: Box<dyn Tech> = match kind {
            TechKind::Dash => Box::new(DashTech::new(DashJsFactory)),
            TechKind::Hls => Box::new(HlsTech::new(HlsJsFactory)),
            TechKind::Smooth => Box::new(SmoothTech::new(HasPlayerFactory)),
        };
        let on_license_error = on_license_error.map(|callback| -> LicenseErrorCallback {
            Rc::new(move || {
                if let Err(e) = callback.call0(&JsValue::NULL) {
                    tracing::warn!(error = ?e, "license error callback threw");
                }
            })
        });
        let sink: Rc<dyn MediaSink> = self.sink.clone();

        let mut player = self
            .player
            .try_borrow_mut()
            .map_err(|_| JsValue::from_str("init called from inside a player event"))?;
        player
            .init(tech, sink, config, on_license_error)
            .map_err(|e| host_error(&e))
    }

    #[wasm_bindgen]
    pub fn play(&self) {
        self.read(|p| p.play());
    }

    #[wasm_bindgen]
    pub fn pause(&self) {
        self.read(|p| p.pause());
    }

    #[wasm_bindgen]
    pub fn seek(&self, seconds: f64) {
        self.read(|p| p.seek(seconds));
    }

    #[wasm_bindgen(js_name = currentTime)]
    pub fn current_time(&self) -> f64 {
        self.read(|p| p.current_time()).unwrap_or(0.0)
    }

    #[wasm_bindgen]
    pub fn duration(&self) -> f64 {
        self.read(|p| p.duration()).unwrap_or(f64::NAN)
    }

    #[wasm_bindgen(js_name = setPlaybackRate)]
    pub fn set_playback_rate(&self, rate: f64) {
        self.read(|p| p.set_playback_rate(rate));
    }

    #[wasm_bindgen(js_name = setVolume)]
    pub fn set_volume(&self, volume: f64) {
        self.write(|p| p.set_volume(volume));
    }

    #[wasm_bindgen]
    pub fn volume(&self) -> f64 {
        self.read(|p| p.volume()).unwrap_or(0.0)
    }

    #[wasm_bindgen]
    pub fn mute(&self) {
        self.write(|p| p.mute());
    }

    #[wasm_bindgen]
    pub fn unmute(&self) {
        self.write(|p| p.unmute());
    }

    #[wasm_bindgen(js_name = isMuted)]
    pub fn is_muted(&self) -> bool {
        self.read(|p| p.is_muted()).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = isLive)]
    pub fn is_live(&self) -> bool {
        self.read(|p| p.is_live()).unwrap_or(false)
    }

    /// `[{index, bitrate, bitrateStr?, width, height}]`
    #[wasm_bindgen]
    pub fn qualities(&self) -> Result<JsValue, JsValue> {
        let qualities = self.read(|p| p.qualities()).unwrap_or_default();
        serde_wasm_bindgen::to_value(&qualities).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setQuality)]
    pub fn set_quality(&self, index: i32) {
        self.write(|p| p.set_quality(index));
    }

    #[wasm_bindgen(js_name = currentQuality)]
    pub fn current_quality(&self) -> Result<JsValue, JsValue> {
        let quality = self
            .read(|p| p.current_quality())
            .unwrap_or_else(QualityLevel::fallback);
        serde_wasm_bindgen::to_value(&quality).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setMaxQuality)]
    pub fn set_max_quality(&self) {
        self.write(|p| p.set_max_quality());
    }

    /// `[{index, lang, name}]`
    #[wasm_bindgen(js_name = audioTracks)]
    pub fn audio_tracks(&self) -> Result<JsValue, JsValue> {
        let tracks = self.read(|p| p.audio_tracks()).unwrap_or_default();
        serde_wasm_bindgen::to_value(&tracks).map_err(|e| JsValue::from_str(&e.to_string()))
    }

    #[wasm_bindgen(js_name = setAudioTrack)]
    pub fn set_audio_track(&self, index: i32) {
        self.write(|p| p.set_audio_track(index));
    }

    #[wasm_bindgen(js_name = loadSubtitles)]
    pub fn load_subtitles(&self, url: String) {
        self.write(|p| p.load_subtitles(url));
    }

    /// URL of the last `loadSubtitles` call in this session
    #[wasm_bindgen(js_name = subtitlesUrl)]
    pub fn subtitles_url(&self) -> Option<String> {
        self.read(|p| p.subtitles_url().map(str::to_string)).flatten()
    }

    /// Register `handler(payload, eventType)`; returns the id for [`off`](Self::off)
    #[wasm_bindgen]
    pub fn on(&self, event_type: &str, handler: Function) -> Option<String> {
        let id = self.read(|p| {
            p.add_event_handler(event_type, move |envelope: &EventEnvelope| {
                let payload = payload_to_js(&envelope.payload);
                if let Err(e) = handler.call2(&JsValue::NULL, &payload, &JsValue::from_str(&envelope.event_type)) {
                    tracing::warn!(event_type = %envelope.event_type, error = ?e, "event handler threw");
                }
            })
        })?;
        Some(id.to_string())
    }

    #[wasm_bindgen]
    pub fn off(&self, event_type: &str, id: &str) -> bool {
        let Ok(id) = id.parse::<HandlerId>() else {
            return false;
        };
        self.read(|p| p.remove_event_handler(event_type, id)).unwrap_or(false)
    }

    #[wasm_bindgen(js_name = sessionId)]
    pub fn session_id(&self) -> Option<String> {
        self.read(|p| p.session_id().map(|id| id.to_string())).flatten()
    }

    #[wasm_bindgen]
    pub fn url(&self) -> Option<String> {
        self.read(|p| p.url().map(str::to_string)).flatten()
    }

    /// `"dash"`, `"hls"` or `"smooth"` while a session is active
    #[wasm_bindgen]
    pub fn tech(&self) -> Option<String> {
        self.read(|p| p.tech().map(|t| t.kind().to_string())).flatten()
    }

    /// The underlying engine object, `undefined` without a session
    #[wasm_bindgen(js_name = engine)]
    pub fn engine(&self) -> JsValue {
        self.read(|p| p.tech().and_then(|t| t.player()).map_or(JsValue::UNDEFINED, engine_to_js))
            .unwrap_or(JsValue::UNDEFINED)
    }

    #[wasm_bindgen]
    pub fn destroy(&self) {
        self.write(|p| p.destroy());
    }

    fn read<T>(&self, f: impl FnOnce(&Player) -> T) -> Option<T> {
        match self.player.try_borrow() {
            Ok(player) => Some(f(&player)),
            Err(_) => {
                tracing::warn!("player busy; call ignored");
                None
            }
        }
    }

    fn write<T>(&self, f: impl FnOnce(&mut Player) -> T) -> Option<T> {
        match self.player.try_borrow_mut() {
            Ok(mut player) => Some(f(&mut player)),
            Err(_) => {
                tracing::warn!("player busy; call ignored");
                None
            }
        }
    }
}

/// `"CODE: message"`, so hosts can branch on the code
fn host_error(error: &unistream_core::Error) -> JsValue {
    JsValue::from_str(&format!("{}: {}", error.error_code(), error))
}

fn payload_to_js(payload: &Payload) -> JsValue {
    match payload {
        Payload::Empty => JsValue::UNDEFINED,
        Payload::Json(value) => value
            .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
            .unwrap_or(JsValue::NULL),
        Payload::Native(_) => payload
            .downcast_ref::<JsValue>()
            .cloned()
            .or_else(|| payload.downcast_ref::<web_sys::Event>().map(|event| event.clone().into()))
            .unwrap_or(JsValue::UNDEFINED),
    }
}

fn engine_to_js(engine: Rc<dyn std::any::Any>) -> JsValue {
    use crate::engines::{DashJsEngine, HasPlayerEngine, HlsJsEngine};

    if let Some(dash) = engine.downcast_ref::<DashJsEngine>() {
        return dash.js_object();
    }
    if let Some(hls) = engine.downcast_ref::<HlsJsEngine>() {
        return hls.js_object();
    }
    if let Some(smooth) = engine.downcast_ref::<HasPlayerEngine>() {
        return smooth.js_object();
    }
    JsValue::UNDEFINED
}
