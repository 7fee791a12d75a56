//! dash.js binding

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use serde::Serialize;
use unistream_core::config::ProtectionData;
use unistream_core::engine::{
    DashBitrateInfo, DashEngine, DashEngineFactory, DashError, DashEvent, DashEventKind, DashListener,
    DashTrackInfo, RequestModifier,
};
use unistream_core::{Error, MediaSink, Payload, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlMediaElement, XmlHttpRequest};

use super::{call_if_present, get_path, media_element, nested, XhrHeaders};

#[wasm_bindgen]
extern "C" {
    type MediaPlayerFactory;

    #[wasm_bindgen(catch, js_namespace = dashjs, js_name = MediaPlayer)]
    fn media_player() -> std::result::Result<MediaPlayerFactory, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn create(this: &MediaPlayerFactory) -> std::result::Result<DashJsPlayer, JsValue>;

    /// dash.js `MediaPlayer` instance
    pub type DashJsPlayer;

    #[wasm_bindgen(method)]
    fn on(this: &DashJsPlayer, event: &str, listener: &Function);

    #[wasm_bindgen(method)]
    fn off(this: &DashJsPlayer, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_name = setProtectionData)]
    fn set_protection_data(this: &DashJsPlayer, data: &JsValue);

    #[wasm_bindgen(method)]
    fn extend(this: &DashJsPlayer, parent: &str, child: &Function, override_: bool);

    #[wasm_bindgen(method)]
    fn initialize(this: &DashJsPlayer, view: &HtmlMediaElement, url: &str, autoplay: bool);

    #[wasm_bindgen(method, js_name = getTracksFor)]
    fn get_tracks_for(this: &DashJsPlayer, media_type: &str) -> Array;

    #[wasm_bindgen(method, js_name = setCurrentTrack)]
    fn set_current_track(this: &DashJsPlayer, track: &JsValue);

    #[wasm_bindgen(method, js_name = getBitrateInfoListFor)]
    fn get_bitrate_info_list_for(this: &DashJsPlayer, media_type: &str) -> Array;

    #[wasm_bindgen(method, js_name = getQualityFor)]
    fn get_quality_for(this: &DashJsPlayer, media_type: &str) -> i32;

    #[wasm_bindgen(method, js_name = setQualityFor)]
    fn set_quality_for(this: &DashJsPlayer, media_type: &str, index: i32);

    #[wasm_bindgen(method)]
    fn reset(this: &DashJsPlayer);
}

type JsListener = Closure<dyn FnMut(JsValue)>;

struct Subscription {
    kind: DashEventKind,
    listener: DashListener,
    closure: JsListener,
}

/// Callbacks handed to `extend("RequestModifier", ...)`
struct ModifierClosures {
    _factory: Closure<dyn Fn() -> JsValue>,
    _header: Closure<dyn Fn(XmlHttpRequest) -> XmlHttpRequest>,
    _url: Closure<dyn Fn(String) -> String>,
}

/// `DashEngine` over a dash.js `MediaPlayer`.
///
/// Calls that changed across dash.js releases (fast switching, console
/// logging, automatic switching, robustness) try the older setter first and
/// fall back to `updateSettings`.
pub struct DashJsEngine {
    player: DashJsPlayer,
    subscriptions: RefCell<Vec<Subscription>>,
    modifier: RefCell<Option<ModifierClosures>>,
}

impl DashJsEngine {
    /// The wrapped engine object
    pub fn js_object(&self) -> JsValue {
        self.player.clone().into()
    }

    fn update_settings(&self, path: &[&str], value: JsValue) {
        if call_if_present(&self.player, "updateSettings", &[nested(path, value)]).is_none() {
            tracing::debug!(setting = %path.join("."), "updateSettings unavailable");
        }
    }

    fn decode(kind: DashEventKind, event: JsValue) -> DashEvent {
        match kind {
            DashEventKind::MetricChanged => DashEvent::MetricChanged(Payload::Native(Rc::new(event))),
            DashEventKind::StreamInitialized => DashEvent::StreamInitialized(Payload::Native(Rc::new(event))),
            DashEventKind::ManifestLoaded => DashEvent::ManifestLoaded {
                manifest_type: get_path(&event, &["data", "type"]).as_string(),
                payload: Payload::Native(Rc::new(event)),
            },
            DashEventKind::Error => {
                let raw = get_path(&event, &["error"]);
                let error = match raw.as_string() {
                    Some(name) => DashError::Named(name),
                    None => DashError::Code {
                        code: get_path(&raw, &["code"]).as_f64().map_or(0, |code| code as i64),
                        message: get_path(&raw, &["message"]).as_string().unwrap_or_default(),
                    },
                };
                DashEvent::Error {
                    error,
                    payload: Payload::Native(Rc::new(event)),
                }
            }
        }
    }
}

impl DashEngine for DashJsEngine {
    fn on(&self, kind: DashEventKind, listener: &DashListener) {
        let forward = listener.clone();
        let closure: JsListener = Closure::new(move |event: JsValue| forward(&Self::decode(kind, event)));
        self.player.on(kind.name(), closure.as_ref().unchecked_ref());
        self.subscriptions.borrow_mut().push(Subscription {
            kind,
            listener: listener.clone(),
            closure,
        });
    }

    fn off(&self, kind: DashEventKind, listener: &DashListener) {
        let removed: Vec<Subscription> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let (removed, kept) = subscriptions
                .drain(..)
                .partition(|s| s.kind == kind && Rc::ptr_eq(&s.listener, listener));
            *subscriptions = kept;
            removed
        };
        for subscription in removed {
            self.player.off(kind.name(), subscription.closure.as_ref().unchecked_ref());
            // teardown runs from inside the error callback
            subscription.closure.forget();
        }
    }

    fn set_fast_switch_enabled(&self, enabled: bool) {
        if call_if_present(&self.player, "setFastSwitchEnabled", &[JsValue::from_bool(enabled)]).is_none() {
            self.update_settings(&["streaming", "fastSwitchEnabled"], JsValue::from_bool(enabled));
        }
    }

    fn set_log_to_console(&self, enabled: bool) {
        let debug = call_if_present(&self.player, "getDebug", &[]).unwrap_or(JsValue::UNDEFINED);
        if call_if_present(&debug, "setLogToBrowserConsole", &[JsValue::from_bool(enabled)]).is_none() {
            // dash.js 3+: Debug.LOG_LEVEL_DEBUG (5) or LOG_LEVEL_NONE (0)
            let level = if enabled { 5.0 } else { 0.0 };
            self.update_settings(&["debug", "logLevel"], JsValue::from_f64(level));
        }
    }

    fn set_robustness_level(&self, level: &str) {
        let controller = call_if_present(&self.player, "getProtectionController", &[]).unwrap_or(JsValue::UNDEFINED);
        if call_if_present(&controller, "setRobustnessLevel", &[JsValue::from_str(level)]).is_none() {
            tracing::warn!(level, "protection controller does not accept a robustness level");
        }
    }

    fn set_protection_data(&self, data: &ProtectionData) {
        // plain objects, not `Map`s: dash.js reads key systems as properties
        match data.as_value().serialize(&serde_wasm_bindgen::Serializer::json_compatible()) {
            Ok(value) => self.player.set_protection_data(&value),
            Err(e) => tracing::error!(error = %e, "protection data is not representable in JS"),
        }
    }

    fn extend_request_modifier(&self, modifier: RequestModifier) {
        let modifier = Rc::new(modifier);

        let headers = modifier.clone();
        let header: Closure<dyn Fn(XmlHttpRequest) -> XmlHttpRequest> = Closure::new(move |xhr: XmlHttpRequest| {
            headers.modify_request_header(&mut XhrHeaders(&xhr));
            xhr
        });
        let urls = modifier;
        let url: Closure<dyn Fn(String) -> String> = Closure::new(move |url: String| urls.modify_request_url(&url));

        let object = Object::new();
        let _ = Reflect::set(&object, &"modifyRequestHeader".into(), header.as_ref());
        let _ = Reflect::set(&object, &"modifyRequestURL".into(), url.as_ref());
        let object: JsValue = object.into();
        let factory: Closure<dyn Fn() -> JsValue> = Closure::new(move || object.clone());

        self.player.extend("RequestModifier", factory.as_ref().unchecked_ref(), true);
        *self.modifier.borrow_mut() = Some(ModifierClosures {
            _factory: factory,
            _header: header,
            _url: url,
        });
    }

    fn initialize(&self, sink: &Rc<dyn MediaSink>, url: &str, autoplay: bool) {
        if let Some(element) = media_element(sink.as_ref()) {
            self.player.initialize(&element, url, autoplay);
        }
    }

    fn audio_tracks(&self) -> Vec<DashTrackInfo> {
        self.player
            .get_tracks_for("audio")
            .iter()
            .enumerate()
            .map(|(position, track)| DashTrackInfo {
                index: get_path(&track, &["index"]).as_f64().map_or(position as i32, |i| i as i32),
                lang: get_path(&track, &["lang"]).as_string().unwrap_or_default(),
                name: get_path(&track, &["labels", "0", "text"])
                    .as_string()
                    .or_else(|| get_path(&track, &["id"]).as_string())
                    .unwrap_or_default(),
            })
            .collect()
    }

    fn set_current_track(&self, track: &DashTrackInfo) {
        let raw = self.player.get_tracks_for("audio");
        let found = raw
            .iter()
            .find(|t| get_path(t, &["index"]).as_f64().map(|i| i as i32) == Some(track.index));
        match found {
            Some(raw_track) => self.player.set_current_track(&raw_track),
            None => tracing::warn!(index = track.index, "audio track vanished before selection"),
        }
    }

    fn video_bitrates(&self) -> Vec<DashBitrateInfo> {
        self.player
            .get_bitrate_info_list_for("video")
            .iter()
            .enumerate()
            .map(|(position, info)| DashBitrateInfo {
                quality_index: get_path(&info, &["qualityIndex"])
                    .as_f64()
                    .map_or(position as i32, |i| i as i32),
                bitrate: get_path(&info, &["bitrate"]).as_f64().map_or(0, |b| b.max(0.0) as u64),
                width: get_path(&info, &["width"]).as_f64().map_or(0, |w| w as u32),
                height: get_path(&info, &["height"]).as_f64().map_or(0, |h| h as u32),
            })
            .collect()
    }

    fn video_quality(&self) -> i32 {
        self.player.get_quality_for("video")
    }

    fn set_video_quality(&self, index: i32) {
        self.player.set_quality_for("video", index);
    }

    fn set_auto_switch_quality(&self, enabled: bool) {
        let flag = JsValue::from_bool(enabled);
        if call_if_present(&self.player, "setAutoSwitchQuality", &[flag.clone()]).is_some() {
            return;
        }
        if call_if_present(&self.player, "setAutoSwitchQualityFor", &["video".into(), flag.clone()]).is_some() {
            return;
        }
        self.update_settings(&["streaming", "abr", "autoSwitchBitrate", "video"], flag);
    }

    fn reset(&self) {
        self.player.reset();
        if let Some(closures) = self.modifier.borrow_mut().take() {
            // dash.js may still hold the modifier until the next tick
            std::mem::forget(closures);
        }
    }
}

/// Creates engines from the page's `dashjs` global
#[derive(Debug, Default, Clone, Copy)]
pub struct DashJsFactory;

impl DashEngineFactory for DashJsFactory {
    type Engine = DashJsEngine;

    fn create(&self) -> Result<DashJsEngine> {
        let player = media_player()
            .and_then(|factory| factory.create())
            .map_err(|e| Error::engine(format!("dashjs.MediaPlayer().create() failed: {:?}", e)))?;
        Ok(DashJsEngine {
            player,
            subscriptions: RefCell::new(Vec::new()),
            modifier: RefCell::new(None),
        })
    }
}
