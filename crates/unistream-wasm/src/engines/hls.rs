//! hls.js binding

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use unistream_core::engine::{
    HlsAudioTrack, HlsConfig, HlsEngine, HlsEngineFactory, HlsErrorData, HlsErrorType, HlsEvent, HlsEventKind,
    HlsLevel, HlsListener,
};
use unistream_core::{Error, MediaSink, Payload, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{HtmlMediaElement, XmlHttpRequest};

use super::{get_path, media_element, XhrHeaders};

#[wasm_bindgen]
extern "C" {
    /// hls.js `Hls` instance
    #[wasm_bindgen(js_name = Hls)]
    pub type HlsJs;

    #[wasm_bindgen(constructor, catch, js_class = "Hls")]
    fn new(config: &JsValue) -> std::result::Result<HlsJs, JsValue>;

    #[wasm_bindgen(method, js_class = "Hls")]
    fn on(this: &HlsJs, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "Hls")]
    fn off(this: &HlsJs, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "Hls", js_name = loadSource)]
    fn load_source(this: &HlsJs, url: &str);

    #[wasm_bindgen(method, js_class = "Hls", js_name = attachMedia)]
    fn attach_media(this: &HlsJs, media: &HtmlMediaElement);

    #[wasm_bindgen(method, js_class = "Hls", js_name = startLoad)]
    fn start_load(this: &HlsJs);

    #[wasm_bindgen(method, js_class = "Hls", js_name = recoverMediaError)]
    fn recover_media_error(this: &HlsJs);

    #[wasm_bindgen(method, js_class = "Hls", js_name = swapAudioCodec)]
    fn swap_audio_codec(this: &HlsJs);

    #[wasm_bindgen(method, getter, js_class = "Hls")]
    fn levels(this: &HlsJs) -> Array;

    #[wasm_bindgen(method, getter, js_class = "Hls", js_name = currentLevel)]
    fn current_level(this: &HlsJs) -> i32;

    #[wasm_bindgen(method, setter, js_class = "Hls", js_name = currentLevel)]
    fn set_current_level(this: &HlsJs, level: i32);

    #[wasm_bindgen(method, getter, js_class = "Hls", js_name = audioTracks)]
    fn audio_tracks(this: &HlsJs) -> Array;

    #[wasm_bindgen(method, setter, js_class = "Hls", js_name = audioTrack)]
    fn set_audio_track(this: &HlsJs, index: i32);

    #[wasm_bindgen(method, js_class = "Hls")]
    fn destroy(this: &HlsJs);
}

type JsListener = Closure<dyn FnMut(JsValue, JsValue)>;

struct Subscription {
    kind: HlsEventKind,
    listener: HlsListener,
    closure: JsListener,
}

/// `HlsEngine` over an `Hls` instance
pub struct HlsJsEngine {
    hls: HlsJs,
    subscriptions: RefCell<Vec<Subscription>>,
    /// `xhrSetup` from the engine config, alive as long as the engine
    _xhr_setup: Option<Closure<dyn Fn(XmlHttpRequest, String)>>,
}

impl HlsJsEngine {
    /// The wrapped engine object
    pub fn js_object(&self) -> JsValue {
        self.hls.clone().into()
    }

    fn decode(kind: HlsEventKind, data: JsValue) -> HlsEvent {
        match kind {
            HlsEventKind::ManifestParsed => HlsEvent::ManifestParsed(Payload::Native(Rc::new(data))),
            HlsEventKind::LevelLoaded => HlsEvent::LevelLoaded {
                details_type: get_path(&data, &["details", "type"]).as_string(),
                payload: Payload::Native(Rc::new(data)),
            },
            HlsEventKind::Error => HlsEvent::Error {
                error: HlsErrorData {
                    error_type: HlsErrorType::parse(&get_path(&data, &["type"]).as_string().unwrap_or_default()),
                    details: get_path(&data, &["details"]).as_string().unwrap_or_default(),
                    fatal: get_path(&data, &["fatal"]).as_bool().unwrap_or(false),
                },
                payload: Payload::Native(Rc::new(data)),
            },
        }
    }
}

impl HlsEngine for HlsJsEngine {
    fn on(&self, kind: HlsEventKind, listener: &HlsListener) {
        let forward = listener.clone();
        let closure: JsListener =
            Closure::new(move |_event: JsValue, data: JsValue| forward(&Self::decode(kind, data)));
        self.hls.on(kind.name(), closure.as_ref().unchecked_ref());
        self.subscriptions.borrow_mut().push(Subscription {
            kind,
            listener: listener.clone(),
            closure,
        });
    }

    fn off(&self, kind: HlsEventKind, listener: &HlsListener) {
        let removed: Vec<Subscription> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let (removed, kept) = subscriptions
                .drain(..)
                .partition(|s| s.kind == kind && Rc::ptr_eq(&s.listener, listener));
            *subscriptions = kept;
            removed
        };
        for subscription in removed {
            self.hls.off(kind.name(), subscription.closure.as_ref().unchecked_ref());
            // teardown runs from inside the error callback
            subscription.closure.forget();
        }
    }

    fn load_source(&self, url: &str) {
        self.hls.load_source(url);
    }

    fn attach_media(&self, sink: &Rc<dyn MediaSink>) {
        if let Some(element) = media_element(sink.as_ref()) {
            self.hls.attach_media(&element);
        }
    }

    fn start_load(&self) {
        self.hls.start_load();
    }

    fn recover_media_error(&self) {
        self.hls.recover_media_error();
    }

    fn swap_audio_codec(&self) {
        self.hls.swap_audio_codec();
    }

    fn levels(&self) -> Vec<HlsLevel> {
        self.hls
            .levels()
            .iter()
            .map(|level| HlsLevel {
                level: get_path(&level, &["level"]).as_f64().map(|l| l as i32),
                bitrate: get_path(&level, &["bitrate"]).as_f64().map_or(0, |b| b.max(0.0) as u64),
                width: get_path(&level, &["width"]).as_f64().map_or(0, |w| w as u32),
                height: get_path(&level, &["height"]).as_f64().map_or(0, |h| h as u32),
            })
            .collect()
    }

    fn current_level(&self) -> i32 {
        self.hls.current_level()
    }

    fn set_current_level(&self, level: i32) {
        self.hls.set_current_level(level);
    }

    fn audio_tracks(&self) -> Vec<HlsAudioTrack> {
        self.hls
            .audio_tracks()
            .iter()
            .map(|track| HlsAudioTrack {
                name: get_path(&track, &["name"]).as_string().unwrap_or_default(),
                lang: get_path(&track, &["lang"]).as_string().unwrap_or_default(),
            })
            .collect()
    }

    fn set_audio_track(&self, index: i32) {
        self.hls.set_audio_track(index);
    }

    fn destroy(&self) {
        self.hls.destroy();
    }
}

/// Creates engines from the page's `Hls` global
#[derive(Debug, Default, Clone, Copy)]
pub struct HlsJsFactory;

impl HlsEngineFactory for HlsJsFactory {
    type Engine = HlsJsEngine;

    fn create(&self, config: HlsConfig) -> Result<HlsJsEngine> {
        let options = Object::new();
        let _ = Reflect::set(&options, &"enableWorker".into(), &JsValue::from_bool(config.enable_worker));
        let _ = Reflect::set(&options, &"debug".into(), &JsValue::from_bool(config.debug));

        let xhr_setup = config.headers.is_some().then(|| {
            let config = config.clone();
            let setup: Closure<dyn Fn(XmlHttpRequest, String)> =
                Closure::new(move |xhr: XmlHttpRequest, url: String| config.xhr_setup(&mut XhrHeaders(&xhr), &url));
            let _ = Reflect::set(&options, &"xhrSetup".into(), setup.as_ref());
            setup
        });

        let hls = HlsJs::new(&options).map_err(|e| Error::engine(format!("new Hls() failed: {:?}", e)))?;
        Ok(HlsJsEngine {
            hls,
            subscriptions: RefCell::new(Vec::new()),
            _xhr_setup: xhr_setup,
        })
    }
}
