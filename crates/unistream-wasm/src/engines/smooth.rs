//! hasplayer.js (Smooth Streaming) binding

use std::cell::RefCell;
use std::rc::Rc;

use js_sys::{Array, Function, Object, Reflect};
use unistream_core::engine::{SmoothEngine, SmoothEngineFactory, SmoothListener, SmoothStream};
use unistream_core::{Error, EventEnvelope, MediaSink, Payload, Result};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::HtmlMediaElement;

use super::media_element;

#[wasm_bindgen]
extern "C" {
    /// hasplayer.js `MediaPlayer` instance
    #[wasm_bindgen(js_name = MediaPlayer)]
    pub type HasPlayer;

    #[wasm_bindgen(constructor, catch, js_class = "MediaPlayer")]
    fn new() -> std::result::Result<HasPlayer, JsValue>;

    #[wasm_bindgen(method, js_class = "MediaPlayer")]
    fn init(this: &HasPlayer, video: &HtmlMediaElement);

    #[wasm_bindgen(method, js_class = "MediaPlayer")]
    fn load(this: &HasPlayer, stream: &JsValue);

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = addEventListener)]
    fn add_event_listener(this: &HasPlayer, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = removeEventListener)]
    fn remove_event_listener(this: &HasPlayer, event: &str, listener: &Function);

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = isLive)]
    fn is_live(this: &HasPlayer) -> bool;

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = getVideoBitrates)]
    fn get_video_bitrates(this: &HasPlayer) -> Array;

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = getQualityFor)]
    fn get_quality_for(this: &HasPlayer, media_type: &str) -> i32;

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = setQualityFor)]
    fn set_quality_for(this: &HasPlayer, media_type: &str, index: i32);

    #[wasm_bindgen(method, js_class = "MediaPlayer", js_name = setAutoSwitchQuality)]
    fn set_auto_switch_quality(this: &HasPlayer, enabled: bool);

    #[wasm_bindgen(method, js_class = "MediaPlayer")]
    fn reset(this: &HasPlayer);
}

struct Subscription {
    event_type: String,
    listener: SmoothListener,
    closure: Closure<dyn FnMut(JsValue)>,
}

/// `SmoothEngine` over a hasplayer.js `MediaPlayer`
pub struct HasPlayerEngine {
    player: HasPlayer,
    subscriptions: RefCell<Vec<Subscription>>,
}

impl HasPlayerEngine {
    /// The wrapped engine object
    pub fn js_object(&self) -> JsValue {
        self.player.clone().into()
    }
}

impl SmoothEngine for HasPlayerEngine {
    fn init(&self, sink: &Rc<dyn MediaSink>) {
        if let Some(element) = media_element(sink.as_ref()) {
            self.player.init(&element);
        }
    }

    fn load(&self, stream: &SmoothStream) {
        let descriptor = Object::new();
        let _ = Reflect::set(&descriptor, &"url".into(), &JsValue::from_str(&stream.url));
        self.player.load(&descriptor);
    }

    fn add_event_listener(&self, event_type: &str, listener: &SmoothListener) {
        let forward = listener.clone();
        let name = event_type.to_string();
        let closure: Closure<dyn FnMut(JsValue)> = Closure::new(move |event: JsValue| {
            forward(&EventEnvelope::new(name.as_str(), Payload::Native(Rc::new(event))));
        });
        self.player.add_event_listener(event_type, closure.as_ref().unchecked_ref());
        self.subscriptions.borrow_mut().push(Subscription {
            event_type: event_type.to_string(),
            listener: listener.clone(),
            closure,
        });
    }

    fn remove_event_listener(&self, event_type: &str, listener: &SmoothListener) {
        let removed: Vec<Subscription> = {
            let mut subscriptions = self.subscriptions.borrow_mut();
            let (removed, kept) = subscriptions
                .drain(..)
                .partition(|s| s.event_type == event_type && Rc::ptr_eq(&s.listener, listener));
            *subscriptions = kept;
            removed
        };
        for subscription in removed {
            self.player
                .remove_event_listener(event_type, subscription.closure.as_ref().unchecked_ref());
            // the host may destroy the player from inside an engine event
            subscription.closure.forget();
        }
    }

    fn is_live(&self) -> bool {
        self.player.is_live()
    }

    fn video_bitrates(&self) -> Vec<u64> {
        self.player
            .get_video_bitrates()
            .iter()
            .map(|bitrate| bitrate.as_f64().map_or(0, |b| b.max(0.0) as u64))
            .collect()
    }

    fn video_quality(&self) -> i32 {
        self.player.get_quality_for("video")
    }

    fn set_video_quality(&self, index: i32) {
        self.player.set_quality_for("video", index);
    }

    fn set_auto_switch_quality(&self, enabled: bool) {
        self.player.set_auto_switch_quality(enabled);
    }

    fn reset(&self) {
        self.player.reset();
    }
}

/// Creates engines from the page's `MediaPlayer` global
#[derive(Debug, Default, Clone, Copy)]
pub struct HasPlayerFactory;

impl SmoothEngineFactory for HasPlayerFactory {
    type Engine = HasPlayerEngine;

    fn create(&self) -> Result<HasPlayerEngine> {
        let player = HasPlayer::new().map_err(|e| Error::engine(format!("new MediaPlayer() failed: {:?}", e)))?;
        Ok(HasPlayerEngine {
            player,
            subscriptions: RefCell::new(Vec::new()),
        })
    }
}
