//! Engine bindings
//!
//! Each binding wraps the engine's JavaScript object and implements the
//! matching capability trait from `unistream_core::engine`. JS callbacks are
//! owned by the binding and live as long as the subscription they back.

mod dash;
mod hls;
mod smooth;

pub use dash::{DashJsEngine, DashJsFactory};
pub use hls::{HlsJsEngine, HlsJsFactory};
pub use smooth::{HasPlayerEngine, HasPlayerFactory};

use js_sys::{Array, Function, Reflect};
use unistream_core::config::HeaderTarget;
use unistream_core::MediaSink;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{HtmlMediaElement, XmlHttpRequest};

use crate::sink::HtmlMediaSink;

/// Read `target.a.b.c`, `undefined` when any step is missing
pub(crate) fn get_path(target: &JsValue, path: &[&str]) -> JsValue {
    let mut current = target.clone();
    for key in path {
        if current.is_undefined() || current.is_null() {
            return JsValue::UNDEFINED;
        }
        current = Reflect::get(&current, &JsValue::from_str(key)).unwrap_or(JsValue::UNDEFINED);
    }
    current
}

/// Call `target[name](...args)` when that method exists.
///
/// Returns `None` if there is no such function or the call threw.
pub(crate) fn call_if_present(target: &JsValue, name: &str, args: &[JsValue]) -> Option<JsValue> {
    let method = get_path(target, &[name]).dyn_into::<Function>().ok()?;
    let args: Array = args.iter().collect();
    match method.apply(target, &args) {
        Ok(value) => Some(value),
        Err(e) => {
            tracing::warn!(method = name, error = ?e, "engine call threw");
            None
        }
    }
}

/// Build `{a: {b: value}}` from a key path
pub(crate) fn nested(path: &[&str], value: JsValue) -> JsValue {
    path.iter().rev().fold(value, |inner, key| {
        let object = js_sys::Object::new();
        let _ = Reflect::set(&object, &JsValue::from_str(key), &inner);
        object.into()
    })
}

/// The DOM element behind a sink, when the sink is an [`HtmlMediaSink`]
pub(crate) fn media_element(sink: &dyn MediaSink) -> Option<HtmlMediaElement> {
    let element = sink
        .as_any()
        .downcast_ref::<HtmlMediaSink>()
        .map(|html| html.element().clone());
    if element.is_none() {
        tracing::error!("engine bindings need an HtmlMediaSink");
    }
    element
}

/// Header injection into an outgoing XHR
pub(crate) struct XhrHeaders<'a>(pub &'a XmlHttpRequest);

impl HeaderTarget for XhrHeaders<'_> {
    fn set_request_header(&mut self, name: &str, value: &str) {
        if let Err(e) = self.0.set_request_header(name, value) {
            tracing::warn!(header = name, error = ?e, "setRequestHeader failed");
        }
    }
}
