//! `MediaSink` over an HTML media element

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use unistream_core::{EventEnvelope, MediaSink, Payload, SinkListener, SubtitleTrack};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{Event, HtmlMediaElement, HtmlTrackElement};

pub(crate) type DomClosure = Closure<dyn FnMut(Event)>;

struct Attached {
    event_type: String,
    listener: SinkListener,
    closure: DomClosure,
}

/// A `<video>` or `<audio>` element.
///
/// Native events reach listeners as envelopes whose payload is the DOM
/// `Event` (`Payload::Native`).
pub struct HtmlMediaSink {
    element: HtmlMediaElement,
    attached: RefCell<Vec<Attached>>,
}

impl HtmlMediaSink {
    pub fn new(element: HtmlMediaElement) -> Self {
        Self {
            element,
            attached: RefCell::new(Vec::new()),
        }
    }

    pub fn element(&self) -> &HtmlMediaElement {
        &self.element
    }

    fn track_element(&self, track: &SubtitleTrack) -> Result<HtmlTrackElement, JsValue> {
        let document = self
            .element
            .owner_document()
            .ok_or_else(|| JsValue::from_str("media element has no document"))?;
        let element: HtmlTrackElement = document.create_element("track")?.dyn_into()?;
        element.set_kind(&track.kind);
        element.set_label(&track.label);
        element.set_src(&track.src);
        element.set_default(track.default);
        Ok(element)
    }
}

impl MediaSink for HtmlMediaSink {
    fn play(&self) {
        // the returned promise rejects when autoplay is blocked; the element
        // reports that through its own events
        if let Err(e) = self.element.play() {
            tracing::warn!(error = ?e, "play() failed");
        }
    }

    fn pause(&self) {
        if let Err(e) = self.element.pause() {
            tracing::warn!(error = ?e, "pause() failed");
        }
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }

    fn set_current_time(&self, seconds: f64) {
        self.element.set_current_time(seconds);
    }

    fn duration(&self) -> f64 {
        self.element.duration()
    }

    fn set_playback_rate(&self, rate: f64) {
        self.element.set_playback_rate(rate);
    }

    fn volume(&self) -> f64 {
        self.element.volume()
    }

    fn set_volume(&self, volume: f64) {
        self.element.set_volume(volume);
    }

    fn add_event_listener(&self, event_type: &str, listener: &SinkListener) {
        let forward = listener.clone();
        let name = event_type.to_string();
        let closure: DomClosure = Closure::new(move |event: Event| {
            forward(&EventEnvelope::new(name.as_str(), Payload::Native(Rc::new(event))));
        });

        if let Err(e) = self
            .element
            .add_event_listener_with_callback(event_type, closure.as_ref().unchecked_ref())
        {
            tracing::warn!(event_type, error = ?e, "addEventListener failed");
            return;
        }

        self.attached.borrow_mut().push(Attached {
            event_type: event_type.to_string(),
            listener: listener.clone(),
            closure,
        });
    }

    fn remove_event_listener(&self, event_type: &str, listener: &SinkListener) {
        let removed: Vec<Attached> = {
            let mut attached = self.attached.borrow_mut();
            let (removed, kept) = attached
                .drain(..)
                .partition(|a| a.event_type == event_type && Rc::ptr_eq(&a.listener, listener));
            *attached = kept;
            removed
        };

        for entry in removed {
            let _ = self
                .element
                .remove_event_listener_with_callback(event_type, entry.closure.as_ref().unchecked_ref());
            // the player may detach from inside one of these callbacks
            entry.closure.forget();
        }
    }

    fn append_subtitle_track(&self, track: &SubtitleTrack) {
        let appended = self
            .track_element(track)
            .and_then(|element| self.element.append_child(&element).map(|_| ()));
        if let Err(e) = appended {
            tracing::warn!(src = %track.src, error = ?e, "could not append subtitle track");
        }
    }

    fn clear_children(&self) {
        while let Some(child) = self.element.first_child() {
            if self.element.remove_child(&child).is_err() {
                break;
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for HtmlMediaSink {
    fn drop(&mut self) {
        for entry in self.attached.get_mut().drain(..) {
            let _ = self
                .element
                .remove_event_listener_with_callback(&entry.event_type, entry.closure.as_ref().unchecked_ref());
        }
    }
}
