//! Normalized events and the handler registry
//!
//! Adapters turn every engine occurrence into one [`EventEnvelope`] and pass
//! it to the [`EventCallback`] the player gave them at `init`. The player
//! fans envelopes out to the handlers the host registered for that exact
//! event type.

use std::any::Any;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::rc::Rc;

/// Event types emitted by the adapters
pub mod types {
    pub const MANIFEST_LOADED: &str = "manifestLoaded";
    pub const STREAM_INITIALIZED: &str = "streamInitialized";
    pub const METRIC_CHANGED: &str = "metricChanged";
    pub const ERROR: &str = "error";
    pub const TIME_UPDATE: &str = "timeupdate";

    pub const HLS_MANIFEST_PARSED: &str = "hlsManifestParsed";
    pub const HLS_LEVEL_LOADED: &str = "hlsLevelLoaded";
    pub const HLS_ERROR: &str = "hlsError";
}

/// Native media element events the player subscribes to, plus the two
/// synthetic engine events (`manifestLoaded`, `streamInitialized`).
pub const MEDIA_EVENTS: [&str; 26] = [
    "manifestLoaded",
    "streamInitialized",
    "abort",
    "canplay",
    "canplaythrough",
    "durationchange",
    "emptied",
    "encrypted",
    "ended",
    "error",
    "interruptbegin",
    "loadeddata",
    "loadedmetadata",
    "loadstart",
    "pause",
    "play",
    "playing",
    "progress",
    "ratechange",
    "seeked",
    "seeking",
    "stalled",
    "suspend",
    "timeupdate",
    "volumechange",
    "waiting",
];

/// Event types fired often enough that dispatch does not log them
pub fn is_high_frequency(event_type: &str) -> bool {
    event_type == types::METRIC_CHANGED || event_type == types::TIME_UPDATE
}

/// Engine-specific data carried by an event
#[derive(Clone, Default)]
pub enum Payload {
    #[default]
    Empty,
    /// Plain data decoded from the engine event
    Json(serde_json::Value),
    /// The engine's own event object, untouched
    Native(Rc<dyn Any>),
}

impl Payload {
    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        match self {
            Payload::Native(native) => native.downcast_ref::<T>(),
            _ => None,
        }
    }
}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::Empty => write!(f, "Empty"),
            Payload::Json(value) => f.debug_tuple("Json").field(value).finish(),
            Payload::Native(_) => write!(f, "Native(..)"),
        }
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Payload::Json(value)
    }
}

/// The normalized unit flowing from adapters and the sink to the player
#[derive(Debug, Clone)]
pub struct EventEnvelope {
    pub event_type: String,
    pub payload: Payload,
}

impl EventEnvelope {
    pub fn new(event_type: impl Into<String>, payload: Payload) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    pub fn empty(event_type: impl Into<String>) -> Self {
        Self::new(event_type, Payload::Empty)
    }
}

/// Single callback an adapter uses for every event it forwards
pub type EventCallback = Rc<dyn Fn(&EventEnvelope)>;

/// Invoked when a DRM license cannot be obtained
pub type LicenseErrorCallback = Rc<dyn Fn()>;

/// Host-registered event handler
pub type EventHandler = Rc<dyn Fn(&EventEnvelope)>;

/// Handler id, unique within one registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct HandlerId(u64);

impl HandlerId {
    pub fn sequence(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler_{}", self.0)
    }
}

impl std::str::FromStr for HandlerId {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.strip_prefix("handler_")
            .and_then(|n| n.parse().ok())
            .map(HandlerId)
            .ok_or_else(|| crate::Error::InvalidConfig(format!("invalid handler id: {}", s)))
    }
}

/// Event type → handlers, in registration order.
///
/// Ids come from a counter private to the registry, so registration order
/// and id order coincide.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, BTreeMap<HandlerId, EventHandler>>,
    next_id: u64,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, event_type: &str, handler: EventHandler) -> HandlerId {
        let id = HandlerId(self.next_id);
        self.next_id += 1;
        self.handlers
            .entry(event_type.to_string())
            .or_default()
            .insert(id, handler);
        id
    }

    /// Remove exactly the handler registered under `id` for `event_type`
    pub fn remove(&mut self, event_type: &str, id: HandlerId) -> bool {
        let Some(map) = self.handlers.get_mut(event_type) else {
            return false;
        };
        let removed = map.remove(&id).is_some();
        if map.is_empty() {
            self.handlers.remove(event_type);
        }
        removed
    }

    /// Snapshot of the handlers for `event_type`, `None` when nothing is registered
    pub fn handlers_for(&self, event_type: &str) -> Option<Vec<EventHandler>> {
        self.handlers
            .get(event_type)
            .map(|map| map.values().cloned().collect())
    }

    pub fn len(&self, event_type: &str) -> usize {
        self.handlers.get(event_type).map_or(0, BTreeMap::len)
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .field("next_id", &self.next_id)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    fn recorder(log: &Rc<RefCell<Vec<&'static str>>>, tag: &'static str) -> EventHandler {
        let log = log.clone();
        Rc::new(move |_: &EventEnvelope| log.borrow_mut().push(tag))
    }

    #[test]
    fn test_ids_are_sequential() {
        let mut registry = HandlerRegistry::new();
        let noop: EventHandler = Rc::new(|_: &EventEnvelope| {});
        let a = registry.add("play", noop.clone());
        let b = registry.add("pause", noop);
        assert_eq!(a.to_string(), "handler_0");
        assert_eq!(b.to_string(), "handler_1");
        assert_eq!("handler_1".parse::<HandlerId>().unwrap(), b);
        assert!("h_1".parse::<HandlerId>().is_err());
    }

    #[test]
    fn test_registration_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        registry.add("play", recorder(&log, "first"));
        registry.add("play", recorder(&log, "second"));
        registry.add("play", recorder(&log, "third"));

        let envelope = EventEnvelope::empty("play");
        for handler in registry.handlers_for("play").unwrap() {
            handler(&envelope);
        }
        assert_eq!(*log.borrow(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_exact() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut registry = HandlerRegistry::new();
        let a = registry.add("play", recorder(&log, "a"));
        registry.add("play", recorder(&log, "b"));
        registry.add("pause", recorder(&log, "c"));

        // wrong type leaves everything in place
        assert!(!registry.remove("pause", a));
        assert!(registry.remove("play", a));
        assert!(!registry.remove("play", a));

        assert_eq!(registry.len("play"), 1);
        assert_eq!(registry.len("pause"), 1);
        assert!(registry.handlers_for("seeked").is_none());
    }

    #[test]
    fn test_high_frequency() {
        assert!(is_high_frequency("timeupdate"));
        assert!(is_high_frequency("metricChanged"));
        assert!(!is_high_frequency("play"));
    }

    #[test]
    fn test_payload_access() {
        let json = Payload::from(serde_json::json!({"a": 1}));
        assert_eq!(json.as_json().unwrap()["a"], 1);
        assert!(json.downcast_ref::<String>().is_none());

        let native = Payload::Native(Rc::new("raw".to_string()));
        assert_eq!(native.downcast_ref::<String>().map(String::as_str), Some("raw"));
        assert!(native.as_json().is_none());
    }
}
