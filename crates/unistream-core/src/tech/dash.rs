//! DASH adapter over a dash.js-style engine

use super::classify::{classify_dash, ErrorClass};
use super::{match_quality, Tech};
use crate::config::SessionConfig;
use crate::engine::dash::{DYNAMIC_MANIFEST, SW_SECURE_CRYPTO};
use crate::engine::{DashEngine, DashEngineFactory, DashEvent, DashEventKind, DashListener, RequestModifier};
use crate::error::{Error, Result};
use crate::events::{EventCallback, EventEnvelope, LicenseErrorCallback};
use crate::logger::Logger;
use crate::sink::MediaSink;
use crate::types::{AudioTrack, QualityLevel, TechKind, TechState, AUTO_QUALITY_INDEX};
use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

/// Engine listeners, kept so `destroy` detaches the same values it attached
#[derive(Clone)]
struct DashListeners {
    passthrough: DashListener,
    stream_type: DashListener,
    error: DashListener,
}

impl DashListeners {
    fn for_kind(&self, kind: DashEventKind) -> &DashListener {
        match kind {
            DashEventKind::MetricChanged | DashEventKind::StreamInitialized => &self.passthrough,
            DashEventKind::ManifestLoaded => &self.stream_type,
            DashEventKind::Error => &self.error,
        }
    }
}

struct DashState<E> {
    lifecycle: TechState,
    engine: Option<Rc<E>>,
    listeners: Option<DashListeners>,
    events: Option<EventCallback>,
    on_license_error: Option<LicenseErrorCallback>,
    is_live: bool,
    logger: Logger,
}

/// `Tech` backed by a DASH engine
pub struct DashTech<F: DashEngineFactory> {
    factory: F,
    state: Rc<RefCell<DashState<F::Engine>>>,
}

impl<F: DashEngineFactory> DashTech<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Rc::new(RefCell::new(DashState {
                lifecycle: TechState::Uninitialized,
                engine: None,
                listeners: None,
                events: None,
                on_license_error: None,
                is_live: false,
                logger: Logger::new("DashTech"),
            })),
        }
    }

    /// Typed engine handle
    pub fn engine(&self) -> Option<Rc<F::Engine>> {
        self.state.borrow().engine.clone()
    }

    fn listeners(state: &Rc<RefCell<DashState<F::Engine>>>) -> DashListeners {
        let weak = Rc::downgrade(state);
        let passthrough: DashListener = Rc::new(move |event: &DashEvent| {
            if let Some(events) = live_callback(&weak) {
                events(&EventEnvelope::new(event.kind().name(), event.payload().clone()));
            }
        });

        let weak = Rc::downgrade(state);
        let stream_type: DashListener = Rc::new(move |event: &DashEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let events = {
                let mut s = state.borrow_mut();
                if s.engine.is_none() {
                    return;
                }
                if let DashEvent::ManifestLoaded {
                    manifest_type: Some(manifest_type),
                    ..
                } = event
                {
                    if manifest_type == DYNAMIC_MANIFEST {
                        s.is_live = true;
                    }
                }
                s.events.clone()
            };
            if let Some(events) = events {
                events(&EventEnvelope::new(event.kind().name(), event.payload().clone()));
            }
        });

        let weak = Rc::downgrade(state);
        let error: DashListener = Rc::new(move |event: &DashEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let DashEvent::Error { error, payload } = event else {
                return;
            };

            let (events, on_license_error) = {
                let s = state.borrow();
                if s.engine.is_none() {
                    return;
                }
                s.logger.e(error.message());
                (s.events.clone(), s.on_license_error.clone())
            };

            match events {
                Some(events) => events(&EventEnvelope::new(event.kind().name(), payload.clone())),
                None => state.borrow().logger.w("event callback is undefined"),
            }

            let classification = classify_dash(error);
            if classification.class == ErrorClass::License {
                if let Some(on_license_error) = on_license_error {
                    on_license_error();
                }
            }
            if classification.tears_down() {
                teardown(&state);
            }
        });

        DashListeners {
            passthrough,
            stream_type,
            error,
        }
    }
}

/// Callback to forward through, `None` once the adapter is gone
fn live_callback<E>(weak: &Weak<RefCell<DashState<E>>>) -> Option<EventCallback> {
    let state = weak.upgrade()?;
    let s = state.borrow();
    s.engine.as_ref()?;
    s.events.clone()
}

fn teardown<E: DashEngine>(state: &Rc<RefCell<DashState<E>>>) {
    let (engine, listeners) = {
        let mut s = state.borrow_mut();
        if !s.lifecycle.can_transition_to(TechState::Destroyed) {
            return;
        }
        s.lifecycle = TechState::Destroyed;
        (s.engine.take(), s.listeners.take())
    };

    if let Some(engine) = engine {
        if let Some(listeners) = listeners {
            for kind in DashEventKind::ALL {
                engine.off(kind, listeners.for_kind(kind));
            }
        }
        state.borrow().logger.d("dash engine destroy");
        engine.reset();
    }
}

impl<F> Tech for DashTech<F>
where
    F: DashEngineFactory + 'static,
{
    fn kind(&self) -> TechKind {
        TechKind::Dash
    }

    fn state(&self) -> TechState {
        self.state.borrow().lifecycle
    }

    fn init(
        &mut self,
        sink: Rc<dyn MediaSink>,
        config: &SessionConfig,
        events: EventCallback,
        on_license_error: Option<LicenseErrorCallback>,
    ) -> Result<()> {
        match self.state() {
            TechState::Initialized => return Err(Error::AlreadyInitialized("dash")),
            TechState::Destroyed => return Err(Error::TechDestroyed("dash")),
            TechState::Uninitialized => {}
        }

        let engine = Rc::new(self.factory.create()?);
        let listeners = Self::listeners(&self.state);
        {
            let mut s = self.state.borrow_mut();
            s.logger.set_debug(config.debug);
            s.lifecycle = TechState::Initialized;
            s.engine = Some(engine.clone());
            s.listeners = Some(listeners.clone());
            s.events = Some(events);
            s.on_license_error = on_license_error;
        }

        for kind in DashEventKind::ALL {
            engine.on(kind, listeners.for_kind(kind));
        }

        engine.set_fast_switch_enabled(true);
        engine.set_log_to_console(config.debug);

        if let Some(protection_data) = &config.protection_data {
            engine.set_robustness_level(SW_SECURE_CRYPTO);
            engine.set_protection_data(protection_data);
        }

        if let Some(headers) = &config.headers {
            engine.extend_request_modifier(RequestModifier::new(headers.clone()));
        }

        self.state.borrow().logger.d("initializing");
        engine.initialize(&sink, &config.url, config.autoplay);
        Ok(())
    }

    fn player(&self) -> Option<Rc<dyn Any>> {
        self.engine().map(|engine| engine as Rc<dyn Any>)
    }

    fn is_live(&self) -> bool {
        self.state.borrow().is_live
    }

    fn audio_tracks(&self) -> Vec<AudioTrack> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };
        engine
            .audio_tracks()
            .iter()
            .enumerate()
            .map(|(position, track)| AudioTrack::new(track.index, position, &track.lang, &track.name))
            .collect()
    }

    fn set_audio_track(&mut self, index: i32) {
        let Some(engine) = self.engine() else {
            return;
        };
        if let Some(track) = engine.audio_tracks().into_iter().find(|t| t.index == index) {
            engine.set_current_track(&track);
        }
    }

    fn qualities(&self) -> Vec<QualityLevel> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };
        engine
            .video_bitrates()
            .into_iter()
            .map(|info| QualityLevel::new(info.quality_index, info.bitrate, info.width, info.height))
            .collect()
    }

    fn set_quality(&mut self, index: i32) {
        let Some(engine) = self.engine() else {
            return;
        };

        if index == AUTO_QUALITY_INDEX {
            engine.set_auto_switch_quality(true);
            return;
        }

        engine.set_auto_switch_quality(false);
        engine.set_video_quality(index);
    }

    fn current_quality(&self) -> QualityLevel {
        match self.engine() {
            Some(engine) => match_quality(self.qualities(), engine.video_quality()),
            None => QualityLevel::fallback(),
        }
    }

    fn destroy(&mut self) {
        teardown(&self.state);
    }
}
