//! HLS adapter over an hls.js-style engine

use super::classify::{classify_hls, ErrorClass};
use super::{match_quality, Tech};
use crate::config::SessionConfig;
use crate::engine::hls::VOD_PLAYLIST;
use crate::engine::{HlsConfig, HlsEngine, HlsEngineFactory, HlsEvent, HlsEventKind, HlsListener};
use crate::error::{Error, Result};
use crate::events::{EventCallback, EventEnvelope, LicenseErrorCallback};
use crate::logger::Logger;
use crate::sink::MediaSink;
use crate::types::{AudioTrack, QualityLevel, TechKind, TechState};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Clone)]
struct HlsListeners {
    manifest_parsed: HlsListener,
    level_loaded: HlsListener,
    error: HlsListener,
}

impl HlsListeners {
    fn for_kind(&self, kind: HlsEventKind) -> &HlsListener {
        match kind {
            HlsEventKind::ManifestParsed => &self.manifest_parsed,
            HlsEventKind::LevelLoaded => &self.level_loaded,
            HlsEventKind::Error => &self.error,
        }
    }
}

struct HlsState<E> {
    lifecycle: TechState,
    engine: Option<Rc<E>>,
    listeners: Option<HlsListeners>,
    events: Option<EventCallback>,
    on_license_error: Option<LicenseErrorCallback>,
    sink: Option<Rc<dyn MediaSink>>,
    autoplay: bool,
    is_live: bool,
    /// Fatal media errors seen so far in this session
    media_recoveries: u32,
    logger: Logger,
}

/// `Tech` backed by an HLS engine
pub struct HlsTech<F: HlsEngineFactory> {
    factory: F,
    state: Rc<RefCell<HlsState<F::Engine>>>,
}

impl<F: HlsEngineFactory> HlsTech<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Rc::new(RefCell::new(HlsState {
                lifecycle: TechState::Uninitialized,
                engine: None,
                listeners: None,
                events: None,
                on_license_error: None,
                sink: None,
                autoplay: false,
                is_live: false,
                media_recoveries: 0,
                logger: Logger::new("HlsTech"),
            })),
        }
    }

    pub fn engine(&self) -> Option<Rc<F::Engine>> {
        self.state.borrow().engine.clone()
    }

    fn listeners(state: &Rc<RefCell<HlsState<F::Engine>>>) -> HlsListeners {
        let weak = Rc::downgrade(state);
        let manifest_parsed: HlsListener = Rc::new(move |event: &HlsEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let (events, autoplay_sink) = {
                let s = state.borrow();
                if s.engine.is_none() {
                    return;
                }
                let sink = if s.autoplay { s.sink.clone() } else { None };
                (s.events.clone(), sink)
            };

            if let Some(events) = events {
                events(&EventEnvelope::new(event.kind().name(), event.payload().clone()));
            }
            if let Some(sink) = autoplay_sink {
                sink.play();
            }
        });

        let weak = Rc::downgrade(state);
        let level_loaded: HlsListener = Rc::new(move |event: &HlsEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let events = {
                let mut s = state.borrow_mut();
                if s.engine.is_none() {
                    return;
                }
                if let HlsEvent::LevelLoaded {
                    details_type: Some(details_type),
                    ..
                } = event
                {
                    if details_type != VOD_PLAYLIST {
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
        let error: HlsListener = Rc::new(move |event: &HlsEvent| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let HlsEvent::Error { error, payload } = event else {
                return;
            };

            let events = {
                let s = state.borrow();
                if s.engine.is_none() {
                    return;
                }
                s.logger.i(format_args!(
                    "{} {} fatal={}",
                    error.error_type.as_str(),
                    error.details,
                    error.fatal
                ));
                s.events.clone()
            };

            if let Some(events) = events {
                events(&EventEnvelope::new(event.kind().name(), payload.clone()));
            }

            // a host handler may have torn the adapter down in the meantime
            let Some(engine) = state.borrow().engine.clone() else {
                return;
            };

            let classification = classify_hls(error);
            match classification.class {
                ErrorClass::Media => {
                    let previous = {
                        let mut s = state.borrow_mut();
                        s.logger.e("media error");
                        let previous = s.media_recoveries;
                        s.media_recoveries += 1;
                        previous
                    };
                    if previous == 1 {
                        engine.swap_audio_codec();
                    }
                    engine.recover_media_error();
                }
                ErrorClass::Transport => {
                    state.borrow().logger.e("network error");
                    engine.start_load();
                }
                ErrorClass::License => {
                    let on_license_error = {
                        let s = state.borrow();
                        s.logger.e("license error");
                        s.on_license_error.clone()
                    };
                    if let Some(on_license_error) = on_license_error {
                        on_license_error();
                    }
                }
                ErrorClass::Fatal => state.borrow().logger.e("unrecoverable error"),
                ErrorClass::Ignored => {}
            }

            if classification.tears_down() {
                teardown(&state);
            }
        });

        HlsListeners {
            manifest_parsed,
            level_loaded,
            error,
        }
    }
}

fn teardown<E: HlsEngine>(state: &Rc<RefCell<HlsState<E>>>) {
    let (engine, listeners) = {
        let mut s = state.borrow_mut();
        if !s.lifecycle.can_transition_to(TechState::Destroyed) {
            return;
        }
        s.lifecycle = TechState::Destroyed;
        s.sink = None;
        (s.engine.take(), s.listeners.take())
    };

    if let Some(engine) = engine {
        if let Some(listeners) = listeners {
            for kind in HlsEventKind::ALL {
                engine.off(kind, listeners.for_kind(kind));
            }
        }
        state.borrow().logger.d("hls engine destroy");
        engine.destroy();
    }
}

impl<F> Tech for HlsTech<F>
where
    F: HlsEngineFactory + 'static,
{
    fn kind(&self) -> TechKind {
        TechKind::Hls
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
            TechState::Initialized => return Err(Error::AlreadyInitialized("hls")),
            TechState::Destroyed => return Err(Error::TechDestroyed("hls")),
            TechState::Uninitialized => {}
        }

        let engine = Rc::new(self.factory.create(HlsConfig {
            enable_worker: false,
            debug: config.debug,
            headers: config.headers.clone(),
        })?);
        let listeners = Self::listeners(&self.state);
        {
            let mut s = self.state.borrow_mut();
            s.logger.set_debug(config.debug);
            s.lifecycle = TechState::Initialized;
            s.engine = Some(engine.clone());
            s.listeners = Some(listeners.clone());
            s.events = Some(events);
            s.on_license_error = on_license_error;
            s.sink = Some(sink.clone());
            s.autoplay = config.autoplay;
        }

        for kind in HlsEventKind::ALL {
            engine.on(kind, listeners.for_kind(kind));
        }

        self.state.borrow().logger.d("initializing");
        engine.load_source(&config.url);
        engine.attach_media(&sink);
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
            .map(|(position, track)| AudioTrack::new(position as i32, position, &track.lang, &track.name))
            .collect()
    }

    fn set_audio_track(&mut self, index: i32) {
        let Some(engine) = self.engine() else {
            return;
        };
        let count = engine.audio_tracks().len();
        if usize::try_from(index).is_ok_and(|position| position < count) {
            engine.set_audio_track(index);
        }
    }

    /// The automatic entry first, then the engine levels
    fn qualities(&self) -> Vec<QualityLevel> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };
        std::iter::once(QualityLevel::auto())
            .chain(engine.levels().into_iter().enumerate().map(|(position, level)| {
                QualityLevel::new(
                    level.level.unwrap_or(position as i32),
                    level.bitrate,
                    level.width,
                    level.height,
                )
            }))
            .collect()
    }

    fn set_quality(&mut self, index: i32) {
        if let Some(engine) = self.engine() {
            engine.set_current_level(index);
        }
    }

    fn current_quality(&self) -> QualityLevel {
        match self.engine() {
            Some(engine) => match_quality(self.qualities(), engine.current_level()),
            None => QualityLevel::fallback(),
        }
    }

    fn destroy(&mut self) {
        teardown(&self.state);
    }
}
