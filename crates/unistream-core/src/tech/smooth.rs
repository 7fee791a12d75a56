//! Smooth Streaming adapter over a hasplayer.js-style engine

use super::{match_quality, Tech};
use crate::config::SessionConfig;
use crate::engine::{SmoothEngine, SmoothEngineFactory, SmoothListener, SmoothStream, SMOOTH_EVENTS};
use crate::error::{Error, Result};
use crate::events::{EventCallback, EventEnvelope, LicenseErrorCallback};
use crate::logger::Logger;
use crate::sink::MediaSink;
use crate::types::{AudioTrack, QualityLevel, TechKind, TechState, AUTO_QUALITY_INDEX};
use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

struct SmoothState<E> {
    lifecycle: TechState,
    engine: Option<Rc<E>>,
    listener: Option<SmoothListener>,
    events: Option<EventCallback>,
    logger: Logger,
}

/// `Tech` backed by a Smooth Streaming engine.
///
/// No audio track support and no max-quality selection; engine events are
/// forwarded as they come.
pub struct SmoothTech<F: SmoothEngineFactory> {
    factory: F,
    state: Rc<RefCell<SmoothState<F::Engine>>>,
}

impl<F: SmoothEngineFactory> SmoothTech<F> {
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            state: Rc::new(RefCell::new(SmoothState {
                lifecycle: TechState::Uninitialized,
                engine: None,
                listener: None,
                events: None,
                logger: Logger::new("SmoothTech"),
            })),
        }
    }

    pub fn engine(&self) -> Option<Rc<F::Engine>> {
        self.state.borrow().engine.clone()
    }
}

impl<F> Tech for SmoothTech<F>
where
    F: SmoothEngineFactory + 'static,
{
    fn kind(&self) -> TechKind {
        TechKind::Smooth
    }

    fn state(&self) -> TechState {
        self.state.borrow().lifecycle
    }

    fn init(
        &mut self,
        sink: Rc<dyn MediaSink>,
        config: &SessionConfig,
        events: EventCallback,
        _on_license_error: Option<LicenseErrorCallback>,
    ) -> Result<()> {
        match self.state() {
            TechState::Initialized => return Err(Error::AlreadyInitialized("smooth")),
            TechState::Destroyed => return Err(Error::TechDestroyed("smooth")),
            TechState::Uninitialized => {}
        }

        let engine = Rc::new(self.factory.create()?);

        let weak = Rc::downgrade(&self.state);
        let listener: SmoothListener = Rc::new(move |envelope: &EventEnvelope| {
            let Some(state) = weak.upgrade() else {
                return;
            };
            let events = {
                let s = state.borrow();
                if s.engine.is_none() {
                    return;
                }
                s.events.clone()
            };
            if let Some(events) = events {
                events(envelope);
            }
        });

        {
            let mut s = self.state.borrow_mut();
            s.logger.set_debug(config.debug);
            s.lifecycle = TechState::Initialized;
            s.engine = Some(engine.clone());
            s.listener = Some(listener.clone());
            s.events = Some(events);
        }

        self.state.borrow().logger.d("initializing");
        engine.init(&sink);
        engine.load(&SmoothStream {
            url: config.url.clone(),
        });
        for event_type in SMOOTH_EVENTS {
            engine.add_event_listener(event_type, &listener);
        }
        Ok(())
    }

    fn player(&self) -> Option<Rc<dyn Any>> {
        self.engine().map(|engine| engine as Rc<dyn Any>)
    }

    fn is_live(&self) -> bool {
        self.engine().is_some_and(|engine| engine.is_live())
    }

    fn audio_tracks(&self) -> Vec<AudioTrack> {
        Vec::new()
    }

    fn set_audio_track(&mut self, _index: i32) {}

    fn qualities(&self) -> Vec<QualityLevel> {
        let Some(engine) = self.engine() else {
            return Vec::new();
        };
        engine
            .video_bitrates()
            .into_iter()
            .enumerate()
            .map(|(position, bitrate)| QualityLevel::bare(position as i32, bitrate))
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

    fn set_max_quality(&mut self) {}

    fn destroy(&mut self) {
        let (engine, listener) = {
            let mut s = self.state.borrow_mut();
            if !s.lifecycle.can_transition_to(TechState::Destroyed) {
                return;
            }
            s.lifecycle = TechState::Destroyed;
            (s.engine.take(), s.listener.take())
        };

        if let Some(engine) = engine {
            if let Some(listener) = listener {
                for event_type in SMOOTH_EVENTS {
                    engine.remove_event_listener(event_type, &listener);
                }
            }
            self.state.borrow().logger.d("smooth engine destroy");
            engine.reset();
        }
    }
}
