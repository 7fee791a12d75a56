//! Smooth Streaming adapter tests

mod common;

use common::{MockSmoothEngine, MockSmoothFactory, MockSink, Recorder};
use unistream_core::engine::SMOOTH_EVENTS;
use unistream_core::{QualityLevel, SessionConfig, SmoothTech, Tech, TechKind, TechState};

const ISM: &str = "https://cdn.example.com/ss/stream.ism/Manifest";

fn started(engine: &MockSmoothEngine) -> (SmoothTech<MockSmoothFactory>, Recorder) {
    let mut tech = SmoothTech::new(MockSmoothFactory::new(engine));
    let recorder = Recorder::default();
    tech.init(
        MockSink::new().as_sink(),
        &SessionConfig::new(ISM),
        recorder.callback(),
        None,
    )
    .unwrap();
    (tech, recorder)
}

#[test]
fn test_init_loads_stream_and_subscribes() {
    let engine = MockSmoothEngine::default();
    let (tech, _) = started(&engine);
    let load = format!("load:{}", ISM);

    assert_eq!(tech.kind(), TechKind::Smooth);
    assert_eq!(engine.calls(), vec!["init", load.as_str()]);
    assert_eq!(engine.listener_count(), SMOOTH_EVENTS.len());
}

#[test]
fn test_engine_events_forwarded_verbatim() {
    let engine = MockSmoothEngine::default();
    let (_tech, recorder) = started(&engine);

    engine.emit("play_bitrate");
    engine.emit("bufferLevel_updated");
    engine.emit("state_changed");
    engine.emit("notSubscribed");

    assert_eq!(
        recorder.types(),
        vec!["play_bitrate", "bufferLevel_updated", "state_changed"]
    );
}

#[test]
fn test_errors_do_not_tear_down() {
    let engine = MockSmoothEngine::default();
    let (tech, recorder) = started(&engine);

    engine.emit("error");

    assert_eq!(recorder.types(), vec!["error"]);
    assert_eq!(engine.count("reset"), 0);
    assert_eq!(tech.state(), TechState::Initialized);
}

#[test]
fn test_live_flag_comes_from_engine() {
    let engine = MockSmoothEngine::default();
    let (tech, _) = started(&engine);

    assert!(!tech.is_live());
    engine.set_live(true);
    assert!(tech.is_live());
}

#[test]
fn test_qualities_are_bare_levels() {
    let engine = MockSmoothEngine::default().with_bitrates(vec![300_000, 900_000, 2_100_000]);
    let (tech, _) = started(&engine);

    let qualities = tech.qualities();
    assert_eq!(qualities.len(), 3);
    assert_eq!(qualities[2], QualityLevel::bare(2, 2_100_000));
    assert!(qualities[2].bitrate_str.is_empty());
    assert_eq!(qualities[2].width, 0);
}

#[test]
fn test_set_quality_toggles_auto_switch() {
    let engine = MockSmoothEngine::default().with_bitrates(vec![300_000, 900_000]);
    let (mut tech, _) = started(&engine);

    tech.set_quality(1);
    assert_eq!(engine.count("autoSwitch:false"), 1);
    assert_eq!(engine.count("setQuality:1"), 1);
    assert_eq!(tech.current_quality().bitrate, 900_000);

    tech.set_quality(-1);
    assert_eq!(engine.count("autoSwitch:true"), 1);
    assert_eq!(engine.count("setQuality:-1"), 0);
}

#[test]
fn test_unsupported_controls_are_noops() {
    let engine = MockSmoothEngine::default().with_bitrates(vec![300_000, 900_000]);
    let (mut tech, _) = started(&engine);
    let before = engine.calls().len();

    tech.set_max_quality();
    tech.set_audio_track(0);

    assert!(tech.audio_tracks().is_empty());
    assert_eq!(engine.calls().len(), before);
}

#[test]
fn test_destroy_removes_listeners_and_resets() {
    let engine = MockSmoothEngine::default();
    let (mut tech, recorder) = started(&engine);

    tech.destroy();
    tech.destroy();
    engine.emit("timeupdate");

    assert_eq!(engine.count("reset"), 1);
    assert_eq!(engine.listener_count(), 0);
    assert_eq!(recorder.len(), 0);
    assert_eq!(tech.state(), TechState::Destroyed);
}
