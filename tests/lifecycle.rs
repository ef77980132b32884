//! End-to-end lifecycle tests against the recording engine.

use fart_core::controller::{LifecycleController, Phase};
use fart_core::engine::recorder::{EngineCall, RecordingEngine};
use fart_core::params::MappedParameters;
use fart_core::sliders::{SliderKind, SliderState};
use fart_core::surface::{RecordingSurface, PLAY_FAILED_MESSAGE};
use fart_core::timer::{ManualTimer, Task};
use fart_core::GeneratorConfig;
use pretty_assertions::assert_eq;
use rand::SeedableRng;
use rand_pcg::Pcg32;

type Controller = LifecycleController<RecordingEngine, ManualTimer, RecordingSurface, Pcg32>;

fn controller_with(config: GeneratorConfig) -> Controller {
    LifecycleController::new(
        RecordingEngine::new(),
        ManualTimer::new(),
        RecordingSurface::new(),
        Pcg32::seed_from_u64(2024),
        config,
    )
}

fn controller() -> Controller {
    controller_with(GeneratorConfig::default())
}

fn set_all(c: &mut Controller, sliders: SliderState) {
    for kind in SliderKind::ALL {
        c.set_slider(kind, sliders.get(kind));
    }
}

/// Advances the timer and runs whatever came due.
fn advance(c: &mut Controller, ms: u64) {
    let due = c.timer_mut().advance(ms);
    for task in due {
        pollster::block_on(c.run_task(task));
    }
}

const REFERENCE: SliderState = SliderState {
    length: 2.0,
    force: 5,
    wetness: 5,
    loudness: 80,
    pitch: 150,
};

#[test]
fn test_reference_sound_plays_and_releases() {
    let mut c = controller();
    set_all(&mut c, REFERENCE);

    let params = MappedParameters::from_sliders(c.sliders());
    assert!((params.force.distortion - 0.5).abs() < 1e-9);
    assert_eq!(params.force.fm_depth, 200.0);
    assert!((params.wetness.noise_amplitude - 0.075).abs() < 1e-9);
    assert_eq!(params.wetness.burst_count, 7);
    assert!((params.volume - -8.0).abs() < 1e-9);
    assert_eq!(params.pitch, 150.0);

    assert_eq!(c.phase(), Phase::Idle);
    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.phase(), Phase::Playing { play: 1 });
    assert!(c.surface().busy);
    assert_eq!(c.engine().created("Noise"), 1);
    assert_eq!(c.engine().live_count(), 8);
    assert_eq!(
        c.timer_mut().pending(),
        vec![(2100, Task::Release { play: 1 })]
    );

    advance(&mut c, 2099);
    assert!(c.is_playing());

    advance(&mut c, 1);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(!c.surface().busy);
    assert!(!c.has_graph());
    assert_eq!(c.engine().live_count(), 0);
}

#[test]
fn test_second_generate_while_playing_is_a_noop() {
    let mut c = controller();
    assert!(pollster::block_on(c.generate()));
    assert!(!pollster::block_on(c.generate()));
    assert!(!pollster::block_on(c.generate()));

    assert_eq!(c.engine().created("Volume"), 1);
    assert_eq!(c.timer_mut().pending().len(), 1);
    assert_eq!(c.surface().busy_changes, vec![true]);
}

#[test]
fn test_dry_sound_builds_no_noise_branch() {
    let mut c = controller();
    set_all(
        &mut c,
        SliderState {
            wetness: 0,
            ..REFERENCE
        },
    );
    assert!(pollster::block_on(c.generate()));

    assert_eq!(c.engine().created("Noise"), 0);
    assert_eq!(c.engine().created("Filter"), 1);
    assert!(!c
        .engine()
        .calls()
        .iter()
        .any(|call| matches!(call, EngineCall::Start { .. } | EngineCall::Stop { .. })));
}

#[test]
fn test_silent_loudness_builds_negative_infinity_master() {
    let mut c = controller();
    c.set_slider(SliderKind::Loudness, 0.0);
    assert!(pollster::block_on(c.generate()));

    let master = c
        .engine()
        .calls()
        .iter()
        .find_map(|call| match call {
            EngineCall::Create {
                spec: fart_core::NodeSpec::Volume { db },
                ..
            } => Some(*db),
            _ => None,
        })
        .unwrap();
    assert_eq!(master, f64::NEG_INFINITY);
}

#[test]
fn test_audio_context_unlocks_once() {
    let mut c = controller();
    for _ in 0..3 {
        assert!(pollster::block_on(c.generate()));
        advance(&mut c, 5_000);
    }
    let unlocks = c
        .engine()
        .calls()
        .iter()
        .filter(|call| matches!(call, EngineCall::Unlock))
        .count();
    assert_eq!(unlocks, 1);
    assert_eq!(c.engine().created("Volume"), 3);
}

#[test]
fn test_unlock_failure_notifies_and_resets() {
    let mut c = controller();
    c.engine_mut().fail_unlock("NotAllowedError");

    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.surface().errors, vec![PLAY_FAILED_MESSAGE.to_string()]);
    assert_eq!(c.surface().busy_changes, vec![true, false]);
    assert!(c.timer_mut().pending().is_empty());
    assert_eq!(c.engine().created("Volume"), 0);
}

#[test]
fn test_build_failure_releases_partial_graph() {
    let mut c = controller();
    c.engine_mut().fail_create("Noise");

    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.phase(), Phase::Idle);
    assert_eq!(c.surface().errors.len(), 1);
    assert_eq!(c.engine().live_count(), 0);
    assert!(!c.surface().busy);
}

#[test]
fn test_dispose_failure_is_swallowed() {
    let mut c = controller();
    c.engine_mut().fail_dispose("Distortion");

    assert!(pollster::block_on(c.generate()));
    advance(&mut c, 5_000);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(c.surface().errors.is_empty());
    assert_eq!(c.engine().live_count(), 0);

    // The next play is unaffected.
    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.phase(), Phase::Playing { play: 2 });
}

#[test]
fn test_only_one_graph_alive_across_plays() {
    let mut c = controller();
    set_all(&mut c, REFERENCE);
    for play in 1..=4 {
        assert!(pollster::block_on(c.generate()));
        assert_eq!(c.phase(), Phase::Playing { play });
        assert_eq!(c.engine().live_count(), 8);
        advance(&mut c, 2_100);
        assert_eq!(c.engine().live_count(), 0);
    }
}

#[test]
fn test_surprise_fills_sliders_and_autoplays() {
    let mut c = controller();
    assert!(c.surprise());

    assert!(c.sliders().in_range());
    let shown: Vec<SliderKind> = c.surface().readouts.iter().map(|r| r.kind).collect();
    assert_eq!(shown, SliderKind::ALL.to_vec());
    assert!(!c.is_playing());

    advance(&mut c, 299);
    assert!(!c.is_playing());
    advance(&mut c, 1);
    assert!(c.is_playing());
    assert_eq!(c.engine().created("Volume"), 1);

    let expected = c.sliders().length;
    match c.timer_mut().pending().as_slice() {
        [(due, Task::Release { play: 1 })] => {
            assert_eq!(*due, 300 + (expected * 1000.0).round() as u64 + 100);
        }
        other => panic!("unexpected pending tasks {other:?}"),
    }
}

#[test]
fn test_surprise_ignored_while_playing() {
    let mut c = controller();
    assert!(pollster::block_on(c.generate()));
    let before = *c.sliders();
    assert!(!c.surprise());
    assert_eq!(*c.sliders(), before);
}

#[test]
fn test_teardown_releases_live_graph() {
    let mut c = controller();
    set_all(&mut c, REFERENCE);
    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.engine().live_count(), 8);

    c.teardown();
    assert_eq!(c.engine().live_count(), 0);
    assert_eq!(c.phase(), Phase::Idle);

    // The release armed for the torn-down play no longer applies.
    advance(&mut c, 5_000);
    assert_eq!(c.phase(), Phase::Idle);
}

#[test]
fn test_configured_defaults_and_margin() {
    let config = GeneratorConfig::from_json(
        r#"{"release_margin_ms": 250,
            "defaults": {"length": 0.5, "force": 2, "wetness": 1, "loudness": 40, "pitch": 60}}"#,
    )
    .unwrap();
    let mut c = controller_with(config);
    assert_eq!(c.sliders().pitch, 60);

    assert!(pollster::block_on(c.generate()));
    assert_eq!(
        c.timer_mut().pending(),
        vec![(750, Task::Release { play: 1 })]
    );
    assert_eq!(c.engine().created("Noise"), 1);
}

#[test]
fn test_schedule_failure_releases_built_graph() {
    let mut c = controller();
    set_all(&mut c, REFERENCE);
    c.engine_mut().fail_trigger("FMSynth");

    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.engine().created("Volume"), 1);
    assert_eq!(c.phase(), Phase::Idle);
    assert!(!c.has_graph());
    assert_eq!(c.engine().live_count(), 0);
    assert_eq!(c.surface().errors, vec![PLAY_FAILED_MESSAGE.to_string()]);
    assert_eq!(c.surface().busy_changes, vec![true, false]);
    assert!(c.timer_mut().pending().is_empty());

    c.engine_mut().clear_failures();
    assert!(pollster::block_on(c.generate()));
    assert_eq!(c.phase(), Phase::Playing { play: 1 });
    assert_eq!(c.engine().live_count(), 8);
    assert_eq!(
        c.timer_mut().pending(),
        vec![(2100, Task::Release { play: 1 })]
    );
}

#[test]
fn test_off_step_default_is_snapped() {
    let config = GeneratorConfig::from_json(
        r#"{"defaults": {"length": 0.57, "force": 2, "wetness": 1, "loudness": 40, "pitch": 60}}"#,
    )
    .unwrap();
    let mut c = controller_with(config);
    assert_eq!(c.sliders().length, 0.6);

    assert!(pollster::block_on(c.generate()));
    assert_eq!(
        c.timer_mut().pending(),
        vec![(700, Task::Release { play: 1 })]
    );
}
