//! Everything that happens after the graph exists: envelope triggers, wet
//! noise bursts and the filter sweep, all placed on the engine's timeline
//! relative to one start timestamp.

use rand::Rng;

use crate::engine::{AudioEngine, AutomatedParam};
use crate::error::FartResult;
use crate::graph::SoundGraph;
use crate::params::MappedParameters;

/// Rumble plays this far below the body pitch.
pub const RUMBLE_PITCH_RATIO: f64 = 0.75;

const BURST_SECONDS: f64 = 0.05;
const BURST_JITTER_SECONDS: f64 = 0.05;
const BURST_ATTACK_SECONDS: f64 = 0.01;
const BURST_FLOOR_DB: f64 = -20.0;
const BURST_TAIL_DB: f64 = -40.0;

/// Share of the sound spent sweeping the cutoff up.
const SWEEP_RISE: f64 = 0.3;

/// One wet noise burst.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Burst {
    /// Absolute engine time.
    pub time: f64,
    /// Seconds.
    pub length: f64,
}

/// Spreads `burst_count` bursts evenly over the sound, each jittered by up to
/// 50 ms and shortened by up to half.
pub fn plan_bursts<R: Rng + ?Sized>(
    params: &MappedParameters,
    start: f64,
    rng: &mut R,
) -> Vec<Burst> {
    let count = params.wetness.burst_count;
    let step = params.length / (count as f64 + 1.0);
    (0..count)
        .map(|i| {
            let jitter = rng.gen::<f64>() * 2.0 * BURST_JITTER_SECONDS - BURST_JITTER_SECONDS;
            // Jitter never moves a burst before the sound starts.
            let time = (start + step * (i as f64 + 1.0) + jitter).max(start);
            let length = BURST_SECONDS * (0.5 + rng.gen::<f64>() * 0.5);
            Burst { time, length }
        })
        .collect()
}

/// Peak level of a burst, in dB.
pub fn burst_peak_db(noise_amplitude: f64) -> f64 {
    -10.0 + noise_amplitude * 50.0
}

/// Schedules the whole sound on `graph`, starting at `start`.
pub fn schedule_playback<E, R>(
    engine: &mut E,
    graph: &SoundGraph,
    params: &MappedParameters,
    start: f64,
    rng: &mut R,
) -> FartResult<()>
where
    E: AudioEngine,
    R: Rng + ?Sized,
{
    engine.trigger_attack_release(graph.body, params.pitch, params.length, start)?;
    engine.trigger_attack_release(
        graph.rumble,
        params.pitch * RUMBLE_PITCH_RATIO,
        params.length,
        start,
    )?;

    if let Some(noise) = graph.noise {
        if params.wetness.burst_count > 0 {
            engine.start(noise.source, start)?;
            let peak = burst_peak_db(params.wetness.noise_amplitude);
            for burst in plan_bursts(params, start, rng) {
                engine.set_value_at_time(
                    noise.source,
                    AutomatedParam::Volume,
                    BURST_FLOOR_DB,
                    burst.time,
                )?;
                engine.linear_ramp_to_value_at_time(
                    noise.source,
                    AutomatedParam::Volume,
                    peak,
                    burst.time + BURST_ATTACK_SECONDS,
                )?;
                engine.linear_ramp_to_value_at_time(
                    noise.source,
                    AutomatedParam::Volume,
                    BURST_TAIL_DB,
                    burst.time + burst.length,
                )?;
            }
            engine.stop(noise.source, start + params.length)?;
        }
    }

    schedule_sweep(engine, graph, params, start)
}

fn schedule_sweep<E: AudioEngine>(
    engine: &mut E,
    graph: &SoundGraph,
    params: &MappedParameters,
    start: f64,
) -> FartResult<()> {
    let base = graph.filter_cutoff;
    let peak = base + params.force.fm_depth * 2.0;
    engine.set_value_at_time(graph.filter, AutomatedParam::Frequency, base, start)?;
    engine.linear_ramp_to_value_at_time(
        graph.filter,
        AutomatedParam::Frequency,
        peak,
        start + params.length * SWEEP_RISE,
    )?;
    engine.linear_ramp_to_value_at_time(
        graph.filter,
        AutomatedParam::Frequency,
        base,
        start + params.length,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::recorder::{EngineCall, RecordingEngine};
    use crate::engine::NodeId;
    use crate::sliders::SliderState;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn params(length: f64, wetness: u8) -> MappedParameters {
        MappedParameters::from_sliders(&SliderState {
            length,
            force: 5,
            wetness,
            loudness: 80,
            pitch: 150,
        })
    }

    fn automation(engine: &RecordingEngine, target: NodeId) -> Vec<(bool, f64, f64)> {
        engine
            .calls()
            .iter()
            .filter_map(|call| match call {
                EngineCall::SetValueAtTime {
                    node, value, time, ..
                } if *node == target => Some((false, *value, *time)),
                EngineCall::LinearRampToValueAtTime {
                    node, value, time, ..
                } if *node == target => Some((true, *value, *time)),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_bursts_are_spread_and_bounded() {
        let p = params(2.0, 5);
        let mut rng = Pcg32::seed_from_u64(11);
        let bursts = plan_bursts(&p, 10.0, &mut rng);

        assert_eq!(bursts.len(), 7);
        let step = 2.0 / 8.0;
        for (i, burst) in bursts.iter().enumerate() {
            let nominal = 10.0 + step * (i as f64 + 1.0);
            assert!((burst.time - nominal).abs() <= 0.05 + 1e-9);
            assert!(burst.length >= 0.025 && burst.length <= 0.05);
        }
    }

    #[test]
    fn test_bursts_never_start_early() {
        let p = params(0.1, 10);
        for seed in 0..50 {
            let bursts = plan_bursts(&p, 3.0, &mut Pcg32::seed_from_u64(seed));
            assert_eq!(bursts.len(), 15);
            assert!(bursts.iter().all(|b| b.time >= 3.0));
        }
    }

    #[test]
    fn test_triggers_body_and_rumble() {
        let p = params(2.0, 0);
        let mut engine = RecordingEngine::new();
        let graph = SoundGraph::build(&mut engine, &p).unwrap();
        schedule_playback(&mut engine, &graph, &p, 4.0, &mut Pcg32::seed_from_u64(1)).unwrap();

        assert!(engine.calls().contains(&EngineCall::TriggerAttackRelease {
            node: graph.body,
            frequency: 150.0,
            duration: 2.0,
            time: 4.0,
        }));
        assert!(engine.calls().contains(&EngineCall::TriggerAttackRelease {
            node: graph.rumble,
            frequency: 112.5,
            duration: 2.0,
            time: 4.0,
        }));
        assert!(!engine
            .calls()
            .iter()
            .any(|call| matches!(call, EngineCall::Start { .. })));
        graph.release(&mut engine);
    }

    #[test]
    fn test_filter_sweep() {
        let p = params(2.0, 0);
        let mut engine = RecordingEngine::new();
        let graph = SoundGraph::build(&mut engine, &p).unwrap();
        schedule_playback(&mut engine, &graph, &p, 1.0, &mut Pcg32::seed_from_u64(1)).unwrap();

        let sweep = automation(&engine, graph.filter);
        assert_eq!(sweep.len(), 3);
        assert_eq!(sweep[0], (false, 1100.0, 1.0));
        assert_eq!(sweep[1].1, 1500.0);
        assert!((sweep[1].2 - 1.6).abs() < 1e-9);
        assert_eq!(sweep[2], (true, 1100.0, 3.0));
        graph.release(&mut engine);
    }

    #[test]
    fn test_noise_bursts_scheduled_between_start_and_stop() {
        let p = params(2.0, 5);
        let mut engine = RecordingEngine::new();
        let graph = SoundGraph::build(&mut engine, &p).unwrap();
        let source = graph.noise.unwrap().source;
        schedule_playback(&mut engine, &graph, &p, 0.5, &mut Pcg32::seed_from_u64(8)).unwrap();

        assert!(engine
            .calls()
            .contains(&EngineCall::Start { node: source, time: 0.5 }));
        assert!(engine
            .calls()
            .contains(&EngineCall::Stop { node: source, time: 2.5 }));

        let volume = automation(&engine, source);
        assert_eq!(volume.len(), 7 * 3);
        for burst in volume.chunks(3) {
            assert_eq!(burst[0].1, -20.0);
            assert!((burst[1].1 - burst_peak_db(p.wetness.noise_amplitude)).abs() < 1e-9);
            assert!((burst[1].2 - burst[0].2 - 0.01).abs() < 1e-9);
            assert_eq!(burst[2].1, -40.0);
            assert!(burst[2].2 > burst[0].2);
        }
        graph.release(&mut engine);
    }
}
