//! Construction and release of the per-play signal graph.
//!
//! ```text
//! body ──┐
//!        ├─> lowpass ─> compressor ─> distortion ─> master volume ─> speakers
//! rumble ┘                ^
//! noise ─> bandpass ──────┘   (only when wetness > 0)
//! ```

use log::{debug, warn};

use crate::engine::{
    AudioEngine, Envelope, FilterKind, FilterOptions, FmSynthOptions, MembraneSynthOptions,
    NodeId, NodeSpec, NoiseColor, NoiseOptions, OscillatorOptions, Waveform,
};
use crate::error::FartResult;
use crate::params::MappedParameters;

const COMPRESSOR_THRESHOLD_DB: f64 = -30.0;
const COMPRESSOR_RATIO: f64 = 3.0;
const LOWPASS_BASE_HZ: f64 = 800.0;
const LOWPASS_ROLLOFF: i32 = -24;
const BANDPASS_Q: f64 = 2.0;
const NOISE_BASE_DB: f64 = -20.0;

/// Cutoff of the main low-pass filter before any sweep.
pub fn lowpass_cutoff(pitch: f64) -> f64 {
    LOWPASS_BASE_HZ + pitch * 2.0
}

fn body_spec(length: f64) -> NodeSpec {
    NodeSpec::MembraneSynth(MembraneSynthOptions {
        pitch_decay: 0.05,
        octaves: 6.0,
        oscillator: OscillatorOptions::new(Waveform::Sine),
        envelope: Envelope::new(0.01, length * 0.3, 0.3, length * 0.3),
    })
}

fn rumble_spec(params: &MappedParameters) -> NodeSpec {
    let length = params.length;
    NodeSpec::FmSynth(FmSynthOptions {
        harmonicity: 2.0,
        modulation_index: params.force.fm_depth / 10.0,
        oscillator: OscillatorOptions::new(Waveform::Sine),
        envelope: Envelope::new(0.02, length * 0.4, 0.2, length * 0.3),
        modulation: OscillatorOptions::new(Waveform::Square),
        modulation_envelope: Envelope::new(0.01, length * 0.2, 0.5, length * 0.2),
    })
}

/// The optional wet branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoiseBranch {
    pub bandpass: NodeId,
    pub source: NodeId,
}

/// Every node of one play, owned until [`SoundGraph::release`] hands them back to the engine.
#[derive(Debug)]
#[must_use = "a sound graph holds engine nodes and must be released"]
pub struct SoundGraph {
    nodes: Vec<NodeId>,
    pub master: NodeId,
    pub distortion: NodeId,
    pub compressor: NodeId,
    pub filter: NodeId,
    /// Fundamental "body" tone.
    pub body: NodeId,
    /// Frequency-modulated rumble layered under the body.
    pub rumble: NodeId,
    pub noise: Option<NoiseBranch>,
    /// Cutoff `filter` was built with.
    pub filter_cutoff: f64,
}

impl SoundGraph {
    /// Builds the graph for `params`.
    ///
    /// If any step fails, the nodes created so far are released before the error is returned.
    pub fn build<E: AudioEngine>(engine: &mut E, params: &MappedParameters) -> FartResult<Self> {
        let mut nodes = Vec::with_capacity(8);
        match Self::wire(engine, params, &mut nodes) {
            Ok(graph) => {
                debug!(
                    "built sound graph with {} nodes (noise: {})",
                    graph.nodes.len(),
                    graph.noise.is_some()
                );
                Ok(graph)
            }
            Err(err) => {
                release_nodes(engine, &nodes);
                Err(err)
            }
        }
    }

    fn wire<E: AudioEngine>(
        engine: &mut E,
        params: &MappedParameters,
        nodes: &mut Vec<NodeId>,
    ) -> FartResult<Self> {
        let mut add = |engine: &mut E, spec: NodeSpec| -> FartResult<NodeId> {
            let node = engine.create(&spec)?;
            nodes.push(node);
            Ok(node)
        };

        let master = add(engine, NodeSpec::Volume { db: params.volume })?;
        engine.to_destination(master)?;

        let distortion = add(
            engine,
            NodeSpec::Distortion {
                amount: params.force.distortion,
            },
        )?;
        engine.connect(distortion, master)?;

        let compressor = add(
            engine,
            NodeSpec::Compressor {
                threshold_db: COMPRESSOR_THRESHOLD_DB,
                ratio: COMPRESSOR_RATIO,
            },
        )?;
        engine.connect(compressor, distortion)?;

        let filter_cutoff = lowpass_cutoff(params.pitch);
        let filter = add(
            engine,
            NodeSpec::Filter(FilterOptions {
                kind: FilterKind::Lowpass,
                frequency: filter_cutoff,
                q: None,
                rolloff: Some(LOWPASS_ROLLOFF),
            }),
        )?;
        engine.connect(filter, compressor)?;

        let body = add(engine, body_spec(params.length))?;
        engine.connect(body, filter)?;

        let rumble = add(engine, rumble_spec(params))?;
        engine.connect(rumble, filter)?;

        let noise = if params.has_noise() {
            let bandpass = add(
                engine,
                NodeSpec::Filter(FilterOptions {
                    kind: FilterKind::Bandpass,
                    frequency: params.wetness.filter_frequency,
                    q: Some(BANDPASS_Q),
                    rolloff: None,
                }),
            )?;
            engine.connect(bandpass, compressor)?;

            let source = add(
                engine,
                NodeSpec::Noise(NoiseOptions {
                    color: NoiseColor::Brown,
                    volume: NOISE_BASE_DB + params.wetness.noise_amplitude * 100.0,
                }),
            )?;
            engine.connect(source, bandpass)?;
            Some(NoiseBranch { bandpass, source })
        } else {
            None
        };

        Ok(Self {
            nodes: std::mem::take(nodes),
            master,
            distortion,
            compressor,
            filter,
            body,
            rumble,
            noise,
            filter_cutoff,
        })
    }

    /// Nodes in creation order.
    pub fn nodes(&self) -> &[NodeId] {
        &self.nodes
    }

    /// Disposes every node, in creation order. Returns how many disposals failed.
    pub fn release<E: AudioEngine>(self, engine: &mut E) -> usize {
        release_nodes(engine, &self.nodes)
    }
}

fn release_nodes<E: AudioEngine>(engine: &mut E, nodes: &[NodeId]) -> usize {
    let mut failures = 0;
    for node in nodes {
        if let Err(err) = engine.dispose(*node) {
            warn!("error disposing {node}: {err}");
            failures += 1;
        }
    }
    failures
}
