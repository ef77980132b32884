//! Boundary to the audio engine that does the actual signal processing.
//!
//! The generator never touches samples. It describes nodes, wires them,
//! triggers envelopes and automates parameters at absolute engine timestamps;
//! the engine (Tone.js in the browser, [`recorder::RecordingEngine`] in tests)
//! owns the DSP.

use std::fmt;
use std::future::Future;

use crate::error::FartResult;

mod nodes;
pub mod recorder;

pub use nodes::{
    ConstructorArgs, Envelope, FilterKind, FilterOptions, FmSynthOptions, MembraneSynthOptions,
    NodeSpec, NoiseColor, NoiseOptions, OscillatorOptions, Waveform,
};

/// Engine-assigned handle to a live node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "node #{}", self.0)
    }
}

/// Node parameters the playback schedule automates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutomatedParam {
    /// Filter cutoff / center frequency in Hz.
    Frequency,
    /// Source output level in dB.
    Volume,
}

/// Everything the generator needs from an audio engine.
///
/// All times are absolute engine timestamps in seconds (see [`AudioEngine::now`]).
pub trait AudioEngine {
    /// Future resolving once the audio context may produce sound.
    type Unlock: Future<Output = FartResult<()>> + 'static;

    /// Starts (unlocks) the audio context. Must be driven from a user gesture in browsers.
    fn unlock(&mut self) -> Self::Unlock;

    /// Current engine time in seconds.
    fn now(&self) -> f64;

    fn create(&mut self, spec: &NodeSpec) -> FartResult<NodeId>;

    /// Routes the output of `source` into `destination`.
    fn connect(&mut self, source: NodeId, destination: NodeId) -> FartResult<()>;

    /// Routes `node` into the speakers.
    fn to_destination(&mut self, node: NodeId) -> FartResult<()>;

    /// Plays `frequency` on a synth node for `duration` seconds starting at `time`.
    fn trigger_attack_release(
        &mut self,
        node: NodeId,
        frequency: f64,
        duration: f64,
        time: f64,
    ) -> FartResult<()>;

    /// Starts a source node at `time`.
    fn start(&mut self, node: NodeId, time: f64) -> FartResult<()>;

    /// Stops a source node at `time`.
    fn stop(&mut self, node: NodeId, time: f64) -> FartResult<()>;

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()>;

    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()>;

    /// Releases the node. Fails if the node is unknown or already released.
    fn dispose(&mut self, node: NodeId) -> FartResult<()>;
}
