use serde::Serialize;

use crate::error::FartResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Waveform {
    Sine,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    Lowpass,
    Bandpass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoiseColor {
    White,
    Pink,
    Brown,
}

/// ADSR envelope; attack/decay/release in seconds, sustain as a level in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Envelope {
    pub attack: f64,
    pub decay: f64,
    pub sustain: f64,
    pub release: f64,
}

impl Envelope {
    pub const fn new(attack: f64, decay: f64, sustain: f64, release: f64) -> Self {
        Self {
            attack,
            decay,
            sustain,
            release,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OscillatorOptions {
    #[serde(rename = "type")]
    pub waveform: Waveform,
}

impl OscillatorOptions {
    pub const fn new(waveform: Waveform) -> Self {
        Self { waveform }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterOptions {
    #[serde(rename = "type")]
    pub kind: FilterKind,
    pub frequency: f64,
    #[serde(rename = "Q", skip_serializing_if = "Option::is_none")]
    pub q: Option<f64>,
    /// dB per octave; one of -12, -24, -48, -96.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rolloff: Option<i32>,
}

/// Percussive pitched generator: a sine that falls `octaves` over `pitch_decay` seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembraneSynthOptions {
    pub pitch_decay: f64,
    pub octaves: f64,
    pub oscillator: OscillatorOptions,
    pub envelope: Envelope,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FmSynthOptions {
    pub harmonicity: f64,
    pub modulation_index: f64,
    pub oscillator: OscillatorOptions,
    pub envelope: Envelope,
    pub modulation: OscillatorOptions,
    pub modulation_envelope: Envelope,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NoiseOptions {
    #[serde(rename = "type")]
    pub color: NoiseColor,
    /// dB.
    pub volume: f64,
}

/// Description of one node to construct.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeSpec {
    Volume { db: f64 },
    Distortion { amount: f64 },
    Compressor { threshold_db: f64, ratio: f64 },
    Filter(FilterOptions),
    MembraneSynth(MembraneSynthOptions),
    FmSynth(FmSynthOptions),
    Noise(NoiseOptions),
}

/// How a node's constructor is called.
#[derive(Debug, Clone, PartialEq)]
pub enum ConstructorArgs {
    Positional(Vec<f64>),
    /// A single options object, as JSON.
    Options(String),
}

impl NodeSpec {
    /// Engine class name (the Tone.js constructor).
    pub fn class_name(&self) -> &'static str {
        match self {
            NodeSpec::Volume { .. } => "Volume",
            NodeSpec::Distortion { .. } => "Distortion",
            NodeSpec::Compressor { .. } => "Compressor",
            NodeSpec::Filter(_) => "Filter",
            NodeSpec::MembraneSynth(_) => "MembraneSynth",
            NodeSpec::FmSynth(_) => "FMSynth",
            NodeSpec::Noise(_) => "Noise",
        }
    }

    // Volume stays positional: JSON has no representation for -Infinity.
    pub fn constructor_args(&self) -> FartResult<ConstructorArgs> {
        let json = match self {
            NodeSpec::Volume { db } => return Ok(ConstructorArgs::Positional(vec![*db])),
            NodeSpec::Distortion { amount } => {
                return Ok(ConstructorArgs::Positional(vec![*amount]))
            }
            NodeSpec::Compressor {
                threshold_db,
                ratio,
            } => return Ok(ConstructorArgs::Positional(vec![*threshold_db, *ratio])),
            NodeSpec::Filter(options) => serde_json::to_string(options)?,
            NodeSpec::MembraneSynth(options) => serde_json::to_string(options)?,
            NodeSpec::FmSynth(options) => serde_json::to_string(options)?,
            NodeSpec::Noise(options) => serde_json::to_string(options)?,
        };
        Ok(ConstructorArgs::Options(json))
    }
}
