//! Procedural fart sound generator.
//!
//! Five sliders (length, force, wetness, loudness, pitch) are mapped to the
//! coefficients of a small synthesis graph, which is built fresh for every play,
//! scheduled on the audio engine's timeline and released once the sound is over.
//!
//! - [`params`] - slider values to synthesis coefficients
//! - [`sampler`] - weighted random draws for the surprise action
//! - [`graph`] - per-play signal graph construction and release
//! - [`playback`] - envelope triggers, noise bursts, filter sweep
//! - [`controller`] - the Idle/Playing lifecycle
//! - `web` - wasm-bindgen bindings to Tone.js and the page (feature `web`)

pub mod config;
pub mod controller;
pub mod engine;
pub mod error;
pub mod graph;
pub mod params;
pub mod playback;
pub mod sampler;
pub mod sliders;
pub mod surface;
pub mod timer;

#[cfg(feature = "web")]
pub mod web;

pub use config::GeneratorConfig;
pub use controller::{Begin, LifecycleController, Phase};
pub use engine::{AudioEngine, NodeId, NodeSpec};
pub use error::{FartError, FartResult};
pub use graph::SoundGraph;
pub use params::MappedParameters;
pub use sliders::{SliderKind, SliderState};
pub use timer::{Task, Timer};
