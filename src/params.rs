//! Slider values to synthesis coefficients.
//!
//! Every mapper is a pure function of one slider. Inputs come from range
//! controls that already clamp them, so nothing here validates.

use crate::sliders::SliderState;

/// Volume used for a loudness of zero.
pub const SILENCE_DB: f64 = f64::NEG_INFINITY;

/// Coefficients derived from the force slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForceParams {
    /// FM modulation depth in Hz (50-350).
    pub fm_depth: f64,
    /// FM modulation rate in Hz (3-23).
    pub fm_frequency: f64,
    /// Distortion amount (0.1-1.0).
    pub distortion: f64,
    pub envelope_multiplier: f64,
}

/// Coefficients derived from the wetness slider.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WetnessParams {
    /// Noise level (0-0.15). Zero removes the noise branch entirely.
    pub noise_amplitude: f64,
    /// Bursts per second (0-20).
    pub burst_frequency: f64,
    /// Total bursts over the sound (0-15).
    pub burst_count: u32,
    /// Bandpass center for the noise branch in Hz (800-2800).
    pub filter_frequency: f64,
}

#[inline]
pub fn length_to_seconds(length: f64) -> f64 {
    length
}

pub fn force_to_modulation(force: u8) -> ForceParams {
    let force = force as f64;
    ForceParams {
        fm_depth: 50.0 + force * 30.0,
        fm_frequency: 3.0 + force * 2.0,
        distortion: force * 0.1,
        envelope_multiplier: 0.5 + force * 0.05,
    }
}

pub fn wetness_to_noise(wetness: u8) -> WetnessParams {
    let wetness = wetness as f64;
    WetnessParams {
        noise_amplitude: wetness * 0.015,
        burst_frequency: wetness * 2.0,
        burst_count: (wetness * 1.5).floor() as u32,
        filter_frequency: 800.0 + wetness * 200.0,
    }
}

/// Loudness percentage to decibels: 0 is silence, 1..=100 maps linearly onto -40..=0 dB.
pub fn loudness_to_volume(loudness: u8) -> f64 {
    if loudness == 0 {
        return SILENCE_DB;
    }
    -40.0 + loudness as f64 * 0.4
}

#[inline]
pub fn pitch_to_frequency(pitch: u16) -> f64 {
    pitch as f64
}

/// Everything one play needs, computed from the sliders at the moment of the request.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MappedParameters {
    /// Seconds.
    pub length: f64,
    pub force: ForceParams,
    pub wetness: WetnessParams,
    /// Master volume in dB.
    pub volume: f64,
    /// Base frequency in Hz.
    pub pitch: f64,
}

impl MappedParameters {
    pub fn from_sliders(sliders: &SliderState) -> Self {
        Self {
            length: length_to_seconds(sliders.length),
            force: force_to_modulation(sliders.force),
            wetness: wetness_to_noise(sliders.wetness),
            volume: loudness_to_volume(sliders.loudness),
            pitch: pitch_to_frequency(sliders.pitch),
        }
    }

    pub fn has_noise(&self) -> bool {
        self.wetness.noise_amplitude > 0.0
    }
}
