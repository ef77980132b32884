//! Generator configuration.
//!
//! Every field has a default, so an empty JSON object (or no config at all)
//! gives the stock generator.

use serde::{Deserialize, Serialize};

use crate::error::{FartError, FartResult};
use crate::sampler::SurpriseZones;
use crate::sliders::{SliderKind, SliderState};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Slider positions at startup.
    pub defaults: SliderState,
    /// Extra time after the nominal length before a play counts as finished.
    pub release_margin_ms: u32,
    /// Delay between a surprise draw and its automatic play.
    pub autoplay_delay_ms: u32,
    pub surprise: SurpriseZones,
    /// Fixed RNG seed; hosts pick one when absent.
    pub seed: Option<u64>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            defaults: SliderState::default(),
            release_margin_ms: 100,
            autoplay_delay_ms: 300,
            surprise: SurpriseZones::default(),
            seed: None,
        }
    }
}

impl GeneratorConfig {
    /// Parses and validates a JSON config. Defaults are snapped to their slider's step.
    pub fn from_json(json: &str) -> FartResult<Self> {
        let mut config: Self = serde_json::from_str(json)?;
        config.validate()?;
        config.defaults = config.defaults.snapped();
        Ok(config)
    }

    pub fn validate(&self) -> FartResult<()> {
        for kind in SliderKind::ALL {
            let range = kind.range();
            let value = self.defaults.get(kind);
            if !range.contains(value) {
                return Err(FartError::invalid_config(format!(
                    "default {} {value} is outside {}..={}",
                    kind.name(),
                    range.min,
                    range.max
                )));
            }

            let zone = self.surprise.zone(kind);
            if !(zone.low < zone.high) {
                return Err(FartError::invalid_config(format!(
                    "{} favor zone {}..{} is empty",
                    kind.name(),
                    zone.low,
                    zone.high
                )));
            }
            if !range.contains(zone.low) || !range.contains(zone.high) {
                return Err(FartError::invalid_config(format!(
                    "{} favor zone {}..{} is outside {}..={}",
                    kind.name(),
                    zone.low,
                    zone.high,
                    range.min,
                    range.max
                )));
            }
        }
        Ok(())
    }

    /// Delay before a play of `length` seconds is released.
    pub fn release_delay_ms(&self, length: f64) -> u32 {
        (length * 1000.0).round() as u32 + self.release_margin_ms
    }
}
