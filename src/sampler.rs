//! Weighted random draws for the "surprise me" action.
//!
//! Three uniform draws are averaged, which piles the result up around the
//! middle, and the average is then remapped piecewise-linearly so the middle
//! band lands inside a caller-chosen favor zone.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sliders::{SliderKind, SliderState};

/// Returns a value in `[min, max]` that falls inside `[favor_min, favor_max]` most of the time.
pub fn weighted_random<R: Rng + ?Sized>(
    rng: &mut R,
    min: f64,
    max: f64,
    favor_min: f64,
    favor_max: f64,
) -> f64 {
    let avg = (rng.gen::<f64>() + rng.gen::<f64>() + rng.gen::<f64>()) / 3.0;
    remap(avg, min, max, favor_min, favor_max)
}

pub fn weighted_random_int<R: Rng + ?Sized>(
    rng: &mut R,
    min: f64,
    max: f64,
    favor_min: f64,
    favor_max: f64,
) -> i64 {
    weighted_random(rng, min, max, favor_min, favor_max).round() as i64
}

/// Maps `avg` in `[0, 1]` onto `[min, max]` with the favor zone stretched over the middle band.
fn remap(avg: f64, min: f64, max: f64, favor_min: f64, favor_max: f64) -> f64 {
    let range = max - min;
    let favor_start = (favor_min - min) / range;
    let favor_end = (favor_max - min) / range;

    let value = if avg < favor_start {
        min + (avg / favor_start) * (favor_min - min)
    } else if avg > favor_end {
        favor_max + ((avg - favor_end) / (1.0 - favor_end)) * (max - favor_max)
    } else if favor_end > favor_start {
        favor_min + ((avg - favor_start) / (favor_end - favor_start)) * (favor_max - favor_min)
    } else {
        favor_min
    };

    value.max(min).min(max)
}

/// Sub-range of a slider that surprise draws land in most often.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FavorZone {
    pub low: f64,
    pub high: f64,
}

impl FavorZone {
    pub const fn new(low: f64, high: f64) -> Self {
        Self { low, high }
    }
}

/// One favor zone per slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurpriseZones {
    pub length: FavorZone,
    pub force: FavorZone,
    pub wetness: FavorZone,
    pub loudness: FavorZone,
    pub pitch: FavorZone,
}

impl Default for SurpriseZones {
    fn default() -> Self {
        Self {
            length: FavorZone::new(0.5, 2.0),
            force: FavorZone::new(3.0, 7.0),
            wetness: FavorZone::new(2.0, 6.0),
            loudness: FavorZone::new(50.0, 90.0),
            pitch: FavorZone::new(100.0, 200.0),
        }
    }
}

impl SurpriseZones {
    pub fn zone(&self, kind: SliderKind) -> FavorZone {
        match kind {
            SliderKind::Length => self.length,
            SliderKind::Force => self.force,
            SliderKind::Wetness => self.wetness,
            SliderKind::Loudness => self.loudness,
            SliderKind::Pitch => self.pitch,
        }
    }

    /// Picks all five sliders at once.
    ///
    /// Length is rounded to one decimal before it is stored, so the value that
    /// is displayed is also the value that plays.
    pub fn draw<R: Rng + ?Sized>(&self, rng: &mut R) -> SliderState {
        let mut sliders = SliderState::default();
        for kind in SliderKind::ALL {
            let range = kind.range();
            let zone = self.zone(kind);
            let value = match kind {
                SliderKind::Length => {
                    let raw = weighted_random(rng, range.min, range.max, zone.low, zone.high);
                    (raw * 10.0).round() / 10.0
                }
                _ => weighted_random_int(rng, range.min, range.max, zone.low, zone.high) as f64,
            };
            sliders.set(kind, value);
        }
        sliders
    }
}
