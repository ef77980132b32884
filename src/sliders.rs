//! The five range controls and their readouts.

use serde::{Deserialize, Serialize};

pub const SLIDER_LENGTH: u32 = 0;
pub const SLIDER_FORCE: u32 = 1;
pub const SLIDER_WETNESS: u32 = 2;
pub const SLIDER_LOUDNESS: u32 = 3;
pub const SLIDER_PITCH: u32 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SliderKind {
    Length,
    Force,
    Wetness,
    Loudness,
    Pitch,
}

impl SliderKind {
    pub const ALL: [SliderKind; 5] = [
        SliderKind::Length,
        SliderKind::Force,
        SliderKind::Wetness,
        SliderKind::Loudness,
        SliderKind::Pitch,
    ];

    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            SLIDER_LENGTH => Some(Self::Length),
            SLIDER_FORCE => Some(Self::Force),
            SLIDER_WETNESS => Some(Self::Wetness),
            SLIDER_LOUDNESS => Some(Self::Loudness),
            SLIDER_PITCH => Some(Self::Pitch),
            _ => None,
        }
    }

    pub fn id(self) -> u32 {
        match self {
            Self::Length => SLIDER_LENGTH,
            Self::Force => SLIDER_FORCE,
            Self::Wetness => SLIDER_WETNESS,
            Self::Loudness => SLIDER_LOUDNESS,
            Self::Pitch => SLIDER_PITCH,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Length => "length",
            Self::Force => "force",
            Self::Wetness => "wetness",
            Self::Loudness => "loudness",
            Self::Pitch => "pitch",
        }
    }

    pub fn range(self) -> SliderRange {
        match self {
            Self::Length => SliderRange::new(0.1, 3.0, 0.1),
            Self::Force => SliderRange::new(1.0, 10.0, 1.0),
            Self::Wetness => SliderRange::new(0.0, 10.0, 1.0),
            Self::Loudness => SliderRange::new(0.0, 100.0, 1.0),
            Self::Pitch => SliderRange::new(50.0, 300.0, 1.0),
        }
    }

    /// Text shown next to the slider.
    pub fn format(self, value: f64) -> String {
        match self {
            Self::Length => format!("{value:.1}s"),
            Self::Force | Self::Wetness => format!("{}", value.round()),
            Self::Loudness => format!("{}%", value.round()),
            Self::Pitch => format!("{}Hz", value.round()),
        }
    }
}

/// Bounds and granularity of one range control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SliderRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl SliderRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn contains(&self, value: f64) -> bool {
        value >= self.min && value <= self.max
    }

    /// Clamps and snaps `value` the way a range input does.
    pub fn snap(&self, value: f64) -> f64 {
        let clamped = value.clamp(self.min, self.max);
        let steps = ((clamped - self.min) / self.step).round();
        // Re-round to the step's precision so 0.1 steps don't drift (0.30000000000000004).
        let snapped = round_to(self.min + steps * self.step, self.step);
        snapped.clamp(self.min, self.max)
    }

    /// Progress fill of the track, in percent.
    pub fn fill_percent(&self, value: f64) -> f64 {
        (value - self.min) / (self.max - self.min) * 100.0
    }
}

#[inline]
fn round_to(value: f64, step: f64) -> f64 {
    if step >= 1.0 {
        return value.round();
    }
    let decimals = (-step.log10()).ceil() as i32;
    let scale = 10f64.powi(decimals);
    (value * scale).round() / scale
}

/// What the page shows for one slider after an update.
#[derive(Debug, Clone, PartialEq)]
pub struct SliderReadout {
    pub kind: SliderKind,
    pub value: f64,
    pub label: String,
    pub fill_percent: f64,
}

impl SliderReadout {
    pub fn new(kind: SliderKind, value: f64) -> Self {
        Self {
            kind,
            value,
            label: kind.format(value),
            fill_percent: kind.range().fill_percent(value),
        }
    }
}

/// Current position of every slider.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SliderState {
    /// Seconds.
    pub length: f64,
    pub force: u8,
    pub wetness: u8,
    /// Percent.
    pub loudness: u8,
    /// Hz.
    pub pitch: u16,
}

impl Default for SliderState {
    fn default() -> Self {
        Self {
            length: 1.0,
            force: 5,
            wetness: 5,
            loudness: 70,
            pitch: 150,
        }
    }
}

impl SliderState {
    pub fn get(&self, kind: SliderKind) -> f64 {
        match kind {
            SliderKind::Length => self.length,
            SliderKind::Force => self.force as f64,
            SliderKind::Wetness => self.wetness as f64,
            SliderKind::Loudness => self.loudness as f64,
            SliderKind::Pitch => self.pitch as f64,
        }
    }

    /// Stores `value` clamped and snapped to the slider's range, returning what was stored.
    pub fn set(&mut self, kind: SliderKind, value: f64) -> f64 {
        let snapped = kind.range().snap(value);
        match kind {
            SliderKind::Length => self.length = snapped,
            SliderKind::Force => self.force = snapped as u8,
            SliderKind::Wetness => self.wetness = snapped as u8,
            SliderKind::Loudness => self.loudness = snapped as u8,
            SliderKind::Pitch => self.pitch = snapped as u16,
        }
        snapped
    }

    /// Every slider clamped and snapped as if it had been set through [`SliderState::set`].
    pub fn snapped(mut self) -> Self {
        for kind in SliderKind::ALL {
            self.set(kind, self.get(kind));
        }
        self
    }

    pub fn readout(&self, kind: SliderKind) -> SliderReadout {
        SliderReadout::new(kind, self.get(kind))
    }

    pub fn in_range(&self) -> bool {
        SliderKind::ALL
            .iter()
            .all(|kind| kind.range().contains(self.get(*kind)))
    }
}
