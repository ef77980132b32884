//! What the controller drives on the page.

use crate::sliders::SliderReadout;

/// Message shown when a play attempt fails.
pub const PLAY_FAILED_MESSAGE: &str =
    "Sorry, there was an error generating the sound. Please try again.";

pub trait ControlSurface {
    /// Disables both trigger buttons and shows the "playing" label while `busy`.
    fn set_busy(&mut self, busy: bool);

    /// Updates a slider's position, value label and fill.
    fn show_slider(&mut self, readout: &SliderReadout);

    /// Blocking user notification.
    fn notify_error(&mut self, message: &str);
}

/// Surface that keeps what it was told, for tests and headless hosts.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub busy: bool,
    /// Every busy flag change, in order.
    pub busy_changes: Vec<bool>,
    pub readouts: Vec<SliderReadout>,
    pub errors: Vec<String>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ControlSurface for RecordingSurface {
    fn set_busy(&mut self, busy: bool) {
        self.busy = busy;
        self.busy_changes.push(busy);
    }

    fn show_slider(&mut self, readout: &SliderReadout) {
        self.readouts.push(readout.clone());
    }

    fn notify_error(&mut self, message: &str) {
        self.errors.push(message.to_string());
    }
}
