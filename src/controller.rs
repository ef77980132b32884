//! Play lifecycle: Idle -> Playing -> Idle, one sound at a time.
//!
//! The controller owns the engine, the live [`SoundGraph`] (at most one), the
//! sliders and the RNG. A generate request is checked and flagged
//! synchronously in [`LifecycleController::begin`]; the only suspension point
//! is the first engine unlock. The end of a play is a [`Task::Release`] armed
//! on the injected [`Timer`].

use log::{debug, error, info};
use rand::Rng;

use crate::config::GeneratorConfig;
use crate::engine::AudioEngine;
use crate::error::{FartError, FartResult};
use crate::graph::SoundGraph;
use crate::params::MappedParameters;
use crate::playback::schedule_playback;
use crate::sliders::{SliderKind, SliderState};
use crate::surface::{ControlSurface, PLAY_FAILED_MESSAGE};
use crate::timer::{Task, Timer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// Flag is set, waiting for the audio context to unlock.
    Starting,
    Playing { play: u64 },
}

/// Outcome of [`LifecycleController::begin`].
pub enum Begin<U> {
    /// The engine is unlocked; call [`LifecycleController::play`] now.
    Ready,
    /// Await this, then pass the result to [`LifecycleController::complete_unlock`].
    Unlock(U),
}

pub struct LifecycleController<E, T, S, R>
where
    E: AudioEngine,
    T: Timer,
    S: ControlSurface,
    R: Rng,
{
    engine: E,
    timer: T,
    surface: S,
    rng: R,
    config: GeneratorConfig,
    sliders: SliderState,
    phase: Phase,
    unlocked: bool,
    graph: Option<SoundGraph>,
    plays: u64,
}

impl<E, T, S, R> LifecycleController<E, T, S, R>
where
    E: AudioEngine,
    T: Timer,
    S: ControlSurface,
    R: Rng,
{
    pub fn new(engine: E, timer: T, surface: S, rng: R, config: GeneratorConfig) -> Self {
        Self {
            engine,
            timer,
            surface,
            rng,
            sliders: config.defaults.snapped(),
            config,
            phase: Phase::Idle,
            unlocked: false,
            graph: None,
            plays: 0,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True from the moment a request is accepted until its release.
    pub fn is_playing(&self) -> bool {
        self.phase != Phase::Idle
    }

    pub fn sliders(&self) -> &SliderState {
        &self.sliders
    }

    pub fn has_graph(&self) -> bool {
        self.graph.is_some()
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut E {
        &mut self.engine
    }

    pub fn timer_mut(&mut self) -> &mut T {
        &mut self.timer
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Pushes every slider's readout to the surface.
    pub fn refresh_sliders(&mut self) {
        for kind in SliderKind::ALL {
            self.surface.show_slider(&self.sliders.readout(kind));
        }
    }

    /// User moved a slider. Returns the stored (clamped, snapped) value.
    pub fn set_slider(&mut self, kind: SliderKind, value: f64) -> f64 {
        let stored = self.sliders.set(kind, value);
        self.surface.show_slider(&self.sliders.readout(kind));
        stored
    }

    /// Accepts a generate request unless one is already in flight.
    pub fn begin(&mut self) -> Option<Begin<E::Unlock>> {
        if self.is_playing() {
            debug!("generate ignored: already playing");
            return None;
        }
        self.phase = Phase::Starting;
        self.surface.set_busy(true);

        if self.unlocked {
            Some(Begin::Ready)
        } else {
            Some(Begin::Unlock(self.engine.unlock()))
        }
    }

    /// Finishes a request that had to wait for the audio context.
    pub fn complete_unlock(&mut self, result: FartResult<()>) {
        if self.phase != Phase::Starting {
            debug!("unlock finished after teardown, dropping request");
            return;
        }
        match result {
            Ok(()) => {
                if !self.unlocked {
                    info!("audio context started");
                }
                self.unlocked = true;
                self.play();
            }
            Err(err) => self.fail(err),
        }
    }

    /// Builds and schedules a sound from the current sliders.
    pub fn play(&mut self) {
        if self.phase != Phase::Starting {
            debug!("play ignored in phase {:?}", self.phase);
            return;
        }
        if let Err(err) = self.start_sound() {
            self.fail(err);
        }
    }

    fn start_sound(&mut self) -> FartResult<()> {
        let params = MappedParameters::from_sliders(&self.sliders);
        // A graph can only survive here if a previous play ended abnormally.
        self.release_graph();

        let graph = SoundGraph::build(&mut self.engine, &params)?;
        let start = self.engine.now();
        let graph = self.graph.insert(graph);
        schedule_playback(&mut self.engine, graph, &params, start, &mut self.rng)?;

        self.plays += 1;
        let play = self.plays;
        self.phase = Phase::Playing { play };
        self.timer
            .arm(self.config.release_delay_ms(params.length), Task::Release { play });
        info!(
            "play {play}: {:.1}s at {}Hz, {:.1}dB, noise {}",
            params.length,
            params.pitch,
            params.volume,
            params.has_noise()
        );
        Ok(())
    }

    /// Scheduled end of play `play`.
    pub fn release(&mut self, play: u64) {
        if self.phase != (Phase::Playing { play }) {
            debug!("stale release for play {play} in phase {:?}", self.phase);
            return;
        }
        self.phase = Phase::Idle;
        self.surface.set_busy(false);
        self.release_graph();
    }

    /// Generate, awaiting the unlock if needed. Returns false if the request was ignored.
    pub async fn generate(&mut self) -> bool {
        match self.begin() {
            None => false,
            Some(Begin::Ready) => {
                self.play();
                true
            }
            Some(Begin::Unlock(unlock)) => {
                let result = unlock.await;
                self.complete_unlock(result);
                true
            }
        }
    }

    /// Draws all five sliders and queues an automatic play. Ignored while playing.
    pub fn surprise(&mut self) -> bool {
        if self.is_playing() {
            debug!("surprise ignored: already playing");
            return false;
        }
        self.sliders = self.config.surprise.draw(&mut self.rng);
        self.refresh_sliders();
        self.timer.arm(self.config.autoplay_delay_ms, Task::AutoPlay);
        true
    }

    /// Runs a task that came due on the timer.
    pub async fn run_task(&mut self, task: Task) {
        match task {
            Task::Release { play } => self.release(play),
            Task::AutoPlay => {
                self.generate().await;
            }
        }
    }

    /// Returns true when the page was hidden in the middle of a play.
    pub fn visibility_changed(&self, hidden: bool) -> bool {
        let interrupted = hidden && self.is_playing();
        if interrupted {
            info!("page hidden while playing");
        }
        interrupted
    }

    /// Page is going away: release whatever is alive.
    pub fn teardown(&mut self) {
        self.release_graph();
        if self.phase != Phase::Idle {
            self.phase = Phase::Idle;
            self.surface.set_busy(false);
        }
    }

    fn fail(&mut self, err: FartError) {
        error!("error generating sound: {err}");
        self.surface.notify_error(PLAY_FAILED_MESSAGE);
        self.release_graph();
        self.phase = Phase::Idle;
        self.surface.set_busy(false);
    }

    fn release_graph(&mut self) {
        if let Some(graph) = self.graph.take() {
            graph.release(&mut self.engine);
        }
    }
}

impl<E, T, S, R> Drop for LifecycleController<E, T, S, R>
where
    E: AudioEngine,
    T: Timer,
    S: ControlSurface,
    R: Rng,
{
    fn drop(&mut self) {
        self.release_graph();
    }
}
