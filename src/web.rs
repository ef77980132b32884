//! WebAssembly bindings via wasm-bindgen for the browser page.
//!
//! This module is only compiled when the `web` feature is enabled. Sound comes
//! from the page's global `Tone` (Tone.js); the page supplies a control panel
//! object and forwards DOM events.
//!
//! # Usage
//!
//! ```bash
//! wasm-pack build --target web --features web
//! ```
//!
//! ```javascript
//! import init, { fart_init, FartGenerator, slider_length } from './fart_core.js';
//!
//! await init();
//! fart_init();
//!
//! const generator = new FartGenerator({
//!   setBusy(busy) { generateBtn.disabled = busy; surpriseBtn.disabled = busy; },
//!   showSlider(id, value, label, fill) { /* move slider, set label, paint fill */ },
//!   notifyError(message) { alert(message); },
//! });
//!
//! lengthSlider.addEventListener('input', e => generator.setSlider(slider_length(), +e.target.value));
//! generateBtn.addEventListener('click', () => generator.generate());
//! surpriseBtn.addEventListener('click', () => generator.surprise());
//! window.addEventListener('beforeunload', () => generator.teardown());
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::rc::{Rc, Weak};

use js_sys::{Array, Function, Math, Promise, Reflect, JSON};
use rand::SeedableRng;
use rand_pcg::Pcg32;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::{spawn_local, JsFuture};

use crate::config::GeneratorConfig;
use crate::controller::{Begin, LifecycleController};
use crate::engine::{AudioEngine, AutomatedParam, ConstructorArgs, NodeId, NodeSpec};
use crate::error::{FartError, FartResult};
use crate::sliders::{
    SliderKind, SliderReadout, SLIDER_FORCE, SLIDER_LENGTH, SLIDER_LOUDNESS, SLIDER_PITCH,
    SLIDER_WETNESS,
};
use crate::surface::ControlSurface;
use crate::timer::{Task, Timer};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = Tone, js_name = start, catch)]
    fn tone_start() -> Result<Promise, JsValue>;

    #[wasm_bindgen(js_namespace = Tone, js_name = now)]
    fn tone_now() -> f64;

    #[wasm_bindgen(js_name = setTimeout)]
    fn set_timeout(handler: &JsValue, timeout: i32) -> i32;

    /// Any Tone.js audio node.
    type ToneNode;

    #[wasm_bindgen(method, catch)]
    fn connect(this: &ToneNode, destination: &ToneNode) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = toDestination)]
    fn to_destination(this: &ToneNode) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = triggerAttackRelease)]
    fn trigger_attack_release(
        this: &ToneNode,
        note: f64,
        duration: f64,
        time: f64,
    ) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn start(this: &ToneNode, time: f64) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn stop(this: &ToneNode, time: f64) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch)]
    fn dispose(this: &ToneNode) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, getter)]
    fn frequency(this: &ToneNode) -> ToneParam;

    #[wasm_bindgen(method, getter)]
    fn volume(this: &ToneNode) -> ToneParam;

    /// A Tone.js `Param` or `Signal`.
    type ToneParam;

    #[wasm_bindgen(method, catch, js_name = setValueAtTime)]
    fn set_value_at_time(this: &ToneParam, value: f64, time: f64) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method, catch, js_name = linearRampToValueAtTime)]
    fn linear_ramp_to_value_at_time(
        this: &ToneParam,
        value: f64,
        time: f64,
    ) -> Result<JsValue, JsValue>;

    /// Page object with `setBusy`, `showSlider` and `notifyError` methods.
    pub type ControlPanel;

    #[wasm_bindgen(method, js_name = setBusy)]
    fn js_set_busy(this: &ControlPanel, busy: bool);

    #[wasm_bindgen(method, js_name = showSlider)]
    fn js_show_slider(this: &ControlPanel, slider: u32, value: f64, label: &str, fill_percent: f64);

    #[wasm_bindgen(method, js_name = notifyError)]
    fn js_notify_error(this: &ControlPanel, message: &str);
}

fn describe(err: JsValue) -> String {
    err.as_string().unwrap_or_else(|| format!("{err:?}"))
}

fn engine_err(operation: &'static str) -> impl FnOnce(JsValue) -> FartError {
    move |err| FartError::engine(operation, describe(err))
}

fn to_js(err: FartError) -> JsValue {
    js_sys::Error::new(&err.to_string()).into()
}

// ═══════════════════════════════════════════════════════════════════════════
// Engine
// ═══════════════════════════════════════════════════════════════════════════

fn construct(spec: &NodeSpec) -> Result<ToneNode, JsValue> {
    let tone = Reflect::get(&js_sys::global(), &JsValue::from_str("Tone"))?;
    let class: Function = Reflect::get(&tone, &JsValue::from_str(spec.class_name()))?.dyn_into()?;

    let args = Array::new();
    match spec.constructor_args().map_err(to_js)? {
        ConstructorArgs::Positional(values) => {
            for value in values {
                args.push(&JsValue::from_f64(value));
            }
        }
        ConstructorArgs::Options(json) => {
            args.push(&JSON::parse(&json)?);
        }
    }
    Ok(Reflect::construct(&class, &args)?.unchecked_into())
}

/// [`AudioEngine`] backed by the page's Tone.js.
#[derive(Default)]
pub struct ToneEngine {
    nodes: HashMap<NodeId, ToneNode>,
    next_id: u32,
}

impl ToneEngine {
    fn node(&self, id: NodeId) -> FartResult<&ToneNode> {
        self.nodes.get(&id).ok_or(FartError::UnknownNode(id))
    }

    fn param(&self, id: NodeId, param: AutomatedParam) -> FartResult<ToneParam> {
        let node = self.node(id)?;
        Ok(match param {
            AutomatedParam::Frequency => node.frequency(),
            AutomatedParam::Volume => node.volume(),
        })
    }
}

impl AudioEngine for ToneEngine {
    type Unlock = Pin<Box<dyn Future<Output = FartResult<()>>>>;

    fn unlock(&mut self) -> Self::Unlock {
        let promise = tone_start();
        Box::pin(async move {
            let promise = promise.map_err(|err| FartError::engine_start(describe(err)))?;
            JsFuture::from(promise)
                .await
                .map(|_| ())
                .map_err(|err| FartError::engine_start(describe(err)))
        })
    }

    fn now(&self) -> f64 {
        tone_now()
    }

    fn create(&mut self, spec: &NodeSpec) -> FartResult<NodeId> {
        let node = construct(spec).map_err(engine_err("create"))?;
        self.next_id += 1;
        let id = NodeId(self.next_id);
        self.nodes.insert(id, node);
        Ok(id)
    }

    fn connect(&mut self, source: NodeId, destination: NodeId) -> FartResult<()> {
        let destination = self.node(destination)?;
        self.node(source)?
            .connect(destination)
            .map(drop)
            .map_err(engine_err("connect"))
    }

    fn to_destination(&mut self, node: NodeId) -> FartResult<()> {
        self.node(node)?
            .to_destination()
            .map(drop)
            .map_err(engine_err("route to destination"))
    }

    fn trigger_attack_release(
        &mut self,
        node: NodeId,
        frequency: f64,
        duration: f64,
        time: f64,
    ) -> FartResult<()> {
        self.node(node)?
            .trigger_attack_release(frequency, duration, time)
            .map(drop)
            .map_err(engine_err("trigger"))
    }

    fn start(&mut self, node: NodeId, time: f64) -> FartResult<()> {
        self.node(node)?
            .start(time)
            .map(drop)
            .map_err(engine_err("start source"))
    }

    fn stop(&mut self, node: NodeId, time: f64) -> FartResult<()> {
        self.node(node)?
            .stop(time)
            .map(drop)
            .map_err(engine_err("stop source"))
    }

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()> {
        self.param(node, param)?
            .set_value_at_time(value, time)
            .map(drop)
            .map_err(engine_err("set value"))
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()> {
        self.param(node, param)?
            .linear_ramp_to_value_at_time(value, time)
            .map(drop)
            .map_err(engine_err("ramp value"))
    }

    fn dispose(&mut self, node: NodeId) -> FartResult<()> {
        let tone_node = self.nodes.remove(&node).ok_or(FartError::UnknownNode(node))?;
        tone_node.dispose().map(drop).map_err(engine_err("dispose"))
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Page glue
// ═══════════════════════════════════════════════════════════════════════════

type WebController = LifecycleController<ToneEngine, JsTimer, JsPanel, Pcg32>;

/// [`ControlSurface`] that forwards to the page's control panel object.
pub struct JsPanel(ControlPanel);

impl ControlSurface for JsPanel {
    fn set_busy(&mut self, busy: bool) {
        self.0.js_set_busy(busy);
    }

    fn show_slider(&mut self, readout: &SliderReadout) {
        self.0.js_show_slider(
            readout.kind.id(),
            readout.value,
            &readout.label,
            readout.fill_percent,
        );
    }

    fn notify_error(&mut self, message: &str) {
        self.0.js_notify_error(message);
    }
}

/// [`Timer`] on `setTimeout`. Holds the controller weakly so pending timeouts
/// never keep a torn-down generator alive.
pub struct JsTimer {
    app: Weak<RefCell<WebController>>,
}

impl Timer for JsTimer {
    fn arm(&mut self, delay_ms: u32, task: Task) {
        let app = self.app.clone();
        let callback = Closure::once_into_js(move || {
            if let Some(app) = app.upgrade() {
                run_task(&app, task);
            }
        });
        set_timeout(&callback, delay_ms.min(i32::MAX as u32) as i32);
    }
}

// Mirrors `LifecycleController::run_task`, which would hold the RefCell borrow
// across the unlock await.
fn run_task(app: &Rc<RefCell<WebController>>, task: Task) {
    match task {
        Task::Release { play } => app.borrow_mut().release(play),
        Task::AutoPlay => generate(app),
    }
}

// The controller is never borrowed across the unlock await.
fn generate(app: &Rc<RefCell<WebController>>) {
    let begin = app.borrow_mut().begin();
    match begin {
        None => {}
        Some(Begin::Ready) => app.borrow_mut().play(),
        Some(Begin::Unlock(unlock)) => {
            let app = Rc::downgrade(app);
            spawn_local(async move {
                let result = unlock.await;
                if let Some(app) = app.upgrade() {
                    app.borrow_mut().complete_unlock(result);
                }
            });
        }
    }
}

fn random_seed() -> u64 {
    let hi = (Math::random() * 4_294_967_296.0) as u64;
    let lo = (Math::random() * 4_294_967_296.0) as u64;
    (hi << 32) | lo
}

fn slider_kind(slider: u32) -> Result<SliderKind, JsValue> {
    SliderKind::from_id(slider).ok_or_else(|| js_sys::Error::new(&format!("unknown slider {slider}")).into())
}

// ═══════════════════════════════════════════════════════════════════════════
// Exports
// ═══════════════════════════════════════════════════════════════════════════

/// Installs the panic hook and console logging. Call once after `init()`.
#[wasm_bindgen]
pub fn fart_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Info).ok();
}

/// The generator as seen from the page.
#[wasm_bindgen]
pub struct FartGenerator {
    app: Rc<RefCell<WebController>>,
}

#[wasm_bindgen]
impl FartGenerator {
    /// Creates a generator driving `panel`. `config_json` is an optional
    /// [`GeneratorConfig`] in JSON; invalid config throws.
    #[wasm_bindgen(constructor)]
    pub fn new(panel: ControlPanel, config_json: Option<String>) -> Result<FartGenerator, JsValue> {
        let config = match config_json {
            Some(json) => GeneratorConfig::from_json(&json).map_err(to_js)?,
            None => GeneratorConfig::default(),
        };
        let rng = Pcg32::seed_from_u64(config.seed.unwrap_or_else(random_seed));

        let app = Rc::new_cyclic(|weak| {
            RefCell::new(LifecycleController::new(
                ToneEngine::default(),
                JsTimer { app: weak.clone() },
                JsPanel(panel),
                rng,
                config,
            ))
        });
        app.borrow_mut().refresh_sliders();
        Ok(Self { app })
    }

    /// Forwards a slider input event. Returns the value actually stored.
    #[wasm_bindgen(js_name = setSlider)]
    pub fn set_slider(&self, slider: u32, value: f64) -> Result<f64, JsValue> {
        let kind = slider_kind(slider)?;
        Ok(self.app.borrow_mut().set_slider(kind, value))
    }

    pub fn slider(&self, slider: u32) -> Result<f64, JsValue> {
        let kind = slider_kind(slider)?;
        Ok(self.app.borrow().sliders().get(kind))
    }

    /// Generate button. Ignored while a sound is playing.
    pub fn generate(&self) {
        generate(&self.app);
    }

    /// Surprise button: randomizes every slider and plays shortly after.
    pub fn surprise(&self) -> bool {
        self.app.borrow_mut().surprise()
    }

    #[wasm_bindgen(js_name = isPlaying)]
    pub fn is_playing(&self) -> bool {
        self.app.borrow().is_playing()
    }

    #[wasm_bindgen(js_name = visibilityChanged)]
    pub fn visibility_changed(&self, hidden: bool) -> bool {
        self.app.borrow().visibility_changed(hidden)
    }

    /// Page unload: releases any live sound.
    pub fn teardown(&self) {
        self.app.borrow_mut().teardown();
    }
}

#[wasm_bindgen]
pub fn slider_length() -> u32 {
    SLIDER_LENGTH
}

#[wasm_bindgen]
pub fn slider_force() -> u32 {
    SLIDER_FORCE
}

#[wasm_bindgen]
pub fn slider_wetness() -> u32 {
    SLIDER_WETNESS
}

#[wasm_bindgen]
pub fn slider_loudness() -> u32 {
    SLIDER_LOUDNESS
}

#[wasm_bindgen]
pub fn slider_pitch() -> u32 {
    SLIDER_PITCH
}
