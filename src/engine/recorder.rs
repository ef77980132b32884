//! An engine that makes no sound and remembers everything it was asked to do.
//!
//! Used by the tests and by headless hosts that want to inspect the graph a
//! set of sliders would produce.

use std::collections::{BTreeMap, HashSet};
use std::future::{ready, Ready};

use super::{AudioEngine, AutomatedParam, NodeId, NodeSpec};
use crate::error::{FartError, FartResult};

/// One call made against a [`RecordingEngine`].
#[derive(Debug, Clone, PartialEq)]
pub enum EngineCall {
    Unlock,
    Create {
        node: NodeId,
        spec: NodeSpec,
    },
    Connect {
        source: NodeId,
        destination: NodeId,
    },
    ToDestination {
        node: NodeId,
    },
    TriggerAttackRelease {
        node: NodeId,
        frequency: f64,
        duration: f64,
        time: f64,
    },
    Start {
        node: NodeId,
        time: f64,
    },
    Stop {
        node: NodeId,
        time: f64,
    },
    SetValueAtTime {
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    },
    LinearRampToValueAtTime {
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    },
    Dispose {
        node: NodeId,
    },
}

#[derive(Debug, Default)]
pub struct RecordingEngine {
    now: f64,
    next_id: u32,
    live: BTreeMap<NodeId, NodeSpec>,
    calls: Vec<EngineCall>,
    unlock_failure: Option<String>,
    create_failures: HashSet<&'static str>,
    dispose_failures: HashSet<&'static str>,
    trigger_failures: HashSet<&'static str>,
}

impl RecordingEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_now(&mut self, now: f64) {
        self.now = now;
    }

    /// Makes every following unlock fail with `message`.
    pub fn fail_unlock(&mut self, message: impl Into<String>) {
        self.unlock_failure = Some(message.into());
    }

    /// Makes creating nodes of `class_name` fail.
    pub fn fail_create(&mut self, class_name: &'static str) {
        self.create_failures.insert(class_name);
    }

    /// Makes disposing nodes of `class_name` fail. The node is still dropped from the live set.
    pub fn fail_dispose(&mut self, class_name: &'static str) {
        self.dispose_failures.insert(class_name);
    }

    /// Makes triggering notes on nodes of `class_name` fail.
    pub fn fail_trigger(&mut self, class_name: &'static str) {
        self.trigger_failures.insert(class_name);
    }

    /// Drops every injected failure.
    pub fn clear_failures(&mut self) {
        self.unlock_failure = None;
        self.create_failures.clear();
        self.dispose_failures.clear();
        self.trigger_failures.clear();
    }

    pub fn calls(&self) -> &[EngineCall] {
        &self.calls
    }

    pub fn clear_calls(&mut self) {
        self.calls.clear();
    }

    pub fn live_nodes(&self) -> impl Iterator<Item = (NodeId, &NodeSpec)> {
        self.live.iter().map(|(id, spec)| (*id, spec))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn spec(&self, node: NodeId) -> Option<&NodeSpec> {
        self.live.get(&node)
    }

    /// How many nodes of `class_name` were ever created.
    pub fn created(&self, class_name: &str) -> usize {
        self.calls
            .iter()
            .filter(|call| matches!(call, EngineCall::Create { spec, .. } if spec.class_name() == class_name))
            .count()
    }

    fn check_live(&self, node: NodeId) -> FartResult<()> {
        if self.live.contains_key(&node) {
            Ok(())
        } else {
            Err(FartError::UnknownNode(node))
        }
    }
}

impl AudioEngine for RecordingEngine {
    type Unlock = Ready<FartResult<()>>;

    fn unlock(&mut self) -> Self::Unlock {
        self.calls.push(EngineCall::Unlock);
        match &self.unlock_failure {
            Some(message) => ready(Err(FartError::engine_start(message.clone()))),
            None => ready(Ok(())),
        }
    }

    fn now(&self) -> f64 {
        self.now
    }

    fn create(&mut self, spec: &NodeSpec) -> FartResult<NodeId> {
        if self.create_failures.contains(spec.class_name()) {
            return Err(FartError::engine("create", format!("{} refused", spec.class_name())));
        }
        self.next_id += 1;
        let node = NodeId(self.next_id);
        self.live.insert(node, *spec);
        self.calls.push(EngineCall::Create { node, spec: *spec });
        Ok(node)
    }

    fn connect(&mut self, source: NodeId, destination: NodeId) -> FartResult<()> {
        self.check_live(source)?;
        self.check_live(destination)?;
        self.calls.push(EngineCall::Connect {
            source,
            destination,
        });
        Ok(())
    }

    fn to_destination(&mut self, node: NodeId) -> FartResult<()> {
        self.check_live(node)?;
        self.calls.push(EngineCall::ToDestination { node });
        Ok(())
    }

    fn trigger_attack_release(
        &mut self,
        node: NodeId,
        frequency: f64,
        duration: f64,
        time: f64,
    ) -> FartResult<()> {
        let class_name = self
            .live
            .get(&node)
            .ok_or(FartError::UnknownNode(node))?
            .class_name();
        if self.trigger_failures.contains(class_name) {
            return Err(FartError::engine("trigger", format!("{class_name} is silent")));
        }
        self.calls.push(EngineCall::TriggerAttackRelease {
            node,
            frequency,
            duration,
            time,
        });
        Ok(())
    }

    fn start(&mut self, node: NodeId, time: f64) -> FartResult<()> {
        self.check_live(node)?;
        self.calls.push(EngineCall::Start { node, time });
        Ok(())
    }

    fn stop(&mut self, node: NodeId, time: f64) -> FartResult<()> {
        self.check_live(node)?;
        self.calls.push(EngineCall::Stop { node, time });
        Ok(())
    }

    fn set_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()> {
        self.check_live(node)?;
        self.calls.push(EngineCall::SetValueAtTime {
            node,
            param,
            value,
            time,
        });
        Ok(())
    }

    fn linear_ramp_to_value_at_time(
        &mut self,
        node: NodeId,
        param: AutomatedParam,
        value: f64,
        time: f64,
    ) -> FartResult<()> {
        self.check_live(node)?;
        self.calls.push(EngineCall::LinearRampToValueAtTime {
            node,
            param,
            value,
            time,
        });
        Ok(())
    }

    fn dispose(&mut self, node: NodeId) -> FartResult<()> {
        let spec = self.live.remove(&node).ok_or(FartError::UnknownNode(node))?;
        self.calls.push(EngineCall::Dispose { node });
        if self.dispose_failures.contains(spec.class_name()) {
            return Err(FartError::engine("dispose", format!("{} is stuck", spec.class_name())));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unlock_reports_configured_failure() {
        let mut engine = RecordingEngine::new();
        assert!(pollster::block_on(engine.unlock()).is_ok());

        engine.fail_unlock("blocked by autoplay policy");
        let err = pollster::block_on(engine.unlock()).unwrap_err();
        assert!(err.to_string().contains("autoplay"));
        assert_eq!(engine.calls().len(), 2);
    }

    #[test]
    fn test_double_dispose_is_an_error() {
        let mut engine = RecordingEngine::new();
        let node = engine.create(&NodeSpec::Volume { db: -6.0 }).unwrap();
        assert!(engine.dispose(node).is_ok());
        assert!(matches!(
            engine.dispose(node),
            Err(FartError::UnknownNode(n)) if n == node
        ));
        assert_eq!(engine.live_count(), 0);
    }

    #[test]
    fn test_connect_requires_live_nodes() {
        let mut engine = RecordingEngine::new();
        let a = engine.create(&NodeSpec::Volume { db: 0.0 }).unwrap();
        assert!(engine.connect(a, NodeId(99)).is_err());
    }

    #[test]
    fn test_trigger_failure_until_cleared() {
        let mut engine = RecordingEngine::new();
        let synth = engine
            .create(&NodeSpec::Volume { db: 0.0 })
            .unwrap();
        engine.fail_trigger("Volume");
        assert!(engine.trigger_attack_release(synth, 110.0, 1.0, 0.0).is_err());

        engine.clear_failures();
        assert!(engine.trigger_attack_release(synth, 110.0, 1.0, 0.0).is_ok());
    }

    #[test]
    fn test_created_counts_by_class() {
        let mut engine = RecordingEngine::new();
        engine.create(&NodeSpec::Volume { db: 0.0 }).unwrap();
        engine
            .create(&NodeSpec::Distortion { amount: 0.3 })
            .unwrap();
        engine.create(&NodeSpec::Volume { db: -3.0 }).unwrap();
        assert_eq!(engine.created("Volume"), 2);
        assert_eq!(engine.created("Noise"), 0);
    }
}
