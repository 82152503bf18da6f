//! Named code hooks referenced from content files.

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

use ability_core::{EffectDefinition, ExecutionCalculation, GameplayAbility, MagnitudeCalculation};

/// What a content file hands to a behaviour factory.
#[derive(Clone, Copy, Debug)]
pub struct BehaviourArgs<'a> {
    /// Name of the ability being built.
    pub ability: &'a str,
    /// Payload effects listed by the ability, in file order.
    pub effects: &'a [Arc<EffectDefinition>],
    pub params: &'a BTreeMap<String, f32>,
}

impl BehaviourArgs<'_> {
    pub fn effect(&self, index: usize) -> Option<Arc<EffectDefinition>> {
        self.effects.get(index).cloned()
    }

    /// Numeric parameter `name`, or `default` when absent.
    pub fn param(&self, name: &str, default: f32) -> f32 {
        self.params.get(name).copied().unwrap_or(default)
    }
}

type BehaviourFactory = Box<dyn Fn(&BehaviourArgs<'_>) -> Box<dyn GameplayAbility>>;

/// Lookup table for the parts of a definition that cannot be data.
///
/// Behaviours are registered as factories; every ability built from content
/// gets its own behaviour object, configured from its payload effects and
/// parameters.
#[derive(Default)]
pub struct ContentRegistry {
    behaviours: HashMap<String, BehaviourFactory>,
    executions: HashMap<String, Arc<dyn ExecutionCalculation>>,
    magnitudes: HashMap<String, Arc<dyn MagnitudeCalculation>>,
}

impl ContentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_behaviour<F>(mut self, name: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&BehaviourArgs<'_>) -> Box<dyn GameplayAbility> + 'static,
    {
        self.register_behaviour(name, factory);
        self
    }

    pub fn with_execution(
        mut self,
        name: impl Into<String>,
        execution: Arc<dyn ExecutionCalculation>,
    ) -> Self {
        self.register_execution(name, execution);
        self
    }

    pub fn with_magnitude(
        mut self,
        name: impl Into<String>,
        magnitude: Arc<dyn MagnitudeCalculation>,
    ) -> Self {
        self.register_magnitude(name, magnitude);
        self
    }

    /// Registers a behaviour factory under `name`.
    ///
    /// A later registration with the same name replaces the earlier one.
    pub fn register_behaviour<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&BehaviourArgs<'_>) -> Box<dyn GameplayAbility> + 'static,
    {
        let name = name.into();
        if self.behaviours.insert(name.clone(), Box::new(factory)).is_some() {
            tracing::warn!(
                target: "ability::content",
                behaviour = %name,
                "behaviour re-registered"
            );
        }
    }

    pub fn register_execution(
        &mut self,
        name: impl Into<String>,
        execution: Arc<dyn ExecutionCalculation>,
    ) {
        let name = name.into();
        if self.executions.insert(name.clone(), execution).is_some() {
            tracing::warn!(
                target: "ability::content",
                execution = %name,
                "execution re-registered"
            );
        }
    }

    pub fn register_magnitude(
        &mut self,
        name: impl Into<String>,
        magnitude: Arc<dyn MagnitudeCalculation>,
    ) {
        let name = name.into();
        if self.magnitudes.insert(name.clone(), magnitude).is_some() {
            tracing::warn!(
                target: "ability::content",
                magnitude = %name,
                "magnitude re-registered"
            );
        }
    }

    /// Builds a behaviour object with the factory registered as `name`.
    pub fn create_behaviour(
        &self,
        name: &str,
        args: &BehaviourArgs<'_>,
    ) -> Option<Box<dyn GameplayAbility>> {
        self.behaviours.get(name).map(|factory| factory(args))
    }

    pub fn execution(&self, name: &str) -> Option<Arc<dyn ExecutionCalculation>> {
        self.executions.get(name).cloned()
    }

    pub fn magnitude(&self, name: &str) -> Option<Arc<dyn MagnitudeCalculation>> {
        self.magnitudes.get(name).cloned()
    }

    pub fn has_behaviour(&self, name: &str) -> bool {
        self.behaviours.contains_key(name)
    }
}

impl fmt::Debug for ContentRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut behaviours: Vec<_> = self.behaviours.keys().collect();
        behaviours.sort();
        f.debug_struct("ContentRegistry")
            .field("behaviours", &behaviours)
            .field("executions", &self.executions.len())
            .field("magnitudes", &self.magnitudes.len())
            .finish()
    }
}
