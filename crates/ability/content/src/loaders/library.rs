//! Resolution of content files into shared definitions.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::Arc;

use ability_core::{AbilityDefinition, EffectDefinition, Magnitude, Modifier};

use super::format::{AbilityData, ContentFile, EffectData, MagnitudeData, ModifierData};
use super::{LoadResult, read_file};
use crate::registry::{BehaviourArgs, ContentRegistry};

/// Every definition loaded from a set of content files, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct ContentLibrary {
    effects: BTreeMap<String, Arc<EffectDefinition>>,
    abilities: BTreeMap<String, Arc<AbilityDefinition>>,
}

impl ContentLibrary {
    pub fn effect(&self, name: &str) -> Option<Arc<EffectDefinition>> {
        self.effects.get(name).cloned()
    }

    pub fn ability(&self, name: &str) -> Option<Arc<AbilityDefinition>> {
        self.abilities.get(name).cloned()
    }

    /// Like [`ContentLibrary::effect`], but a missing name is an error.
    pub fn require_effect(&self, name: &str) -> LoadResult<Arc<EffectDefinition>> {
        self.effect(name)
            .ok_or_else(|| anyhow::anyhow!("Effect '{}' is not defined", name))
    }

    pub fn require_ability(&self, name: &str) -> LoadResult<Arc<AbilityDefinition>> {
        self.ability(name)
            .ok_or_else(|| anyhow::anyhow!("Ability '{}' is not defined", name))
    }

    pub fn effect_names(&self) -> impl Iterator<Item = &str> {
        self.effects.keys().map(String::as_str)
    }

    pub fn ability_names(&self) -> impl Iterator<Item = &str> {
        self.abilities.keys().map(String::as_str)
    }

    pub fn effect_count(&self) -> usize {
        self.effects.len()
    }

    pub fn ability_count(&self) -> usize {
        self.abilities.len()
    }
}

/// Loader for RON content files.
pub struct ContentLoader;

impl ContentLoader {
    /// Load and resolve a single RON file.
    pub fn load(path: &Path, registry: &ContentRegistry) -> LoadResult<ContentLibrary> {
        let file = Self::parse_file(path)?;
        Self::resolve(file, registry)
    }

    /// Load and resolve RON source text.
    pub fn load_str(source: &str, registry: &ContentRegistry) -> LoadResult<ContentLibrary> {
        let file: ContentFile = ron::from_str(source)
            .map_err(|e| anyhow::anyhow!("Failed to parse content RON: {}", e))?;
        Self::resolve(file, registry)
    }

    /// Load every `*.ron` file in `dir` and resolve them together.
    ///
    /// Files are read in name order. Definitions may reference names from
    /// any file in the directory.
    pub fn load_dir(dir: &Path, registry: &ContentRegistry) -> LoadResult<ContentLibrary> {
        let entries = std::fs::read_dir(dir)
            .map_err(|e| anyhow::anyhow!("Failed to read directory {}: {}", dir.display(), e))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| anyhow::anyhow!("Failed to read entry in {}: {}", dir.display(), e))?
                .path();
            if path.extension().is_some_and(|ext| ext == "ron") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut merged = ContentFile::default();
        for path in &paths {
            merged.merge(Self::parse_file(path)?);
        }

        tracing::debug!(
            target: "ability::content",
            dir = %dir.display(),
            files = paths.len(),
            "merged content files"
        );
        Self::resolve(merged, registry)
    }

    fn parse_file(path: &Path) -> LoadResult<ContentFile> {
        let content = read_file(path)?;
        ron::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Failed to parse content RON {}: {}", path.display(), e))
    }

    /// Builds every definition in `file`.
    pub fn resolve(file: ContentFile, registry: &ContentRegistry) -> LoadResult<ContentLibrary> {
        let mut resolver = Resolver::new(&file, registry)?;

        for data in &file.effects {
            resolver.effect(&data.name)?;
        }
        for data in &file.abilities {
            resolver.ability(&data.name)?;
        }

        let library = ContentLibrary {
            effects: resolver.effects.into_iter().collect(),
            abilities: resolver.abilities.into_iter().collect(),
        };
        tracing::info!(
            target: "ability::content",
            effects = library.effect_count(),
            abilities = library.ability_count(),
            "content loaded"
        );
        Ok(library)
    }
}

// ============================================================================
// Resolver
// ============================================================================

#[derive(Clone, Copy, PartialEq, Eq)]
enum Node<'a> {
    Effect(&'a str),
    Ability(&'a str),
}

/// Builds definitions on demand, memoising each by name.
///
/// Effects and abilities may reference each other (an effect grants an
/// ability whose cost is another effect). A reference back to a definition
/// still under construction is a cycle and fails the load.
struct Resolver<'a> {
    registry: &'a ContentRegistry,
    effect_data: HashMap<&'a str, &'a EffectData>,
    ability_data: HashMap<&'a str, &'a AbilityData>,
    effects: HashMap<String, Arc<EffectDefinition>>,
    abilities: HashMap<String, Arc<AbilityDefinition>>,
    visiting: Vec<Node<'a>>,
}

impl<'a> Resolver<'a> {
    fn new(file: &'a ContentFile, registry: &'a ContentRegistry) -> LoadResult<Self> {
        let mut effect_data = HashMap::new();
        for data in &file.effects {
            if data.name.is_empty() {
                anyhow::bail!("Effect definition without a name");
            }
            if effect_data.insert(data.name.as_str(), data).is_some() {
                anyhow::bail!("Effect '{}' is defined more than once", data.name);
            }
        }

        let mut ability_data = HashMap::new();
        for data in &file.abilities {
            if data.name.is_empty() {
                anyhow::bail!("Ability definition without a name");
            }
            if ability_data.insert(data.name.as_str(), data).is_some() {
                anyhow::bail!("Ability '{}' is defined more than once", data.name);
            }
        }

        Ok(Self {
            registry,
            effect_data,
            ability_data,
            effects: HashMap::new(),
            abilities: HashMap::new(),
            visiting: Vec::new(),
        })
    }

    fn enter(&mut self, node: Node<'a>) -> LoadResult<()> {
        if self.visiting.contains(&node) {
            let (kind, name) = match node {
                Node::Effect(name) => ("effect", name),
                Node::Ability(name) => ("ability", name),
            };
            anyhow::bail!("Reference cycle through {} '{}'", kind, name);
        }
        self.visiting.push(node);
        Ok(())
    }

    fn effect(&mut self, name: &str) -> LoadResult<Arc<EffectDefinition>> {
        if let Some(def) = self.effects.get(name) {
            return Ok(Arc::clone(def));
        }
        let data = *self
            .effect_data
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown effect '{}'", name))?;

        self.enter(Node::Effect(&data.name))?;
        let def = self.build_effect(data);
        self.visiting.pop();

        let def = def.map_err(|e| anyhow::anyhow!("Effect '{}': {}", data.name, e))?;
        self.effects.insert(data.name.clone(), Arc::clone(&def));
        Ok(def)
    }

    fn ability(&mut self, name: &str) -> LoadResult<Arc<AbilityDefinition>> {
        if let Some(def) = self.abilities.get(name) {
            return Ok(Arc::clone(def));
        }
        let data = *self
            .ability_data
            .get(name)
            .ok_or_else(|| anyhow::anyhow!("Unknown ability '{}'", name))?;

        self.enter(Node::Ability(&data.name))?;
        let def = self.build_ability(data);
        self.visiting.pop();

        let def = def.map_err(|e| anyhow::anyhow!("Ability '{}': {}", data.name, e))?;
        self.abilities.insert(data.name.clone(), Arc::clone(&def));
        Ok(def)
    }

    fn build_effect(&mut self, data: &'a EffectData) -> LoadResult<Arc<EffectDefinition>> {
        let mut builder = EffectDefinition::builder(&data.name, data.duration_policy)
            .duration(data.duration)
            .period(data.period)
            .stacking(data.stacking)
            .asset_tags(data.asset_tags.clone())
            .granted_tags(data.granted_tags.clone())
            .application_requirements(data.application_requirements.clone())
            .ongoing_requirements(data.ongoing_requirements.clone())
            .remove_effects_with_tags(data.remove_effects_with_tags.clone())
            .cue_tags(data.cue_tags.clone());

        for modifier in &data.modifiers {
            builder = builder.modifier(self.modifier(modifier)?);
        }

        if let Some(name) = &data.execution {
            let execution = self
                .registry
                .execution(name)
                .ok_or_else(|| anyhow::anyhow!("Unknown execution calculation '{}'", name))?;
            builder = builder.execution(execution);
        }

        for ability in &data.granted_abilities {
            builder = builder.grant_ability(self.ability(ability)?);
        }

        Ok(builder.build())
    }

    fn build_ability(&mut self, data: &'a AbilityData) -> LoadResult<Arc<AbilityDefinition>> {
        if !self.registry.has_behaviour(&data.behaviour) {
            anyhow::bail!("Unknown ability behaviour '{}'", data.behaviour);
        }
        let effects = data
            .effects
            .iter()
            .map(|name| self.effect(name))
            .collect::<LoadResult<Vec<_>>>()?;
        let args = BehaviourArgs {
            ability: &data.name,
            effects: &effects,
            params: &data.params,
        };
        let behaviour = self
            .registry
            .create_behaviour(&data.behaviour, &args)
            .ok_or_else(|| anyhow::anyhow!("Unknown ability behaviour '{}'", data.behaviour))?;

        let mut builder = AbilityDefinition::builder(&data.name, behaviour)
            .instancing(data.instancing)
            .net_execution(data.net_execution)
            .ability_tags(data.ability_tags.clone())
            .activation_required_tags(data.activation_required_tags.clone())
            .activation_blocked_tags(data.activation_blocked_tags.clone())
            .cancel_abilities_with_tag(data.cancel_abilities_with_tag.clone())
            .block_abilities_with_tag(data.block_abilities_with_tag.clone());

        if let Some(cost) = &data.cost {
            builder = builder.cost(self.effect(cost)?);
        }
        if let Some(cooldown) = &data.cooldown {
            builder = builder.cooldown(self.effect(cooldown)?);
        }

        Ok(builder.build())
    }

    fn modifier(&self, data: &ModifierData) -> LoadResult<Modifier> {
        let magnitude = match &data.magnitude {
            MagnitudeData::Constant(value) => Magnitude::from(*value),
            MagnitudeData::Scalable(value) => Magnitude::Scalable(*value),
            MagnitudeData::Custom(name) => Magnitude::Custom(
                self.registry
                    .magnitude(name)
                    .ok_or_else(|| anyhow::anyhow!("Unknown magnitude calculation '{}'", name))?,
            ),
        };
        Ok(Modifier::new(data.attribute.clone(), data.op, magnitude))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_resolves_to_empty_library() {
        let library = ContentLoader::load_str("()", &ContentRegistry::new()).unwrap();
        assert_eq!(library.effect_count(), 0);
        assert_eq!(library.ability_count(), 0);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let source = r#"(effects: [(name: "A"), (name: "A")])"#;
        let err = ContentLoader::load_str(source, &ContentRegistry::new()).unwrap_err();
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn unknown_execution_is_an_error() {
        let source = r#"(effects: [(name: "A", execution: Some("Missing"))])"#;
        let err = ContentLoader::load_str(source, &ContentRegistry::new()).unwrap_err();
        assert!(err.to_string().contains("Missing"));
    }
}
