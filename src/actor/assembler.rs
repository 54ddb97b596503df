//! Blueprint -> actor patch assembly
//!
//! The assembler is the only stage that sees both the blueprint and the
//! actor. It runs the synthesizers, merges their output with the actor's
//! current state and submits everything as one `ActorPatch`.

use super::abilities::merge_abilities;
use super::patch::ActorPatch;
use super::state::ActorState;
use super::store::ActorStore;
use crate::blueprints::{BlueprintDocument, BlueprintStore};
use crate::core::config::ForgeConfig;
use crate::core::error::{ForgeError, Result};
use crate::core::types::{as_number, first_present, number_value, ActorId, JsonMap};
use crate::rules::abilities::{AbilityCatalog, StaticAbilityCatalog};
use crate::rules::materials::{MaterialFormulas, MaterialTable};
use crate::rules::rank::{RankCurve, ThresholdRankCurve};
use crate::synthesis::health::{merge_health_parts, AnatomyHealthSynthesizer, MaterialFallback};
use crate::synthesis::inference::{KeywordPartInference, PartInference};
use crate::synthesis::progression::ProgressionPatchBuilder;
use crate::synthesis::weapons::NaturalWeaponSynthesizer;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

/// Where the blueprint comes from
#[derive(Debug, Clone)]
pub enum BlueprintSource {
    /// Look the key up in the store
    Key(String),
    /// Already loaded and validated
    Document(Box<BlueprintDocument>),
}

#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    /// Explicit actor name; wins over the naming policy
    pub name: Option<String>,
}

/// A built patch and what was papered over while building it
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Assembly {
    pub patch: ActorPatch,
    pub fallbacks: Vec<MaterialFallback>,
    pub missing_abilities: Vec<String>,
}

#[derive(Debug, Serialize)]
struct CreatureMeta<'a> {
    key: &'a str,
    label: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    category: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    size: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    nature: Option<&'a str>,
    version: u32,
    tags: &'a [String],
    source: &'a str,
}

/// Lowercased attribute key -> number; `{value|base|total}` objects unwrap
fn normalize_attributes(attributes: &JsonMap) -> JsonMap {
    attributes
        .iter()
        .filter_map(|(key, value)| {
            let key = key.trim().to_lowercase();
            if key.is_empty() {
                return None;
            }
            let score = match value {
                Value::Object(map) => first_present(map, &["value", "base", "total"]).and_then(as_number),
                other => as_number(other),
            }?;
            Some((key, number_value(score)))
        })
        .collect()
}

fn normalize_tags(tags: &[String]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// `placeholder` itself, optionally followed by a number or `(n)`
pub fn is_placeholder_name(name: &str, placeholder: &str) -> bool {
    let name = name.trim().to_lowercase();
    let placeholder = placeholder.trim().to_lowercase();
    let Some(rest) = name.strip_prefix(&placeholder) else {
        return false;
    };
    let rest = rest.trim();
    let digits = rest
        .strip_prefix('(')
        .and_then(|r| r.strip_suffix(')'))
        .unwrap_or(rest)
        .trim();
    digits.chars().all(|c| c.is_ascii_digit())
}

/// Compiles blueprints into actor patches
pub struct ActorPatchAssembler {
    config: ForgeConfig,
    materials: Arc<dyn MaterialFormulas>,
    ranks: Arc<dyn RankCurve>,
    abilities: Arc<dyn AbilityCatalog>,
    inference: Arc<dyn PartInference>,
}

impl ActorPatchAssembler {
    pub fn new(
        config: ForgeConfig,
        materials: Arc<dyn MaterialFormulas>,
        ranks: Arc<dyn RankCurve>,
        abilities: Arc<dyn AbilityCatalog>,
    ) -> Self {
        Self {
            config,
            materials,
            ranks,
            abilities,
            inference: Arc::new(KeywordPartInference::default()),
        }
    }

    /// Built-in materials, the configured rank curve and an empty catalog
    pub fn from_config(config: ForgeConfig) -> Self {
        let ranks = ThresholdRankCurve::new(config.rank_thresholds.clone());
        Self::new(
            config,
            Arc::new(MaterialTable::builtin()),
            Arc::new(ranks),
            Arc::new(StaticAbilityCatalog::new()),
        )
    }

    pub fn with_inference(mut self, inference: Arc<dyn PartInference>) -> Self {
        self.inference = inference;
        self
    }

    pub fn config(&self) -> &ForgeConfig {
        &self.config
    }

    /// Name to write, or `None` to keep the actor's current one
    pub fn resolve_name(
        &self,
        current: Option<&str>,
        blueprint: &BlueprintDocument,
        options: &AssembleOptions,
    ) -> Option<String> {
        if let Some(name) = options.name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            return Some(name.to_string());
        }

        let current = current.map(str::trim).unwrap_or("");
        let replace = current.is_empty()
            || current == self.config.default_actor_name
            || is_placeholder_name(current, &self.config.placeholder_name);

        if replace && current != blueprint.label {
            Some(blueprint.label.clone())
        } else {
            None
        }
    }

    /// Build the patch for `actor` without touching any store
    pub fn assemble(
        &self,
        actor: &ActorState,
        blueprint: &BlueprintDocument,
        options: &AssembleOptions,
    ) -> Result<Assembly> {
        let mut patch = ActorPatch::new();

        if let Some(name) = self.resolve_name(actor.name(), blueprint, options) {
            patch.set("name", Value::String(name));
        }
        patch.set("level", Value::from(blueprint.effective_level()));

        let tags = normalize_tags(&blueprint.tags);
        patch.set("attributes", Value::Object(normalize_attributes(&blueprint.attributes)));
        patch.set("tags", serde_json::to_value(&tags)?);
        patch.set("anatomy", serde_json::to_value(&blueprint.anatomy)?);

        let weapons = NaturalWeaponSynthesizer::new(self.inference.as_ref()).synthesize(blueprint);
        patch.set("naturalWeapons", serde_json::to_value(&weapons)?);

        let health = AnatomyHealthSynthesizer::new(self.materials.as_ref())
            .with_fallbacks(self.config.fallback_durability, self.config.fallback_potency)
            .synthesize(blueprint);
        patch.set(
            "health.parts",
            Value::Object(merge_health_parts(&health.parts, actor.health_parts())),
        );

        let creature = CreatureMeta {
            key: &blueprint.key,
            label: &blueprint.label,
            category: blueprint.category.as_deref(),
            size: blueprint.size.as_deref(),
            nature: blueprint.nature.as_deref(),
            version: blueprint.version,
            tags: &tags,
            source: blueprint.source.as_deref().unwrap_or("blueprint"),
        };
        patch.set("creature", serde_json::to_value(&creature)?);

        let species = blueprint.species.as_deref().unwrap_or(&blueprint.label);
        patch.set("details.species", Value::String(species.to_string()));
        if let Some(background) = &blueprint.background {
            patch.set("details.background", Value::String(background.clone()));
        }

        let abilities = merge_abilities(
            &blueprint.abilities,
            self.abilities.as_ref(),
            self.inference.as_ref(),
            actor.abilities(),
        );
        patch.set("abilities", Value::Object(abilities.abilities));

        let progression = ProgressionPatchBuilder::new(self.ranks.as_ref()).build(blueprint);
        for (path, value) in progression.entries() {
            patch.set(path, value);
        }

        Ok(Assembly {
            patch,
            fallbacks: health.fallbacks,
            missing_abilities: abilities.missing,
        })
    }

    /// Turn a key or document into a trusted blueprint
    pub async fn resolve(
        &self,
        store: &BlueprintStore,
        source: BlueprintSource,
    ) -> Result<BlueprintDocument> {
        match source {
            BlueprintSource::Key(key) => {
                let key = key.trim();
                if key.is_empty() {
                    return Err(ForgeError::invalid_blueprint(None, "key"));
                }
                store.get_blueprint_by_key(key).await
            }
            BlueprintSource::Document(document) => Ok(*document),
        }
    }

    /// Resolve, load the actor and build its patch without applying it
    pub async fn prepare(
        &self,
        store: &BlueprintStore,
        actors: &dyn ActorStore,
        actor_id: &ActorId,
        source: BlueprintSource,
        options: &AssembleOptions,
    ) -> Result<Assembly> {
        let blueprint = self.resolve(store, source).await?;
        let actor = actors.load_actor(actor_id).await?;
        let assembly = self.assemble(&actor, &blueprint, options)?;

        for fallback in &assembly.fallbacks {
            tracing::warn!(
                blueprint = %blueprint.key,
                part = %fallback.part,
                material = %fallback.material,
                error = %fallback.error,
                "Material formula failed, using fallback health"
            );
        }
        for key in &assembly.missing_abilities {
            tracing::warn!(blueprint = %blueprint.key, ability = %key, "Ability not in catalog");
        }

        Ok(assembly)
    }

    /// Compile the blueprint onto the actor as one atomic update
    pub async fn apply(
        &self,
        store: &BlueprintStore,
        actors: &dyn ActorStore,
        actor_id: &ActorId,
        source: BlueprintSource,
        options: &AssembleOptions,
    ) -> Result<Assembly> {
        let assembly = self.prepare(store, actors, actor_id, source, options).await?;
        actors.apply_patch(actor_id, &assembly.patch).await?;

        tracing::info!(actor = %actor_id, paths = assembly.patch.len(), "Blueprint applied to actor");
        Ok(assembly)
    }
}
