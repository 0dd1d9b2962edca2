//! Skill-bearing entities and the entity → skill map.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::ModelError;

/// Skill identifier.
pub type Skill = String;

/// A skill-bearing node of the collaboration network.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier (also the graph node id)
    pub id: String,

    /// Skills the entity offers
    pub skills: BTreeSet<Skill>,
}

impl Entity {
    /// Create an entity.
    pub fn new<I, S>(id: impl Into<String>, skills: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Skill>,
    {
        Self {
            id: id.into(),
            skills: skills.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the entity offers `skill`.
    pub fn has_skill(&self, skill: &str) -> bool {
        self.skills.contains(skill)
    }
}

/// Read-only map from entity id to skills.
///
/// Iteration follows insertion order. Greedy selectors rely on that order to
/// break ties, so it must be the order the entities were ingested in.
#[derive(Debug, Clone, Default)]
pub struct SkillMap {
    entities: Vec<Entity>,
    index: HashMap<String, usize>,
}

impl SkillMap {
    /// Build a map, rejecting blank and duplicate ids.
    pub fn from_entities(entities: impl IntoIterator<Item = Entity>) -> Result<Self, ModelError> {
        let mut map = Self::default();
        for entity in entities {
            if entity.id.trim().is_empty() {
                return Err(ModelError::BlankEntityId);
            }
            if map.index.contains_key(&entity.id) {
                return Err(ModelError::DuplicateEntity(entity.id));
            }
            map.index.insert(entity.id.clone(), map.entities.len());
            map.entities.push(entity);
        }
        Ok(map)
    }

    /// Look up an entity by id.
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.index.get(id).map(|&i| &self.entities[i])
    }

    /// Skills of `id`, if the entity is known.
    pub fn skills_of(&self, id: &str) -> Option<&BTreeSet<Skill>> {
        self.get(id).map(|entity| &entity.skills)
    }

    /// Whether `id` is a known entity.
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Entities in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &Entity> + '_ {
        self.entities.iter()
    }

    /// Number of entities.
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the map holds no entities.
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities offering `skill`, in insertion order.
    pub fn offering<'a>(&'a self, skill: &'a str) -> impl Iterator<Item = &'a Entity> + 'a {
        self.entities.iter().filter(move |entity| entity.has_skill(skill))
    }

    /// Union of all skills offered by any entity.
    pub fn all_skills(&self) -> BTreeSet<Skill> {
        self.entities
            .iter()
            .flat_map(|entity| entity.skills.iter().cloned())
            .collect()
    }

    /// Keep only the entities matching `predicate`, preserving order.
    pub fn filtered(&self, mut predicate: impl FnMut(&Entity) -> bool) -> SkillMap {
        let kept: Vec<Entity> = self
            .entities
            .iter()
            .filter(|entity| predicate(entity))
            .cloned()
            .collect();
        let index = kept
            .iter()
            .enumerate()
            .map(|(i, entity)| (entity.id.clone(), i))
            .collect();
        SkillMap {
            entities: kept,
            index,
        }
    }
}
