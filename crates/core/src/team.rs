//! Skill requirements and teams.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entity::{Skill, SkillMap};
use crate::error::ModelError;

/// Nonempty set of skills a team must cover.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeSet<Skill>", into = "BTreeSet<Skill>")]
pub struct SkillRequirement(BTreeSet<Skill>);

impl SkillRequirement {
    /// Create a requirement; fails when no skill is given.
    pub fn new<I, S>(skills: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = S>,
        S: Into<Skill>,
    {
        let skills: BTreeSet<Skill> = skills.into_iter().map(Into::into).collect();
        Self::try_from(skills)
    }

    /// Required skills in ascending order.
    pub fn skills(&self) -> &BTreeSet<Skill> {
        &self.0
    }

    /// Whether `skill` is required.
    pub fn contains(&self, skill: &str) -> bool {
        self.0.contains(skill)
    }

    /// Number of required skills.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Always false for a validated requirement.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl TryFrom<BTreeSet<Skill>> for SkillRequirement {
    type Error = ModelError;

    fn try_from(skills: BTreeSet<Skill>) -> Result<Self, Self::Error> {
        if skills.is_empty() {
            return Err(ModelError::EmptyRequirement);
        }
        Ok(Self(skills))
    }
}

impl From<SkillRequirement> for BTreeSet<Skill> {
    fn from(requirement: SkillRequirement) -> Self {
        requirement.0
    }
}

/// Set of entity ids selected for a task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Team(BTreeSet<String>);

impl Team {
    /// Create an empty team.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member; returns false when already present.
    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    /// Whether `id` is a member.
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    /// Members in ascending order.
    pub fn members(&self) -> &BTreeSet<String> {
        &self.0
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = &String> + '_ {
        self.0.iter()
    }

    /// Team size.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the team has no members.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Skills the members offer, restricted to `requirement`.
    pub fn covered_skills(&self, skills: &SkillMap, requirement: &SkillRequirement) -> BTreeSet<Skill> {
        self.0
            .iter()
            .filter_map(|id| skills.skills_of(id))
            .flatten()
            .filter(|skill| requirement.contains(skill))
            .cloned()
            .collect()
    }

    /// Whether the members jointly cover every required skill.
    pub fn covers(&self, skills: &SkillMap, requirement: &SkillRequirement) -> bool {
        self.covered_skills(skills, requirement).len() == requirement.len()
    }
}

impl FromIterator<String> for Team {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> FromIterator<&'a str> for Team {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        Self(iter.into_iter().map(str::to_string).collect())
    }
}

impl IntoIterator for Team {
    type Item = String;
    type IntoIter = std::collections::btree_set::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl fmt::Display for Team {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, member) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{member}")?;
        }
        write!(f, "}}")
    }
}
