//! Monsters and the shared template catalog.

use std::sync::Arc;

use once_cell::sync::Lazy;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Health granted per monster level.
pub const HEALTH_PER_LEVEL: u32 = 20;

/// A monster template or a live encounter cloned from one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    /// Display name.
    pub name: String,
    /// Tier; matched against the hunting player's level.
    pub level: u32,
    /// Health ceiling, `HEALTH_PER_LEVEL × level`.
    pub max_health: u32,
    /// Remaining health of this instance.
    pub health: u32,
}

impl Monster {
    /// Create a monster at full health.
    pub fn new(name: impl Into<String>, level: u32) -> Self {
        let max_health = HEALTH_PER_LEVEL * level;
        Self {
            name: name.into(),
            level,
            max_health,
            health: max_health,
        }
    }

    /// Apply a hit and report whether the monster was defeated.
    pub fn take_hit(&mut self, damage: u32) -> bool {
        self.health = self.health.saturating_sub(damage);
        self.health == 0
    }
}

static STANDARD_CATALOG: Lazy<Arc<MonsterCatalog>> = Lazy::new(|| {
    Arc::new(MonsterCatalog::new(vec![
        Monster::new("Rat", 1),
        Monster::new("Boar", 2),
        Monster::new("Goblin", 3),
    ]))
});

/// Immutable set of monster templates shared by every session.
///
/// Encounters are always clones; a template is never handed out mutably, so
/// damage dealt during one hunt can't leak into another.
#[derive(Debug, Clone)]
pub struct MonsterCatalog {
    templates: Vec<Monster>,
}

impl MonsterCatalog {
    /// Catalog over the given templates.
    pub fn new(templates: Vec<Monster>) -> Self {
        Self { templates }
    }

    /// Process-wide default catalog: Rat, Boar and Goblin.
    pub fn standard() -> Arc<Self> {
        Arc::clone(&STANDARD_CATALOG)
    }

    /// All templates, untouched by any hunt.
    pub fn templates(&self) -> &[Monster] {
        &self.templates
    }

    /// Pick a template of the requested level uniformly and return a fresh copy.
    pub fn spawn(&self, level: u32, rng: &mut impl Rng) -> Option<Monster> {
        let candidates: Vec<&Monster> = self
            .templates
            .iter()
            .filter(|monster| monster.level == level)
            .collect();
        candidates.choose(rng).map(|monster| Monster::clone(monster))
    }
}
