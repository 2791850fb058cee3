//! The player character and its progression rules.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest level a player can reach; reaching it wins the game.
pub const MAX_LEVEL: u32 = 4;
/// Health ceiling for every player.
pub const MAX_HEALTH: u32 = 250;
/// Experience needed to gain one level.
pub const LEVEL_UP_EXPERIENCE: u32 = 100;
/// Level a fresh player starts at.
pub const STARTING_LEVEL: u32 = 1;

/// Opaque chat-platform user id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActorId(pub u64);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Result of granting experience to a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LevelChange {
    /// Experience grew without crossing the threshold.
    None,
    /// The player reached the given level.
    LeveledUp(u32),
    /// The player reached [`MAX_LEVEL`].
    ReachedMaxLevel,
}

/// The adventurer owned by a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Chat user that owns the player.
    pub id: ActorId,
    /// Display name shown on the hunt panel.
    pub name: String,
    /// Current level, `1..=MAX_LEVEL`.
    pub level: u32,
    /// Experience towards the next level, below [`LEVEL_UP_EXPERIENCE`].
    pub experience: u32,
    /// Currency earned by hunting and spent by working.
    pub silver: u32,
    /// Current health, never above `max_health`.
    pub health: u32,
    /// Health ceiling.
    pub max_health: u32,
}

impl Player {
    /// Create a level one player with full health and no silver.
    pub fn new(id: ActorId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            level: STARTING_LEVEL,
            experience: 0,
            silver: 0,
            health: MAX_HEALTH,
            max_health: MAX_HEALTH,
        }
    }

    /// Whether working would restore nothing.
    pub fn is_at_max_health(&self) -> bool {
        self.health >= self.max_health
    }

    /// Restore health, clamped to `max_health`, returning the amount gained.
    pub fn restore_health(&mut self, amount: u32) -> u32 {
        let before = self.health;
        self.health = self.health.saturating_add(amount).min(self.max_health);
        self.health - before
    }

    /// Restore health to the ceiling.
    pub fn heal_to_full(&mut self) {
        self.health = self.max_health;
    }

    /// Apply damage and report whether health was depleted.
    pub fn take_damage(&mut self, amount: u32) -> bool {
        self.health = self.health.saturating_sub(amount);
        self.health == 0
    }

    /// Deduct silver; refuses without side effects when the purse is short.
    pub fn spend_silver(&mut self, amount: u32) -> bool {
        if self.silver < amount {
            return false;
        }
        self.silver -= amount;
        true
    }

    /// Add looted silver.
    pub fn earn_silver(&mut self, amount: u32) {
        self.silver = self.silver.saturating_add(amount);
    }

    /// Grant experience, rolling over into a level when the threshold is met.
    pub fn gain_experience(&mut self, amount: u32) -> LevelChange {
        if self.level >= MAX_LEVEL {
            return LevelChange::ReachedMaxLevel;
        }
        self.experience += amount;
        if self.experience < LEVEL_UP_EXPERIENCE {
            return LevelChange::None;
        }
        self.experience -= LEVEL_UP_EXPERIENCE;
        self.level += 1;
        if self.level >= MAX_LEVEL {
            LevelChange::ReachedMaxLevel
        } else {
            LevelChange::LeveledUp(self.level)
        }
    }
}
