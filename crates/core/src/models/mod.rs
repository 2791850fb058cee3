//! Shared domain models.

mod monster;
mod player;

pub use monster::{Monster, MonsterCatalog};
pub use player::{
    ActorId, LevelChange, Player, LEVEL_UP_EXPERIENCE, MAX_HEALTH, MAX_LEVEL, STARTING_LEVEL,
};
