//! Background loops run while a session is working or hunting.

pub mod hunt;
pub mod work;

pub use hunt::{resolve_battle, BattleOutcome};
pub use work::WorkStep;

/// Animation frames shown per work unit and per monster search.
pub const ANIMATION_FRAMES: u8 = 3;
