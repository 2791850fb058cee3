#![warn(clippy::all, missing_docs)]

//! Core game logic for the grindbot chat RPG.
//!
//! This crate hosts the player and monster models, the per-player session
//! state machine with its work and hunt loops, the session registry, and
//! the panel rendering consumed by chat front-ends.

pub mod activity;
pub mod config;
pub mod error;
pub mod models;
pub mod presentation;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use config::{AppConfig, Tuning};
pub use error::{Rejection, SessionError};
pub use models::{ActorId, Monster, MonsterCatalog, Player};
pub use presentation::{ChatSurface, PanelContent, PanelField};
pub use session::{
    ControlId, ControlSet, Mode, PanelKind, Session, SessionKey, SessionRegistry, SessionSnapshot,
};
