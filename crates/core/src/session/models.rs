#![allow(missing_docs)]

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::{Monster, Player};

/// Id of the chat message a session is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey(pub u64);

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mutually exclusive activity modes of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Idle,
    Working,
    Hunting,
    /// Terminal: cancelled, won, or the panel was removed.
    Ended,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Idle => "idle",
            Mode::Working => "working",
            Mode::Hunting => "hunting",
            Mode::Ended => "ended",
        })
    }
}

/// The two background activities a session can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    Working,
    Hunting,
    /// One-shot delayed callback, e.g. panel expiry.
    Timer,
}

impl fmt::Display for ActivityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityKind::Working => "working",
            ActivityKind::Hunting => "hunting",
            ActivityKind::Timer => "waiting",
        })
    }
}

/// Buttons attached to a session panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlId {
    Work,
    Hunt,
    Cancel,
}

impl ControlId {
    pub const ALL: [ControlId; 3] = [ControlId::Work, ControlId::Hunt, ControlId::Cancel];

    /// Stable id used as the button's custom id on the chat platform.
    pub fn as_str(self) -> &'static str {
        match self {
            ControlId::Work => "work",
            ControlId::Hunt => "hunt",
            ControlId::Cancel => "cancel",
        }
    }

    /// Label shown while no activity owns the control.
    pub fn default_label(self) -> &'static str {
        match self {
            ControlId::Work => "Work",
            ControlId::Hunt => "Start Hunting",
            ControlId::Cancel => "Cancel",
        }
    }
}

impl fmt::Display for ControlId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown control id '{0}'")]
pub struct ParseControlIdError(pub String);

impl FromStr for ControlId {
    type Err = ParseControlIdError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        ControlId::ALL
            .into_iter()
            .find(|id| id.as_str() == value.trim())
            .ok_or_else(|| ParseControlIdError(value.to_string()))
    }
}

/// Label and availability of one button.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlState {
    pub label: String,
    pub enabled: bool,
}

/// The three buttons of a session panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSet {
    work: ControlState,
    hunt: ControlState,
    cancel: ControlState,
}

impl Default for ControlSet {
    fn default() -> Self {
        let initial = |id: ControlId| ControlState {
            label: id.default_label().to_string(),
            enabled: true,
        };
        Self {
            work: initial(ControlId::Work),
            hunt: initial(ControlId::Hunt),
            cancel: initial(ControlId::Cancel),
        }
    }
}

impl ControlSet {
    pub fn get(&self, id: ControlId) -> &ControlState {
        match id {
            ControlId::Work => &self.work,
            ControlId::Hunt => &self.hunt,
            ControlId::Cancel => &self.cancel,
        }
    }

    fn get_mut(&mut self, id: ControlId) -> &mut ControlState {
        match id {
            ControlId::Work => &mut self.work,
            ControlId::Hunt => &mut self.hunt,
            ControlId::Cancel => &mut self.cancel,
        }
    }

    pub fn is_enabled(&self, id: ControlId) -> bool {
        self.get(id).enabled
    }

    pub fn set_enabled(&mut self, id: ControlId, enabled: bool) {
        self.get_mut(id).enabled = enabled;
    }

    /// Enable or disable several controls at once.
    pub fn set_all_enabled(&mut self, ids: &[ControlId], enabled: bool) {
        for id in ids {
            self.set_enabled(*id, enabled);
        }
    }

    pub fn set_label(&mut self, id: ControlId, label: impl Into<String>) {
        self.get_mut(id).label = label.into();
    }

    pub fn iter(&self) -> impl Iterator<Item = (ControlId, &ControlState)> {
        ControlId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

/// Accumulators for one continuous run of the work loop.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkBout {
    /// Completed work units.
    pub units: u32,
    /// Seconds of "Counter" bought.
    pub counter: u32,
    pub silver_spent: u32,
    pub health_gained: u32,
}

/// Title state of the work panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkStatus {
    Ready,
    /// Animation frame `0..3` of the current unit.
    Working(u8),
    NotEnoughSilverToStart,
    AlreadyAtMaxHealth,
    ReachedMaxHealth,
    NotEnoughSilverToContinue,
}

/// State of the monster field on the hunt panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HuntStatus {
    Blank,
    /// Animation frame `0..3` of the monster search.
    Searching(u8),
    Engaged,
}

/// Which panel the session message currently shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Work,
    Hunt,
}

/// Point-in-time copy of a session for front-ends and tests.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub key: SessionKey,
    pub opened_at: DateTime<Utc>,
    pub mode: Mode,
    pub player: Player,
    pub encounter: Option<Monster>,
    pub bout: WorkBout,
    pub monsters_defeated: u32,
    pub controls: ControlSet,
    pub displayed: PanelKind,
    pub activity_running: bool,
}
