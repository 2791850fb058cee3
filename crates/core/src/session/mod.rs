#![allow(missing_docs)]

//! Per-player session state machine, its background activities and the registry.

mod dispatch;
mod handle;
mod models;
mod registry;
mod scheduler;
mod state;

pub use dispatch::Operation;
pub use handle::Session;
pub use models::{
    ActivityKind, ControlId, ControlSet, ControlState, HuntStatus, Mode, PanelKind,
    ParseControlIdError, SessionKey, SessionSnapshot, WorkBout, WorkStatus,
};
pub use registry::SessionRegistry;
pub use scheduler::{pause, ActivityHandle};
pub use state::SessionState;
