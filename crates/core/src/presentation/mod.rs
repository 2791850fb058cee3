//! What the player sees: panel rendering and the chat surface it is drawn on.

mod panel;

use async_trait::async_trait;

use crate::session::{ControlSet, PanelKind};

pub use panel::{
    components, render, render_hunt_panel, render_work_panel, PanelContent, PanelField,
};

/// The chat message a session lives in.
///
/// A session owns exactly one panel message. `update` edits it in place,
/// `reply` posts a plain message in response to it.
#[async_trait]
pub trait ChatSurface: Send + Sync {
    /// Replace the panel content and its buttons.
    async fn update(
        &self,
        kind: PanelKind,
        panel: &PanelContent,
        controls: &ControlSet,
    ) -> anyhow::Result<()>;

    /// Post a plain message in response to the panel.
    async fn reply(&self, text: &str) -> anyhow::Result<()>;

    /// Remove the panel message.
    async fn delete(&self) -> anyhow::Result<()>;
}
