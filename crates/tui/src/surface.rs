use anyhow::{Context, Result};
use async_trait::async_trait;
use grindbot_core::{
    presentation::{ChatSurface, PanelContent},
    ControlSet, PanelKind, SessionKey,
};
use tokio::sync::mpsc;

/// What a session asked the terminal to show.
#[derive(Debug, Clone)]
pub enum SurfaceEvent {
    Panel {
        key: SessionKey,
        kind: PanelKind,
        panel: PanelContent,
        controls: ControlSet,
    },
    Reply {
        key: SessionKey,
        text: String,
    },
    Deleted {
        key: SessionKey,
    },
}

/// Chat surface backed by the terminal UI event loop.
///
/// The channel is unbounded: sessions send while holding their lock and the
/// UI may be waiting on that same lock to dispatch a key press.
pub struct TuiSurface {
    key: SessionKey,
    sender: mpsc::UnboundedSender<SurfaceEvent>,
}

impl TuiSurface {
    pub fn new(key: SessionKey, sender: mpsc::UnboundedSender<SurfaceEvent>) -> Self {
        Self { key, sender }
    }

    fn send(&self, event: SurfaceEvent) -> Result<()> {
        self.sender
            .send(event)
            .ok()
            .with_context(|| format!("terminal closed before session {} finished", self.key))
    }
}

#[async_trait]
impl ChatSurface for TuiSurface {
    async fn update(
        &self,
        kind: PanelKind,
        panel: &PanelContent,
        controls: &ControlSet,
    ) -> Result<()> {
        self.send(SurfaceEvent::Panel {
            key: self.key,
            kind,
            panel: panel.clone(),
            controls: controls.clone(),
        })
    }

    async fn reply(&self, text: &str) -> Result<()> {
        self.send(SurfaceEvent::Reply {
            key: self.key,
            text: text.to_string(),
        })
    }

    async fn delete(&self) -> Result<()> {
        self.send(SurfaceEvent::Deleted { key: self.key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn forwards_replies_with_session_key() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let surface = TuiSurface::new(SessionKey(3), tx);
        surface.reply("You won!").await.expect("send");

        match rx.recv().await {
            Some(SurfaceEvent::Reply { key, text }) => {
                assert_eq!(key, SessionKey(3));
                assert_eq!(text, "You won!");
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[tokio::test]
    async fn closed_terminal_is_an_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let surface = TuiSurface::new(SessionKey(1), tx);
        assert!(surface.delete().await.is_err());
    }
}
