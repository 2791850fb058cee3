//! In-memory chat surface for session tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::{
    presentation::{ChatSurface, PanelContent},
    session::{ControlSet, PanelKind},
};

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum SurfaceEvent {
    Update {
        kind: PanelKind,
        panel: PanelContent,
        controls: ControlSet,
    },
    Reply(String),
    Delete,
}

/// Records every call in order.
#[derive(Debug, Default)]
pub(crate) struct RecordingSurface {
    events: Mutex<Vec<SurfaceEvent>>,
}

impl RecordingSurface {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn events(&self) -> Vec<SurfaceEvent> {
        self.events.lock().clone()
    }

    pub(crate) fn panels(&self) -> Vec<PanelContent> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Update { panel, .. } => Some(panel.clone()),
                _ => None,
            })
            .collect()
    }

    pub(crate) fn last_panel(&self) -> Option<PanelContent> {
        self.panels().pop()
    }

    pub(crate) fn last_controls(&self) -> Option<ControlSet> {
        self.events.lock().iter().rev().find_map(|event| match event {
            SurfaceEvent::Update { controls, .. } => Some(controls.clone()),
            _ => None,
        })
    }

    pub(crate) fn update_count(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|event| matches!(event, SurfaceEvent::Update { .. }))
            .count()
    }

    pub(crate) fn replies(&self) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SurfaceEvent::Reply(text) => Some(text.clone()),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl ChatSurface for RecordingSurface {
    async fn update(
        &self,
        kind: PanelKind,
        panel: &PanelContent,
        controls: &ControlSet,
    ) -> anyhow::Result<()> {
        self.events.lock().push(SurfaceEvent::Update {
            kind,
            panel: panel.clone(),
            controls: controls.clone(),
        });
        Ok(())
    }

    async fn reply(&self, text: &str) -> anyhow::Result<()> {
        self.events.lock().push(SurfaceEvent::Reply(text.to_string()));
        Ok(())
    }

    async fn delete(&self) -> anyhow::Result<()> {
        self.events.lock().push(SurfaceEvent::Delete);
        Ok(())
    }
}
