use std::sync::{Arc, Weak};

use once_cell::sync::OnceCell;
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::{
    activity::{hunt, work},
    error::Rejection,
    models::{ActorId, MonsterCatalog},
    presentation::{self, ChatSurface},
};

use super::{
    dispatch::Operation,
    models::{ActivityKind, ControlId, Mode, SessionKey, SessionSnapshot, WorkStatus},
    registry::SessionRegistry,
    state::SessionState,
};

struct Shared {
    key: SessionKey,
    owner: ActorId,
    state: Mutex<SessionState>,
    surface: Arc<dyn ChatSurface>,
    catalog: Arc<MonsterCatalog>,
    farewell: String,
    registry: OnceCell<Weak<SessionRegistry>>,
}

/// Cloneable handle to one player's live session.
///
/// Every operation holds the session lock across its redraw, so panel
/// updates reach the surface in the same order as the state changes.
#[derive(Clone)]
pub struct Session {
    shared: Arc<Shared>,
}

impl Session {
    pub fn new(
        state: SessionState,
        catalog: Arc<MonsterCatalog>,
        surface: Arc<dyn ChatSurface>,
        farewell: impl Into<String>,
    ) -> Self {
        Self {
            shared: Arc::new(Shared {
                key: state.key(),
                owner: state.player().id,
                state: Mutex::new(state),
                surface,
                catalog,
                farewell: farewell.into(),
                registry: OnceCell::new(),
            }),
        }
    }

    pub fn key(&self) -> SessionKey {
        self.shared.key
    }

    pub async fn snapshot(&self) -> SessionSnapshot {
        self.shared.state.lock().await.snapshot()
    }

    pub async fn mode(&self) -> Mode {
        self.shared.state.lock().await.mode()
    }

    /// Draw the current panel, e.g. right after the session is posted.
    pub async fn show(&self) {
        let state = self.shared.state.lock().await;
        self.redraw(&state).await;
    }

    /// Handle a button press on the session panel.
    pub async fn press(&self, control: ControlId, actor: ActorId) -> Result<(), Rejection> {
        let mut state = self.shared.state.lock().await;
        state.authorize(actor)?;
        if !state.controls().is_enabled(control) {
            return Err(Rejection::ControlDisabled(control));
        }
        let operation = Operation::route(control, state.mode());
        self.apply(&mut state, operation).await
    }

    pub async fn request_work(&self, actor: ActorId) -> Result<(), Rejection> {
        self.perform(actor, Operation::StartWork).await
    }

    pub async fn stop_work(&self, actor: ActorId) -> Result<(), Rejection> {
        self.perform(actor, Operation::StopWork).await
    }

    pub async fn request_hunt(&self, actor: ActorId) -> Result<(), Rejection> {
        self.perform(actor, Operation::StartHunt).await
    }

    pub async fn stop_hunt(&self, actor: ActorId) -> Result<(), Rejection> {
        self.perform(actor, Operation::StopHunt).await
    }

    pub async fn request_cancel(&self, actor: ActorId) -> Result<(), Rejection> {
        self.perform(actor, Operation::Cancel).await
    }

    /// The panel was removed: stop any loop and end the session quietly.
    pub async fn close(&self) {
        let mut state = self.shared.state.lock().await;
        state.close();
        info!(key = %self.shared.key, "session closed");
    }

    /// Remove the panel from the chat.
    pub async fn delete_panel(&self) {
        if let Err(err) = self.shared.surface.delete().await {
            warn!(key = %self.shared.key, ?err, "failed to delete panel");
        }
    }

    async fn perform(&self, actor: ActorId, operation: Operation) -> Result<(), Rejection> {
        let mut state = self.shared.state.lock().await;
        state.authorize(actor)?;
        self.apply(&mut state, operation).await
    }

    async fn apply(&self, state: &mut SessionState, operation: Operation) -> Result<(), Rejection> {
        let result = match operation {
            Operation::StartWork => state.begin_work(),
            Operation::StopWork => state.end_work(WorkStatus::Ready),
            Operation::StartHunt => state.begin_hunt(),
            Operation::StopHunt => state.end_hunt(),
            Operation::Cancel => state.cancel(),
        };

        match result {
            Ok(()) => {
                state.notice = None;
                info!(
                    key = %self.shared.key,
                    ?operation,
                    mode = %state.mode(),
                    "session transition"
                );
            }
            Err(rejection) if !rejection.is_reported() => {
                debug!(key = %self.shared.key, ?operation, %rejection, "operation ignored");
                return Err(rejection);
            }
            Err(rejection @ Rejection::WrongMode { .. }) => {
                state.notice = Some(rejection.to_string());
            }
            Err(rejection) => {
                debug!(key = %self.shared.key, ?operation, %rejection, "precondition not met");
            }
        }

        self.redraw(state).await;

        if result.is_ok() {
            match operation {
                Operation::StartWork => {
                    let session = self.clone();
                    state
                        .activity
                        .start(ActivityKind::Working, move |token| work::run(session, token));
                }
                Operation::StartHunt => {
                    let session = self.clone();
                    state
                        .activity
                        .start(ActivityKind::Hunting, move |token| hunt::run(session, token));
                }
                Operation::Cancel => {
                    self.reply(&self.shared.farewell).await;
                    self.leave_registry();
                }
                Operation::StopWork | Operation::StopHunt => {}
            }
        }
        result
    }

    /// Remember the registry holding this session, so an ending can evict it.
    pub(crate) fn attach(&self, registry: Weak<SessionRegistry>) {
        if self.shared.registry.set(registry).is_err() {
            debug!(key = %self.shared.key, "session already registered");
        }
    }

    /// Drop this session from its registry once it has ended.
    pub(crate) fn leave_registry(&self) {
        if let Some(registry) = self.shared.registry.get().and_then(Weak::upgrade) {
            registry.evict(self.shared.key);
        }
    }

    pub(crate) fn catalog(&self) -> &MonsterCatalog {
        &self.shared.catalog
    }

    /// Lock the state for a loop step, or `None` once the loop was cancelled.
    ///
    /// Checked again after the lock is acquired: a stop that won the lock
    /// first must not be followed by one more mutation.
    pub(crate) async fn lock_live(
        &self,
        token: &CancellationToken,
    ) -> Option<MutexGuard<'_, SessionState>> {
        if token.is_cancelled() {
            return None;
        }
        let guard = self.shared.state.lock().await;
        (!token.is_cancelled()).then_some(guard)
    }

    pub(crate) async fn redraw(&self, state: &SessionState) {
        let panel = presentation::render(state);
        if let Err(err) = self
            .shared
            .surface
            .update(state.displayed(), &panel, state.controls())
            .await
        {
            warn!(key = %self.shared.key, ?err, "failed to update panel");
        }
    }

    pub(crate) async fn reply(&self, text: &str) {
        if let Err(err) = self.shared.surface.reply(text).await {
            warn!(key = %self.shared.key, ?err, "failed to send reply");
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("key", &self.shared.key)
            .field("owner", &self.shared.owner)
            .finish()
    }
}
