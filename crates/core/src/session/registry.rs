use std::{
    collections::HashMap,
    sync::{Arc, Weak},
};

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::{
    config::{AppConfig, BotConfig, Tuning},
    error::SessionError,
    models::{ActorId, MonsterCatalog, Player},
    presentation::ChatSurface,
};

use super::{
    handle::Session,
    models::{ControlId, SessionKey},
    scheduler::ActivityHandle,
    state::SessionState,
};

struct Entry {
    session: Session,
    _expiry: Option<ActivityHandle>,
}

/// All live sessions, keyed by the message their panel is attached to.
pub struct SessionRegistry {
    sessions: Mutex<HashMap<SessionKey, Entry>>,
    catalog: Arc<MonsterCatalog>,
    bot: BotConfig,
    tuning: Tuning,
}

impl SessionRegistry {
    /// Registry using the standard monster catalog.
    pub fn new(config: &AppConfig) -> Arc<Self> {
        Self::with_catalog(config, MonsterCatalog::standard())
    }

    pub fn with_catalog(config: &AppConfig, catalog: Arc<MonsterCatalog>) -> Arc<Self> {
        Arc::new(Self {
            sessions: Mutex::new(HashMap::new()),
            catalog,
            bot: config.bot.clone(),
            tuning: config.tuning,
        })
    }

    /// Whether a chat message is the trigger that opens a new session.
    pub fn should_open(&self, channel_id: u64, content: &str) -> bool {
        channel_id == self.bot.channel_id && content.trim() == self.bot.trigger
    }

    /// Start a session for `owner` and post its initial hunt panel.
    pub async fn open(
        self: &Arc<Self>,
        key: SessionKey,
        owner: ActorId,
        name: &str,
        surface: Arc<dyn ChatSurface>,
    ) -> Result<Session, SessionError> {
        let state = SessionState::new(key, Player::new(owner, name), self.tuning);
        self.insert(state, surface).await
    }

    /// Register a prepared session state, e.g. one with a seeded monster picker.
    pub async fn insert(
        self: &Arc<Self>,
        state: SessionState,
        surface: Arc<dyn ChatSurface>,
    ) -> Result<Session, SessionError> {
        let key = state.key();
        let owner = state.player().id;
        let session = Session::new(
            state,
            Arc::clone(&self.catalog),
            surface,
            self.bot.farewell.clone(),
        );
        {
            let mut sessions = self.sessions.lock();
            if sessions.contains_key(&key) {
                return Err(SessionError::AlreadyOpen(key));
            }
            let expiry = self
                .tuning
                .panel_lifetime()
                .map(|lifetime| Self::schedule_expiry(Arc::downgrade(self), key, lifetime));
            sessions.insert(
                key,
                Entry {
                    session: session.clone(),
                    _expiry: expiry,
                },
            );
        }
        session.attach(Arc::downgrade(self));
        info!(%key, %owner, "session opened");
        session.show().await;
        Ok(session)
    }

    /// Route a button press to its session. Rejections are expected and only logged.
    pub async fn dispatch(
        &self,
        key: SessionKey,
        control: ControlId,
        actor: ActorId,
    ) -> Result<(), SessionError> {
        let session = self.get(key).ok_or(SessionError::UnknownSession(key))?;
        if let Err(rejection) = session.press(control, actor).await {
            debug!(%key, %control, %actor, %rejection, "button press rejected");
        }
        Ok(())
    }

    /// Forget a session that ended on its own (cancelled or won).
    pub(crate) fn evict(&self, key: SessionKey) {
        if self.sessions.lock().remove(&key).is_some() {
            info!(%key, "session ended");
        }
    }

    pub fn get(&self, key: SessionKey) -> Option<Session> {
        self.sessions
            .lock()
            .get(&key)
            .map(|entry| entry.session.clone())
    }

    pub fn contains(&self, key: SessionKey) -> bool {
        self.sessions.lock().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.lock().is_empty()
    }

    pub fn keys(&self) -> Vec<SessionKey> {
        let mut keys: Vec<SessionKey> = self.sessions.lock().keys().copied().collect();
        keys.sort();
        keys
    }

    /// The panel message was deleted: end its session.
    pub async fn remove(&self, key: SessionKey) -> Option<Session> {
        let entry = self.sessions.lock().remove(&key)?;
        entry.session.close().await;
        Some(entry.session)
    }

    fn schedule_expiry(
        registry: Weak<Self>,
        key: SessionKey,
        lifetime: std::time::Duration,
    ) -> ActivityHandle {
        ActivityHandle::after(lifetime, async move {
            let Some(registry) = registry.upgrade() else {
                return;
            };
            if let Some(session) = registry.remove(key).await {
                info!(%key, "session panel expired");
                session.delete_panel().await;
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        models::MAX_LEVEL,
        session::Mode,
        test_support::{RecordingSurface, SurfaceEvent},
    };

    const OWNER: ActorId = ActorId(1);

    fn config() -> AppConfig {
        let mut config = AppConfig::default();
        config.bot.channel_id = 99;
        config
    }

    #[test]
    fn trigger_only_opens_in_configured_channel() {
        let registry = SessionRegistry::new(&config());
        assert!(registry.should_open(99, "!bot"));
        assert!(registry.should_open(99, " !bot \n"));
        assert!(!registry.should_open(98, "!bot"));
        assert!(!registry.should_open(99, "!bots"));
    }

    #[tokio::test(start_paused = true)]
    async fn open_posts_hunt_panel_and_rejects_duplicates() {
        let registry = SessionRegistry::new(&config());
        let surface = RecordingSurface::new();
        registry
            .open(SessionKey(5), OWNER, "Owner", surface.clone())
            .await
            .expect("first open");

        let panel = surface.last_panel().expect("initial panel");
        assert_eq!(panel.title, "Game Information");
        assert!(surface
            .last_controls()
            .expect("controls")
            .iter()
            .all(|(_, control)| control.enabled));

        let duplicate = registry
            .open(SessionKey(5), OWNER, "Owner", surface.clone())
            .await;
        assert_eq!(
            duplicate.map(|_| ()),
            Err(SessionError::AlreadyOpen(SessionKey(5)))
        );
        assert_eq!(registry.keys(), vec![SessionKey(5)]);
    }

    #[tokio::test(start_paused = true)]
    async fn sessions_are_isolated_per_message() {
        let registry = SessionRegistry::new(&config());
        let first = RecordingSurface::new();
        let second = RecordingSurface::new();
        registry
            .open(SessionKey(1), ActorId(1), "One", first.clone())
            .await
            .expect("open first");
        registry
            .open(SessionKey(2), ActorId(2), "Two", second.clone())
            .await
            .expect("open second");

        registry
            .dispatch(SessionKey(1), ControlId::Hunt, ActorId(1))
            .await
            .expect("dispatch");
        registry
            .dispatch(SessionKey(2), ControlId::Hunt, ActorId(1))
            .await
            .expect("dispatch");

        let one = registry.get(SessionKey(1)).expect("first session");
        let two = registry.get(SessionKey(2)).expect("second session");
        assert_eq!(one.mode().await, Mode::Hunting);
        assert_eq!(two.mode().await, Mode::Idle);
        assert_eq!(second.update_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn dispatch_to_unknown_session_fails() {
        let registry = SessionRegistry::new(&config());
        let result = registry
            .dispatch(SessionKey(3), ControlId::Work, OWNER)
            .await;
        assert_eq!(result, Err(SessionError::UnknownSession(SessionKey(3))));
    }

    #[tokio::test(start_paused = true)]
    async fn cancelled_sessions_leave_the_registry() {
        let registry = SessionRegistry::new(&config());
        let surface = RecordingSurface::new();
        registry
            .open(SessionKey(8), OWNER, "Owner", surface.clone())
            .await
            .expect("open");
        registry
            .dispatch(SessionKey(8), ControlId::Cancel, OWNER)
            .await
            .expect("dispatch");

        assert!(!registry.contains(SessionKey(8)));
        assert_eq!(surface.replies(), vec!["Goodbye!".to_string()]);
    }

    #[tokio::test(start_paused = true)]
    async fn removing_a_session_stops_its_loop() {
        let registry = SessionRegistry::new(&config());
        let surface = RecordingSurface::new();
        let session = registry
            .open(SessionKey(4), OWNER, "Owner", surface.clone())
            .await
            .expect("open");
        session.request_hunt(OWNER).await.expect("hunt");

        let removed = registry.remove(SessionKey(4)).await.expect("removed");
        let updates = surface.update_count();
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(removed.mode().await, Mode::Ended);
        assert_eq!(surface.update_count(), updates);
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn panels_expire_after_configured_lifetime() {
        let mut config = config();
        config.tuning.panel_lifetime_secs = 10;
        let registry = SessionRegistry::new(&config);
        let surface = RecordingSurface::new();
        registry
            .open(SessionKey(6), OWNER, "Owner", surface.clone())
            .await
            .expect("open");

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert!(registry.contains(SessionKey(6)));

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!registry.contains(SessionKey(6)));
        assert!(matches!(
            surface.events().last(),
            Some(SurfaceEvent::Delete)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn won_sessions_leave_without_another_press() {
        let registry = SessionRegistry::new(&config());
        let surface = RecordingSurface::new();
        let mut player = Player::new(OWNER, "Owner");
        player.level = MAX_LEVEL - 1;
        player.experience = 90;
        let state = SessionState::new(SessionKey(9), player, Tuning::default()).with_seed(3);
        let session = registry
            .insert(state, surface.clone())
            .await
            .expect("insert");

        session.request_hunt(OWNER).await.expect("hunt");
        tokio::time::sleep(Duration::from_secs(600)).await;

        assert_eq!(session.mode().await, Mode::Ended);
        assert_eq!(surface.replies(), vec!["You won!".to_string()]);
        assert!(!registry.contains(SessionKey(9)));
        assert!(registry.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn cancelling_through_the_session_also_evicts() {
        let registry = SessionRegistry::new(&config());
        let session = registry
            .open(SessionKey(10), OWNER, "Owner", RecordingSurface::new())
            .await
            .expect("open");

        session.request_cancel(OWNER).await.expect("cancel");
        assert!(!registry.contains(SessionKey(10)));
    }
}
