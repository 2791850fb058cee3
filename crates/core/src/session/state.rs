//! Synchronous transition rules of a session.

use chrono::{DateTime, Utc};
use rand::{rngs::StdRng, SeedableRng};
use tracing::debug;

use crate::{
    config::Tuning,
    error::Rejection,
    models::{ActorId, Monster, Player},
};

use super::{
    models::{
        ActivityKind, ControlId, ControlSet, HuntStatus, Mode, PanelKind, SessionKey,
        SessionSnapshot, WorkBout, WorkStatus,
    },
    scheduler::ActivityHandle,
};

/// Everything a single player's session owns.
///
/// Transition methods validate the current mode and update the controls and
/// panel state in one step; they never await. The async [`super::Session`]
/// wraps them with locking, redraws and the background loops.
#[derive(Debug)]
pub struct SessionState {
    pub(crate) key: SessionKey,
    pub(crate) opened_at: DateTime<Utc>,
    pub(crate) player: Player,
    pub(crate) mode: Mode,
    pub(crate) encounter: Option<Monster>,
    pub(crate) bout: WorkBout,
    pub(crate) monsters_defeated: u32,
    pub(crate) controls: ControlSet,
    pub(crate) work_status: WorkStatus,
    pub(crate) hunt_status: HuntStatus,
    pub(crate) displayed: PanelKind,
    pub(crate) notice: Option<String>,
    pub(crate) tuning: Tuning,
    pub(crate) rng: StdRng,
    pub(crate) activity: ActivityHandle,
}

impl SessionState {
    /// Fresh idle session showing the hunt panel, as posted in reply to the trigger.
    pub fn new(key: SessionKey, player: Player, tuning: Tuning) -> Self {
        Self {
            key,
            opened_at: Utc::now(),
            player,
            mode: Mode::Idle,
            encounter: None,
            bout: WorkBout::default(),
            monsters_defeated: 0,
            controls: ControlSet::default(),
            work_status: WorkStatus::Ready,
            hunt_status: HuntStatus::Blank,
            displayed: PanelKind::Hunt,
            notice: None,
            tuning,
            rng: StdRng::from_entropy(),
            activity: ActivityHandle::default(),
        }
    }

    /// Seed the monster picker, for reproducible hunts.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn key(&self) -> SessionKey {
        self.key
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn encounter(&self) -> Option<&Monster> {
        self.encounter.as_ref()
    }

    pub fn bout(&self) -> WorkBout {
        self.bout
    }

    pub fn monsters_defeated(&self) -> u32 {
        self.monsters_defeated
    }

    pub fn controls(&self) -> &ControlSet {
        &self.controls
    }

    pub fn work_status(&self) -> WorkStatus {
        self.work_status
    }

    pub fn hunt_status(&self) -> HuntStatus {
        self.hunt_status
    }

    pub fn displayed(&self) -> PanelKind {
        self.displayed
    }

    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn is_owner(&self, actor: ActorId) -> bool {
        self.player.id == actor
    }

    /// Gate every interaction: only the owner of a live session may act.
    pub fn authorize(&self, actor: ActorId) -> Result<(), Rejection> {
        if !self.is_owner(actor) {
            return Err(Rejection::NotOwner);
        }
        if self.mode == Mode::Ended {
            return Err(Rejection::SessionEnded);
        }
        Ok(())
    }

    /// Switch to the work panel and, if the player can pay and needs healing, start working.
    pub fn begin_work(&mut self) -> Result<(), Rejection> {
        if self.mode != Mode::Idle {
            return Err(Rejection::WrongMode {
                requested: ActivityKind::Working,
                mode: self.mode,
            });
        }
        self.displayed = PanelKind::Work;
        self.work_status = WorkStatus::Ready;
        self.bout = WorkBout::default();

        if self.player.is_at_max_health() {
            self.work_status = WorkStatus::AlreadyAtMaxHealth;
            return Err(Rejection::AlreadyAtMaxHealth);
        }
        if self.player.silver < self.tuning.work_unit_price() {
            self.work_status = WorkStatus::NotEnoughSilverToStart;
            return Err(Rejection::NotEnoughSilver);
        }

        self.mode = Mode::Working;
        self.controls.set_label(ControlId::Work, "Stop Work");
        self.controls
            .set_all_enabled(&[ControlId::Hunt, ControlId::Cancel], false);
        self.work_status = WorkStatus::Working(0);
        Ok(())
    }

    /// Leave working mode, keeping the bout totals on the panel.
    ///
    /// `status` becomes the panel title; manual stops pass [`WorkStatus::Ready`].
    pub fn end_work(&mut self, status: WorkStatus) -> Result<(), Rejection> {
        if self.mode != Mode::Working {
            return Err(Rejection::NotActive(ActivityKind::Working));
        }
        self.activity.cancel();
        self.mode = Mode::Idle;
        self.controls
            .set_label(ControlId::Work, ControlId::Work.default_label());
        self.controls
            .set_all_enabled(&[ControlId::Hunt, ControlId::Cancel], true);
        self.work_status = status;
        self.displayed = PanelKind::Work;
        Ok(())
    }

    pub fn begin_hunt(&mut self) -> Result<(), Rejection> {
        if self.mode != Mode::Idle {
            return Err(Rejection::WrongMode {
                requested: ActivityKind::Hunting,
                mode: self.mode,
            });
        }
        self.mode = Mode::Hunting;
        self.encounter = None;
        self.hunt_status = HuntStatus::Blank;
        self.displayed = PanelKind::Hunt;
        self.controls.set_label(ControlId::Hunt, "Stop Hunting");
        self.controls
            .set_all_enabled(&[ControlId::Work, ControlId::Cancel], false);
        Ok(())
    }

    /// Leave hunting mode, abandoning any engaged monster.
    pub fn end_hunt(&mut self) -> Result<(), Rejection> {
        if self.mode != Mode::Hunting {
            return Err(Rejection::NotActive(ActivityKind::Hunting));
        }
        self.activity.cancel();
        self.mode = Mode::Idle;
        self.controls
            .set_label(ControlId::Hunt, ControlId::Hunt.default_label());
        self.controls
            .set_all_enabled(&[ControlId::Work, ControlId::Cancel], true);
        self.leave_encounter();
        self.bout = WorkBout::default();
        self.displayed = PanelKind::Hunt;
        Ok(())
    }

    /// End the session for good; the caller sends the farewell.
    pub fn cancel(&mut self) -> Result<(), Rejection> {
        if self.mode == Mode::Ended {
            return Err(Rejection::SessionEnded);
        }
        self.activity.cancel();
        self.controls.set_all_enabled(&ControlId::ALL, false);
        self.leave_encounter();
        self.displayed = PanelKind::Hunt;
        self.mode = Mode::Ended;
        Ok(())
    }

    /// The panel went away underneath the session.
    pub(crate) fn close(&mut self) {
        self.activity.cancel();
        self.encounter = None;
        self.mode = Mode::Ended;
    }

    /// Drop the engaged clone. The template it came from was never touched.
    pub(crate) fn leave_encounter(&mut self) {
        if let Some(monster) = self.encounter.take() {
            debug!(key = %self.key, monster = %monster.name, "encounter abandoned");
        }
        self.hunt_status = HuntStatus::Blank;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            key: self.key,
            opened_at: self.opened_at,
            mode: self.mode,
            player: self.player.clone(),
            encounter: self.encounter.clone(),
            bout: self.bout,
            monsters_defeated: self.monsters_defeated,
            controls: self.controls.clone(),
            displayed: self.displayed,
            activity_running: self.activity.is_running(),
        }
    }
}
