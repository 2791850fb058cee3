//! Hunting: search for a monster of the player's level and fight it.

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::{
    models::{LevelChange, Monster, MonsterCatalog, Player},
    session::{pause, ControlId, HuntStatus, Mode, Session, SessionState},
};

use super::ANIMATION_FRAMES;

/// Experience granted for every defeated monster.
pub const EXPERIENCE_PER_KILL: u32 = 10;
/// Damage the player deals per player level.
pub const PLAYER_DAMAGE_PER_LEVEL: u32 = 5;
/// Damage a monster deals per monster level.
pub const MONSTER_DAMAGE_PER_LEVEL: u32 = 2;
/// Silver dropped per monster level.
pub const SILVER_PER_MONSTER_LEVEL: u32 = 5;

/// Reply sent when the player reaches the final level.
pub const VICTORY_MESSAGE: &str = "You won!";
/// Reply sent when the player's health runs out.
pub const DEFEAT_MESSAGE: &str = "You have died!";

/// Result of one exchange of blows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BattleOutcome {
    /// Both sides survived the exchange.
    Exchanged {
        /// Damage dealt to the monster.
        dealt: u32,
        /// Damage taken from the counter-attack.
        taken: u32,
    },
    /// The monster fell before striking back.
    MonsterDefeated {
        /// Experience granted.
        experience: u32,
        /// Silver looted.
        silver: u32,
        /// Level progress caused by the experience.
        level_change: LevelChange,
    },
    /// The monster's counter-attack depleted the player's health.
    PlayerDefeated {
        /// Damage dealt to the monster.
        dealt: u32,
        /// Damage taken from the counter-attack.
        taken: u32,
    },
}

/// Resolve one exchange: the player strikes first, a surviving monster strikes back.
pub fn resolve_battle(player: &mut Player, monster: &mut Monster) -> BattleOutcome {
    let dealt = PLAYER_DAMAGE_PER_LEVEL * player.level;
    if monster.take_hit(dealt) {
        let silver = SILVER_PER_MONSTER_LEVEL * monster.level;
        player.earn_silver(silver);
        let level_change = player.gain_experience(EXPERIENCE_PER_KILL);
        return BattleOutcome::MonsterDefeated {
            experience: EXPERIENCE_PER_KILL,
            silver,
            level_change,
        };
    }

    let taken = MONSTER_DAMAGE_PER_LEVEL * monster.level;
    if player.take_damage(taken) {
        BattleOutcome::PlayerDefeated { dealt, taken }
    } else {
        BattleOutcome::Exchanged { dealt, taken }
    }
}

impl SessionState {
    /// Try to engage a monster matching the player's level.
    pub fn search_encounter(&mut self, catalog: &MonsterCatalog) -> bool {
        match catalog.spawn(self.player.level, &mut self.rng) {
            Some(monster) => {
                debug!(key = %self.key, monster = %monster.name, "monster found");
                self.encounter = Some(monster);
                self.hunt_status = HuntStatus::Engaged;
                true
            }
            None => false,
        }
    }

    /// Fight the engaged monster once and apply the consequences to the session.
    pub fn battle(&mut self) -> Option<BattleOutcome> {
        let monster = self.encounter.as_mut()?;
        let outcome = resolve_battle(&mut self.player, monster);
        match outcome {
            BattleOutcome::Exchanged { .. } => {}
            BattleOutcome::MonsterDefeated { level_change, .. } => {
                self.monsters_defeated += 1;
                self.encounter = None;
                self.hunt_status = HuntStatus::Blank;
                if let LevelChange::LeveledUp(level) = level_change {
                    info!(key = %self.key, level, "player leveled up");
                }
                if level_change == LevelChange::ReachedMaxLevel {
                    self.win_hunt();
                }
            }
            BattleOutcome::PlayerDefeated { .. } => self.lose_hunt(),
        }
        Some(outcome)
    }

    /// Max level reached: the session is over and every control goes dark.
    fn win_hunt(&mut self) {
        self.activity.cancel();
        self.controls.set_all_enabled(&ControlId::ALL, false);
        self.controls
            .set_label(ControlId::Hunt, ControlId::Hunt.default_label());
        self.leave_encounter();
        self.mode = Mode::Ended;
        info!(key = %self.key, "player won");
    }

    /// Health depleted: heal up and drop back to idle so the player can retry.
    fn lose_hunt(&mut self) {
        self.activity.cancel();
        self.player.heal_to_full();
        self.controls.set_all_enabled(&ControlId::ALL, true);
        self.controls
            .set_label(ControlId::Hunt, ControlId::Hunt.default_label());
        self.leave_encounter();
        self.mode = Mode::Idle;
        info!(key = %self.key, "player died");
    }
}

/// The hunt loop. Exits on cancellation, victory or death.
pub(crate) async fn run(session: Session, token: CancellationToken) {
    let Some((search_step, battle_pause)) = session
        .lock_live(&token)
        .await
        .map(|state| (state.tuning().search_step(), state.tuning().battle_pause()))
    else {
        return;
    };

    loop {
        let engaged = match session.lock_live(&token).await {
            Some(state) => state.encounter().is_some(),
            None => break,
        };

        if !engaged {
            for step in 0..ANIMATION_FRAMES {
                {
                    let Some(mut state) = session.lock_live(&token).await else {
                        return;
                    };
                    state.hunt_status = HuntStatus::Searching(step);
                    session.redraw(&state).await;
                }
                if !pause(&token, search_step).await {
                    return;
                }
            }
            {
                let Some(mut state) = session.lock_live(&token).await else {
                    break;
                };
                if !state.search_encounter(session.catalog()) {
                    continue;
                }
                session.redraw(&state).await;
            }
        }

        if !pause(&token, battle_pause).await {
            break;
        }
        let Some(mut state) = session.lock_live(&token).await else {
            break;
        };
        let Some(outcome) = state.battle() else {
            continue;
        };
        session.redraw(&state).await;
        match outcome {
            BattleOutcome::MonsterDefeated {
                level_change: LevelChange::ReachedMaxLevel,
                ..
            } => {
                session.reply(VICTORY_MESSAGE).await;
                session.leave_registry();
                break;
            }
            BattleOutcome::PlayerDefeated { .. } => {
                session.reply(DEFEAT_MESSAGE).await;
                break;
            }
            _ => {}
        }
    }
    debug!(key = %session.key(), "hunt loop finished");
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use super::*;
    use crate::{
        config::Tuning,
        error::Rejection,
        models::{ActorId, MAX_HEALTH, MAX_LEVEL},
        session::{ActivityKind, SessionKey},
        test_support::RecordingSurface,
    };

    const OWNER: ActorId = ActorId(4);

    fn hunter() -> Player {
        Player::new(OWNER, "Hunter")
    }

    fn session_with(player: Player) -> (Session, Arc<RecordingSurface>, Arc<MonsterCatalog>) {
        let surface = RecordingSurface::new();
        let catalog = MonsterCatalog::standard();
        let state = SessionState::new(SessionKey(2), player, Tuning::default()).with_seed(7);
        let session = Session::new(state, Arc::clone(&catalog), surface.clone(), "Goodbye!");
        (session, surface, catalog)
    }

    fn templates_intact(catalog: &MonsterCatalog) -> bool {
        catalog
            .templates()
            .iter()
            .all(|template| template.health == template.max_health)
    }

    #[test]
    fn level_one_player_grinds_down_a_goblin() {
        let mut player = hunter();
        let mut goblin = Monster::new("Goblin", 3);

        assert_eq!(
            resolve_battle(&mut player, &mut goblin),
            BattleOutcome::Exchanged { dealt: 5, taken: 6 }
        );
        assert_eq!(goblin.health, 55);
        assert_eq!(player.health, 244);

        let mut exchanges = 1;
        let outcome = loop {
            match resolve_battle(&mut player, &mut goblin) {
                BattleOutcome::Exchanged { .. } => exchanges += 1,
                other => break other,
            }
        };
        assert_eq!(exchanges, 11);
        assert_eq!(
            outcome,
            BattleOutcome::MonsterDefeated {
                experience: 10,
                silver: 15,
                level_change: LevelChange::None,
            }
        );
        assert_eq!(player.experience, 10);
        assert_eq!(player.silver, 15);
        assert_eq!(player.health, MAX_HEALTH - 11 * 6);
    }

    #[test]
    fn kill_at_ninety_five_experience_levels_up() {
        let mut player = hunter();
        player.experience = 95;
        let mut rat = Monster::new("Rat", 1);
        rat.health = 5;

        let outcome = resolve_battle(&mut player, &mut rat);
        assert_eq!(
            outcome,
            BattleOutcome::MonsterDefeated {
                experience: 10,
                silver: 5,
                level_change: LevelChange::LeveledUp(2),
            }
        );
        assert_eq!(player.experience, 5);
        assert_eq!(player.level, 2);
    }

    #[test]
    fn death_heals_and_returns_to_idle() {
        let mut state = SessionState::new(SessionKey(2), hunter(), Tuning::default());
        state.begin_hunt().expect("hunt starts");
        state.player.health = 6;
        state.encounter = Some(Monster::new("Goblin", 3));

        assert_eq!(
            state.battle(),
            Some(BattleOutcome::PlayerDefeated { dealt: 5, taken: 6 })
        );
        assert_eq!(state.mode, Mode::Idle);
        assert_eq!(state.player.health, MAX_HEALTH);
        assert!(state.encounter.is_none());
        assert!(state.controls.iter().all(|(_, control)| control.enabled));
        assert_eq!(state.controls.get(ControlId::Hunt).label, "Start Hunting");
    }

    #[test]
    fn reaching_max_level_ends_the_session() {
        let mut state = SessionState::new(SessionKey(2), hunter(), Tuning::default());
        state.begin_hunt().expect("hunt starts");
        state.player.level = MAX_LEVEL - 1;
        state.player.experience = 90;
        let mut goblin = Monster::new("Goblin", 3);
        goblin.health = 1;
        state.encounter = Some(goblin);

        assert!(matches!(
            state.battle(),
            Some(BattleOutcome::MonsterDefeated {
                level_change: LevelChange::ReachedMaxLevel,
                ..
            })
        ));
        assert_eq!(state.mode, Mode::Ended);
        assert_eq!(state.player.level, MAX_LEVEL);
        assert_eq!(state.monsters_defeated, 1);
        assert!(state.controls.iter().all(|(_, control)| !control.enabled));
    }

    #[test]
    fn battle_without_encounter_does_nothing() {
        let mut state = SessionState::new(SessionKey(2), hunter(), Tuning::default());
        assert_eq!(state.battle(), None);
        assert_eq!(state.player, hunter());
    }

    #[tokio::test(start_paused = true)]
    async fn hunting_earns_experience_and_leaves_templates_alone() {
        let (session, surface, catalog) = session_with(hunter());
        session.request_hunt(OWNER).await.expect("hunt starts");
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.mode, Mode::Hunting);
        assert!(snapshot.monsters_defeated >= 2);
        assert_eq!(snapshot.player.experience, 10 * snapshot.monsters_defeated);
        assert_eq!(snapshot.player.silver, 5 * snapshot.monsters_defeated);
        assert!(templates_intact(&catalog));

        let names: Vec<String> = surface
            .panels()
            .iter()
            .filter_map(|panel| panel.fields.get(1))
            .map(|field| field.name.clone())
            .collect();
        assert!(names.iter().any(|name| name == "Hunting..."));
        assert!(names.iter().any(|name| name == "Monster found"));

        session.stop_hunt(OWNER).await.expect("hunt stops");
        let stopped = session.snapshot().await;
        assert_eq!(stopped.mode, Mode::Idle);
        assert!(stopped.encounter.is_none());
        assert!(templates_intact(&catalog));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_mid_encounter_freezes_state() {
        let (session, _surface, catalog) = session_with(hunter());
        session.request_hunt(OWNER).await.expect("hunt starts");
        tokio::time::sleep(Duration::from_millis(3_500)).await;
        assert!(session.snapshot().await.encounter.is_some());

        session.stop_hunt(OWNER).await.expect("hunt stops");
        let stopped = session.snapshot().await;
        tokio::time::sleep(Duration::from_secs(30)).await;

        assert_eq!(session.snapshot().await.player, stopped.player);
        assert!(templates_intact(&catalog));
        assert_eq!(
            session.stop_hunt(OWNER).await,
            Err(Rejection::NotActive(ActivityKind::Hunting))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn dying_announces_and_allows_another_hunt() {
        let mut player = hunter();
        player.health = 1;
        let (session, surface, _catalog) = session_with(player);
        session.request_hunt(OWNER).await.expect("hunt starts");
        tokio::time::sleep(Duration::from_secs(30)).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.mode, Mode::Idle);
        assert_eq!(snapshot.player.health, MAX_HEALTH);
        assert!(!snapshot.activity_running);
        assert_eq!(surface.replies(), vec![DEFEAT_MESSAGE.to_string()]);

        session.request_hunt(OWNER).await.expect("hunt again");
        assert_eq!(session.mode().await, Mode::Hunting);
    }

    #[tokio::test(start_paused = true)]
    async fn final_level_up_wins_and_locks_the_session() {
        let mut player = hunter();
        player.level = MAX_LEVEL - 1;
        player.experience = 90;
        let (session, surface, catalog) = session_with(player);
        session.request_hunt(OWNER).await.expect("hunt starts");
        tokio::time::sleep(Duration::from_secs(120)).await;

        let snapshot = session.snapshot().await;
        assert_eq!(snapshot.mode, Mode::Ended);
        assert_eq!(snapshot.player.level, MAX_LEVEL);
        assert!(!snapshot.activity_running);
        assert_eq!(surface.replies(), vec![VICTORY_MESSAGE.to_string()]);
        assert!(snapshot.controls.iter().all(|(_, control)| !control.enabled));
        assert!(templates_intact(&catalog));

        assert_eq!(
            session.press(ControlId::Hunt, OWNER).await,
            Err(Rejection::SessionEnded)
        );
    }

    #[tokio::test(start_paused = true)]
    async fn work_is_refused_while_hunting() {
        let (session, surface, _catalog) = session_with(hunter());
        session.request_hunt(OWNER).await.expect("hunt starts");
        assert_eq!(
            session.press(ControlId::Work, OWNER).await,
            Err(Rejection::ControlDisabled(ControlId::Work))
        );

        let result = session.request_work(OWNER).await;
        assert_eq!(
            result,
            Err(Rejection::WrongMode {
                requested: ActivityKind::Working,
                mode: Mode::Hunting,
            })
        );
        assert_eq!(session.mode().await, Mode::Hunting);
        assert_eq!(
            surface.last_panel().and_then(|panel| panel.footer),
            Some("Can't start working while hunting".to_string())
        );
    }
}
