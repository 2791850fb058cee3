//! Working: spend silver a unit at a time to recover health.

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::session::{pause, Session, SessionState, WorkStatus};

use super::ANIMATION_FRAMES;

/// What a completed work unit means for the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkStep {
    /// Paid and healed; keep working.
    Continue,
    /// Health hit the ceiling; the bout is over.
    ReachedMaxHealth,
    /// The unit could not be paid for; nothing changed.
    OutOfSilver,
}

impl SessionState {
    /// Whether the player can pay for the next unit.
    pub fn can_afford_work_unit(&self) -> bool {
        self.player.silver >= self.tuning.work_unit_price()
    }

    /// Settle one work unit after its animation has played.
    ///
    /// The health check is strict: a unit that would land exactly on the
    /// ceiling sets health to max and ends the bout.
    pub fn work_unit(&mut self) -> WorkStep {
        let price = self.tuning.work_unit_price();
        if !self.player.spend_silver(price) {
            return WorkStep::OutOfSilver;
        }
        self.bout.units += 1;
        self.bout.counter += self.tuning.work_unit_counter();
        self.bout.silver_spent += price;

        if self.player.health + price < self.player.max_health {
            self.bout.health_gained += self.player.restore_health(price);
            WorkStep::Continue
        } else {
            self.bout.health_gained += self.player.max_health - self.player.health;
            self.player.heal_to_full();
            WorkStep::ReachedMaxHealth
        }
    }
}

/// The work loop. Exits on cancellation or when it stops the bout itself.
pub(crate) async fn run(session: Session, token: CancellationToken) {
    let Some(frame) = session
        .lock_live(&token)
        .await
        .map(|state| state.tuning().work_frame())
    else {
        return;
    };

    loop {
        {
            let Some(mut state) = session.lock_live(&token).await else {
                break;
            };
            if !state.can_afford_work_unit() {
                finish(&session, &mut state, WorkStatus::NotEnoughSilverToContinue).await;
                break;
            }
        }

        for step in 0..ANIMATION_FRAMES {
            {
                let Some(mut state) = session.lock_live(&token).await else {
                    return;
                };
                state.work_status = WorkStatus::Working(step);
                session.redraw(&state).await;
            }
            if !pause(&token, frame).await {
                return;
            }
        }

        let Some(mut state) = session.lock_live(&token).await else {
            break;
        };
        match state.work_unit() {
            WorkStep::Continue => session.redraw(&state).await,
            WorkStep::ReachedMaxHealth => {
                finish(&session, &mut state, WorkStatus::ReachedMaxHealth).await;
                break;
            }
            WorkStep::OutOfSilver => {
                finish(&session, &mut state, WorkStatus::NotEnoughSilverToContinue).await;
                break;
            }
        }
    }
    debug!(key = %session.key(), "work loop finished");
}

async fn finish(session: &Session, state: &mut SessionState, status: WorkStatus) {
    if let Err(rejection) = state.end_work(status) {
        debug!(key = %session.key(), %rejection, "work already stopped");
        return;
    }
    session.redraw(state).await;
}
