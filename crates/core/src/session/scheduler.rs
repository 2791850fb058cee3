//! Cancellable background tasks owned by a session.

use std::{future::Future, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::models::ActivityKind;

struct Running {
    kind: ActivityKind,
    token: CancellationToken,
    task: JoinHandle<()>,
}

/// Slot for the one background activity a session may run.
///
/// Starting a new activity cancels the previous one, so at most one loop is
/// ever alive per handle. Cancellation is cooperative: the task observes its
/// token at the next suspension point and exits before mutating anything.
#[derive(Default)]
pub struct ActivityHandle {
    running: Option<Running>,
}

impl ActivityHandle {
    /// Spawn `body` as the active loop, handing it a fresh cancellation token.
    pub fn start<F, Fut>(&mut self, kind: ActivityKind, body: F)
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.cancel();
        let token = CancellationToken::new();
        let task = tokio::spawn(body(token.clone()));
        debug!(%kind, "activity started");
        self.running = Some(Running { kind, token, task });
    }

    /// Run `callback` once after `delay` unless cancelled first.
    pub fn after<Fut>(delay: Duration, callback: Fut) -> Self
    where
        Fut: Future<Output = ()> + Send + 'static,
    {
        let mut handle = Self::default();
        handle.start(ActivityKind::Timer, move |token| async move {
            if pause(&token, delay).await {
                callback.await;
            }
        });
        handle
    }

    /// Signal the active task to stop. Returns `false` when nothing was running.
    ///
    /// Safe to call from inside the task itself: the task is not aborted, it
    /// simply sees the cancelled token and winds down.
    pub fn cancel(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                running.token.cancel();
                debug!(kind = %running.kind, "activity cancelled");
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|running| !running.token.is_cancelled() && !running.task.is_finished())
    }

    pub fn kind(&self) -> Option<ActivityKind> {
        self.running.as_ref().map(|running| running.kind)
    }
}

impl Drop for ActivityHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl std::fmt::Debug for ActivityHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActivityHandle")
            .field("kind", &self.kind())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Sleep for `duration`, returning `false` if the token fires first.
pub async fn pause(token: &CancellationToken, duration: Duration) -> bool {
    tokio::select! {
        _ = token.cancelled() => false,
        _ = tokio::time::sleep(duration) => !token.is_cancelled(),
    }
}
