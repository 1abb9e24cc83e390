//! Real-time [`Scheduler`] on the tokio timer.

use std::time::Duration;

use tact_core::{Action, ScheduledAction, Scheduler};
use tokio::runtime::Handle;

/// One spawned task per action: sleep, then claim and run. Cancelling the
/// handle aborts the task.
#[derive(Clone)]
pub struct TokioScheduler {
    handle: Handle,
}

impl TokioScheduler {
    /// Must be called from inside a tokio runtime.
    pub fn current() -> Self {
        Self {
            handle: Handle::current(),
        }
    }
}

impl Scheduler for TokioScheduler {
    fn schedule(&self, after: Duration, action: Action) -> ScheduledAction {
        let handle = ScheduledAction::new();
        let claim = handle.clone();
        let task = self.handle.spawn(async move {
            tokio::time::sleep(after).await;
            if claim.claim() {
                action();
            }
        });
        let abort = task.abort_handle();
        handle.on_cancel(move || abort.abort());
        handle
    }
}
