//! Delayed, cancellable execution.
//!
//! Every source of asynchrony in the core goes through [`Scheduler`]: engines
//! ask for "run this after `d`" and get back a [`ScheduledAction`] handle.
//! Two implementations exist: [`VirtualScheduler`] here (deterministic virtual
//! clock for tests and offline rendering) and a tokio-backed one in the CLI.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// Work to run once a delay has elapsed.
pub type Action = Box<dyn FnOnce() + Send + 'static>;

const PENDING: u8 = 0;
const FIRED: u8 = 1;
const CANCELLED: u8 = 2;

/// Cancellable handle to one scheduled action.
///
/// The handle is a shared three-state cell: pending, fired or cancelled.
/// A scheduler must [`claim`](Self::claim) the handle before running the
/// action; claim and [`cancel`](Self::cancel) are mutually exclusive, so an
/// action never runs after a successful cancel and never runs twice.
///
/// Dropping a handle does not cancel it.
#[derive(Clone, Default)]
pub struct ScheduledAction {
    state: Arc<AtomicU8>,
    on_cancel: Arc<Mutex<Option<CancelHook>>>,
}

type CancelHook = Box<dyn FnOnce() + Send + 'static>;

impl fmt::Debug for ScheduledAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScheduledAction")
            .field("state", &self.state.load(Ordering::Acquire))
            .finish_non_exhaustive()
    }
}

impl ScheduledAction {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cancel the action. Returns `true` if this call prevented it from firing.
    pub fn cancel(&self) -> bool {
        let cancelled = self
            .state
            .compare_exchange(PENDING, CANCELLED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if cancelled && let Some(hook) = self.take_hook() {
            hook();
        }
        cancelled
    }

    /// Run `hook` when the action is cancelled, so a scheduler can release
    /// whatever it holds for it. Runs at once if already cancelled; dropped
    /// unrun if the action fires.
    pub fn on_cancel(&self, hook: impl FnOnce() + Send + 'static) {
        *self.hook_slot() = Some(Box::new(hook));
        if self.is_cancelled()
            && let Some(hook) = self.take_hook()
        {
            hook();
        }
    }

    fn hook_slot(&self) -> MutexGuard<'_, Option<CancelHook>> {
        self.on_cancel.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn take_hook(&self) -> Option<CancelHook> {
        self.hook_slot().take()
    }

    /// Take the right to fire. Only the scheduler that owns the action calls this.
    pub fn claim(&self) -> bool {
        let claimed = self
            .state
            .compare_exchange(PENDING, FIRED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.take_hook();
        }
        claimed
    }

    pub fn is_pending(&self) -> bool {
        self.state.load(Ordering::Acquire) == PENDING
    }

    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    pub fn has_fired(&self) -> bool {
        self.state.load(Ordering::Acquire) == FIRED
    }
}

/// Schedule-after-delay. Nothing else: callers must not assume ordering
/// between independently scheduled actions except by deadline.
pub trait Scheduler: Send + Sync {
    fn schedule(&self, after: Duration, action: Action) -> ScheduledAction;
}

/// Cancel an optional handle in place, leaving `None`.
pub(crate) fn cancel_slot(slot: &mut Option<ScheduledAction>) {
    if let Some(handle) = slot.take() {
        handle.cancel();
    }
}

struct Entry {
    handle: ScheduledAction,
    action: Action,
}

#[derive(Default)]
struct VirtualClock {
    now: Duration,
    next_seq: u64,
    queue: BTreeMap<(Duration, u64), Entry>,
}

/// Deterministic scheduler driven by [`advance`](Self::advance).
///
/// Actions fire in (deadline, insertion) order. While advancing, the clock
/// moves to each action's deadline before it runs, so an action that
/// reschedules itself (a periodic tick) lands at the right virtual time and
/// fires again within the same advance if its new deadline is still inside
/// the window. An action whose deadline lies past the window never fires.
#[derive(Default)]
pub struct VirtualScheduler {
    clock: Mutex<VirtualClock>,
}

impl VirtualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, VirtualClock> {
        self.clock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current virtual time since construction.
    pub fn now(&self) -> Duration {
        self.lock().now
    }

    /// Number of actions still waiting to fire.
    pub fn pending_count(&self) -> usize {
        self.lock()
            .queue
            .values()
            .filter(|e| e.handle.is_pending())
            .count()
    }

    /// Move the clock forward by `by`, firing every due action.
    pub fn advance(&self, by: Duration) {
        let target = self.now() + by;
        loop {
            // The clock lock is released before running the action so the
            // action may schedule more work.
            let next = {
                let mut clock = self.lock();
                let due = clock
                    .queue
                    .first_key_value()
                    .is_some_and(|(&(deadline, _), _)| deadline <= target);
                if due {
                    clock.queue.pop_first().map(|((deadline, _), entry)| {
                        clock.now = clock.now.max(deadline);
                        entry
                    })
                } else {
                    None
                }
            };
            match next {
                Some(entry) => {
                    if entry.handle.claim() {
                        (entry.action)();
                    }
                }
                None => break,
            }
        }
        let mut clock = self.lock();
        clock.now = clock.now.max(target);
    }

    /// Advance by whole milliseconds.
    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }
}

impl Scheduler for VirtualScheduler {
    fn schedule(&self, after: Duration, action: Action) -> ScheduledAction {
        let handle = ScheduledAction::new();
        let mut clock = self.lock();
        let deadline = clock.now + after;
        let seq = clock.next_seq;
        clock.next_seq += 1;
        clock.queue.insert(
            (deadline, seq),
            Entry {
                handle: handle.clone(),
                action,
            },
        );
        handle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn log() -> Arc<Mutex<Vec<&'static str>>> {
        Arc::new(Mutex::new(Vec::new()))
    }

    fn push(log: &Arc<Mutex<Vec<&'static str>>>, tag: &'static str) -> Action {
        let log = Arc::clone(log);
        Box::new(move || log.lock().unwrap().push(tag))
    }

    #[test]
    fn test_cancel_runs_hook_once() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = ScheduledAction::new();
        let h = Arc::clone(&hits);
        handle.on_cancel(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_hook_set_after_cancel_runs_immediately() {
        let hits = Arc::new(AtomicUsize::new(0));
        let handle = ScheduledAction::new();
        handle.cancel();

        let h = Arc::clone(&hits);
        handle.on_cancel(move || {
            h.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_fired_action_drops_hook_unrun() {
        let token = Arc::new(());
        let handle = ScheduledAction::new();
        let t = Arc::clone(&token);
        handle.on_cancel(move || drop(t));

        assert!(handle.claim());
        assert_eq!(Arc::strong_count(&token), 1);
        assert!(!handle.cancel());
    }

    #[test]
    fn test_does_not_fire_before_deadline() {
        let s = VirtualScheduler::new();
        let l = log();
        s.schedule(Duration::from_secs(60), push(&l, "exit"));

        s.advance(Duration::from_secs(59));
        assert!(l.lock().unwrap().is_empty());

        s.advance(Duration::from_secs(1));
        assert_eq!(*l.lock().unwrap(), vec!["exit"]);
    }

    #[test]
    fn test_fifo_among_equal_deadlines() {
        let s = VirtualScheduler::new();
        let l = log();
        s.schedule(Duration::from_millis(10), push(&l, "a"));
        s.schedule(Duration::from_millis(10), push(&l, "b"));
        s.schedule(Duration::from_millis(5), push(&l, "early"));
        s.schedule(Duration::from_millis(10), push(&l, "c"));

        s.advance_ms(10);
        assert_eq!(*l.lock().unwrap(), vec!["early", "a", "b", "c"]);
    }

    #[test]
    fn test_cancel_prevents_fire() {
        let s = VirtualScheduler::new();
        let l = log();
        let h = s.schedule(Duration::from_millis(10), push(&l, "ghost"));
        assert!(h.cancel());
        assert!(h.is_cancelled());
        assert_eq!(s.pending_count(), 0);

        s.advance_ms(100);
        assert!(l.lock().unwrap().is_empty());
        assert!(!h.has_fired());
    }

    #[test]
    fn test_cancel_after_fire_is_noop() {
        let s = VirtualScheduler::new();
        let l = log();
        let h = s.schedule(Duration::ZERO, push(&l, "once"));
        s.advance(Duration::ZERO);
        assert!(h.has_fired());
        assert!(!h.cancel());
        assert_eq!(*l.lock().unwrap(), vec!["once"]);
    }

    #[test]
    fn test_claim_and_cancel_are_exclusive() {
        let h = ScheduledAction::new();
        assert!(h.claim());
        assert!(!h.cancel());
        assert!(!h.claim());

        let h2 = ScheduledAction::new();
        assert!(h2.cancel());
        assert!(!h2.claim());
    }

    #[test]
    fn test_self_rescheduling_action_keeps_cadence() {
        let s = Arc::new(VirtualScheduler::new());
        let fired = Arc::new(AtomicUsize::new(0));

        fn arm(s: &Arc<VirtualScheduler>, fired: &Arc<AtomicUsize>) {
            let s2 = Arc::clone(s);
            let f2 = Arc::clone(fired);
            s.schedule(
                Duration::from_millis(20),
                Box::new(move || {
                    f2.fetch_add(1, Ordering::SeqCst);
                    arm(&s2, &f2);
                }),
            );
        }

        arm(&s, &fired);
        s.advance_ms(100);
        assert_eq!(fired.load(Ordering::SeqCst), 5);
        assert_eq!(s.now(), Duration::from_millis(100));
        assert_eq!(s.pending_count(), 1);
    }

    #[test]
    fn test_clock_moves_to_deadline_while_firing() {
        let s = Arc::new(VirtualScheduler::new());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for ms in [30u64, 10, 20] {
            let s2 = Arc::clone(&s);
            let seen2 = Arc::clone(&seen);
            s.schedule(
                Duration::from_millis(ms),
                Box::new(move || seen2.lock().unwrap().push(s2.now())),
            );
        }
        s.advance_ms(50);
        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                Duration::from_millis(10),
                Duration::from_millis(20),
                Duration::from_millis(30)
            ]
        );
        assert_eq!(s.now(), Duration::from_millis(50));
    }
}
