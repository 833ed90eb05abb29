//! Time source and timer scheduling
//!
//! Every animation in the engine is driven from one `Scheduler`. Timers carry
//! a plain value (usually an enum naming the transition to run) instead of a
//! callback; the owner pops due timers and dispatches them at their deadline.
//! Dispatching at the deadline rather than at the observed wall-clock time
//! keeps periodic ticks from drifting and makes `ManualClock` runs exact.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Source of the current time, as an offset from the clock's origin
pub trait Clock: Send + Sync {
    fn now(&self) -> Duration;
}

/// Monotonic wall clock
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Clock that only moves when told to (millisecond resolution)
#[derive(Debug, Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Duration) {
        self.millis.store(now.as_millis() as u64, Ordering::SeqCst);
    }

    /// Move forward by `delta`
    pub fn advance(&self, delta: Duration) {
        self.millis
            .fetch_add(delta.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        Duration::from_millis(self.millis.load(Ordering::SeqCst))
    }
}

/// Handle returned by `Scheduler::after`, used to cancel the timer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// Ordered set of pending timers
///
/// Timers fire in deadline order; timers sharing a deadline fire in the order
/// they were scheduled.
#[derive(Debug)]
pub struct Scheduler<E> {
    pending: BTreeMap<(Duration, TimerId), E>,
    deadlines: HashMap<TimerId, Duration>,
    next_id: u64,
}

impl<E> Default for Scheduler<E> {
    fn default() -> Self {
        Self {
            pending: BTreeMap::new(),
            deadlines: HashMap::new(),
            next_id: 0,
        }
    }
}

impl<E> Scheduler<E> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `event` to fire `delay` after `now`
    pub fn after(&mut self, now: Duration, delay: Duration, event: E) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;

        let deadline = now + delay;
        self.pending.insert((deadline, id), event);
        self.deadlines.insert(id, deadline);
        id
    }

    /// Cancel a pending timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        match self.deadlines.remove(&id) {
            Some(deadline) => self.pending.remove(&(deadline, id)).is_some(),
            None => false,
        }
    }

    /// Whether a timer is still pending
    pub fn is_pending(&self, id: TimerId) -> bool {
        self.deadlines.contains_key(&id)
    }

    /// Earliest pending deadline
    pub fn next_deadline(&self) -> Option<Duration> {
        self.pending.keys().next().map(|(deadline, _)| *deadline)
    }

    /// Remove and return the earliest timer whose deadline is at or before `now`
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, E)> {
        let (&(deadline, id), _) = self.pending.iter().next()?;
        if deadline > now {
            return None;
        }

        self.deadlines.remove(&id);
        self.pending
            .remove(&(deadline, id))
            .map(|event| (deadline, event))
    }

    /// Drop every pending timer
    pub fn clear(&mut self) {
        self.pending.clear();
        self.deadlines.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new();
        assert_eq!(clock.now(), Duration::ZERO);

        clock.advance(ms(60));
        clock.advance(ms(40));
        assert_eq!(clock.now(), ms(100));

        clock.set(ms(5));
        assert_eq!(clock.now(), ms(5));
    }

    #[test]
    fn test_pop_due_in_deadline_order() {
        let mut scheduler = Scheduler::new();
        scheduler.after(ms(0), ms(30), "c");
        scheduler.after(ms(0), ms(10), "a");
        scheduler.after(ms(0), ms(20), "b");

        assert_eq!(scheduler.next_deadline(), Some(ms(10)));
        assert_eq!(scheduler.pop_due(ms(5)), None);

        assert_eq!(scheduler.pop_due(ms(25)), Some((ms(10), "a")));
        assert_eq!(scheduler.pop_due(ms(25)), Some((ms(20), "b")));
        assert_eq!(scheduler.pop_due(ms(25)), None);
        assert_eq!(scheduler.len(), 1);
    }

    #[test]
    fn test_same_deadline_fires_in_schedule_order() {
        let mut scheduler = Scheduler::new();
        scheduler.after(ms(0), ms(10), 1);
        scheduler.after(ms(5), ms(5), 2);
        scheduler.after(ms(0), ms(10), 3);

        let fired: Vec<_> = std::iter::from_fn(|| scheduler.pop_due(ms(10)))
            .map(|(_, e)| e)
            .collect();
        assert_eq!(fired, vec![1, 2, 3]);
    }

    #[test]
    fn test_cancel() {
        let mut scheduler = Scheduler::new();
        let a = scheduler.after(ms(0), ms(10), "a");
        let b = scheduler.after(ms(0), ms(20), "b");

        assert!(scheduler.cancel(a));
        assert!(!scheduler.cancel(a));
        assert!(!scheduler.is_pending(a));
        assert!(scheduler.is_pending(b));

        assert_eq!(scheduler.pop_due(ms(100)), Some((ms(20), "b")));
        assert!(!scheduler.cancel(b));
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_clear() {
        let mut scheduler = Scheduler::new();
        scheduler.after(ms(0), ms(10), ());
        scheduler.after(ms(0), ms(20), ());
        scheduler.clear();

        assert!(scheduler.is_empty());
        assert_eq!(scheduler.next_deadline(), None);
    }
}
