//! Single-threaded timer queue shared by the runtime loop and the console
//! collaborators.

use recital_core::Timer;
use recital_core::narration::EngineEvent;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub type SharedScheduler = Rc<RefCell<Scheduler>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Due {
    Page(Timer),
    Engine(EngineEvent),
}

#[derive(Debug, Default)]
pub struct Scheduler {
    queue: BTreeMap<(Instant, u64), Due>,
    next_seq: u64,
}

impl Scheduler {
    pub fn shared() -> SharedScheduler {
        Rc::new(RefCell::new(Self::default()))
    }

    pub fn schedule(&mut self, delay: Duration, due: Due) {
        self.schedule_at(Instant::now() + delay, due);
    }

    pub fn schedule_at(&mut self, at: Instant, due: Due) {
        self.next_seq += 1;
        self.queue.insert((at, self.next_seq), due);
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.keys().next().map(|(at, _)| *at)
    }

    /// Remove and return the earliest entry if it is due at `now`.
    pub fn pop_due(&mut self, now: Instant) -> Option<Due> {
        let key = *self.queue.keys().next()?;
        if key.0 > now {
            return None;
        }
        self.queue.remove(&key)
    }

    /// Remove every entry matching `predicate`, returning them with their
    /// deadlines.
    pub fn take_where(&mut self, predicate: impl Fn(&Due) -> bool) -> Vec<(Instant, Due)> {
        let keys: Vec<_> = self
            .queue
            .iter()
            .filter(|(_, due)| predicate(due))
            .map(|(key, _)| *key)
            .collect();
        keys.into_iter()
            .filter_map(|key| self.queue.remove(&key).map(|due| (key.0, due)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }
}
