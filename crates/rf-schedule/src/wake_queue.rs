//! `WakeQueue`: min-ordered queue of tasks keyed on next fire time.
//!
//! `BTreeMap` keeps fire times ordered, so the earliest due task is the first
//! entry.  A side index maps each pending task to its fire time, which makes
//! cancellation and rescheduling O(log W + bucket) instead of a full scan.
//! Tasks due at the same instant fire in the order they were scheduled.

use std::collections::{BTreeMap, VecDeque};

use rustc_hash::FxHashMap;

use rf_core::SimTime;

use crate::Task;

#[derive(Default, Debug)]
pub struct WakeQueue {
    inner: BTreeMap<SimTime, VecDeque<Task>>,
    pending: FxHashMap<Task, SimTime>,
}

impl WakeQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Schedule `task` to fire at `at`.  A task already pending is moved.
    pub fn schedule(&mut self, task: Task, at: SimTime) {
        self.cancel(task);
        self.inner.entry(at).or_default().push_back(task);
        self.pending.insert(task, at);
    }

    /// Remove `task` if pending.  Returns whether anything was removed;
    /// cancelling a task that is not pending is not an error.
    pub fn cancel(&mut self, task: Task) -> bool {
        let Some(at) = self.pending.remove(&task) else { return false };
        if let Some(bucket) = self.inner.get_mut(&at) {
            bucket.retain(|t| *t != task);
            if bucket.is_empty() {
                self.inner.remove(&at);
            }
        }
        true
    }

    /// Cancel every pending task.
    pub fn clear(&mut self) {
        self.inner.clear();
        self.pending.clear();
    }

    /// Pop the earliest task whose fire time is `<= now`.
    pub fn pop_due(&mut self, now: SimTime) -> Option<(SimTime, Task)> {
        let mut entry = self.inner.first_entry()?;
        let at = *entry.key();
        if at > now {
            return None;
        }
        let bucket = entry.get_mut();
        let task = bucket.pop_front()?;
        if bucket.is_empty() {
            entry.remove();
        }
        self.pending.remove(&task);
        Some((at, task))
    }

    /// Earliest pending fire time.
    pub fn next_time(&self) -> Option<SimTime> {
        self.inner.keys().next().copied()
    }

    /// Fire time of `task`, if pending.
    pub fn due_at(&self, task: Task) -> Option<SimTime> {
        self.pending.get(&task).copied()
    }

    #[inline]
    pub fn is_scheduled(&self, task: Task) -> bool {
        self.pending.contains_key(&task)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
