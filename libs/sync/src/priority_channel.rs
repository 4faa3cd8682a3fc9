use std::{
    cmp::Ordering,
    collections::BinaryHeap,
    sync::{Condvar, Mutex, MutexGuard},
    time::Duration,
};

use anyhow::anyhow;
use fusion::{Prioritized, PriorityQueue};

/// Adapts the injected [`Prioritized`] key to the [`Ord`] the std max-heap expects.
struct Ranked<T>(T);

impl<T: Prioritized> PartialEq for Ranked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.priority(&other.0) == Ordering::Equal
    }
}

impl<T: Prioritized> Eq for Ranked<T> {}

impl<T: Prioritized> PartialOrd for Ranked<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T: Prioritized> Ord for Ranked<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.priority(&other.0)
    }
}

/// Unbounded max-priority queue guarded by a mutex, with a condition variable to wake waiting
/// consumers.
///
/// The [`Prioritized`] implementation of `T` decides the order:
/// [`std::cmp::Ordering::Greater`] corresponds to a higher priority, [`std::cmp::Ordering::Less`] to a lower one.
/// Items of equal priority leave in no particular order.
pub struct PriorityChannel<T: Prioritized> {
    storage: Mutex<BinaryHeap<Ranked<T>>>,
    available: Condvar,
}

impl<T: Prioritized> PriorityChannel<T> {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// `capacity` only pre-allocates, the channel grows as needed.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            storage: Mutex::new(BinaryHeap::with_capacity(capacity)),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> anyhow::Result<MutexGuard<'_, BinaryHeap<Ranked<T>>>> {
        self.storage.lock().map_err(|_| {
            log::error!("Priority channel lock is poisoned");
            anyhow!("Priority channel lock is poisoned, a thread panicked while holding it")
        })
    }

    pub fn push(&self, item: T) -> anyhow::Result<()> {
        let mut storage = self.lock()?;
        storage.push(Ranked(item));
        self.available.notify_one();
        Ok(())
    }

    /// Removes the highest priority item. Returns `None` immediately on an empty channel.
    pub fn pop(&self) -> anyhow::Result<Option<T>> {
        let mut storage = self.lock()?;
        Ok(storage.pop().map(|Ranked(item)| item))
    }

    /// Waits up to `timeout` for an item to arrive, then behaves like [`Self::pop`].
    pub fn pop_timeout(&self, timeout: Duration) -> anyhow::Result<Option<T>> {
        let storage = self.lock()?;
        let (mut storage, _) = self
            .available
            .wait_timeout_while(storage, timeout, |heap| heap.is_empty())
            .map_err(|_| anyhow!("Priority channel lock got poisoned while waiting for an item"))?;
        Ok(storage.pop().map(|Ranked(item)| item))
    }

    /// Pops up to `n` items under a single lock acquisition, highest priority first.
    pub fn drain(&self, n: usize) -> anyhow::Result<Vec<T>> {
        let mut storage = self.lock()?;

        let mut items = Vec::with_capacity(n.min(storage.len()));
        for _ in 0..n {
            let Some(Ranked(value)) = storage.pop() else {
                break;
            };
            items.push(value);
        }

        Ok(items)
    }

    /// Advisory only: other threads may change the answer right after it is returned.
    pub fn is_empty(&self) -> anyhow::Result<bool> {
        Ok(self.lock()?.is_empty())
    }

    pub fn len(&self) -> anyhow::Result<usize> {
        Ok(self.lock()?.len())
    }
}

impl<T: Prioritized> Default for PriorityChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Prioritized + Send + 'static> PriorityQueue<T> for PriorityChannel<T> {
    fn push(&self, item: T) -> anyhow::Result<()> {
        PriorityChannel::push(self, item)
    }

    fn pop(&self) -> anyhow::Result<Option<T>> {
        PriorityChannel::pop(self)
    }

    fn is_empty(&self) -> anyhow::Result<bool> {
        PriorityChannel::is_empty(self)
    }

    fn len(&self) -> anyhow::Result<usize> {
        PriorityChannel::len(self)
    }
}
