//! Queue double for exercising the error paths of producers, concentrator and pipeline.

use anyhow::bail;
use fusion::{PriorityQueue, Sample};
use sync::PriorityChannel;

/// Behaves like a [`PriorityChannel`] except for the operations configured to fail, which
/// report a poisoned lock.
pub struct FailingQueue {
    inner: PriorityChannel<Sample>,
    fail_push: bool,
    fail_pop: bool,
}

impl FailingQueue {
    pub fn new(fail_push: bool, fail_pop: bool) -> Self {
        Self {
            inner: PriorityChannel::new(),
            fail_push,
            fail_pop,
        }
    }

    pub fn failing_push() -> Self {
        Self::new(true, false)
    }

    pub fn failing_pop() -> Self {
        Self::new(false, true)
    }

    /// Inserts `sample` regardless of the configured failures.
    pub fn preload(&self, sample: Sample) -> anyhow::Result<()> {
        self.inner.push(sample)
    }
}

impl PriorityQueue<Sample> for FailingQueue {
    fn push(&self, item: Sample) -> anyhow::Result<()> {
        if self.fail_push {
            bail!("Priority channel lock is poisoned");
        }
        self.inner.push(item)
    }

    fn pop(&self) -> anyhow::Result<Option<Sample>> {
        if self.fail_pop {
            bail!("Priority channel lock is poisoned");
        }
        self.inner.pop()
    }

    fn is_empty(&self) -> anyhow::Result<bool> {
        self.inner.is_empty()
    }

    fn len(&self) -> anyhow::Result<usize> {
        self.inner.len()
    }
}
