use crate::Prioritized;

/// Shared, unbounded max-priority queue that producers push into and consumers pop from.
///
/// Every operation takes `&self`, so one instance can be shared (e.g. behind an [`std::sync::Arc`])
/// across any number of threads. The only error an implementation reports is a synchronization
/// failure such as a poisoned lock; an empty queue is a regular outcome, not an error.
pub trait PriorityQueue<T: Prioritized>: Send + Sync + 'static {
    /// Inserts `item`. The queue is unbounded, so this never waits for space.
    fn push(&self, item: T) -> anyhow::Result<()>;

    /// Removes and returns the item with the highest priority, or `None` right away if the
    /// queue is empty. Never waits for an item to arrive.
    fn pop(&self) -> anyhow::Result<Option<T>>;

    /// Snapshot of the emptiness of the queue. May be stale as soon as it is returned.
    fn is_empty(&self) -> anyhow::Result<bool>;

    /// Snapshot of the number of resident items.
    fn len(&self) -> anyhow::Result<usize>;
}
