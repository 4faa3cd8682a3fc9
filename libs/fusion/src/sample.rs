use std::{cmp::Ordering, fmt};

/// Ordering key injected into priority queues.
///
/// [`Ordering::Greater`] corresponds to a higher priority, i.e. `self` leaves the queue before
/// `other`. Implementations must describe a total order.
pub trait Prioritized {
    fn priority(&self, other: &Self) -> Ordering;
}

/// A measurement emitted by a producer, scored by how much it can be trusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: i64,
    pub reliability: f64,
}

impl Sample {
    pub fn new(value: i64, reliability: f64) -> Self {
        Self { value, reliability }
    }
}

impl Prioritized for Sample {
    /// Higher reliability leads to a higher priority. Uses the IEEE total order, so a `NaN`
    /// score never corrupts the heap.
    fn priority(&self, other: &Self) -> Ordering {
        self.reliability.total_cmp(&other.reliability)
    }
}

impl fmt::Display for Sample {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "value={}, reliability={}", self.value, self.reliability)
    }
}
