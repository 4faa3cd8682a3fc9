use rand::Rng;
use std::collections::HashSet;
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::anyhow;

use crate::{PriorityQueue, Sample};

#[derive(Debug, Clone, Copy)]
pub struct StressConfig {
    pub num_producers: usize,
    pub samples_per_producer: usize,
    pub num_consumers: usize,
}

impl StressConfig {
    /// Value that is unique across all producers of one run.
    fn value_of(&self, producer_id: usize, index: usize) -> i64 {
        (producer_id * self.samples_per_producer + index) as i64
    }
}

/// Outcome of a stress run, gathered once all threads have been joined.
#[derive(Debug, Clone)]
pub struct StressReport {
    pub duration: Duration,
    pub pushed: usize,
    pub popped: usize,
    pub resident: usize,
    /// Number of values that were handed out to more than one consumer.
    pub duplicates: usize,
}

impl StressReport {
    pub fn is_conserved(&self) -> bool {
        self.pushed == self.popped + self.resident
    }
}

/// Lets `num_producers` threads push into `queue` while `num_consumers` threads pop from it.
/// Consumers keep popping until every producer has finished and the queue is empty.
pub fn run_stress_test<Q: PriorityQueue<Sample>>(
    queue: Arc<Q>,
    config: StressConfig,
) -> anyhow::Result<StressReport> {
    log::info!(
        "Starting stress test: {} producers x {} samples, {} consumers",
        config.num_producers,
        config.samples_per_producer,
        config.num_consumers
    );
    let start_time = Instant::now();

    let pushed_count = Arc::new(AtomicUsize::new(0));
    let producers_stopped = Arc::new(AtomicUsize::new(0));

    // region:    --- Producer
    let mut producer_handles = vec![];
    for producer_id in 0..config.num_producers {
        let cloned_queue = Arc::clone(&queue);
        let cloned_pushed_count = Arc::clone(&pushed_count);
        let cloned_producers_stopped = Arc::clone(&producers_stopped);

        let handle = thread::spawn(move || -> anyhow::Result<()> {
            let mut rng = rand::rng();
            let mut pushed = Ok(());
            for index in 0..config.samples_per_producer {
                let sample = Sample::new(
                    config.value_of(producer_id, index),
                    rng.random_range(0.0..1.0),
                );
                pushed = cloned_queue.push(sample);
                if pushed.is_err() {
                    break;
                }
                cloned_pushed_count.fetch_add(1, Ordering::Relaxed);
            }
            // Also counted on failure, consumers wait for every producer to stop.
            cloned_producers_stopped.fetch_add(1, Ordering::SeqCst);
            pushed
        });
        producer_handles.push(handle);
    }
    // endregion: --- Producer

    // region:    --- Consumer threads
    let mut consumer_handles = vec![];
    for _ in 0..config.num_consumers {
        let cloned_queue = Arc::clone(&queue);
        let cloned_producers_stopped = Arc::clone(&producers_stopped);

        let handle = thread::spawn(move || -> anyhow::Result<Vec<i64>> {
            let mut popped = vec![];
            loop {
                if let Some(sample) = cloned_queue.pop()? {
                    popped.push(sample.value);
                    continue;
                }
                if cloned_producers_stopped.load(Ordering::SeqCst) == config.num_producers
                    && cloned_queue.is_empty()?
                {
                    break;
                }
                thread::yield_now();
            }
            Ok(popped)
        });
        consumer_handles.push(handle);
    }
    // endregion: --- Consumer threads

    // Join every thread before acting on a failure.
    let produced: Vec<anyhow::Result<()>> = producer_handles
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("Producer thread panicked"))?
        })
        .collect();
    let consumed: Vec<anyhow::Result<Vec<i64>>> = consumer_handles
        .into_iter()
        .map(|handle| {
            handle
                .join()
                .map_err(|_| anyhow!("Consumer thread panicked"))?
        })
        .collect();
    produced.into_iter().collect::<anyhow::Result<()>>()?;
    let mut all_popped = vec![];
    for popped in consumed {
        all_popped.append(&mut popped?);
    }

    let unique: HashSet<i64> = all_popped.iter().copied().collect();
    let report = StressReport {
        duration: start_time.elapsed(),
        pushed: pushed_count.load(Ordering::Relaxed),
        popped: all_popped.len(),
        resident: queue.len()?,
        duplicates: all_popped.len() - unique.len(),
    };
    log::info!("Stress test finished: {report:?}");
    Ok(report)
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use anyhow::bail;

    use super::{StressConfig, run_stress_test};
    use crate::{PriorityQueue, Sample};

    /// Accepts a fixed number of pushes and fails afterwards. Pops never return an item.
    struct ExhaustedQueue {
        remaining_pushes: AtomicUsize,
    }

    impl PriorityQueue<Sample> for ExhaustedQueue {
        fn push(&self, _item: Sample) -> anyhow::Result<()> {
            let accepted = self
                .remaining_pushes
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1));
            if accepted.is_err() {
                bail!("Queue lock is poisoned");
            }
            Ok(())
        }

        fn pop(&self) -> anyhow::Result<Option<Sample>> {
            Ok(None)
        }

        fn is_empty(&self) -> anyhow::Result<bool> {
            Ok(true)
        }

        fn len(&self) -> anyhow::Result<usize> {
            Ok(0)
        }
    }

    /// A failing producer must not leave consumers waiting forever.
    #[test]
    fn push_failure_returns_error_and_releases_consumers() {
        let queue = Arc::new(ExhaustedQueue {
            remaining_pushes: AtomicUsize::new(5),
        });
        let config = StressConfig {
            num_producers: 2,
            samples_per_producer: 10,
            num_consumers: 2,
        };

        let err = run_stress_test(Arc::clone(&queue), config).unwrap_err();
        assert!(err.to_string().contains("poisoned"));
        assert_eq!(Arc::strong_count(&queue), 1);
    }
}
