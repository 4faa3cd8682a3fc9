use std::{thread, time::Duration};

use anyhow::anyhow;
use fusion::{PriorityQueue, Sample};

/// Pushes a fixed number of samples into one channel at a steady pace.
#[derive(Debug, Clone)]
pub struct Producer {
    /// Zero-based, keeps the values of different producers apart.
    id: usize,
    samples: usize,
    pacing: Duration,
}

impl Producer {
    pub fn new(id: usize, samples: usize, pacing: Duration) -> Self {
        Self {
            id,
            samples,
            pacing,
        }
    }

    /// The `index`-th sample of this producer. Values are unique across producers, the
    /// reliability grows linearly with `index` and faster for higher ids.
    /// # Error
    /// Returns an error if the value does not fit into an `i64`.
    pub fn sample(&self, index: usize) -> anyhow::Result<Sample> {
        let value = self
            .id
            .checked_mul(self.samples)
            .and_then(|offset| offset.checked_add(index))
            .and_then(|value| value.checked_add(1))
            .and_then(|value| i64::try_from(value).ok())
            .ok_or_else(|| {
                anyhow!(
                    "value of sample {index} of producer {} is out of range",
                    self.id
                )
            })?;
        let reliability = (self.id as f64 + 1.0) * (index as f64 + 1.0) / 10.0;
        Ok(Sample::new(value, reliability))
    }

    /// Blocks the calling thread until all samples have been pushed. Returns the number of
    /// pushed samples.
    pub fn run<Q: PriorityQueue<Sample>>(&self, queue: &Q) -> anyhow::Result<usize> {
        for index in 0..self.samples {
            let sample = self.sample(index)?;
            queue.push(sample)?;
            log::debug!("Producer {} pushed {sample}", self.id);

            thread::sleep(self.pacing);
        }

        log::info!(
            "Producer {} completed, pushed {} samples",
            self.id,
            self.samples
        );
        Ok(self.samples)
    }
}
