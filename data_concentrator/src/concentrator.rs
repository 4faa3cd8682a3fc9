use std::{sync::Arc, thread, time::Duration};

use fusion::{Prioritized, PriorityQueue, Sample};

use crate::{SampleSink, Source, StopToken};

/// Sample forwarded to the sink by one concentrator step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Emission {
    pub source: Source,
    pub sample: Sample,
}

/// Number of samples forwarded per channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConcentratorReport {
    pub from_queue1: usize,
    pub from_queue2: usize,
}

impl ConcentratorReport {
    pub fn total(&self) -> usize {
        self.from_queue1 + self.from_queue2
    }

    fn record(&mut self, source: Source) {
        match source {
            Source::Queue1 => self.from_queue1 += 1,
            Source::Queue2 => self.from_queue2 += 1,
        }
    }
}

/// Merges two channels by always forwarding the more reliable of their current heads.
pub struct Concentrator<Q, S> {
    queue1: Arc<Q>,
    queue2: Arc<Q>,
    stop: StopToken,
    pacing: Duration,
    sink: S,
    report: ConcentratorReport,
}

impl<Q: PriorityQueue<Sample>, S: SampleSink> Concentrator<Q, S> {
    pub fn new(
        queue1: Arc<Q>,
        queue2: Arc<Q>,
        stop: StopToken,
        pacing: Duration,
        sink: S,
    ) -> Self {
        Self {
            queue1,
            queue2,
            stop,
            pacing,
            sink,
            report: ConcentratorReport::default(),
        }
    }

    /// One loop iteration without the pacing delay.
    ///
    /// Pops from both channels and forwards the more reliable sample; on equal reliability the
    /// sample of `Queue1` wins. The other sample goes back into its channel, so a step consumes
    /// at most one sample. Two empty channels are a regular outcome and yield `None`.
    pub fn step(&mut self) -> anyhow::Result<Option<Emission>> {
        let sample1 = self.queue1.pop()?;
        let sample2 = self.queue2.pop()?;

        let emission = match (sample1, sample2) {
            (Some(sample1), Some(sample2)) => {
                if sample2.priority(&sample1).is_gt() {
                    self.queue1.push(sample1)?;
                    Some(Emission {
                        source: Source::Queue2,
                        sample: sample2,
                    })
                } else {
                    self.queue2.push(sample2)?;
                    Some(Emission {
                        source: Source::Queue1,
                        sample: sample1,
                    })
                }
            }
            (Some(sample), None) => Some(Emission {
                source: Source::Queue1,
                sample,
            }),
            (None, Some(sample)) => Some(Emission {
                source: Source::Queue2,
                sample,
            }),
            (None, None) => None,
        };

        if let Some(Emission { source, sample }) = &emission {
            self.sink.process(*source, sample)?;
            self.report.record(*source);
        }
        Ok(emission)
    }

    /// Runs steps until the stop token is set. The token is checked before every step, so a stop
    /// takes effect at most one pacing interval late.
    pub fn run(mut self) -> anyhow::Result<ConcentratorReport> {
        while !self.stop.is_stopped() {
            if let Some(emission) = self.step()? {
                log::debug!("Forwarded {} from {}", emission.sample, emission.source);
            }
            thread::sleep(self.pacing);
        }

        self.sink.stopped()?;
        log::info!(
            "Concentrator stopped after forwarding {} samples",
            self.report.total()
        );
        Ok(self.report)
    }
}
