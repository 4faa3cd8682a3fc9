use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use anyhow::{Context, anyhow};
use fusion::{PriorityQueue, Sample};
use sync::PriorityChannel;

use crate::{
    Concentrator, ConcentratorReport, Producer, SampleSink, StopToken,
    cfg::{Cfg, DrainPolicy},
};

type Channel = PriorityChannel<Sample>;

const PRODUCERS: usize = 2;

#[derive(Debug, Clone, Copy)]
pub struct PipelineReport {
    /// Samples pushed by both producers.
    pub produced: usize,
    pub processed: ConcentratorReport,
    /// Samples still sitting in the channels after the concentrator stopped.
    pub resident: usize,
}

/// Lifecycle controller: wires two producers and one concentrator together and shuts them down
/// in order.
pub struct Pipeline {
    cfg: Cfg,
}

impl Pipeline {
    pub fn new(cfg: Cfg) -> Self {
        Self { cfg }
    }

    /// Runs the pipeline over two fresh [`PriorityChannel`]s.
    pub fn run<S: SampleSink>(&self, sink: S) -> anyhow::Result<PipelineReport> {
        let queue1: Arc<Channel> = Arc::new(PriorityChannel::new());
        let queue2: Arc<Channel> = Arc::new(PriorityChannel::new());
        self.run_with_queues(queue1, queue2, sink)
    }

    /// Blocks until the producers are done, the channels got time to drain and the concentrator
    /// has been stopped and joined. Every spawned thread is joined before an error is returned.
    pub fn run_with_queues<Q: PriorityQueue<Sample>, S: SampleSink>(
        &self,
        queue1: Arc<Q>,
        queue2: Arc<Q>,
        sink: S,
    ) -> anyhow::Result<PipelineReport> {
        self.validate()?;
        log::info!(
            "Starting pipeline: {PRODUCERS} producers x {} samples, drain policy '{}'",
            self.cfg.samples,
            self.cfg.drain
        );
        let stop = StopToken::new();

        // region:    --- Start
        let mut producer_handles = vec![];
        for (id, queue) in [&queue1, &queue2].into_iter().enumerate() {
            let producer = Producer::new(id, self.cfg.samples, self.cfg.producer_interval());
            let queue = Arc::clone(queue);
            let spawned = thread::Builder::new()
                .name(format!("producer-{id}"))
                .spawn(move || producer.run(queue.as_ref()))
                .context("could not spawn producer thread");
            match spawned {
                Ok(handle) => producer_handles.push(handle),
                Err(e) => {
                    join_all(producer_handles, "Producer");
                    return Err(e);
                }
            }
        }

        let concentrator = Concentrator::new(
            Arc::clone(&queue1),
            Arc::clone(&queue2),
            stop.clone(),
            self.cfg.concentrator_interval(),
            sink,
        );
        let spawned = thread::Builder::new()
            .name("concentrator".to_string())
            .spawn(move || concentrator.run())
            .context("could not spawn concentrator thread");
        let concentrator_handle = match spawned {
            Ok(handle) => handle,
            Err(e) => {
                join_all(producer_handles, "Producer");
                return Err(e);
            }
        };
        // endregion: --- Start

        // region:    --- Shutdown
        // Join every producer before acting on a failure, so no thread is left behind.
        let produced: anyhow::Result<usize> =
            join_all(producer_handles, "Producer").into_iter().sum();

        let drained = match &produced {
            Ok(_) => self.wait_for_drain(queue1.as_ref(), queue2.as_ref()),
            Err(_) => Ok(()),
        };

        log::info!("Signalling the concentrator to stop");
        stop.stop();
        let processed = join_task(concentrator_handle, "Concentrator")?;
        // endregion: --- Shutdown

        let produced = produced?;
        drained?;
        let report = PipelineReport {
            produced,
            processed,
            resident: queue1.len()? + queue2.len()?,
        };
        if report.resident > 0 {
            log::warn!(
                "Concentrator stopped with {} samples left in the channels",
                report.resident
            );
        }
        Ok(report)
    }

    /// Every sample value of the run has to fit into a [`Sample::value`].
    fn validate(&self) -> anyhow::Result<()> {
        self.cfg
            .samples
            .checked_mul(PRODUCERS)
            .and_then(|total| i64::try_from(total).ok())
            .ok_or_else(|| {
                anyhow!(
                    "{} samples per producer overflow the sample value range",
                    self.cfg.samples
                )
            })?;
        Ok(())
    }

    /// Polls at half the concentrator interval, so two consecutive polls never both fall into the
    /// short window in which the concentrator holds a popped sample.
    fn drain_poll_interval(&self) -> Duration {
        (self.cfg.concentrator_interval() / 2).max(Duration::from_micros(100))
    }

    fn wait_for_drain<Q: PriorityQueue<Sample>>(
        &self,
        queue1: &Q,
        queue2: &Q,
    ) -> anyhow::Result<()> {
        match self.cfg.drain {
            DrainPolicy::Grace => {
                log::info!("Producers finished, draining for {:?}", self.cfg.grace());
                thread::sleep(self.cfg.grace());
            }
            DrainPolicy::Empty => {
                log::info!(
                    "Producers finished, draining until both channels are empty (at most {:?})",
                    self.cfg.grace()
                );
                let deadline = Instant::now() + self.cfg.grace();
                // The concentrator briefly holds a popped sample before pushing it back, so
                // emptiness has to be observed on two consecutive polls.
                let mut empty_polls = 0;
                while empty_polls < 2 {
                    if Instant::now() >= deadline {
                        log::warn!("Drain deadline reached before the channels were empty");
                        break;
                    }
                    thread::sleep(self.drain_poll_interval());
                    if queue1.is_empty()? && queue2.is_empty()? {
                        empty_polls += 1;
                    } else {
                        empty_polls = 0;
                    }
                }
            }
        }
        Ok(())
    }
}

/// Joins all `handles`, keeping the outcome of each task.
fn join_all<T>(
    handles: Vec<JoinHandle<anyhow::Result<T>>>,
    task: &str,
) -> Vec<anyhow::Result<T>> {
    handles
        .into_iter()
        .map(|handle| join_task(handle, task))
        .collect()
}

fn join_task<T>(handle: JoinHandle<anyhow::Result<T>>, task: &str) -> anyhow::Result<T> {
    handle
        .join()
        .map_err(|_| anyhow!("{task} thread panicked"))?
}
