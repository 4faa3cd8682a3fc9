use std::{
    fmt,
    sync::{Arc, Mutex},
};

use anyhow::anyhow;
use fusion::Sample;

/// Channel a sample has been taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Queue1,
    Queue2,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Queue1 => f.write_str("Queue1"),
            Source::Queue2 => f.write_str("Queue2"),
        }
    }
}

/// Receiver of everything the concentrator forwards.
pub trait SampleSink: Send + 'static {
    fn process(&mut self, source: Source, sample: &Sample) -> anyhow::Result<()>;
    /// Called once after the concentrator left its loop.
    fn stopped(&mut self) -> anyhow::Result<()>;
}

/// Writes one human readable line per event to stdout.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdoutSink;

impl SampleSink for StdoutSink {
    fn process(&mut self, source: Source, sample: &Sample) -> anyhow::Result<()> {
        println!("Processing sample from {source}: {sample}");
        Ok(())
    }

    fn stopped(&mut self) -> anyhow::Result<()> {
        println!("Data concentrator gracefully stopped.");
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SinkEvent {
    Processed(Source, Sample),
    Stopped,
}

/// Keeps every event in memory. Clones share the same record, so one clone can be handed to the
/// concentrator while another one is inspected.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> anyhow::Result<Vec<SinkEvent>> {
        Ok(self.lock()?.clone())
    }

    /// Samples in the order they were processed.
    pub fn processed(&self) -> anyhow::Result<Vec<(Source, Sample)>> {
        Ok(self
            .lock()?
            .iter()
            .filter_map(|event| match event {
                SinkEvent::Processed(source, sample) => Some((*source, *sample)),
                SinkEvent::Stopped => None,
            })
            .collect())
    }

    fn lock(&self) -> anyhow::Result<std::sync::MutexGuard<'_, Vec<SinkEvent>>> {
        self.events
            .lock()
            .map_err(|_| anyhow!("Recording sink lock is poisoned"))
    }

    fn record(&self, event: SinkEvent) -> anyhow::Result<()> {
        self.lock()?.push(event);
        Ok(())
    }
}

impl SampleSink for RecordingSink {
    fn process(&mut self, source: Source, sample: &Sample) -> anyhow::Result<()> {
        self.record(SinkEvent::Processed(source, *sample))
    }

    fn stopped(&mut self) -> anyhow::Result<()> {
        self.record(SinkEvent::Stopped)
    }
}
