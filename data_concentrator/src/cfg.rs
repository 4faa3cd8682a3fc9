use std::time::Duration;

use clap::Parser;

/// Runs two producers and one concentrator, then shuts the concentrator down once the producers
/// are done. Without arguments the reference pipeline is run.
#[derive(Debug, Clone, clap::Parser)]
pub struct Cfg {
    /// Number of samples each producer pushes into its channel.
    #[arg(short = 'n', long, default_value_t = 10)]
    pub samples: usize,
    /// Delay between two pushes of the same producer.
    #[arg(long, default_value_t = 100)]
    pub producer_interval_ms: u64,
    /// Delay between two iterations of the concentrator loop.
    #[arg(long, default_value_t = 100)]
    pub concentrator_interval_ms: u64,
    /// Time the concentrator gets to drain the channels after the producers finished.
    /// Acts as an upper bound with `--drain empty`.
    #[arg(long, default_value_t = 3_000)]
    pub grace_ms: u64,
    /// How the concentrator is drained before it is stopped.
    #[arg(long, value_enum, default_value_t = DrainPolicy::Grace)]
    pub drain: DrainPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display, clap::ValueEnum)]
#[strum(serialize_all = "lowercase")]
pub enum DrainPolicy {
    /// Wait for the fixed grace period, then stop. Samples may be left behind.
    Grace,
    /// Wait until both channels are empty (at most the grace period), then stop.
    Empty,
}

impl Cfg {
    pub fn producer_interval(&self) -> Duration {
        Duration::from_millis(self.producer_interval_ms)
    }

    pub fn concentrator_interval(&self) -> Duration {
        Duration::from_millis(self.concentrator_interval_ms)
    }

    pub fn grace(&self) -> Duration {
        Duration::from_millis(self.grace_ms)
    }
}

impl Default for Cfg {
    fn default() -> Self {
        Self::parse_from(["data_concentrator"])
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::{Cfg, DrainPolicy};

    #[test]
    fn defaults_match_reference_pipeline() {
        let cfg = Cfg::default();
        assert_eq!(cfg.samples, 10);
        assert_eq!(cfg.producer_interval_ms, 100);
        assert_eq!(cfg.concentrator_interval_ms, 100);
        assert_eq!(cfg.grace_ms, 3_000);
        assert_eq!(cfg.drain, DrainPolicy::Grace);
    }

    #[test]
    fn parse_overrides() {
        let cfg = Cfg::parse_from([
            "data_concentrator",
            "-n",
            "3",
            "--producer-interval-ms",
            "5",
            "--drain",
            "empty",
        ]);
        assert_eq!(cfg.samples, 3);
        assert_eq!(cfg.producer_interval().as_millis(), 5);
        assert_eq!(cfg.drain, DrainPolicy::Empty);
        assert_eq!(cfg.drain.to_string(), "empty");
    }
}
