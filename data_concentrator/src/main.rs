use anyhow::Context;
use clap::Parser;
use data_concentrator::{Pipeline, StdoutSink, cfg::Cfg};

fn setup_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
}

fn main() -> anyhow::Result<()> {
    setup_logging();

    let cfg = Cfg::parse();
    log::info!("Running configuration: {cfg:?}");

    let report = Pipeline::new(cfg)
        .run(StdoutSink)
        .context("data concentrator pipeline failed")?;
    log::info!(
        "Produced {} samples, processed {} ({} from Queue1, {} from Queue2), {} left behind",
        report.produced,
        report.processed.total(),
        report.processed.from_queue1,
        report.processed.from_queue2,
        report.resident
    );
    Ok(())
}
