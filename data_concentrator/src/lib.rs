//! Fuses the samples of two producers: each producer fills its own priority channel and a single
//! concentrator keeps forwarding whichever channel currently offers the more reliable sample.

pub mod cfg;
mod concentrator;
mod pipeline;
mod producer;
mod sink;
mod stop;
#[cfg(test)]
mod testing;

// region:    --- Exports
pub use concentrator::{Concentrator, ConcentratorReport, Emission};
pub use pipeline::{Pipeline, PipelineReport};
pub use producer::Producer;
pub use sink::{RecordingSink, SampleSink, SinkEvent, Source, StdoutSink};
pub use stop::StopToken;
// endregion: --- Exports
