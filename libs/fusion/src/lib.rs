mod queue;
mod sample;
pub mod test;

// region:    --- Exports
pub use queue::PriorityQueue;
pub use sample::{Prioritized, Sample};
// endregion: --- Exports
