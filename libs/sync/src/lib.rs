mod priority_channel;

// region:    --- Exports
pub use priority_channel::PriorityChannel;
// endregion: --- Exports
