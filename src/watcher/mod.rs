pub mod runner;
pub mod sink;

pub use runner::{StepOutcome, WatchError, WatchSettings, Watcher};
pub use sink::{open_sink, LineSink, WriterSink};
