pub mod file_sink;
pub mod log_sink;
pub mod memory_sink;
pub mod registry;
pub mod sink_trait;

pub use file_sink::FileSink;
pub use log_sink::LogSink;
pub use memory_sink::{MemorySink, SinkEvent};
pub use registry::SinkRegistry;
pub use sink_trait::ReplySink;
