//! Structured logging pipeline: every log call becomes an ordered key/value
//! record, runs through a fixed enrichment chain (context merge, level and
//! logger tagging, `%`-interpolation, timestamping, exception structuring)
//! and fans out to a colorized console sink and/or a size-rotated file sink
//! rendered as JSON or plain text.
//!
//! ```no_run
//! logpipe::setup("my-service", "logs", "INFO").expect("logging setup");
//!
//! let log = logpipe::get_logger(Some("my_service::web"));
//! let _request = logpipe::context::bind("request_id", "req-123");
//! log.info("request handled").kv("status", 200);
//! ```

pub mod chain;
pub mod config;
pub mod context;
pub mod level;
pub mod memory_sink;
pub mod pipeline;
pub mod record;
pub mod render;
pub mod rotate;
pub mod sink;

pub use config::LogConfig;
pub use level::Level;
pub use memory_sink::MemorySink;
pub use pipeline::{configure, get_logger, setup, Event, Logger, Pipeline};
pub use record::LogRecord;
pub use render::{Format, Output, Renderer};
pub use sink::{ConfigError, ConsoleSink, FileSink, Sink};

/// Obtain a logger named after the calling module.
///
/// Expands to [`get_logger`] with `module_path!()`, the crate's rendition
/// of "default to the caller's originating module name".
#[macro_export]
macro_rules! get_logger {
    () => {
        $crate::get_logger(Some(module_path!()))
    };
}
