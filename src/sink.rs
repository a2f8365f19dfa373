use crate::config::LogConfig;
use crate::level::Level;
use crate::record::LogRecord;
use crate::render::{Format, Output, Renderer};
use crate::rotate::RotatingWriter;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Destination for enriched [`LogRecord`]s.
///
/// Implementations own their underlying stream or file exclusively, apply
/// their renderer, and enforce their own minimum level on top of the global
/// gate. `emit` is infallible from the caller's point of view: sink I/O
/// failures are reported on stderr and otherwise swallowed, because logging
/// must never raise into business logic.
pub trait Sink: Send + Sync {
    /// Write one enriched record, with internal pipeline fields stripped.
    fn emit(&self, record: &LogRecord);

    /// Minimum severity this sink accepts.
    fn min_level(&self) -> Level;
}

/// Error raised while wiring sinks at configure time.
///
/// Unlike per-record failures these are surfaced to the caller:
/// configuration must not silently proceed with a broken sink.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownOutput(#[from] crate::render::UnknownOutput),

    #[error("failed to create log directory {path:?}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open log file {path:?}")]
    OpenFile {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Writes colorized human-readable lines to standard output. Never rotates.
pub struct ConsoleSink {
    renderer: Renderer,
    min_level: Level,
}

impl ConsoleSink {
    pub fn new(min_level: Level) -> Self {
        ConsoleSink {
            renderer: Renderer::select(Output::Console, Format::Text),
            min_level,
        }
    }
}

impl Sink for ConsoleSink {
    fn emit(&self, record: &LogRecord) {
        let line = self.renderer.render(&record.without_internal_fields());
        let stdout = std::io::stdout();
        let mut out = stdout.lock();
        // Best effort; a closed stdout must not take the process down.
        let _ = writeln!(out, "{line}");
    }

    fn min_level(&self) -> Level {
        self.min_level
    }
}

/// Writes rendered lines to `{log_dir}/{app_name}.log` with size-based
/// rotation. Writes are serialized through a mutex so rotation can never
/// interleave with a concurrent write.
pub struct FileSink {
    renderer: Renderer,
    min_level: Level,
    writer: Mutex<RotatingWriter>,
}

impl FileSink {
    /// Create the log directory (with parents, tolerating prior existence)
    /// and open the rotating file described by `config`.
    pub fn new(config: &LogConfig, min_level: Level) -> Result<Self, ConfigError> {
        let dir = PathBuf::from(&config.log_dir);
        std::fs::create_dir_all(&dir).map_err(|source| ConfigError::CreateDir {
            path: dir.clone(),
            source,
        })?;
        let path = dir.join(format!("{}.log", config.app_name));
        let writer = RotatingWriter::open(&path, config.max_file_size, config.backup_count)
            .map_err(|source| ConfigError::OpenFile { path, source })?;
        Ok(FileSink {
            renderer: Renderer::select(Output::File, Format::parse(&config.format)),
            min_level,
            writer: Mutex::new(writer),
        })
    }
}

impl Sink for FileSink {
    fn emit(&self, record: &LogRecord) {
        let line = self.renderer.render(&record.without_internal_fields());
        let mut writer = match self.writer.lock() {
            Ok(writer) => writer,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Err(e) = writer.write_line(&line) {
            eprintln!("log file write failed ({}): {e}", writer.path().display());
        }
    }

    fn min_level(&self) -> Level {
        self.min_level
    }
}
