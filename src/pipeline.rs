use crate::chain::{self, CallInfo, Processor};
use crate::config::LogConfig;
use crate::level::Level;
use crate::record::{LogRecord, ARGS_FIELD, STACK_FLAG_FIELD};
use crate::render::Output;
use crate::sink::{ConfigError, ConsoleSink, FileSink, Sink};
use arc_swap::ArcSwapOption;
use serde_json::Value;
use std::sync::Arc;

/// The wired logging pipeline: global level gate, enrichment chain, sinks.
///
/// A `Pipeline` is an ordinary value. Applications normally build one
/// through [`configure`]/[`setup`] and reach it through [`get_logger`];
/// tests construct their own (see [`Pipeline::with_sinks`]) and bind
/// loggers to it directly, so nothing ever mutates shared state between
/// tests.
pub struct Pipeline {
    min_level: Level,
    chain: Vec<Box<dyn Processor>>,
    sinks: Vec<Arc<dyn Sink>>,
}

impl Pipeline {
    /// Build a pipeline from a configuration.
    ///
    /// **Returns**
    /// - `Ok(Pipeline)` with one sink per distinct entry in
    ///   `config.outputs`.
    /// - `Err(..)` for an unrecognized output kind or an unusable log
    ///   directory/file. Configuration never silently proceeds with a
    ///   broken sink.
    ///
    /// The global `log_level` gates records before enrichment; each sink
    /// additionally applies its own level, which follows the global one
    /// unless the config carries a per-sink override.
    pub fn new(config: &LogConfig) -> Result<Pipeline, ConfigError> {
        let min_level = Level::parse_or_info(&config.log_level);

        let mut kinds = Vec::new();
        for name in &config.outputs {
            let kind = Output::parse(name)?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }

        let mut sinks: Vec<Arc<dyn Sink>> = Vec::with_capacity(kinds.len());
        for kind in kinds {
            match kind {
                Output::Console => {
                    let level = sink_level(&config.console_level, min_level);
                    sinks.push(Arc::new(ConsoleSink::new(level)));
                }
                Output::File => {
                    let level = sink_level(&config.file_level, min_level);
                    sinks.push(Arc::new(FileSink::new(config, level)?));
                }
            }
        }

        let mut steps = chain::default_chain();
        if let Some(env) = &config.env {
            // Directly after context merge, before name/level tagging.
            steps.insert(1, Box::new(chain::AddEnv(env.clone())));
        }

        Ok(Pipeline {
            min_level,
            chain: steps,
            sinks,
        })
    }

    /// Build a pipeline around caller-provided sinks and the standard
    /// enrichment chain. This is the seam for custom sinks and for tests
    /// (pair it with [`crate::MemorySink`]).
    pub fn with_sinks(min_level: Level, sinks: Vec<Arc<dyn Sink>>) -> Pipeline {
        Pipeline {
            min_level,
            chain: chain::default_chain(),
            sinks,
        }
    }

    /// A console-only pipeline at `INFO`; the fallback when even default
    /// configuration fails (e.g. unwritable default log dir).
    fn console_only() -> Pipeline {
        Pipeline::with_sinks(Level::Info, vec![Arc::new(ConsoleSink::new(Level::Info))])
    }

    /// Bind a logger handle to this pipeline.
    pub fn logger(self: &Arc<Self>, name: impl Into<String>) -> Logger {
        Logger {
            name: name.into(),
            pipeline: Arc::clone(self),
        }
    }

    /// Run one raw record through the gate, the chain and the sinks.
    ///
    /// Records below the global minimum are dropped before any enrichment
    /// work happens. Enrichment step failures are swallowed and the record
    /// is emitted with whatever fields succeeded.
    fn dispatch(&self, logger: &str, method: &'static str, level: Level, mut record: LogRecord) {
        if level < self.min_level {
            return;
        }
        let call = CallInfo { logger, method, level };
        for step in &self.chain {
            let _ = step.process(&call, &mut record);
        }
        for sink in &self.sinks {
            if level >= sink.min_level() {
                sink.emit(&record);
            }
        }
    }
}

fn sink_level(override_name: &Option<String>, global: Level) -> Level {
    match override_name {
        Some(name) => Level::parse_or_info(name),
        None => global,
    }
}

/// Process-wide pipeline slot.
///
/// A reconfiguration is a single atomic store: a log call in flight sees
/// either the fully-old or the fully-new sink set, never a partially
/// installed one, and repeated `configure` calls replace rather than stack.
static CURRENT: ArcSwapOption<Pipeline> = ArcSwapOption::const_empty();

/// Build a pipeline from `config` and install it process-wide, fully
/// replacing any previous one. Idempotent: configuring twice with the same
/// arguments leaves exactly one set of sinks active.
pub fn configure(config: &LogConfig) -> Result<(), ConfigError> {
    let pipeline = Pipeline::new(config)?;
    CURRENT.store(Some(Arc::new(pipeline)));
    Ok(())
}

/// Convenience wrapper over [`configure`] for the common startup call.
pub fn setup(app_name: &str, log_dir: &str, log_level: &str) -> Result<(), ConfigError> {
    configure(
        &LogConfig::new(app_name)
            .with_log_dir(log_dir)
            .with_log_level(log_level),
    )
}

/// Obtain a logger bound to `name` (or `"root"`).
///
/// If the process-wide pipeline has never been configured this applies the
/// default configuration first, so standalone code still produces output
/// without an explicit [`setup`] call. Obtaining a logger never fails: if
/// even the default configuration cannot be applied, a console-only
/// pipeline steps in.
pub fn get_logger(name: Option<&str>) -> Logger {
    let pipeline = match CURRENT.load_full() {
        Some(pipeline) => pipeline,
        None => {
            let _ = configure(&LogConfig::default());
            match CURRENT.load_full() {
                Some(pipeline) => pipeline,
                None => {
                    let fallback = Arc::new(Pipeline::console_only());
                    CURRENT.store(Some(Arc::clone(&fallback)));
                    fallback
                }
            }
        }
    };
    pipeline.logger(name.unwrap_or("root"))
}

/// Handle bound to a logger name and a pipeline.
///
/// Severity methods return an [`Event`] builder that emits when dropped,
/// so both `log.info("msg");` and `log.info("msg").kv("k", 1);` produce
/// exactly one record at the end of the statement.
#[derive(Clone)]
pub struct Logger {
    name: String,
    pipeline: Arc<Pipeline>,
}

impl Logger {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn debug(&self, event: &str) -> Event<'_> {
        self.event("debug", Level::Debug, event)
    }

    pub fn info(&self, event: &str) -> Event<'_> {
        self.event("info", Level::Info, event)
    }

    pub fn warning(&self, event: &str) -> Event<'_> {
        self.event("warning", Level::Warning, event)
    }

    pub fn error(&self, event: &str) -> Event<'_> {
        self.event("error", Level::Error, event)
    }

    pub fn critical(&self, event: &str) -> Event<'_> {
        self.event("critical", Level::Critical, event)
    }

    /// Error-severity call that additionally structures the propagating
    /// error: attach it with [`Event::err`], or let the chain record the
    /// implicit `exc_info` flag.
    pub fn exception(&self, event: &str) -> Event<'_> {
        self.event("exception", Level::Error, event)
    }

    fn event(&self, method: &'static str, level: Level, event: &str) -> Event<'_> {
        Event {
            logger: self,
            method,
            level,
            record: Some(LogRecord::new(event)),
        }
    }
}

/// One in-flight log call. Emits on drop; never returns an error.
pub struct Event<'a> {
    logger: &'a Logger,
    method: &'static str,
    level: Level,
    record: Option<LogRecord>,
}

impl Event<'_> {
    /// Attach a structured field.
    pub fn kv(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        if let Some(record) = self.record.as_mut() {
            record.insert(key, value.into());
        }
        self
    }

    /// Append a positional argument for `%`-style message interpolation.
    pub fn arg(mut self, value: impl Into<Value>) -> Self {
        if let Some(record) = self.record.as_mut() {
            match record.get(ARGS_FIELD).cloned() {
                Some(Value::Array(mut args)) => {
                    args.push(value.into());
                    record.insert(ARGS_FIELD, Value::Array(args));
                }
                _ => record.insert(ARGS_FIELD, Value::Array(vec![value.into()])),
            }
        }
        self
    }

    /// Request a rendered call stack in the `stack` field.
    pub fn stack(mut self) -> Self {
        if let Some(record) = self.record.as_mut() {
            record.insert(STACK_FLAG_FIELD, Value::Bool(true));
        }
        self
    }

    /// Capture a concrete error for structured `exception` output.
    pub fn err<E: std::error::Error>(mut self, err: &E) -> Self {
        if let Some(record) = self.record.as_mut() {
            record.insert("exc_info", chain::capture_error(err));
        }
        self
    }
}

impl Drop for Event<'_> {
    fn drop(&mut self) {
        if let Some(record) = self.record.take() {
            self.logger
                .pipeline
                .dispatch(&self.logger.name, self.method, self.level, record);
        }
    }
}
