//! The record enrichment chain: an ordered sequence of small transformations
//! applied to every event record before any sink sees it.
//!
//! Steps are fixed-order and order-dependent (level tagging must precede
//! rendering, `exc_info` injection must precede exception structuring).
//! A failing step never stops the record: the pipeline swallows step errors
//! and emits whatever fields succeeded.

use crate::context;
use crate::level::Level;
use crate::record::{LogRecord, ARGS_FIELD, STACK_FLAG_FIELD};
use chrono::{Local, SecondsFormat};
use serde_json::{json, Value};
use std::backtrace::Backtrace;

/// Per-call metadata available to every enrichment step.
pub struct CallInfo<'a> {
    /// Name the logger handle was bound to.
    pub logger: &'a str,
    /// Severity method that produced the record (`"info"`, `"exception"`, ...).
    pub method: &'static str,
    /// Resolved severity of the call.
    pub level: Level,
}

/// One step of the enrichment chain.
///
/// **Parameters**
/// - `call`: metadata of the log call being processed.
/// - `record`: the record under construction; steps mutate it in place.
///
/// **Returns**
/// - `Ok(())` on success.
/// - `Err(..)` if the step could not apply; the chain runner logs nothing,
///   drops nothing, and simply moves on to the next step.
pub trait Processor: Send + Sync {
    fn process(&self, call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError>;
}

/// Error raised by an enrichment step. Never escapes the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum EnrichError {
    #[error("record has no string `event` field to interpolate into")]
    NonStringEvent,
}

/// Build the shared enrichment chain in its fixed order.
pub fn default_chain() -> Vec<Box<dyn Processor>> {
    vec![
        Box::new(MergeContext),
        Box::new(AddLoggerName),
        Box::new(AddLogLevel),
        Box::new(FormatPositional),
        Box::new(AddTimestamp),
        Box::new(RenderStack),
        Box::new(AutoExcInfo),
        Box::new(FormatException),
    ]
}

/// Step 1: merge ambient context fields without overwriting explicit
/// per-call fields.
pub struct MergeContext;

impl Processor for MergeContext {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        for (key, value) in context::snapshot() {
            if !record.contains_key(&key) {
                record.insert(key, value);
            }
        }
        Ok(())
    }
}

/// Optional step between context merge and name tagging: stamp a fixed
/// `env` field (e.g. `"development"`, `"production"`) on every record so a
/// collector tailing the file can label them by environment. Explicit
/// per-call fields win, like with merged context.
pub struct AddEnv(pub String);

impl Processor for AddEnv {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        if !record.contains_key("env") {
            record.insert("env", Value::String(self.0.clone()));
        }
        Ok(())
    }
}

/// Step 2: attach the logger's registered name.
pub struct AddLoggerName;

impl Processor for AddLoggerName {
    fn process(&self, call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        record.insert("logger", Value::String(call.logger.to_string()));
        Ok(())
    }
}

/// Step 3: attach the call severity as `log_level`.
pub struct AddLogLevel;

impl Processor for AddLogLevel {
    fn process(&self, call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        record.insert("log_level", Value::String(call.level.as_str().to_string()));
        Ok(())
    }
}

/// Step 4: classic `%`-style interpolation of positional args into `event`.
///
/// Supports `%s`, `%d`/`%i`, `%f` and the literal `%%`. When the call
/// supplied no positional args the message is left untouched; surplus
/// placeholders survive verbatim when args run out.
pub struct FormatPositional;

impl Processor for FormatPositional {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        let args = match record.remove(ARGS_FIELD) {
            Some(Value::Array(args)) if !args.is_empty() => args,
            Some(_) | None => return Ok(()),
        };
        let event = record.event().ok_or(EnrichError::NonStringEvent)?.to_string();
        record.set_event(interpolate(&event, &args));
        Ok(())
    }
}

fn interpolate(message: &str, args: &[Value]) -> String {
    let mut out = String::with_capacity(message.len());
    let mut next_arg = args.iter();
    let mut chars = message.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch != '%' {
            out.push(ch);
            continue;
        }
        match chars.peek().copied() {
            Some('%') => {
                chars.next();
                out.push('%');
            }
            Some(conv @ ('s' | 'd' | 'i' | 'f')) => match next_arg.next() {
                Some(value) => {
                    chars.next();
                    out.push_str(&format_arg(conv, value));
                }
                // Out of args: keep the placeholder as written.
                None => out.push('%'),
            },
            _ => out.push('%'),
        }
    }
    out
}

fn format_arg(conv: char, value: &Value) -> String {
    match (conv, value) {
        ('s', Value::String(s)) => s.clone(),
        ('d' | 'i', v) if v.as_i64().is_some() => v.as_i64().unwrap_or_default().to_string(),
        ('f', v) if v.as_f64().is_some() => v.as_f64().unwrap_or_default().to_string(),
        (_, v) => v.to_string(),
    }
}

/// Step 5: attach an ISO-8601 local timestamp.
pub struct AddTimestamp;

impl Processor for AddTimestamp {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        let ts = Local::now().to_rfc3339_opts(SecondsFormat::Micros, true);
        record.insert("timestamp", Value::String(ts));
        Ok(())
    }
}

/// Step 6: render the current call stack into `stack` when the call asked
/// for it.
pub struct RenderStack;

impl Processor for RenderStack {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        let requested = matches!(record.remove(STACK_FLAG_FIELD), Some(Value::Bool(true)));
        if requested {
            record.insert("stack", Value::String(Backtrace::force_capture().to_string()));
        }
        Ok(())
    }
}

/// Step 7: `exception`-method calls without explicit `exc_info` get
/// `exc_info = true`. Calls at every other severity are left alone.
pub struct AutoExcInfo;

impl Processor for AutoExcInfo {
    fn process(&self, call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        if call.method == "exception" && !record.contains_key("exc_info") {
            record.insert("exc_info", Value::Bool(true));
        }
        Ok(())
    }
}

/// Step 8: replace `exc_info` with a structured `exception` field.
///
/// The raw `exc_info` value is always removed so it never reaches a
/// renderer. When it carries a captured error (see [`capture_error`]) the
/// frames become the `exception` field; a bare boolean flag has nothing to
/// structure and is dropped silently.
pub struct FormatException;

impl Processor for FormatException {
    fn process(&self, _call: &CallInfo<'_>, record: &mut LogRecord) -> Result<(), EnrichError> {
        match record.remove("exc_info") {
            Some(frames @ Value::Array(_)) => record.insert("exception", frames),
            Some(_) | None => {}
        }
        Ok(())
    }
}

/// Capture a concrete error into the frame sequence stored under `exc_info`.
///
/// `exc_type` is the error's short type name, `exc_value` its `Display`
/// text, and `traceback` the `source()` chain rendered as one node per
/// underlying cause.
pub fn capture_error<E: std::error::Error>(err: &E) -> Value {
    let exc_type = std::any::type_name::<E>()
        .rsplit("::")
        .next()
        .unwrap_or("Error");
    let mut traceback = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        traceback.push(Value::String(cause.to_string()));
        source = cause.source();
    }
    json!([{
        "exc_type": exc_type,
        "exc_value": err.to_string(),
        "traceback": traceback,
    }])
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn call(method: &'static str, level: Level) -> CallInfo<'static> {
        CallInfo { logger: "tests", method, level }
    }

    fn run(chain: &[Box<dyn Processor>], call: &CallInfo<'_>, record: &mut LogRecord) {
        for step in chain {
            let _ = step.process(call, record);
        }
    }

    #[test]
    fn chain_tags_logger_level_and_timestamp() {
        let chain = default_chain();
        let mut record = LogRecord::new("started");
        run(&chain, &call("info", Level::Info), &mut record);
        assert_eq!(record.get("logger"), Some(&json!("tests")));
        assert_eq!(record.get("log_level"), Some(&json!("info")));
        let ts = record.get("timestamp").and_then(Value::as_str).unwrap();
        assert!(chrono::DateTime::parse_from_rfc3339(ts).is_ok());
    }

    #[test]
    fn positional_args_are_interpolated() {
        let chain = default_chain();
        let mut record = LogRecord::new("user %s retried %d times (%f%%)");
        record.insert(ARGS_FIELD, json!(["alice", 3, 0.5]));
        run(&chain, &call("info", Level::Info), &mut record);
        assert_eq!(record.event(), Some("user alice retried 3 times (0.5%)"));
        assert!(!record.contains_key(ARGS_FIELD));
    }

    #[test]
    fn message_without_args_is_untouched() {
        let chain = default_chain();
        let mut record = LogRecord::new("100% done");
        run(&chain, &call("info", Level::Info), &mut record);
        assert_eq!(record.event(), Some("100% done"));
    }

    #[test]
    fn exception_method_structures_the_captured_error() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let chain = default_chain();
        let mut record = LogRecord::new("write failed");
        record.insert("exc_info", capture_error(&io));
        run(&chain, &call("exception", Level::Error), &mut record);
        assert!(!record.contains_key("exc_info"));
        let frames = record.get("exception").and_then(Value::as_array).unwrap();
        assert_eq!(frames[0]["exc_type"], json!("Error"));
        assert_eq!(frames[0]["exc_value"], json!("disk on fire"));
    }

    #[test]
    fn bare_exception_call_never_leaks_exc_info() {
        let chain = default_chain();
        let mut record = LogRecord::new("boom");
        run(&chain, &call("exception", Level::Error), &mut record);
        assert!(!record.contains_key("exc_info"));
        // Nothing was captured, so there is nothing to structure.
        assert!(!record.contains_key("exception"));
    }

    #[test]
    fn error_method_gets_no_auto_injection() {
        let chain = default_chain();
        let mut record = LogRecord::new("plain error");
        run(&chain, &call("error", Level::Error), &mut record);
        assert!(!record.contains_key("exc_info"));
        assert!(!record.contains_key("exception"));
        assert!(!record.contains_key("stack"));
    }

    #[test]
    fn env_stamp_yields_to_explicit_field() {
        let step = AddEnv("production".to_string());
        let info = call("info", Level::Info);

        let mut record = LogRecord::new("hi");
        let _ = step.process(&info, &mut record);
        assert_eq!(record.get("env"), Some(&json!("production")));

        let mut explicit = LogRecord::new("hi");
        explicit.insert("env", json!("staging"));
        let _ = step.process(&info, &mut explicit);
        assert_eq!(explicit.get("env"), Some(&json!("staging")));
    }

    #[test]
    fn context_merge_never_overwrites_call_fields() {
        let _guard = crate::context::bind("request_id", "from-context");
        let chain = default_chain();
        let mut record = LogRecord::new("hi");
        record.insert("request_id", json!("from-call"));
        run(&chain, &call("info", Level::Info), &mut record);
        assert_eq!(record.get("request_id"), Some(&json!("from-call")));
    }

    #[test]
    fn stack_flag_renders_a_stack_and_is_removed() {
        let chain = default_chain();
        let mut record = LogRecord::new("where am I");
        record.insert(STACK_FLAG_FIELD, json!(true));
        run(&chain, &call("warning", Level::Warning), &mut record);
        assert!(!record.contains_key(STACK_FLAG_FIELD));
        assert!(record.get("stack").and_then(Value::as_str).is_some());
    }

    #[test]
    fn capture_error_records_the_source_chain() {
        #[derive(Debug)]
        struct Outer(std::io::Error);
        impl std::fmt::Display for Outer {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "outer failed")
            }
        }
        impl std::error::Error for Outer {
            fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
                Some(&self.0)
            }
        }
        let err = Outer(std::io::Error::new(std::io::ErrorKind::Other, "inner"));
        let frames = capture_error(&err);
        assert_eq!(frames[0]["exc_type"], json!("Outer"));
        assert_eq!(frames[0]["exc_value"], json!("outer failed"));
        assert_eq!(frames[0]["traceback"], json!(["inner"]));
    }
}
