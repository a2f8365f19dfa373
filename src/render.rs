//! Renderer selection: a closed (sink kind × format) dispatch.
//!
//! The set of sink kinds and formats is fixed and small, so selection is a
//! plain enum match instead of open-ended trait objects. Unknown sink kinds
//! are a configuration error; unknown formats degrade to text.

use crate::level::Level;
use crate::record::LogRecord;
use serde_json::Value;

const RESET: &str = "\x1b[0m";
const DIM: &str = "\x1b[2m";

/// Supported sink kinds that can be named in the `outputs` config set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Output {
    Console,
    File,
}

impl Output {
    /// Parse a sink kind from its config-file name.
    ///
    /// **Returns**
    /// - `Ok(Output)` for `"console"` or `"file"`.
    /// - `Err(..)` for anything else; surfaced at configure time so a broken
    ///   sink never silently disappears.
    pub fn parse(name: &str) -> Result<Output, UnknownOutput> {
        match name.trim().to_ascii_lowercase().as_str() {
            "console" => Ok(Output::Console),
            "file" => Ok(Output::File),
            _ => Err(UnknownOutput(name.to_string())),
        }
    }
}

/// Error type returned for an unrecognized sink kind.
#[derive(thiserror::Error, Debug)]
#[error("unknown output kind: {0:?} (expected \"console\" or \"file\")")]
pub struct UnknownOutput(pub String);

/// File output format. Anything other than `json` means plain text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Text,
}

impl Format {
    pub fn parse(name: &str) -> Format {
        if name.trim().eq_ignore_ascii_case("json") {
            Format::Json
        } else {
            Format::Text
        }
    }
}

/// Converts an enriched record into one line of output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Renderer {
    /// Human-readable with ANSI colors; console only.
    Console,
    /// Human-readable without colors; text-mode files.
    Plain,
    /// One flat JSON object per line; json-mode files.
    Json,
}

impl Renderer {
    /// Map a (sink kind, format setting) pair to a concrete renderer.
    ///
    /// The console is always colorized human-readable output regardless of
    /// the configured format; only file sinks honor `format`.
    pub fn select(output: Output, format: Format) -> Renderer {
        match (output, format) {
            (Output::Console, _) => Renderer::Console,
            (Output::File, Format::Json) => Renderer::Json,
            (Output::File, Format::Text) => Renderer::Plain,
        }
    }

    /// Render the record to a single line (no trailing newline).
    pub fn render(&self, record: &LogRecord) -> String {
        match self {
            Renderer::Json => serde_json::to_string(record)
                .unwrap_or_else(|_| fallback_line(record)),
            Renderer::Plain => human_line(record, false),
            Renderer::Console => human_line(record, true),
        }
    }
}

/// Fields the human-readable layouts place explicitly, in layout order.
const LAYOUT_FIELDS: [&str; 4] = ["timestamp", "log_level", "logger", "event"];

fn human_line(record: &LogRecord, color: bool) -> String {
    let ts = field_str(record, "timestamp");
    let level_name = field_str(record, "log_level");
    let logger = field_str(record, "logger");
    let event = field_str(record, "event");

    let mut line = String::new();
    if color {
        let paint = Level::parse_or_info(&level_name).color();
        line.push_str(&format!(
            "{DIM}{ts}{RESET} {paint}[{level_name:<8}]{RESET} {logger}: {event}"
        ));
    } else {
        line.push_str(&format!("{ts} [{level_name:<8}] {logger}: {event}"));
    }

    // Remaining fields inline, insertion order, key=value.
    for (key, value) in record.iter() {
        if LAYOUT_FIELDS.contains(&key.as_str()) {
            continue;
        }
        line.push(' ');
        line.push_str(key);
        line.push('=');
        match value {
            // Bare only when unambiguous; otherwise quoted so `key=two words`
            // cannot be misread as two tokens.
            Value::String(s) if !s.is_empty() && !s.chars().any(char::is_whitespace) => {
                line.push_str(s)
            }
            Value::String(s) => line.push_str(&format!("{s:?}")),
            other => line.push_str(&other.to_string()),
        }
    }
    line
}

fn field_str(record: &LogRecord, key: &str) -> String {
    match record.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}

// Last-resort rendering when JSON serialization itself fails; the record is
// still emitted with best-effort content.
fn fallback_line(record: &LogRecord) -> String {
    human_line(record, false)
}
