/// Log severity, ordered from least to most severe.
///
/// Unlike free-form level strings, the set of severities is closed: the
/// pipeline compares levels for gating, so they need a total order. Levels
/// travel through configuration and records as plain strings
/// ([`Level::parse_or_info`], [`Level::as_str`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Parse a level name, case-insensitively.
    ///
    /// Unrecognized names fall back to [`Level::Info`] rather than failing:
    /// a typo in a config file should degrade logging verbosity, not break
    /// startup.
    pub fn parse_or_info(name: &str) -> Level {
        match name.trim().to_ascii_lowercase().as_str() {
            "debug" => Level::Debug,
            "info" => Level::Info,
            "warning" | "warn" => Level::Warning,
            "error" => Level::Error,
            "critical" | "fatal" => Level::Critical,
            _ => Level::Info,
        }
    }

    /// Lowercase severity name as it appears in the `log_level` record field.
    pub fn as_str(self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }

    /// ANSI color escape used by the console renderer for this severity.
    pub(crate) fn color(self) -> &'static str {
        match self {
            Level::Debug => "\x1b[36m",    // cyan
            Level::Info => "\x1b[32m",     // green
            Level::Warning => "\x1b[33m",  // yellow
            Level::Error => "\x1b[31m",    // red
            Level::Critical => "\x1b[35m", // magenta
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
