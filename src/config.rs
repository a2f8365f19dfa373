use serde::Deserialize;

/// Logging configuration, immutable once applied.
///
/// Defaults are fixed; caller overrides win per-key, whether they arrive
/// through the builder methods or through `#[serde(default)]`
/// deserialization of a partial config file. `outputs` entries and
/// `format` stay plain strings here and are validated when the pipeline is
/// built, so a bad sink kind surfaces exactly once, at configure time.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Application name; also the base name of the log file.
    pub app_name: String,
    /// Directory for the rotating log file, created on demand.
    pub log_dir: String,
    /// Global minimum severity; unrecognized names fall back to `INFO`.
    pub log_level: String,
    /// Sink kinds to install: `"console"`, `"file"`.
    pub outputs: Vec<String>,
    /// Rotation threshold in bytes; `0` disables rotation.
    pub max_file_size: u64,
    /// Rotated backups kept beyond the live file.
    pub backup_count: u32,
    /// File output format: `"json"` or anything else for plain text.
    pub format: String,
    /// Optional per-sink level override; `None` follows `log_level`.
    pub console_level: Option<String>,
    /// Optional per-sink level override; `None` follows `log_level`.
    pub file_level: Option<String>,
    /// Optional environment name stamped on every record as `env`.
    pub env: Option<String>,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            app_name: "app".to_string(),
            log_dir: "logs".to_string(),
            log_level: "INFO".to_string(),
            outputs: vec!["console".to_string(), "file".to_string()],
            max_file_size: 10 * 1024 * 1024,
            backup_count: 5,
            format: "json".to_string(),
            console_level: None,
            file_level: None,
            env: None,
        }
    }
}

impl LogConfig {
    pub fn new(app_name: impl Into<String>) -> Self {
        LogConfig {
            app_name: app_name.into(),
            ..LogConfig::default()
        }
    }

    pub fn with_log_dir(mut self, log_dir: impl Into<String>) -> Self {
        self.log_dir = log_dir.into();
        self
    }

    pub fn with_log_level(mut self, log_level: impl Into<String>) -> Self {
        self.log_level = log_level.into();
        self
    }

    pub fn with_outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.outputs = outputs.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_backup_count(mut self, count: u32) -> Self {
        self.backup_count = count;
        self
    }

    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = format.into();
        self
    }

    pub fn with_console_level(mut self, level: impl Into<String>) -> Self {
        self.console_level = Some(level.into());
        self
    }

    pub fn with_file_level(mut self, level: impl Into<String>) -> Self {
        self.file_level = Some(level.into());
        self
    }

    pub fn with_env(mut self, env: impl Into<String>) -> Self {
        self.env = Some(env.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_fixed() {
        let config = LogConfig::default();
        assert_eq!(config.log_level, "INFO");
        assert_eq!(config.log_dir, "logs");
        assert_eq!(config.outputs, vec!["console", "file"]);
        assert_eq!(config.format, "json");
        assert_eq!(config.backup_count, 5);
    }

    #[test]
    fn overrides_win_per_key_and_leave_the_rest() {
        let config = LogConfig::new("svc").with_log_level("DEBUG");
        assert_eq!(config.app_name, "svc");
        assert_eq!(config.log_level, "DEBUG");
        assert_eq!(config.log_dir, "logs"); // default retained
    }

    #[test]
    fn partial_deserialization_merges_over_defaults() {
        let config: LogConfig =
            serde_json::from_str(r#"{"log_level": "ERROR", "outputs": ["console"]}"#).unwrap();
        assert_eq!(config.log_level, "ERROR");
        assert_eq!(config.outputs, vec!["console"]);
        assert_eq!(config.app_name, "app");
        assert_eq!(config.max_file_size, 10 * 1024 * 1024);
    }
}
