//! Dispatcher configuration.
//!
//! Configuration is read from TOML and can be overlaid with environment
//! variables:
//!
//! ```toml
//! name = "orders"
//! after_completion = "log_and_continue"
//!
//! [must_understand]
//! enabled = true
//! fault_string = "Unsupported mandatory header"
//! lang = "en"
//!
//! [logging]
//! level = "debug"
//! timestamps = false
//! ```
//!
//! Environment overlay (see [`DispatcherConfig::apply_env`]):
//! - `WSDISPATCH_NAME`
//! - `WSDISPATCH_MUST_UNDERSTAND`: `true`/`false`
//! - `WSDISPATCH_AFTER_COMPLETION`: `propagate_first` / `log_and_continue`
//! - `WSDISPATCH_LOG`, `WSDISPATCH_LOG_TIMESTAMPS`, `WSDISPATCH_LOG_TARGETS`,
//!   `WSDISPATCH_LOG_FILE_LINE`

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use log::Level;
use serde::{Deserialize, Serialize};
use wsdispatch_core::logging::{debug, targets};
use wsdispatch_core::{WsError, WsResult};

use crate::{LoggingConfig, MustUnderstandConfig};

/// How errors raised by `after_completion` callbacks are reported.
///
/// Every callback always runs; this only decides what dispatch returns when
/// it otherwise succeeded. A dispatch error always takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AfterCompletionPolicy {
    /// Return the first callback error.
    #[default]
    PropagateFirst,
    /// Log callback errors and report success.
    LogAndContinue,
}

impl FromStr for AfterCompletionPolicy {
    type Err = WsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "propagate_first" | "propagate" => Ok(Self::PropagateFirst),
            "log_and_continue" | "log" => Ok(Self::LogAndContinue),
            other => Err(WsError::configuration(format!(
                "unknown after-completion policy [{other}]"
            ))),
        }
    }
}

impl fmt::Display for AfterCompletionPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PropagateFirst => f.write_str("propagate_first"),
            Self::LogAndContinue => f.write_str("log_and_continue"),
        }
    }
}

/// Logging section of [`DispatcherConfig`]. Unset fields keep the
/// [`LoggingConfig`] defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// Minimum level: error, warn, info, debug or trace.
    pub level: Option<String>,
    /// Show timestamps.
    pub timestamps: Option<bool>,
    /// Show targets.
    pub targets: Option<bool>,
    /// Show file:line.
    pub file_line: Option<bool>,
}

impl LoggingSettings {
    /// Resolves these settings into a [`LoggingConfig`].
    pub fn to_logging_config(&self) -> WsResult<LoggingConfig> {
        let defaults = LoggingConfig::default();
        let level = match &self.level {
            Some(level) => parse_level(level)?,
            None => defaults.level,
        };
        Ok(LoggingConfig {
            level,
            timestamps: self.timestamps.unwrap_or(defaults.timestamps),
            targets: self.targets.unwrap_or(defaults.targets),
            file_line: self.file_line.unwrap_or(defaults.file_line),
        })
    }
}

/// Top-level dispatcher configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    /// Dispatcher name, used in log lines.
    pub name: String,
    /// mustUnderstand processing.
    pub must_understand: MustUnderstandConfig,
    /// after_completion error handling.
    pub after_completion: AfterCompletionPolicy,
    /// Logging.
    pub logging: LoggingSettings,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            name: "wsdispatch".to_string(),
            must_understand: MustUnderstandConfig::default(),
            after_completion: AfterCompletionPolicy::default(),
            logging: LoggingSettings::default(),
        }
    }
}

impl DispatcherConfig {
    /// Parses a TOML document.
    pub fn from_toml_str(source: &str) -> WsResult<Self> {
        let config: Self = toml::from_str(source).map_err(|err| {
            WsError::configuration(format!("invalid dispatcher configuration: {err}"))
                .with_source(err)
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> WsResult<Self> {
        let path = path.as_ref();
        debug!(target: targets::CONFIG, "Loading dispatcher configuration from {}", path.display());
        let source = std::fs::read_to_string(path).map_err(|err| {
            WsError::configuration(format!("cannot read {}: {err}", path.display())).with_source(err)
        })?;
        Self::from_toml_str(&source)
    }

    /// Overlays `WSDISPATCH_*` environment variables.
    pub fn apply_env(self) -> WsResult<Self> {
        self.apply_env_with(|key| std::env::var(key).ok())
    }

    /// Overlays variables read through `lookup`.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> WsResult<Self> {
        if let Some(name) = lookup("WSDISPATCH_NAME") {
            self.name = name;
        }
        if let Some(value) = lookup("WSDISPATCH_MUST_UNDERSTAND") {
            self.must_understand.enabled = parse_bool("WSDISPATCH_MUST_UNDERSTAND", &value)?;
        }
        if let Some(value) = lookup("WSDISPATCH_AFTER_COMPLETION") {
            self.after_completion = value.parse()?;
        }
        if let Some(value) = lookup("WSDISPATCH_LOG") {
            parse_level(&value)?;
            self.logging.level = Some(value);
        }
        if let Some(value) = lookup("WSDISPATCH_LOG_TIMESTAMPS") {
            self.logging.timestamps = Some(parse_bool("WSDISPATCH_LOG_TIMESTAMPS", &value)?);
        }
        if let Some(value) = lookup("WSDISPATCH_LOG_TARGETS") {
            self.logging.targets = Some(parse_bool("WSDISPATCH_LOG_TARGETS", &value)?);
        }
        if let Some(value) = lookup("WSDISPATCH_LOG_FILE_LINE") {
            self.logging.file_line = Some(parse_bool("WSDISPATCH_LOG_FILE_LINE", &value)?);
        }
        self.validate()?;
        Ok(self)
    }

    /// Resolves the logging section.
    pub fn logging_config(&self) -> WsResult<LoggingConfig> {
        self.logging.to_logging_config()
    }

    fn validate(&self) -> WsResult<()> {
        if self.name.trim().is_empty() {
            return Err(WsError::configuration("dispatcher name must not be empty"));
        }
        if let Some(level) = &self.logging.level {
            parse_level(level)?;
        }
        Ok(())
    }
}

fn parse_level(value: &str) -> WsResult<Level> {
    match value.trim().to_lowercase().as_str() {
        "warning" => Ok(Level::Warn),
        other => other
            .parse::<Level>()
            .map_err(|_| WsError::configuration(format!("unknown log level [{value}]"))),
    }
}

fn parse_bool(key: &str, value: &str) -> WsResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(WsError::configuration(format!(
            "{key} must be a boolean, got [{value}]"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::io::Write as _;

    use wsdispatch_core::WsErrorCode;

    use super::*;
    use crate::DEFAULT_MUST_UNDERSTAND_FAULT_STRING;

    #[test]
    fn defaults() {
        let config = DispatcherConfig::default();
        assert_eq!(config.name, "wsdispatch");
        assert!(config.must_understand.enabled);
        assert_eq!(config.must_understand.fault_string, DEFAULT_MUST_UNDERSTAND_FAULT_STRING);
        assert_eq!(config.after_completion, AfterCompletionPolicy::PropagateFirst);
        assert_eq!(config.logging_config().unwrap().level, Level::Info);
    }

    #[test]
    fn parses_toml() {
        let config = DispatcherConfig::from_toml_str(
            r#"
            name = "orders"
            after_completion = "log_and_continue"

            [must_understand]
            enabled = false
            fault_string = "Unsupported header"

            [logging]
            level = "DEBUG"
            file_line = true
            "#,
        )
        .unwrap();

        assert_eq!(config.name, "orders");
        assert_eq!(config.after_completion, AfterCompletionPolicy::LogAndContinue);
        assert!(!config.must_understand.enabled);
        assert_eq!(config.must_understand.fault_string, "Unsupported header");
        assert_eq!(config.must_understand.lang.as_deref(), Some("en"));

        let logging = config.logging_config().unwrap();
        assert_eq!(logging.level, Level::Debug);
        assert!(logging.file_line);
        assert!(logging.timestamps);
    }

    #[test]
    fn empty_document_is_default() {
        assert_eq!(DispatcherConfig::from_toml_str("").unwrap(), DispatcherConfig::default());
    }

    #[test]
    fn invalid_input_is_a_configuration_error() {
        let err = DispatcherConfig::from_toml_str("after_completion = \"explode\"").unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);

        let err = DispatcherConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);

        let err = DispatcherConfig::from_toml_str("name = \"  \"").unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
    }

    #[test]
    fn env_overlay() {
        let env: HashMap<&str, &str> = HashMap::from([
            ("WSDISPATCH_NAME", "billing"),
            ("WSDISPATCH_MUST_UNDERSTAND", "off"),
            ("WSDISPATCH_AFTER_COMPLETION", "log"),
            ("WSDISPATCH_LOG", "warning"),
            ("WSDISPATCH_LOG_TIMESTAMPS", "0"),
        ]);
        let config = DispatcherConfig::default()
            .apply_env_with(|key| env.get(key).map(|v| (*v).to_string()))
            .unwrap();

        assert_eq!(config.name, "billing");
        assert!(!config.must_understand.enabled);
        assert_eq!(config.after_completion, AfterCompletionPolicy::LogAndContinue);
        let logging = config.logging_config().unwrap();
        assert_eq!(logging.level, Level::Warn);
        assert!(!logging.timestamps);
        assert!(logging.targets);
    }

    #[test]
    fn env_overlay_rejects_garbage() {
        let err = DispatcherConfig::default()
            .apply_env_with(|key| (key == "WSDISPATCH_MUST_UNDERSTAND").then(|| "maybe".to_string()))
            .unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
        assert!(err.message.contains("WSDISPATCH_MUST_UNDERSTAND"));
    }

    #[test]
    fn env_overlay_rejects_blank_name() {
        let err = DispatcherConfig::default()
            .apply_env_with(|key| (key == "WSDISPATCH_NAME").then(String::new))
            .unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
        assert!(err.message.contains("name"));
    }

    #[test]
    fn reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "name = \"from-file\"").unwrap();
        let config = DispatcherConfig::from_file(file.path()).unwrap();
        assert_eq!(config.name, "from-file");

        let err = DispatcherConfig::from_file("/nonexistent/wsdispatch.toml").unwrap_err();
        assert_eq!(err.code, WsErrorCode::Configuration);
    }

    #[test]
    fn policy_names() {
        assert_eq!("propagate_first".parse::<AfterCompletionPolicy>().unwrap(), AfterCompletionPolicy::PropagateFirst);
        assert_eq!(AfterCompletionPolicy::LogAndContinue.to_string(), "log_and_continue");
        assert!("sometimes".parse::<AfterCompletionPolicy>().is_err());
    }
}
