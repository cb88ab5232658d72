pub mod local;

use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use thiserror::Error;
use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter::ParseError, layer::SubscriberExt as _, util::SubscriberInitExt as _,
    util::TryInitError, EnvFilter,
};

use self::local::FileConfig;

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub enum LoggerLayer {
    #[default]
    None,
    Stdout,
    Stderr,
    File(FileConfig),
}

#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoggerSettings {
    pub logger: LoggerLayer,
    #[serde_as(as = "DisplayFromStr")]
    pub level: Level,
    /// `EnvFilter` directives, e.g. `umbra_wallet=debug,info`. Takes
    /// precedence over `level` when set.
    #[serde(default)]
    pub filter: Option<String>,
}

impl Default for LoggerSettings {
    fn default() -> Self {
        Self {
            logger: LoggerLayer::None,
            level: Level::INFO,
            filter: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid filter directives: {0}")]
    Filter(#[from] ParseError),
    #[error("A global subscriber is already installed: {0}")]
    AlreadyInitialized(#[from] TryInitError),
}

/// Installs the global subscriber described by `settings`.
///
/// The returned guard flushes buffered lines when dropped and must be kept
/// alive for as long as logs should be written. `LoggerLayer::None` installs
/// nothing and returns no guard.
pub fn init_logger(settings: &LoggerSettings) -> Result<Option<WorkerGuard>, LoggingError> {
    let filter = match &settings.filter {
        Some(directives) => EnvFilter::try_new(directives)?,
        None => EnvFilter::default().add_directive(settings.level.into()),
    };

    let (writer, guard) = match &settings.logger {
        LoggerLayer::None => return Ok(None),
        LoggerLayer::Stdout => tracing_appender::non_blocking(std::io::stdout()),
        LoggerLayer::Stderr => tracing_appender::non_blocking(std::io::stderr()),
        LoggerLayer::File(config) => tracing_appender::non_blocking(local::file_appender(config)),
    };

    let ansi = matches!(settings.logger, LoggerLayer::Stdout | LoggerLayer::Stderr);
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(ansi),
        )
        .try_init()?;
    Ok(Some(guard))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn settings_read_from_yaml() {
        let settings: LoggerSettings = serde_yaml::from_str(
            "logger: !File\n  directory: /tmp/umbra\n  prefix: node\nlevel: DEBUG\n",
        )
        .unwrap();
        assert_eq!(settings.level, Level::DEBUG);
        assert!(matches!(settings.logger, LoggerLayer::File(_)));
        assert!(settings.filter.is_none());
    }

    #[test]
    fn none_installs_nothing() {
        assert!(init_logger(&LoggerSettings::default()).unwrap().is_none());
    }

    #[test]
    fn bad_filters_are_rejected() {
        let settings = LoggerSettings {
            logger: LoggerLayer::Stderr,
            filter: Some("umbra=notalevel".to_owned()),
            ..LoggerSettings::default()
        };
        assert!(matches!(
            init_logger(&settings),
            Err(LoggingError::Filter(_))
        ));
    }
}
