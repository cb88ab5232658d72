use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tracing_appender::rolling::{self, RollingFileAppender};

const DEFAULT_PREFIX: &str = "umbra";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileConfig {
    pub directory: PathBuf,
    pub prefix: Option<PathBuf>,
}

/// Daily rotated log files named `<prefix>.<date>` under `directory`.
#[must_use]
pub fn file_appender(config: &FileConfig) -> RollingFileAppender {
    let prefix = config
        .prefix
        .clone()
        .unwrap_or_else(|| PathBuf::from(DEFAULT_PREFIX));
    rolling::daily(&config.directory, prefix)
}
