use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("Monitoring is already active for {0}")]
    AlreadyActive(PathBuf),
    #[error("Monitoring is not active")]
    NotActive,
    #[error("Watcher error: {0}")]
    Watch(String),
    #[error("Failed to spawn {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: std::io::Error,
    },
    #[error("Config error: {0}")]
    Config(String),
}

impl From<notify::Error> for MonitorError {
    fn from(err: notify::Error) -> Self {
        MonitorError::Watch(err.to_string())
    }
}
