use crate::error::MonitorError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_SETTINGS_PATH: &str = "config/sentinel.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub monitor_path: PathBuf,
    pub log_level: String,
    pub log_file: Option<PathBuf>,
    pub entropy_workers: usize,
    pub entropy_queue_capacity: usize,
    /// `None` keeps every alert for the life of the session.
    pub alert_history_limit: Option<usize>,
    pub status_interval_secs: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            monitor_path: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            log_level: "info".to_string(),
            log_file: None,
            entropy_workers: 2,
            entropy_queue_capacity: 256,
            alert_history_limit: None,
            status_interval_secs: 30,
        }
    }
}

impl Settings {
    /// Clamps values that would leave the sampling pool unusable.
    fn normalized(mut self) -> Self {
        if self.entropy_workers == 0 {
            log::warn!("entropy_workers must be at least 1, using 1");
            self.entropy_workers = 1;
        }
        if self.entropy_queue_capacity == 0 {
            log::warn!("entropy_queue_capacity must be at least 1, using 1");
            self.entropy_queue_capacity = 1;
        }
        if self.alert_history_limit == Some(0) {
            log::warn!("alert_history_limit of 0 would discard every alert, keeping all");
            self.alert_history_limit = None;
        }
        if self.status_interval_secs == 0 {
            self.status_interval_secs = 1;
        }
        self
    }
}

pub fn load_settings(config_path: &Path) -> Settings {
    if config_path.exists() {
        match fs::read_to_string(config_path) {
            Ok(content) => match serde_json::from_str::<Settings>(&content) {
                Ok(settings) => {
                    log::info!("Loaded configuration from {}", config_path.display());
                    return settings.normalized();
                }
                Err(e) => {
                    log::warn!("Failed to parse config file: {}. Using defaults.", e);
                }
            },
            Err(e) => {
                log::warn!("Failed to read config file: {}. Using defaults.", e);
            }
        }
    }

    log::info!("Using default configuration");
    Settings::default()
}

pub fn save_settings(settings: &Settings, config_path: &Path) -> Result<(), MonitorError> {
    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent).map_err(|e| MonitorError::Config(e.to_string()))?;
    }
    let content =
        serde_json::to_string_pretty(settings).map_err(|e| MonitorError::Config(e.to_string()))?;
    fs::write(config_path, content).map_err(|e| MonitorError::Config(e.to_string()))?;
    Ok(())
}
