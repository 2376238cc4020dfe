use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ThreatLevel {
    Low,
    Medium,
    High,
    Critical,
}

impl ThreatLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ThreatLevel::Low => "LOW",
            ThreatLevel::Medium => "MEDIUM",
            ThreatLevel::High => "HIGH",
            ThreatLevel::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for ThreatLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time view of the monitor, shaped for JSON consumers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub active: bool,
    pub threat_level: ThreatLevel,
    pub threat_score: u8,
    pub monitored_path: String,
    pub recent_alerts: Vec<String>,
    pub files_modified_last_minute: usize,
}

impl StatusSnapshot {
    /// Snapshot reported while no monitoring session exists.
    pub fn inactive() -> Self {
        Self {
            active: false,
            threat_level: ThreatLevel::Low,
            threat_score: 0,
            monitored_path: String::new(),
            recent_alerts: Vec::new(),
            files_modified_last_minute: 0,
        }
    }
}

impl Default for StatusSnapshot {
    fn default() -> Self {
        Self::inactive()
    }
}
