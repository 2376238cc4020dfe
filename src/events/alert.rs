use std::collections::VecDeque;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertSeverity {
    High,
    Critical,
}

#[derive(Debug, Clone)]
pub struct Alert {
    pub severity: AlertSeverity,
    pub rule_name: &'static str,
    pub message: String,
    pub path: PathBuf,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} - {} - Path: {}",
            self.severity_str(),
            self.rule_name,
            self.message,
            self.path.display()
        )
    }
}

impl Alert {
    pub fn new(
        severity: AlertSeverity,
        rule_name: &'static str,
        message: String,
        path: impl Into<PathBuf>,
    ) -> Self {
        Self {
            severity,
            rule_name,
            message,
            path: path.into(),
            timestamp: chrono::Utc::now(),
        }
    }

    fn severity_str(&self) -> &str {
        match self.severity {
            AlertSeverity::High => "HIGH",
            AlertSeverity::Critical => "CRITICAL",
        }
    }
}

/// Chronological alert history. Unbounded unless a non-zero capacity is given,
/// in which case the oldest entries are evicted first.
#[derive(Debug, Clone, Default)]
pub struct AlertLog {
    entries: VecDeque<Alert>,
    capacity: Option<usize>,
}

impl AlertLog {
    pub fn new(capacity: Option<usize>) -> Self {
        Self {
            entries: VecDeque::new(),
            capacity: capacity.filter(|&c| c > 0),
        }
    }

    pub fn push(&mut self, alert: Alert) {
        if let Some(capacity) = self.capacity {
            while self.entries.len() >= capacity && self.entries.pop_front().is_some() {}
        }
        self.entries.push_back(alert);
    }

    /// Messages of the newest `n` alerts, oldest first.
    pub fn recent(&self, n: usize) -> Vec<String> {
        let start = self.entries.len().saturating_sub(n);
        self.entries
            .iter()
            .skip(start)
            .map(|alert| alert.message.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Alert> {
        self.entries.iter()
    }
}
