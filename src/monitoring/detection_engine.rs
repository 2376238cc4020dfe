use crate::events::{file_name, Alert, AlertLog, AlertSeverity, FileEvent, FileEventHandler, FileEventKind};
use crate::monitoring::entropy;
use crate::monitoring::mutation_window::{MutationWindow, BURST_WINDOW};
use crate::monitoring::threat_scorer::{self, HIGH_THREAT_LOG_SCORE};
use crate::utils::Clock;
use shared::{StatusSnapshot, ThreatLevel};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Extensions written by known ransomware families.
pub const SUSPICIOUS_EXTENSIONS: [&str; 5] = ["encrypted", "locked", "crypto", "cerber", "locky"];

/// Document types whose content is sampled for entropy after a modification.
pub const DOCUMENT_EXTENSIONS: [&str; 3] = ["txt", "doc", "pdf"];

/// Alerts included in a status snapshot.
pub const RECENT_ALERT_COUNT: usize = 5;

/// Result of classifying one event before any entropy sampling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ingested {
    /// Directory or non-modification event; nothing changed.
    Ignored,
    /// Counted in the mutation window. `sample` names a document to check for encryption.
    Recorded { sample: Option<PathBuf> },
}

/// Accumulated detection state for one monitoring session.
///
/// Once a suspicious extension is seen the flag stays set until the engine is
/// dropped, so the score never falls below that contribution again.
pub struct DetectionEngine {
    clock: Arc<dyn Clock>,
    window: MutationWindow,
    suspicious_extension_seen: bool,
    high_entropy_files: HashSet<PathBuf>,
    alerts: AlertLog,
    threat_score: u8,
}

impl DetectionEngine {
    pub fn new(clock: Arc<dyn Clock>, alert_history_limit: Option<usize>) -> Self {
        Self {
            clock,
            window: MutationWindow::new(),
            suspicious_extension_seen: false,
            high_entropy_files: HashSet::new(),
            alerts: AlertLog::new(alert_history_limit),
            threat_score: 0,
        }
    }

    /// Classifies an event and samples document content on the calling thread.
    pub fn process_event(&mut self, event: &FileEvent) {
        let Ingested::Recorded { sample } = self.ingest(event) else {
            return;
        };
        if let Some(path) = sample {
            let high = entropy::is_high_entropy(&path);
            self.apply_entropy_verdict(&path, high);
        }
        self.refresh_score();
    }

    /// Window and extension checks. Entropy sampling is left to the caller so it
    /// can run off the ingestion thread.
    pub fn ingest(&mut self, event: &FileEvent) -> Ingested {
        if event.is_directory || event.kind != FileEventKind::Modified {
            return Ingested::Ignored;
        }

        self.window.record(self.clock.now());

        if has_extension(&event.path, &SUSPICIOUS_EXTENSIONS) {
            let alert = Alert::new(
                AlertSeverity::High,
                "SuspiciousExtension",
                format!("Suspicious file extension detected: {}", event.display_name()),
                &event.path,
            );
            log::warn!("⚠️ {}", alert);
            self.alerts.push(alert);
            self.suspicious_extension_seen = true;
        }

        let sample = (has_extension(&event.path, &DOCUMENT_EXTENSIONS) && event.path.exists())
            .then(|| event.path.clone());

        Ingested::Recorded { sample }
    }

    pub fn apply_entropy_verdict(&mut self, path: &Path, high_entropy: bool) {
        if !high_entropy {
            return;
        }

        self.high_entropy_files.insert(path.to_path_buf());
        let alert = Alert::new(
            AlertSeverity::Critical,
            "HighEntropyFile",
            format!(
                "High entropy file detected (possible encryption): {}",
                file_name(path)
            ),
            path,
        );
        log::warn!("⚠️ {}", alert);
        self.alerts.push(alert);
    }

    pub fn refresh_score(&mut self) -> u8 {
        let burst = self.window.count_since(self.clock.now(), BURST_WINDOW);
        self.threat_score = threat_scorer::score(
            burst,
            self.suspicious_extension_seen,
            self.high_entropy_files.len(),
        );

        if self.threat_score > HIGH_THREAT_LOG_SCORE {
            log::error!("🚨 THREAT LEVEL HIGH: {}/100", self.threat_score);
        }
        self.threat_score
    }

    pub fn snapshot(&self, monitored_path: &str) -> StatusSnapshot {
        StatusSnapshot {
            active: true,
            threat_level: self.threat_level(),
            threat_score: self.threat_score,
            monitored_path: monitored_path.to_string(),
            recent_alerts: self.alerts.recent(RECENT_ALERT_COUNT),
            files_modified_last_minute: self.window.len(self.clock.now()),
        }
    }

    pub fn threat_score(&self) -> u8 {
        self.threat_score
    }

    pub fn threat_level(&self) -> ThreatLevel {
        threat_scorer::level(self.threat_score)
    }

    pub fn suspicious_extension_seen(&self) -> bool {
        self.suspicious_extension_seen
    }

    pub fn high_entropy_count(&self) -> usize {
        self.high_entropy_files.len()
    }

    pub fn alerts(&self) -> &AlertLog {
        &self.alerts
    }
}

impl FileEventHandler for DetectionEngine {
    fn handle_event(&mut self, event: FileEvent) {
        self.process_event(&event);
    }
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| extensions.contains(&ext))
}
