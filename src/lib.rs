//! Ransomware-behaviour detection for a monitored directory tree.
//!
//! Filesystem events feed a [`DetectionEngine`] that tracks modification bursts,
//! ransomware marker extensions and high-entropy documents, and derives a 0-100
//! threat score. [`SecurityMonitor`] owns the watch subscription and exposes a
//! [`StatusSnapshot`] that can be polled from any thread.

pub mod config;
pub mod error;
pub mod events;
pub mod monitoring;
pub mod utils;

pub use config::Settings;
pub use error::MonitorError;
pub use events::{FileEvent, FileEventHandler, FileEventKind};
pub use monitoring::{DetectionEngine, FileWatcher, NotifyWatcher, SecurityMonitor};
pub use shared::{StatusSnapshot, ThreatLevel};
