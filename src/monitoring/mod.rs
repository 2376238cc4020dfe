pub mod detection_engine;
pub mod entropy;
pub mod entropy_pool;
pub mod mutation_window;
pub mod security_monitor;
pub mod threat_scorer;
pub mod watcher;

pub use detection_engine::DetectionEngine;
pub use mutation_window::MutationWindow;
pub use security_monitor::SecurityMonitor;
pub use watcher::{FileWatcher, NotifyWatcher};
