#![allow(dead_code)]

use parking_lot::Mutex;
use ransom_sentinel::{FileEvent, FileEventHandler, FileWatcher, MonitorError, SecurityMonitor, Settings};
use ransom_sentinel::utils::ManualClock;
use shared::StatusSnapshot;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// In-process watcher: the test pushes events, the monitor receives them as if
/// they came from the OS.
#[derive(Clone, Default)]
pub struct ManualWatcher {
    handler: Arc<Mutex<Option<Box<dyn FileEventHandler>>>>,
    fail_with: Arc<Mutex<Option<String>>>,
}

impl ManualWatcher {
    pub fn failing(reason: &str) -> Self {
        let watcher = Self::default();
        *watcher.fail_with.lock() = Some(reason.to_string());
        watcher
    }

    pub fn emit(&self, event: FileEvent) {
        let mut handler = self.handler.lock();
        handler
            .as_mut()
            .expect("emit called while not watching")
            .handle_event(event);
    }

    pub fn is_watching(&self) -> bool {
        self.handler.lock().is_some()
    }
}

impl FileWatcher for ManualWatcher {
    fn watch(
        &mut self,
        _root: &Path,
        _recursive: bool,
        handler: Box<dyn FileEventHandler>,
    ) -> Result<(), MonitorError> {
        if let Some(reason) = self.fail_with.lock().clone() {
            return Err(MonitorError::Watch(reason));
        }
        *self.handler.lock() = Some(handler);
        Ok(())
    }

    fn unwatch(&mut self) {
        self.handler.lock().take();
    }
}

pub fn manual_monitor() -> (SecurityMonitor, ManualWatcher, Arc<ManualClock>) {
    let watcher = ManualWatcher::default();
    let clock = Arc::new(ManualClock::new());
    let monitor = SecurityMonitor::with_watcher(
        Settings::default(),
        Box::new(watcher.clone()),
        clock.clone(),
    );
    (monitor, watcher, clock)
}

/// Polls the monitor until `done` holds, panicking after a few seconds.
pub fn wait_for(
    monitor: &SecurityMonitor,
    done: impl Fn(&StatusSnapshot) -> bool,
) -> StatusSnapshot {
    let deadline = Instant::now() + Duration::from_secs(10);
    loop {
        let status = monitor.get_status();
        if done(&status) {
            return status;
        }
        if Instant::now() > deadline {
            panic!("timed out waiting for monitor state, last status: {:?}", status);
        }
        std::thread::sleep(Duration::from_millis(10));
    }
}
