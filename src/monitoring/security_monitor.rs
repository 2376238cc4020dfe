use crate::config::Settings;
use crate::error::MonitorError;
use crate::events::FileEvent;
use crate::monitoring::detection_engine::{DetectionEngine, Ingested};
use crate::monitoring::entropy_pool::{EntropyPool, EntropyVerdict};
use crate::monitoring::watcher::{FileWatcher, NotifyWatcher};
use crate::utils::{Clock, SystemClock};
use crossbeam_channel::{Receiver, RecvError};
use parking_lot::{Mutex, RwLock};
use shared::StatusSnapshot;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;
use std::time::Duration;

/// Poll interval for the dispatcher's shutdown flag.
const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

struct Session {
    root: PathBuf,
    engine: Arc<RwLock<DetectionEngine>>,
    running: Arc<AtomicBool>,
    dispatcher: JoinHandle<()>,
}

/// Owns the watch subscription and the detection state for one monitored tree.
///
/// Construct once at host startup and share by `Arc`. `start`, `stop` and
/// `get_status` are safe to call from any thread.
pub struct SecurityMonitor {
    settings: Settings,
    clock: Arc<dyn Clock>,
    watcher: Mutex<Box<dyn FileWatcher>>,
    session: Mutex<Option<Session>>,
}

impl SecurityMonitor {
    pub fn new(settings: Settings) -> Self {
        Self::with_watcher(settings, Box::new(NotifyWatcher::new()), Arc::new(SystemClock))
    }

    pub fn with_watcher(
        settings: Settings,
        watcher: Box<dyn FileWatcher>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            settings,
            clock,
            watcher: Mutex::new(watcher),
            session: Mutex::new(None),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Subscribes to `root` recursively and starts classifying events.
    ///
    /// Fails without side effects if a session is already running or the watch
    /// cannot be installed.
    pub fn start(&self, root: impl AsRef<Path>) -> Result<(), MonitorError> {
        let root = root.as_ref().to_path_buf();
        let mut session = self.session.lock();
        if let Some(current) = session.as_ref() {
            log::warn!("Security monitoring already active for {}", current.root.display());
            return Err(MonitorError::AlreadyActive(current.root.clone()));
        }

        let (event_tx, event_rx) = crossbeam_channel::unbounded::<FileEvent>();
        let (verdict_tx, verdict_rx) = crossbeam_channel::unbounded::<EntropyVerdict>();

        let pool = EntropyPool::spawn(
            self.settings.entropy_workers,
            self.settings.entropy_queue_capacity,
            verdict_tx,
        )?;

        if let Err(e) = self.watcher.lock().watch(&root, true, Box::new(event_tx)) {
            log::error!("Failed to start security monitoring on {}: {}", root.display(), e);
            return Err(e);
        }

        let engine = Arc::new(RwLock::new(DetectionEngine::new(
            Arc::clone(&self.clock),
            self.settings.alert_history_limit,
        )));
        let running = Arc::new(AtomicBool::new(true));

        let dispatcher = std::thread::Builder::new()
            .name("security-dispatcher".to_string())
            .spawn({
                let engine = Arc::clone(&engine);
                let running = Arc::clone(&running);
                move || {
                    log::info!("Security dispatcher started");
                    run_dispatcher(event_rx, verdict_rx, engine, pool, running);
                    log::info!("Security dispatcher stopped");
                }
            });

        let dispatcher = match dispatcher {
            Ok(handle) => handle,
            Err(source) => {
                self.watcher.lock().unwatch();
                return Err(MonitorError::Spawn {
                    name: "security dispatcher",
                    source,
                });
            }
        };

        log::info!("🛡️ Security monitoring ACTIVE: {}", root.display());
        *session = Some(Session {
            root,
            engine,
            running,
            dispatcher,
        });
        Ok(())
    }

    /// Cancels the subscription and waits for the dispatcher and entropy workers
    /// to exit. Detection state is discarded.
    pub fn stop(&self) -> Result<(), MonitorError> {
        let Some(session) = self.session.lock().take() else {
            return Err(MonitorError::NotActive);
        };

        session.running.store(false, Ordering::Relaxed);
        self.watcher.lock().unwatch();

        if let Err(e) = session.dispatcher.join() {
            log::error!("Security dispatcher panicked: {:?}", e);
        }
        log::info!("Security monitoring STOPPED: {}", session.root.display());
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.session
            .lock()
            .as_ref()
            .is_some_and(|s| !s.dispatcher.is_finished())
    }

    /// Consistent copy of the current detection state. Never mutates it.
    pub fn get_status(&self) -> StatusSnapshot {
        let (engine, root, alive) = {
            let session = self.session.lock();
            match session.as_ref() {
                Some(s) => (
                    Arc::clone(&s.engine),
                    s.root.display().to_string(),
                    !s.dispatcher.is_finished(),
                ),
                None => return StatusSnapshot::inactive(),
            }
        };

        let mut snapshot = engine.read().snapshot(&root);
        snapshot.active = alive;
        snapshot
    }
}

impl Drop for SecurityMonitor {
    fn drop(&mut self) {
        let _ = self.stop();
    }
}

fn run_dispatcher(
    event_rx: Receiver<FileEvent>,
    verdict_rx: Receiver<EntropyVerdict>,
    engine: Arc<RwLock<DetectionEngine>>,
    mut pool: EntropyPool,
    running: Arc<AtomicBool>,
) {
    let no_verdicts = crossbeam_channel::never::<EntropyVerdict>();
    let mut sampling = true;
    while running.load(Ordering::Relaxed) {
        let verdicts = if sampling { &verdict_rx } else { &no_verdicts };
        crossbeam_channel::select! {
            recv(event_rx) -> event => match event {
                Ok(event) => guarded("file event", || dispatch_event(&event, &engine, &mut pool)),
                Err(RecvError) => {
                    log::debug!("Watcher channel closed");
                    break;
                }
            },
            recv(verdicts) -> verdict => match verdict {
                Ok(verdict) => guarded("entropy verdict", || {
                    let mut engine = engine.write();
                    engine.apply_entropy_verdict(&verdict.path, verdict.high_entropy);
                    engine.refresh_score();
                }),
                Err(RecvError) => {
                    log::warn!("All entropy workers exited, content sampling disabled");
                    sampling = false;
                }
            },
            recv(crossbeam_channel::after(SHUTDOWN_POLL)) -> _ => {}
        }
    }

    pool.shutdown();
}

fn dispatch_event(event: &FileEvent, engine: &RwLock<DetectionEngine>, pool: &mut EntropyPool) {
    let mut engine = engine.write();
    match engine.ingest(event) {
        Ingested::Ignored => {}
        Ingested::Recorded { sample } => {
            if let Some(path) = sample {
                pool.submit(path);
            }
            engine.refresh_score();
        }
    }
}

/// Runs one unit of event processing, containing any panic so a single bad
/// event cannot take the dispatcher down.
fn guarded(what: &str, f: impl FnOnce()) {
    if let Err(e) = panic::catch_unwind(AssertUnwindSafe(f)) {
        let reason = e
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| e.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "unknown panic".to_string());
        log::error!("Security event error while processing {}: {}", what, reason);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::ManualClock;
    use std::time::Instant;

    /// Clock that panics on the next read after `fail_next` is set.
    struct FaultyClock {
        inner: ManualClock,
        fail_next: AtomicBool,
    }

    impl Clock for FaultyClock {
        fn now(&self) -> Instant {
            if self.fail_next.swap(false, Ordering::SeqCst) {
                panic!("clock read failed");
            }
            self.inner.now()
        }
    }

    #[test]
    fn guarded_swallows_panics() {
        guarded("test closure", || panic!("boom"));
        guarded("test closure", || panic!("{} failed", "formatted"));

        let mut ran = false;
        guarded("test closure", || ran = true);
        assert!(ran);
    }

    #[test]
    fn dispatcher_survives_a_panicking_event() {
        let clock = Arc::new(FaultyClock {
            inner: ManualClock::new(),
            fail_next: AtomicBool::new(false),
        });
        let engine = Arc::new(RwLock::new(DetectionEngine::new(clock.clone(), None)));
        let (event_tx, event_rx) = crossbeam_channel::unbounded();
        let (verdict_tx, verdict_rx) = crossbeam_channel::unbounded();
        let pool = EntropyPool::spawn(1, 4, verdict_tx).unwrap();
        let running = Arc::new(AtomicBool::new(true));

        let dispatcher = {
            let engine = Arc::clone(&engine);
            let running = Arc::clone(&running);
            std::thread::spawn(move || run_dispatcher(event_rx, verdict_rx, engine, pool, running))
        };

        clock.fail_next.store(true, Ordering::SeqCst);
        event_tx.send(FileEvent::modified("/data/a.locky")).unwrap();
        event_tx.send(FileEvent::modified("/data/b.locky")).unwrap();

        let deadline = Instant::now() + Duration::from_secs(10);
        while engine.read().alerts().is_empty() {
            assert!(Instant::now() < deadline, "second event was never processed");
            std::thread::sleep(Duration::from_millis(10));
        }

        {
            let engine = engine.read();
            assert_eq!(
                engine.alerts().recent(5),
                vec!["Suspicious file extension detected: b.locky"]
            );
            assert_eq!(engine.snapshot("/data").files_modified_last_minute, 1);
        }

        running.store(false, Ordering::Relaxed);
        drop(event_tx);
        dispatcher.join().unwrap();
    }
}
