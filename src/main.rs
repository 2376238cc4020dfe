use anyhow::Context;
use crossbeam_channel::{Receiver, RecvTimeoutError};
use ransom_sentinel::config::{self, DEFAULT_SETTINGS_PATH};
use ransom_sentinel::utils::logging;
use ransom_sentinel::SecurityMonitor;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Once};
use std::time::{Duration, Instant};

static RUNNING: AtomicBool = AtomicBool::new(true);
static SHUTDOWN_ONCE: Once = Once::new();

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));

    // First pass only configures the logger; its warnings have nowhere to go yet.
    let bootstrap = config::load_settings(&config_path);
    logging::init_logging(&bootstrap.log_level, bootstrap.log_file.as_deref())
        .context("failed to initialise logging")?;
    let settings = config::load_settings(&config_path);

    log::info!("=========================================");
    log::info!("       Ransomware Sentinel Starting");
    log::info!("=========================================");
    log::info!("Config file: {}", config_path.display());
    log::info!("Monitored path: {}", settings.monitor_path.display());
    log::info!(
        "Entropy workers: {} (queue {})",
        settings.entropy_workers,
        settings.entropy_queue_capacity
    );

    let monitor = Arc::new(SecurityMonitor::new(settings.clone()));
    if let Err(e) = monitor.start(&settings.monitor_path) {
        log::error!("Security monitoring unavailable: {}", e);
        log::error!("Check that the path exists and is readable by this user");
    }

    ctrlc::set_handler(|| {
        SHUTDOWN_ONCE.call_once(|| {
            log::info!("");
            log::info!("🛑 Received shutdown signal");
            RUNNING.store(false, Ordering::Relaxed);
        });
    })
    .context("failed to set Ctrl+C handler")?;

    let commands = spawn_command_reader();

    log::info!("=========================================");
    log::info!("       Ransomware Sentinel Running");
    log::info!("=========================================");
    log::info!("📊 Monitoring:");
    log::info!("  • Modification bursts");
    log::info!("  • Ransomware marker extensions");
    log::info!("  • High-entropy documents");
    log::info!("");
    log::info!("🛑 To stop: Ctrl+C, or type 'q' / 'stop' then Enter");
    log::info!("📋 Type 'status' for the current threat status");
    log::info!("=========================================");

    let status_interval = Duration::from_secs(settings.status_interval_secs);
    let mut last_status = Instant::now();

    while RUNNING.load(Ordering::Relaxed) {
        match commands.recv_timeout(Duration::from_millis(200)) {
            Ok(command) => handle_command(&command, &monitor),
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // stdin closed (daemonised); rely on Ctrl+C / SIGTERM handling.
                std::thread::sleep(Duration::from_millis(200));
            }
        }

        if last_status.elapsed() >= status_interval {
            log_status(&monitor);
            last_status = Instant::now();
        }
    }

    log::info!("");
    log::info!("=========================================");
    log::info!("       Initiating Graceful Shutdown");
    log::info!("=========================================");
    match monitor.stop() {
        Ok(()) => log::info!("✅ Security monitor stopped"),
        Err(e) => log::info!("Security monitor was not running: {}", e),
    }
    log::info!("=========================================");
    log::info!("       Shutdown Complete");
    log::info!("=========================================");

    Ok(())
}

fn spawn_command_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    std::thread::spawn(move || {
        for line in io::stdin().lock().lines() {
            let Ok(line) = line else { break };
            if tx.send(line.trim().to_lowercase()).is_err() {
                break;
            }
        }
    });
    rx
}

fn handle_command(command: &str, monitor: &SecurityMonitor) {
    match command {
        "q" | "quit" | "exit" | "stop" => {
            SHUTDOWN_ONCE.call_once(|| {
                log::info!("🛑 Manual shutdown requested via command: '{}'", command);
                RUNNING.store(false, Ordering::Relaxed);
            });
        }
        "status" | "info" => log_status(monitor),
        "" => {}
        other => {
            log::info!("❓ Unknown command: '{}'", other);
            log::info!("   Available commands: q, quit, exit, stop, status");
        }
    }
}

fn log_status(monitor: &SecurityMonitor) {
    let status = monitor.get_status();
    match serde_json::to_string(&status) {
        Ok(json) => log::info!("📊 Status: {}", json),
        Err(e) => log::warn!("Failed to serialise status: {}", e),
    }
}
