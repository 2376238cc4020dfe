use simplelog::*;
use std::fs::OpenOptions;
use std::path::Path;
use std::str::FromStr;

/// Installs the process-wide logger: terminal output plus an optional append-only file.
pub fn init_logging(level: &str, log_file: Option<&Path>) -> anyhow::Result<()> {
    let level = LevelFilter::from_str(level).unwrap_or_else(|_| {
        eprintln!("[!] Unknown log level '{}', falling back to info", level);
        LevelFilter::Info
    });

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        loggers.push(WriteLogger::new(level, Config::default(), file));
    }

    CombinedLogger::init(loggers)?;
    Ok(())
}
