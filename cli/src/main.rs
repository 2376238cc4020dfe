use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use ransom_sentinel::monitoring::entropy::{self, HIGH_ENTROPY_THRESHOLD, SAMPLE_BYTES};
use ransom_sentinel::monitoring::threat_scorer;
use ransom_sentinel::{SecurityMonitor, Settings};
use shared::{StatusSnapshot, ThreatLevel};
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Parser)]
#[command(name = "sentinel-cli")]
#[command(about = "Ransomware Sentinel command line interface", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Measure the entropy of the head of one or more files
    Entropy {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Compute the threat score for a set of signals
    Score {
        /// Modifications seen in the last 5 seconds
        #[arg(short, long, default_value_t = 0)]
        burst: usize,

        /// A ransomware marker extension has been seen
        #[arg(short, long)]
        suspicious: bool,

        /// Number of high-entropy documents
        #[arg(short = 'e', long, default_value_t = 0)]
        high_entropy: usize,
    },

    /// Monitor a directory in the foreground and print its status
    Watch {
        path: PathBuf,

        /// Stop after this many seconds
        #[arg(short, long, default_value_t = 60)]
        seconds: u64,

        /// Seconds between status lines
        #[arg(short, long, default_value_t = 5)]
        interval: u64,

        /// Print raw JSON snapshots
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Entropy { files } => show_entropy(&files)?,
        Commands::Score {
            burst,
            suspicious,
            high_entropy,
        } => show_score(burst, suspicious, high_entropy),
        Commands::Watch {
            path,
            seconds,
            interval,
            json,
        } => watch(path, seconds, interval, json)?,
    }

    Ok(())
}

fn show_entropy(files: &[PathBuf]) -> Result<()> {
    println!("\n{}", "═══════════════════════════════════════════════════════".cyan());
    println!(
        "{} {} (first {} bytes, threshold {:.1})",
        "Sentinel".bright_cyan().bold(),
        "Entropy".white(),
        SAMPLE_BYTES,
        HIGH_ENTROPY_THRESHOLD
    );
    println!("{}\n", "═══════════════════════════════════════════════════════".cyan());

    let mut failures = 0;
    for file in files {
        match entropy::sample_entropy(file) {
            Ok(value) => {
                let verdict = if value > HIGH_ENTROPY_THRESHOLD {
                    "HIGH".red().bold()
                } else {
                    "normal".green()
                };
                println!("  {:>6.3}  {:<7} {}", value, verdict, file.display());
            }
            Err(e) => {
                failures += 1;
                println!("  {:>6}  {:<7} {} ({})", "-", "error".yellow(), file.display(), e);
            }
        }
    }

    if failures == files.len() {
        bail!("no file could be sampled");
    }
    Ok(())
}

fn show_score(burst: usize, suspicious: bool, high_entropy: usize) {
    let score = threat_scorer::score(burst, suspicious, high_entropy);
    let level = threat_scorer::level(score);
    println!("{} {}/100  {}", "Threat score:".bright_blue(), score, colored_level(level));
}

fn watch(path: PathBuf, seconds: u64, interval: u64, json: bool) -> Result<()> {
    let monitor = SecurityMonitor::new(Settings {
        monitor_path: path.clone(),
        ..Settings::default()
    });
    monitor
        .start(&path)
        .with_context(|| format!("cannot monitor {}", path.display()))?;

    println!(
        "{} {} for {}s (Ctrl+C to abort)",
        "Watching".bright_cyan().bold(),
        path.display(),
        seconds
    );

    let deadline = Instant::now() + Duration::from_secs(seconds);
    let interval = Duration::from_secs(interval.max(1));
    while Instant::now() < deadline {
        std::thread::sleep(interval.min(deadline.saturating_duration_since(Instant::now())));
        let status = monitor.get_status();
        if json {
            println!("{}", serde_json::to_string(&status)?);
        } else {
            print_status(&status);
        }
    }

    monitor.stop()?;
    Ok(())
}

fn print_status(status: &StatusSnapshot) {
    let active = if status.active {
        "ACTIVE".green().bold()
    } else {
        "INACTIVE".red().bold()
    };
    println!(
        "[{}] {} score {}/100  {} modified in the last minute",
        active,
        colored_level(status.threat_level),
        status.threat_score,
        status.files_modified_last_minute
    );
    for alert in &status.recent_alerts {
        println!("  {} {}", "Alert:".bright_blue(), alert);
    }
}

fn colored_level(level: ThreatLevel) -> ColoredString {
    match level {
        ThreatLevel::Critical => level.as_str().red().bold(),
        ThreatLevel::High => level.as_str().bright_red().bold(),
        ThreatLevel::Medium => level.as_str().yellow().bold(),
        ThreatLevel::Low => level.as_str().green().bold(),
    }
}
