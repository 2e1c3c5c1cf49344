use std::fs::{self, OpenOptions};
use std::sync::Mutex;

use clap::Parser;
use innpulse::cli::Cli;
use innpulse::config::Config;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "INNPULSE_LOG";

/// Initialize the tracing subscriber. While the TUI owns the terminal,
/// logs go to ~/.innpulse/innpulse.log instead of stderr.
fn init_tracing(verbose: bool, to_file: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV)
        .unwrap_or_else(|_| EnvFilter::new(format!("innpulse={}", default_level)));

    if to_file {
        let log_file = Config::home_dir().and_then(|dir| {
            fs::create_dir_all(&dir).ok()?;
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(dir.join("innpulse.log"))
                .ok()
        });
        // Without a log file, stay silent rather than draw over the TUI
        if let Some(file) = log_file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        return;
    }

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose(), cli.is_interactive());
    cli.run()
}
