// Entry point: parses arguments, loads configuration and runs one command.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use systemd_supervisor::app::App;
use systemd_supervisor::config::Config;
use systemd_supervisor::logging;
use systemd_supervisor::{ServiceAction, Supervisor, SystemBus};

/// Control and query one systemd service over the system bus.
#[derive(Parser, Debug)]
#[command(name = "systemd-supervisor", version, about)]
struct Cli {
    /// Configuration file (defaults to /etc/systemd-supervisor.toml if present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Unit to act on, overriding the configuration
    #[arg(short, long, global = true)]
    service: Option<String>,

    /// More log output (repeatable)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the normalized status once
    Status,
    /// Start the service
    Start,
    /// Stop the service
    Stop,
    /// Clear the service's failed state
    ResetFailed,
    /// Print the status on a fixed period
    Monitor {
        /// Poll period in milliseconds (overrides poll_interval_ms)
        #[arg(short, long, value_parser = clap::value_parser!(u64).range(1..))]
        interval: Option<u64>,

        /// Stop after this many polls
        #[arg(short = 'n', long, value_parser = clap::value_parser!(u64).range(1..))]
        count: Option<u64>,
    },
    /// Start the service, wait, stop it, reporting status in between
    Cycle {
        /// Seconds to keep the service running
        #[arg(long, default_value_t = 3)]
        hold: u64,

        /// Keep monitoring after the service has been stopped
        #[arg(long)]
        then_monitor: bool,
    },
}

fn log_level(cli: &Cli, config: &Config) -> Result<log::LevelFilter> {
    if cli.quiet {
        return Ok(log::LevelFilter::Error);
    }
    Ok(match cli.verbose {
        0 => config.level()?,
        1 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    })
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = Config::locate(cli.config.as_deref());
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(service) = &cli.service {
        config.service = service.clone();
    }
    logging::setup_logging(log_level(&cli, &config)?)?;
    match &config_path {
        Some(path) => log::debug!("loaded config from {}", path.display()),
        None => log::debug!("no config file, using defaults"),
    }

    let bus = SystemBus::new().method_timeout(config.call_timeout());
    let supervisor =
        Supervisor::new(bus, config.service.as_str()).with_deadline(config.call_timeout());

    let tick_rate = match &cli.command {
        Command::Monitor {
            interval: Some(ms), ..
        } => Duration::from_millis(*ms),
        _ => config.poll_interval(),
    };
    let app = App::new(supervisor, tick_rate);
    let mut out = io::stdout().lock();

    match cli.command {
        Command::Status => app.status(&mut out).map(|_| ()),
        Command::Start => app.perform_action(&mut out, ServiceAction::Start),
        Command::Stop => app.perform_action(&mut out, ServiceAction::Stop),
        Command::ResetFailed => app.perform_action(&mut out, ServiceAction::ResetFailed),
        Command::Monitor { count, .. } => app.monitor(&mut out, count),
        Command::Cycle {
            hold,
            then_monitor: false,
        } => app.cycle(&mut out, Duration::from_secs(hold)),
        Command::Cycle {
            hold,
            then_monitor: true,
        } => app.cycle_then_monitor(&mut out, Duration::from_secs(hold), None),
    }
}
