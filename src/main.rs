use clap::{Parser, ValueEnum};
use color_eyre::{eyre::eyre, Result};
use pirig::config::{self, RigConfig, Seconds};
use pirig::scheduler::Scheduler;
use pirig::wiring::{Backend, SimulatedBench};
use pirig::Rig;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Drive LEDs and motors from controller and button inputs
#[derive(Debug, Parser)]
#[command(name = "pirig", version, about)]
struct Cli {
    /// Rig description (TOML); defaults to $XDG_CONFIG_HOME/pirig/rig.toml
    config: Option<PathBuf>,

    /// Tick period, e.g. "10ms"; overrides [scheduler].period
    #[arg(long, value_parser = config::parse_seconds)]
    period: Option<f32>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    log_level: LogLevel,

    /// Use the in-memory bench instead of GPIO and event devices
    #[arg(long)]
    simulate: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup(cli.log_level.into())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(run(cli))
}

async fn run(cli: Cli) -> Result<()> {
    let path = cli.config.unwrap_or_else(config::default_config_path);
    let config = RigConfig::load(&path).map_err(|e| eyre!("{}: {}", path.display(), e))?;

    let period = cli.period.map(Seconds).unwrap_or(config.scheduler.period);
    if period.get() <= 0.0 {
        return Err(eyre!("Tick period must be positive, got {}", period));
    }

    let backend = if cli.simulate {
        Backend::simulated(SimulatedBench::new())
    } else {
        Backend::gpio()?
    };
    let rig = Rig::from_config(&config, &backend)?;

    let shutdown = CancellationToken::new();
    let signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, stopping after this tick"),
            Err(e) => warn!("Failed to listen for Ctrl-C: {}", e),
        }
        signal.cancel();
    });

    let scheduler = Scheduler::create(rig, period.as_duration()).start();
    match scheduler.run_until_shutdown(shutdown).await {
        Ok(stopped) => {
            drop(stopped.into_rig());
            info!("Rig released");
            Ok(())
        }
        Err(e) => {
            error!("Stopping on fatal error: {}", e);
            Err(e.into())
        }
    }
}

fn setup(level: Level) -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", level.as_str())
    }
    setup_logging_env(level);
    Ok(())
}

fn setup_logging_env(level: Level) {
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
