//! leap_pilot: interactive entry point.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use leap_pilot::{run, AppConfig, SensorMode};

#[derive(Parser, Debug)]
#[command(name = "leap_pilot", version, about = "Fly a quadcopter with your hands")]
struct Cli {
    /// TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Ground client input socket, `host:port`.
    #[arg(short, long)]
    target: Option<String>,

    /// Setpoint interval in milliseconds.
    #[arg(long)]
    period_ms: Option<u64>,

    /// Read hands from a LeapMotion controller instead of the mouse.
    #[arg(long)]
    leap: bool,

    /// Discard setpoints instead of sending them.
    #[arg(long)]
    null_link: bool,

    /// Start the link as soon as the window opens.
    #[arg(long)]
    auto_link: bool,

    /// Ignore any config file and run with defaults.
    #[arg(long)]
    quick: bool,
}

impl Cli {
    fn into_config(self) -> Result<AppConfig, leap_pilot::ConfigError> {
        let mut cfg = match (&self.config, self.quick) {
            (Some(path), false) => AppConfig::load(path)?,
            _                   => AppConfig::default(),
        };
        if let Some(target) = self.target {
            cfg.link.target = target;
        }
        if let Some(ms) = self.period_ms {
            cfg.pilot.transmit.period_ms = ms;
        }
        if self.leap      { cfg.sensor = SensorMode::Leap; }
        if self.null_link { cfg.null_link = true; }
        if self.auto_link { cfg.auto_link = true; }
        Ok(cfg)
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("leap_pilot=info,pilot_core=info,pilot_link=info")),
        )
        .init();

    let cli = Cli::parse();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║        Leap Pilot : hand-tracking quadcopter control         ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();

    let cfg = match cli.into_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    match cfg.sensor {
        SensorMode::Sim  => println!("  Mode: mouse simulation  (use --leap for hardware)"),
        SensorMode::Leap => println!("  Mode: LeapMotion hardware"),
    }
    if cfg.null_link {
        println!("  Link: disabled (--null-link)");
    } else {
        println!("  Link: {} every {} ms", cfg.link.target, cfg.pilot.transmit.period_ms);
    }
    println!();
    println!("  Opening visualizer window…");
    println!();

    if let Err(e) = run(cfg) {
        tracing::error!("{e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
