//! Application entry point for the glyph field viewer.
//!
//! This binary parses the command line, installs the tracing subscriber,
//! builds the simulation, and hands everything to [`Viewer`].

mod preview;
mod viewer;

use clap::{Parser, ValueEnum};
use glyphfield_core::{EvictionPolicy, SimConfig, Simulation};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use viewer::Viewer;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum PolicyArg {
    Fifo,
    Fade,
}

impl From<PolicyArg> for EvictionPolicy {
    fn from(p: PolicyArg) -> Self {
        match p {
            PolicyArg::Fifo => EvictionPolicy::Fifo,
            PolicyArg::Fade => EvictionPolicy::Fade,
        }
    }
}

/// Type to grow a field of glyphs.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// JSON config file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the simulation's random stream.
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Overrides the capacity policy from the config.
    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,
}

fn load_config(args: &Args) -> Result<SimConfig, glyphfield_core::ConfigError> {
    let mut cfg = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    if let Some(p) = args.policy {
        cfg.capacity.policy = p.into();
    }
    Ok(cfg)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    let cfg = load_config(&args).inspect_err(|e| error!("{e}"))?;
    info!(seed = args.seed, policy = ?cfg.capacity.policy, "starting");

    let sim = Simulation::seeded(cfg, args.seed)?;
    let viewer = Viewer::new(sim)?;

    eframe::run_native(
        "Glyph Field",
        eframe::NativeOptions::default(),
        Box::new(|_cc| Ok(Box::new(viewer))),
    )?;
    Ok(())
}
