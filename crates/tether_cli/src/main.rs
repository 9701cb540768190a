//! Tether CLI
//!
//! Soak-test the tether layer: mount actor-backed components, churn them and
//! check that no message reaches an instance after it was removed.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tether_core::Coordinator;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod config;
mod soak;

use config::CliConfig;
use soak::{Bus, Dashboard};

#[derive(Parser)]
#[command(name = "tether")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Tether soak driver", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file
    #[arg(short, long, global = true, default_value = "tether.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a soak: mount, publish, churn, publish, report
    Soak {
        /// Instances mounted at any one time
        #[arg(short, long)]
        instances: Option<usize>,

        /// Ticks published over the whole run
        #[arg(short, long)]
        ticks: Option<u64>,

        /// Share of instances replaced halfway through
        #[arg(long)]
        churn: Option<f64>,
    },

    /// Print the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .init();

    let mut config = CliConfig::load(&cli.config)?;

    match cli.command {
        Commands::Soak {
            instances,
            ticks,
            churn,
        } => {
            if let Some(instances) = instances {
                config.soak.instances = instances;
            }
            if let Some(ticks) = ticks {
                config.soak.ticks = ticks;
            }
            if let Some(churn) = churn {
                config.soak.churn = churn;
            }
            cmd_soak(config).await
        }
        Commands::Config => {
            print!("{}", config.to_toml()?);
            Ok(())
        }
    }
}

async fn cmd_soak(config: CliConfig) -> Result<()> {
    let soak = config.soak;
    info!(
        instances = soak.instances,
        ticks = soak.ticks,
        churn = soak.churn_count(),
        "starting soak"
    );

    // Every subscriber must be able to hold the whole run without lagging
    let bus = Bus::new(soak.ticks as usize + 16);
    let dashboard = Dashboard::new(bus.clone(), soak.instances);
    let mut coordinator = Coordinator::new(dashboard, config.core);
    coordinator.mount()?;

    let driver = tokio::spawn(soak::drive(coordinator.address(), bus, soak));

    // The coordinator is not Send; it runs here while the driver runs on its own task
    coordinator.run().await?;
    let report = driver.await??;

    println!("{report}");
    if !report.is_clean() {
        anyhow::bail!("soak failed: deliveries after removal or out of order");
    }
    info!("soak passed");
    Ok(())
}
