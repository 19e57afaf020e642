//! Hertz command-line interface.
//!
//! Compute Hertzian dipole radiation maps from TOML configuration files:
//! ```sh
//! hertz run job.toml
//! hertz validate job.toml
//! hertz point job.toml --at 2,2,0
//! hertz example > job.toml
//! ```

mod config;
mod export;
mod render;
mod runner;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hertz")]
#[command(about = "Hertz: far-field radiation maps of Hertzian dipoles")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a sweep from a TOML configuration file.
    Run {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Output directory (overrides config file setting).
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Validate a configuration file without running the sweep.
    Validate {
        /// Path to the job configuration file.
        config: PathBuf,
    },
    /// Evaluate the fields at a single observation point.
    Point {
        /// Path to the job configuration file.
        config: PathBuf,
        /// Observation point in metres, as `x,y,z`.
        #[arg(
            long,
            value_delimiter = ',',
            allow_hyphen_values = true,
            required = true
        )]
        at: Vec<f64>,
        /// Observation time in seconds (default: first instant of the run mode).
        #[arg(long)]
        time: Option<f64>,
        /// Print the full result as JSON instead of a summary.
        #[arg(long)]
        json: bool,
    },
    /// Print a complete example configuration.
    Example,
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Run { config, output } => {
            println!("Hertz Dipole Radiation");
            println!("======================");
            let job = config::load_config(&config)?;
            println!("Configuration: {}", config.display());

            let summary = runner::run_simulation(&job, output.as_deref())?;

            println!(
                "Sweep complete: {} frame(s) in {}",
                summary.frames.len(),
                summary.output_directory.display()
            );
            Ok(())
        }
        Commands::Validate { config } => {
            let _job = config::load_config(&config)?;
            println!("Configuration is valid: {}", config.display());
            Ok(())
        }
        Commands::Point {
            config,
            at,
            time,
            json,
        } => {
            let job = config::load_config(&config)?;
            let at: [f64; 3] = at
                .as_slice()
                .try_into()
                .map_err(|_| anyhow::anyhow!("--at takes exactly three values"))?;

            let result = runner::evaluate_point(&job, at, time)?;
            if json {
                println!("{}", serde_json::to_string_pretty(&result)?);
                return Ok(());
            }

            println!("Observation point: ({}, {}, {}) m", at[0], at[1], at[2]);
            for (f_idx, f) in job.frequencies().iter().enumerate() {
                let e = result.electric.column(f_idx);
                let b = result.magnetic.column(f_idx);
                println!("  f = {:.6e} Hz", f);
                println!("    E = [{:.6e}, {:.6e}, {:.6e}] V/m", e[0], e[1], e[2]);
                println!("    B = [{:.6e}, {:.6e}, {:.6e}] T", b[0], b[1], b[2]);
            }
            println!("  Power proxy: {:.6e}", result.power_proxy());
            println!("  Phase (primary dipole): {:.6}", result.primary_phase());
            Ok(())
        }
        Commands::Example => {
            let text = toml::to_string_pretty(&config::JobConfig::example())?;
            print!("{}", text);
            Ok(())
        }
    }
}
