//! # gtsa - Equilibrium Thermodynamics of Self-Assembly
//!
//! The main binary for the gtsa thermodynamic model.
//!
//! This application provides driver commands that read the density-of-states
//! files written by the sampler and tabulate:
//! - Free-energy profiles F(V)
//! - Equilibrium target yields over a bond-energy sweep
//! - Nucleation barriers over a bond-energy sweep
//! - Incidental-binding matrices and on/off pathway ratios
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    apps/gtsa (THE BINARY)                   │
//! │                                                             │
//! │  ┌─────────────┐    ┌──────────────┐    ┌───────────────┐   │
//! │  │    CLI      │    │  Run config  │    │ Result tables │   │
//! │  │   (clap)    │    │   (toml)     │    │  (%g text)    │   │
//! │  └──────┬──────┘    └──────┬───────┘    └───────┬───────┘   │
//! │         │                  │                    │           │
//! │         └──────────────────┼────────────────────┘           │
//! │                            ▼                                │
//! │                    ┌───────────────┐                        │
//! │                    │   gtsa-core   │                        │
//! │                    │  (THE MODEL)  │                        │
//! │                    └───────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```bash
//! gtsa yield lnhEV.dat dihedrals.dat 0.001 zero-var 0 20 0.1
//! gtsa barrier lnhEV.dat dihedrals.dat 0.001 const-var 0 20 0.1 energies.dat
//! gtsa fe-profile lnhEV.dat dihedrals.dat 0.001 zero-var 8.5
//! gtsa incidental lnhEV.dat dihedrals.dat 0.001 adjacents.dat 1.0 zero-var 8.5
//! gtsa compare run1/lnhEV.dat run2/lnhEV.dat
//! ```

use clap::{CommandFactory, Parser};
use gtsa::cli;
use gtsa::config::RunConfig;
use gtsa_core::GtsaError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// =============================================================================
// APPLICATION ENTRY POINT
// =============================================================================

/// Exit status for usage and configuration errors.
const EXIT_USAGE: i32 = 2;

/// Exit status for every other failure.
const EXIT_FAILURE: i32 = 1;

fn main() {
    let cli = cli::Cli::parse();
    init_tracing(cli.verbose);

    let config = match RunConfig::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => fail(&e),
    };
    if let Err(e) = config.init_thread_pool() {
        fail(&e);
    }

    if let Err(e) = cli::execute(cli, &config) {
        fail(&e);
    }
}

/// Initialize tracing: GTSA_LOG_FORMAT=json enables machine-parseable output.
fn init_tracing(verbose: bool) {
    let log_format = std::env::var("GTSA_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let default_filter = if verbose { "gtsa=debug" } else { "gtsa=info" };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| default_filter.into());

    match log_format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(filter)
                .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

/// Report `e` and exit. Configuration errors print the usage line first.
fn fail(e: &GtsaError) -> ! {
    if let GtsaError::Config(_) = e {
        eprintln!("{}", cli::Cli::command().render_usage());
        tracing::error!("Error: {}", e);
        std::process::exit(EXIT_USAGE);
    }
    tracing::error!("Error: {}", e);
    std::process::exit(EXIT_FAILURE);
}
