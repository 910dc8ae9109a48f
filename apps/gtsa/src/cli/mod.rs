//! # gtsa CLI Module
//!
//! This module implements the CLI interface for gtsa.
//!
//! ## Available Commands
//!
//! - `fe-profile` - Free-energy profile F(V) at one bond energy
//! - `yield` - Equilibrium target yield over an energy sweep
//! - `barrier` - Nucleation barrier over an energy sweep
//! - `incidental` - Incidental-binding matrix and on/off pathway ratio
//! - `compare` - Difference statistics of two histograms
//!
//! Every thermodynamic command ends with a variance mode: `zero-var` (all
//! bonds at the mean energy) or `const-var` (mean energies corrected by a
//! measured distribution file).

mod commands;

use clap::{Parser, Subcommand};
use gtsa_core::GtsaError;
use std::path::PathBuf;

use crate::config::RunConfig;

pub use commands::*;

// =============================================================================
// CLI STRUCTURE
// =============================================================================

/// gtsa - equilibrium thermodynamics of self-assembly
///
/// Turns a sampled subgraph density of states into yields, free-energy
/// profiles, nucleation barriers and incidental-binding ratios.
#[derive(Parser, Debug)]
#[command(name = "gtsa")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Suppress the summary printed on stdout
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Print the summary as JSON (for programmatic access)
    #[arg(long, global = true)]
    pub json: bool,

    /// Path to a TOML run configuration
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Reject histogram files with unlisted cells
    #[arg(long, global = true)]
    pub strict: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Free-energy profile F(V) at a single bond energy
    FeProfile {
        /// Path to the density-of-states (lnhEV) file
        dos: PathBuf,

        /// Path to the dihedral-entropy file (with qcoord/qdih tags)
        dihedrals: PathBuf,

        /// Dimensionless number density
        rho: f64,

        /// Path to the output file
        #[arg(short, long, default_value = "fe_profile.dat")]
        output: PathBuf,

        /// Variance mode
        #[command(subcommand)]
        variance: Option<PointVariance>,
    },

    /// Equilibrium yield of the target over a bond-energy sweep
    Yield {
        /// Path to the density-of-states (lnhEV) file
        dos: PathBuf,

        /// Path to the dihedral-entropy file (with qcoord/qdih tags)
        dihedrals: PathBuf,

        /// Dimensionless number density
        rho: f64,

        /// Path to the output file
        #[arg(short, long, default_value = "yield.dat")]
        output: PathBuf,

        /// Variance mode
        #[command(subcommand)]
        variance: Option<SweepVariance>,
    },

    /// Nucleation barrier over a bond-energy sweep
    Barrier {
        /// Path to the density-of-states (lnhEV) file
        dos: PathBuf,

        /// Path to the dihedral-entropy file (with qcoord/qdih tags)
        dihedrals: PathBuf,

        /// Dimensionless number density
        rho: f64,

        /// Path to the output file
        #[arg(short, long, default_value = "barrier.dat")]
        output: PathBuf,

        /// Variance mode
        #[command(subcommand)]
        variance: Option<SweepVariance>,
    },

    /// Incidental-binding matrix Zin(V1,V2) and the on/off pathway ratio
    Incidental {
        /// Path to the density-of-states (lnhEV) file
        dos: PathBuf,

        /// Path to the dihedral-entropy file (with qcoord/qdih tags)
        dihedrals: PathBuf,

        /// Dimensionless number density
        rho: f64,

        /// Path to the adjacent-edges file
        adjacents: PathBuf,

        /// Mean dimensionless incidental bond weight
        #[arg(allow_negative_numbers = true)]
        w: f64,

        /// Path to the output file
        #[arg(short, long, default_value = "incidental.dat")]
        output: PathBuf,

        /// Fraction of dangling edges able to bind
        #[arg(long, default_value = "1.0")]
        active_fraction: f64,

        /// Upper bound on simultaneous incidental bonds
        #[arg(long)]
        max_bonds: Option<usize>,

        /// Variance mode
        #[command(subcommand)]
        variance: Option<PointVariance>,
    },

    /// Mean, standard deviation and largest absolute value of hist2 - hist1
    Compare {
        /// Path to the first histogram
        hist1: PathBuf,

        /// Path to the second histogram
        hist2: PathBuf,
    },
}

/// Variance mode of a single-energy command.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum PointVariance {
    /// Every bond has the mean energy
    ZeroVar {
        /// Dimensionless bond energy
        #[arg(value_name = "E", allow_negative_numbers = true)]
        epsilon: f64,
    },

    /// Bond energies corrected by a measured mean-energy distribution
    ConstVar {
        /// Dimensionless bond energy
        #[arg(value_name = "E", allow_negative_numbers = true)]
        epsilon: f64,

        /// Path to the energy distribution file
        distribution: PathBuf,
    },
}

/// Variance mode of a sweeping command.
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum SweepVariance {
    /// Every bond has the mean energy
    ZeroVar {
        /// Minimum dimensionless energy
        #[arg(value_name = "EMIN", allow_negative_numbers = true)]
        emin: f64,

        /// Maximum dimensionless energy
        #[arg(value_name = "EMAX", allow_negative_numbers = true)]
        emax: f64,

        /// Dimensionless energy step
        #[arg(value_name = "DE", allow_negative_numbers = true)]
        de: f64,
    },

    /// Bond energies corrected by a measured mean-energy distribution
    ConstVar {
        /// Minimum dimensionless energy
        #[arg(value_name = "EMIN", allow_negative_numbers = true)]
        emin: f64,

        /// Maximum dimensionless energy
        #[arg(value_name = "EMAX", allow_negative_numbers = true)]
        emax: f64,

        /// Dimensionless energy step
        #[arg(value_name = "DE", allow_negative_numbers = true)]
        de: f64,

        /// Path to the energy distribution file
        distribution: PathBuf,
    },
}

impl PointVariance {
    /// Split into the bond energy and the energy model.
    #[must_use]
    pub fn into_parts(self) -> (f64, EnergyModel) {
        match self {
            Self::ZeroVar { epsilon } => (epsilon, EnergyModel::ZeroVariance),
            Self::ConstVar {
                epsilon,
                distribution,
            } => (epsilon, EnergyModel::ConstantVariance(distribution)),
        }
    }
}

impl SweepVariance {
    /// Split into the validated sweep and the energy model.
    pub fn into_parts(self) -> Result<(gtsa_core::EnergySweep, EnergyModel), GtsaError> {
        let (emin, emax, de, model) = match self {
            Self::ZeroVar { emin, emax, de } => (emin, emax, de, EnergyModel::ZeroVariance),
            Self::ConstVar {
                emin,
                emax,
                de,
                distribution,
            } => (emin, emax, de, EnergyModel::ConstantVariance(distribution)),
        };
        Ok((gtsa_core::EnergySweep::new(emin, emax, de)?, model))
    }
}

fn variance_required<T>(variance: Option<T>) -> Result<T, GtsaError> {
    variance.ok_or_else(|| GtsaError::Config("variance mode not specified".to_string()))
}

// =============================================================================
// COMMAND EXECUTION
// =============================================================================

/// Execute the CLI with parsed arguments and a loaded run configuration.
pub fn execute(cli: Cli, config: &RunConfig) -> Result<(), GtsaError> {
    let ctx = RunContext::new(&cli, config);

    match cli.command {
        Commands::FeProfile {
            dos,
            dihedrals,
            rho,
            output,
            variance,
        } => {
            let (epsilon, model) = variance_required(variance)?.into_parts();
            cmd_fe_profile(&ctx, &dos, &dihedrals, rho, epsilon, &model, &output)
        }
        Commands::Yield {
            dos,
            dihedrals,
            rho,
            output,
            variance,
        } => {
            let (sweep, model) = variance_required(variance)?.into_parts()?;
            cmd_yield(&ctx, &dos, &dihedrals, rho, &sweep, &model, &output)
        }
        Commands::Barrier {
            dos,
            dihedrals,
            rho,
            output,
            variance,
        } => {
            let (sweep, model) = variance_required(variance)?.into_parts()?;
            cmd_barrier(&ctx, &dos, &dihedrals, rho, &sweep, &model, &output)
        }
        Commands::Incidental {
            dos,
            dihedrals,
            rho,
            adjacents,
            w,
            output,
            active_fraction,
            max_bonds,
            variance,
        } => {
            let (epsilon, model) = variance_required(variance)?.into_parts();
            let binding = IncidentalOptions {
                w,
                active_fraction,
                max_bonds,
            };
            cmd_incidental(
                &ctx, &dos, &dihedrals, rho, &adjacents, &binding, epsilon, &model, &output,
            )
        }
        Commands::Compare { hist1, hist2 } => cmd_compare(&ctx, &hist1, &hist2),
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    #[test]
    fn parses_sweep_with_negative_energies() {
        let cli = Cli::try_parse_from([
            "gtsa", "yield", "dos.dat", "dih.dat", "0.01", "zero-var", "-10", "-2", "0.5",
        ])
        .expect("parse");
        match cli.command {
            Commands::Yield { rho, variance, .. } => {
                assert_eq!(rho, 0.01);
                assert_eq!(
                    variance,
                    Some(SweepVariance::ZeroVar {
                        emin: -10.0,
                        emax: -2.0,
                        de: 0.5
                    })
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn parses_const_var_with_distribution() {
        let cli = Cli::try_parse_from([
            "gtsa",
            "fe-profile",
            "dos.dat",
            "dih.dat",
            "0.1",
            "--output",
            "out.dat",
            "const-var",
            "3.5",
            "dist.dat",
        ])
        .expect("parse");
        match cli.command {
            Commands::FeProfile {
                output, variance, ..
            } => {
                assert_eq!(output, PathBuf::from("out.dat"));
                let (epsilon, model) = variance.expect("variance").into_parts();
                assert_eq!(epsilon, 3.5);
                assert_eq!(
                    model,
                    EnergyModel::ConstantVariance(PathBuf::from("dist.dat"))
                );
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn missing_variance_is_config_error() {
        let cli = Cli::try_parse_from(["gtsa", "barrier", "dos.dat", "dih.dat", "0.1"])
            .expect("parse");
        let result = execute(cli, &RunConfig::default());
        assert!(
            matches!(result, Err(GtsaError::Config(ref msg)) if msg.contains("variance mode")),
            "got {:?}",
            result
        );
    }

    #[test]
    fn invalid_sweep_rejected_before_loading() {
        let cli = Cli::try_parse_from([
            "gtsa", "yield", "dos.dat", "dih.dat", "0.1", "zero-var", "1", "0", "0.1",
        ])
        .expect("parse");
        assert!(matches!(
            execute(cli, &RunConfig::default()),
            Err(GtsaError::InvalidSweep(_))
        ));
    }

    #[test]
    fn incidental_options() {
        let cli = Cli::try_parse_from([
            "gtsa",
            "incidental",
            "dos.dat",
            "dih.dat",
            "0.05",
            "adj.dat",
            "1.5",
            "--max-bonds",
            "2",
            "--active-fraction",
            "0.5",
            "zero-var",
            "4",
        ])
        .expect("parse");
        match cli.command {
            Commands::Incidental {
                w,
                active_fraction,
                max_bonds,
                ..
            } => {
                assert_eq!(w, 1.5);
                assert_eq!(active_fraction, 0.5);
                assert_eq!(max_bonds, Some(2));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }
}
