//! # CLI Command Implementations
//!
//! This module contains the actual implementations of CLI commands.
//!
//! Every command loads all of its inputs before computing, writes one result
//! table and prints a short summary (text or JSON) on stdout.

use crate::config::RunConfig;
use crate::output;
use gtsa_core::{
    DihedralData, EnergyCorrection, EnergySweep, GtsaError, Histogram, IncidentalParams,
    PartitionFunction, TargetSet, assembly_yield, free_energy_profile, incidental_matrix,
    nucleation_barrier, on_off_pathway_ratio, read_histogram,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

// =============================================================================
// FILE SIZE LIMITS
// =============================================================================

/// Maximum size of a histogram input file (256 MB).
///
/// Grids for the largest sampled structures stay well below this.
const MAX_HISTOGRAM_FILE_SIZE: u64 = 256 * 1024 * 1024;

/// Validate file size before reading.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), GtsaError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| GtsaError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(GtsaError::IoError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Resolve an input path and require a regular file.
fn validate_file_path(path: &Path) -> Result<PathBuf, GtsaError> {
    let canonical = path.canonicalize().map_err(|e| {
        GtsaError::IoError(format!("Invalid file path '{}': {}", path.display(), e))
    })?;

    if !canonical.is_file() {
        return Err(GtsaError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }

    Ok(canonical)
}

/// Resolve an output path: the parent directory must exist.
fn validate_output_path(path: &Path) -> Result<PathBuf, GtsaError> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let canonical_parent = parent.canonicalize().map_err(|e| {
        GtsaError::IoError(format!(
            "Invalid output directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    if !canonical_parent.is_dir() {
        return Err(GtsaError::IoError(format!(
            "Output directory '{}' is not a valid directory",
            parent.display()
        )));
    }

    let filename = path
        .file_name()
        .ok_or_else(|| GtsaError::IoError("Output path has no filename".to_string()))?;

    Ok(canonical_parent.join(filename))
}

// =============================================================================
// RUN CONTEXT
// =============================================================================

/// Settings shared by every command, merged from the CLI flags and the run
/// configuration.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Print the summary as JSON.
    pub json_mode: bool,
    /// Print no summary at all.
    pub quiet: bool,
    /// Reject histogram files with unlisted cells.
    pub strict: bool,
    /// Tolerance for target cells.
    pub target_tolerance: f64,
    /// Base directory for relative output paths.
    pub output_dir: Option<PathBuf>,
}

impl RunContext {
    /// Merge CLI flags over the run configuration.
    #[must_use]
    pub fn new(cli: &super::Cli, config: &RunConfig) -> Self {
        Self {
            json_mode: cli.json,
            quiet: cli.quiet,
            strict: cli.strict || config.strict,
            target_tolerance: config.target_tolerance,
            output_dir: config.output_dir.clone(),
        }
    }

    /// Output path for a result table.
    fn output_path(&self, path: &Path) -> Result<PathBuf, GtsaError> {
        match &self.output_dir {
            Some(dir) if path.is_relative() => validate_output_path(&dir.join(path)),
            _ => validate_output_path(path),
        }
    }

    fn print_summary(&self, json: &serde_json::Value, text: &str) {
        if self.quiet {
            return;
        }
        if self.json_mode {
            println!("{}", serde_json::to_string_pretty(json).unwrap_or_default());
        } else {
            println!("{}", text);
        }
    }
}

impl Default for RunContext {
    fn default() -> Self {
        let config = RunConfig::default();
        Self {
            json_mode: false,
            quiet: false,
            strict: config.strict,
            target_tolerance: config.target_tolerance,
            output_dir: config.output_dir,
        }
    }
}

// =============================================================================
// INPUT LOADING
// =============================================================================

/// How bond energies vary between bonds.
#[derive(Debug, Clone, PartialEq)]
pub enum EnergyModel {
    /// Every bond has the mean energy.
    ZeroVariance,
    /// Mean energies per shape read from a distribution file.
    ConstantVariance(PathBuf),
}

/// Everything a thermodynamic command needs, loaded up front.
#[derive(Debug, Clone)]
pub struct ModelInputs {
    /// Density of states.
    pub dos: Histogram,
    /// Dihedral entropy loss and connectivity constants.
    pub dihedrals: DihedralData,
    /// Cells of the fully assembled target.
    pub targets: TargetSet,
    /// Per-shape bond-energy correction.
    pub correction: EnergyCorrection,
}

impl ModelInputs {
    /// Load the density of states, the dihedral file and the energy model.
    pub fn load(
        ctx: &RunContext,
        dos: &Path,
        dihedrals: &Path,
        model: &EnergyModel,
    ) -> Result<Self, GtsaError> {
        let dos = load_histogram(ctx, dos)?;

        let path = open_input(dihedrals)?;
        let data = DihedralData::read(BufReader::new(File::open(&path)?))?;
        check_listed(ctx, &path, &data.grid)?;
        let targets = TargetSet::from_dihedrals(&data.grid, ctx.target_tolerance)?;
        tracing::debug!(
            targets = targets.len(),
            qcoord = data.qcoord,
            qdih = data.qdih,
            "Loaded dihedrals"
        );

        let correction = match model {
            EnergyModel::ZeroVariance => EnergyCorrection::zero(dos.shape()),
            EnergyModel::ConstantVariance(distribution) => {
                let dist = load_histogram(ctx, distribution)?;
                EnergyCorrection::constant_variance(&dist, &targets)?
            }
        };

        Ok(Self {
            dos,
            dihedrals: data,
            targets,
            correction,
        })
    }

    /// The validated partition function over these inputs.
    pub fn partition(&self) -> Result<PartitionFunction<'_>, GtsaError> {
        PartitionFunction::new(
            &self.dos,
            &self.dihedrals.grid,
            &self.correction,
            self.dihedrals.qcoord,
        )
    }
}

/// Read one histogram file.
pub fn load_histogram(ctx: &RunContext, path: &Path) -> Result<Histogram, GtsaError> {
    let path = open_input(path)?;
    let histogram = read_histogram(BufReader::new(File::open(&path)?))?;
    check_listed(ctx, &path, &histogram)?;
    tracing::debug!(
        path = %path.display(),
        rows = histogram.rows(),
        cols = histogram.cols(),
        "Loaded histogram"
    );
    Ok(histogram)
}

fn open_input(path: &Path) -> Result<PathBuf, GtsaError> {
    let validated = validate_file_path(path)?;
    validate_file_size(&validated, MAX_HISTOGRAM_FILE_SIZE)?;
    Ok(validated)
}

/// Unlisted cells read as 0; reject them in strict mode, warn otherwise.
fn check_listed(ctx: &RunContext, path: &Path, histogram: &Histogram) -> Result<(), GtsaError> {
    let missing = histogram.missing_cells();
    let Some(first) = missing.first() else {
        return Ok(());
    };
    if ctx.strict {
        tracing::error!(path = %path.display(), "Histogram has unlisted cells");
        return Err(GtsaError::MissingCells {
            count: missing.len(),
            edges: first.edges,
            genus: first.genus,
        });
    }
    tracing::warn!(
        path = %path.display(),
        missing = missing.len(),
        "Unlisted histogram cells read as 0"
    );
    Ok(())
}

/// `mu = ln(rho)`; the density must be positive.
fn chemical_potential(rho: f64) -> Result<f64, GtsaError> {
    if rho > 0.0 && rho.is_finite() {
        Ok(rho.ln())
    } else {
        Err(GtsaError::InvalidParameter(format!(
            "number density must be positive, got {}",
            rho
        )))
    }
}

/// Create the output file, hand it to `write`, and flush.
fn write_table<F>(ctx: &RunContext, path: &Path, write: F) -> Result<PathBuf, GtsaError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), GtsaError>,
{
    let path = ctx.output_path(path)?;
    tracing::info!("Writing output to {}", path.display());
    let mut writer = BufWriter::new(File::create(&path)?);
    write(&mut writer)?;
    writer.flush()?;
    Ok(path)
}

// =============================================================================
// FE-PROFILE COMMAND
// =============================================================================

/// Free-energy profile at one bond energy.
pub fn cmd_fe_profile(
    ctx: &RunContext,
    dos: &Path,
    dihedrals: &Path,
    rho: f64,
    epsilon: f64,
    model: &EnergyModel,
    output: &Path,
) -> Result<(), GtsaError> {
    let mu = chemical_potential(rho)?;
    let inputs = ModelInputs::load(ctx, dos, dihedrals, model)?;
    let lnz = inputs.partition()?.log_weights(mu, epsilon);
    let profile = free_energy_profile(&lnz);

    let path = write_table(ctx, output, |w| {
        output::write_profile_table(w, epsilon, &profile)
    })?;

    let json = serde_json::json!({
        "epsilon": epsilon,
        "rho": rho,
        "max_size": profile.max_size(),
        "profile": profile.values(),
        "output": path.to_string_lossy(),
    });
    let text = format!(
        "F(V) for V = 1..{} at epsilon = {} written to {}",
        profile.len().saturating_sub(1),
        output::format_g(epsilon),
        path.display()
    );
    ctx.print_summary(&json, &text);
    Ok(())
}

// =============================================================================
// YIELD COMMAND
// =============================================================================

/// Target yield over an energy sweep.
pub fn cmd_yield(
    ctx: &RunContext,
    dos: &Path,
    dihedrals: &Path,
    rho: f64,
    sweep: &EnergySweep,
    model: &EnergyModel,
    output: &Path,
) -> Result<(), GtsaError> {
    let mu = chemical_potential(rho)?;
    let inputs = ModelInputs::load(ctx, dos, dihedrals, model)?;
    let pf = inputs.partition()?;

    tracing::info!(points = sweep.len(), "Computing yield sweep");
    let points = sweep.run(|epsilon| assembly_yield(&pf.log_weights(mu, epsilon), &inputs.targets))?;

    let path = write_table(ctx, output, |w| output::write_yield_table(w, rho, &points))?;

    let json = serde_json::json!({
        "rho": rho,
        "sweep": sweep,
        "points": points,
        "output": path.to_string_lossy(),
    });
    let best = points
        .iter()
        .map(|p| p.value)
        .fold(f64::NEG_INFINITY, f64::max);
    let text = format!(
        "{} yield points written to {} (max yield {})",
        points.len(),
        path.display(),
        output::format_g(best)
    );
    ctx.print_summary(&json, &text);
    Ok(())
}

// =============================================================================
// BARRIER COMMAND
// =============================================================================

/// Nucleation barrier over an energy sweep.
pub fn cmd_barrier(
    ctx: &RunContext,
    dos: &Path,
    dihedrals: &Path,
    rho: f64,
    sweep: &EnergySweep,
    model: &EnergyModel,
    output: &Path,
) -> Result<(), GtsaError> {
    let mu = chemical_potential(rho)?;
    let inputs = ModelInputs::load(ctx, dos, dihedrals, model)?;
    let pf = inputs.partition()?;

    tracing::info!(points = sweep.len(), "Computing barrier sweep");
    let points = sweep.run(|epsilon| {
        let profile = free_energy_profile(&pf.log_weights(mu, epsilon));
        nucleation_barrier(profile.values())
    })?;

    let downhill = points.iter().filter(|p| !p.value.is_peak()).count();
    if downhill > 0 {
        tracing::debug!(downhill, "Energies without a nucleation barrier");
    }

    let path = write_table(ctx, output, |w| output::write_barrier_table(w, rho, &points))?;

    let json = serde_json::json!({
        "rho": rho,
        "sweep": sweep,
        "points": points,
        "output": path.to_string_lossy(),
    });
    let text = format!(
        "{} barrier points written to {} ({} without a barrier)",
        points.len(),
        path.display(),
        downhill
    );
    ctx.print_summary(&json, &text);
    Ok(())
}

// =============================================================================
// INCIDENTAL COMMAND
// =============================================================================

/// Incidental-binding settings taken from the command line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IncidentalOptions {
    /// Mean incidental bond weight.
    pub w: f64,
    /// Fraction of dangling edges able to bind.
    pub active_fraction: f64,
    /// Upper bound on simultaneous bonds.
    pub max_bonds: Option<usize>,
}

/// Incidental-binding matrix and on/off pathway ratio at one bond energy.
pub fn cmd_incidental(
    ctx: &RunContext,
    dos: &Path,
    dihedrals: &Path,
    rho: f64,
    adjacents: &Path,
    options: &IncidentalOptions,
    epsilon: f64,
    model: &EnergyModel,
    output: &Path,
) -> Result<(), GtsaError> {
    let mu = chemical_potential(rho)?;
    let inputs = ModelInputs::load(ctx, dos, dihedrals, model)?;
    let adjacency = load_histogram(ctx, adjacents)?;
    let lnz = inputs.partition()?.log_weights(mu, epsilon);

    let mut params = IncidentalParams::new(
        rho,
        options.w,
        inputs.dihedrals.qdih,
        inputs.dihedrals.qcoord,
    )
    .with_active_fraction(options.active_fraction);
    if let Some(limit) = options.max_bonds {
        params = params.with_max_bonds(limit);
    }

    tracing::info!(cells = lnz.finite_cells().count(), "Computing incidental matrix");
    let zin = incidental_matrix(&lnz, &adjacency, &params)?;
    let ratio = on_off_pathway_ratio(&lnz, &zin);

    let path = write_table(ctx, output, |w| {
        output::write_incidental_table(w, epsilon, ratio, &zin)
    })?;

    let json = serde_json::json!({
        "epsilon": epsilon,
        "rho": rho,
        "on_off_ratio": ratio,
        "max_size": zin.nrows().saturating_sub(1),
        "output": path.to_string_lossy(),
    });
    let text = format!(
        "On/off pathway ratio (Zid/Zin): {}\nZin(V1,V2) written to {}",
        output::format_g(ratio),
        path.display()
    );
    ctx.print_summary(&json, &text);
    Ok(())
}

// =============================================================================
// COMPARE COMMAND
// =============================================================================

/// Difference statistics of two histograms.
pub fn cmd_compare(ctx: &RunContext, hist1: &Path, hist2: &Path) -> Result<(), GtsaError> {
    let first = load_histogram(ctx, hist1)?;
    let second = load_histogram(ctx, hist2)?;
    let diff = first.difference(&second)?;

    let json = serde_json::json!({
        "hist1": hist1.to_string_lossy(),
        "hist2": hist2.to_string_lossy(),
        "diff": diff,
    });
    let text = format!(
        "mean(diff): {}\nstddev(diff): {}\nmax(fabs(diff)): {}",
        diff.mean, diff.stddev, diff.max_abs
    );
    ctx.print_summary(&json, &text);
    Ok(())
}
