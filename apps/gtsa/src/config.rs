//! # Run Configuration
//!
//! Optional TOML file tuning a gtsa run. Every key has a default, so an empty
//! file (or no file at all) is valid.
//!
//! ```toml
//! threads = 8
//! target_tolerance = 1e-5
//! strict = true
//! output_dir = "results"
//! ```

use gtsa_core::{GtsaError, primitives};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from `--config`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Worker threads for energy sweeps and the incidental matrix.
    /// `None` lets rayon pick one per core.
    pub threads: Option<usize>,

    /// Tolerance when matching dihedral cells against the maximum.
    pub target_tolerance: f64,

    /// Reject histogram files with unlisted cells instead of reading them as 0.
    pub strict: bool,

    /// Directory that relative output paths are resolved against.
    pub output_dir: Option<PathBuf>,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            threads: None,
            target_tolerance: primitives::TARGET_TOLERANCE,
            strict: false,
            output_dir: None,
        }
    }
}

impl RunConfig {
    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, GtsaError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            GtsaError::Config(format!("Cannot read config '{}': {}", path.display(), e))
        })?;
        Self::from_toml(&content)
    }

    /// Parse and validate a TOML document.
    pub fn from_toml(content: &str) -> Result<Self, GtsaError> {
        let config: Self =
            toml::from_str(content).map_err(|e| GtsaError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, GtsaError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Check value ranges.
    pub fn validate(&self) -> Result<(), GtsaError> {
        if self.threads == Some(0) {
            return Err(GtsaError::Config(
                "threads must be at least 1".to_string(),
            ));
        }
        if !(self.target_tolerance > 0.0 && self.target_tolerance.is_finite()) {
            return Err(GtsaError::Config(format!(
                "target_tolerance must be positive, got {}",
                self.target_tolerance
            )));
        }
        Ok(())
    }

    /// Size the global rayon pool. Must run before any parallel work.
    pub fn init_thread_pool(&self) -> Result<(), GtsaError> {
        if let Some(threads) = self.threads {
            rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build_global()
                .map_err(|e| GtsaError::Config(format!("Thread pool: {}", e)))?;
            tracing::debug!(threads, "Configured worker pool");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_defaults() {
        let config = RunConfig::from_toml("").expect("parse");
        assert_eq!(config, RunConfig::default());
        assert_eq!(config.target_tolerance, 1e-5);
    }

    #[test]
    fn full_document() {
        let config = RunConfig::from_toml(
            "threads = 4\ntarget_tolerance = 1e-3\nstrict = true\noutput_dir = \"out\"\n",
        )
        .expect("parse");
        assert_eq!(config.threads, Some(4));
        assert_eq!(config.target_tolerance, 1e-3);
        assert!(config.strict);
        assert_eq!(config.output_dir, Some(PathBuf::from("out")));
    }

    #[test]
    fn unknown_key_rejected() {
        assert!(matches!(
            RunConfig::from_toml("thread = 4\n"),
            Err(GtsaError::Config(_))
        ));
    }

    #[test]
    fn invalid_values_rejected() {
        assert!(RunConfig::from_toml("threads = 0\n").is_err());
        assert!(RunConfig::from_toml("target_tolerance = -1.0\n").is_err());
    }

    #[test]
    fn missing_file_is_config_error() {
        let result = RunConfig::load(Some(Path::new("/nonexistent/gtsa.toml")));
        assert!(matches!(result, Err(GtsaError::Config(_))));
        assert_eq!(RunConfig::load(None).expect("defaults"), RunConfig::default());
    }
}
