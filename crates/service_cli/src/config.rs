//! TOML configuration for the engine.
//!
//! Every field is optional; missing entries keep their engine defaults,
//! and a missing file means an all-default configuration.

use std::path::Path;

use serde::Deserialize;

use amopt_pricing::EngineConfig;

use crate::error::{CliError, Result};

/// Root of the optional `amopt.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct CliConfig {
    /// `[solver]` section.
    #[serde(default)]
    pub solver: SolverSection,
    /// `[engine]` section.
    #[serde(default)]
    pub engine: EngineSection,
}

/// Boundary-solver overrides.
#[derive(Debug, Default, Deserialize)]
pub struct SolverSection {
    /// Collocation point count.
    pub collocation_points: Option<usize>,
    /// Convergence tolerance.
    pub tolerance: Option<f64>,
    /// Iteration budget.
    pub max_iterations: Option<usize>,
}

/// Engine overrides.
#[derive(Debug, Default, Deserialize)]
pub struct EngineSection {
    /// Near-expiry threshold in years.
    pub near_expiry_threshold: Option<f64>,
    /// Accept best-effort boundaries when the solver exhausts its budget.
    pub accept_best_effort: Option<bool>,
}

impl CliConfig {
    /// Materialises the engine configuration with the overrides applied.
    pub fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::default();
        if let Some(points) = self.solver.collocation_points {
            config.solver.collocation_points = points;
        }
        if let Some(tolerance) = self.solver.tolerance {
            config.solver.tolerance = tolerance;
        }
        if let Some(budget) = self.solver.max_iterations {
            config.solver.max_iterations = budget;
        }
        if let Some(threshold) = self.engine.near_expiry_threshold {
            config.near_expiry_threshold = threshold;
        }
        if let Some(accept) = self.engine.accept_best_effort {
            config.accept_best_effort = accept;
        }
        config
    }
}

/// Loads the configuration file, defaulting when it does not exist.
pub fn load(path: &str) -> Result<CliConfig> {
    if !Path::new(path).exists() {
        return Ok(CliConfig::default());
    }
    let text = std::fs::read_to_string(path)
        .map_err(|e| CliError::Config(format!("cannot read {}: {}", path, e)))?;
    toml::from_str(&text).map_err(|e| CliError::Config(format!("cannot parse {}: {}", path, e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let config: CliConfig = toml::from_str("").unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.solver.collocation_points, 24);
        assert!(!engine.accept_best_effort);
    }

    #[test]
    fn overrides_apply() {
        let text = r#"
            [solver]
            collocation_points = 32
            max_iterations = 50

            [engine]
            accept_best_effort = true
        "#;
        let config: CliConfig = toml::from_str(text).unwrap();
        let engine = config.engine_config();
        assert_eq!(engine.solver.collocation_points, 32);
        assert_eq!(engine.solver.max_iterations, 50);
        assert!(engine.accept_best_effort);
        // Untouched fields keep their defaults.
        assert!((engine.near_expiry_threshold - 3.0 / 252.0).abs() < 1e-12);
    }

    #[test]
    fn missing_file_is_default() {
        let config = load("definitely-not-here.toml").unwrap();
        assert!(config.solver.collocation_points.is_none());
    }
}
