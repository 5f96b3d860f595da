//! TOML problem files.
//!
//! A file describes the knot grid, smoothness weights, optional references
//! and solver settings. Parsing and building are separate steps, so a file
//! is checked against the builder only when [`SpeedProblemConfig::to_problem`]
//! runs.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::problem::{PiecewiseJerkSpeedProblem, SpeedProblemBuilder};
use crate::solver::SolverSettings;
use crate::types::{KnotGrid, StateTriple};

// ---------------------------------------------------------------------------
// Reference sections
// ---------------------------------------------------------------------------

/// Smoothness weights from the base problem.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeightsConfig {
    /// Acceleration magnitude weight.
    #[serde(default)]
    pub ddx: f64,
    /// Jerk magnitude weight.
    #[serde(default)]
    pub dddx: f64,
}

/// `[x_ref]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionRefConfig {
    /// Tracking weight.
    pub weight: f64,
    /// One reference position per knot.
    pub values: Vec<f64>,
}

/// `[dx_ref]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VelocityRefConfig {
    /// Tracking weight.
    pub weight: f64,
    /// Reference velocity for every knot.
    pub value: f64,
}

/// `[end_state]` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndStateConfig {
    /// Weights on the last knot's (x, dx, ddx).
    pub weight: StateTriple,
    /// Target (x, dx, ddx) for the last knot.
    pub reference: StateTriple,
}

// ---------------------------------------------------------------------------
// SpeedProblemConfig
// ---------------------------------------------------------------------------

/// On-disk description of one speed problem.
///
/// ```toml
/// num_of_knots = 3
/// delta_s = 0.1
/// x_init = [0.0, 5.0, 0.0]
///
/// [weights]
/// ddx = 1.0
/// dddx = 10.0
///
/// [dx_ref]
/// weight = 2.0
/// value = 5.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeedProblemConfig {
    pub num_of_knots: usize,
    pub delta_s: f64,
    #[serde(default)]
    pub x_init: StateTriple,
    #[serde(default)]
    pub weights: WeightsConfig,
    #[serde(default)]
    pub x_ref: Option<PositionRefConfig>,
    #[serde(default)]
    pub dx_ref: Option<VelocityRefConfig>,
    #[serde(default)]
    pub penalty_dx: Option<Vec<f64>>,
    #[serde(default)]
    pub end_state: Option<EndStateConfig>,
    #[serde(default)]
    pub solver: SolverSettings,
}

impl SpeedProblemConfig {
    /// Parse from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Toml`] on malformed or incomplete input.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from TOML file. Builder checks are left to [`to_problem`](Self::to_problem).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read and
    /// [`ConfigError::Toml`] if it cannot be parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn grid(&self) -> KnotGrid {
        KnotGrid {
            num_of_knots: self.num_of_knots,
            delta_s: self.delta_s,
            x_init: self.x_init,
        }
    }

    /// Run the configured references through [`SpeedProblemBuilder`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Problem`] when a builder precondition fails.
    pub fn to_problem(&self) -> Result<PiecewiseJerkSpeedProblem, ConfigError> {
        let mut builder = SpeedProblemBuilder::new(self.grid())
            .with_weight_ddx(self.weights.ddx)
            .with_weight_dddx(self.weights.dddx);
        if let Some(x_ref) = &self.x_ref {
            builder = builder.with_x_ref(x_ref.weight, x_ref.values.clone());
        }
        if let Some(dx_ref) = &self.dx_ref {
            builder = builder.with_dx_ref(dx_ref.weight, dx_ref.value);
        }
        if let Some(penalty_dx) = &self.penalty_dx {
            builder = builder.with_penalty_dx(penalty_dx.clone());
        }
        if let Some(end) = &self.end_state {
            builder = builder.with_end_state_ref(end.weight, end.reference);
        }
        Ok(builder.build()?)
    }
}
