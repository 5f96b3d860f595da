//! Piecewise-jerk speed problem: weights, soft references, and the builder
//! that validates them.
//!
//! A problem is assembled once per planning cycle:
//!
//! ```
//! use clankers_speed::{KnotGrid, SpeedProblemBuilder};
//!
//! let grid = KnotGrid { num_of_knots: 3, delta_s: 0.5, x_init: [0.0, 2.0, 0.0] };
//! let problem = SpeedProblemBuilder::new(grid)
//!     .with_weight_ddx(1.0)
//!     .with_weight_dddx(10.0)
//!     .with_dx_ref(5.0, 2.0)
//!     .build()
//!     .unwrap();
//! assert!(problem.has_dx_ref());
//! ```

use crate::error::ProblemError;
use crate::types::{KnotGrid, StateTriple, VariableLayout};

/// Per-knot position reference with its tracking weight.
#[derive(Clone, Debug, PartialEq)]
pub struct PositionReference {
    /// Tracking weight `w_xref`.
    pub weight: f64,
    /// Reference position per knot.
    pub values: Vec<f64>,
}

/// Uniform velocity reference with its tracking weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VelocityReference {
    /// Tracking weight `w_dxref`.
    pub weight: f64,
    /// Reference velocity shared by every knot.
    pub value: f64,
}

/// Extra weight and reference applied to the last knot only.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EndStateReference {
    /// Weights on (x, dx, ddx) of the last knot.
    pub weight: StateTriple,
    /// Target (x, dx, ddx) of the last knot.
    pub reference: StateTriple,
}

/// Immutable speed problem consumed by kernel and offset assembly.
#[derive(Clone, Debug)]
pub struct PiecewiseJerkSpeedProblem {
    pub(crate) grid: KnotGrid,
    pub(crate) weight_ddx: f64,
    pub(crate) weight_dddx: f64,
    pub(crate) x_ref: Option<PositionReference>,
    pub(crate) dx_ref: Option<VelocityReference>,
    pub(crate) penalty_dx: Vec<f64>,
    pub(crate) end_state: Option<EndStateReference>,
}

impl PiecewiseJerkSpeedProblem {
    pub const fn grid(&self) -> &KnotGrid {
        &self.grid
    }

    pub const fn layout(&self) -> VariableLayout {
        self.grid.layout()
    }

    pub const fn weight_ddx(&self) -> f64 {
        self.weight_ddx
    }

    pub const fn weight_dddx(&self) -> f64 {
        self.weight_dddx
    }

    /// Position tracking weight; 0 when no position reference is set.
    pub fn weight_x_ref(&self) -> f64 {
        self.x_ref.as_ref().map_or(0.0, |r| r.weight)
    }

    /// Velocity tracking weight; 0 when no velocity reference is set.
    pub fn weight_dx_ref(&self) -> f64 {
        self.dx_ref.map_or(0.0, |r| r.weight)
    }

    /// End-state weights; zeros when no end-state reference is set.
    pub fn weight_end_state(&self) -> StateTriple {
        self.end_state.map_or([0.0; 3], |r| r.weight)
    }

    pub fn penalty_dx(&self) -> &[f64] {
        &self.penalty_dx
    }

    pub const fn x_ref(&self) -> Option<&PositionReference> {
        self.x_ref.as_ref()
    }

    pub const fn dx_ref(&self) -> Option<&VelocityReference> {
        self.dx_ref.as_ref()
    }

    pub const fn end_state_ref(&self) -> Option<&EndStateReference> {
        self.end_state.as_ref()
    }

    pub const fn has_x_ref(&self) -> bool {
        self.x_ref.is_some()
    }

    pub const fn has_dx_ref(&self) -> bool {
        self.dx_ref.is_some()
    }

    pub const fn has_end_state_ref(&self) -> bool {
        self.end_state.is_some()
    }

    /// Start a builder pre-filled with this problem's settings.
    ///
    /// Useful for evaluating a variant (e.g. a different penalty profile)
    /// without touching the original.
    #[must_use]
    pub fn to_builder(&self) -> SpeedProblemBuilder {
        SpeedProblemBuilder {
            grid: self.grid.clone(),
            weight_ddx: self.weight_ddx,
            weight_dddx: self.weight_dddx,
            x_ref: self.x_ref.clone(),
            dx_ref: self.dx_ref,
            penalty_dx: Some(self.penalty_dx.clone()),
            end_state: self.end_state,
        }
    }
}

// ---------------------------------------------------------------------------
// SpeedProblemBuilder
// ---------------------------------------------------------------------------

/// Fluent builder for [`PiecewiseJerkSpeedProblem`].
///
/// Each `with_*` call overwrites any earlier value for the same reference.
/// Length checks happen in [`build`](Self::build).
#[derive(Clone, Debug)]
pub struct SpeedProblemBuilder {
    grid: KnotGrid,
    weight_ddx: f64,
    weight_dddx: f64,
    x_ref: Option<PositionReference>,
    dx_ref: Option<VelocityReference>,
    penalty_dx: Option<Vec<f64>>,
    end_state: Option<EndStateReference>,
}

impl SpeedProblemBuilder {
    #[must_use]
    pub const fn new(grid: KnotGrid) -> Self {
        Self {
            grid,
            weight_ddx: 0.0,
            weight_dddx: 0.0,
            x_ref: None,
            dx_ref: None,
            penalty_dx: None,
            end_state: None,
        }
    }

    /// Acceleration magnitude weight.
    #[must_use]
    pub const fn with_weight_ddx(mut self, weight: f64) -> Self {
        self.weight_ddx = weight;
        self
    }

    /// Jerk magnitude weight.
    #[must_use]
    pub const fn with_weight_dddx(mut self, weight: f64) -> Self {
        self.weight_dddx = weight;
        self
    }

    /// Per-knot position reference. `x_ref` must hold one value per knot.
    #[must_use]
    pub fn with_x_ref(mut self, weight: f64, x_ref: Vec<f64>) -> Self {
        self.x_ref = Some(PositionReference {
            weight,
            values: x_ref,
        });
        self
    }

    /// Uniform velocity reference applied at every knot.
    #[must_use]
    pub const fn with_dx_ref(mut self, weight: f64, dx_ref: f64) -> Self {
        self.dx_ref = Some(VelocityReference {
            weight,
            value: dx_ref,
        });
        self
    }

    /// Extra per-knot velocity weight, added to the velocity reference weight.
    #[must_use]
    pub fn with_penalty_dx(mut self, penalty_dx: Vec<f64>) -> Self {
        self.penalty_dx = Some(penalty_dx);
        self
    }

    /// Weight and reference for the last knot's (x, dx, ddx).
    #[must_use]
    pub const fn with_end_state_ref(
        mut self,
        weight_end_state: StateTriple,
        end_state_ref: StateTriple,
    ) -> Self {
        self.end_state = Some(EndStateReference {
            weight: weight_end_state,
            reference: end_state_ref,
        });
        self
    }

    /// Validate and freeze the problem.
    ///
    /// # Errors
    ///
    /// Returns [`ProblemError`] if the grid is empty, `delta_s` is not
    /// positive, or `x_ref` / `penalty_dx` do not have one element per knot.
    pub fn build(self) -> Result<PiecewiseJerkSpeedProblem, ProblemError> {
        let n = self.grid.num_of_knots;
        if n == 0 {
            return Err(ProblemError::ZeroKnots);
        }
        if self.grid.delta_s.is_nan() || self.grid.delta_s <= 0.0 {
            return Err(ProblemError::NonPositiveDeltaS(self.grid.delta_s));
        }
        if let Some(x_ref) = &self.x_ref {
            check_len("x_ref", &x_ref.values, n)?;
        }
        let penalty_dx = match self.penalty_dx {
            Some(penalty_dx) => {
                check_len("penalty_dx", &penalty_dx, n)?;
                penalty_dx
            }
            None => vec![0.0; n],
        };

        let problem = PiecewiseJerkSpeedProblem {
            grid: self.grid,
            weight_ddx: self.weight_ddx,
            weight_dddx: self.weight_dddx,
            x_ref: self.x_ref,
            dx_ref: self.dx_ref,
            penalty_dx,
            end_state: self.end_state,
        };
        warn_negative_weights(&problem);
        Ok(problem)
    }
}

fn check_len(reference: &'static str, values: &[f64], expected: usize) -> Result<(), ProblemError> {
    if values.len() == expected {
        Ok(())
    } else {
        Err(ProblemError::ReferenceLengthMismatch {
            reference,
            expected,
            got: values.len(),
        })
    }
}

// Negative weights make the kernel indefinite. Callers own that choice.
fn warn_negative_weights(problem: &PiecewiseJerkSpeedProblem) {
    let end = problem.weight_end_state();
    let scalars = [
        ("weight_x_ref", problem.weight_x_ref()),
        ("weight_dx_ref", problem.weight_dx_ref()),
        ("weight_ddx", problem.weight_ddx),
        ("weight_dddx", problem.weight_dddx),
        ("weight_end_x", end[0]),
        ("weight_end_dx", end[1]),
        ("weight_end_ddx", end[2]),
    ];
    for (name, value) in scalars {
        if value < 0.0 {
            tracing::warn!(weight = name, value, "negative cost weight");
        }
    }
    if let Some(knot) = problem.penalty_dx.iter().position(|&p| p < 0.0) {
        tracing::warn!(knot, value = problem.penalty_dx[knot], "negative penalty_dx");
    }
}
