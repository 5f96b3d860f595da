//! Core types shared by the cost assembly and the solver.

use serde::Serialize;

/// Number of unknowns per knot: position, velocity, acceleration.
pub const VARS_PER_KNOT: usize = 3;

/// A (position, velocity, acceleration) triple.
pub type StateTriple = [f64; 3];

/// Discretization shared by every piecewise-jerk cost model.
#[derive(Clone, Debug, PartialEq)]
pub struct KnotGrid {
    /// Number of knots along the time axis (>= 1).
    pub num_of_knots: usize,
    /// Spacing between consecutive knots (> 0).
    pub delta_s: f64,
    /// Initial (position, velocity, acceleration) at knot 0.
    pub x_init: StateTriple,
}

impl KnotGrid {
    /// Index layout of the stacked variable vector for this grid.
    pub const fn layout(&self) -> VariableLayout {
        VariableLayout::new(self.num_of_knots)
    }
}

/// Index arithmetic for the stacked vector `[x(0..n) | dx(n..2n) | ddx(2n..3n)]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VariableLayout {
    n: usize,
}

impl VariableLayout {
    /// Layout for `num_of_knots` knots.
    pub const fn new(num_of_knots: usize) -> Self {
        Self { n: num_of_knots }
    }

    pub const fn num_of_knots(&self) -> usize {
        self.n
    }

    /// Total number of QP variables (`3n`).
    pub const fn num_variables(&self) -> usize {
        VARS_PER_KNOT * self.n
    }

    /// Index of `x` at `knot`.
    pub const fn position(&self, knot: usize) -> usize {
        knot
    }

    /// Index of `dx` at `knot`.
    pub const fn velocity(&self, knot: usize) -> usize {
        self.n + knot
    }

    /// Index of `ddx` at `knot`.
    pub const fn acceleration(&self, knot: usize) -> usize {
        2 * self.n + knot
    }

    /// Index of the last knot (`n - 1`).
    ///
    /// # Panics
    ///
    /// Panics if the layout has no knots.
    pub const fn last(&self) -> usize {
        assert!(self.n >= 1, "layout has no knots");
        self.n - 1
    }
}

/// Optimized speed profile unpacked from the QP solution.
#[derive(Clone, Debug, Serialize)]
pub struct SpeedProfile {
    /// Knot spacing the profile was solved on.
    pub delta_s: f64,
    /// Position per knot.
    pub x: Vec<f64>,
    /// Velocity per knot.
    pub dx: Vec<f64>,
    /// Acceleration per knot.
    pub ddx: Vec<f64>,
    /// Whether the QP solver converged.
    pub converged: bool,
    /// Interior-point iterations used.
    pub iterations: u32,
    /// Solve time in microseconds.
    pub solve_time_us: u64,
}

impl SpeedProfile {
    /// Piecewise-constant jerk on each of the `n - 1` segments.
    pub fn jerk(&self) -> Vec<f64> {
        self.ddx
            .windows(2)
            .map(|w| (w[1] - w[0]) / self.delta_s)
            .collect()
    }

    /// Unpack a stacked solution vector of length `3n`.
    pub(crate) fn from_stacked(layout: VariableLayout, delta_s: f64, z: &[f64]) -> Self {
        let n = layout.num_of_knots();
        Self {
            delta_s,
            x: z[layout.position(0)..layout.position(0) + n].to_vec(),
            dx: z[layout.velocity(0)..layout.velocity(0) + n].to_vec(),
            ddx: z[layout.acceleration(0)..layout.acceleration(0) + n].to_vec(),
            converged: true,
            iterations: 0,
            solve_time_us: 0,
        }
    }
}
