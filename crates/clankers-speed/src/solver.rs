//! Speed profile solver: feeds the assembled cost into a QP.
//!
//! Uses Clarabel (pure Rust interior-point solver) with the kinematic
//! equality constraints of the piecewise-jerk model.
//!
//! # QP Formulation
//!
//! Decision variables: z = [x_0..x_{n-1}, dx_0..dx_{n-1}, ddx_0..ddx_{n-1}]
//!
//! Cost: ½ zᵀPz + qᵀz from any [`QuadraticCost`].
//!
//! Subject to:
//! - Initial state: (x_0, dx_0, ddx_0) = x_init
//! - Velocity continuity: dx_{i+1} = dx_i + ½Δs (ddx_i + ddx_{i+1})
//! - Position continuity: x_{i+1} = x_i + Δs dx_i + Δs²/3 ddx_i + Δs²/6 ddx_{i+1}

use std::time::Instant;

use clarabel::algebra::CscMatrix;
use clarabel::solver::{
    DefaultSettingsBuilder, DefaultSolver, IPSolver, SolverStatus, SupportedConeT::ZeroConeT,
};
use serde::{Deserialize, Serialize};

use crate::error::SolveError;
use crate::kernel::to_upper_triangular;
use crate::problem::PiecewiseJerkSpeedProblem;
use crate::types::{KnotGrid, SpeedProfile};

/// A cost model over a piecewise-jerk knot grid.
pub trait QuadraticCost {
    /// Grid the cost is defined on.
    fn grid(&self) -> &KnotGrid;

    /// Kernel `P`, symmetric, stored as one triangle per coordinate pair.
    fn kernel(&self) -> CscMatrix<f64>;

    /// Offset `q`, length `3n`.
    fn offset(&self) -> Vec<f64>;
}

impl QuadraticCost for PiecewiseJerkSpeedProblem {
    fn grid(&self) -> &KnotGrid {
        &self.grid
    }

    fn kernel(&self) -> CscMatrix<f64> {
        self.calculate_kernel()
    }

    fn offset(&self) -> Vec<f64> {
        self.calculate_offset()
    }
}

const fn default_max_iter() -> u32 {
    200
}
const fn default_tolerance() -> f64 {
    1e-8
}

/// Interior-point solver settings.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SolverSettings {
    /// Maximum QP solver iterations.
    #[serde(default = "default_max_iter")]
    pub max_iter: u32,
    /// Absolute duality gap tolerance.
    #[serde(default = "default_tolerance")]
    pub tol_gap_abs: f64,
    /// Relative duality gap tolerance.
    #[serde(default = "default_tolerance")]
    pub tol_gap_rel: f64,
    /// Feasibility tolerance.
    #[serde(default = "default_tolerance")]
    pub tol_feas: f64,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            max_iter: default_max_iter(),
            tol_gap_abs: default_tolerance(),
            tol_gap_rel: default_tolerance(),
            tol_feas: default_tolerance(),
        }
    }
}

/// Piecewise-jerk QP solver.
#[derive(Clone, Debug, Default)]
pub struct PiecewiseJerkSolver {
    settings: SolverSettings,
}

impl PiecewiseJerkSolver {
    pub const fn new(settings: SolverSettings) -> Self {
        Self { settings }
    }

    pub const fn settings(&self) -> &SolverSettings {
        &self.settings
    }

    /// Solve for the optimal speed profile.
    ///
    /// A solver that runs but does not converge yields a profile with
    /// `converged == false` and zeroed trajectories.
    ///
    /// # Errors
    ///
    /// Returns [`SolveError::Setup`] if Clarabel rejects the problem data.
    pub fn solve(&self, cost: &impl QuadraticCost) -> Result<SpeedProfile, SolveError> {
        let start = Instant::now();

        let grid = cost.grid();
        let layout = grid.layout();
        let n_z = layout.num_variables();

        // 1. Cost
        let p_csc = to_upper_triangular(&cost.kernel());
        let q_vec = cost.offset();

        // 2. Constraints
        let (a_csc, b_vec) = build_equality_constraints(grid);
        let cones = vec![ZeroConeT(b_vec.len())];

        // 3. Solve
        let settings = DefaultSettingsBuilder::default()
            .max_iter(self.settings.max_iter)
            .verbose(false)
            .tol_gap_abs(self.settings.tol_gap_abs)
            .tol_gap_rel(self.settings.tol_gap_rel)
            .tol_feas(self.settings.tol_feas)
            .build()
            .map_err(|e| SolveError::Setup(e.to_string()))?;

        let mut solver = DefaultSolver::new(&p_csc, &q_vec, &a_csc, &b_vec, &cones, settings)
            .map_err(|e| SolveError::Setup(e.to_string()))?;
        solver.solve();
        let sol = &solver.solution;

        let converged = matches!(
            sol.status,
            SolverStatus::Solved | SolverStatus::AlmostSolved
        );

        let mut profile = if converged {
            SpeedProfile::from_stacked(layout, grid.delta_s, &sol.x)
        } else {
            tracing::warn!(status = ?sol.status, iterations = sol.iterations, "speed QP did not converge");
            let mut zeroed = SpeedProfile::from_stacked(layout, grid.delta_s, &vec![0.0; n_z]);
            zeroed.converged = false;
            zeroed
        };
        profile.iterations = sol.iterations;
        profile.solve_time_us = u64::try_from(start.elapsed().as_micros()).unwrap_or(u64::MAX);

        tracing::debug!(
            num_of_knots = layout.num_of_knots(),
            converged,
            iterations = profile.iterations,
            solve_time_us = profile.solve_time_us,
            "solved speed QP"
        );

        Ok(profile)
    }
}

/// Build the kinematic equality constraints `A z = b` in CSC form.
///
/// Rows: 3 initial-state rows, then for every segment one velocity and one
/// position continuity row.
///
/// # Panics
///
/// Panics if the grid has no knots.
pub fn build_equality_constraints(grid: &KnotGrid) -> (CscMatrix<f64>, Vec<f64>) {
    let layout = grid.layout();
    let n = layout.num_of_knots();
    assert!(n >= 1, "constraints need at least one knot");
    let n_z = layout.num_variables();
    let ds = grid.delta_s;
    let ds_sq = ds * ds;
    let n_rows = 3 + 2 * (n - 1);

    // Rows are emitted in increasing order, so each column stays sorted.
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); n_z];
    let mut b = Vec::with_capacity(n_rows);
    let mut row = 0;

    // --- Initial state ---
    for (k, &init) in [layout.position(0), layout.velocity(0), layout.acceleration(0)]
        .iter()
        .zip(grid.x_init.iter())
    {
        columns[*k].push((row, 1.0));
        b.push(init);
        row += 1;
    }

    for i in 0..n - 1 {
        // dx(i+1) - dx(i) - ½Δs ddx(i) - ½Δs ddx(i+1) = 0
        columns[layout.velocity(i)].push((row, -1.0));
        columns[layout.velocity(i + 1)].push((row, 1.0));
        columns[layout.acceleration(i)].push((row, -0.5 * ds));
        columns[layout.acceleration(i + 1)].push((row, -0.5 * ds));
        b.push(0.0);
        row += 1;

        // x(i+1) - x(i) - Δs dx(i) - Δs²/3 ddx(i) - Δs²/6 ddx(i+1) = 0
        columns[layout.position(i)].push((row, -1.0));
        columns[layout.position(i + 1)].push((row, 1.0));
        columns[layout.velocity(i)].push((row, -ds));
        columns[layout.acceleration(i)].push((row, -ds_sq / 3.0));
        columns[layout.acceleration(i + 1)].push((row, -ds_sq / 6.0));
        b.push(0.0);
        row += 1;
    }

    assert_eq!(row, n_rows, "Equality constraint count mismatch");

    let mut colptr = Vec::with_capacity(n_z + 1);
    let mut rowval = Vec::new();
    let mut nzval = Vec::new();
    for column in &columns {
        colptr.push(rowval.len());
        for &(r, v) in column {
            rowval.push(r);
            nzval.push(v);
        }
    }
    colptr.push(rowval.len());

    (CscMatrix::new(n_rows, n_z, colptr, rowval, nzval), b)
}
