//! Piecewise-jerk speed profile optimization.
//!
//! Turns tracking and smoothness weights into the sparse QP consumed by an
//! interior-point solver:
//!
//! 1. **Problem** — knot grid, weights and soft references, built once per
//!    planning cycle through [`SpeedProblemBuilder`]
//! 2. **Kernel** — compressed-column quadratic cost `P` ([`kernel`])
//! 3. **Offset** — linear cost `q` from the references ([`offset`])
//! 4. **Solver** — Clarabel with the kinematic equality constraints ([`solver`])
//!
//! # Variable layout
//!
//! For `n` knots the QP has `3n` variables stacked as
//! `[x_0..x_{n-1}, dx_0..dx_{n-1}, ddx_0..ddx_{n-1}]`; see [`VariableLayout`].

pub mod config;
pub mod error;
pub mod kernel;
pub mod offset;
pub mod problem;
pub mod solver;
pub mod types;

pub use config::SpeedProblemConfig;
pub use error::{ConfigError, ProblemError, SolveError, SpeedPlanError};
pub use kernel::{kernel_value_count, objective_value, to_dense_symmetric, to_upper_triangular};
pub use problem::{
    EndStateReference, PiecewiseJerkSpeedProblem, PositionReference, SpeedProblemBuilder,
    VelocityReference,
};
pub use solver::{PiecewiseJerkSolver, QuadraticCost, SolverSettings, build_equality_constraints};
pub use types::{KnotGrid, SpeedProfile, StateTriple, VariableLayout};
