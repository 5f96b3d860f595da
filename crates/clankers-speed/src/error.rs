use thiserror::Error;

/// Top-level error type for clankers-speed.
#[derive(Debug, Error)]
pub enum SpeedPlanError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Problem error: {0}")]
    Problem(#[from] ProblemError),

    #[error("Solve error: {0}")]
    Solve(#[from] SolveError),
}

/// Errors loading a problem description from disk or TOML text.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid problem: {0}")]
    Problem(#[from] ProblemError),
}

/// Precondition violations detected while building a problem.
///
/// Copy + static messages for cheap propagation.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum ProblemError {
    #[error("{reference} has {got} elements, expected one per knot ({expected})")]
    ReferenceLengthMismatch {
        reference: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("num_of_knots must be >= 1")]
    ZeroKnots,

    #[error("Invalid delta_s: {0} (must be > 0)")]
    NonPositiveDeltaS(f64),
}

/// QP solver failures that are not plain non-convergence.
#[derive(Debug, Error)]
pub enum SolveError {
    #[error("Solver setup failed: {0}")]
    Setup(String),
}
