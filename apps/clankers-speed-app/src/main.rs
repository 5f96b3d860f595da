//! Clankers speed profile CLI.
//!
//! Provides two modes of operation:
//! - `solve`: Load a TOML problem, solve it, and print the profile
//! - `kernel`: Print the assembled CSC kernel and offset vector

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use clankers_speed::{PiecewiseJerkSolver, SpeedPlanError, SpeedProblemConfig, SpeedProfile};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Anything that makes the CLI exit non-zero.
#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Plan(#[from] SpeedPlanError),

    #[error("failed to serialize profile: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

/// Piecewise-jerk speed profile optimizer.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a problem file and print the optimized profile.
    Solve {
        /// TOML problem file.
        file: PathBuf,

        /// Print the profile as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Print the assembled kernel (CSC arrays) and offset vector.
    Kernel {
        /// TOML problem file.
        file: PathBuf,
    },
}

// ---------------------------------------------------------------------------
// Mode implementations
// ---------------------------------------------------------------------------

fn run_solve(file: &Path, json: bool) -> Result<(), AppError> {
    let config = SpeedProblemConfig::from_file(file).map_err(SpeedPlanError::from)?;
    let problem = config.to_problem().map_err(SpeedPlanError::from)?;
    let profile = PiecewiseJerkSolver::new(config.solver.clone())
        .solve(&problem)
        .map_err(SpeedPlanError::from)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&profile)?);
    } else {
        print_table(&profile);
    }
    Ok(())
}

#[allow(clippy::cast_precision_loss)]
fn print_table(profile: &SpeedProfile) {
    println!(
        "converged: {}  iterations: {}  solve time: {}us",
        profile.converged, profile.iterations, profile.solve_time_us
    );
    println!("{:>5} {:>8} {:>12} {:>12} {:>12}", "knot", "t", "x", "dx", "ddx");
    for (i, ((x, dx), ddx)) in profile
        .x
        .iter()
        .zip(&profile.dx)
        .zip(&profile.ddx)
        .enumerate()
    {
        let t = i as f64 * profile.delta_s;
        println!("{i:>5} {t:>8.3} {x:>12.4} {dx:>12.4} {ddx:>12.4}");
    }
}

fn run_kernel(file: &Path) -> Result<(), AppError> {
    let problem = SpeedProblemConfig::from_file(file)
        .and_then(|config| config.to_problem())
        .map_err(SpeedPlanError::from)?;
    let p = problem.calculate_kernel();
    let q = problem.calculate_offset();

    println!("dim:    {}x{}", p.m, p.n);
    println!("colptr: {:?}", p.colptr);
    println!("rowval: {:?}", p.rowval);
    println!("nzval:  {:?}", p.nzval);
    println!("q:      {q:?}");
    Ok(())
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match &cli.command {
        Commands::Solve { file, json } => run_solve(file, *json),
        Commands::Kernel { file } => run_kernel(file),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_error_is_app_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = AppError::from(json_err);
        assert!(matches!(err, AppError::Json(_)));
        assert!(err.to_string().starts_with("failed to serialize profile"));
    }

    #[test]
    fn missing_file_fails_solve() {
        let err = run_solve(Path::new("/nonexistent/speed.toml"), true).unwrap_err();
        assert!(matches!(err, AppError::Plan(SpeedPlanError::Config(_))));
    }
}
