//! Quadratic cost (kernel) assembly.
//!
//! Expands the piecewise-jerk speed cost
//!
//! ```text
//! J = Σ w_xref (x_i - xref_i)²
//!   + Σ (w_dxref + penalty_dx_i) (dx_i - dxref)²
//!   + Σ w_ddx ddx_i²
//!   + Σ w_dddx ((ddx_{i+1} - ddx_i) / Δs)²
//!   + w_end · (state_{n-1} - end_ref)²
//! ```
//!
//! and keeps only the part quadratic in the variables. Values are stored
//! pre-multiplied by 2 for the `½ zᵀPz + qᵀz` solver convention.
//!
//! # Storage
//!
//! Compressed-column, one entry per diagonal element plus one per jerk cross
//! term. The cross term coupling `ddx_i` and `ddx_{i+1}` is stored in column
//! `2n+i` at row `2n+i+1`, so the sparsity pattern is fixed by the knot
//! count: `4n - 1` entries, independent of which references are active.
//! [`to_upper_triangular`] flips the cross terms for solvers that require
//! `row <= col`.

use clarabel::algebra::CscMatrix;
use nalgebra::{DMatrix, DVector};

use crate::problem::PiecewiseJerkSpeedProblem;

/// Number of stored kernel values for `n` knots.
pub const fn kernel_value_count(num_of_knots: usize) -> usize {
    4 * num_of_knots - 1
}

impl PiecewiseJerkSpeedProblem {
    /// Assemble the kernel `P` as a `3n × 3n` CSC matrix.
    ///
    /// # Panics
    ///
    /// Panics if the emitted value count differs from `4n - 1`. That is an
    /// assembly bug, never a data error.
    pub fn calculate_kernel(&self) -> CscMatrix<f64> {
        let layout = self.layout();
        let n = layout.num_of_knots();
        let num_param = layout.num_variables();
        let last = layout.last();

        let w_x_ref = self.weight_x_ref();
        let w_dx_ref = self.weight_dx_ref();
        let w_end = self.weight_end_state();
        let delta_s_square = self.grid.delta_s * self.grid.delta_s;
        let jerk = self.weight_dddx / delta_s_square;

        let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); num_param];
        let mut value_index = 0;
        let mut emit = |col: usize, row: usize, value: f64| {
            columns[col].push((row, value));
            value_index += 1;
        };

        // x(i)^2 * w_x_ref, plus w_end_x on the last knot
        for i in 0..last {
            let k = layout.position(i);
            emit(k, k, w_x_ref);
        }
        let k = layout.position(last);
        emit(k, k, w_x_ref + w_end[0]);

        // x(i)'^2 * (w_dx_ref + penalty_dx), plus w_end_dx on the last knot
        for i in 0..last {
            let k = layout.velocity(i);
            emit(k, k, w_dx_ref + self.penalty_dx[i]);
        }
        let k = layout.velocity(last);
        emit(k, k, w_dx_ref + self.penalty_dx[last] + w_end[1]);

        // x(i)''^2 * w_ddx plus the jerk terms each knot takes part in
        if n == 1 {
            // No jerk segment: first and last knot coincide.
            let k = layout.acceleration(0);
            emit(k, k, self.weight_ddx + w_end[2]);
        } else {
            let k = layout.acceleration(0);
            emit(k, k, self.weight_ddx + jerk);
            for i in 1..last {
                let k = layout.acceleration(i);
                emit(k, k, self.weight_ddx + 2.0 * jerk);
            }
            let k = layout.acceleration(last);
            emit(k, k, self.weight_ddx + jerk + w_end[2]);
        }

        // -2 * w_dddx / delta_s^2 * x(i)'' * x(i + 1)''
        for i in 0..last {
            let k = layout.acceleration(i);
            emit(k, k + 1, -2.0 * jerk);
        }

        assert_eq!(
            value_index,
            kernel_value_count(n),
            "Kernel value count mismatch"
        );

        let mut colptr = Vec::with_capacity(num_param + 1);
        let mut rowval = Vec::with_capacity(value_index);
        let mut nzval = Vec::with_capacity(value_index);
        for column in &columns {
            colptr.push(rowval.len());
            for &(row, value) in column {
                rowval.push(row);
                nzval.push(value * 2.0);
            }
        }
        colptr.push(rowval.len());

        tracing::debug!(num_of_knots = n, nnz = nzval.len(), "assembled kernel");

        CscMatrix::new(num_param, num_param, colptr, rowval, nzval)
    }
}

/// Re-store a symmetric matrix with every entry in the upper triangle.
///
/// Entries below the diagonal move to their mirrored coordinate; rows stay
/// ascending within each column.
pub fn to_upper_triangular(p: &CscMatrix<f64>) -> CscMatrix<f64> {
    let mut columns: Vec<Vec<(usize, f64)>> = vec![Vec::new(); p.n];
    for col in 0..p.n {
        for idx in p.colptr[col]..p.colptr[col + 1] {
            let row = p.rowval[idx];
            let (r, c) = if row > col { (col, row) } else { (row, col) };
            columns[c].push((r, p.nzval[idx]));
        }
    }

    let mut colptr = Vec::with_capacity(p.n + 1);
    let mut rowval = Vec::with_capacity(p.nzval.len());
    let mut nzval = Vec::with_capacity(p.nzval.len());
    for column in &mut columns {
        column.sort_by_key(|&(row, _)| row);
        colptr.push(rowval.len());
        for &(row, value) in column.iter() {
            rowval.push(row);
            nzval.push(value);
        }
    }
    colptr.push(rowval.len());

    CscMatrix::new(p.m, p.n, colptr, rowval, nzval)
}

/// Expand a triangle-stored symmetric CSC matrix into a dense matrix.
///
/// Off-diagonal entries are mirrored; entries at the same coordinate sum.
pub fn to_dense_symmetric(p: &CscMatrix<f64>) -> DMatrix<f64> {
    let mut dense = DMatrix::zeros(p.m, p.n);
    for col in 0..p.n {
        for idx in p.colptr[col]..p.colptr[col + 1] {
            let row = p.rowval[idx];
            let value = p.nzval[idx];
            dense[(row, col)] += value;
            if row != col {
                dense[(col, row)] += value;
            }
        }
    }
    dense
}

/// Objective `½ zᵀPz + qᵀz` for a triangle-stored kernel.
pub fn objective_value(p: &CscMatrix<f64>, q: &[f64], z: &[f64]) -> f64 {
    let p = to_dense_symmetric(p);
    let z = DVector::from_column_slice(z);
    let q = DVector::from_column_slice(q);
    0.5 * z.dot(&(&p * &z)) + q.dot(&z)
}
