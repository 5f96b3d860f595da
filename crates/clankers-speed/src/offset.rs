//! Linear cost (offset) assembly.
//!
//! Each tracking term `w (v - ref)²` expands to `w v² - 2 w ref v + w ref²`.
//! The quadratic part lives in the kernel, the constant is dropped, and the
//! `-2 w ref` coefficient lands here. Smoothness terms have no reference and
//! contribute nothing.

use crate::problem::PiecewiseJerkSpeedProblem;

impl PiecewiseJerkSpeedProblem {
    /// Assemble the offset vector `q` of length `3n`.
    pub fn calculate_offset(&self) -> Vec<f64> {
        let mut q = Vec::with_capacity(self.layout().num_variables());
        self.add_offset_to(&mut q);
        q
    }

    /// Add this problem's offset into the first `3n` slots of `q`.
    ///
    /// A shorter `q` is zero-extended to `3n`. Existing values, including
    /// any past `3n`, are kept, so several cost models can share one vector.
    pub fn add_offset_to(&self, q: &mut Vec<f64>) {
        let layout = self.layout();
        let n = layout.num_of_knots();
        if q.len() < layout.num_variables() {
            q.resize(layout.num_variables(), 0.0);
        }

        for i in 0..n {
            if let Some(x_ref) = &self.x_ref {
                q[layout.position(i)] += -2.0 * x_ref.weight * x_ref.values[i];
            }
            // penalty_dx only shapes the kernel
            if let Some(dx_ref) = &self.dx_ref {
                q[layout.velocity(i)] += -2.0 * dx_ref.weight * dx_ref.value;
            }
        }

        if let Some(end) = &self.end_state {
            let last = layout.last();
            q[layout.position(last)] += -2.0 * end.weight[0] * end.reference[0];
            q[layout.velocity(last)] += -2.0 * end.weight[1] * end.reference[1];
            q[layout.acceleration(last)] += -2.0 * end.weight[2] * end.reference[2];
        }

        tracing::debug!(
            num_of_knots = n,
            has_x_ref = self.has_x_ref(),
            has_dx_ref = self.has_dx_ref(),
            has_end_state_ref = self.has_end_state_ref(),
            "assembled offset"
        );
    }
}

#[cfg(test)]
mod tests {
    use crate::problem::SpeedProblemBuilder;
    use crate::types::KnotGrid;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn grid(n: usize) -> KnotGrid {
        KnotGrid {
            num_of_knots: n,
            delta_s: 1.0,
            x_init: [0.0; 3],
        }
    }

    #[test]
    fn worked_example_two_knots() {
        let problem = SpeedProblemBuilder::new(grid(2))
            .with_weight_ddx(1.0)
            .with_weight_dddx(1.0)
            .with_x_ref(1.0, vec![1.0, 2.0])
            .with_dx_ref(1.0, 0.0)
            .build()
            .unwrap();
        assert_eq!(
            problem.calculate_offset(),
            vec![-2.0, -4.0, 0.0, 0.0, 0.0, 0.0]
        );
    }

    #[test]
    fn velocity_reference_is_uniform() {
        let problem = SpeedProblemBuilder::new(grid(3))
            .with_dx_ref(0.5, 4.0)
            .build()
            .unwrap();
        let q = problem.calculate_offset();
        assert_eq!(&q[0..3], &[0.0; 3]);
        assert_eq!(&q[3..6], &[-4.0; 3]);
        assert_eq!(&q[6..9], &[0.0; 3]);
    }

    #[test]
    fn end_state_adds_to_last_knot() {
        let problem = SpeedProblemBuilder::new(grid(3))
            .with_x_ref(1.0, vec![1.0, 2.0, 3.0])
            .with_end_state_ref([10.0, 20.0, 30.0], [4.0, 0.5, -1.0])
            .build()
            .unwrap();
        let q = problem.calculate_offset();
        assert_relative_eq!(q[2], -6.0 - 80.0);
        assert_relative_eq!(q[5], -20.0);
        assert_relative_eq!(q[8], 60.0);
    }

    fn end_state_isolation(n: usize) {
        let base = SpeedProblemBuilder::new(grid(n))
            .with_weight_ddx(0.5)
            .with_weight_dddx(2.0)
            .with_x_ref(2.0, (0..n).map(|i| 1.0 + i as f64).collect())
            .with_dx_ref(1.0, 3.0);
        let without = base.clone().build().unwrap().calculate_offset();
        let with = base
            .with_end_state_ref([7.0, 8.0, 9.0], [1.0, 2.0, 3.0])
            .build()
            .unwrap()
            .calculate_offset();
        assert_eq!(with.len(), 3 * n);
        for (idx, (a, b)) in with.iter().zip(&without).enumerate() {
            let expected = match idx {
                i if i == n - 1 => -14.0,
                i if i == 2 * n - 1 => -32.0,
                i if i == 3 * n - 1 => -54.0,
                _ => 0.0,
            };
            if expected == 0.0 {
                assert_eq!(a - b, 0.0, "index {idx} changed for n={n}");
            } else {
                assert_relative_eq!(a - b, expected, epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn end_state_touches_only_last_knot() {
        for n in [1, 2, 5] {
            end_state_isolation(n);
        }
    }

    #[test]
    fn add_offset_keeps_trailing_values() {
        let problem = SpeedProblemBuilder::new(grid(2))
            .with_dx_ref(1.0, 0.5)
            .build()
            .unwrap();
        let mut q = vec![1.0; 9];
        problem.add_offset_to(&mut q);
        assert_eq!(q, vec![1.0, 1.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn add_offset_accumulates() {
        let problem = SpeedProblemBuilder::new(grid(2))
            .with_dx_ref(1.0, 1.0)
            .build()
            .unwrap();
        let mut q = vec![1.0; 2];
        problem.add_offset_to(&mut q);
        assert_eq!(q, vec![1.0, 1.0, -2.0, -2.0, 0.0, 0.0]);
        problem.add_offset_to(&mut q);
        assert_eq!(q, vec![1.0, 1.0, -4.0, -4.0, 0.0, 0.0]);
    }

    proptest! {
        #[test]
        fn zero_references_give_zero_offset(
            n in 1usize..30,
            w_ddx in 0.0f64..100.0,
            w_dddx in 0.0f64..100.0,
        ) {
            let q = SpeedProblemBuilder::new(grid(n))
                .with_weight_ddx(w_ddx)
                .with_weight_dddx(w_dddx)
                .with_penalty_dx(vec![w_ddx; n])
                .build()
                .unwrap()
                .calculate_offset();
            prop_assert_eq!(q.len(), 3 * n);
            prop_assert!(q.iter().all(|&v| v == 0.0));
        }

        #[test]
        fn penalty_dx_never_changes_offset(
            n in 1usize..20,
            knot in 0usize..20,
            penalty in 0.0f64..50.0,
            dx_ref in -10.0f64..10.0,
        ) {
            let base = SpeedProblemBuilder::new(grid(n))
                .with_x_ref(2.0, (0..n).map(|i| i as f64).collect())
                .with_dx_ref(3.0, dx_ref)
                .with_end_state_ref([1.0; 3], [1.0, 2.0, 3.0]);
            let mut penalty_dx = vec![0.0; n];
            penalty_dx[knot % n] = penalty;
            let q0 = base.clone().build().unwrap().calculate_offset();
            let q1 = base.with_penalty_dx(penalty_dx).build().unwrap().calculate_offset();
            prop_assert_eq!(q0, q1);
        }
    }
}
