//! Integration test: solve speed problems end to end through Clarabel.
//!
//! Checks that:
//! 1. A strong end-state velocity weight brings the profile to a stop
//! 2. Position tracking never does worse than the constant-speed guess
//! 3. A problem loaded from TOML solves like its hand-built twin
//! 4. Independent problems can be assembled and solved on separate threads

use approx::assert_relative_eq;
use clankers_speed::{
    KnotGrid, PiecewiseJerkSolver, QuadraticCost, SpeedProblemBuilder, SpeedProblemConfig,
    objective_value,
};

const DT: f64 = 0.1;

fn grid(n: usize, x_init: [f64; 3]) -> KnotGrid {
    KnotGrid {
        num_of_knots: n,
        delta_s: DT,
        x_init,
    }
}

/// Stacked `[x | dx | ddx]` for constant speed from the initial state.
fn constant_speed(n: usize, x0: f64, v: f64) -> Vec<f64> {
    let mut z = Vec::with_capacity(3 * n);
    z.extend((0..n).map(|i| x0 + v * DT * i as f64));
    z.extend(std::iter::repeat_n(v, n));
    z.extend(std::iter::repeat_n(0.0, n));
    z
}

#[test]
fn end_state_weight_brings_profile_to_stop() {
    let problem = SpeedProblemBuilder::new(grid(41, [0.0, 5.0, 0.0]))
        .with_weight_ddx(1.0)
        .with_weight_dddx(1.0)
        .with_end_state_ref([0.0, 1000.0, 0.0], [0.0, 0.0, 0.0])
        .build()
        .unwrap();

    let profile = PiecewiseJerkSolver::default().solve(&problem).unwrap();
    assert!(profile.converged, "stopping QP must converge");

    assert_relative_eq!(profile.dx[0], 5.0, epsilon = 1e-6);
    let v_end = *profile.dx.last().unwrap();
    assert!(v_end.abs() < 0.5, "final speed should be near zero: {v_end}");
    // Position keeps advancing while braking.
    assert!(profile.x.windows(2).all(|w| w[1] >= w[0] - 1e-3));
    assert_eq!(profile.jerk().len(), 40);
}

#[test]
fn position_tracking_beats_constant_speed_guess() {
    let n = 41;
    let x_ref: Vec<f64> = (0..n).map(|i| 3.0 * DT * i as f64).collect();
    let problem = SpeedProblemBuilder::new(grid(n, [0.0, 2.0, 0.0]))
        .with_weight_ddx(1.0)
        .with_weight_dddx(1.0)
        .with_x_ref(10.0, x_ref)
        .build()
        .unwrap();

    let profile = PiecewiseJerkSolver::default().solve(&problem).unwrap();
    assert!(profile.converged);

    let p = problem.kernel();
    let q = problem.offset();
    let mut z = profile.x.clone();
    z.extend(&profile.dx);
    z.extend(&profile.ddx);

    let optimum = objective_value(&p, &q, &z);
    let guess = objective_value(&p, &q, &constant_speed(n, 0.0, 2.0));
    assert!(optimum <= guess + 1e-6, "optimum {optimum} > guess {guess}");
    assert!(*profile.dx.last().unwrap() > 2.0, "should speed up toward the reference");
}

#[test]
fn toml_problem_matches_builder() {
    let config = SpeedProblemConfig::from_toml_str(
        r#"
num_of_knots = 20
delta_s = 0.1
x_init = [0.0, 8.0, 0.0]
penalty_dx = [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0,
              1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]

[weights]
ddx = 1.0
dddx = 5.0

[dx_ref]
weight = 4.0
value = 10.0

"#,
    )
    .unwrap();
    let from_config = config.to_problem().unwrap();

    let mut penalty = vec![0.0; 20];
    penalty[10..].fill(1.0);
    let from_builder = SpeedProblemBuilder::new(grid(20, [0.0, 8.0, 0.0]))
        .with_weight_ddx(1.0)
        .with_weight_dddx(5.0)
        .with_dx_ref(4.0, 10.0)
        .with_penalty_dx(penalty)
        .build()
        .unwrap();

    let (pc, pb) = (from_config.kernel(), from_builder.kernel());
    assert_eq!(pc.colptr, pb.colptr);
    assert_eq!(pc.rowval, pb.rowval);
    assert_eq!(pc.nzval, pb.nzval);
    assert_eq!(from_config.offset(), from_builder.offset());

    let solver = PiecewiseJerkSolver::new(config.solver.clone());
    let a = solver.solve(&from_config).unwrap();
    let b = solver.solve(&from_builder).unwrap();
    assert!(a.converged && b.converged);
    for (va, vb) in a.dx.iter().zip(&b.dx) {
        assert_relative_eq!(va, vb, epsilon = 1e-9);
    }
}

#[test]
fn independent_problems_solve_in_parallel() {
    let targets = [4.0, 6.0, 8.0, 10.0];
    let problems: Vec<_> = targets
        .iter()
        .map(|&v| {
            SpeedProblemBuilder::new(grid(30, [0.0, 5.0, 0.0]))
                .with_weight_ddx(1.0)
                .with_weight_dddx(1.0)
                .with_dx_ref(10.0, v)
                .build()
                .unwrap()
        })
        .collect();

    let solver = &PiecewiseJerkSolver::default();
    let profiles: Vec<_> = std::thread::scope(|s| {
        let handles: Vec<_> = problems
            .iter()
            .map(|problem| s.spawn(move || solver.solve(problem).unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    for (profile, target) in profiles.iter().zip(targets) {
        assert!(profile.converged);
        let v_end = *profile.dx.last().unwrap();
        // Ends closer to its own target than it started.
        assert!((v_end - target).abs() < (5.0 - target).abs().max(1e-3));
    }
}
