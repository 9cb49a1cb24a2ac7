use climb_opt::climb::{ClimbNlp, SolveWarning};
use climb_opt::optim::NlpProblem;
use climb_opt::physics::FOOT;
use climb_opt::{
    solve_min_time_climb, ClimbConfig, ClimbError, ClimbProblem, ClimbSolution, InitialGuess,
    SolveStatus, Verbosity,
};

// ---------------------------------------------------------------------------
// F4 reference case: 0 -> 65673 ft, 440 -> 968 ft/s
// ---------------------------------------------------------------------------

fn final_altitude() -> f64 {
    65_673.0 * FOOT
}

fn f4_guess() -> InitialGuess {
    InitialGuess::boundary(440.0 * FOOT, 968.0 * FOOT)
}

fn solve_f4(mesh_size: usize) -> (ClimbProblem, ClimbSolution) {
    let _ = pretty_env_logger::try_init();
    let problem = ClimbProblem::f4().unwrap();
    let config = ClimbConfig { mesh_size, verbosity: Verbosity::Summary, ..Default::default() };
    let solution = solve_min_time_climb(&problem, &f4_guess(), final_altitude(), &config).unwrap();
    (problem, solution)
}

fn check_boundary_invariants(problem: &ClimbProblem, s: &ClimbSolution, tolerance: f64) {
    let t = &s.trajectory;
    let n = t.len();
    let tf = s.parameters[0] * problem.units().time;

    assert_eq!(t.time[0], 0.0);
    assert!((t.time[n - 1] - tf).abs() < 1e-9 * tf);
    assert!(t.time.windows(2).all(|w| w[1] > w[0]), "time not increasing");

    assert_eq!(t.altitude[0], 0.0);
    assert!((t.altitude[n - 1] - final_altitude()).abs() < 0.01, "z_f = {}", t.altitude[n - 1]);
    let floor = -tolerance * problem.units().length;
    assert!(t.altitude.iter().all(|&z| z >= floor), "trajectory dips below ground");

    assert_eq!(t.velocity[0], 440.0 * FOOT);
    assert_eq!(t.velocity[n - 1], 968.0 * FOOT);
    assert_eq!(t.path_angle[0], 0.0);
    assert_eq!(t.path_angle[n - 1], 0.0);

    assert_eq!(t.mass[0], problem.aircraft().initial_mass);
    assert!(t.mass.windows(2).all(|w| w[1] <= w[0]), "mass increased");
}

#[test]
fn f4_coarse_mesh_converges() {
    let (problem, s) = solve_f4(24);
    assert!(s.converged(), "status: {}", s.status());
    assert_eq!(s.trajectory.len(), 24);
    assert_eq!(s.parameters.len(), 45);
    check_boundary_invariants(&problem, &s, 1e-6);

    let summary = s.summary();
    assert!(
        summary.minimum_time > 300.0 && summary.minimum_time < 345.0,
        "tf = {:.1} s",
        summary.minimum_time
    );
    // Supersonic dash before the zoom climb
    assert!(summary.peak_mach > 1.5 && summary.peak_mach < 1.9, "peak Mach {}", summary.peak_mach);
    assert!(summary.fuel_burned > 1_500.0 && summary.fuel_burned < 3_000.0);
    assert!(summary.range > 50_000.0);
    assert!(!s
        .warnings
        .iter()
        .any(|w| matches!(w, SolveWarning::LargeAngleOfAttack { .. })));
}

#[test]
fn warm_start_from_solution_is_idempotent() {
    let (problem, first) = solve_f4(24);
    assert!(first.converged());

    let config = ClimbConfig { verbosity: Verbosity::Silent, ..Default::default() };
    let guess = InitialGuess::from_solution(&first);
    let second = solve_min_time_climb(&problem, &guess, final_altitude(), &config)
        .unwrap()
        .require_converged()
        .unwrap();

    // History guess overrides the default 128-point mesh
    assert_eq!(second.trajectory.len(), 24);
    assert!(second.report.iterations <= 5, "{} iterations", second.report.iterations);
    let drift = (second.final_time() - first.final_time()).abs() / first.final_time();
    assert!(drift < 0.01, "tf moved by {:.3}%", 100.0 * drift);
}

#[test]
fn samples_match_trajectory_columns() {
    let (_, s) = solve_f4(24);
    let samples = s.samples();
    assert_eq!(samples.len(), 24);
    let mid = &samples[12];
    assert_eq!(mid.time, s.trajectory.time[12]);
    assert_eq!(mid.altitude, s.trajectory.altitude[12]);
    assert_eq!(mid.angle_of_attack, s.trajectory.angle_of_attack[12]);
    assert_eq!(mid.distance, s.trajectory.distance[12]);
}

#[test]
fn two_point_mesh_shapes() {
    let problem = ClimbProblem::f4().unwrap();
    let start = f4_guess().discretize(0.0, final_altitude(), 2).unwrap();
    let nlp = ClimbNlp::new(&problem, start.boundary, start.mesh_size).unwrap();
    let p = problem.units().to_scaled(&start.parameters);

    assert_eq!(p.len(), 1);
    assert_eq!(nlp.dimension(), 1);
    assert_eq!(nlp.equality(&p).len(), 2);
    assert!(nlp.inequality(&p).is_empty());
}

#[test]
fn two_point_mesh_is_overdetermined() {
    // One free parameter against two equalities: the QP has no solution
    let problem = ClimbProblem::f4().unwrap();
    let config = ClimbConfig { mesh_size: 2, verbosity: Verbosity::Silent, ..Default::default() };
    let s = solve_min_time_climb(&problem, &f4_guess(), final_altitude(), &config).unwrap();
    assert_eq!(s.status(), SolveStatus::QpFailure);
    assert_eq!(s.trajectory.len(), 2);
    assert!(matches!(
        s.require_converged(),
        Err(ClimbError::NotConverged { status: SolveStatus::QpFailure, .. })
    ));
}

#[test]
#[ignore = "full 128-point mesh; run with --release --ignored"]
fn f4_reference_mesh_converges() {
    let (problem, s) = solve_f4(128);
    assert!(s.converged(), "status: {}", s.status());
    check_boundary_invariants(&problem, &s, 1e-6);
    let tf = s.final_time();
    assert!(tf > 250.0 && tf < 400.0, "tf = {:.1} s", tf);
}
