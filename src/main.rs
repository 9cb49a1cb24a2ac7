use std::process::ExitCode;

use climb_opt::climb::{energy_rate, specific_energy};
use climb_opt::physics::{Atmosphere, ThrustModel, FOOT, POUND_FORCE};
use climb_opt::{solve_min_time_climb, ClimbConfig, ClimbError, ClimbProblem, InitialGuess};

fn main() -> ExitCode {
    pretty_env_logger::init();

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), ClimbError> {
    // -----------------------------------------------------------------------
    // Problem: F4 climb, Bryson "Dynamic Optimization" 9.3.15
    // -----------------------------------------------------------------------
    let problem = ClimbProblem::f4()?;
    let final_altitude = 65_673.0 * FOOT;
    let v0 = 440.0 * FOOT;
    let vf = 968.0 * FOOT;

    // Optional first argument: path to a TOML config
    let config = match std::env::args().nth(1) {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| ClimbError::Parse(format!("{}: {}", path, e)))?;
            ClimbConfig::from_toml_str(&text)?
        }
        None => ClimbConfig::default(),
    };

    // -----------------------------------------------------------------------
    // Solve
    // -----------------------------------------------------------------------
    let solution =
        solve_min_time_climb(&problem, &InitialGuess::boundary(v0, vf), final_altitude, &config)?;

    let aircraft = problem.aircraft();
    let units = problem.units();
    let summary = solution.summary();
    let t = &solution.trajectory;

    // -----------------------------------------------------------------------
    // Print results
    // -----------------------------------------------------------------------
    println!();
    println!("====================================================================");
    println!("  MINIMUM TIME TO CLIMB — {}", aircraft.name);
    println!("====================================================================");
    println!();
    println!("  Vehicle");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Mass:          {:>8.0} kg    Wing area:    {:>8.2} m^2",
        aircraft.initial_mass, aircraft.wing_area
    );
    println!(
        "  Thrust angle:  {:>8.2} deg   Fuel const:   {:>8.0} s",
        aircraft.zero_lift_angle.to_degrees(),
        aircraft.fuel_time_constant
    );
    println!(
        "  Static thrust: {:>8.1} klb   Units:  l={:.1} m  v={:.2} m/s  t={:.3} s",
        problem.thrust().thrust(0.0, 0.0) / (1000.0 * POUND_FORCE),
        units.length,
        units.velocity,
        units.time
    );
    println!();

    println!("  Solver");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  Status:        {}   ({} iterations, {} evaluations)",
        solution.status(),
        solution.report.iterations,
        solution.report.evaluations
    );
    println!("  Violation:     {:>10.3e}", solution.report.constraint_violation);
    println!("  Mesh points:   {:>8}", t.len());
    println!();

    println!("  Performance Summary");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!("  Minimum time:  {:>8.1} s", summary.minimum_time);
    println!(
        "  Peak altitude: {:>8.0} m   ({:.0} ft)",
        summary.peak_altitude,
        summary.peak_altitude / FOOT
    );
    println!("  Peak Mach:     {:>8.2}", summary.peak_mach);
    println!("  Fuel burned:   {:>8.0} kg", summary.fuel_burned);
    println!("  Range:         {:>8.1} km", summary.range / 1000.0);
    println!();

    // -----------------------------------------------------------------------
    // Trajectory table (sampled)
    // -----------------------------------------------------------------------
    println!("  Trajectory");
    println!("  ──────────────────────────────────────────────────────────────────");
    println!(
        "  {:>7}  {:>8}  {:>8}  {:>6}  {:>7}  {:>7}  {:>8}  {:>9}",
        "t (s)", "alt (m)", "v (m/s)", "Mach", "γ (deg)", "α (deg)", "mass(kg)", "Ė (MW)"
    );
    println!("  {}", "─".repeat(76));

    let interval = (t.len() / 24).max(1);
    for (i, s) in solution.samples().iter().enumerate() {
        if i % interval != 0 && i != t.len() - 1 {
            continue;
        }
        let edot = energy_rate(&problem, s.velocity, s.altitude, s.mass);
        println!(
            "  {:>7.1}  {:>8.0}  {:>8.1}  {:>6.2}  {:>7.2}  {:>7.2}  {:>8.0}  {:>9.2}",
            s.time,
            s.altitude,
            s.velocity,
            t.mach[i],
            s.path_angle.to_degrees(),
            s.angle_of_attack.to_degrees(),
            s.mass,
            edot / 1.0e6
        );
    }
    println!();

    let top = t.len() - 1;
    println!(
        "  Energy height: {:>8.0} m at the start, {:.0} m at the end",
        specific_energy(t.velocity[0], t.altitude[0], aircraft.gravity) / aircraft.gravity,
        specific_energy(t.velocity[top], t.altitude[top], aircraft.gravity) / aircraft.gravity
    );
    println!(
        "  Air at ceiling: rho={:.4} kg/m^3   a={:.1} m/s",
        problem.atmosphere().density(t.altitude[top]),
        problem.atmosphere().sound_speed(t.altitude[top])
    );

    if !solution.warnings.is_empty() {
        println!();
        println!("  Warnings ({})", solution.warnings.len());
        println!("  ──────────────────────────────────────────────────────────────────");
        for w in solution.warnings.iter().take(10) {
            println!("  {}", w);
        }
    }
    println!("====================================================================");
    println!();

    solution.require_converged().map(|_| ())
}
