//! Text maps of the F4 engine deck and specific excess power.

use std::process::ExitCode;

use climb_opt::climb::energy_rate_grid;
use climb_opt::numeric::linspace;
use climb_opt::physics::{ThrustModel, FOOT, POUND, POUND_FORCE};
use climb_opt::{ClimbError, ClimbProblem};

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
    let problem = ClimbProblem::f4()?;

    // -----------------------------------------------------------------------
    // Fitted maximum thrust, klb
    // -----------------------------------------------------------------------
    let machs = linspace(0.0, 1.8, 10);
    let alts_kft = linspace(0.0, 70.0, 8);
    let alts: Vec<f64> = alts_kft.iter().map(|h| h * 1000.0 * FOOT).collect();
    let thrust = problem.thrust().thrust_grid(&machs, &alts, 0, 0);

    println!();
    println!("  Maximum thrust (klb); * marks extrapolation beyond the table");
    println!("  ──────────────────────────────────────────────────────────────────");
    print!("  {:>6}", "kft");
    for m in &machs {
        print!(" {:>6.1}", m);
    }
    println!();
    for j in (0..alts.len()).rev() {
        print!("  {:>6.0}", alts_kft[j]);
        for (i, &m) in machs.iter().enumerate() {
            let mark = if problem.thrust().in_envelope(m, alts[j]) { ' ' } else { '*' };
            print!(" {:>5.1}{}", thrust[(i, j)] / (1000.0 * POUND_FORCE), mark);
        }
        println!();
    }

    // -----------------------------------------------------------------------
    // Specific excess power (T - D) v / W, m/s
    // -----------------------------------------------------------------------
    let mass = 37_400.0 * POUND;
    let weight = mass * problem.aircraft().gravity;
    let speeds = linspace(130.0, 550.0, 10);
    let heights = linspace(0.0, 20_000.0, 9);
    let edot = energy_rate_grid(&problem, &speeds, &heights, mass);

    println!();
    println!("  Specific excess power (m/s) at {:.0} kg", mass);
    println!("  ──────────────────────────────────────────────────────────────────");
    print!("  {:>6}", "km");
    for v in &speeds {
        print!(" {:>6.0}", v);
    }
    println!();
    for j in (0..heights.len()).rev() {
        print!("  {:>6.1}", heights[j] / 1000.0);
        for i in 0..speeds.len() {
            print!(" {:>6.1}", edot[(i, j)] / weight);
        }
        println!();
    }
    println!();
    Ok(())
}
