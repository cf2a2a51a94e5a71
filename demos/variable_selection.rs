//! Spike-and-slab signal detection.
//!
//! Each observation `z_i` is either pure noise, `N(0, 1)`, or noise plus a
//! signal drawn from `N(0, tau^2)`, giving `N(0, 1 + tau^2)`. The binary state
//! marks which observations carry a signal. Four independent chains explore the
//! model space and the posterior inclusion probabilities are printed.
//!
//! Run with `cargo run --release --example variable_selection --features csv`
//! to also write the chains to `/tmp/variable_selection.csv`.

use std::f64::consts::PI;

use discrete_mcmc::core::{AcceptanceTrace, ChainRunner};
use discrete_mcmc::reversible_jump::ReversibleJump;
use discrete_mcmc::stats::{inclusion_rhat, ChainSummary, ChainTracker};
use discrete_mcmc::StateVector;

#[derive(Debug)]
struct Observations {
    z: Vec<f64>,
    tau: f64,
}

fn log_normal(x: f64, var: f64) -> f64 {
    -0.5 * ((2.0 * PI * var).ln() + x * x / var)
}

fn log_marginal(state: &StateVector, obs: &Observations) -> f64 {
    state
        .as_slice()
        .iter()
        .zip(&obs.z)
        .map(|(&signal, &z)| {
            let var = if signal == 1 { 1.0 + obs.tau.powi(2) } else { 1.0 };
            log_normal(z, var)
        })
        .sum()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Components 1, 4 and 7 carry a strong signal.
    let obs = Observations {
        z: vec![0.3, 4.1, -0.8, 0.1, -3.7, 1.2, -0.4, 5.2, 0.9, -1.6],
        tau: 3.0,
    };
    let d = obs.z.len();
    let start = StateVector::zeros(d)?;

    let mut rj = ReversibleJump::new(log_marginal, obs, start, 4).set_seed(42);
    let runs = rj.run_with_progress(20_000, 2_000)?;

    let stats: Vec<_> = runs
        .iter()
        .map(|run| {
            let mut tracker = ChainTracker::new(d);
            for (state, &accepted) in run.chain.iter().zip(&run.trace) {
                tracker.step(state, accepted);
            }
            tracker.stats()
        })
        .collect();
    let rhat = inclusion_rhat(&stats.iter().collect::<Vec<_>>()).ok_or("need two chains")?;

    let pooled: Vec<StateVector> = runs.iter().flat_map(|r| r.chain.iter().cloned()).collect();
    let trace: AcceptanceTrace = runs.iter().flat_map(|r| r.trace.iter().copied()).collect();
    let summary = ChainSummary::from_chain(&pooled, &trace).ok_or("empty chains")?;

    println!("acceptance rate: {:.3}", summary.acceptance_rate);
    println!("component  p(include)  R-hat");
    for (i, (p, r)) in summary.inclusion.iter().zip(rhat.iter()).enumerate() {
        println!("{i:>9}  {p:>10.3}  {r:>5.3}");
    }
    println!("most likely model: {}", summary.map_model());
    println!("modal model size: {}", summary.modal_size);
    for (state, freq) in summary.models.iter().take(5) {
        println!("  {state}  {freq:.3}");
    }

    for run in &runs {
        let per_chain = ChainSummary::from_run(run).ok_or("empty chain")?;
        for (kind, counts) in &per_chain.moves {
            print!(
                "{kind}: {}/{} accepted ({} degenerate)  ",
                counts.accepted, counts.proposed, counts.degenerate
            );
        }
        println!();
    }

    #[cfg(feature = "csv")]
    {
        let chains: Vec<_> = runs.iter().map(|r| r.chain.clone()).collect();
        let traces: Vec<_> = runs.iter().map(|r| r.trace.clone()).collect();
        discrete_mcmc::io::csv::save_csv(&chains, &traces, "/tmp/variable_selection.csv")?;
        println!("chains saved to /tmp/variable_selection.csv");
    }

    Ok(())
}
