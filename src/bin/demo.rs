//! Calibrates and runs the adaptive sampler on a standard normal target, then
//! fits a binormal ROC curve to simulated tallies.

use mini_sdt::distributions::Gaussian;
use mini_sdt::metropolis_hastings::AdaptiveSampler;
use mini_sdt::roc::{fit_roc, FitOptions};
use mini_sdt::signal_detection::{simulate, TrialTally};
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::error::Error;

fn main() -> Result<(), Box<dyn Error>> {
    const CALIBRATION_STEPS: usize = 200;
    const SAMPLE_SIZE: usize = 5_000;
    const SEED: u64 = 42;

    // --- Adaptive sampler ---
    let mut sampler = AdaptiveSampler::new(Gaussian::standard(), 0.0).set_seed(SEED);
    sampler
        .adapt(&[1; CALIBRATION_STEPS])
        .sample_with_progress(SAMPLE_SIZE)?;

    println!(
        "Calibrated proposal scale: {:e}",
        sampler.proposal_scale().unwrap_or(f64::NAN)
    );
    println!(
        "Sampling acceptance rate: {:.3}",
        sampler.acceptance_rate().unwrap_or(f64::NAN)
    );
    let summary = sampler.summary()?;
    println!(
        "Posterior mean {:.3}, 95% interval [{:.3}, {:.3}] (tail mean {:.3}, sd {:.3})",
        summary.mean, summary.c025, summary.c975, summary.sample_mean, summary.sample_std_dev
    );

    // --- ROC fit ---
    let single = [TrialTally::new(80, 20, 20, 80)];
    let fit = fit_roc(&single, &FitOptions::default())?;
    println!("H=0.8, FA=0.2 fits a = {:.4}", fit.a);

    let mut rng = SmallRng::seed_from_u64(SEED);
    let tallies = simulate(1.0, &[-0.5, -0.25, 0.0, 0.25, 0.5], 500, 500, &mut rng)?;
    let fit = fit_roc(&tallies, &FitOptions::default())?;
    println!(
        "Simulated d'=1.0 fits a = {:.4} after {} iterations (cost {:.2} -> {:.2})",
        fit.a, fit.iterations, fit.initial_cost, fit.cost
    );
    for (fa, hit) in fit.curve(10) {
        println!("  FA {fa:.1} -> H {hit:.3}");
    }

    #[cfg(feature = "csv")]
    {
        mini_sdt::io::csv::save_chain_csv(sampler.chain(), "chain.csv")?;
        mini_sdt::io::csv::save_roc_csv(fit.curve(100), "roc.csv")?;
        println!("Saved chain.csv and roc.csv");
    }

    Ok(())
}

#[test]
fn test_main() {
    main().expect("Expected main to not return an error.");
}
