/*!
# Binormal ROC fitting

Fits the equal-variance binormal ROC curve

```text
H(FA; a) = Φ(a + Φ⁻¹(FA))
```

to a collection of [`TrialTally`] records by maximum likelihood. The objective
is the summed negative binomial log-likelihood of every tally, with the
predicted hit rate taken from the curve at the tally's observed false-alarm
rate. It is minimized over the scalar `a` with Nelder-Mead simplex search
(`argmin`), starting from `a = 0`.

```rust
use mini_sdt::roc::{fit_roc, FitOptions};
use mini_sdt::signal_detection::TrialTally;

let tallies = [TrialTally::new(80, 20, 20, 80)];
let fit = fit_roc(&tallies, &FitOptions::default())?;
assert!((fit.a - 1.683).abs() < 1e-3);
# Ok::<(), mini_sdt::errors::Error>(())
```
*/

use argmin::core::{CostFunction, Executor, State, TerminationReason};
use argmin::solver::neldermead::NelderMead;
use log::{debug, info};

use crate::distributions::{norm_cdf, norm_ppf};
use crate::errors::{Error, Result};
use crate::signal_detection::TrialTally;

/// Starting guess for the curve parameter.
pub const INITIAL_A: f64 = 0.0;

/// Predicted hit rate at false-alarm rate `false_alarm_rate` on the curve with parameter `a`.
pub fn roc_curve(false_alarm_rate: f64, a: f64) -> f64 {
    if false_alarm_rate <= 0.0 {
        return 0.0;
    }
    if false_alarm_rate >= 1.0 {
        return 1.0;
    }
    norm_cdf(a + norm_ppf(false_alarm_rate))
}

/// Summed negative log-likelihood of `tallies` under the curve with parameter `a`.
pub fn roc_loss(a: f64, tallies: &[TrialTally]) -> f64 {
    tallies
        .iter()
        .map(|t| {
            let fa = t.false_alarm_rate();
            t.neg_log_likelihood(roc_curve(fa, a), fa)
        })
        .sum()
}

/// [`roc_loss`] as an `argmin` cost function over a one-element parameter vector.
pub struct RocObjective<'a> {
    pub tallies: &'a [TrialTally],
}

impl CostFunction for RocObjective<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, param: &Self::Param) -> std::result::Result<Self::Output, argmin::core::Error> {
        Ok(roc_loss(param[0], self.tallies))
    }
}

/// Stopping rule of the simplex search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FitOptions {
    /// Iteration cap; reaching it counts as a failed fit.
    pub max_iters: u64,
    /// Converged once the standard deviation of the simplex costs drops below this.
    pub sd_tolerance: f64,
    /// Offset of the second simplex vertex from the starting guess.
    pub initial_step: f64,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            max_iters: 200,
            sd_tolerance: 1e-10,
            initial_step: 0.00025,
        }
    }
}

impl FitOptions {
    /// # Errors
    ///
    /// Returns [`Error::InvalidConfig`] if a value is not positive.
    pub fn validate(&self) -> Result<()> {
        if self.max_iters == 0 {
            return Err(Error::InvalidConfig("max_iters must be positive".into()));
        }
        if self.sd_tolerance.is_nan() || self.sd_tolerance <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "sd_tolerance must be positive, got {}",
                self.sd_tolerance
            )));
        }
        if !self.initial_step.is_finite() || self.initial_step <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "initial_step must be positive and finite, got {}",
                self.initial_step
            )));
        }
        Ok(())
    }
}

/// Result of [`fit_roc`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RocFit {
    /// Fitted curve parameter.
    pub a: f64,
    /// Objective at `a`.
    pub cost: f64,
    /// Objective at the starting guess.
    pub initial_cost: f64,
    pub iterations: u64,
}

impl RocFit {
    /// Hit rate the fitted curve predicts at `false_alarm_rate`.
    pub fn predict(&self, false_alarm_rate: f64) -> f64 {
        roc_curve(false_alarm_rate, self.a)
    }

    /**
    Lazily yields `n_points` points `(i / n_points, H(i / n_points))` for
    `i in 0..n_points`, for a caller-side renderer.

    ```rust
    use mini_sdt::roc::RocFit;

    let fit = RocFit { a: 1.0, cost: 0.0, initial_cost: 0.0, iterations: 0 };
    let points: Vec<_> = fit.curve(100).collect();
    assert_eq!(points.len(), 100);
    assert_eq!(points[0], (0.0, 0.0));
    assert!(points.windows(2).all(|w| w[0].1 < w[1].1));
    ```
    */
    pub fn curve(&self, n_points: usize) -> impl Iterator<Item = (f64, f64)> + '_ {
        (0..n_points).map(move |i| {
            let fa = i as f64 / n_points as f64;
            (fa, self.predict(fa))
        })
    }
}

fn validate_tallies(tallies: &[TrialTally]) -> Result<()> {
    if tallies.is_empty() {
        return Err(Error::EmptyDataset);
    }
    match tallies.iter().position(|t| !t.is_non_degenerate()) {
        Some(index) => Err(Error::DegenerateTally {
            index,
            hit_rate: tallies[index].hit_rate(),
            false_alarm_rate: tallies[index].false_alarm_rate(),
        }),
        None => Ok(()),
    }
}

/**
Fits the curve parameter `a` to `tallies` by Nelder-Mead minimization of
[`roc_loss`], starting at `a = 0`.

# Errors

- [`Error::EmptyDataset`] for an empty slice.
- [`Error::DegenerateTally`] if some tally has a rate of exactly 0 or 1.
- [`Error::InvalidConfig`] for invalid options.
- [`Error::FitFailed`] for optimizer errors, hitting
  `max_iters` or a non-finite optimum.
*/
pub fn fit_roc(tallies: &[TrialTally], options: &FitOptions) -> Result<RocFit> {
    validate_tallies(tallies)?;
    options.validate()?;

    let initial_cost = roc_loss(INITIAL_A, tallies);
    let solver = NelderMead::new(vec![vec![INITIAL_A], vec![INITIAL_A + options.initial_step]])
        .with_sd_tolerance(options.sd_tolerance)
        .map_err(|e| Error::FitFailed(e.to_string()))?;

    let res = Executor::new(RocObjective { tallies }, solver)
        .configure(|state| state.max_iters(options.max_iters))
        .run()
        .map_err(|e| Error::FitFailed(e.to_string()))?;

    let state = res.state();
    let iterations = state.get_iter();
    if let Some(TerminationReason::MaxItersReached) = state.get_termination_reason() {
        return Err(Error::FitFailed(format!(
            "no convergence within {} iterations",
            options.max_iters
        )));
    }

    let a = state
        .get_best_param()
        .and_then(|p| p.first().copied())
        .ok_or_else(|| Error::FitFailed("optimizer returned no parameter".into()))?;
    let cost = state.get_best_cost();
    if !a.is_finite() || !cost.is_finite() {
        return Err(Error::FitFailed(format!(
            "non-finite optimum a = {a}, cost = {cost}"
        )));
    }

    debug!("nelder-mead stopped after {iterations} iterations");
    info!(
        "fitted ROC parameter a = {a:.4} over {} tallies (cost {initial_cost:.3} -> {cost:.3})",
        tallies.len()
    );

    Ok(RocFit {
        a,
        cost,
        initial_cost,
        iterations,
    })
}
