//! Provides acceptance bookkeeping and the posterior summary of a chain tail.

use ndarray::ArrayView1;

use crate::distributions::norm_ppf;
use crate::errors::{Error, Result};

/// Number of leading chain states discarded before summarizing.
pub const BURN_IN: usize = 100;

/// Mean of the normal prior combined with the chain mean.
pub const PRIOR_MEAN: f64 = 0.0;

/// Standard deviation of the normal prior combined with the chain mean.
pub const PRIOR_STD_DEV: f64 = 1.0;

/// Floor on the tail standard deviation. A constant tail would otherwise give
/// an infinite likelihood precision and a 0/0 posterior mean.
pub const MIN_LIKELIHOOD_STD_DEV: f64 = 1e-6;

/// Running count of accepted and rejected proposals.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptanceCounter {
    pub accepted: u64,
    pub rejected: u64,
}

impl AcceptanceCounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, accepted: bool) {
        if accepted {
            self.accepted += 1;
        } else {
            self.rejected += 1;
        }
    }

    pub fn total(&self) -> u64 {
        self.accepted + self.rejected
    }

    /// Fraction of accepted proposals, `None` before the first proposal.
    pub fn rate(&self) -> Option<f64> {
        match self.total() {
            0 => None,
            n => Some(self.accepted as f64 / n as f64),
        }
    }
}

/// Posterior point estimate and central 95% interval.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    /// Posterior mean.
    pub mean: f64,
    /// 2.5th percentile of the posterior normal.
    pub c025: f64,
    /// 97.5th percentile of the posterior normal.
    pub c975: f64,
    pub posterior_std_dev: f64,
    /// Mean of the retained tail.
    pub sample_mean: f64,
    /// Bessel-corrected standard deviation of the retained tail.
    pub sample_std_dev: f64,
    pub n_retained: usize,
}

/// Sample mean and Bessel-corrected standard deviation.
///
/// Needs at least two values.
pub fn mean_and_std(values: &[f64]) -> Option<(f64, f64)> {
    if values.len() < 2 {
        return None;
    }
    let view = ArrayView1::from(values);
    let mean = view.mean()?;
    Some((mean, view.std(1.0)))
}

/// Conjugate normal update of the prior with a single observation `mean` whose
/// standard deviation is `std_dev`. Returns the posterior mean and std.
pub fn normal_posterior(mean: f64, std_dev: f64) -> (f64, f64) {
    let prior_precision = 1.0 / PRIOR_STD_DEV.powi(2);
    let likelihood_precision = 1.0 / std_dev.powi(2);
    let precision = prior_precision + likelihood_precision;
    let posterior_mean =
        (PRIOR_MEAN * prior_precision + mean * likelihood_precision) / precision;
    (posterior_mean, (1.0 / precision).sqrt())
}

/// Summarizes `chain` after dropping the first [`BURN_IN`] states.
pub fn summarize(chain: &[f64]) -> Result<Summary> {
    let required = BURN_IN + 2;
    if chain.len() < required {
        return Err(Error::InsufficientSamples {
            len: chain.len(),
            required,
        });
    }

    let tail = &chain[BURN_IN..];
    let (sample_mean, sample_std_dev) = mean_and_std(tail).ok_or(Error::InsufficientSamples {
        len: chain.len(),
        required,
    })?;

    let (mean, posterior_std_dev) =
        normal_posterior(sample_mean, sample_std_dev.max(MIN_LIKELIHOOD_STD_DEV));

    Ok(Summary {
        mean,
        c025: mean + posterior_std_dev * norm_ppf(0.025),
        c975: mean + posterior_std_dev * norm_ppf(0.975),
        posterior_std_dev,
        sample_mean,
        sample_std_dev,
        n_retained: tail.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn counter_rate() {
        let mut counter = AcceptanceCounter::new();
        assert_eq!(counter.rate(), None);
        counter.record(true);
        counter.record(false);
        counter.record(true);
        counter.record(true);
        assert_eq!(counter.total(), 4);
        assert_eq!(counter.rate(), Some(0.75));
    }

    #[test]
    fn mean_and_std_uses_bessel_correction() {
        let (mean, std) = mean_and_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_abs_diff_eq!(mean, 5.0);
        // Population std is 2, sample std is 2 * sqrt(8 / 7).
        assert_abs_diff_eq!(std, 2.0 * (8.0_f64 / 7.0).sqrt(), epsilon = 1e-12);
        assert!(mean_and_std(&[1.0]).is_none());
    }

    #[test]
    fn posterior_weights_by_precision() {
        // Equal precisions: the posterior mean sits halfway to the prior mean.
        let (mean, sd) = normal_posterior(3.0, 1.0);
        assert_abs_diff_eq!(mean, 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(sd, 0.5_f64.sqrt(), epsilon = 1e-12);

        // A precise observation dominates the prior.
        let (mean, _) = normal_posterior(3.0, 0.01);
        assert_abs_diff_eq!(mean, 3.0 / (1.0 + 1e-4), epsilon = 1e-12);
    }

    #[test]
    fn summarize_drops_burn_in() {
        // Burn-in holds large values that must not leak into the summary.
        let mut chain = vec![1_000.0; BURN_IN];
        chain.extend((0..200).map(|i| if i % 2 == 0 { 1.0 } else { -1.0 }));
        let summary = summarize(&chain).unwrap();

        assert_eq!(summary.n_retained, 200);
        assert_abs_diff_eq!(summary.sample_mean, 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.mean, 0.0, epsilon = 1e-12);
        assert!(summary.c025 < summary.mean && summary.mean < summary.c975);
        assert_abs_diff_eq!(
            summary.c975 - summary.mean,
            summary.mean - summary.c025,
            epsilon = 1e-12
        );
    }

    #[test]
    fn summarize_constant_tail() {
        let chain = vec![2.5; 500];
        let summary = summarize(&chain).unwrap();
        assert_eq!(summary.sample_std_dev, 0.0);
        assert_abs_diff_eq!(summary.mean, 2.5, epsilon = 1e-9);
        assert!(summary.c025 < summary.mean);
        assert!(summary.mean < summary.c975);
    }

    #[test]
    fn summarize_rejects_short_chains() {
        for len in [0, 50, BURN_IN, BURN_IN + 1] {
            let err = summarize(&vec![0.0; len]).unwrap_err();
            match err {
                Error::InsufficientSamples { len: got, required } => {
                    assert_eq!(got, len);
                    assert_eq!(required, BURN_IN + 2);
                }
                other => panic!("unexpected error {other:?}"),
            }
        }
        assert!(summarize(&vec![0.0; BURN_IN + 2]).is_ok());
    }
}
