/*!
Aggregated signal-detection tallies.

A [`TrialTally`] holds the four outcome counts of one experimental condition.
From it follow the hit rate, the false-alarm rate and the equal-variance
sensitivity (d′) and bias (criterion) measures. Tallies of the same condition
can be pooled with `+` and scaled with `*`.

```rust
use mini_sdt::signal_detection::TrialTally;

let tally = TrialTally::new(80, 20, 20, 80);
assert_eq!(tally.hit_rate(), 0.8);
assert_eq!(tally.false_alarm_rate(), 0.2);
assert!(tally.criterion().abs() < 1e-12);
```
*/

use rand::Rng;
use rand_distr::{Binomial, Distribution};
use std::ops::{Add, Mul};

use crate::distributions::{norm_cdf, norm_ppf};
use crate::errors::{Error, Result};

/// Hit, miss, false-alarm and correct-rejection counts of one condition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct TrialTally {
    pub hits: u64,
    pub misses: u64,
    pub false_alarms: u64,
    pub correct_rejections: u64,
}

impl TrialTally {
    pub fn new(hits: u64, misses: u64, false_alarms: u64, correct_rejections: u64) -> Self {
        Self {
            hits,
            misses,
            false_alarms,
            correct_rejections,
        }
    }

    /// Number of signal trials, saturating at `u64::MAX`.
    pub fn signal_trials(&self) -> u64 {
        self.hits.saturating_add(self.misses)
    }

    /// Number of noise trials, saturating at `u64::MAX`.
    pub fn noise_trials(&self) -> u64 {
        self.false_alarms.saturating_add(self.correct_rejections)
    }

    /// Pools two tallies, or `None` if a count overflows.
    pub fn checked_add(self, other: TrialTally) -> Option<TrialTally> {
        Some(TrialTally {
            hits: self.hits.checked_add(other.hits)?,
            misses: self.misses.checked_add(other.misses)?,
            false_alarms: self.false_alarms.checked_add(other.false_alarms)?,
            correct_rejections: self.correct_rejections.checked_add(other.correct_rejections)?,
        })
    }

    /// Scales every count, or `None` if a count overflows.
    pub fn checked_mul(self, scalar: u64) -> Option<TrialTally> {
        Some(TrialTally {
            hits: self.hits.checked_mul(scalar)?,
            misses: self.misses.checked_mul(scalar)?,
            false_alarms: self.false_alarms.checked_mul(scalar)?,
            correct_rejections: self.correct_rejections.checked_mul(scalar)?,
        })
    }

    /// `hits / (hits + misses)`. NaN without signal trials.
    pub fn hit_rate(&self) -> f64 {
        self.hits as f64 / self.signal_trials() as f64
    }

    /// `false_alarms / (false_alarms + correct_rejections)`. NaN without noise trials.
    pub fn false_alarm_rate(&self) -> f64 {
        self.false_alarms as f64 / self.noise_trials() as f64
    }

    /// Sensitivity, `Φ⁻¹(H) − Φ⁻¹(FA)`.
    pub fn d_prime(&self) -> f64 {
        norm_ppf(self.hit_rate()) - norm_ppf(self.false_alarm_rate())
    }

    /// Response bias, `−½ (Φ⁻¹(H) + Φ⁻¹(FA))`.
    pub fn criterion(&self) -> f64 {
        -0.5 * (norm_ppf(self.hit_rate()) + norm_ppf(self.false_alarm_rate()))
    }

    /// True when both rates lie strictly inside (0, 1).
    pub fn is_non_degenerate(&self) -> bool {
        let open = |r: f64| r > 0.0 && r < 1.0;
        open(self.hit_rate()) && open(self.false_alarm_rate())
    }

    /// Negative binomial log-likelihood of this tally when the predicted hit
    /// rate is `hit_rate` and the false-alarm rate is `false_alarm_rate`.
    pub fn neg_log_likelihood(&self, hit_rate: f64, false_alarm_rate: f64) -> f64 {
        -(self.hits as f64 * hit_rate.ln()
            + self.misses as f64 * (1.0 - hit_rate).ln()
            + self.false_alarms as f64 * false_alarm_rate.ln()
            + self.correct_rejections as f64 * (1.0 - false_alarm_rate).ln())
    }
}

/// Count-wise sum, saturating at `u64::MAX`. See [`TrialTally::checked_add`].
impl Add for TrialTally {
    type Output = TrialTally;

    fn add(self, other: TrialTally) -> TrialTally {
        TrialTally {
            hits: self.hits.saturating_add(other.hits),
            misses: self.misses.saturating_add(other.misses),
            false_alarms: self.false_alarms.saturating_add(other.false_alarms),
            correct_rejections: self.correct_rejections.saturating_add(other.correct_rejections),
        }
    }
}

/// Count-wise product, saturating at `u64::MAX`. See [`TrialTally::checked_mul`].
impl Mul<u64> for TrialTally {
    type Output = TrialTally;

    fn mul(self, scalar: u64) -> TrialTally {
        TrialTally {
            hits: self.hits.saturating_mul(scalar),
            misses: self.misses.saturating_mul(scalar),
            false_alarms: self.false_alarms.saturating_mul(scalar),
            correct_rejections: self.correct_rejections.saturating_mul(scalar),
        }
    }
}

impl std::iter::Sum for TrialTally {
    fn sum<I: Iterator<Item = TrialTally>>(iter: I) -> Self {
        iter.fold(TrialTally::default(), Add::add)
    }
}

/**
Simulates one tally per criterion for an observer with sensitivity `d_prime`.

For criterion `c` the decision threshold is `k = c + d′/2`. Signal trials
exceed it with probability `1 − Φ(k − d′)` and noise trials with `1 − Φ(k)`.
Hit and false-alarm counts are binomial draws with those probabilities.

# Errors

[`Error::Distribution`] if a probability is not finite, e.g. for a NaN criterion.

# Examples

```rust
use mini_sdt::signal_detection::simulate;
use rand::{rngs::SmallRng, SeedableRng};

let mut rng = SmallRng::seed_from_u64(1);
let tallies = simulate(1.0, &[-0.5, 0.0, 0.5], 100, 100, &mut rng)?;
assert_eq!(tallies.len(), 3);
assert!(tallies.iter().all(|t| t.signal_trials() == 100 && t.noise_trials() == 100));
# Ok::<(), mini_sdt::errors::Error>(())
```
*/
pub fn simulate<R: Rng + ?Sized>(
    d_prime: f64,
    criteria: &[f64],
    signal_count: u64,
    noise_count: u64,
    rng: &mut R,
) -> Result<Vec<TrialTally>> {
    criteria
        .iter()
        .map(|&criterion| {
            let k = criterion + d_prime / 2.0;
            let hit_p = 1.0 - norm_cdf(k - d_prime);
            let fa_p = 1.0 - norm_cdf(k);

            let hits = Binomial::new(signal_count, hit_p)
                .map_err(|e| Error::Distribution(format!("hit probability {hit_p}: {e}")))?
                .sample(&mut *rng);
            let false_alarms = Binomial::new(noise_count, fa_p)
                .map_err(|e| Error::Distribution(format!("false-alarm probability {fa_p}: {e}")))?
                .sample(&mut *rng);

            Ok(TrialTally::new(
                hits,
                signal_count - hits,
                false_alarms,
                noise_count - false_alarms,
            ))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn rates() {
        let t = TrialTally::new(15, 5, 15, 30);
        assert_abs_diff_eq!(t.hit_rate(), 0.75);
        assert_abs_diff_eq!(t.false_alarm_rate(), 1.0 / 3.0);
        assert!(t.is_non_degenerate());
        assert!(!TrialTally::new(0, 10, 3, 7).is_non_degenerate());
        assert!(!TrialTally::new(4, 6, 0, 0).is_non_degenerate());
    }

    #[test]
    fn d_prime_and_criterion() {
        let t = TrialTally::new(15, 5, 15, 30);
        // Φ⁻¹(0.75) = 0.6744897502, Φ⁻¹(1/3) = -0.4307272993
        assert_abs_diff_eq!(t.d_prime(), 1.1052170495, epsilon = 1e-8);
        assert_abs_diff_eq!(t.criterion(), -0.1218812254, epsilon = 1e-8);

        let symmetric = TrialTally::new(80, 20, 20, 80);
        assert_abs_diff_eq!(symmetric.d_prime(), 1.6832424671, epsilon = 1e-8);
        assert_abs_diff_eq!(symmetric.criterion(), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn add_and_scale() {
        let a = TrialTally::new(1, 2, 3, 4);
        let b = TrialTally::new(10, 20, 30, 40);
        assert_eq!(a + b, TrialTally::new(11, 22, 33, 44));
        assert_eq!(a * 3, TrialTally::new(3, 6, 9, 12));
        assert_eq!(vec![a, b, a].into_iter().sum::<TrialTally>(), TrialTally::new(12, 24, 36, 48));
        // Scaling keeps the rates.
        assert_abs_diff_eq!((a * 7).hit_rate(), a.hit_rate());
        assert_eq!(a.checked_add(b), Some(a + b));
        assert_eq!(a.checked_mul(3), Some(a * 3));
    }

    #[test]
    fn overflowing_counts_saturate() {
        let big = TrialTally::new(u64::MAX / 2, 1, 1, 1);
        assert_eq!(big * 3, TrialTally::new(u64::MAX, 3, 3, 3));
        assert_eq!(big.checked_mul(3), None);

        let sum = big + big + big;
        assert_eq!(sum.hits, u64::MAX);
        assert_eq!(big.checked_add(big).and_then(|t| t.checked_add(big)), None);
        assert_eq!(TrialTally::new(u64::MAX, 1, 0, 0).signal_trials(), u64::MAX);
    }

    #[test]
    fn neg_log_likelihood_matches_hand_computation() {
        let t = TrialTally::new(8, 2, 3, 7);
        let expected = -(8.0 * 0.7_f64.ln()
            + 2.0 * 0.3_f64.ln()
            + 3.0 * 0.3_f64.ln()
            + 7.0 * 0.7_f64.ln());
        assert_abs_diff_eq!(t.neg_log_likelihood(0.7, 0.3), expected, epsilon = 1e-12);
    }

    #[test]
    fn neg_log_likelihood_is_smallest_at_observed_rates() {
        let t = TrialTally::new(80, 20, 20, 80);
        let at_observed = t.neg_log_likelihood(0.8, 0.2);
        for p in [0.5, 0.7, 0.79, 0.81, 0.9] {
            assert!(t.neg_log_likelihood(p, 0.2) > at_observed);
        }
    }

    #[test]
    fn simulate_preserves_trial_counts() {
        let mut rng = SmallRng::seed_from_u64(42);
        let tallies = simulate(1.5, &[-1.0, -0.5, 0.0, 0.5, 1.0], 200, 300, &mut rng).unwrap();
        assert_eq!(tallies.len(), 5);
        for t in &tallies {
            assert_eq!(t.signal_trials(), 200);
            assert_eq!(t.noise_trials(), 300);
        }
        // A stricter criterion produces fewer false alarms on average.
        assert!(tallies[0].false_alarms > tallies[4].false_alarms);
    }

    #[test]
    fn simulate_recovers_d_prime_in_aggregate() {
        let mut rng = SmallRng::seed_from_u64(7);
        let tallies = simulate(1.0, &[0.0; 20], 1_000, 1_000, &mut rng).unwrap();
        let pooled: TrialTally = tallies.into_iter().sum();
        assert_abs_diff_eq!(pooled.d_prime(), 1.0, epsilon = 0.05);
        assert_abs_diff_eq!(pooled.criterion(), 0.0, epsilon = 0.05);
    }

    #[test]
    fn simulate_rejects_nan_criterion() {
        let mut rng = SmallRng::seed_from_u64(0);
        let err = simulate(1.0, &[f64::NAN], 10, 10, &mut rng).unwrap_err();
        assert!(matches!(err, Error::Distribution(_)));
    }
}
