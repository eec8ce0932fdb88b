/*!
Target densities for the sampler plus the standard-normal helpers shared by the
ROC fitter and the chain summary.

A target only has to report an unnormalized log-density for a scalar state. Any
closure `Fn(f64) -> f64` is a target, so most callers never name a type:

```rust
use mini_sdt::distributions::Target;

let standard_normal = |x: f64| -0.5 * x * x;
assert_eq!(standard_normal.unnorm_log_prob(0.0), 0.0);
```

The normal CDF and quantile come from [`statrs`].
*/

use statrs::distribution::{ContinuousCDF, Normal};
use std::f64::consts::PI;

/// A trait for continuous scalar target distributions from which we want to sample.
pub trait Target {
    /// Returns the log of the unnormalized density for state `theta`.
    ///
    /// May return `f64::NEG_INFINITY` for states outside the support.
    fn unnorm_log_prob(&self, theta: f64) -> f64;
}

impl<F> Target for F
where
    F: Fn(f64) -> f64,
{
    fn unnorm_log_prob(&self, theta: f64) -> f64 {
        self(theta)
    }
}

/**
A univariate Gaussian target parameterized by mean and standard deviation.

# Examples

```rust
use mini_sdt::distributions::{Gaussian, Target};

let gauss = Gaussian::new(1.0, 2.0);
assert_eq!(gauss.unnorm_log_prob(1.0), 0.0);
assert!(gauss.unnorm_log_prob(3.0) < 0.0);
```
*/
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gaussian {
    pub mean: f64,
    pub std: f64,
}

impl Gaussian {
    pub fn new(mean: f64, std: f64) -> Self {
        Self { mean, std }
    }

    /// The standard normal, N(0, 1).
    pub fn standard() -> Self {
        Self::new(0.0, 1.0)
    }

    /// Fully normalized log-density.
    pub fn log_prob(&self, theta: f64) -> f64 {
        self.unnorm_log_prob(theta) - 0.5 * (2.0 * PI).ln() - self.std.ln()
    }
}

impl Target for Gaussian {
    fn unnorm_log_prob(&self, theta: f64) -> f64 {
        let z = (theta - self.mean) / self.std;
        -0.5 * z * z
    }
}

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("Expecting creation of the standard normal to succeed.")
}

/// Standard normal CDF, Φ(x).
pub fn norm_cdf(x: f64) -> f64 {
    standard_normal().cdf(x)
}

/// Standard normal quantile, Φ⁻¹(p), for `p` in [0, 1].
///
/// Returns `-inf` at 0, `+inf` at 1 and NaN outside the unit interval.
pub fn norm_ppf(p: f64) -> f64 {
    if !(0.0..=1.0).contains(&p) {
        return f64::NAN;
    }
    if p == 0.0 {
        return f64::NEG_INFINITY;
    }
    if p == 1.0 {
        return f64::INFINITY;
    }
    standard_normal().inverse_cdf(p)
}
