/*!
# Adaptive Metropolis Sampler

This module implements a scalar Metropolis sampler that tunes its own proposal
scale before sampling. A run has three phases:

- **Calibration** ([`AdaptiveSampler::adapt`]): a fixed number of accept/reject
  steps. After each step the scale is multiplied by
  `(TARGET_ACCEPTANCE_RATE / rate)^ADAPTATION_EXPONENT`, where `rate` is the
  acceptance rate over the whole calibration so far. Calibration proposals are
  drawn uniformly between the current state and the current scale.
- **Sampling** ([`AdaptiveSampler::sample`]): Gaussian random-walk Metropolis
  with the calibrated scale. Every iteration appends the state held during that
  iteration to the chain.
- **Summary** ([`AdaptiveSampler::summary`]): drops a fixed burn-in and combines
  the tail mean with a standard normal prior. See [`crate::stats::summarize`].

## Example Usage

```rust
use mini_sdt::metropolis_hastings::AdaptiveSampler;

let mut sampler = AdaptiveSampler::new(|x: f64| -0.5 * x * x, 0.0).set_seed(42);
sampler.adapt(&[1; 50]).sample(1_000)?;

assert_eq!(sampler.chain().len(), 1_000);
let summary = sampler.summary()?;
assert!(summary.c025 < summary.mean && summary.mean < summary.c975);
# Ok::<(), mini_sdt::errors::Error>(())
```
*/

use log::{debug, warn};
use rand::prelude::*;
use rand_distr::StandardNormal;

use crate::core::{run_chain, run_chain_with_progress, single_progress_bar, MarkovChain};
use crate::distributions::Target;
use crate::errors::{Error, Result};
use crate::stats::{summarize, AcceptanceCounter, Summary};

/// Proposal scale at the start of every calibration.
pub const INITIAL_PROPOSAL_SCALE: f64 = 1.0;

/// Acceptance rate calibration steers toward.
pub const TARGET_ACCEPTANCE_RATE: f64 = 0.4;

/// Exponent of the multiplicative rescale step.
pub const ADAPTATION_EXPONENT: f64 = 1.1;

/**
An adaptive Metropolis sampler over a scalar state.

The sampler owns its chain, its proposal scale and its random number generator.
Two samplers never share state, so they can run on different threads (see
[`crate::core::run_parallel`]).

# Examples

```rust
use mini_sdt::distributions::Gaussian;
use mini_sdt::metropolis_hastings::AdaptiveSampler;

let sampler = AdaptiveSampler::new(Gaussian::standard(), 0.0).set_seed(7);
assert!(sampler.chain().is_empty());
assert_eq!(sampler.proposal_scale(), None);
```
*/
#[derive(Debug, Clone)]
pub struct AdaptiveSampler<D> {
    /// The target distribution we want to sample from.
    pub target: D,
    initial_state: f64,
    state: f64,
    proposal_scale: Option<f64>,
    chain: Vec<f64>,
    calibration: AcceptanceCounter,
    sampling: AcceptanceCounter,
    /// The random seed.
    pub seed: u64,
    /// The random number generator for this sampler.
    pub rng: SmallRng,
}

impl<D: Target> AdaptiveSampler<D> {
    /// Creates an uncalibrated sampler positioned at `initial_state`, with an
    /// entropy-seeded RNG.
    pub fn new(target: D, initial_state: f64) -> Self {
        let seed = thread_rng().gen::<u64>();
        Self {
            target,
            initial_state,
            state: initial_state,
            proposal_scale: None,
            chain: Vec::new(),
            calibration: AcceptanceCounter::new(),
            sampling: AcceptanceCounter::new(),
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /**
    Reseeds the sampler's RNG so runs are reproducible.

    # Examples

    ```rust
    use mini_sdt::metropolis_hastings::AdaptiveSampler;

    let sampler = AdaptiveSampler::new(|x: f64| -x * x, 0.0).set_seed(42);
    assert_eq!(sampler.seed, 42);
    ```
    */
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    /**
    Uses a known proposal scale instead of calibrating. A later
    [`adapt`](Self::adapt) overwrites it.

    # Errors

    [`Error::InvalidConfig`] unless `scale` is positive and finite.

    # Examples

    ```rust
    use mini_sdt::metropolis_hastings::AdaptiveSampler;

    let sampler = AdaptiveSampler::new(|x: f64| -0.5 * x * x, 0.0).set_proposal_scale(2.4)?;
    assert_eq!(sampler.proposal_scale(), Some(2.4));
    assert!(AdaptiveSampler::new(|x: f64| -x, 0.0).set_proposal_scale(0.0).is_err());
    # Ok::<(), mini_sdt::errors::Error>(())
    ```
    */
    pub fn set_proposal_scale(mut self, scale: f64) -> Result<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "proposal scale must be positive and finite, got {scale}"
            )));
        }
        self.proposal_scale = Some(scale);
        Ok(self)
    }

    /// Metropolis rule with the log ratio clipped at 0. Consumes one uniform draw.
    fn accept(&mut self, proposal: f64, current: f64) -> bool {
        let log_ratio = (self.target.unnorm_log_prob(proposal)
            - self.target.unnorm_log_prob(current))
        .min(0.0);
        let u: f64 = self.rng.gen();
        log_ratio.exp() > u
    }

    /**
    Calibrates the proposal scale with one accept/reject step per block.

    Only the number of blocks matters; their lengths are ignored. Every step
    proposes uniformly between the current calibration state and the current
    scale, then rescales by `(TARGET_ACCEPTANCE_RATE / rate)^ADAPTATION_EXPONENT`
    using the acceptance rate over all steps of this calibration. The rescale
    is skipped while nothing has been accepted yet. The walk starts at the
    sampler's current state and does not move it.

    With no blocks the sampler stays uncalibrated.
    */
    pub fn adapt(&mut self, block_lengths: &[usize]) -> &mut Self {
        if block_lengths.is_empty() {
            warn!("adapt called without calibration blocks; proposal scale left unset");
            return self;
        }

        let mut counter = AcceptanceCounter::new();
        let mut scale = INITIAL_PROPOSAL_SCALE;
        let mut theta = self.state;
        let mut skipped = 0usize;

        for _ in block_lengths {
            let u: f64 = self.rng.gen();
            let proposal = theta + (scale - theta) * u;
            let accepted = self.accept(proposal, theta);
            counter.record(accepted);
            if accepted {
                theta = proposal;
            }

            match counter.rate() {
                Some(rate) if rate > 0.0 => {
                    let factor = (TARGET_ACCEPTANCE_RATE / rate).powf(ADAPTATION_EXPONENT);
                    scale = (scale * factor).clamp(f64::MIN_POSITIVE, f64::MAX);
                }
                _ => skipped += 1,
            }
            self.proposal_scale = Some(scale);
        }

        if skipped > 0 {
            warn!("no proposal accepted during the first {skipped} calibration steps; rescale skipped");
        }
        debug!(
            "calibrated proposal scale {scale:e} over {} steps (acceptance rate {:.3})",
            counter.total(),
            counter.rate().unwrap_or(0.0)
        );

        self.calibration = counter;
        self
    }

    /**
    Draws `n_samples` more states with Gaussian random-walk proposals.

    Each iteration records the state held before the accept/reject step, then
    possibly moves. The chain grows by exactly `n_samples`.

    # Errors

    [`Error::NotCalibrated`] if [`adapt`](Self::adapt) has not set a scale.
    */
    pub fn sample(&mut self, n_samples: usize) -> Result<&mut Self> {
        self.require_scale()?;
        let draws = run_chain(self, n_samples)?;
        self.chain.extend(draws);
        self.log_sampling();
        Ok(self)
    }

    /// Like [`sample`](Self::sample), drawing a progress bar while it runs.
    pub fn sample_with_progress(&mut self, n_samples: usize) -> Result<&mut Self> {
        self.require_scale()?;
        let pb = single_progress_bar(n_samples);
        self.sample_with_bar(n_samples, &pb)?;
        pb.finish_with_message("Done!");
        Ok(self)
    }

    pub(crate) fn sample_with_bar(
        &mut self,
        n_samples: usize,
        pb: &indicatif::ProgressBar,
    ) -> Result<&mut Self> {
        self.require_scale()?;
        let draws = run_chain_with_progress(self, n_samples, pb)?;
        self.chain.extend(draws);
        self.log_sampling();
        Ok(self)
    }

    /// Posterior summary of the chain after burn-in. Leaves the chain intact.
    ///
    /// # Errors
    ///
    /// [`Error::InsufficientSamples`] if the chain is too short.
    pub fn summary(&self) -> Result<Summary> {
        summarize(&self.chain)
    }

    fn require_scale(&self) -> Result<f64> {
        self.proposal_scale.ok_or(Error::NotCalibrated)
    }

    fn log_sampling(&self) {
        if let Some(rate) = self.sampling.rate() {
            debug!(
                "chain holds {} states, sampling acceptance rate {rate:.3}",
                self.chain.len()
            );
        }
    }

    pub fn chain(&self) -> &[f64] {
        &self.chain
    }

    /// The calibrated proposal standard deviation, if calibration ran.
    pub fn proposal_scale(&self) -> Option<f64> {
        self.proposal_scale
    }

    pub fn initial_state(&self) -> f64 {
        self.initial_state
    }

    /// Acceptance rate over every sampling iteration so far.
    pub fn acceptance_rate(&self) -> Option<f64> {
        self.sampling.rate()
    }

    /// Acceptance rate over the most recent calibration.
    pub fn calibration_acceptance_rate(&self) -> Option<f64> {
        self.calibration.rate()
    }
}

impl<D: Target> MarkovChain<f64> for AdaptiveSampler<D> {
    /// One random-walk Metropolis step with the calibrated scale.
    fn step(&mut self) -> Result<&f64> {
        let scale = self.require_scale()?;
        let z: f64 = self.rng.sample(StandardNormal);
        let proposed = self.state + scale * z;
        let accepted = self.accept(proposed, self.state);
        self.sampling.record(accepted);
        if accepted {
            self.state = proposed;
        }
        Ok(&self.state)
    }

    fn current_state(&self) -> &f64 {
        &self.state
    }
}
