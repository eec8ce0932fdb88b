use indicatif::ProgressBar;
use indicatif::{MultiProgress, ProgressStyle};
use rayon::prelude::*;

use crate::distributions::Target;
use crate::errors::Result;
use crate::metropolis_hastings::AdaptiveSampler;

pub trait MarkovChain<S> {
    /// Does one iteration of the chain, returning the new current state.
    fn step(&mut self) -> Result<&S>;

    /// Get the current state without stepping.
    fn current_state(&self) -> &S;
}

/// Runs `n_steps` iterations and returns the state held during each of them.
///
/// The state is recorded before the step, so the first entry is the state the
/// chain started from and the final state is not part of the output.
pub fn run_chain<S, M>(chain: &mut M, n_steps: usize) -> Result<Vec<S>>
where
    M: MarkovChain<S>,
    S: Clone,
{
    let mut out = Vec::with_capacity(n_steps);

    for _ in 0..n_steps {
        let held = chain.current_state().clone();
        chain.step()?;
        out.push(held);
    }

    Ok(out)
}

pub fn run_chain_with_progress<S, M>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<Vec<S>>
where
    M: MarkovChain<S>,
    S: Clone,
{
    let mut out = Vec::with_capacity(n_steps);

    pb.set_length(n_steps as u64);

    for _ in 0..n_steps {
        let held = chain.current_state().clone();
        chain.step()?;
        out.push(held);

        pb.inc(1);
    }

    Ok(out)
}

fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

pub(crate) fn single_progress_bar(n_steps: usize) -> ProgressBar {
    let pb = ProgressBar::new(n_steps as u64);
    pb.set_prefix("Chain 0");
    pb.set_style(progress_style());
    pb
}

/// Samples every sampler `n_samples` more times, in parallel.
///
/// Each sampler owns its RNG, so the samplers share no state. Stops at the
/// first error, e.g. an uncalibrated sampler.
pub fn run_parallel<D>(samplers: &mut [AdaptiveSampler<D>], n_samples: usize) -> Result<()>
where
    D: Target + Send,
{
    samplers
        .par_iter_mut()
        .try_for_each(|sampler| sampler.sample(n_samples).map(|_| ()))
}

/// Like [`run_parallel`], with one progress bar per sampler.
pub fn run_parallel_with_progress<D>(
    samplers: &mut [AdaptiveSampler<D>],
    n_samples: usize,
) -> Result<()>
where
    D: Target + Send,
{
    let multi = MultiProgress::new();
    let pb_style = progress_style();

    samplers
        .par_iter_mut()
        .enumerate()
        .try_for_each(|(i, sampler)| {
            let pb = multi.add(ProgressBar::new(n_samples as u64));
            pb.set_prefix(format!("Chain {i}"));
            pb.set_style(pb_style.clone());

            sampler.sample_with_bar(n_samples, &pb)?;

            pb.finish_with_message("Done!");
            Ok(())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    /// Counts upward by one per step.
    struct Counter {
        state: u32,
    }

    impl MarkovChain<u32> for Counter {
        fn step(&mut self) -> Result<&u32> {
            self.state += 1;
            Ok(&self.state)
        }

        fn current_state(&self) -> &u32 {
            &self.state
        }
    }

    #[test]
    fn run_chain_records_state_before_each_step() {
        let mut chain = Counter { state: 5 };
        let out = run_chain(&mut chain, 3).unwrap();
        assert_eq!(out, vec![5, 6, 7]);
        assert_eq!(chain.state, 8);
    }

    #[test]
    fn run_chain_with_progress_matches_run_chain() {
        let pb = ProgressBar::hidden();
        let mut chain = Counter { state: 0 };
        let out = run_chain_with_progress(&mut chain, 4, &pb).unwrap();
        assert_eq!(out, vec![0, 1, 2, 3]);
        assert_eq!(pb.position(), 4);
    }

    #[test]
    fn run_parallel_extends_every_chain() {
        let mut samplers: Vec<_> = (0..4)
            .map(|i| {
                let mut s = AdaptiveSampler::new(|x: f64| -0.5 * x * x, 0.0).set_seed(i);
                s.adapt(&[1; 20]);
                s
            })
            .collect();

        run_parallel(&mut samplers, 250).unwrap();
        for sampler in &samplers {
            assert_eq!(sampler.chain().len(), 250);
        }
    }

    #[test]
    fn run_parallel_surfaces_uncalibrated_samplers() {
        let mut samplers = vec![AdaptiveSampler::new(|x: f64| -x * x, 0.0)];
        let err = run_parallel(&mut samplers, 10).unwrap_err();
        assert!(matches!(err, Error::NotCalibrated));
    }
}
