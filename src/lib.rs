//! Adaptive Metropolis sampling over a scalar state and maximum-likelihood
//! fitting of the binormal ROC curve.
//!
//! - [`metropolis_hastings::AdaptiveSampler`] calibrates a proposal scale,
//!   draws a chain and summarizes it with a normal-prior posterior.
//! - [`roc::fit_roc`] fits the slope parameter of `H = Φ(a + Φ⁻¹(FA))` to
//!   [`signal_detection::TrialTally`] records with Nelder-Mead.

pub mod core;
pub mod distributions;
pub mod errors;
pub mod io;
pub mod metropolis_hastings;
pub mod roc;
pub mod signal_detection;
pub mod stats;
