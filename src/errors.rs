//! Error type shared by the sampler, the ROC fitter and the I/O helpers.

use thiserror::Error;

/// Everything that can go wrong in this crate.
#[derive(Debug, Error)]
pub enum Error {
    /// `sample` was called before calibration produced a proposal scale.
    #[error("sampler is not calibrated: call `adapt` with at least one block before sampling")]
    NotCalibrated,

    /// The chain is too short to leave a usable tail after burn-in.
    #[error("insufficient samples: chain holds {len} states, summary needs at least {required}")]
    InsufficientSamples { len: usize, required: usize },

    /// The ROC fitter was given no tallies.
    #[error("cannot fit a ROC curve to an empty dataset")]
    EmptyDataset,

    /// A tally whose hit or false-alarm rate is not strictly inside (0, 1).
    #[error(
        "tally {index} is degenerate: hit rate {hit_rate} and false-alarm rate \
         {false_alarm_rate} must both lie strictly between 0 and 1"
    )]
    DegenerateTally {
        index: usize,
        hit_rate: f64,
        false_alarm_rate: f64,
    },

    /// A user-supplied setting is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The optimizer failed or did not converge.
    #[error("ROC fit failed: {0}")]
    FitFailed(String),

    /// Invalid parameters for a random-variate distribution.
    #[error("invalid distribution parameters: {0}")]
    Distribution(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[cfg(feature = "csv")]
    #[error(transparent)]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
