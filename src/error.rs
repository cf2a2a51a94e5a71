//! Error type shared by every sampler component.

use thiserror::Error;

use crate::state::StateVector;

/// Boxed error returned by user-supplied likelihood functions.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum SamplerError {
    /// A state vector was empty or held a value other than 0 or 1.
    #[error("invalid state vector: {reason}")]
    InvalidState { reason: String },

    /// The sampler was asked to run for zero iterations.
    #[error("number of iterations must be positive")]
    InvalidIterationCount,

    /// The log-likelihood failed or produced NaN / +inf.
    #[error("log-likelihood evaluation failed for state {state}")]
    LikelihoodEvaluation {
        state: StateVector,
        #[source]
        source: BoxError,
    },

    /// A sampler setting was out of range, e.g. a move threshold outside `[0, 1]`.
    #[error("invalid sampler configuration: {reason}")]
    InvalidConfig { reason: String },
}

pub type Result<T> = std::result::Result<T, SamplerError>;

/// Raised in place of a numeric log-likelihood that cannot be used as a score.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("log-likelihood returned non-finite value {value}")]
pub struct NonFiniteLikelihood {
    pub value: f64,
}
