//! Reversible-jump MCMC model search over binary inclusion vectors.
//!
//! A state marks which of `d` candidate components are switched on. The sampler
//! moves between states with birth-death and swap proposals and accepts by the
//! Bayes factor of a user-supplied log-likelihood. See [`reversible_jump`] for
//! the sampler itself and [`stats`] for summarising its output.

pub mod acceptance;
pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod posterior;
pub mod proposal;
pub mod reversible_jump;
pub mod state;
pub mod stats;

pub use config::SamplerConfig;
pub use error::{Result, SamplerError};
pub use posterior::{LogLikelihood, TryFn};
pub use reversible_jump::{sample, sample_with_config, ReversibleJump, RjMarkovChain};
pub use state::StateVector;
