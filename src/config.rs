//! Run configuration for the reversible-jump sampler.

use crate::error::{Result, SamplerError};
use crate::proposal::{ProposalGenerator, DEFAULT_BIRTH_DEATH_THRESHOLD};

/// Knobs of a single reversible-jump run.
///
/// Built with consuming `with_*` methods and checked by [`SamplerConfig::validate`]
/// before any sampling starts.
///
/// ```rust
/// use discrete_mcmc::config::SamplerConfig;
///
/// let config = SamplerConfig::default()
///     .with_niter(5_000)
///     .with_seed(42)
///     .with_birth_death_threshold(0.7);
/// assert!(config.validate().is_ok());
/// assert!(SamplerConfig::default().with_niter(0).validate().is_err());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct SamplerConfig {
    /// Number of iterations, one chain entry each.
    pub niter: usize,
    /// Seed for the chain's RNG. `None` draws one from the thread RNG.
    pub seed: Option<u64>,
    /// Probability of a birth-death move; the remainder goes to swaps.
    pub birth_death_threshold: f64,
    /// Memoise log-likelihood values per state.
    pub cache_likelihood: bool,
    /// Show an `indicatif` progress bar while sampling.
    pub progress: bool,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            niter: 1000,
            seed: None,
            birth_death_threshold: DEFAULT_BIRTH_DEATH_THRESHOLD,
            cache_likelihood: true,
            progress: false,
        }
    }
}

impl SamplerConfig {
    pub fn with_niter(mut self, niter: usize) -> Self {
        self.niter = niter;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_birth_death_threshold(mut self, threshold: f64) -> Self {
        self.birth_death_threshold = threshold;
        self
    }

    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache_likelihood = enabled;
        self
    }

    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Checks the iteration count and the move threshold.
    pub fn validate(&self) -> Result<()> {
        if self.niter == 0 {
            return Err(SamplerError::InvalidIterationCount);
        }
        self.proposal_generator().map(|_| ())
    }

    pub(crate) fn proposal_generator(&self) -> Result<ProposalGenerator> {
        ProposalGenerator::new(self.birth_death_threshold)
    }
}
