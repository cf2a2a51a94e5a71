/*!
# Reversible-Jump Model Search

This module implements the reversible-jump sampler over binary inclusion vectors
(Green, 1995). Each iteration

1. proposes a candidate with a birth-death or a swap move ([`ProposalGenerator`]),
2. scores the current and the candidate state ([`PosteriorEvaluator`]),
3. accepts with probability `min(1, B)` where `B` is the Bayes factor
   ([`acceptance::decide`]),
4. records the resulting state and the verdict.

## Overview

- **Single chain**: [`RjMarkovChain`] owns its evaluator, proposal generator,
  current state and `SmallRng`. It implements [`MarkovChain`].
- **Independent chains**: [`ReversibleJump`] holds several chains started from the
  same state. `set_seed` seeds chain `i` with `seed + i`, and the chains run in
  parallel through [`ChainRunner`](crate::core::ChainRunner). They never exchange
  information.
- **One-call entry points**: [`sample`] and [`sample_with_config`].

## Example Usage

```rust
use discrete_mcmc::reversible_jump::sample;
use discrete_mcmc::state::StateVector;

// Only the null model has non-zero likelihood.
let loglike = |s: &StateVector, _: &()| {
    if s.is_null() { 0.0 } else { f64::NEG_INFINITY }
};
let (chain, trace) = sample(&[0, 0, 0], loglike, (), 500, Some(42)).unwrap();

assert_eq!(chain.len(), 500);
assert!(chain.iter().all(|s| s.is_null()));
// births are impossible and swaps on the null model are identities
assert_eq!(trace.acceptance_rate(), Some(0.0));
```
*/

use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use indicatif::ProgressBar;
use num_traits::ToPrimitive;
use rand::prelude::*;

use crate::acceptance;
use crate::config::SamplerConfig;
use crate::core::{
    progress_style, run_chain, run_chain_until, run_chain_with_progress, AcceptanceTrace,
    ChainRun, HasChains, MarkovChain, StepRecord,
};
use crate::error::Result;
use crate::posterior::{LogLikelihood, PosteriorEvaluator};
use crate::proposal::{Proposal, ProposalGenerator};
use crate::state::StateVector;

/// A single reversible-jump Markov chain.
///
/// The chain holds the only live copy of the current state and replaces it on
/// acceptance; previously recorded states are never touched.
#[derive(Debug, Clone)]
pub struct RjMarkovChain<L, A> {
    /// Scores states; owns the likelihood cache.
    pub evaluator: PosteriorEvaluator<L, A>,
    /// Generates birth-death and swap candidates.
    pub proposal: ProposalGenerator,
    /// The current state of the chain.
    pub current_state: StateVector,
    /// The chain-specific random seed.
    pub seed: u64,
    /// The random number generator for this chain.
    pub rng: SmallRng,
}

impl<L, A> RjMarkovChain<L, A>
where
    L: LogLikelihood<A>,
{
    /**
    Creates a new chain starting at `initial_state`, seeded from the thread RNG.

    # Examples

    ```rust
    use discrete_mcmc::reversible_jump::RjMarkovChain;
    use discrete_mcmc::state::StateVector;

    let start = StateVector::new(vec![0, 1, 0]).unwrap();
    let chain = RjMarkovChain::new(|_: &StateVector, _: &()| 0.0, (), start).set_seed(7);
    assert_eq!(chain.seed, 7);
    ```
    */
    pub fn new(likelihood: L, args: A, initial_state: StateVector) -> Self {
        Self::from_shared(likelihood, Arc::new(args), initial_state)
    }

    /// Creates a chain whose argument bundle is shared with other chains.
    pub fn from_shared(likelihood: L, args: Arc<A>, initial_state: StateVector) -> Self {
        let seed = thread_rng().gen::<u64>();
        Self {
            evaluator: PosteriorEvaluator::from_shared(likelihood, args),
            proposal: ProposalGenerator::default(),
            current_state: initial_state,
            seed,
            rng: SmallRng::seed_from_u64(seed),
        }
    }

    /// Creates a chain honouring every field of `config` except `niter` and `progress`,
    /// which apply to the run rather than the chain.
    pub fn from_config(
        likelihood: L,
        args: Arc<A>,
        initial_state: StateVector,
        config: &SamplerConfig,
    ) -> Result<Self> {
        let mut chain = Self::from_shared(likelihood, args, initial_state)
            .with_proposal(config.proposal_generator()?);
        chain.evaluator = chain.evaluator.with_cache(config.cache_likelihood);
        Ok(match config.seed {
            Some(seed) => chain.set_seed(seed),
            None => chain,
        })
    }

    /// Re-seeds the chain's RNG.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.rng = SmallRng::seed_from_u64(seed);
        self
    }

    pub fn with_proposal(mut self, proposal: ProposalGenerator) -> Self {
        self.proposal = proposal;
        self
    }

    /// Runs the chain for `niter` iterations.
    pub fn run(&mut self, niter: usize) -> Result<ChainRun> {
        run_chain(self, niter)
    }

    /// Runs the chain with a progress bar labelled `prefix`.
    pub fn run_progress(&mut self, niter: usize, prefix: &str) -> Result<ChainRun> {
        let pb = ProgressBar::new(niter as u64);
        pb.set_style(progress_style());
        pb.set_prefix(prefix.to_string());
        let run = run_chain_with_progress(self, niter, &pb);
        pb.finish_with_message("Done!");
        run
    }

    /// Runs up to `niter` iterations, stopping early once `stop` is set.
    pub fn run_until(&mut self, niter: usize, stop: &AtomicBool) -> Result<ChainRun> {
        run_chain_until(self, niter, stop)
    }
}

impl<L, A> MarkovChain for RjMarkovChain<L, A>
where
    L: LogLikelihood<A>,
{
    /**
    Performs one reversible-jump update.

    A candidate is proposed from the current state. Both states are scored and the
    candidate is accepted when `u < exp(log p(candidate) - log p(current))`. A
    degenerate swap proposes the current state itself; its decision is still
    drawn and kept in the record, but the step is not counted as accepted.
    */
    fn step(&mut self) -> Result<StepRecord> {
        let proposal = self.proposal.propose(&self.current_state, &mut self.rng);
        let log_current = self.evaluator.log_posterior(&self.current_state)?;
        let log_candidate = match &proposal {
            Proposal::Proposed { candidate, .. } => self.evaluator.log_posterior(candidate)?,
            Proposal::DegenerateIdentity { .. } => log_current,
        };
        let decision = acceptance::decide(log_current, log_candidate, &mut self.rng);

        let record = StepRecord {
            move_kind: proposal.kind(),
            degenerate: proposal.is_degenerate(),
            log_current,
            log_candidate,
            decision,
        };
        if record.accepted() {
            self.current_state = proposal.into_candidate(&self.current_state);
        }
        Ok(record)
    }

    fn current_state(&self) -> &StateVector {
        &self.current_state
    }
}

/**
Several independent reversible-jump chains started from the same state.

Each chain owns its RNG, evaluator and likelihood cache. The argument bundle is
shared read-only.

# Examples

```rust
use discrete_mcmc::core::ChainRunner;
use discrete_mcmc::reversible_jump::ReversibleJump;
use discrete_mcmc::state::StateVector;

let loglike = |s: &StateVector, w: &Vec<f64>| -> f64 {
    s.as_slice().iter().zip(w).map(|(&b, w)| b as f64 * w).sum()
};
let start = StateVector::zeros(3).unwrap();
let mut rj = ReversibleJump::new(loglike, vec![1.0, -1.0, 0.0], start, 4).set_seed(42);
assert_eq!(rj.chains[3].seed, 45);

let runs = rj.run(1_000, 100).unwrap();
assert_eq!(runs.len(), 4);
assert!(runs.iter().all(|run| run.len() == 900));
```
*/
#[derive(Debug, Clone)]
pub struct ReversibleJump<L, A> {
    /// The vector of independent Markov chains.
    pub chains: Vec<RjMarkovChain<L, A>>,
    /// The global random seed.
    pub seed: u64,
}

impl<L, A> ReversibleJump<L, A>
where
    L: LogLikelihood<A> + Clone,
{
    pub fn new(likelihood: L, args: A, initial_state: StateVector, n_chains: usize) -> Self {
        let args = Arc::new(args);
        let chains = (0..n_chains)
            .map(|_| {
                RjMarkovChain::from_shared(
                    likelihood.clone(),
                    Arc::clone(&args),
                    initial_state.clone(),
                )
            })
            .collect();
        let seed = thread_rng().gen::<u64>();

        Self { chains, seed }
    }

    /// Sets a new global seed; chain `i` is seeded with `seed + i`.
    pub fn set_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self.chains = self
            .chains
            .into_iter()
            .enumerate()
            .map(|(i, chain)| chain.set_seed(seed.wrapping_add(i as u64)))
            .collect();
        self
    }

    /// Applies the same proposal generator to every chain.
    pub fn with_proposal(mut self, proposal: ProposalGenerator) -> Self {
        for chain in &mut self.chains {
            chain.proposal = proposal;
        }
        self
    }
}

impl<L, A> HasChains for ReversibleJump<L, A>
where
    L: LogLikelihood<A> + Send,
    A: Send + Sync,
{
    type Chain = RjMarkovChain<L, A>;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain> {
        &mut self.chains
    }
}

/**
Runs a single reversible-jump chain.

`initial_state` may hold any numeric type; every element must be exactly 0 or 1.
With `seed = Some(s)` the run is fully reproducible.

# Errors

- [`SamplerError::InvalidState`](crate::error::SamplerError::InvalidState) for an
  empty initial state or one holding a value other than 0 or 1.
- [`SamplerError::InvalidIterationCount`](crate::error::SamplerError::InvalidIterationCount)
  for `niter == 0`.
- [`SamplerError::LikelihoodEvaluation`](crate::error::SamplerError::LikelihoodEvaluation)
  as soon as the likelihood fails or returns NaN / `+inf`.

# Examples

```rust
use discrete_mcmc::reversible_jump::sample;
use discrete_mcmc::state::StateVector;

let flat = |_: &StateVector, _: &()| 0.0;
let (a, _) = sample(&[0, 1, 0, 1], flat, (), 200, Some(1)).unwrap();
let (b, _) = sample(&[0, 1, 0, 1], flat, (), 200, Some(1)).unwrap();
assert_eq!(a, b);

assert!(sample(&[0, 2], flat, (), 10, None).is_err());
assert!(sample(&[0, 1], flat, (), 0, None).is_err());
```
*/
pub fn sample<T, L, A>(
    initial_state: &[T],
    log_likelihood: L,
    args: A,
    niter: usize,
    seed: Option<u64>,
) -> Result<(Vec<StateVector>, AcceptanceTrace)>
where
    T: ToPrimitive + Copy,
    L: LogLikelihood<A>,
{
    let config = SamplerConfig {
        niter,
        seed,
        ..SamplerConfig::default()
    };
    let run = sample_with_config(initial_state, log_likelihood, args, &config)?;
    Ok((run.chain, run.trace))
}

/// Runs a single chain with every knob of [`SamplerConfig`].
pub fn sample_with_config<T, L, A>(
    initial_state: &[T],
    log_likelihood: L,
    args: A,
    config: &SamplerConfig,
) -> Result<ChainRun>
where
    T: ToPrimitive + Copy,
    L: LogLikelihood<A>,
{
    let initial_state = StateVector::from_values(initial_state)?;
    config.validate()?;
    let mut chain =
        RjMarkovChain::from_config(log_likelihood, Arc::new(args), initial_state, config)?;
    if config.progress {
        chain.run_progress(config.niter, "RJMCMC")
    } else {
        chain.run(config.niter)
    }
}
