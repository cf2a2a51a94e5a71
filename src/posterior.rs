/*!
# Posterior Evaluation

The user's model enters the sampler through the [`LogLikelihood`] trait. Any
closure `Fn(&StateVector, &A) -> f64` implements it, where `A` is an immutable
bundle of auxiliary data (design matrix, observations, ...). Fallible
likelihoods implement the trait directly or wrap a closure in [`TryFn`].

The prior over the `2^d` configurations is uniform, so its log is a constant
that cancels in every Bayes factor. [`PosteriorEvaluator::log_posterior`]
therefore returns the log-likelihood unchanged, after checking that it is a
usable score: `-inf` (zero likelihood) is fine, `NaN` and `+inf` are not.

Because the likelihood is assumed to be a pure function of the state, the
evaluator memoises scores per state. The cache can be turned off for very
large model spaces.

# Examples

```rust
use discrete_mcmc::posterior::PosteriorEvaluator;
use discrete_mcmc::state::StateVector;

// log-likelihood rewards active components with positive weight
let weights = vec![1.5, -0.5, 0.0];
let loglike = |s: &StateVector, w: &Vec<f64>| -> f64 {
    s.as_slice().iter().zip(w).map(|(&b, w)| b as f64 * w).sum()
};

let mut evaluator = PosteriorEvaluator::new(loglike, weights);
let state = StateVector::new(vec![1, 1, 0]).unwrap();
assert_eq!(evaluator.log_posterior(&state).unwrap(), 1.0);
```
*/

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{BoxError, NonFiniteLikelihood, Result, SamplerError};
use crate::state::StateVector;

/// A log-likelihood over binary states with auxiliary arguments `A`.
pub trait LogLikelihood<A: ?Sized> {
    /// Returns `log p(data | state)`. `f64::NEG_INFINITY` means the state is impossible.
    fn log_likelihood(&self, state: &StateVector, args: &A) -> std::result::Result<f64, BoxError>;
}

impl<A: ?Sized, F> LogLikelihood<A> for F
where
    F: Fn(&StateVector, &A) -> f64,
{
    fn log_likelihood(&self, state: &StateVector, args: &A) -> std::result::Result<f64, BoxError> {
        Ok(self(state, args))
    }
}

/// Adapts a closure returning `Result<f64, E>` into a [`LogLikelihood`].
#[derive(Clone, Copy)]
pub struct TryFn<F>(pub F);

impl<A: ?Sized, F, E> LogLikelihood<A> for TryFn<F>
where
    F: Fn(&StateVector, &A) -> std::result::Result<f64, E>,
    E: Into<BoxError>,
{
    fn log_likelihood(&self, state: &StateVector, args: &A) -> std::result::Result<f64, BoxError> {
        (self.0)(state, args).map_err(Into::into)
    }
}

impl<F> fmt::Debug for TryFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TryFn(..)")
    }
}

/// Counters describing how often the memo cache short-circuited the likelihood.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    /// Calls that reached the user's likelihood.
    pub evaluations: u64,
}

/// Scores states under a uniform prior by delegating to a [`LogLikelihood`].
pub struct PosteriorEvaluator<L, A> {
    likelihood: L,
    args: Arc<A>,
    cache: Option<HashMap<StateVector, f64>>,
    stats: CacheStats,
}

impl<L: Clone, A> Clone for PosteriorEvaluator<L, A> {
    fn clone(&self) -> Self {
        Self {
            likelihood: self.likelihood.clone(),
            args: Arc::clone(&self.args),
            cache: self.cache.clone(),
            stats: self.stats,
        }
    }
}

impl<L, A> fmt::Debug for PosteriorEvaluator<L, A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PosteriorEvaluator")
            .field("cached_states", &self.cache.as_ref().map(HashMap::len))
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl<L, A> PosteriorEvaluator<L, A>
where
    L: LogLikelihood<A>,
{
    /// Creates an evaluator with memoisation enabled.
    pub fn new(likelihood: L, args: A) -> Self {
        Self::from_shared(likelihood, Arc::new(args))
    }

    /// Creates an evaluator over an argument bundle already shared elsewhere.
    pub fn from_shared(likelihood: L, args: Arc<A>) -> Self {
        Self {
            likelihood,
            args,
            cache: Some(HashMap::new()),
            stats: CacheStats::default(),
        }
    }

    /// Enables or disables memoisation, dropping any cached scores.
    pub fn with_cache(mut self, enabled: bool) -> Self {
        self.cache = enabled.then(HashMap::new);
        self
    }

    pub fn args(&self) -> &A {
        &self.args
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.stats
    }

    /// Number of distinct states currently memoised.
    pub fn cached_states(&self) -> usize {
        self.cache.as_ref().map_or(0, HashMap::len)
    }

    /// Log-posterior of `state` up to the additive constant of the uniform prior.
    ///
    /// Fails with [`SamplerError::LikelihoodEvaluation`] if the likelihood returns
    /// an error, `NaN` or `+inf`. Failures are not memoised.
    pub fn log_posterior(&mut self, state: &StateVector) -> Result<f64> {
        if let Some(&score) = self.cache.as_ref().and_then(|c| c.get(state)) {
            self.stats.hits += 1;
            return Ok(score);
        }

        self.stats.evaluations += 1;
        let score = self
            .likelihood
            .log_likelihood(state, &self.args)
            .and_then(|value| check_score(value).map_err(BoxError::from))
            .map_err(|source| SamplerError::LikelihoodEvaluation {
                state: state.clone(),
                source,
            })?;

        if let Some(cache) = self.cache.as_mut() {
            cache.insert(state.clone(), score);
        }
        Ok(score)
    }
}

fn check_score(value: f64) -> std::result::Result<f64, NonFiniteLikelihood> {
    if value.is_nan() || value == f64::INFINITY {
        Err(NonFiniteLikelihood { value })
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn state(bits: &[u8]) -> StateVector {
        StateVector::new(bits.to_vec()).unwrap()
    }

    #[test]
    fn test_negative_infinity_is_valid() {
        let loglike = |_: &StateVector, _: &()| f64::NEG_INFINITY;
        let mut evaluator = PosteriorEvaluator::new(loglike, ());
        assert_eq!(
            evaluator.log_posterior(&state(&[1])).unwrap(),
            f64::NEG_INFINITY
        );
    }

    #[test]
    fn test_nan_is_rejected() {
        let loglike = |_: &StateVector, _: &()| f64::NAN;
        let mut evaluator = PosteriorEvaluator::new(loglike, ());
        let err = evaluator.log_posterior(&state(&[0, 1])).unwrap_err();
        match err {
            SamplerError::LikelihoodEvaluation { state: s, source } => {
                assert_eq!(s.as_slice(), &[0, 1]);
                assert!(source.to_string().contains("non-finite"));
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(evaluator.cached_states(), 0);
    }

    #[test]
    fn test_positive_infinity_is_rejected() {
        let loglike = |_: &StateVector, _: &()| f64::INFINITY;
        let mut evaluator = PosteriorEvaluator::new(loglike, ());
        assert!(matches!(
            evaluator.log_posterior(&state(&[0])),
            Err(SamplerError::LikelihoodEvaluation { .. })
        ));
    }

    #[test]
    fn test_user_error_is_propagated() {
        let loglike = TryFn(|s: &StateVector, limit: &usize| {
            if s.count_ones() > *limit {
                Err(format!("model too large: {}", s.count_ones()))
            } else {
                Ok(-(s.count_ones() as f64))
            }
        });
        let mut evaluator = PosteriorEvaluator::new(loglike, 1usize);
        assert_eq!(evaluator.log_posterior(&state(&[1, 0])).unwrap(), -1.0);
        let err = evaluator.log_posterior(&state(&[1, 1])).unwrap_err();
        let source = std::error::Error::source(&err).expect("error carries its cause");
        assert_eq!(source.to_string(), "model too large: 2");
    }

    #[test]
    fn test_cache_calls_likelihood_once_per_state() {
        let calls = Cell::new(0);
        let loglike = |s: &StateVector, _: &()| {
            calls.set(calls.get() + 1);
            s.count_ones() as f64
        };
        let mut evaluator = PosteriorEvaluator::new(loglike, ());
        let a = state(&[1, 0, 1]);
        let b = state(&[0, 0, 1]);
        for _ in 0..5 {
            evaluator.log_posterior(&a).unwrap();
            evaluator.log_posterior(&b).unwrap();
        }
        assert_eq!(calls.get(), 2);
        assert_eq!(
            evaluator.cache_stats(),
            CacheStats {
                hits: 8,
                evaluations: 2
            }
        );
        assert_eq!(evaluator.cached_states(), 2);
    }

    #[test]
    fn test_cache_disabled_calls_every_time() {
        let calls = Cell::new(0);
        let loglike = |_: &StateVector, _: &()| {
            calls.set(calls.get() + 1);
            0.0
        };
        let mut evaluator = PosteriorEvaluator::new(loglike, ()).with_cache(false);
        let a = state(&[1]);
        for _ in 0..3 {
            evaluator.log_posterior(&a).unwrap();
        }
        assert_eq!(calls.get(), 3);
        assert_eq!(evaluator.cached_states(), 0);
    }

    #[test]
    fn test_args_are_shared() {
        let args = Arc::new(vec![0.5, 2.0]);
        let loglike = |s: &StateVector, w: &Vec<f64>| -> f64 {
            s.as_slice().iter().zip(w).map(|(&b, w)| b as f64 * w).sum()
        };
        let mut evaluator = PosteriorEvaluator::from_shared(loglike, Arc::clone(&args));
        let other = evaluator.clone();
        assert_eq!(evaluator.log_posterior(&state(&[1, 1])).unwrap(), 2.5);
        assert!(std::ptr::eq(other.args(), args.as_ref()));
    }
}
