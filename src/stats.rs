//! Provides functions for computing model-search statistics from binary chains.

use std::collections::{BTreeMap, HashMap, VecDeque};

use ndarray::prelude::*;
use ndarray::Zip;
use ndarray_stats::QuantileExt;

use crate::core::{AcceptanceTrace, ChainRun};
use crate::proposal::MoveKind;
use crate::state::StateVector;

const ACCEPT_WINDOW: usize = 100;

/// Online tracker used while a chain is running.
///
/// Keeps the acceptance probability over a sliding window of the last 100 steps
/// and running means of the inclusion indicators and the model size.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainTracker {
    n: u64,
    p_accept: f64,
    inclusion: Array1<f64>, // n_params
    mean_size: f64,
    accept_queue: VecDeque<bool>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChainStats {
    pub n: u64,
    pub p_accept: f64,
    /// Running mean of each inclusion indicator.
    pub inclusion: Array1<f64>,
    /// Unbiased within-chain variance of each inclusion indicator.
    pub sm2: Array1<f64>,
    pub mean_size: f64,
}

impl ChainTracker {
    pub fn new(n_params: usize) -> Self {
        Self {
            n: 0,
            p_accept: 0.0,
            inclusion: Array1::zeros(n_params),
            mean_size: 0.0,
            accept_queue: VecDeque::with_capacity(ACCEPT_WINDOW + 1),
        }
    }

    pub fn step(&mut self, state: &StateVector, accepted: bool) {
        self.n += 1;

        self.accept_queue.push_back(accepted);
        if self.accept_queue.len() > ACCEPT_WINDOW {
            self.accept_queue.pop_front();
        }
        self.p_accept = self.accept_queue.iter().filter(|&&a| a).count() as f64
            / self.accept_queue.len() as f64;

        let n = self.n as f64;
        let x = ArrayView1::from(state.as_slice()).mapv(f64::from);
        self.inclusion = (&self.inclusion * (n - 1.0) + &x) / n;
        self.mean_size = (self.mean_size * (n - 1.0) + state.count_ones() as f64) / n;
    }

    /// Acceptance probability over the recent window.
    pub fn p_accept(&self) -> f64 {
        self.p_accept
    }

    /// For 0/1 indicators the mean of squares equals the mean, so the sample
    /// variance is `m (1 - m) n / (n - 1)`. Zero until two steps are recorded.
    pub fn sm2(&self) -> Array1<f64> {
        if self.n < 2 {
            return Array1::zeros(self.inclusion.len());
        }
        let n = self.n as f64;
        self.inclusion.mapv(|m| m * (1.0 - m) * n / (n - 1.0))
    }

    pub fn stats(&self) -> ChainStats {
        ChainStats {
            n: self.n,
            p_accept: self.p_accept,
            inclusion: self.inclusion.clone(),
            sm2: self.sm2(),
            mean_size: self.mean_size,
        }
    }

    pub(crate) fn progress_message(&self) -> String {
        format!(
            "p(accept)≈{:.2} | mean size {:.2}",
            self.p_accept, self.mean_size
        )
    }
}

/// Gelman-Rubin potential scale reduction of each inclusion indicator across
/// independent chains.
///
/// Returns `None` for fewer than two chains. A component whose indicator never
/// varies within any chain has zero within-chain variance; it gets `1.0` if all
/// chains agree and `+inf` otherwise.
///
/// # Panics
///
/// Panics if the chains track different numbers of components.
pub fn inclusion_rhat(all_chain_stats: &[&ChainStats]) -> Option<Array1<f64>> {
    if all_chain_stats.len() < 2 {
        return None;
    }
    let means: Vec<ArrayView1<f64>> = all_chain_stats.iter().map(|x| x.inclusion.view()).collect();
    let means = ndarray::stack(Axis(0), &means).expect("Expected stacking means to succeed");
    let sm2s: Vec<ArrayView1<f64>> = all_chain_stats.iter().map(|x| x.sm2.view()).collect();
    let sm2s = ndarray::stack(Axis(0), &sm2s).expect("Expected stacking sm2 arrays to succeed");

    let w = sm2s
        .mean_axis(Axis(0))
        .expect("Expected computing within-chain variances to succeed");
    let global_means = means
        .mean_axis(Axis(0))
        .expect("Expected computing global means to succeed");
    let diffs = &means - &global_means.insert_axis(Axis(0));
    let b = diffs.pow2().sum_axis(Axis(0)) / (all_chain_stats.len() - 1) as f64;

    let n: f64 =
        all_chain_stats.iter().map(|x| x.n as f64).sum::<f64>() / all_chain_stats.len() as f64;
    let rhat = Zip::from(&b).and(&w).map_collect(|&b, &w| {
        if w > 0.0 {
            ((b + w * ((n - 1.0) / n)) / w).sqrt()
        } else if b > 0.0 {
            f64::INFINITY
        } else {
            1.0
        }
    });
    Some(rhat)
}

/// The chain as a `[n_iterations, d]` array.
pub fn to_array(chain: &[StateVector]) -> Array2<u8> {
    let d = chain.first().map_or(0, StateVector::len);
    let mut out = Array2::<u8>::zeros((chain.len(), d));
    for (mut row, state) in out.rows_mut().into_iter().zip(chain) {
        row.assign(&ArrayView1::from(state.as_slice()));
    }
    out
}

/// Per-move-kind proposal counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MoveCounts {
    pub proposed: usize,
    pub accepted: usize,
    /// Identity proposals (swap on the null or full model).
    pub degenerate: usize,
}

impl MoveCounts {
    pub fn acceptance_rate(&self) -> Option<f64> {
        (self.proposed > 0).then(|| self.accepted as f64 / self.proposed as f64)
    }
}

/**
Posterior summary of a finished run.

# Examples

```rust
use discrete_mcmc::sample;
use discrete_mcmc::state::StateVector;
use discrete_mcmc::stats::ChainSummary;

let flat = |_: &StateVector, _: &()| 0.0;
let (chain, trace) = sample(&[0, 0, 0], flat, (), 2_000, Some(3)).unwrap();
let summary = ChainSummary::from_chain(&chain, &trace).unwrap();
assert_eq!(summary.inclusion.len(), 3);
assert!(summary.acceptance_rate > 0.5 && summary.acceptance_rate < 1.0);
```
*/
#[derive(Debug, Clone, PartialEq)]
pub struct ChainSummary {
    pub n: usize,
    pub acceptance_rate: f64,
    /// Posterior inclusion probability of each component.
    pub inclusion: Array1<f64>,
    /// `size_histogram[k]` = iterations spent in models with `k` active components.
    pub size_histogram: Array1<usize>,
    /// Most frequent model size.
    pub modal_size: usize,
    /// Visited models with their visit frequency, most frequent first.
    pub models: Vec<(StateVector, f64)>,
    /// Empty when built from a bare chain.
    pub moves: BTreeMap<MoveKind, MoveCounts>,
}

impl ChainSummary {
    /// Summarises a chain and its acceptance trace. `None` for an empty chain.
    pub fn from_chain(
        chain: &[StateVector],
        trace: &AcceptanceTrace,
    ) -> Option<Self> {
        let first = chain.first()?;
        let n = chain.len();
        let d = first.len();

        let inclusion = to_array(chain).mapv(f64::from).mean_axis(Axis(0))?;

        let mut size_histogram = Array1::<usize>::zeros(d + 1);
        let mut visits: HashMap<&StateVector, usize> = HashMap::new();
        for state in chain {
            size_histogram[state.count_ones()] += 1;
            *visits.entry(state).or_insert(0) += 1;
        }
        let modal_size = size_histogram.argmax().ok()?;

        let mut models: Vec<(StateVector, f64)> = visits
            .into_iter()
            .map(|(s, c)| (s.clone(), c as f64 / n as f64))
            .collect();
        models.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

        Some(Self {
            n,
            acceptance_rate: trace.acceptance_rate().unwrap_or(0.0),
            inclusion,
            size_histogram,
            modal_size,
            models,
            moves: BTreeMap::new(),
        })
    }

    /// Summarises a run, including per-move-kind acceptance.
    pub fn from_run(run: &ChainRun) -> Option<Self> {
        let mut summary = Self::from_chain(&run.chain, &run.trace)?;
        for record in &run.records {
            let counts = summary.moves.entry(record.move_kind).or_default();
            counts.proposed += 1;
            counts.accepted += record.accepted() as usize;
            counts.degenerate += record.degenerate as usize;
        }
        Some(summary)
    }

    /// The most visited model.
    pub fn map_model(&self) -> &StateVector {
        &self.models[0].0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn state(bits: &[u8]) -> StateVector {
        StateVector::new(bits.to_vec()).unwrap()
    }

    #[test]
    fn test_tracker_window() {
        let mut tracker = ChainTracker::new(2);
        let s = state(&[1, 0]);
        for _ in 0..100 {
            tracker.step(&s, false);
        }
        assert_eq!(tracker.p_accept(), 0.0);
        for _ in 0..50 {
            tracker.step(&s, true);
        }
        assert_abs_diff_eq!(tracker.p_accept(), 0.5, epsilon = 1e-12);
        for _ in 0..100 {
            tracker.step(&s, true);
        }
        assert_eq!(tracker.p_accept(), 1.0);
    }

    #[test]
    fn test_tracker_means() {
        let mut tracker = ChainTracker::new(3);
        tracker.step(&state(&[1, 0, 0]), true);
        tracker.step(&state(&[1, 1, 0]), true);
        let stats = tracker.stats();
        assert_eq!(stats.n, 2);
        assert_abs_diff_eq!(stats.inclusion, array![1.0, 0.5, 0.0], epsilon = 1e-12);
        assert_abs_diff_eq!(stats.mean_size, 1.5, epsilon = 1e-12);
        // m = 0.5, n = 2: 0.25 * 2 / 1
        assert_abs_diff_eq!(stats.sm2, array![0.0, 0.5, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_rhat_agreeing_chains() {
        let mut a = ChainTracker::new(2);
        let mut b = ChainTracker::new(2);
        for bits in [[1, 0], [0, 0], [1, 0], [0, 0]] {
            a.step(&state(&bits), true);
            b.step(&state(&bits), true);
        }
        let rhat = inclusion_rhat(&[&a.stats(), &b.stats()]).unwrap();
        // identical chains: B = 0, so R = sqrt((n - 1) / n)
        assert_abs_diff_eq!(rhat[0], (0.75_f64).sqrt(), epsilon = 1e-12);
        assert_eq!(rhat[1], 1.0);
    }

    #[test]
    fn test_rhat_disagreeing_constant_chains() {
        let mut a = ChainTracker::new(1);
        let mut b = ChainTracker::new(1);
        for _ in 0..10 {
            a.step(&state(&[1]), false);
            b.step(&state(&[0]), false);
        }
        let rhat = inclusion_rhat(&[&a.stats(), &b.stats()]).unwrap();
        assert_eq!(rhat[0], f64::INFINITY);
    }

    #[test]
    fn test_rhat_needs_two_chains() {
        let mut a = ChainTracker::new(2);
        a.step(&state(&[1, 0]), true);
        a.step(&state(&[0, 0]), true);
        assert!(inclusion_rhat(&[]).is_none());
        assert!(inclusion_rhat(&[&a.stats()]).is_none());
    }

    #[test]
    fn test_sm2_before_two_steps_is_zero() {
        let mut tracker = ChainTracker::new(2);
        assert_eq!(tracker.sm2(), array![0.0, 0.0]);
        tracker.step(&state(&[1, 0]), true);
        assert_eq!(tracker.sm2(), array![0.0, 0.0]);
        tracker.step(&state(&[0, 0]), true);
        assert_abs_diff_eq!(tracker.sm2(), array![0.5, 0.0], epsilon = 1e-12);
    }

    #[test]
    fn test_to_array() {
        let chain = vec![state(&[1, 0]), state(&[0, 1]), state(&[1, 1])];
        assert_eq!(to_array(&chain), array![[1, 0], [0, 1], [1, 1]]);
        assert_eq!(to_array(&[]).shape(), &[0, 0]);
    }

    #[test]
    fn test_summary() {
        let chain = vec![
            state(&[0, 0, 1]),
            state(&[0, 1, 1]),
            state(&[0, 1, 1]),
            state(&[1, 1, 1]),
        ];
        let trace = AcceptanceTrace::from(vec![true, true, false, true]);
        let summary = ChainSummary::from_chain(&chain, &trace).unwrap();
        assert_eq!(summary.n, 4);
        assert_abs_diff_eq!(summary.acceptance_rate, 0.75, epsilon = 1e-12);
        assert_abs_diff_eq!(summary.inclusion, array![0.25, 0.75, 1.0], epsilon = 1e-12);
        assert_eq!(summary.size_histogram, array![0, 1, 2, 1]);
        assert_eq!(summary.modal_size, 2);
        assert_eq!(summary.map_model(), &state(&[0, 1, 1]));
        assert_eq!(summary.models.len(), 3);
        assert_abs_diff_eq!(summary.models[0].1, 0.5, epsilon = 1e-12);
        assert!(summary.moves.is_empty());
    }

    #[test]
    fn test_summary_of_empty_chain() {
        assert!(ChainSummary::from_chain(&[], &AcceptanceTrace::default()).is_none());
    }
}
