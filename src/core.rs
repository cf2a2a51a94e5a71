//! Chain-driving machinery shared by every sampler in the crate.
//!
//! A [`MarkovChain`] advances one step at a time; [`run_chain`] and its variants
//! drive it for a fixed number of iterations, recording the state after every
//! step together with the acceptance trace. [`ChainRunner`] runs a collection of
//! independent chains in parallel with `rayon`.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use indicatif::{MultiProgress, ProgressBar, ProgressStyle};
use rayon::prelude::*;

use crate::acceptance::Decision;
use crate::error::{Result, SamplerError};
use crate::proposal::MoveKind;
use crate::state::StateVector;
use crate::stats::ChainTracker;

const UPDATE_INTERVAL: Duration = Duration::from_millis(500);

/// Diagnostic record of a single iteration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepRecord {
    pub move_kind: MoveKind,
    /// The proposal was the identity (swap on the null or full model).
    pub degenerate: bool,
    pub log_current: f64,
    pub log_candidate: f64,
    pub decision: Decision,
}

impl StepRecord {
    /// Whether the chain took the proposed move. An identity proposal never
    /// counts, whatever its decision said.
    pub fn accepted(&self) -> bool {
        self.decision.accepted && !self.degenerate
    }
}

/// One boolean per iteration: was the proposal accepted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AcceptanceTrace(Vec<bool>);

impl AcceptanceTrace {
    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    pub fn push(&mut self, accepted: bool) {
        self.0.push(accepted);
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[bool] {
        &self.0
    }

    pub fn iter(&self) -> std::slice::Iter<'_, bool> {
        self.0.iter()
    }

    pub fn accepted_count(&self) -> usize {
        self.0.iter().filter(|&&a| a).count()
    }

    /// Fraction of accepted proposals, `None` for an empty trace.
    pub fn acceptance_rate(&self) -> Option<f64> {
        (!self.0.is_empty()).then(|| self.accepted_count() as f64 / self.0.len() as f64)
    }

    fn drain_front(&mut self, n: usize) {
        self.0.drain(..n);
    }
}

impl From<Vec<bool>> for AcceptanceTrace {
    fn from(v: Vec<bool>) -> Self {
        Self(v)
    }
}

impl FromIterator<bool> for AcceptanceTrace {
    fn from_iter<I: IntoIterator<Item = bool>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a AcceptanceTrace {
    type Item = &'a bool;
    type IntoIter = std::slice::Iter<'a, bool>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Output of driving a chain: one state, one verdict and one record per iteration.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainRun {
    pub chain: Vec<StateVector>,
    pub trace: AcceptanceTrace,
    pub records: Vec<StepRecord>,
    /// The run stopped early on an external request.
    pub interrupted: bool,
}

impl ChainRun {
    fn with_capacity(n: usize) -> Self {
        Self {
            chain: Vec::with_capacity(n),
            trace: AcceptanceTrace::with_capacity(n),
            records: Vec::with_capacity(n),
            interrupted: false,
        }
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    /// Drops the first `n` iterations (burn-in), or all of them if `n` is larger.
    pub fn discard(mut self, n: usize) -> Self {
        let n = n.min(self.chain.len());
        self.chain.drain(..n);
        self.trace.drain_front(n);
        self.records.drain(..n);
        self
    }
}

pub trait MarkovChain {
    /// Does one iteration of the chain, replacing the current state iff the
    /// proposal is accepted.
    fn step(&mut self) -> Result<StepRecord>;

    fn current_state(&self) -> &StateVector;
}

/// Runs `chain` for `n_steps` iterations.
pub fn run_chain<M: MarkovChain>(chain: &mut M, n_steps: usize) -> Result<ChainRun> {
    drive(chain, n_steps, None, None)
}

/// Like [`run_chain`], updating `pb` after every step. The bar message shows the
/// acceptance probability over the last 100 iterations.
pub fn run_chain_with_progress<M: MarkovChain>(
    chain: &mut M,
    n_steps: usize,
    pb: &ProgressBar,
) -> Result<ChainRun> {
    drive(chain, n_steps, None, Some(pb))
}

/// Like [`run_chain`], but checks `stop` before every iteration and returns the
/// iterations recorded so far once it is set.
pub fn run_chain_until<M: MarkovChain>(
    chain: &mut M,
    n_steps: usize,
    stop: &AtomicBool,
) -> Result<ChainRun> {
    drive(chain, n_steps, Some(stop), None)
}

fn drive<M: MarkovChain>(
    chain: &mut M,
    n_steps: usize,
    stop: Option<&AtomicBool>,
    pb: Option<&ProgressBar>,
) -> Result<ChainRun> {
    if n_steps == 0 {
        return Err(SamplerError::InvalidIterationCount);
    }
    let mut out = ChainRun::with_capacity(n_steps);
    let mut tracker = pb.map(|_| ChainTracker::new(chain.current_state().len()));
    let mut last_update = Instant::now();

    if let Some(pb) = pb {
        pb.set_length(n_steps as u64);
    }

    for _ in 0..n_steps {
        if stop.is_some_and(|s| s.load(Ordering::Relaxed)) {
            out.interrupted = true;
            break;
        }

        let record = chain.step()?;
        let state = chain.current_state().clone();

        if let (Some(pb), Some(tracker)) = (pb, tracker.as_mut()) {
            tracker.step(&state, record.accepted());
            pb.inc(1);
            if last_update.elapsed() >= UPDATE_INTERVAL {
                pb.set_message(tracker.progress_message());
                last_update = Instant::now();
            }
        }

        out.chain.push(state);
        out.trace.push(record.accepted());
        out.records.push(record);
    }

    Ok(out)
}

pub(crate) fn progress_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{prefix:8} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} | {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-")
}

/// A trait for "anything that owns multiple MarkovChains".
pub trait HasChains {
    type Chain: MarkovChain + Send;

    fn chains_mut(&mut self) -> &mut Vec<Self::Chain>;
}

pub trait ChainRunner: HasChains {
    /// Runs the chains in parallel, discarding burn-in.
    ///
    /// Chains share nothing; the first failing chain's error is returned.
    fn run(&mut self, n_steps: usize, discard: usize) -> Result<Vec<ChainRun>> {
        let runs: Vec<ChainRun> = self
            .chains_mut()
            .par_iter_mut()
            .map(|chain| run_chain(chain, n_steps))
            .collect::<Result<_>>()?;

        Ok(runs.into_iter().map(|run| run.discard(discard)).collect())
    }

    fn run_with_progress(&mut self, n_steps: usize, discard: usize) -> Result<Vec<ChainRun>> {
        let multi = MultiProgress::new();
        let style = progress_style();

        let runs: Vec<ChainRun> = self
            .chains_mut()
            .par_iter_mut()
            .enumerate()
            .map(|(i, chain)| {
                let pb = multi.add(ProgressBar::new(n_steps as u64));
                pb.set_prefix(format!("Chain {i}"));
                pb.set_style(style.clone());

                let run = run_chain_with_progress(chain, n_steps, &pb);
                pb.finish_with_message("Done!");
                run
            })
            .collect::<Result<_>>()?;

        Ok(runs.into_iter().map(|run| run.discard(discard)).collect())
    }
}

impl<T: HasChains> ChainRunner for T {}
