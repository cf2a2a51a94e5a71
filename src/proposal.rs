/*!
# Birth-Death and Swap Proposals

[`ProposalGenerator`] produces the candidate state of a reversible-jump step. Each
call draws `u ~ U[0, 1)`:

- `u < threshold`: a **birth-death** move flips one uniformly chosen position,
  changing the model dimension by exactly one.
- otherwise a **swap** move exchanges one uniformly chosen active position with
  one uniformly chosen inactive position, keeping the dimension.

A swap on the null or the full model has nothing to exchange. That case is
reported as [`Proposal::DegenerateIdentity`] rather than an error so the sampler
can treat both move kinds uniformly.

# Examples

```rust
use discrete_mcmc::proposal::{MoveKind, ProposalGenerator};
use discrete_mcmc::state::StateVector;
use rand::rngs::SmallRng;
use rand::SeedableRng;

let generator = ProposalGenerator::default();
let mut rng = SmallRng::seed_from_u64(7);
let current = StateVector::new(vec![0, 1, 0, 1]).unwrap();

let proposal = generator.propose(&current, &mut rng);
let candidate = proposal.candidate(&current);
match proposal.kind() {
    MoveKind::BirthDeath => assert_eq!(candidate.count_ones().abs_diff(2), 1),
    MoveKind::Swap => assert_eq!(candidate.count_ones(), 2),
}
```
*/

use std::fmt;

use rand::Rng;

use crate::error::{Result, SamplerError};
use crate::state::StateVector;

/// Probability of choosing a birth-death move over a swap move.
pub const DEFAULT_BIRTH_DEATH_THRESHOLD: f64 = 0.5;

/// Kind of move attempted by the proposal generator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MoveKind {
    /// Flip one bit: a birth (0 -> 1) or a death (1 -> 0).
    BirthDeath,
    /// Exchange one active and one inactive position.
    Swap,
}

impl MoveKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MoveKind::BirthDeath => "birth-death",
            MoveKind::Swap => "swap",
        }
    }
}

impl fmt::Display for MoveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of a single proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Proposal {
    /// A genuine candidate that differs from the current state.
    Proposed {
        kind: MoveKind,
        candidate: StateVector,
    },
    /// No move was possible; the candidate is the current state itself.
    DegenerateIdentity { kind: MoveKind },
}

impl Proposal {
    pub fn kind(&self) -> MoveKind {
        match self {
            Proposal::Proposed { kind, .. } | Proposal::DegenerateIdentity { kind } => *kind,
        }
    }

    pub fn is_degenerate(&self) -> bool {
        matches!(self, Proposal::DegenerateIdentity { .. })
    }

    /// The candidate state, resolving the identity proposal to `current`.
    pub fn candidate<'a>(&'a self, current: &'a StateVector) -> &'a StateVector {
        match self {
            Proposal::Proposed { candidate, .. } => candidate,
            Proposal::DegenerateIdentity { .. } => current,
        }
    }

    /// Consumes the proposal, returning an owned candidate.
    pub fn into_candidate(self, current: &StateVector) -> StateVector {
        match self {
            Proposal::Proposed { candidate, .. } => candidate,
            Proposal::DegenerateIdentity { .. } => current.clone(),
        }
    }
}

/// Generates birth-death and swap moves over a [`StateVector`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProposalGenerator {
    birth_death_threshold: f64,
}

impl Default for ProposalGenerator {
    fn default() -> Self {
        Self {
            birth_death_threshold: DEFAULT_BIRTH_DEATH_THRESHOLD,
        }
    }
}

impl ProposalGenerator {
    /// Creates a generator choosing a birth-death move whenever `u < threshold`.
    ///
    /// Fails with [`SamplerError::InvalidConfig`] unless `threshold` lies in `[0, 1]`.
    pub fn new(threshold: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&threshold) {
            return Err(SamplerError::InvalidConfig {
                reason: format!("birth-death threshold {threshold} is outside [0, 1]"),
            });
        }
        Ok(Self {
            birth_death_threshold: threshold,
        })
    }

    /// Draws the move kind and then the move itself.
    pub fn propose<R: Rng + ?Sized>(&self, current: &StateVector, rng: &mut R) -> Proposal {
        let u: f64 = rng.gen();
        if u < self.birth_death_threshold {
            self.birth_death(current, rng)
        } else {
            self.swap(current, rng)
        }
    }

    /// Flips a uniformly chosen position. Whether this is a birth or a death
    /// depends only on the current value at that position.
    pub fn birth_death<R: Rng + ?Sized>(&self, current: &StateVector, rng: &mut R) -> Proposal {
        let i = rng.gen_range(0..current.len());
        Proposal::Proposed {
            kind: MoveKind::BirthDeath,
            candidate: current.flip(i),
        }
    }

    /// Exchanges a uniformly chosen active position with a uniformly chosen
    /// inactive one. The null and full models have no valid swap and yield
    /// [`Proposal::DegenerateIdentity`] without consuming randomness.
    pub fn swap<R: Rng + ?Sized>(&self, current: &StateVector, rng: &mut R) -> Proposal {
        let ones = current.ones();
        let zeros = current.zero_positions();
        if ones.is_empty() || zeros.is_empty() {
            return Proposal::DegenerateIdentity {
                kind: MoveKind::Swap,
            };
        }
        let i = ones[rng.gen_range(0..ones.len())];
        let j = zeros[rng.gen_range(0..zeros.len())];
        Proposal::Proposed {
            kind: MoveKind::Swap,
            candidate: current.swap(i, j),
        }
    }
}
