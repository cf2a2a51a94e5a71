/*!
# Binary State Vectors

A [`StateVector`] is a fixed-length vector over {0, 1} describing which of `d`
candidate components are active in a model. It is immutable: [`StateVector::flip`]
and [`StateVector::swap`] return new vectors and leave `self` untouched. Storage
is reference counted, so cloning a state into a chain history is cheap and
never aliases a mutable buffer.

# Examples

```rust
use discrete_mcmc::state::StateVector;

let state = StateVector::new(vec![0, 1, 1, 0]).unwrap();
assert_eq!(state.count_ones(), 2);

let grown = state.flip(0);
assert_eq!(grown.as_slice(), &[1, 1, 1, 0]);
assert_eq!(state.as_slice(), &[0, 1, 1, 0]);

let swapped = state.swap(1, 3);
assert_eq!(swapped.to_string(), "0011");
```
*/

use std::fmt;
use std::sync::Arc;

use num_traits::ToPrimitive;

use crate::error::{Result, SamplerError};

/// An immutable binary configuration of fixed length `d >= 1`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateVector {
    bits: Arc<[u8]>,
}

impl StateVector {
    /// Builds a state from raw bits, rejecting empty input and values other than 0 or 1.
    pub fn new(bits: Vec<u8>) -> Result<Self> {
        if bits.is_empty() {
            return Err(SamplerError::InvalidState {
                reason: "state vector must have at least one element".to_string(),
            });
        }
        if let Some((idx, value)) = bits.iter().enumerate().find(|(_, &b)| b > 1) {
            return Err(SamplerError::InvalidState {
                reason: format!("element {idx} is {value}, expected 0 or 1"),
            });
        }
        Ok(Self { bits: bits.into() })
    }

    /**
    Builds a state from any numeric slice.

    Every element must compare equal to exactly `0` or `1` once converted to `f64`,
    so `1.0_f32` is accepted while `2`, `-1` and `0.5` are rejected.

    # Examples

    ```rust
    use discrete_mcmc::state::StateVector;

    assert!(StateVector::from_values(&[0_i64, 1, 1]).is_ok());
    assert!(StateVector::from_values(&[1.0_f64, 0.0]).is_ok());
    assert!(StateVector::from_values(&[0, 2]).is_err());
    ```
    */
    pub fn from_values<T>(values: &[T]) -> Result<Self>
    where
        T: ToPrimitive + Copy,
    {
        let bits = values
            .iter()
            .enumerate()
            .map(|(idx, v)| match v.to_f64() {
                Some(x) if x == 0.0 => Ok(0),
                Some(x) if x == 1.0 => Ok(1),
                Some(x) => Err(SamplerError::InvalidState {
                    reason: format!("element {idx} is {x}, expected 0 or 1"),
                }),
                None => Err(SamplerError::InvalidState {
                    reason: format!("element {idx} is not representable as a number"),
                }),
            })
            .collect::<Result<Vec<u8>>>()?;
        Self::new(bits)
    }

    pub fn from_bools(values: &[bool]) -> Result<Self> {
        Self::new(values.iter().map(|&b| b as u8).collect())
    }

    /// The null model (no active component) of length `d`.
    pub fn zeros(d: usize) -> Result<Self> {
        Self::new(vec![0; d])
    }

    /// Number of positions, the `d` of the model space.
    pub fn len(&self) -> usize {
        self.bits.len()
    }

    /// Always `false` for a constructed state; provided for API symmetry with slices.
    pub fn is_empty(&self) -> bool {
        self.bits.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bits
    }

    /// The model dimension: how many components are active.
    pub fn count_ones(&self) -> usize {
        self.bits.iter().filter(|&&b| b == 1).count()
    }

    /// `true` for the null model.
    pub fn is_null(&self) -> bool {
        self.count_ones() == 0
    }

    /// `true` when every component is active.
    pub fn is_full(&self) -> bool {
        self.count_ones() == self.len()
    }

    /// Indices of the active positions, in increasing order.
    pub fn ones(&self) -> Vec<usize> {
        self.positions_equal_to(1)
    }

    /// Indices of the inactive positions, in increasing order.
    pub fn zero_positions(&self) -> Vec<usize> {
        self.positions_equal_to(0)
    }

    fn positions_equal_to(&self, value: u8) -> Vec<usize> {
        self.bits
            .iter()
            .enumerate()
            .filter(|(_, &b)| b == value)
            .map(|(i, _)| i)
            .collect()
    }

    /// Returns a new state with bit `index` toggled.
    ///
    /// # Panics
    ///
    /// Panics if `index >= self.len()`.
    pub fn flip(&self, index: usize) -> Self {
        let mut bits = self.bits.to_vec();
        bits[index] ^= 1;
        Self { bits: bits.into() }
    }

    /// Returns a new state with positions `i` and `j` exchanged.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    pub fn swap(&self, i: usize, j: usize) -> Self {
        let mut bits = self.bits.to_vec();
        bits.swap(i, j);
        Self { bits: bits.into() }
    }
}

impl fmt::Display for StateVector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for b in self.bits.iter() {
            write!(f, "{b}")?;
        }
        Ok(())
    }
}
