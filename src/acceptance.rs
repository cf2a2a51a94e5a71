//! Bayes factor and Metropolis accept/reject decision.
//!
//! The acceptance ratio is the plain posterior ratio `B = p(candidate) / p(current)`.
//! This is a known simplification of reversible-jump MCMC: no proposal-ratio or
//! Jacobian term enters it, so both move kinds are treated as symmetric proposals.

use rand::Rng;

/// Full record of one accept/reject decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    /// `log B`; `0` when both scores are equal (including both `-inf`).
    pub log_bayes_factor: f64,
    /// `exp(log B)`, saturating to `+inf` or `0`.
    pub bayes_factor: f64,
    /// `min(1, B)`.
    pub acceptance_prob: f64,
    /// The uniform draw compared against `B`.
    pub u: f64,
    pub accepted: bool,
}

/// `log(B) = log_candidate - log_current`, never NaN for valid scores.
///
/// Valid scores are finite or `-inf`. Two equal scores give exactly `0`, which
/// covers two impossible states (`-inf - -inf` would otherwise be NaN).
pub fn log_bayes_factor(log_current: f64, log_candidate: f64) -> f64 {
    if log_candidate == log_current {
        0.0
    } else {
        log_candidate - log_current
    }
}

/// The Bayes factor `exp(log_candidate - log_current)`.
///
/// Large positive differences saturate to `f64::INFINITY`, large negative ones to `0.0`.
///
/// ```rust
/// use discrete_mcmc::acceptance::bayes_factor;
///
/// assert_eq!(bayes_factor(0.0, 0.0), 1.0);
/// assert_eq!(bayes_factor(0.0, 1e6), f64::INFINITY);
/// assert_eq!(bayes_factor(0.0, f64::NEG_INFINITY), 0.0);
/// assert_eq!(bayes_factor(f64::NEG_INFINITY, f64::NEG_INFINITY), 1.0);
/// ```
pub fn bayes_factor(log_current: f64, log_candidate: f64) -> f64 {
    log_bayes_factor(log_current, log_candidate).exp()
}

/// Draws `u ~ U[0, 1)` and accepts iff `u < B`.
///
/// The draw is taken on every call, even when the outcome is already certain,
/// so the random stream does not depend on the scores.
pub fn decide<R: Rng + ?Sized>(log_current: f64, log_candidate: f64, rng: &mut R) -> Decision {
    let log_bf = log_bayes_factor(log_current, log_candidate);
    let bf = log_bf.exp();
    let u: f64 = rng.gen();
    Decision {
        log_bayes_factor: log_bf,
        bayes_factor: bf,
        acceptance_prob: bf.min(1.0),
        u,
        accepted: u < bf,
    }
}

/// Shorthand for [`decide`] returning only the verdict.
pub fn accept<R: Rng + ?Sized>(log_current: f64, log_candidate: f64, rng: &mut R) -> bool {
    decide(log_current, log_candidate, rng).accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::mock::StepRng;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    /// An rng whose `gen::<f64>()` lands just below 1.
    fn almost_one() -> StepRng {
        StepRng::new(u64::MAX, 0)
    }

    #[test]
    fn test_equal_scores_always_accept() {
        let mut rng = almost_one();
        let d = decide(-3.25, -3.25, &mut rng);
        assert_eq!(d.bayes_factor, 1.0);
        assert_eq!(d.acceptance_prob, 1.0);
        assert!(d.u < 1.0 && d.u > 0.99);
        assert!(d.accepted);
    }

    #[test]
    fn test_better_candidate_always_accepts() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..1_000 {
            assert!(accept(-10.0, -9.5, &mut rng));
        }
        assert!(accept(-10.0, -9.5, &mut almost_one()));
    }

    #[test]
    fn test_impossible_candidate_never_accepts() {
        let mut zero = StepRng::new(0, 0);
        let d = decide(0.0, f64::NEG_INFINITY, &mut zero);
        assert_eq!(d.u, 0.0);
        assert_eq!(d.bayes_factor, 0.0);
        assert!(!d.accepted);
    }

    #[test]
    fn test_escape_from_impossible_state() {
        let mut rng = almost_one();
        let d = decide(f64::NEG_INFINITY, -1e300, &mut rng);
        assert_eq!(d.bayes_factor, f64::INFINITY);
        assert!(d.accepted);
    }

    #[test]
    fn test_both_impossible_is_not_nan() {
        let d = decide(f64::NEG_INFINITY, f64::NEG_INFINITY, &mut almost_one());
        assert_eq!(d.log_bayes_factor, 0.0);
        assert!(d.accepted);
    }

    #[test]
    fn test_saturation() {
        assert_eq!(bayes_factor(-1e308, 1e308), f64::INFINITY);
        assert_eq!(bayes_factor(1e308, -1e308), 0.0);
        assert_relative_eq!(bayes_factor(0.0, 2.0_f64.ln()), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_acceptance_frequency_matches_bayes_factor() {
        let mut rng = SmallRng::seed_from_u64(42);
        let n = 100_000;
        let log_b = 0.25_f64.ln();
        let accepted = (0..n).filter(|_| accept(0.0, log_b, &mut rng)).count();
        let rate = accepted as f64 / n as f64;
        assert!((rate - 0.25).abs() < 0.01, "acceptance rate {rate}");
    }
}
