//! Retry delay growth and jitter

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How the retry delay grows across attempts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BackoffStrategy {
    /// Same delay before every retry
    Fixed,

    /// Grows linearly with the attempt number
    Linear,

    /// Multiplies by `base` after each attempt (e.g. 2.0 doubles)
    Exponential { base: f64 },
}

impl BackoffStrategy {
    /// Delay before the retry that follows attempt `attempt` (1-indexed),
    /// starting from `initial` and capped at `max`.
    ///
    /// Computed in the f64 domain with the cap folded in, so a runaway
    /// exponent can never overflow `Duration`.
    pub fn delay(&self, attempt: u32, initial: Duration, max: Duration) -> Duration {
        if attempt == 0 {
            return Duration::ZERO;
        }

        let initial_s = initial.as_secs_f64();
        let grown_s = match self {
            BackoffStrategy::Fixed => initial_s,
            BackoffStrategy::Linear => initial_s * f64::from(attempt),
            BackoffStrategy::Exponential { base } => {
                // Exponent clamped so base^n stays finite
                let exponent = attempt.saturating_sub(1).min(63) as i32;
                initial_s * base.max(1.0).powi(exponent)
            }
        };

        Duration::from_secs_f64(grown_s.min(max.as_secs_f64()))
    }
}

/// Spread a delay over `[delay/2, delay]` (equal jitter) so clients that
/// failed together do not retry together.
pub fn equal_jitter(delay: Duration) -> Duration {
    if delay.is_zero() {
        return delay;
    }

    let half = delay / 2;
    half + half.mul_f64(rand::thread_rng().gen::<f64>())
}

#[cfg(test)]
mod tests {
    use super::*;

    const INITIAL: Duration = Duration::from_millis(100);
    const CAP: Duration = Duration::from_secs(10);

    #[test]
    fn test_attempt_zero_has_no_delay() {
        assert_eq!(BackoffStrategy::Fixed.delay(0, INITIAL, CAP), Duration::ZERO);
    }

    #[test]
    fn test_fixed_stays_constant() {
        let strategy = BackoffStrategy::Fixed;
        assert_eq!(strategy.delay(1, INITIAL, CAP), INITIAL);
        assert_eq!(strategy.delay(10, INITIAL, CAP), INITIAL);
    }

    #[test]
    fn test_linear_growth() {
        let strategy = BackoffStrategy::Linear;
        assert_eq!(strategy.delay(1, INITIAL, CAP), Duration::from_millis(100));
        assert_eq!(strategy.delay(3, INITIAL, CAP), Duration::from_millis(300));
    }

    #[test]
    fn test_exponential_doubles() {
        let strategy = BackoffStrategy::Exponential { base: 2.0 };
        assert_eq!(strategy.delay(1, INITIAL, CAP), Duration::from_millis(100));
        assert_eq!(strategy.delay(2, INITIAL, CAP), Duration::from_millis(200));
        assert_eq!(strategy.delay(4, INITIAL, CAP), Duration::from_millis(800));
    }

    #[test]
    fn test_cap_applies() {
        let strategy = BackoffStrategy::Exponential { base: 2.0 };
        let cap = Duration::from_millis(500);
        assert_eq!(strategy.delay(4, INITIAL, cap), cap);
        // Huge attempt numbers stay finite and capped
        assert_eq!(strategy.delay(10_000, INITIAL, cap), cap);
    }

    #[test]
    fn test_sub_one_base_never_shrinks() {
        // A base below 1.0 is clamped; the delay never decays to zero
        let strategy = BackoffStrategy::Exponential { base: 0.5 };
        assert_eq!(strategy.delay(5, INITIAL, CAP), INITIAL);
    }

    #[test]
    fn test_equal_jitter_bounds() {
        let delay = Duration::from_millis(1000);
        for _ in 0..50 {
            let jittered = equal_jitter(delay);
            assert!(jittered >= Duration::from_millis(500));
            assert!(jittered <= delay);
        }
    }

    #[test]
    fn test_equal_jitter_of_zero_is_zero() {
        assert_eq!(equal_jitter(Duration::ZERO), Duration::ZERO);
    }
}
