//! The circuit breaker (spec §4.4, §3 `CircuitBreakerState`): three Δ-bands
//! gate every submission attempt on how far the new price has moved from the
//! last one actually reported on-chain.
//!
//! REDESIGN FLAGS §9 leaves re-arm ambiguous; this implementation treats the
//! automatic cooldown (`circuit_breaker_duration_ms`) as authoritative and
//! additionally exposes `rearm` as an earlier, explicit unlock an operator
//! can invoke — see DESIGN.md.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitBreakerState {
    Enabled,
    /// Price moved into the "extend cooldown" band; submissions are
    /// suppressed until `until_ms`, but the submission that triggered this
    /// band still goes out.
    Cooldown { until_ms: i64 },
    /// Price moved past the trip threshold; submissions are blocked until
    /// `circuit_breaker_duration_ms` has elapsed since `tripped_at_ms`, or
    /// until an explicit `rearm`.
    Tripped { tripped_at_ms: i64 },
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerParams {
    pub threshold_min: Decimal,
    pub threshold_max: Decimal,
    pub time_multiplier: Decimal,
    pub duration_ms: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuppressReason {
    Cooldown,
    Tripped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    /// Submit this tick's price. `extend_cooldown_until_ms` is `Some` when
    /// Δ landed in the middle band and future submissions must wait.
    Submit { extend_cooldown_until_ms: Option<i64> },
    Suppressed(SuppressReason),
    /// Δ crossed the trip threshold: this tick is *not* submitted either.
    Trip,
}

/// Evaluates one candidate submission against the breaker's current state
/// (spec §4.4). `last_reported` is the last price actually sent on-chain;
/// `new_price` is this tick's candidate.
pub fn evaluate(
    state: CircuitBreakerState,
    last_reported: Decimal,
    new_price: Decimal,
    now_ms: i64,
    params: &CircuitBreakerParams,
) -> (Decision, CircuitBreakerState) {
    match state {
        CircuitBreakerState::Tripped { tripped_at_ms } if now_ms - tripped_at_ms < params.duration_ms => {
            return (Decision::Suppressed(SuppressReason::Tripped), state);
        }
        CircuitBreakerState::Cooldown { until_ms } if now_ms < until_ms => {
            return (Decision::Suppressed(SuppressReason::Cooldown), state);
        }
        _ => {}
    }

    let delta = if last_reported.is_zero() {
        Decimal::ZERO
    } else {
        ((new_price - last_reported) / last_reported).abs()
    };

    if delta >= params.threshold_max {
        warn!(%delta, threshold_max = %params.threshold_max, "circuit breaker tripped");
        return (Decision::Trip, CircuitBreakerState::Tripped { tripped_at_ms: now_ms });
    }

    if delta >= params.threshold_min {
        let cooldown_ms = (delta * params.time_multiplier * Decimal::from(1000))
            .round()
            .to_i64()
            .unwrap_or(0)
            .max(0);
        let until_ms = now_ms + cooldown_ms;
        return (
            Decision::Submit { extend_cooldown_until_ms: Some(until_ms) },
            CircuitBreakerState::Cooldown { until_ms },
        );
    }

    (Decision::Submit { extend_cooldown_until_ms: None }, CircuitBreakerState::Enabled)
}

/// An operator-triggered unlock: returns to `Enabled` regardless of any
/// active cooldown or trip. The automatic cooldown timer remains the
/// authoritative path to recovery; this is strictly an earlier escape hatch.
pub fn rearm() -> CircuitBreakerState {
    CircuitBreakerState::Enabled
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn params() -> CircuitBreakerParams {
        CircuitBreakerParams {
            threshold_min: dec!(0.1),
            threshold_max: dec!(0.25),
            time_multiplier: dec!(600),
            duration_ms: 3_600_000,
        }
    }

    #[test]
    fn small_move_proceeds_without_cooldown() {
        let (decision, state) =
            evaluate(CircuitBreakerState::Enabled, dec!(1.00), dec!(1.02), 0, &params());
        assert_eq!(decision, Decision::Submit { extend_cooldown_until_ms: None });
        assert_eq!(state, CircuitBreakerState::Enabled);
    }

    #[test]
    fn mid_band_move_submits_and_extends_cooldown() {
        let (decision, state) =
            evaluate(CircuitBreakerState::Enabled, dec!(1.00), dec!(1.15), 0, &params());
        match decision {
            Decision::Submit { extend_cooldown_until_ms: Some(until) } => assert!(until > 0),
            other => panic!("expected Submit with cooldown, got {other:?}"),
        }
        assert!(matches!(state, CircuitBreakerState::Cooldown { .. }));
    }

    #[test]
    fn literal_trip_scenario() {
        // spec §8.5: lastReported=1.00, newPrice=1.30, thresholdMax=0.25 -> Tripped.
        let (decision, state) =
            evaluate(CircuitBreakerState::Enabled, dec!(1.00), dec!(1.30), 1_000, &params());
        assert_eq!(decision, Decision::Trip);
        assert_eq!(state, CircuitBreakerState::Tripped { tripped_at_ms: 1_000 });
    }

    #[test]
    fn next_report_is_suppressed_while_tripped() {
        let tripped = CircuitBreakerState::Tripped { tripped_at_ms: 1_000 };
        let (decision, state) = evaluate(tripped, dec!(1.30), dec!(1.31), 1_500, &params());
        assert_eq!(decision, Decision::Suppressed(SuppressReason::Tripped));
        assert_eq!(state, tripped);
    }

    #[test]
    fn trip_recovers_automatically_once_duration_elapses() {
        let tripped = CircuitBreakerState::Tripped { tripped_at_ms: 0 };
        let (decision, _) = evaluate(tripped, dec!(1.30), dec!(1.31), 3_600_001, &params());
        assert_ne!(decision, Decision::Suppressed(SuppressReason::Tripped));
    }

    #[test]
    fn cooldown_suppresses_until_it_elapses() {
        let cooling = CircuitBreakerState::Cooldown { until_ms: 10_000 };
        let (decision, state) = evaluate(cooling, dec!(1.00), dec!(1.01), 5_000, &params());
        assert_eq!(decision, Decision::Suppressed(SuppressReason::Cooldown));
        assert_eq!(state, cooling);

        let (decision, _) = evaluate(cooling, dec!(1.00), dec!(1.01), 10_000, &params());
        assert_eq!(decision, Decision::Submit { extend_cooldown_until_ms: None });
    }

    #[test]
    fn rearm_always_returns_to_enabled() {
        assert_eq!(rearm(), CircuitBreakerState::Enabled);
    }
}
