//! Reporter scheduling (spec §4.4): the timer-based cadence arithmetic and
//! the block-based trigger predicate. Both strategies are pure functions of
//! (now, last-reported state) — no suspension points here; the only waiting
//! happens in the caller's `tokio::time::sleep`/block-subscription await.

use rust_decimal::Decimal;

/// The smallest `T >= now` with `T mod frequency_ms == offset_ms`, returned
/// as milliseconds until that instant — except a `T` exactly at `now` (the
/// "freshly aligned" case) schedules to the *next* slot instead of firing
/// immediately with a zero delay, and any candidate closer than
/// `minimum_ms` is skipped forward by one full period.
///
/// Spec §8 round-trip property: result is always in `[0, frequency_ms]`, and
/// aligned instants yield exactly `frequency_ms`, never `0`.
pub fn ms_to_next_action(now_ms: i64, frequency_ms: i64, offset_ms: i64, minimum_ms: i64) -> i64 {
    debug_assert!(frequency_ms > 0, "frequency must be positive");

    let remainder = ((now_ms - offset_ms) % frequency_ms + frequency_ms) % frequency_ms;
    let mut delay_ms = if remainder == 0 { 0 } else { frequency_ms - remainder };

    // A zero delay means `now` itself is an aligned slot; the next report is
    // the slot after this one, not an immediate re-fire.
    if delay_ms == 0 {
        delay_ms = frequency_ms;
    }

    if delay_ms < minimum_ms {
        delay_ms += frequency_ms;
    }

    delay_ms
}

/// The state the block-based trigger predicate needs about the last report
/// actually sent, independent of the circuit breaker.
#[derive(Debug, Clone, Copy)]
pub struct LastReport {
    pub value: Decimal,
    pub reported_at_ms: i64,
}

#[derive(Debug, Clone, Copy)]
pub struct BlockBasedParams {
    pub max_block_timestamp_age_ms: i64,
    pub target_max_heartbeat_period_ms: i64,
    pub min_report_price_change_threshold: Decimal,
}

/// spec §4.4 block-based strategy: fire at most one report per block, and
/// only if the block is fresh enough and either the heartbeat period has
/// elapsed or the price has moved past the minimum reportable change.
pub fn should_report_on_block(
    block_timestamp_ms: i64,
    now_ms: i64,
    new_price: Decimal,
    last_report: Option<LastReport>,
    params: &BlockBasedParams,
) -> bool {
    if now_ms - block_timestamp_ms > params.max_block_timestamp_age_ms {
        return false;
    }

    let Some(last) = last_report else {
        return true;
    };

    let heartbeat_elapsed = now_ms - last.reported_at_ms > params.target_max_heartbeat_period_ms;
    let price_moved_enough = if last.value.is_zero() {
        true
    } else {
        ((new_price - last.value) / last.value).abs() >= params.min_report_price_change_threshold
    };

    heartbeat_elapsed || price_moved_enough
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn literal_scenario_before_minimum_skip() {
        // spec §8.6: frequency=300_000, offset=2_000, now=1_940, minimum=50 -> 60
        assert_eq!(ms_to_next_action(1_940, 300_000, 2_000, 50), 60);
    }

    #[test]
    fn literal_scenario_skips_a_too_close_slot() {
        // now=1_951 -> the 2_000 slot is only 49ms away (< minimum 50) so it
        // skips to the following slot: 300_000 + 2_000 - 1_951 = 300_049.
        assert_eq!(ms_to_next_action(1_951, 300_000, 2_000, 50), 300_049);
    }

    #[test]
    fn result_is_always_in_0_to_frequency_inclusive() {
        for now in [0_i64, 1, 2_000, 2_001, 299_999, 300_000, 600_123] {
            let delay = ms_to_next_action(now, 300_000, 2_000, 0);
            assert!((0..=300_000).contains(&delay), "delay {delay} out of range for now={now}");
        }
    }

    #[test]
    fn aligned_instant_schedules_to_next_slot_not_zero() {
        // now mod freq == offset exactly.
        assert_eq!(ms_to_next_action(2_000, 300_000, 2_000, 0), 300_000);
        assert_eq!(ms_to_next_action(302_000, 300_000, 2_000, 0), 300_000);
    }

    fn params() -> BlockBasedParams {
        BlockBasedParams {
            max_block_timestamp_age_ms: 60_000,
            target_max_heartbeat_period_ms: 300_000,
            min_report_price_change_threshold: dec!(0.005),
        }
    }

    #[test]
    fn first_report_always_fires_on_a_fresh_block() {
        assert!(should_report_on_block(1_000, 1_000, dec!(1), None, &params()));
    }

    #[test]
    fn stale_block_never_triggers() {
        let last = LastReport { value: dec!(1), reported_at_ms: 0 };
        assert!(!should_report_on_block(0, 100_000, dec!(1.5), Some(last), &params()));
    }

    #[test]
    fn heartbeat_elapsed_triggers_even_with_unchanged_price() {
        let last = LastReport { value: dec!(1), reported_at_ms: 0 };
        assert!(should_report_on_block(400_000, 400_000, dec!(1), Some(last), &params()));
    }

    #[test]
    fn small_price_move_below_threshold_does_not_trigger() {
        let last = LastReport { value: dec!(1), reported_at_ms: 100_000 };
        assert!(!should_report_on_block(100_000, 100_000, dec!(1.001), Some(last), &params()));
    }

    #[test]
    fn price_move_past_threshold_triggers() {
        let last = LastReport { value: dec!(1), reported_at_ms: 100_000 };
        assert!(should_report_on_block(100_000, 100_000, dec!(1.01), Some(last), &params()));
    }
}
