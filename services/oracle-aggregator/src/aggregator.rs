//! The Data Aggregator (spec §4.3): combines each price source's most
//! recent observation into a single `AggregatedPrice`, or fails cleanly.
//!
//! Both documented methods share one pipeline — mid/bid-ask-spread filter,
//! weighted-mean deviation filter, single-source-dominance cap, minimum
//! thresholds — and differ only in which scalar they weight-average over:
//! MIDPRICES uses the mid-price, TRADES uses the last trade price.

use oracle_config::AggregationMethod;
use oracle_types::{AggregatedPrice, Exchange, Observation};
use rust_decimal::Decimal;

use crate::error::{AggregatorError, Result};

/// The tunables the aggregation algorithm needs, lifted out of
/// `OracleConfig` so this crate doesn't depend on every unrelated config
/// field.
#[derive(Debug, Clone, Copy)]
pub struct AggregationParams {
    pub max_percentage_bid_ask_spread: Decimal,
    pub max_percentage_deviation: Decimal,
    pub max_source_weight_share: Decimal,
    pub min_price_source_count: usize,
    pub min_aggregated_volume: Decimal,
    pub max_no_trade_duration_ms: i64,
}

/// One price source's identity plus its most recent observation, as fed
/// into aggregation. `exchange` is the source's representative venue for
/// metric labelling — the first leg's exchange for multi-leg sources.
#[derive(Debug, Clone, Copy)]
pub struct SourceSnapshot {
    pub exchange: Exchange,
    pub observation: Observation,
}

/// Combines `snapshots` (already filtered to one fresh-enough observation
/// per source) into an `AggregatedPrice` using `method`.
pub fn aggregate(
    snapshots: &[SourceSnapshot],
    method: AggregationMethod,
    params: &AggregationParams,
    now_ms: i64,
) -> Result<AggregatedPrice> {
    let fresh: Vec<&SourceSnapshot> = snapshots
        .iter()
        .filter(|s| now_ms - s.observation.timestamp_ms <= params.max_no_trade_duration_ms)
        .collect();

    // Step 2: mid-price (or trade-price) and bid-ask-spread filter.
    let mut survivors: Vec<(Exchange, Decimal, Decimal)> = fresh
        .iter()
        .filter_map(|s| {
            let obs = &s.observation;
            let price = match method {
                AggregationMethod::MidPrices => obs.mid,
                AggregationMethod::Trades => obs.last_price,
            };
            if obs.mid.is_zero() {
                return None;
            }
            let spread_pct = (obs.ask - obs.bid) / obs.mid;
            if spread_pct > params.max_percentage_bid_ask_spread {
                return None;
            }
            Some((s.exchange, price, obs.volume))
        })
        .collect();

    if survivors.is_empty() {
        return Err(AggregatorError::InsufficientSources {
            required: params.min_price_source_count,
            found: survivors.len(),
        });
    }

    // Step 3: one deviation-filter pass, each source judged against the
    // volume-weighted mean of the *other* survivors. Judging against the
    // mean of all survivors (including the candidate itself) lets a large
    // enough outlier drag its own reference toward it and dodge rejection;
    // leave-one-out keeps the reference uncontaminated by the point under
    // test.
    let before_deviation_filter = survivors.clone();
    survivors = before_deviation_filter
        .iter()
        .enumerate()
        .filter(|(i, (_, price, _))| {
            let others: Vec<(Exchange, Decimal, Decimal)> = before_deviation_filter
                .iter()
                .enumerate()
                .filter(|(j, _)| j != i)
                .map(|(_, entry)| *entry)
                .collect();
            if others.is_empty() {
                return true;
            }
            let reference = weighted_mean(&others);
            if reference.is_zero() {
                return true;
            }
            let deviation = ((*price - reference) / reference).abs();
            deviation <= params.max_percentage_deviation
        })
        .map(|(_, entry)| *entry)
        .collect();

    if survivors.is_empty() {
        return Err(AggregatorError::InsufficientSources {
            required: params.min_price_source_count,
            found: survivors.len(),
        });
    }

    // Step 4: single-source-dominance cap.
    let weights = cap_dominant_weight(&survivors, params.max_source_weight_share);

    let total_weight: Decimal = weights.iter().map(|(_, w)| *w).sum();
    let final_value = if total_weight.is_zero() {
        weighted_mean(&survivors)
    } else {
        survivors
            .iter()
            .zip(weights.iter())
            .map(|((_, price, _), (_, weight))| *price * *weight)
            .sum::<Decimal>()
            / total_weight
    };

    if survivors.len() < params.min_price_source_count {
        return Err(AggregatorError::InsufficientSources {
            required: params.min_price_source_count,
            found: survivors.len(),
        });
    }
    if total_weight < params.min_aggregated_volume {
        return Err(AggregatorError::InsufficientVolume {
            required: params.min_aggregated_volume,
            actual: total_weight,
        });
    }

    Ok(AggregatedPrice {
        value: final_value,
        timestamp_ms: now_ms,
        contributing_source_count: survivors.len(),
        per_source_weights: survivors
            .iter()
            .zip(weights.iter())
            .map(|((exchange, _, _), (_, weight))| (*exchange, *weight))
            .collect(),
    })
}

/// Volume-weighted mean over `(exchange, price, weight)` triples. Ties in
/// weight are broken implicitly by the stable, config-declared iteration
/// order (spec §4.3 edge cases).
fn weighted_mean(entries: &[(Exchange, Decimal, Decimal)]) -> Decimal {
    let total_weight: Decimal = entries.iter().map(|(_, _, w)| *w).sum();
    if total_weight.is_zero() {
        return entries
            .iter()
            .map(|(_, price, _)| *price)
            .sum::<Decimal>()
            / Decimal::from(entries.len().max(1) as u64);
    }
    entries.iter().map(|(_, price, w)| *price * *w).sum::<Decimal>() / total_weight
}

/// Clips any source's weight share above `max_share` down to the cap and
/// redistributes the clipped excess across the remaining sources
/// proportionally to their existing weight, so the total weight (and hence
/// the aggregated volume check) is unaffected by the cap.
fn cap_dominant_weight(
    entries: &[(Exchange, Decimal, Decimal)],
    max_share: Decimal,
) -> Vec<(Exchange, Decimal)> {
    let total: Decimal = entries.iter().map(|(_, _, w)| *w).sum();
    if total.is_zero() {
        return entries.iter().map(|(ex, _, w)| (*ex, *w)).collect();
    }
    let cap = max_share * total;

    let capped_excess: Decimal = entries
        .iter()
        .map(|(_, _, w)| (*w - cap).max(Decimal::ZERO))
        .sum();
    let uncapped_total: Decimal = entries
        .iter()
        .filter(|(_, _, w)| *w <= cap)
        .map(|(_, _, w)| *w)
        .sum();
    let scale = if uncapped_total.is_zero() || capped_excess.is_zero() {
        Decimal::ONE
    } else {
        (uncapped_total + capped_excess) / uncapped_total
    };

    entries
        .iter()
        .map(|(exchange, _, w)| {
            let clipped = if *w > cap { cap } else { *w * scale };
            (*exchange, clipped)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn obs(mid: Decimal, volume: Decimal) -> Observation {
        Observation {
            timestamp_ms: 0,
            mid,
            bid: mid,
            ask: mid,
            last_price: mid,
            volume,
        }
    }

    fn snapshot(exchange: Exchange, mid: Decimal, volume: Decimal) -> SourceSnapshot {
        SourceSnapshot {
            exchange,
            observation: obs(mid, volume),
        }
    }

    fn params() -> AggregationParams {
        AggregationParams {
            max_percentage_bid_ask_spread: dec!(0.1),
            max_percentage_deviation: dec!(0.2),
            max_source_weight_share: dec!(1),
            min_price_source_count: 1,
            min_aggregated_volume: dec!(0),
            max_no_trade_duration_ms: 600_000,
        }
    }

    #[test]
    fn deviation_filter_rejects_outlier_and_survives_on_100_5() {
        // Literal scenario (spec §8.4): mids {100, 101, 130}, equal volumes,
        // maxPercentageDeviation = 0.2 -> survivors {100, 101}, aggregate 100.5.
        let snapshots = vec![
            snapshot(Exchange::Kraken, dec!(100), dec!(10)),
            snapshot(Exchange::Coinbase, dec!(101), dec!(10)),
            snapshot(Exchange::Binance, dec!(130), dec!(10)),
        ];
        let result = aggregate(&snapshots, AggregationMethod::MidPrices, &params(), 0).unwrap();
        assert_eq!(result.value, dec!(100.5));
        assert_eq!(result.contributing_source_count, 2);
    }

    #[test]
    fn insufficient_sources_when_all_are_stale() {
        let params = AggregationParams {
            max_no_trade_duration_ms: 1_000,
            ..params()
        };
        let snapshots = vec![SourceSnapshot {
            exchange: Exchange::Kraken,
            observation: Observation {
                timestamp_ms: 0,
                ..obs(dec!(100), dec!(10))
            },
        }];
        let err = aggregate(&snapshots, AggregationMethod::MidPrices, &params, 5_000).unwrap_err();
        assert!(matches!(err, AggregatorError::InsufficientSources { .. }));
    }

    #[test]
    fn insufficient_volume_below_minimum() {
        let params = AggregationParams {
            min_aggregated_volume: dec!(1000),
            ..params()
        };
        let snapshots = vec![snapshot(Exchange::Kraken, dec!(100), dec!(5))];
        let err = aggregate(&snapshots, AggregationMethod::MidPrices, &params, 0).unwrap_err();
        assert!(matches!(err, AggregatorError::InsufficientVolume { .. }));
    }

    #[test]
    fn bid_ask_spread_filter_excludes_wide_spreads() {
        let snapshots = vec![
            SourceSnapshot {
                exchange: Exchange::Kraken,
                observation: Observation {
                    timestamp_ms: 0,
                    mid: dec!(100),
                    bid: dec!(80),
                    ask: dec!(120),
                    last_price: dec!(100),
                    volume: dec!(10),
                },
            },
            snapshot(Exchange::Coinbase, dec!(101), dec!(10)),
        ];
        let result = aggregate(&snapshots, AggregationMethod::MidPrices, &params(), 0).unwrap();
        assert_eq!(result.contributing_source_count, 1);
    }

    #[test]
    fn dominance_cap_limits_a_single_source_share() {
        let params = AggregationParams {
            max_source_weight_share: dec!(0.5),
            ..params()
        };
        let snapshots = vec![
            snapshot(Exchange::Kraken, dec!(100), dec!(900)),
            snapshot(Exchange::Coinbase, dec!(100), dec!(100)),
        ];
        let result = aggregate(&snapshots, AggregationMethod::MidPrices, &params, 0).unwrap();
        let kraken_weight = result
            .per_source_weights
            .iter()
            .find(|(ex, _)| *ex == Exchange::Kraken)
            .unwrap()
            .1;
        assert_eq!(kraken_weight, dec!(500));
        assert_eq!(result.total_weight(), dec!(1000));
    }

    #[test]
    fn trades_method_weights_over_last_price_not_mid() {
        let snapshots = vec![SourceSnapshot {
            exchange: Exchange::Kraken,
            observation: Observation {
                timestamp_ms: 0,
                mid: dec!(100),
                bid: dec!(99),
                ask: dec!(101),
                last_price: dec!(103),
                volume: dec!(10),
            },
        }];
        let result = aggregate(&snapshots, AggregationMethod::Trades, &params(), 0).unwrap();
        assert_eq!(result.value, dec!(103));
    }
}
