//! Feature extraction: raw event sequences -> [`FeatureVector`].
//!
//! Every function here is a pure, deterministic transform: identical inputs
//! produce byte-identical output, including floating-point fields. Ordering
//! over hash tables is never relied upon — grouping uses `BTreeMap`/sorted
//! `Vec`s throughout.

use std::collections::{BTreeMap, BTreeSet};

use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::model::{
    ActivityClass, ActivityFeatures, AnalysisWindow, BalanceSnapshot, BehavioralClassification,
    CapitalClass, CreditBehaviorClass, FeatureRecord, FeatureVector, FinancialFeatures,
    LongevityClass, ProtocolEvent, ProtocolEventType, ProtocolInteractionFeatures, RiskClass,
    RiskFeatures, TemporalFeatures, TransactionRecord, FEATURE_VERSION,
};

/// Diagnostic record returned alongside a [`FeatureVector`], summarizing
/// how many raw events were consumed and whether anything was dropped.
#[derive(Debug, Clone)]
pub struct ExtractionReport {
    pub wallet: String,
    pub network: String,
    pub transactions_considered: usize,
    pub events_considered: usize,
    pub events_missing_timestamp: usize,
    pub snapshots_considered: usize,
    pub had_balance_history: bool,
}

pub fn extract_activity_features(
    transactions: &[TransactionRecord],
    window: &AnalysisWindow,
) -> ActivityFeatures {
    let total_transactions = transactions.len() as u64;
    let total_days = window.total_days() as u64;

    if total_transactions == 0 {
        return ActivityFeatures {
            total_transactions: 0,
            transactions_per_day: 0.0,
            active_days: 0,
            total_days,
            active_days_ratio: 0.0,
            longest_inactivity_gap_days: 0,
            recent_activity_days: total_days as i64,
        };
    }

    let tx_dates: BTreeSet<Date> = transactions
        .iter()
        .filter_map(|tx| tx.timestamp.map(|t| t.date()))
        .collect();

    let active_days = tx_dates.len() as u64;
    let active_days_ratio = active_days as f64 / total_days as f64;

    let sorted_dates: Vec<Date> = tx_dates.into_iter().collect();
    let mut longest_gap = 0i64;
    for pair in sorted_dates.windows(2) {
        let gap = (pair[1] - pair[0]).whole_days();
        longest_gap = longest_gap.max(gap);
    }

    let recent_activity_days = match sorted_dates.last() {
        Some(last) => (window.end.date() - *last).whole_days(),
        None => total_days as i64,
    };

    ActivityFeatures {
        total_transactions,
        transactions_per_day: total_transactions as f64 / total_days as f64,
        active_days,
        total_days,
        active_days_ratio,
        longest_inactivity_gap_days: longest_gap,
        recent_activity_days,
    }
}

pub fn extract_financial_features(
    transactions: &[TransactionRecord],
    snapshots: &[BalanceSnapshot],
    current_balance_native: f64,
) -> FinancialFeatures {
    let total_value_transferred_native: f64 = transactions.iter().map(|tx| tx.value_native).sum();
    let average_transaction_value_native = if transactions.is_empty() {
        0.0
    } else {
        total_value_transferred_native / transactions.len() as f64
    };

    let mut sorted_snapshots = snapshots.to_vec();
    sorted_snapshots.sort_by_key(|s| s.block_number);
    let balances: Vec<f64> = sorted_snapshots.iter().map(|s| s.balance_native).collect();

    let (max_balance, min_balance, volatility, sudden_drops_count) = if balances.is_empty() {
        (
            current_balance_native,
            current_balance_native,
            0.0,
            0u64,
        )
    } else {
        let max_balance = balances.iter().cloned().fold(f64::MIN, f64::max);
        let min_balance = balances.iter().cloned().fold(f64::MAX, f64::min);
        let volatility = sample_stdev(&balances);

        let mut drops = 0u64;
        for pair in balances.windows(2) {
            let (prev, curr) = (pair[0], pair[1]);
            if prev > 0.0 {
                let drop_ratio = (prev - curr) / prev;
                if drop_ratio > 0.5 {
                    drops += 1;
                }
            }
        }
        (max_balance, min_balance, volatility, drops)
    };

    FinancialFeatures {
        total_value_transferred_native,
        average_transaction_value_native,
        current_balance_native,
        max_balance_native: max_balance,
        min_balance_native: min_balance,
        balance_volatility: volatility,
        sudden_drops_count,
    }
}

/// Sample standard deviation (`n - 1` denominator), `0.0` for fewer than two
/// samples, matching Python's `statistics.stdev`.
fn sample_stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    variance.sqrt()
}

pub fn extract_protocol_features(events: &[ProtocolEvent]) -> ProtocolInteractionFeatures {
    let count = |t: ProtocolEventType| events.iter().filter(|e| e.event_type == t).count() as u64;

    let borrow_count = count(ProtocolEventType::Borrow);
    let repay_count = count(ProtocolEventType::Repay);
    let repay_to_borrow_ratio = if borrow_count > 0 {
        repay_count as f64 / borrow_count as f64
    } else {
        0.0
    };

    let borrows: Vec<&ProtocolEvent> = events
        .iter()
        .filter(|e| e.event_type == ProtocolEventType::Borrow)
        .collect();
    let repays: Vec<&ProtocolEvent> = events
        .iter()
        .filter(|e| e.event_type == ProtocolEventType::Repay)
        .collect();
    let average_borrow_duration_days = average_borrow_duration(&borrows, &repays);

    ProtocolInteractionFeatures {
        total_protocol_events: events.len() as u64,
        borrow_count,
        repay_count,
        deposit_count: count(ProtocolEventType::Deposit),
        withdraw_count: count(ProtocolEventType::Withdraw),
        liquidation_count: count(ProtocolEventType::Liquidation),
        repay_to_borrow_ratio,
        average_borrow_duration_days,
    }
}

/// Pair each borrow with the first subsequent repay from the same protocol
/// (and, when both specify one, the same asset). Unmatched borrows are
/// excluded. Falls back to `(last_repay - first_borrow) / borrow_count`
/// when no pair matches at all.
fn average_borrow_duration(borrows: &[&ProtocolEvent], repays: &[&ProtocolEvent]) -> f64 {
    if borrows.is_empty() || repays.is_empty() {
        return 0.0;
    }

    let mut sorted_borrows: Vec<&ProtocolEvent> = borrows
        .iter()
        .copied()
        .filter(|e| e.timestamp.is_some())
        .collect();
    sorted_borrows.sort_by_key(|e| e.timestamp.unwrap());

    let mut sorted_repays: Vec<&ProtocolEvent> = repays
        .iter()
        .copied()
        .filter(|e| e.timestamp.is_some())
        .collect();
    sorted_repays.sort_by_key(|e| e.timestamp.unwrap());

    if sorted_borrows.is_empty() || sorted_repays.is_empty() {
        return 0.0;
    }

    let mut durations = Vec::new();
    for borrow in &sorted_borrows {
        let borrow_ts = borrow.timestamp.unwrap();
        let matching_repay = sorted_repays.iter().find(|repay| {
            let repay_ts = repay.timestamp.unwrap();
            if repay_ts <= borrow_ts || repay.protocol_name != borrow.protocol_name {
                return false;
            }
            match (&borrow.asset_symbol, &repay.asset_symbol) {
                (Some(b), Some(r)) => b == r,
                _ => true,
            }
        });

        if let Some(repay) = matching_repay {
            let duration = (repay.timestamp.unwrap() - borrow_ts).whole_days();
            if duration >= 0 {
                durations.push(duration);
            }
        }
    }

    if !durations.is_empty() {
        return durations.iter().sum::<i64>() as f64 / durations.len() as f64;
    }

    let first_borrow = sorted_borrows[0].timestamp.unwrap();
    let last_repay = sorted_repays[sorted_repays.len() - 1].timestamp.unwrap();
    let duration = (last_repay - first_borrow).whole_days() as f64;
    (duration / sorted_borrows.len() as f64).max(0.0)
}

pub fn extract_risk_features(
    transactions: &[TransactionRecord],
    events: &[ProtocolEvent],
    snapshots: &[BalanceSnapshot],
) -> RiskFeatures {
    let failed_transaction_count = transactions.iter().filter(|tx| !tx.success).count() as u64;
    let failed_transaction_ratio = if transactions.is_empty() {
        0.0
    } else {
        failed_transaction_count as f64 / transactions.len() as f64
    };

    let liquidation_count = events
        .iter()
        .filter(|e| e.event_type == ProtocolEventType::Liquidation)
        .count() as u64;

    let high_gas_spike_count = detect_gas_spikes(transactions);

    let zero_balance_periods = snapshots
        .iter()
        .filter(|s| s.balance_native == 0.0)
        .count() as u64;

    RiskFeatures {
        failed_transaction_count,
        failed_transaction_ratio,
        liquidation_count,
        high_gas_spike_count,
        zero_balance_periods,
    }
}

/// Median-and-p95-based gas-spike detector: requires at least
/// 10 priced transactions, flags anything above
/// `max(3*median, 2*p95, 100 Gwei)`, double-counts failed spikes, and
/// reports 0 when the resulting spike rate is below the 5% noise floor.
fn detect_gas_spikes(transactions: &[TransactionRecord]) -> u64 {
    let priced: Vec<&TransactionRecord> = transactions
        .iter()
        .filter(|tx| {
            tx.gas_used.is_some()
                && tx
                    .gas_price_base_units
                    .map(|p| !p.is_zero())
                    .unwrap_or(false)
        })
        .collect();

    if priced.len() < 10 {
        return 0;
    }

    let mut gwei: Vec<f64> = priced
        .iter()
        .map(|tx| wei_to_gwei(tx.gas_price_base_units.unwrap()))
        .collect();
    let median = median_f64(&mut gwei.clone());
    let p95 = percentile_f64(&mut gwei, 0.95);

    let threshold = median * 3.0;
    let threshold = threshold.max(p95 * 2.0).max(100.0);

    let mut spike_count = 0u64;
    for tx in &priced {
        let price_gwei = wei_to_gwei(tx.gas_price_base_units.unwrap());
        if price_gwei > threshold {
            spike_count += if tx.success { 1 } else { 2 };
        }
    }

    let spike_rate = spike_count as f64 / priced.len() as f64;
    if spike_rate < 0.05 {
        debug!(spike_rate, "gas spike rate below noise floor, reporting 0");
        return 0;
    }
    spike_count
}

fn wei_to_gwei(wei: ethereum_types::U256) -> f64 {
    // 1 Gwei = 1e9 wei. U256 -> f64 loses precision above 2^53 but gas
    // prices never approach that range in practice.
    let as_f64: f64 = wei.low_u128() as f64;
    as_f64 / 1e9
}

fn median_f64(values: &mut [f64]) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let n = values.len();
    if n % 2 == 1 {
        values[n / 2]
    } else {
        (values[n / 2 - 1] + values[n / 2]) / 2.0
    }
}

/// Nearest-rank percentile, matching `sorted[int(len * p)]` from the source
/// service (not an interpolated percentile).
fn percentile_f64(values: &mut [f64], p: f64) -> f64 {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap());
    let idx = ((values.len() as f64) * p) as usize;
    values[idx.min(values.len() - 1)]
}

pub fn extract_temporal_features(
    transactions: &[TransactionRecord],
    first_seen: OffsetDateTime,
    window: &AnalysisWindow,
) -> TemporalFeatures {
    let wallet_age_days = (window.end - first_seen).whole_days();

    let tx_times: Vec<OffsetDateTime> = transactions.iter().filter_map(|tx| tx.timestamp).collect();
    let days_since_last_activity = match tx_times.iter().max() {
        Some(last) => (window.end - *last).whole_days(),
        None => wallet_age_days,
    };

    let transaction_regularity_score = if transactions.len() > 2 {
        let mut sorted_times = tx_times.clone();
        sorted_times.sort();
        let intervals: Vec<f64> = sorted_times
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).as_seconds_f64())
            .collect();
        if intervals.len() > 1 {
            let mean_interval = intervals.iter().sum::<f64>() / intervals.len() as f64;
            if mean_interval > 0.0 {
                let cv = sample_stdev(&intervals) / mean_interval;
                1.0 / (1.0 + cv)
            } else {
                0.0
            }
        } else {
            0.0
        }
    } else {
        0.0
    };

    let burst_activity_ratio = if !tx_times.is_empty() {
        let mut daily_counts: BTreeMap<Date, u64> = BTreeMap::new();
        for t in &tx_times {
            *daily_counts.entry(t.date()).or_insert(0) += 1;
        }
        let mut counts: Vec<u64> = daily_counts.into_values().collect();
        counts.sort_unstable_by(|a, b| b.cmp(a));
        let top_n = (counts.len() / 10).max(1);
        let burst_txs: u64 = counts.iter().take(top_n).sum();
        burst_txs as f64 / transactions.len() as f64
    } else {
        0.0
    };

    TemporalFeatures {
        wallet_age_days,
        days_since_last_activity,
        transaction_regularity_score,
        burst_activity_ratio,
    }
}

pub fn classify_behavior(
    activity: &ActivityFeatures,
    financial: &FinancialFeatures,
    protocol: &ProtocolInteractionFeatures,
    risk: &RiskFeatures,
    temporal: &TemporalFeatures,
) -> BehavioralClassification {
    let longevity_class = if temporal.wallet_age_days < 30 {
        LongevityClass::New
    } else if temporal.wallet_age_days < 365 {
        LongevityClass::Established
    } else {
        LongevityClass::Veteran
    };

    let activity_class = if activity.total_transactions == 0 {
        ActivityClass::Dormant
    } else if activity.transactions_per_day < 0.1 {
        ActivityClass::Occasional
    } else if activity.transactions_per_day < 5.0 {
        ActivityClass::Active
    } else {
        ActivityClass::Hyperactive
    };

    let balance = financial.current_balance_native;
    let capital_class = if balance < 0.01 {
        CapitalClass::Micro
    } else if balance < 0.1 {
        CapitalClass::Small
    } else if balance < 1.0 {
        CapitalClass::Medium
    } else if balance < 10.0 {
        CapitalClass::Large
    } else {
        CapitalClass::Whale
    };

    let credit_behavior_class = if protocol.total_protocol_events == 0 {
        CreditBehaviorClass::NoHistory
    } else if protocol.liquidation_count > 0 {
        CreditBehaviorClass::Defaulter
    } else if protocol.borrow_count > 0 {
        if protocol.repay_to_borrow_ratio >= 0.8 {
            CreditBehaviorClass::Responsible
        } else {
            CreditBehaviorClass::Risky
        }
    } else {
        CreditBehaviorClass::NoHistory
    };

    let mut risk_score = 0u32;
    if protocol.liquidation_count > 0 {
        risk_score += 3;
    }
    if risk.failed_transaction_ratio > 0.1 {
        risk_score += 2;
    } else if risk.failed_transaction_ratio > 0.05 {
        risk_score += 1;
    }
    if financial.sudden_drops_count > 3 {
        risk_score += 2;
    } else if financial.sudden_drops_count > 1 {
        risk_score += 1;
    }
    if risk.zero_balance_periods > 5 {
        risk_score += 1;
    }
    if temporal.days_since_last_activity > 180 {
        risk_score += 1;
    }

    let risk_class = match risk_score {
        0 => RiskClass::Low,
        1..=2 => RiskClass::Medium,
        3..=4 => RiskClass::High,
        _ => RiskClass::Critical,
    };

    BehavioralClassification {
        longevity_class,
        activity_class,
        capital_class,
        credit_behavior_class,
        risk_class,
    }
}

/// Entry point: extract a full [`FeatureVector`] plus diagnostic
/// [`ExtractionReport`] from a raw [`FeatureRecord`].
pub fn extract_features(
    record: &FeatureRecord,
    network: &str,
    chain_id: u64,
    now: OffsetDateTime,
) -> (FeatureVector, ExtractionReport) {
    let activity = extract_activity_features(&record.transactions, &record.window);
    let financial = extract_financial_features(
        &record.transactions,
        &record.balance_snapshots,
        record.wallet_metadata.current_balance_native,
    );
    let protocol = extract_protocol_features(&record.protocol_events);
    let risk = extract_risk_features(
        &record.transactions,
        &record.protocol_events,
        &record.balance_snapshots,
    );
    let temporal = extract_temporal_features(
        &record.transactions,
        record.wallet_metadata.first_seen_timestamp,
        &record.window,
    );
    let classification = classify_behavior(&activity, &financial, &protocol, &risk, &temporal);

    let events_missing_timestamp = record
        .protocol_events
        .iter()
        .filter(|e| e.timestamp.is_none())
        .count();

    let report = ExtractionReport {
        wallet: record.wallet_metadata.address.to_string(),
        network: network.to_string(),
        transactions_considered: record.transactions.len(),
        events_considered: record.protocol_events.len(),
        events_missing_timestamp,
        snapshots_considered: record.balance_snapshots.len(),
        had_balance_history: !record.balance_snapshots.is_empty(),
    };

    let vector = FeatureVector {
        wallet: record.wallet_metadata.address,
        network: network.to_string(),
        chain_id,
        window: record.window.clone(),
        activity,
        financial,
        protocol,
        risk,
        temporal,
        classification,
        extraction_timestamp: now,
        feature_version: FEATURE_VERSION.to_string(),
    };

    (vector, report)
}
