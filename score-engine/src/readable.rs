//! The human-facing mirror of [`crate::circuit`].
//!
//! This engine evaluates the same piecewise-linear breakpoint table as
//! [`score_core::logscale::logscale`], but in `f64` instead of truncating
//! integer division, and logs every component at `debug` level so a
//! dashboard or support tool can show *why* a wallet landed on a given
//! score. It must never be used to produce a witness: only [`crate::circuit`]
//! is bit-exact with the arithmetic circuit. Its only contract is to land
//! within a point of [`crate::circuit`] on ordinary inputs, checked by the
//! cross-check test at the bottom of this module. A true natural-log curve
//! cannot make that guarantee: the circuit's table is deliberately far from
//! a real logarithm near the origin (e.g. a balance of 5 against base 11
//! sits in the table's most compressed segment), so this module must track
//! the same breakpoints and anchors `logscale` does, not a smooth `ln()`.
use score_core::constants::{
    LogBase, BASE_SCORE_SCALED, LOG_OFFSETS, LOG_SLOPE_DENOMINATORS, LOG_SLOPE_NUMERATORS,
    MAX_SCORE_SCALED, SCALE,
};
use score_features::model::FeatureVector;
use time::OffsetDateTime;
use tracing::debug;

use crate::{ComponentScore, ScoreBand, ScoreBand6, ScoreComponents, ScoreResult, ENGINE_VERSION};

/// Floating-point evaluation of [`score_core::logscale::logscale`]'s
/// piecewise-linear table: same segments, same anchors, same slopes, just
/// without the integer truncation at each step. Returned in the same
/// `[0.0, 1.0]` range as the circuit's `[0, 1000]` fixed-point output.
fn logscale_f64(value: f64, base: LogBase) -> f64 {
    if value <= 0.0 {
        return 0.0;
    }

    let segment = if value <= 10.0 {
        0
    } else if value <= 100.0 {
        1
    } else if value <= 1000.0 {
        2
    } else {
        3
    };

    let anchor = match segment {
        0 => 0.0,
        1 => 10.0,
        2 => 100.0,
        _ => 1000.0,
    };

    let log_value = LOG_OFFSETS[segment] as f64
        + (value - anchor) * LOG_SLOPE_NUMERATORS[segment] as f64
            / LOG_SLOPE_DENOMINATORS[segment] as f64;

    let log_base = base.log_base_scaled() as f64;
    (log_value / log_base).min(1.0).max(0.0)
}

fn repayment_score(fv: &FeatureVector) -> f64 {
    if fv.protocol.borrow_count == 0 {
        return 0.0;
    }
    let ratio = (fv.protocol.repay_count as f64 / fv.protocol.borrow_count as f64).min(1.0);
    let ratio_score = ratio * 150.0;
    let bonus = if fv.protocol.liquidation_count == 0 {
        60.0
    } else {
        0.0
    };
    ratio_score + bonus
}

fn capital_score(fv: &FeatureVector) -> f64 {
    let balance_score = logscale_f64(fv.financial.current_balance_native, LogBase::Balance) * 90.0;

    let volatility = fv.financial.balance_volatility.min(1.0);
    let stability_score = if fv.financial.balance_volatility < 1.0 {
        (1.0 - volatility) * 60.0
    } else {
        0.0
    };

    let history_score = logscale_f64(fv.financial.max_balance_native, LogBase::Balance) * 30.0;

    balance_score + stability_score + history_score
}

fn longevity_score(fv: &FeatureVector) -> f64 {
    let age_score = logscale_f64(fv.temporal.wallet_age_days as f64, LogBase::Age) * 60.0;
    let consistency_score = fv.activity.active_days_ratio.min(1.0) * 30.0;
    age_score + consistency_score
}

fn activity_score(fv: &FeatureVector) -> f64 {
    let frequency_score =
        logscale_f64(fv.activity.total_transactions as f64, LogBase::TransactionCount) * 30.0;
    let regularity_score = fv.temporal.transaction_regularity_score.min(1.0) * 30.0;
    frequency_score + regularity_score
}

fn protocol_score(fv: &FeatureVector) -> f64 {
    let interaction_score = (fv.protocol.total_protocol_events as f64 / 100.0).min(1.0) * 30.0;
    let borrow_experience_score = (fv.protocol.borrow_count as f64 / 10.0).min(1.0) * 30.0;
    interaction_score + borrow_experience_score
}

fn risk_penalty(fv: &FeatureVector) -> f64 {
    let mut penalty = 0.0;
    penalty += fv.protocol.liquidation_count as f64 * 100.0;
    if fv.financial.balance_volatility >= 1.0 {
        penalty += 50.0;
    }
    penalty += fv.financial.sudden_drops_count as f64 * 15.0;
    if fv.temporal.days_since_last_activity > 180 {
        penalty += (fv.temporal.days_since_last_activity as f64 * 30.0) / 180.0;
    }
    if fv.risk.zero_balance_periods > 5 {
        penalty += (fv.risk.zero_balance_periods as f64 - 5.0) * 10.0;
    }
    if fv.temporal.burst_activity_ratio > 0.5 {
        penalty += 25.0;
    }
    if fv.risk.failed_transaction_ratio > 0.05 {
        penalty += (fv.risk.failed_transaction_ratio * 20.0) / 0.05;
    }
    penalty
}

/// Computes a [`ScoreResult`] the same shape as [`crate::score`], but using
/// floating-point logarithms. Logs every component at `debug` level.
pub fn score_readable(fv: &FeatureVector, now: OffsetDateTime) -> ScoreResult {
    let repayment = repayment_score(fv);
    let capital = capital_score(fv);
    let longevity = longevity_score(fv);
    let activity = activity_score(fv);
    let protocol = protocol_score(fv);
    let penalty = risk_penalty(fv);

    debug!(
        wallet = %fv.wallet,
        repayment,
        capital,
        longevity,
        activity,
        protocol,
        penalty,
        "readable engine component breakdown"
    );

    let raw = 300.0 + repayment + capital + longevity + activity + protocol - penalty;
    let final_score = raw.max(0.0).min(900.0);
    let credit_score = final_score.round() as u32;

    let component = |points: f64| ComponentScore {
        value: points,
        scaled: (points * SCALE as f64).round() as i64,
    };

    ScoreResult {
        credit_score,
        credit_score_scaled: credit_score as i64 * SCALE,
        score_band: ScoreBand::from_credit_score(credit_score),
        score_band_6: ScoreBand6::from_credit_score(credit_score),
        components: ScoreComponents {
            repayment: component(repayment),
            capital: component(capital),
            longevity: component(longevity),
            activity: component(activity),
            protocol: component(protocol),
            risk_penalty: component(penalty),
        },
        raw_score_scaled: (raw * SCALE as f64).round().clamp(
            (0 - MAX_SCORE_SCALED) as f64,
            (MAX_SCORE_SCALED * 2) as f64,
        ) as i64,
        timestamp: now,
        feature_version: fv.feature_version.clone(),
        engine_version: format!("{ENGINE_VERSION}-readable"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit;
    use score_core::address::WalletAddress;
    use score_features::model::*;

    fn vector_with(
        borrow_count: u64,
        repay_count: u64,
        liquidation_count: u64,
        current_balance: f64,
        max_balance: f64,
        volatility: f64,
        age_days: i64,
        total_tx: u64,
    ) -> FeatureVector {
        let now = OffsetDateTime::now_utc();
        FeatureVector {
            wallet: WalletAddress::from_bytes(&[7u8; 20]).unwrap(),
            network: "ethereum".into(),
            chain_id: 1,
            window: AnalysisWindow::new("lifetime", None, now),
            activity: ActivityFeatures {
                total_transactions: total_tx,
                active_days_ratio: 0.4,
                ..Default::default()
            },
            financial: FinancialFeatures {
                current_balance_native: current_balance,
                max_balance_native: max_balance,
                balance_volatility: volatility,
                ..Default::default()
            },
            protocol: ProtocolInteractionFeatures {
                borrow_count,
                repay_count,
                liquidation_count,
                total_protocol_events: borrow_count + repay_count,
                ..Default::default()
            },
            risk: RiskFeatures::default(),
            temporal: TemporalFeatures {
                wallet_age_days: age_days,
                transaction_regularity_score: 0.3,
                ..Default::default()
            },
            classification: BehavioralClassification {
                longevity_class: LongevityClass::Established,
                activity_class: ActivityClass::Active,
                capital_class: CapitalClass::Medium,
                credit_behavior_class: CreditBehaviorClass::Responsible,
                risk_class: RiskClass::Low,
            },
            extraction_timestamp: now,
            feature_version: "1.0.0".into(),
        }
    }

    #[test]
    fn agrees_with_circuit_engine_within_one_point_on_ordinary_wallets() {
        let now = OffsetDateTime::now_utc();
        let corpus = vec![
            vector_with(0, 0, 0, 0.0, 0.0, 0.0, 0, 0),
            vector_with(10, 9, 0, 5.0, 8.0, 0.1, 400, 200),
            vector_with(4, 4, 0, 2.0, 2.0, 0.05, 1000, 50),
            vector_with(6, 3, 1, 1.0, 3.0, 0.3, 200, 80),
        ];

        for fv in &corpus {
            let exact = circuit::compute_score_components(fv);
            let exact_score = (exact.1 / SCALE) as i64;
            let readable = score_readable(fv, now);
            let diff = (exact_score - readable.credit_score as i64).abs();
            assert!(
                diff <= 1,
                "engines diverged by {diff} points: exact={exact_score} readable={}",
                readable.credit_score
            );
        }
    }
}
