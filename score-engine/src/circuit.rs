//! The circuit-parallel scoring engine.
//!
//! Every function here uses only integer arithmetic, matching the
//! downstream arithmetic circuit's constraint system bit-for-bit: all
//! divisions are truncating, and balances are truncated to unscaled
//! integer token amounts before being fed to [`logscale`]. Do not refactor
//! this module to use floating point anywhere, even for constants that
//! "look" exact — see [`crate::readable`] for the human-facing variant.

use score_core::constants::{LogBase, BASE_SCORE_SCALED, MAX_SCORE_SCALED};
use score_core::logscale::logscale;
use score_core::scaled::{clamp, min, to_scaled};
use score_features::model::FeatureVector;

use crate::{ComponentScore, ScoreComponents};

/// Repayment behavior, max 210 points.
pub fn compute_repayment_score(fv: &FeatureVector) -> i64 {
    let borrow_count = fv.protocol.borrow_count as i64;
    if borrow_count == 0 {
        return 0;
    }
    let repay_count = fv.protocol.repay_count as i64;
    let repay_ratio = min((repay_count * 1000) / borrow_count, 1000);
    let ratio_score = repay_ratio * 150;

    let no_liquidation_bonus = if fv.protocol.liquidation_count == 0 {
        60_000
    } else {
        0
    };

    ratio_score + no_liquidation_bonus
}

/// Capital management, max 180 points.
///
/// `current_balance` and `max_balance` are passed to [`logscale`] as
/// unscaled integer token amounts, per the circuit's `LogScale` contract —
/// this is the single most error-prone boundary in the whole pipeline.
pub fn compute_capital_score(fv: &FeatureVector) -> i64 {
    let current_balance_unscaled = fv.financial.current_balance_native as i64;
    let max_balance_unscaled = fv.financial.max_balance_native as i64;
    let volatility_scaled = to_scaled(fv.financial.balance_volatility);

    let balance_log = logscale(current_balance_unscaled, LogBase::Balance);
    let balance_score = balance_log * 90;

    let vol_capped = min(volatility_scaled, 1000);
    let stability_ratio = 1000 - vol_capped;
    let vol_check = i64::from(volatility_scaled < 1000);
    let stability_score = stability_ratio * 60 * vol_check;

    let max_balance_log = logscale(max_balance_unscaled, LogBase::Balance);
    let history_score = max_balance_log * 30;

    balance_score + stability_score + history_score
}

/// Wallet longevity, max 90 points.
pub fn compute_longevity_score(fv: &FeatureVector) -> i64 {
    let age_log = logscale(fv.temporal.wallet_age_days, LogBase::Age);
    let age_score = age_log * 60;

    let active_days_ratio_scaled = to_scaled(fv.activity.active_days_ratio);
    let consistency_score = active_days_ratio_scaled * 30;

    age_score + consistency_score
}

/// Activity patterns, max 60 points.
pub fn compute_activity_score(fv: &FeatureVector) -> i64 {
    let tx_log = logscale(fv.activity.total_transactions as i64, LogBase::TransactionCount);
    let frequency_score = tx_log * 30;

    let regularity_scaled = to_scaled(fv.temporal.transaction_regularity_score);
    let regularity_score = regularity_scaled * 30;

    frequency_score + regularity_score
}

/// Protocol diversity, max 60 points.
pub fn compute_protocol_score(fv: &FeatureVector) -> i64 {
    let interaction_ratio = min((fv.protocol.total_protocol_events as i64) * 10, 1000);
    let interaction_score = interaction_ratio * 30;

    let borrow_ratio = min((fv.protocol.borrow_count as i64) * 100, 1000);
    let borrow_experience_score = borrow_ratio * 30;

    interaction_score + borrow_experience_score
}

/// Risk penalties, always non-negative (subtracted from the total).
pub fn compute_risk_penalties(fv: &FeatureVector) -> i64 {
    let mut penalty = 0i64;

    penalty += (fv.protocol.liquidation_count as i64) * 100_000;

    let volatility_scaled = to_scaled(fv.financial.balance_volatility);
    if volatility_scaled >= 1000 {
        penalty += 50_000;
    }

    penalty += (fv.financial.sudden_drops_count as i64) * 15_000;

    if fv.temporal.days_since_last_activity > 180 {
        penalty += (fv.temporal.days_since_last_activity * 30_000) / 180;
    }

    if fv.risk.zero_balance_periods > 5 {
        let excess = fv.risk.zero_balance_periods as i64 - 5;
        penalty += excess * 10_000;
    }

    let burst_scaled = to_scaled(fv.temporal.burst_activity_ratio);
    if burst_scaled > 500 {
        penalty += 25_000;
    }

    let failed_ratio_scaled = to_scaled(fv.risk.failed_transaction_ratio);
    if failed_ratio_scaled > 50 {
        penalty += (failed_ratio_scaled * 20_000) / 50;
    }

    penalty
}

/// Computes all six component contributions for `fv` in pure integer
/// (scaled ×1000) arithmetic, matching the circuit exactly.
pub fn compute_components_scaled(fv: &FeatureVector) -> [i64; 6] {
    [
        compute_repayment_score(fv),
        compute_capital_score(fv),
        compute_longevity_score(fv),
        compute_activity_score(fv),
        compute_protocol_score(fv),
        compute_risk_penalties(fv),
    ]
}

/// `raw = base + positive - penalty`, clamped to `[0, 900_000]`. Returns
/// `(final_scaled, raw_scaled)`.
pub fn compute_final_scaled(components: [i64; 6]) -> (i64, i64) {
    let [repayment, capital, longevity, activity, protocol, penalty] = components;
    let positive = repayment + capital + longevity + activity + protocol;
    let raw = BASE_SCORE_SCALED + positive - penalty;
    (clamp(raw, 0, MAX_SCORE_SCALED), raw)
}

/// Builds the full [`ScoreComponents`] record (scaled only; the readable
/// engine fills in the float mirrors).
pub fn compute_score_components(fv: &FeatureVector) -> (ScoreComponents, i64, i64) {
    let scaled = compute_components_scaled(fv);
    let (final_scaled, raw_scaled) = compute_final_scaled(scaled);

    let component = |scaled_value: i64| ComponentScore {
        value: score_core::scaled::from_scaled(scaled_value),
        scaled: scaled_value,
    };

    let components = ScoreComponents {
        repayment: component(scaled[0]),
        capital: component(scaled[1]),
        longevity: component(scaled[2]),
        activity: component(scaled[3]),
        protocol: component(scaled[4]),
        risk_penalty: component(scaled[5]),
    };

    (components, final_scaled, raw_scaled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_features::model::*;
    use time::OffsetDateTime;

    fn empty_vector() -> FeatureVector {
        let now = OffsetDateTime::now_utc();
        FeatureVector {
            wallet: score_core::address::WalletAddress::from_bytes(&[0u8; 20]).unwrap(),
            network: "ethereum".into(),
            chain_id: 1,
            window: AnalysisWindow::new("lifetime", None, now),
            activity: ActivityFeatures::default(),
            financial: FinancialFeatures::default(),
            protocol: ProtocolInteractionFeatures::default(),
            risk: RiskFeatures::default(),
            temporal: TemporalFeatures::default(),
            classification: BehavioralClassification {
                longevity_class: LongevityClass::New,
                activity_class: ActivityClass::Dormant,
                capital_class: CapitalClass::Micro,
                credit_behavior_class: CreditBehaviorClass::NoHistory,
                risk_class: RiskClass::Low,
            },
            extraction_timestamp: now,
            feature_version: "1.0.0".into(),
        }
    }

    #[test]
    fn empty_wallet_scores_exactly_base() {
        let fv = empty_vector();
        let scaled = compute_components_scaled(&fv);
        assert_eq!(scaled, [0, 0, 0, 0, 0, 0]);
        let (final_scaled, raw) = compute_final_scaled(scaled);
        assert_eq!(final_scaled, BASE_SCORE_SCALED);
        assert_eq!(raw, BASE_SCORE_SCALED);
        assert_eq!(final_scaled / 1000, 300);
    }

    #[test]
    fn borrow_count_zero_means_zero_repayment_regardless_of_repay_count() {
        let mut fv = empty_vector();
        fv.protocol.repay_count = 5;
        assert_eq!(compute_repayment_score(&fv), 0);
    }

    #[test]
    fn no_liquidation_bonus_applies_when_borrow_count_positive() {
        let mut fv = empty_vector();
        fv.protocol.borrow_count = 4;
        fv.protocol.repay_count = 4;
        assert_eq!(compute_repayment_score(&fv), 150_000 + 60_000);
    }

    #[test]
    fn high_volatility_zeroes_stability_and_applies_flat_penalty() {
        let mut fv = empty_vector();
        fv.financial.balance_volatility = 1.5;
        assert_eq!(compute_risk_penalties(&fv), 50_000);
        // stability component folded into capital score: should be 0
        let capital = compute_capital_score(&fv);
        let balance_component = logscale(0, LogBase::Balance) * 90;
        assert_eq!(capital, balance_component);
    }

    /// A high-volatility trader. Each penalty term is checked independently
    /// so a regression in one term can't hide behind the others summing out.
    #[test]
    fn high_volatility_trader_matches_each_independent_penalty_term() {
        let mut fv = empty_vector();
        fv.financial.current_balance_native = 0.1;
        fv.financial.balance_volatility = 1.5;
        fv.financial.sudden_drops_count = 4;
        fv.temporal.burst_activity_ratio = 0.8;
        fv.risk.failed_transaction_ratio = 0.12;

        // current_balance truncates to 0 unscaled tokens, so the balance and
        // stability terms both collapse to 0.
        assert_eq!(compute_capital_score(&fv), 0);

        assert_eq!(compute_risk_penalties(&fv), 50_000 + 60_000 + 25_000 + 48_000);
    }

    #[test]
    fn logscale_saturation_maxes_history_component() {
        let mut fv = empty_vector();
        fv.financial.max_balance_native = 1_000_000_000.0;
        let capital = compute_capital_score(&fv);
        // history term alone should be 1000 * 30 = 30000
        assert!(capital >= 30_000);
    }
}
