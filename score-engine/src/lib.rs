//! Scoring engine: turns a [`score_features::model::FeatureVector`]
//! into a [`ScoreResult`].
//!
//! Two independent implementations exist on purpose. [`circuit`] is the
//! authoritative, integer-only engine that must match the downstream
//! arithmetic circuit bit-for-bit. [`readable`] is a floating-point mirror
//! used for human-facing breakdowns and dashboards; it is required to agree
//! with [`circuit`] to within one point on the final `credit_score`, never
//! to replace it as a source of truth.

#![forbid(unsafe_code)]

pub mod circuit;
pub mod readable;

use score_core::constants::SCALE;
use score_features::model::FeatureVector;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

pub const ENGINE_VERSION: &str = "1.0.0";

/// A single scoring component, carried as both its scaled-integer circuit
/// value and a float for presentation. The float is always
/// `scaled as f64 / 1000.0`; it is never computed independently.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComponentScore {
    pub value: f64,
    pub scaled: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreComponents {
    pub repayment: ComponentScore,
    pub capital: ComponentScore,
    pub longevity: ComponentScore,
    pub activity: ComponentScore,
    pub protocol: ComponentScore,
    /// Always non-negative; subtracted from the base + positive components.
    pub risk_penalty: ComponentScore,
}

/// The authoritative 4-level band used in on-chain/contract-facing
/// decisions (Open Question (i): the finer 6-level scale is presentational
/// only, see [`ScoreBand6`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Poor,
    Fair,
    Good,
    Excellent,
}

impl ScoreBand {
    /// `credit_score` is the human-facing score in `[0, 900]`, i.e. already
    /// divided by [`SCALE`].
    pub fn from_credit_score(credit_score: u32) -> ScoreBand {
        match credit_score {
            s if s < 580 => ScoreBand::Poor,
            s if s < 670 => ScoreBand::Fair,
            s if s < 740 => ScoreBand::Good,
            _ => ScoreBand::Excellent,
        }
    }
}

/// A finer 6-level presentational band, not used by the circuit or any
/// on-chain decision. Supplements [`ScoreBand`] for dashboards that want
/// more granularity than the four contract-facing tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand6 {
    Poor,
    Fair,
    Good,
    VeryGood,
    Excellent,
    Exceptional,
}

impl ScoreBand6 {
    pub fn from_credit_score(credit_score: u32) -> ScoreBand6 {
        match credit_score {
            s if s < 500 => ScoreBand6::Poor,
            s if s < 580 => ScoreBand6::Fair,
            s if s < 670 => ScoreBand6::Good,
            s if s < 740 => ScoreBand6::VeryGood,
            s if s < 800 => ScoreBand6::Excellent,
            _ => ScoreBand6::Exceptional,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResult {
    /// Human-facing score in `[0, 900]`.
    pub credit_score: u32,
    /// Same value scaled by [`SCALE`], as fed to the witness.
    pub credit_score_scaled: i64,
    pub score_band: ScoreBand,
    pub score_band_6: ScoreBand6,
    pub components: ScoreComponents,
    /// Pre-clamp scaled score; differs from `credit_score_scaled` only when
    /// the raw computation fell outside `[0, 900_000]`.
    pub raw_score_scaled: i64,
    pub timestamp: OffsetDateTime,
    pub feature_version: String,
    pub engine_version: String,
}

/// Runs the authoritative circuit-parallel engine over `fv`.
/// This is the function every downstream witness and proof must be built
/// from; [`readable::score_readable`] exists only to cross-check it.
pub fn score(fv: &FeatureVector, now: OffsetDateTime) -> ScoreResult {
    let (components, final_scaled, raw_scaled) = circuit::compute_score_components(fv);
    let credit_score = (final_scaled / SCALE) as u32;

    ScoreResult {
        credit_score,
        credit_score_scaled: final_scaled,
        score_band: ScoreBand::from_credit_score(credit_score),
        score_band_6: ScoreBand6::from_credit_score(credit_score),
        components,
        raw_score_scaled: raw_scaled,
        timestamp: now,
        feature_version: fv.feature_version.clone(),
        engine_version: ENGINE_VERSION.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_features::model::*;

    fn wallet_with(
        mutate: impl FnOnce(&mut FeatureVector),
    ) -> FeatureVector {
        let now = OffsetDateTime::now_utc();
        let mut fv = FeatureVector {
            wallet: score_core::address::WalletAddress::from_bytes(&[7u8; 20]).unwrap(),
            network: "ethereum".into(),
            chain_id: 1,
            window: AnalysisWindow::new("lifetime", None, now),
            activity: ActivityFeatures::default(),
            financial: FinancialFeatures::default(),
            protocol: ProtocolInteractionFeatures::default(),
            risk: RiskFeatures::default(),
            temporal: TemporalFeatures::default(),
            classification: BehavioralClassification {
                longevity_class: LongevityClass::Veteran,
                activity_class: ActivityClass::Active,
                capital_class: CapitalClass::Medium,
                credit_behavior_class: CreditBehaviorClass::Responsible,
                risk_class: RiskClass::Low,
            },
            extraction_timestamp: now,
            feature_version: "1.0.0".into(),
        };
        mutate(&mut fv);
        fv
    }

    /// A clean, active, long-lived borrower.
    fn excellent_borrower() -> FeatureVector {
        wallet_with(|fv| {
            fv.financial.current_balance_native = 5.0;
            fv.financial.max_balance_native = 10.0;
            fv.financial.balance_volatility = 0.15;
            fv.protocol.borrow_count = 10;
            fv.protocol.repay_count = 10;
            fv.protocol.liquidation_count = 0;
            fv.protocol.total_protocol_events = 50;
            fv.temporal.wallet_age_days = 730;
            fv.activity.total_transactions = 500;
            fv.activity.active_days_ratio = 0.82;
            fv.temporal.transaction_regularity_score = 0.85;
        })
    }

    #[test]
    fn excellent_borrower_maxes_repayment_and_lands_in_good_or_better() {
        let now = OffsetDateTime::now_utc();
        let result = score(&excellent_borrower(), now);
        assert_eq!(result.components.repayment.scaled, 210_000);
        assert_eq!(result.components.risk_penalty.scaled, 0);
        assert!(
            result.credit_score >= 670,
            "expected credit_score >= 670 (Good or better), got {}",
            result.credit_score
        );
        assert!(matches!(result.score_band, ScoreBand::Good | ScoreBand::Excellent));
    }

    /// Same borrower, now liquidated three times.
    #[test]
    fn liquidated_borrower_scores_far_below_clean_borrower() {
        let now = OffsetDateTime::now_utc();
        let clean = score(&excellent_borrower(), now);

        let liquidated = wallet_with(|fv| {
            fv.financial.current_balance_native = 5.0;
            fv.financial.max_balance_native = 10.0;
            fv.financial.balance_volatility = 0.15;
            fv.protocol.borrow_count = 10;
            fv.protocol.repay_count = 10;
            fv.protocol.liquidation_count = 3;
            fv.protocol.total_protocol_events = 50;
            fv.temporal.wallet_age_days = 730;
            fv.activity.total_transactions = 500;
            fv.activity.active_days_ratio = 0.82;
            fv.temporal.transaction_regularity_score = 0.85;
        });
        let liquidated_result = score(&liquidated, now);

        // no-liquidation bonus is lost
        assert_eq!(liquidated_result.components.repayment.scaled, 150_000);
        // three liquidations add 300 points (scaled) of risk penalty
        assert_eq!(liquidated_result.components.risk_penalty.scaled, 300_000);
        assert!(clean.credit_score_scaled - liquidated_result.credit_score_scaled >= 350_000);
    }

    #[test]
    fn score_band_thresholds() {
        assert_eq!(ScoreBand::from_credit_score(0), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_credit_score(579), ScoreBand::Poor);
        assert_eq!(ScoreBand::from_credit_score(580), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_credit_score(669), ScoreBand::Fair);
        assert_eq!(ScoreBand::from_credit_score(670), ScoreBand::Good);
        assert_eq!(ScoreBand::from_credit_score(739), ScoreBand::Good);
        assert_eq!(ScoreBand::from_credit_score(740), ScoreBand::Excellent);
        assert_eq!(ScoreBand::from_credit_score(900), ScoreBand::Excellent);
    }

    #[test]
    fn score_band_6_thresholds() {
        assert_eq!(ScoreBand6::from_credit_score(499), ScoreBand6::Poor);
        assert_eq!(ScoreBand6::from_credit_score(500), ScoreBand6::Fair);
        assert_eq!(ScoreBand6::from_credit_score(799), ScoreBand6::Excellent);
        assert_eq!(ScoreBand6::from_credit_score(800), ScoreBand6::Exceptional);
    }
}
