//! Witness Formatter: turns a [`FeatureVector`] and
//! [`ScoreResult`] into circuit-ready public and private inputs.
//!
//! Every integer here passes through [`FieldElement::from_nonnegative`] or
//! [`FieldElement::from_i64_clamped`], so it is guaranteed `< p` by
//! construction; the validation pass in [`Witness::validate`] re-checks the
//! things construction cannot guarantee (ranges tied to the *score*, not
//! the field, and the freshness of `timestamp`).

use num_bigint::BigUint;
use num_traits::Zero;
use rand::RngCore;
use score_core::address::WalletAddress;
use score_core::constants::{MAX_SCORE_SCALED, SCALE, VERSION_ID};
use score_core::error::ScoreError;
use score_core::field::{FieldElement, BN254_PRIME};
use score_engine::ScoreResult;
use score_features::model::FeatureVector;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::OffsetDateTime;

/// The 11 public circuit inputs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicInputs {
    pub user_address: FieldElement,
    pub score_total: FieldElement,
    pub score_repayment: FieldElement,
    pub score_capital: FieldElement,
    pub score_longevity: FieldElement,
    pub score_activity: FieldElement,
    pub score_protocol: FieldElement,
    pub threshold: FieldElement,
    pub timestamp: FieldElement,
    pub nullifier: FieldElement,
    pub version_id: FieldElement,
}

/// The 30 private circuit inputs, in the exact order the
/// circuit's input file expects them: 7 financial, 8 protocol, 6 activity,
/// 4 temporal, 4 risk, 1 anti-replay nonce.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateInputs {
    // Financial (7) — balances are UNSCALED integer token amounts, exactly
    // as the circuit's LogScale template expects; ratios are scaled x1000.
    pub current_balance_scaled: FieldElement,
    pub max_balance_scaled: FieldElement,
    pub balance_volatility_scaled: FieldElement,
    pub sudden_drops_count: FieldElement,
    pub total_value_transferred: FieldElement,
    pub avg_tx_value: FieldElement,
    pub min_balance_scaled: FieldElement,

    // Protocol (8)
    pub borrow_count: FieldElement,
    pub repay_count: FieldElement,
    pub repay_to_borrow_ratio: FieldElement,
    pub liquidation_count: FieldElement,
    pub total_protocol_events: FieldElement,
    pub deposit_count: FieldElement,
    pub withdraw_count: FieldElement,
    pub avg_borrow_duration: FieldElement,

    // Activity (6)
    pub total_transactions: FieldElement,
    pub active_days: FieldElement,
    pub total_days: FieldElement,
    pub active_days_ratio: FieldElement,
    pub longest_inactivity_gap: FieldElement,
    pub transactions_per_day: FieldElement,

    // Temporal (4)
    pub wallet_age_days: FieldElement,
    pub transaction_regularity: FieldElement,
    pub burst_activity_ratio: FieldElement,
    pub days_since_last_activity: FieldElement,

    // Risk (4)
    pub failed_tx_count: FieldElement,
    pub failed_tx_ratio: FieldElement,
    pub high_gas_spike_count: FieldElement,
    pub zero_balance_periods: FieldElement,

    // Anti-replay (1)
    pub nonce: FieldElement,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WitnessMetadata {
    pub score_band: score_engine::ScoreBand,
    pub raw_score_scaled: i64,
    pub network: String,
    pub chain_id: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Witness {
    pub version_id: u64,
    pub timestamp: i64,
    pub engine_version: String,
    pub feature_version: String,
    pub wallet_address: WalletAddress,
    pub public_inputs: PublicInputs,
    pub private_inputs: PrivateInputs,
    pub metadata: WitnessMetadata,
}

fn scale(value: f64) -> i64 {
    (value * SCALE as f64) as i64
}

/// SHA-256(address‖timestamp‖16 random bytes), truncated to the first 128
/// bits, clamped to at least 1. A 128-bit nonce is wide enough to make
/// collisions practically impossible while keeping the witness small.
pub fn generate_nonce(wallet: &WalletAddress, timestamp: i64) -> BigUint {
    let mut random_bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut random_bytes);

    let mut hasher = Sha256::new();
    hasher.update(wallet.to_string().as_bytes());
    hasher.update(timestamp.to_string().as_bytes());
    hasher.update(hex::encode(random_bytes).as_bytes());
    let digest = hasher.finalize();

    let nonce = BigUint::from_bytes_be(&digest[..16]);
    if nonce.is_zero() {
        BigUint::from(1u32)
    } else {
        nonce
    }
}

/// SHA-256(userAddress‖nonce‖timestamp‖versionId) mod p, all operands
/// concatenated as decimal strings. This is informational only: the
/// circuit recomputes the real nullifier with Poseidon internally.
pub fn compute_nullifier(user_address: &FieldElement, nonce: &BigUint, timestamp: i64, version_id: u64) -> BigUint {
    let data = format!("{user_address}{nonce}{timestamp}{version_id}");
    let mut hasher = Sha256::new();
    hasher.update(data.as_bytes());
    let digest = hasher.finalize();
    BigUint::from_bytes_be(&digest) % &*BN254_PRIME
}

/// Builds the full circuit witness for `features`/`score_result` against
/// `threshold` (the lender's required score, 0-900).
pub fn generate_witness(
    features: &FeatureVector,
    score_result: &ScoreResult,
    threshold: u32,
    now: OffsetDateTime,
) -> Result<Witness, ScoreError> {
    let timestamp = now.unix_timestamp();
    let nonce = generate_nonce(&features.wallet, timestamp);
    let user_address_field = features.wallet.to_field_element();
    let nullifier = compute_nullifier(&user_address_field, &nonce, timestamp, VERSION_ID);

    let nonce_field = FieldElement::try_from_strict(nonce)?;

    let public_inputs = PublicInputs {
        user_address: user_address_field,
        score_total: FieldElement::from_i64_clamped(score_result.credit_score_scaled),
        score_repayment: FieldElement::from_i64_clamped(score_result.components.repayment.scaled),
        score_capital: FieldElement::from_i64_clamped(score_result.components.capital.scaled),
        score_longevity: FieldElement::from_i64_clamped(score_result.components.longevity.scaled),
        score_activity: FieldElement::from_i64_clamped(score_result.components.activity.scaled),
        score_protocol: FieldElement::from_i64_clamped(score_result.components.protocol.scaled),
        threshold: FieldElement::from_i64_clamped(threshold as i64 * SCALE),
        timestamp: FieldElement::from_i64_clamped(timestamp),
        nullifier: FieldElement::from_nonnegative(nullifier),
        version_id: FieldElement::from_i64_clamped(VERSION_ID as i64),
    };

    let private_inputs = PrivateInputs {
        current_balance_scaled: FieldElement::from_i64_clamped(
            features.financial.current_balance_native as i64,
        ),
        max_balance_scaled: FieldElement::from_i64_clamped(features.financial.max_balance_native as i64),
        balance_volatility_scaled: FieldElement::from_i64_clamped(scale(
            features.financial.balance_volatility,
        )),
        sudden_drops_count: FieldElement::from_i64_clamped(features.financial.sudden_drops_count as i64),
        total_value_transferred: FieldElement::from_i64_clamped(
            features.financial.total_value_transferred_native as i64,
        ),
        avg_tx_value: FieldElement::from_i64_clamped(
            features.financial.average_transaction_value_native as i64,
        ),
        min_balance_scaled: FieldElement::from_i64_clamped(features.financial.min_balance_native as i64),

        borrow_count: FieldElement::from_i64_clamped(features.protocol.borrow_count as i64),
        repay_count: FieldElement::from_i64_clamped(features.protocol.repay_count as i64),
        repay_to_borrow_ratio: FieldElement::from_i64_clamped(scale(features.protocol.repay_to_borrow_ratio)),
        liquidation_count: FieldElement::from_i64_clamped(features.protocol.liquidation_count as i64),
        total_protocol_events: FieldElement::from_i64_clamped(features.protocol.total_protocol_events as i64),
        deposit_count: FieldElement::from_i64_clamped(features.protocol.deposit_count as i64),
        withdraw_count: FieldElement::from_i64_clamped(features.protocol.withdraw_count as i64),
        avg_borrow_duration: FieldElement::from_i64_clamped(
            features.protocol.average_borrow_duration_days as i64,
        ),

        total_transactions: FieldElement::from_i64_clamped(features.activity.total_transactions as i64),
        active_days: FieldElement::from_i64_clamped(features.activity.active_days as i64),
        total_days: FieldElement::from_i64_clamped(features.activity.total_days as i64),
        active_days_ratio: FieldElement::from_i64_clamped(scale(features.activity.active_days_ratio)),
        longest_inactivity_gap: FieldElement::from_i64_clamped(features.activity.longest_inactivity_gap_days),
        transactions_per_day: FieldElement::from_i64_clamped(scale(features.activity.transactions_per_day)),

        wallet_age_days: FieldElement::from_i64_clamped(features.temporal.wallet_age_days),
        transaction_regularity: FieldElement::from_i64_clamped(scale(
            features.temporal.transaction_regularity_score,
        )),
        burst_activity_ratio: FieldElement::from_i64_clamped(scale(features.temporal.burst_activity_ratio)),
        days_since_last_activity: FieldElement::from_i64_clamped(features.temporal.days_since_last_activity),

        failed_tx_count: FieldElement::from_i64_clamped(features.risk.failed_transaction_count as i64),
        failed_tx_ratio: FieldElement::from_i64_clamped(scale(features.risk.failed_transaction_ratio)),
        high_gas_spike_count: FieldElement::from_i64_clamped(features.risk.high_gas_spike_count as i64),
        zero_balance_periods: FieldElement::from_i64_clamped(features.risk.zero_balance_periods as i64),

        nonce: nonce_field,
    };

    Ok(Witness {
        version_id: VERSION_ID,
        timestamp,
        engine_version: score_result.engine_version.clone(),
        feature_version: score_result.feature_version.clone(),
        wallet_address: features.wallet,
        public_inputs,
        private_inputs,
        metadata: WitnessMetadata {
            score_band: score_result.score_band,
            raw_score_scaled: score_result.raw_score_scaled,
            network: features.network.clone(),
            chain_id: features.chain_id,
        },
    })
}

impl Witness {
    /// Re-validates everything construction alone cannot guarantee: score
    /// ranges, threshold range, timestamp freshness, and the version id.
    /// Field-boundedness is already enforced by [`FieldElement`] itself.
    pub fn validate(&self, now: OffsetDateTime) -> Result<(), ScoreError> {
        let score_total = self.public_inputs.score_total.as_biguint();
        if score_total > &BigUint::from(MAX_SCORE_SCALED as u64) {
            return Err(ScoreError::OutOfRange {
                value: score_total.to_string(),
                bound: MAX_SCORE_SCALED.to_string(),
            });
        }

        let threshold = self.public_inputs.threshold.as_biguint();
        if threshold > &BigUint::from(MAX_SCORE_SCALED as u64) {
            return Err(ScoreError::OutOfRange {
                value: threshold.to_string(),
                bound: MAX_SCORE_SCALED.to_string(),
            });
        }

        let freshness_bound = (now.unix_timestamp() + 300) as u64;
        if self.timestamp < 0 || self.timestamp as u64 > freshness_bound {
            return Err(ScoreError::InvalidInput(format!(
                "witness timestamp {} is in the future",
                self.timestamp
            )));
        }

        if self.version_id != VERSION_ID {
            return Err(ScoreError::InvalidInput(format!(
                "unsupported version id {}, expected {VERSION_ID}",
                self.version_id
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use score_core::address::WalletAddress;
    use score_engine::{ComponentScore, ScoreBand, ScoreBand6, ScoreComponents};
    use score_features::model::*;

    fn sample_score_result(now: OffsetDateTime) -> ScoreResult {
        let component = |scaled: i64| ComponentScore {
            value: scaled as f64 / SCALE as f64,
            scaled,
        };
        ScoreResult {
            credit_score: 650,
            credit_score_scaled: 650_000,
            score_band: ScoreBand::Fair,
            score_band_6: ScoreBand6::Good,
            components: ScoreComponents {
                repayment: component(100_000),
                capital: component(80_000),
                longevity: component(40_000),
                activity: component(20_000),
                protocol: component(10_000),
                risk_penalty: component(0),
            },
            raw_score_scaled: 650_000,
            timestamp: now,
            feature_version: "1.0.0".into(),
            engine_version: "1.0.0".into(),
        }
    }

    fn sample_features(now: OffsetDateTime) -> FeatureVector {
        FeatureVector {
            wallet: WalletAddress::from_bytes(&[9u8; 20]).unwrap(),
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
    fn generates_and_validates_a_fresh_witness() {
        let now = OffsetDateTime::now_utc();
        let features = sample_features(now);
        let score_result = sample_score_result(now);
        let witness = generate_witness(&features, &score_result, 600, now).unwrap();
        witness.validate(now).unwrap();
        assert_eq!(witness.version_id, VERSION_ID);
    }

    #[test]
    fn nonce_is_never_zero() {
        let wallet = WalletAddress::from_bytes(&[0u8; 20]).unwrap();
        for _ in 0..50 {
            let nonce = generate_nonce(&wallet, 1_700_000_000);
            assert!(!nonce.is_zero());
        }
    }

    #[test]
    fn rejects_stale_witness() {
        let now = OffsetDateTime::now_utc();
        let features = sample_features(now);
        let score_result = sample_score_result(now);
        let mut witness = generate_witness(&features, &score_result, 600, now).unwrap();
        witness.timestamp = now.unix_timestamp() + 10_000;
        witness.public_inputs.timestamp = FieldElement::from_i64_clamped(witness.timestamp);
        assert!(witness.validate(now).is_err());
    }

    #[test]
    fn rejects_unsupported_version() {
        let now = OffsetDateTime::now_utc();
        let features = sample_features(now);
        let score_result = sample_score_result(now);
        let mut witness = generate_witness(&features, &score_result, 600, now).unwrap();
        witness.version_id = 2;
        assert!(witness.validate(now).is_err());
    }

    /// Every public and private field, plus the nullifier itself, must be a
    /// non-negative integer strictly less than the BN254 scalar field prime.
    #[test]
    fn every_witness_field_is_bounded_by_the_field_prime() {
        let now = OffsetDateTime::now_utc();
        let features = sample_features(now);
        let score_result = sample_score_result(now);
        let witness = generate_witness(&features, &score_result, 600, now).unwrap();

        let public_fields = [
            &witness.public_inputs.user_address,
            &witness.public_inputs.score_total,
            &witness.public_inputs.score_repayment,
            &witness.public_inputs.score_capital,
            &witness.public_inputs.score_longevity,
            &witness.public_inputs.score_activity,
            &witness.public_inputs.score_protocol,
            &witness.public_inputs.threshold,
            &witness.public_inputs.timestamp,
            &witness.public_inputs.nullifier,
            &witness.public_inputs.version_id,
        ];
        for field in public_fields {
            assert!(field.as_biguint() < &*BN254_PRIME);
        }

        let private_fields = [
            &witness.private_inputs.current_balance_scaled,
            &witness.private_inputs.max_balance_scaled,
            &witness.private_inputs.balance_volatility_scaled,
            &witness.private_inputs.sudden_drops_count,
            &witness.private_inputs.total_value_transferred,
            &witness.private_inputs.avg_tx_value,
            &witness.private_inputs.min_balance_scaled,
            &witness.private_inputs.borrow_count,
            &witness.private_inputs.repay_count,
            &witness.private_inputs.repay_to_borrow_ratio,
            &witness.private_inputs.liquidation_count,
            &witness.private_inputs.total_protocol_events,
            &witness.private_inputs.deposit_count,
            &witness.private_inputs.withdraw_count,
            &witness.private_inputs.avg_borrow_duration,
            &witness.private_inputs.total_transactions,
            &witness.private_inputs.active_days,
            &witness.private_inputs.total_days,
            &witness.private_inputs.active_days_ratio,
            &witness.private_inputs.longest_inactivity_gap,
            &witness.private_inputs.transactions_per_day,
            &witness.private_inputs.wallet_age_days,
            &witness.private_inputs.transaction_regularity,
            &witness.private_inputs.burst_activity_ratio,
            &witness.private_inputs.days_since_last_activity,
            &witness.private_inputs.failed_tx_count,
            &witness.private_inputs.failed_tx_ratio,
            &witness.private_inputs.high_gas_spike_count,
            &witness.private_inputs.zero_balance_periods,
            &witness.private_inputs.nonce,
        ];
        for field in private_fields {
            assert!(field.as_biguint() < &*BN254_PRIME);
        }
    }
}
