//! The feature-extraction data model.
//!
//! All relationships here are tree-shaped: a [`FeatureVector`] owns one
//! [`AnalysisWindow`]; a [`MultiChainFeatureVector`] owns a map of
//! [`FeatureVector`]s. There are no cycles.

use std::collections::BTreeMap;

use ethereum_types::U256;
use score_core::address::WalletAddress;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// An analysis period, either a fixed window ending "now" or the wallet's
/// entire lifetime (from the Ethereum genesis date).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisWindow {
    pub name: String,
    /// `None` means "lifetime".
    pub days: Option<u32>,
    #[serde(with = "time::serde::rfc3339")]
    pub start: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub end: OffsetDateTime,
}

impl AnalysisWindow {
    /// Ethereum mainnet's genesis date, used as the start of a "lifetime"
    /// window.
    pub fn genesis() -> OffsetDateTime {
        time::macros::datetime!(2015-07-30 00:00:00 UTC)
    }

    pub fn new(name: impl Into<String>, days: Option<u32>, end: OffsetDateTime) -> Self {
        let start = match days {
            Some(d) => end - time::Duration::days(d as i64),
            None => Self::genesis(),
        };
        AnalysisWindow {
            name: name.into(),
            days,
            start,
            end,
        }
    }

    /// Whole days spanned by the window, floored at 1:
    /// `max(1, (window.end - window.start) in whole days)`.
    pub fn total_days(&self) -> i64 {
        ((self.end - self.start).whole_days()).max(1)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletMetadata {
    pub address: WalletAddress,
    pub first_seen_block: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub first_seen_timestamp: OffsetDateTime,
    pub current_balance_base_units: U256,
    pub current_balance_native: f64,
    pub transaction_count: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub ingestion_timestamp: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub hash: String,
    pub wallet: WalletAddress,
    pub block_number: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub from: WalletAddress,
    pub to: Option<WalletAddress>,
    pub value_base_units: U256,
    pub value_native: f64,
    pub gas_used: Option<u64>,
    pub gas_price_base_units: Option<U256>,
    pub success: bool,
    pub contract_interaction: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtocolEventType {
    Deposit,
    Withdraw,
    Borrow,
    Repay,
    Liquidation,
    Swap,
    Stake,
    Rewards,
    Collateral,
    Supply,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProtocolEvent {
    pub event_type: ProtocolEventType,
    pub wallet: WalletAddress,
    pub protocol_name: String,
    pub contract_address: WalletAddress,
    pub transaction_hash: String,
    pub block_number: u64,
    #[serde(default, with = "time::serde::rfc3339::option")]
    pub timestamp: Option<OffsetDateTime>,
    pub asset_symbol: Option<String>,
    pub amount_base_units: Option<U256>,
    pub log_index: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub wallet: WalletAddress,
    pub block_number: u64,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    pub balance_base_units: U256,
    pub balance_native: f64,
}

/// The raw input record consumed by the feature extractor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub wallet_metadata: WalletMetadata,
    pub transactions: Vec<TransactionRecord>,
    pub protocol_events: Vec<ProtocolEvent>,
    pub balance_snapshots: Vec<BalanceSnapshot>,
    pub window: AnalysisWindow,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ActivityFeatures {
    pub total_transactions: u64,
    pub transactions_per_day: f64,
    pub active_days: u64,
    pub total_days: u64,
    pub active_days_ratio: f64,
    pub longest_inactivity_gap_days: i64,
    pub recent_activity_days: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialFeatures {
    pub total_value_transferred_native: f64,
    pub average_transaction_value_native: f64,
    pub current_balance_native: f64,
    pub max_balance_native: f64,
    pub min_balance_native: f64,
    pub balance_volatility: f64,
    pub sudden_drops_count: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProtocolInteractionFeatures {
    pub total_protocol_events: u64,
    pub borrow_count: u64,
    pub repay_count: u64,
    pub deposit_count: u64,
    pub withdraw_count: u64,
    pub liquidation_count: u64,
    pub repay_to_borrow_ratio: f64,
    pub average_borrow_duration_days: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RiskFeatures {
    pub failed_transaction_count: u64,
    pub failed_transaction_ratio: f64,
    pub liquidation_count: u64,
    pub high_gas_spike_count: u64,
    pub zero_balance_periods: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemporalFeatures {
    pub wallet_age_days: i64,
    pub days_since_last_activity: i64,
    pub transaction_regularity_score: f64,
    pub burst_activity_ratio: f64,
}

macro_rules! monotone_enum {
    ($name:ident { $($variant:ident),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }
    };
}

// Declaration order is the monotone lattice order: later variants are
// "more mature" / "more intense" / "higher bucket" / "more severe".
monotone_enum!(LongevityClass { New, Established, Veteran });
monotone_enum!(ActivityClass { Dormant, Occasional, Active, Hyperactive });
monotone_enum!(CapitalClass { Micro, Small, Medium, Large, Whale });
monotone_enum!(RiskClass { Low, Medium, High, Critical });

/// Credit-behavior reduction is not a simple total order: `defaulter`
/// beats everything, then `risky`, then `responsible`, then `no_history`.
/// [`CreditBehaviorClass::reduce`] implements that precedence directly
/// rather than relying on derived `Ord`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditBehaviorClass {
    NoHistory,
    Responsible,
    Risky,
    Defaulter,
}

impl CreditBehaviorClass {
    pub fn reduce(values: impl IntoIterator<Item = CreditBehaviorClass>) -> CreditBehaviorClass {
        let values: Vec<_> = values.into_iter().collect();
        if values.iter().any(|v| *v == CreditBehaviorClass::Defaulter) {
            CreditBehaviorClass::Defaulter
        } else if values.iter().any(|v| *v == CreditBehaviorClass::Risky) {
            CreditBehaviorClass::Risky
        } else if values
            .iter()
            .any(|v| *v == CreditBehaviorClass::Responsible)
        {
            CreditBehaviorClass::Responsible
        } else {
            CreditBehaviorClass::NoHistory
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BehavioralClassification {
    pub longevity_class: LongevityClass,
    pub activity_class: ActivityClass,
    pub capital_class: CapitalClass,
    pub credit_behavior_class: CreditBehaviorClass,
    pub risk_class: RiskClass,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureVector {
    pub wallet: WalletAddress,
    pub network: String,
    pub chain_id: u64,
    pub window: AnalysisWindow,
    pub activity: ActivityFeatures,
    pub financial: FinancialFeatures,
    pub protocol: ProtocolInteractionFeatures,
    pub risk: RiskFeatures,
    pub temporal: TemporalFeatures,
    pub classification: BehavioralClassification,
    #[serde(with = "time::serde::rfc3339")]
    pub extraction_timestamp: OffsetDateTime,
    pub feature_version: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AggregatedTotals {
    pub total_transactions: u64,
    pub total_protocol_interactions: u64,
    pub total_liquidations: u64,
    pub total_value_usd: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiChainFeatureVector {
    pub wallet: WalletAddress,
    pub networks_analyzed: Vec<String>,
    pub per_network: BTreeMap<String, FeatureVector>,
    pub aggregated: AggregatedTotals,
    pub overall_classification: BehavioralClassification,
    #[serde(with = "time::serde::rfc3339")]
    pub extraction_timestamp: OffsetDateTime,
}

pub const FEATURE_VERSION: &str = "1.0.0";
