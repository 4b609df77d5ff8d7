//! Multi-Chain Aggregator: fan feature extraction across
//! networks and reduce per-network vectors into an overall classification
//! using monotone lattices (most-conservative wins).

use std::collections::BTreeMap;

use score_core::address::WalletAddress;
use score_core::error::ScoreError;
use time::OffsetDateTime;
use tracing::warn;

use crate::model::{
    AggregatedTotals, BehavioralClassification, CreditBehaviorClass, FeatureVector,
    MultiChainFeatureVector,
};

/// Looks up a USD price for a native-asset symbol. Unknown symbols return
/// `None`; the aggregator treats absent as a zero contribution.
pub trait PriceOracle: Send + Sync {
    fn price_usd(&self, symbol: &str) -> Option<f64>;
}

/// A null implementation for test contexts where no pricing backend is
/// available.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPriceOracle;

impl PriceOracle for NullPriceOracle {
    fn price_usd(&self, _symbol: &str) -> Option<f64> {
        None
    }
}

/// One (network, error) pair recorded when that network's extraction fails
/// but the overall aggregation still succeeds.
pub type NetworkFailure = (String, ScoreError);

/// Reduce a set of per-network feature vectors into one
/// [`MultiChainFeatureVector`]. `symbol_by_network` supplies the native
/// asset symbol used to look up USD pricing per network (e.g.
/// `"ethereum" -> "ETH"`); a missing entry contributes 0 USD for that
/// network, matching an unpriced oracle lookup.
pub fn aggregate(
    wallet: WalletAddress,
    per_network: BTreeMap<String, FeatureVector>,
    symbol_by_network: &BTreeMap<String, String>,
    oracle: &dyn PriceOracle,
    now: OffsetDateTime,
) -> MultiChainFeatureVector {
    let networks_analyzed: Vec<String> = per_network.keys().cloned().collect();

    let mut aggregated = AggregatedTotals::default();
    for (network, fv) in &per_network {
        aggregated.total_transactions += fv.activity.total_transactions;
        aggregated.total_protocol_interactions += fv.protocol.total_protocol_events;
        aggregated.total_liquidations += fv.protocol.liquidation_count;

        if let Some(symbol) = symbol_by_network.get(network) {
            if let Some(price) = oracle.price_usd(symbol) {
                aggregated.total_value_usd += fv.financial.current_balance_native * price;
            }
        }
    }

    let overall_classification = reduce_classifications(per_network.values());

    MultiChainFeatureVector {
        wallet,
        networks_analyzed,
        per_network,
        aggregated,
        overall_classification,
        extraction_timestamp: now,
    }
}

fn reduce_classifications<'a>(
    vectors: impl Iterator<Item = &'a FeatureVector>,
) -> BehavioralClassification {
    let classifications: Vec<_> = vectors.map(|fv| fv.classification.clone()).collect();

    let longevity_class = classifications
        .iter()
        .map(|c| c.longevity_class)
        .max()
        .unwrap_or(crate::model::LongevityClass::New);
    let activity_class = classifications
        .iter()
        .map(|c| c.activity_class)
        .max()
        .unwrap_or(crate::model::ActivityClass::Dormant);
    let capital_class = classifications
        .iter()
        .map(|c| c.capital_class)
        .max()
        .unwrap_or(crate::model::CapitalClass::Micro);
    let risk_class = classifications
        .iter()
        .map(|c| c.risk_class)
        .max()
        .unwrap_or(crate::model::RiskClass::Low);
    let credit_behavior_class =
        CreditBehaviorClass::reduce(classifications.iter().map(|c| c.credit_behavior_class));

    BehavioralClassification {
        longevity_class,
        activity_class,
        capital_class,
        credit_behavior_class,
        risk_class,
    }
}

/// Runs `extract` for each of `networks`, bounded to `max_concurrency`
/// simultaneous tasks (recommended: no more than 5 concurrent network
/// extractions). A network whose extraction errors is logged and excluded,
/// never failing the overall call.
pub async fn extract_all_networks<F, Fut>(
    networks: Vec<String>,
    max_concurrency: usize,
    extract: F,
) -> (BTreeMap<String, FeatureVector>, Vec<NetworkFailure>)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: std::future::Future<Output = Result<FeatureVector, ScoreError>> + Send + 'static,
{
    use std::sync::Arc;
    use tokio::sync::Semaphore;

    let semaphore = Arc::new(Semaphore::new(max_concurrency.max(1)));
    let extract = Arc::new(extract);

    let mut tasks = tokio::task::JoinSet::new();
    for network in networks {
        let semaphore = semaphore.clone();
        let extract = extract.clone();
        tasks.spawn(async move {
            let _permit = semaphore.acquire_owned().await.expect("semaphore not closed");
            let result = extract(network.clone()).await;
            (network, result)
        });
    }

    let mut successes = BTreeMap::new();
    let mut failures = Vec::new();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((network, Ok(fv))) => {
                successes.insert(network, fv);
            }
            Ok((network, Err(err))) => {
                warn!(network = %network, error = %err, "network extraction failed");
                failures.push((network, err));
            }
            Err(join_err) => {
                warn!(error = %join_err, "network extraction task panicked");
            }
        }
    }

    (successes, failures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        ActivityFeatures, AnalysisWindow, CreditBehaviorClass, FinancialFeatures,
        ProtocolInteractionFeatures, RiskFeatures, TemporalFeatures,
    };

    fn sample_vector(network: &str, credit: CreditBehaviorClass) -> FeatureVector {
        let now = OffsetDateTime::now_utc();
        FeatureVector {
            wallet: WalletAddress::from_bytes(&[1u8; 20]).unwrap(),
            network: network.to_string(),
            chain_id: 1,
            window: AnalysisWindow::new("test", Some(90), now),
            activity: ActivityFeatures::default(),
            financial: FinancialFeatures::default(),
            protocol: ProtocolInteractionFeatures::default(),
            risk: RiskFeatures::default(),
            temporal: TemporalFeatures::default(),
            classification: BehavioralClassification {
                longevity_class: crate::model::LongevityClass::Established,
                activity_class: crate::model::ActivityClass::Active,
                capital_class: crate::model::CapitalClass::Medium,
                credit_behavior_class: credit,
                risk_class: crate::model::RiskClass::Low,
            },
            extraction_timestamp: now,
            feature_version: "1.0.0".to_string(),
        }
    }

    #[test]
    fn defaulter_beats_everything() {
        let mut map = BTreeMap::new();
        map.insert(
            "ethereum".to_string(),
            sample_vector("ethereum", CreditBehaviorClass::Responsible),
        );
        map.insert(
            "polygon".to_string(),
            sample_vector("polygon", CreditBehaviorClass::Responsible),
        );
        map.insert(
            "arbitrum".to_string(),
            sample_vector("arbitrum", CreditBehaviorClass::Risky),
        );
        let overall = reduce_classifications(map.values());
        assert_eq!(overall.credit_behavior_class, CreditBehaviorClass::Risky);

        map.get_mut("arbitrum").unwrap().classification.credit_behavior_class =
            CreditBehaviorClass::Defaulter;
        let overall = reduce_classifications(map.values());
        assert_eq!(overall.credit_behavior_class, CreditBehaviorClass::Defaulter);
    }
}
