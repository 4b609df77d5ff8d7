use std::path::PathBuf;

use score_features::model::FeatureRecord;
use time::OffsetDateTime;

/// Extract a [`score_features::model::FeatureVector`] from a raw feature
/// record read from disk.
#[derive(Debug, clap::Args)]
pub struct Extract {
    /// Path to a JSON-encoded FeatureRecord
    #[arg(long)]
    record: PathBuf,

    /// Network name the record was collected from (e.g. "ethereum")
    #[arg(long)]
    network: String,

    /// EVM chain id
    #[arg(long)]
    chain_id: u64,
}

impl Extract {
    pub fn run(self) -> anyhow::Result<()> {
        let raw = std::fs::read_to_string(&self.record)?;
        let record: FeatureRecord = serde_json::from_str(&raw)?;

        let now = OffsetDateTime::now_utc();
        let (vector, report) = score_features::extract_features(&record, &self.network, self.chain_id, now);

        tracing::info!(
            wallet = %report.wallet,
            transactions = report.transactions_considered,
            events = report.events_considered,
            "feature extraction complete"
        );

        println!("{}", serde_json::to_string_pretty(&vector)?);
        Ok(())
    }
}
