use std::path::PathBuf;

use score_features::model::FeatureVector;
use time::OffsetDateTime;

/// Build a circuit witness from a feature vector and a lender's threshold.
#[derive(Debug, clap::Args)]
pub struct Witness {
    /// Path to a JSON-encoded FeatureVector
    #[arg(long)]
    features: PathBuf,

    /// Lender's required credit score, in [0, 900]
    #[arg(long)]
    threshold: u32,
}

impl Witness {
    pub fn run(self) -> anyhow::Result<()> {
        let raw = std::fs::read_to_string(&self.features)?;
        let features: FeatureVector = serde_json::from_str(&raw)?;

        let now = OffsetDateTime::now_utc();
        let score_result = score_engine::score(&features, now);
        let witness = score_witness::generate_witness(&features, &score_result, self.threshold, now)?;
        witness.validate(now)?;

        println!("{}", serde_json::to_string_pretty(&witness)?);
        Ok(())
    }
}
