use std::path::PathBuf;

use score_features::model::FeatureVector;
use time::OffsetDateTime;

/// Run the authoritative circuit-parallel scoring engine over a feature
/// vector read from disk.
#[derive(Debug, clap::Args)]
pub struct Score {
    /// Path to a JSON-encoded FeatureVector
    #[arg(long)]
    features: PathBuf,

    /// Also print the floating-point readable engine's result for
    /// comparison
    #[arg(long)]
    readable: bool,
}

impl Score {
    pub fn run(self) -> anyhow::Result<()> {
        let raw = std::fs::read_to_string(&self.features)?;
        let features: FeatureVector = serde_json::from_str(&raw)?;

        let now = OffsetDateTime::now_utc();
        let result = score_engine::score(&features, now);
        println!("{}", serde_json::to_string_pretty(&result)?);

        if self.readable {
            let readable = score_engine::readable::score_readable(&features, now);
            eprintln!("readable engine credit_score: {}", readable.credit_score);
        }

        Ok(())
    }
}
