use std::path::PathBuf;

use score_prover::{CircuitArtifacts, ProverConfig};

/// Generate a Groth16 proof from a witness, shelling out to `snarkjs`.
#[derive(Debug, clap::Args)]
pub struct Prove {
    /// Path to a JSON-encoded witness (as produced by `witness`)
    #[arg(long)]
    witness: PathBuf,

    #[arg(long)]
    wasm: PathBuf,
    #[arg(long)]
    zkey: PathBuf,
    #[arg(long)]
    vkey: PathBuf,

    /// Where to write the proof JSON (defaults to stdout)
    #[arg(long)]
    out: Option<PathBuf>,
}

impl Prove {
    pub async fn run(self) -> anyhow::Result<()> {
        let raw = std::fs::read_to_string(&self.witness)?;
        let witness: score_witness::Witness = serde_json::from_str(&raw)?;

        let config = ProverConfig::new(CircuitArtifacts {
            wasm_path: self.wasm,
            zkey_path: self.zkey,
            vkey_path: self.vkey,
        });

        let (proof, public_signals) = score_prover::generate_proof(&config, &witness).await?;
        let output = serde_json::json!({
            "proof": proof,
            "public_signals": public_signals,
        });

        match self.out {
            Some(path) => std::fs::write(path, serde_json::to_vec_pretty(&output)?)?,
            None => println!("{}", serde_json::to_string_pretty(&output)?),
        }

        Ok(())
    }
}
