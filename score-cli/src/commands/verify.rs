use std::path::PathBuf;

use score_prover::{format_proof_for_contract, CircuitArtifacts, Proof, ProverConfig, PublicSignals};

/// Verify a Groth16 proof, optionally formatting it for an on-chain call.
#[derive(Debug, clap::Args)]
pub struct Verify {
    /// Path to the JSON proof produced by `prove`
    #[arg(long)]
    proof: PathBuf,

    /// Path to a JSON array of public signals (decimal strings)
    #[arg(long)]
    public_signals: PathBuf,

    #[arg(long)]
    vkey: PathBuf,

    /// Print the reshaped calldata for a Solidity Groth16 verifier instead
    /// of just the verdict
    #[arg(long)]
    contract: bool,
}

impl Verify {
    pub async fn run(self) -> anyhow::Result<()> {
        let proof: Proof = serde_json::from_str(&std::fs::read_to_string(&self.proof)?)?;
        let public_signals: PublicSignals =
            serde_json::from_str(&std::fs::read_to_string(&self.public_signals)?)?;

        let config = ProverConfig::new(CircuitArtifacts {
            wasm_path: PathBuf::new(),
            zkey_path: PathBuf::new(),
            vkey_path: self.vkey,
        });

        let valid = score_prover::verify_proof(&config, &proof, &public_signals).await?;
        if !valid {
            println!("INVALID");
            std::process::exit(1);
        }
        println!("OK");

        if self.contract {
            let contract_proof = format_proof_for_contract(&proof, &public_signals)?;
            println!("{}", serde_json::to_string_pretty(&contract_proof)?);
        }

        Ok(())
    }
}
