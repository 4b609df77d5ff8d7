//! Drives the external `snarkjs` CLI to turn a witness into a Groth16 proof
//! and to verify one, grounded on the same subprocess idiom used elsewhere
//! in the corpus for shelling out to a long-running external binary:
//! `Command::new(..).kill_on_drop(true).spawn()...wait()`, each call
//! wrapped in its own [`tokio::time::timeout`] so a hung subprocess cannot
//! wedge the caller.

use std::path::{Path, PathBuf};
use std::time::Duration;

use score_core::error::ScoreError;
use score_witness::Witness;
use tokio::process::Command;

use crate::schema::{Proof, PublicSignals};

/// Filesystem locations of the three circuit artifacts `snarkjs` needs.
#[derive(Debug, Clone)]
pub struct CircuitArtifacts {
    pub wasm_path: PathBuf,
    pub zkey_path: PathBuf,
    pub vkey_path: PathBuf,
}

impl CircuitArtifacts {
    /// Confirms every artifact exists on disk, returning one combined
    /// error naming every missing file rather than failing on the first.
    pub fn check(&self) -> Result<(), ScoreError> {
        let mut missing = Vec::new();
        for (label, path) in [
            ("wasm", &self.wasm_path),
            ("zkey", &self.zkey_path),
            ("vkey", &self.vkey_path),
        ] {
            if !path.exists() {
                missing.push(format!("{label} ({})", path.display()));
            }
        }
        if missing.is_empty() {
            Ok(())
        } else {
            Err(ScoreError::ExternalToolMissing(format!(
                "circuit artifacts not found: {}",
                missing.join(", ")
            )))
        }
    }
}

/// Configuration for the prover driver: artifact locations, the `snarkjs`
/// binary name (so a test or deployment can point at a wrapper script),
/// and independent timeouts for each of the three subprocess stages.
#[derive(Debug, Clone)]
pub struct ProverConfig {
    pub artifacts: CircuitArtifacts,
    pub snarkjs_binary: String,
    pub witness_timeout: Duration,
    pub prove_timeout: Duration,
    pub verify_timeout: Duration,
}

impl ProverConfig {
    pub fn new(artifacts: CircuitArtifacts) -> Self {
        ProverConfig {
            artifacts,
            snarkjs_binary: "snarkjs".to_string(),
            witness_timeout: Duration::from_secs(120),
            prove_timeout: Duration::from_secs(120),
            verify_timeout: Duration::from_secs(30),
        }
    }
}

async fn run_subprocess(
    binary: &str,
    args: &[&std::ffi::OsStr],
    timeout: Duration,
) -> Result<std::process::Output, ScoreError> {
    let child = Command::new(binary)
        .args(args)
        .kill_on_drop(true)
        .output();

    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) if err.kind() == std::io::ErrorKind::NotFound => {
            Err(ScoreError::ExternalToolMissing(binary.to_string()))
        }
        Ok(Err(err)) => Err(ScoreError::Io(err)),
        Err(_) => Err(ScoreError::ExternalToolTimeout(timeout)),
    }
}

fn check_success(output: &std::process::Output) -> Result<(), ScoreError> {
    if output.status.success() {
        Ok(())
    } else {
        Err(ScoreError::ExternalToolFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Flattens a witness's public and private inputs into the single JSON
/// object `snarkjs wtns calculate` expects as circuit input — the circuit
/// consumes both public and private signals from one input file.
fn circuit_input_json(witness: &Witness) -> Result<serde_json::Value, ScoreError> {
    let mut merged = serde_json::Map::new();
    let public = serde_json::to_value(&witness.public_inputs)?;
    let private = serde_json::to_value(&witness.private_inputs)?;
    if let serde_json::Value::Object(map) = public {
        merged.extend(map);
    }
    if let serde_json::Value::Object(map) = private {
        merged.extend(map);
    }
    Ok(serde_json::Value::Object(merged))
}

/// Runs the two-stage snarkjs pipeline (`wtns calculate` then `groth16
/// prove`) against a temporary directory that is cleaned up on return,
/// including on error or cancellation.
pub async fn generate_proof(
    config: &ProverConfig,
    witness: &Witness,
) -> Result<(Proof, PublicSignals), ScoreError> {
    config.artifacts.check()?;

    let temp_dir = tempfile::tempdir()?;
    let input_path = temp_dir.path().join("input.json");
    let witness_path = temp_dir.path().join("witness.wtns");
    let proof_path = temp_dir.path().join("proof.json");
    let public_path = temp_dir.path().join("public.json");

    let circuit_input = circuit_input_json(witness)?;
    tokio::fs::write(&input_path, serde_json::to_vec_pretty(&circuit_input)?).await?;

    tracing::info!(wallet = %witness.wallet_address, "generating circuit witness");
    let wtns_args = as_os_args(&[
        "wtns",
        "calculate",
        path_str(&config.artifacts.wasm_path),
        path_str(&input_path),
        path_str(&witness_path),
    ]);
    let output = run_subprocess(&config.snarkjs_binary, &wtns_args, config.witness_timeout).await?;
    check_success(&output)?;

    tracing::info!(wallet = %witness.wallet_address, "generating groth16 proof");
    let prove_args = as_os_args(&[
        "groth16",
        "prove",
        path_str(&config.artifacts.zkey_path),
        path_str(&witness_path),
        path_str(&proof_path),
        path_str(&public_path),
    ]);
    let output = run_subprocess(&config.snarkjs_binary, &prove_args, config.prove_timeout).await?;
    check_success(&output)?;

    let proof: Proof = serde_json::from_slice(&tokio::fs::read(&proof_path).await?)?;
    let public_signals: PublicSignals = serde_json::from_slice(&tokio::fs::read(&public_path).await?)?;

    Ok((proof, public_signals))
}

/// Runs `snarkjs groth16 verify` against a freshly written proof/public
/// pair. Returns `Ok(false)` for a clean negative verification (the CLI
/// exits non-zero or omits `OK` from its output); a subprocess that cannot
/// be run at all is a [`ScoreError`], not a negative verdict.
pub async fn verify_proof(
    config: &ProverConfig,
    proof: &Proof,
    public_signals: &PublicSignals,
) -> Result<bool, ScoreError> {
    if !config.artifacts.vkey_path.exists() {
        return Err(ScoreError::ExternalToolMissing(format!(
            "verification key ({})",
            config.artifacts.vkey_path.display()
        )));
    }

    let temp_dir = tempfile::tempdir()?;
    let proof_path = temp_dir.path().join("proof.json");
    let public_path = temp_dir.path().join("public.json");

    tokio::fs::write(&proof_path, serde_json::to_vec(proof)?).await?;
    tokio::fs::write(&public_path, serde_json::to_vec(public_signals)?).await?;

    let verify_args = as_os_args(&[
        "groth16",
        "verify",
        path_str(&config.artifacts.vkey_path),
        path_str(&public_path),
        path_str(&proof_path),
    ]);
    let output = run_subprocess(&config.snarkjs_binary, &verify_args, config.verify_timeout).await?;

    if !output.status.success() {
        return Ok(false);
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(stdout.contains("OK"))
}

fn path_str(path: &Path) -> &str {
    path.to_str().expect("circuit artifact paths must be valid UTF-8")
}

fn as_os_args<'a, 'b>(args: &'b [&'a str]) -> Vec<&'a std::ffi::OsStr> {
    args.iter().map(|s| std::ffi::OsStr::new(*s)).collect()
}
