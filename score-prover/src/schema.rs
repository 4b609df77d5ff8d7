//! snarkjs-compatible JSON schemas for Groth16 proofs.
//!
//! Field elements are carried as decimal strings throughout, exactly as
//! snarkjs emits them, so parsing them with `serde_json` never touches a
//! `u64`/`f64` and loses precision on a 254-bit value.

use serde::{Deserialize, Serialize};

/// A Groth16 proof as written by `snarkjs groth16 prove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Proof {
    pub pi_a: Vec<String>,
    pub pi_b: Vec<Vec<String>>,
    pub pi_c: Vec<String>,
    pub protocol: String,
    pub curve: String,
}

/// The `public.json` array snarkjs writes alongside a proof: one decimal
/// string per public circuit input, in declaration order.
pub type PublicSignals = Vec<String>;

/// Proof reshaped for a Solidity Groth16 verifier's `verifyProof(a, b, c,
/// input)` call: third coordinates dropped, and `b`'s two coordinates
/// swapped per row (mandatory — the verifier contract expects `b`
/// transposed relative to snarkjs's raw output).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContractProof {
    pub pi_a: [String; 2],
    pub pi_b: [[String; 2]; 2],
    pub pi_c: [String; 2],
    pub protocol: String,
    pub curve: String,
    pub public_signals: PublicSignals,
}
