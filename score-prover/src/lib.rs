//! Proof Driver and on-chain calldata formatter.

#![forbid(unsafe_code)]

pub mod contract;
pub mod driver;
pub mod schema;

pub use contract::format_proof_for_contract;
pub use driver::{generate_proof, verify_proof, CircuitArtifacts, ProverConfig};
pub use schema::{ContractProof, Proof, PublicSignals};
