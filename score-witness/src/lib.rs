//! Witness Formatter.

#![forbid(unsafe_code)]

pub mod witness;

pub use witness::{
    compute_nullifier, generate_nonce, generate_witness, PrivateInputs, PublicInputs, Witness,
    WitnessMetadata,
};
