//! On-chain calldata encoding.

use score_core::error::ScoreError;

use crate::schema::{ContractProof, Proof, PublicSignals};

/// Reshapes a raw snarkjs [`Proof`] for a Solidity Groth16 verifier call.
///
/// The third coordinate (always `1`, an artifact of Jacobian/affine
/// conversion) is dropped from every point, and `pi_b`'s two coordinates
/// are swapped within each row. This swap is not optional: the verifier
/// contract's generated Solidity expects `b` transposed relative to
/// snarkjs's raw G2 point encoding, and skipping it produces a proof that
/// fails verification while looking structurally identical.
pub fn format_proof_for_contract(
    proof: &Proof,
    public_signals: &PublicSignals,
) -> Result<ContractProof, ScoreError> {
    let pair = |v: &[String]| -> Result<[String; 2], ScoreError> {
        if v.len() < 2 {
            return Err(ScoreError::InvalidInput(format!(
                "expected at least 2 coordinates, got {}",
                v.len()
            )));
        }
        Ok([v[0].clone(), v[1].clone()])
    };

    if proof.pi_b.len() != 2 {
        return Err(ScoreError::InvalidInput(format!(
            "pi_b must have 2 rows, got {}",
            proof.pi_b.len()
        )));
    }
    let row0 = pair(&proof.pi_b[0])?;
    let row1 = pair(&proof.pi_b[1])?;

    Ok(ContractProof {
        pi_a: pair(&proof.pi_a)?,
        pi_b: [[row0[1].clone(), row0[0].clone()], [row1[1].clone(), row1[0].clone()]],
        pi_c: pair(&proof.pi_c)?,
        protocol: proof.protocol.clone(),
        curve: proof.curve.clone(),
        public_signals: public_signals.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn swaps_b_row_coordinates() {
        let proof = Proof {
            pi_a: vec!["1".into(), "2".into(), "1".into()],
            pi_b: vec![
                vec!["10".into(), "20".into(), "1".into()],
                vec!["30".into(), "40".into(), "1".into()],
            ],
            pi_c: vec!["5".into(), "6".into(), "1".into()],
            protocol: "groth16".into(),
            curve: "bn128".into(),
        };
        let signals = vec!["100".to_string()];
        let contract = format_proof_for_contract(&proof, &signals).unwrap();
        assert_eq!(contract.pi_b, [["20".to_string(), "10".to_string()], ["40".to_string(), "30".to_string()]]);
        assert_eq!(contract.pi_a, ["1".to_string(), "2".to_string()]);
    }

    #[test]
    fn rejects_malformed_pi_b() {
        let proof = Proof {
            pi_a: vec!["1".into(), "2".into()],
            pi_b: vec![vec!["10".into(), "20".into()]],
            pi_c: vec!["5".into(), "6".into()],
            protocol: "groth16".into(),
            curve: "bn128".into(),
        };
        let signals = vec![];
        assert!(format_proof_for_contract(&proof, &signals).is_err());
    }
}
